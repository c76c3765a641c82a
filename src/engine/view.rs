//! ### English
//! GUI-facing view binding: owns the player association, the rendering-mode selection and the
//! software pipeline instance.
//!
//! All methods run on the UI thread.
//!
//! ### 中文
//! 面向 GUI 的视图绑定：持有播放器关联、渲染模式选择以及软件管线实例。
//!
//! 所有方法都在 UI 线程调用。
use std::sync::Arc;

use super::bridge::{BridgeConfig, FrameStatsSnapshot, VideoSourceProvider};
use super::dispatch::UiDispatcher;
use super::error::{BridgeError, Result};
use super::events::EventHub;
use super::flags::ViewFlags;
use super::options::{self, RenderingMode};
use super::player::{MediaPlayer, NativeWindowHandle};
use super::publisher::{PresentedFrame, SubscriptionId};
use super::render::{CustomDrawOperation, InterpolationMode, Size};
use super::surface::Dpi;

/// ### English
/// Repaint request issued on the UI thread after a new frame was published.
///
/// ### 中文
/// 新帧发布后在 UI 线程发出的重绘请求。
pub type InvalidateFn = Arc<dyn Fn() + Send + Sync>;

pub struct VideoView {
    dispatcher: Arc<dyn UiDispatcher>,
    rendering_mode: RenderingMode,
    flags: ViewFlags,
    dpi: Dpi,
    interpolation: InterpolationMode,
    attached: bool,
    native_handle: Option<NativeWindowHandle>,
    player: Option<Arc<dyn MediaPlayer>>,
    provider: Option<VideoSourceProvider>,
    invalidate: Option<InvalidateFn>,
    invalidate_subscription: Option<SubscriptionId>,
    events: Arc<EventHub>,
}

impl VideoView {
    /// ### English
    /// Creates a detached view. `rendering_mode = None` uses the process-wide default from
    /// [`options::options`]. The custom-draw flag upgrades `SoftwareBitmap` to
    /// `SoftwareCustomDraw`.
    ///
    /// ### 中文
    /// 创建一个未挂载的视图。`rendering_mode = None` 时使用 [`options::options`] 中的进程级默认值。
    /// custom-draw 标记会把 `SoftwareBitmap` 升级为 `SoftwareCustomDraw`。
    pub fn new(
        dispatcher: Arc<dyn UiDispatcher>,
        rendering_mode: Option<RenderingMode>,
        flags: ViewFlags,
    ) -> Self {
        let mut rendering_mode = rendering_mode.unwrap_or_else(|| options::options().rendering_mode);
        if flags.custom_draw && rendering_mode == RenderingMode::SoftwareBitmap {
            rendering_mode = RenderingMode::SoftwareCustomDraw;
        }

        Self {
            events: EventHub::new(dispatcher.clone()),
            dispatcher,
            rendering_mode,
            flags,
            dpi: Dpi::DEFAULT,
            interpolation: InterpolationMode::default(),
            attached: false,
            native_handle: None,
            player: None,
            provider: None,
            invalidate: None,
            invalidate_subscription: None,
        }
    }

    pub fn rendering_mode(&self) -> RenderingMode {
        self.rendering_mode
    }

    pub fn is_attached(&self) -> bool {
        self.attached
    }

    pub fn events(&self) -> &Arc<EventHub> {
        &self.events
    }

    /// ### English
    /// Replaces the repaint callback. A running pipeline switches to the new callback at once.
    ///
    /// ### 中文
    /// 替换重绘回调；正在运行的管线会立即改用新回调。
    pub fn set_invalidate(&mut self, invalidate: Option<InvalidateFn>) {
        self.invalidate = invalidate;
        self.subscribe_invalidate();
    }

    /// ### English
    /// DPI of the software bitmap; applies from the next pipeline initialization.
    ///
    /// ### 中文
    /// 软件位图的 DPI；从下一次管线初始化起生效。
    pub fn set_dpi(&mut self, dpi: Dpi) {
        self.dpi = dpi;
    }

    pub fn set_interpolation(&mut self, interpolation: InterpolationMode) {
        self.interpolation = interpolation;
    }

    /// ### English
    /// Attaches the view to the scene graph.
    ///
    /// In native-handle mode `raw_handle` must be the host's platform surface handle; it is
    /// resolved once here. Software modes ignore it. Initializes the pipeline when a player is
    /// already associated.
    ///
    /// ### 中文
    /// 把视图挂载到场景图。
    ///
    /// 原生句柄模式下 `raw_handle` 必须是宿主的平台 surface 句柄，并且只在此解析一次；软件模式忽略它。
    /// 若已关联播放器，则初始化管线。
    pub fn attach(&mut self, raw_handle: Option<usize>) -> Result<()> {
        if self.rendering_mode == RenderingMode::NativeHandle {
            let raw = raw_handle.ok_or(BridgeError::MissingNativeHandle)?;
            self.native_handle = Some(NativeWindowHandle::for_current_platform(raw)?);
        }

        self.attached = true;
        self.init()
    }

    /// ### English
    /// Detaches the view: releases the pipeline and drops every event subscription.
    ///
    /// ### 中文
    /// 分离视图：释放管线并移除所有事件订阅。
    pub fn detach(&mut self) {
        if !self.attached {
            return;
        }
        self.attached = false;
        self.release_pipeline();
        self.events.clear();
        self.native_handle = None;
    }

    /// ### English
    /// Replaces the associated player (or clears it with `None`) and re-initializes the pipeline.
    /// Assigning the same player again is a no-op.
    ///
    /// ### 中文
    /// 替换关联的播放器（`None` 表示清除），并重新初始化管线。重复赋值同一个播放器为 no-op。
    pub fn set_media_player(&mut self, player: Option<Arc<dyn MediaPlayer>>) -> Result<()> {
        let unchanged = match (&self.player, &player) {
            (Some(current), Some(next)) => Arc::ptr_eq(current, next),
            (None, None) => true,
            _ => false,
        };
        if unchanged {
            return Ok(());
        }

        self.release_pipeline();
        self.player = player;
        self.init()
    }

    pub fn media_player(&self) -> Option<&Arc<dyn MediaPlayer>> {
        self.player.as_ref()
    }

    /// ### English
    /// The bindable "current frame resource". Always `None` in native-handle mode.
    ///
    /// ### 中文
    /// 可绑定的“当前帧资源”；原生句柄模式下始终为 `None`。
    pub fn video_source(&self) -> Option<PresentedFrame> {
        self.provider.as_ref()?.video_source()
    }

    pub fn subscribe_video_source(
        &self,
        subscriber: impl Fn(Option<&PresentedFrame>) + Send + Sync + 'static,
    ) -> Option<SubscriptionId> {
        let provider = self.provider.as_ref()?;
        Some(provider.bridge().frames().subscribe(subscriber))
    }

    pub fn stats(&self) -> Option<FrameStatsSnapshot> {
        Some(self.provider.as_ref()?.bridge().stats())
    }

    pub fn provider(&self) -> Option<&VideoSourceProvider> {
        self.provider.as_ref()
    }

    /// ### English
    /// Draw operation for the current frame in custom-draw mode; `None` in other modes or when
    /// there is no frame.
    ///
    /// ### 中文
    /// custom-draw 模式下当前帧的绘制操作；其它模式或无帧时返回 `None`。
    pub fn custom_draw_operation(&self, bounds: Size) -> Option<CustomDrawOperation> {
        if self.rendering_mode != RenderingMode::SoftwareCustomDraw {
            return None;
        }
        let surface = self.provider.as_ref()?.bridge().surface().clone();
        CustomDrawOperation::new(surface, bounds, self.interpolation)
    }

    fn init(&mut self) -> Result<()> {
        self.release_pipeline();
        if !self.attached {
            return Ok(());
        }
        let Some(player) = self.player.clone() else {
            return Ok(());
        };

        if !self.rendering_mode.is_software() {
            let handle = self.native_handle.ok_or(BridgeError::MissingNativeHandle)?;
            player.set_native_handle(handle)?;
            tracing::debug!(?handle, "player bound to native surface");
            return Ok(());
        }

        let config = BridgeConfig {
            keep_last_frame: self.flags.keep_last_frame,
            dpi: self.dpi,
        };
        self.provider = Some(VideoSourceProvider::init(
            player,
            self.dispatcher.clone(),
            config,
        ));
        self.subscribe_invalidate();
        Ok(())
    }

    fn subscribe_invalidate(&mut self) {
        let Some(provider) = self.provider.as_ref() else {
            return;
        };
        let frames = provider.bridge().frames();
        if let Some(id) = self.invalidate_subscription.take() {
            frames.unsubscribe(id);
        }
        if let Some(invalidate) = self.invalidate.clone() {
            self.invalidate_subscription = Some(frames.subscribe(move |_| invalidate()));
        }
    }

    fn release_pipeline(&mut self) {
        self.invalidate_subscription = None;
        if let Some(mut provider) = self.provider.take() {
            provider.bridge().frames().unsubscribe_all();
            provider.dispose();
        }
    }
}

impl Drop for VideoView {
    fn drop(&mut self) {
        self.detach();
        self.release_pipeline();
    }
}

impl std::fmt::Debug for VideoView {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VideoView")
            .field("rendering_mode", &self.rendering_mode)
            .field("attached", &self.attached)
            .field("has_player", &self.player.is_some())
            .field("provider", &self.provider)
            .finish_non_exhaustive()
    }
}
