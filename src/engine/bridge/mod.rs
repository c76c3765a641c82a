//! ### English
//! Frame callback bridge and the video source provider that registers it with a player.
//!
//! Data flow per frame: `lock` hands the scratch buffer to the decoder, the decoder fills it,
//! `display` copies it into the [`FrameSurface`] and publishes a [`PresentedFrame`]. The bridge
//! never waits for the UI thread; it only takes the surface locks for one copy and one swap.
//!
//! ### 中文
//! 帧回调 bridge，以及把它注册到播放器的视频源 provider。
//!
//! 每帧数据流：`lock` 把 scratch 缓冲区交给解码器，解码器填充后，`display` 将其拷贝进
//! [`FrameSurface`] 并发布 [`PresentedFrame`]。bridge 从不等待 UI 线程，只在一次拷贝与一次交换期间持有
//! surface 的锁。
mod callbacks;
mod stats;

pub use callbacks::FormatReply;
pub use stats::{FrameStats, FrameStatsSnapshot};

use std::sync::Arc;
use std::sync::atomic::AtomicU64;

use parking_lot::Mutex;

use super::dispatch::UiDispatcher;
use super::format::{FrameFormat, NativeScratchBuffer};
use super::lifecycle::{LifecycleGuard, LifecycleState};
use super::player::MediaPlayer;
use super::publisher::{PresentationSlot, PresentedFrame};
use super::surface::{Dpi, FrameSurface};

/// ### English
/// Per-provider settings.
///
/// ### 中文
/// 每个 provider 的配置。
#[derive(Clone, Copy, Debug, Default)]
pub struct BridgeConfig {
    /// ### English
    /// Keep showing the last frame after the player's cleanup callback.
    ///
    /// ### 中文
    /// 播放器 cleanup 回调后继续显示最后一帧。
    pub keep_last_frame: bool,
    pub dpi: Dpi,
}

/// ### English
/// State shared between the decode-thread callbacks and the UI thread.
///
/// ### 中文
/// 解码线程回调与 UI 线程共享的状态。
pub struct CallbackBridge {
    guard: LifecycleGuard,
    /// ### English
    /// Exactly one live scratch buffer between negotiation and cleanup.
    ///
    /// ### 中文
    /// 在协商与 cleanup 之间恰好存在一个 scratch 缓冲区。
    scratch: Mutex<Option<NativeScratchBuffer>>,
    surface: Arc<FrameSurface>,
    frames: Arc<PresentationSlot<PresentedFrame>>,
    formats: Arc<PresentationSlot<FrameFormat>>,
    dispatcher: Arc<dyn UiDispatcher>,
    stats: FrameStats,
    sequence: AtomicU64,
    config: BridgeConfig,
}

impl CallbackBridge {
    pub fn new(dispatcher: Arc<dyn UiDispatcher>, config: BridgeConfig) -> Arc<Self> {
        Arc::new(Self {
            guard: LifecycleGuard::new(),
            scratch: Mutex::new(None),
            surface: Arc::new(FrameSurface::new()),
            frames: PresentationSlot::new(dispatcher.clone()),
            formats: PresentationSlot::new(dispatcher.clone()),
            dispatcher,
            stats: FrameStats::default(),
            sequence: AtomicU64::new(0),
            config,
        })
    }

    pub fn state(&self) -> LifecycleState {
        self.guard.state()
    }

    pub fn surface(&self) -> &Arc<FrameSurface> {
        &self.surface
    }

    /// ### English
    /// The "current frame resource" the GUI binds to.
    ///
    /// ### 中文
    /// GUI 绑定的“当前帧资源”。
    pub fn frames(&self) -> &Arc<PresentationSlot<PresentedFrame>> {
        &self.frames
    }

    /// ### English
    /// Announces every negotiated format; render-stat overlays reset their counters on it.
    ///
    /// ### 中文
    /// 发布每次协商出的格式；渲染统计浮层据此重置计数。
    pub fn formats(&self) -> &Arc<PresentationSlot<FrameFormat>> {
        &self.formats
    }

    pub fn stats(&self) -> FrameStatsSnapshot {
        self.stats.snapshot(self.surface.rendered_count())
    }

    pub fn has_scratch(&self) -> bool {
        self.scratch.lock().is_some()
    }
}

/// ### English
/// Software video source for one player: registers the bridge callbacks and tears them down
/// exactly once.
///
/// The opaque pointer handed to the player is backed by `native_ref`, a strong reference that
/// lives until the callbacks are unregistered and every in-flight callback has returned.
///
/// ### 中文
/// 单个播放器的软件视频源：注册 bridge 回调，并且只 teardown 一次。
///
/// 交给播放器的 opaque 指针由 `native_ref` 支撑；这个强引用一直存活到回调注销且所有 in-flight
/// 回调返回为止。
pub struct VideoSourceProvider {
    bridge: Arc<CallbackBridge>,
    player: Arc<dyn MediaPlayer>,
    native_ref: Option<Arc<CallbackBridge>>,
}

impl VideoSourceProvider {
    /// ### English
    /// Creates the bridge and registers the format and frame callbacks on `player`.
    ///
    /// ### 中文
    /// 创建 bridge，并在 `player` 上注册格式与帧回调。
    pub fn init(
        player: Arc<dyn MediaPlayer>,
        dispatcher: Arc<dyn UiDispatcher>,
        config: BridgeConfig,
    ) -> Self {
        let bridge = CallbackBridge::new(dispatcher, config);
        let native_ref = bridge.clone();
        let opaque = Arc::as_ptr(&native_ref).cast_mut().cast();

        let callbacks = crate::ffi::callbacks::VIDEO_CALLBACKS;
        player.set_video_format_callbacks(callbacks.format, callbacks.cleanup);
        player.set_video_callbacks(callbacks.lock, callbacks.unlock, callbacks.display, opaque);
        tracing::debug!(?config, "video callbacks registered");

        Self {
            bridge,
            player,
            native_ref: Some(native_ref),
        }
    }

    pub fn bridge(&self) -> &Arc<CallbackBridge> {
        &self.bridge
    }

    /// ### English
    /// Latest presented frame, if any.
    ///
    /// ### 中文
    /// 最近呈现的帧（如有）。
    pub fn video_source(&self) -> Option<PresentedFrame> {
        self.bridge.frames.current()
    }

    pub fn is_disposed(&self) -> bool {
        self.bridge.state() == LifecycleState::Disposed
    }

    /// ### English
    /// Unregisters the callbacks, waits for in-flight ones, then frees the scratch buffer and
    /// clears the published image. Idempotent; also run on drop.
    ///
    /// ### 中文
    /// 注销回调并等待 in-flight 回调结束，然后释放 scratch 缓冲区并清空已发布的图像。
    /// 幂等；drop 时也会执行。
    pub fn dispose(&mut self) {
        let bridge = &self.bridge;
        if !bridge.guard.begin_dispose() {
            return;
        }

        self.player.clear_video_callbacks();
        bridge.guard.wait_for_callbacks();

        drop(bridge.scratch.lock().take());
        bridge.surface.dispose();
        bridge.frames.publish(None);
        drop(self.native_ref.take());

        bridge.guard.finish_dispose();
        tracing::debug!("video source disposed");
    }
}

impl Drop for VideoSourceProvider {
    fn drop(&mut self) {
        self.dispose();
    }
}

impl std::fmt::Debug for VideoSourceProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VideoSourceProvider")
            .field("state", &self.bridge.state())
            .field("surface", &self.bridge.surface)
            .finish_non_exhaustive()
    }
}
