//! ### English
//! C ABI bindings for view lifecycle and view-level requests.
//!
//! ### 中文
//! view 生命周期与 view 级别请求的 C ABI 绑定。

use std::ffi::c_void;
use std::sync::Arc;

use crate::engine::bridge::FrameStatsSnapshot;
use crate::engine::dispatch::UiThreadQueue;
use crate::engine::events::MediaEvent;
use crate::engine::flags::ViewFlags;
use crate::engine::options::RenderingMode;
use crate::engine::render::InterpolationMode;
use crate::engine::player::MediaPlayer;
use crate::engine::view::VideoView;

use super::player::{FfiMediaPlayer, VlcPlayerApi};
use super::{VLC_FRAME_BRIDGE_RENDERING_MODE_DEFAULT, VlcFrameBridgeView};

/// ### English
/// Host repaint callback and its user data.
///
/// ### 中文
/// 宿主的重绘回调及其 user data。
struct InvalidateTarget {
    callback: unsafe extern "C" fn(*mut c_void),
    user_data: usize,
}

impl InvalidateTarget {
    fn invoke(&self) {
        unsafe { (self.callback)(self.user_data as *mut c_void) };
    }
}

#[unsafe(no_mangle)]
/// ### English
/// Creates one view.
///
/// `rendering_mode` is one of `VLC_FRAME_BRIDGE_RENDERING_MODE_*` (0 = native handle,
/// 1 = software bitmap, 2 = software custom draw), or `VLC_FRAME_BRIDGE_RENDERING_MODE_DEFAULT`
/// to use the installed default. `view_flags` is a bitmask of `VLC_FRAME_BRIDGE_VIEW_FLAG_*`.
///
/// The calling thread becomes the view's UI thread.
///
/// Returns NULL for an unknown rendering mode.
///
/// ### 中文
/// 创建一个 view。
///
/// `rendering_mode` 取 `VLC_FRAME_BRIDGE_RENDERING_MODE_*` 之一（0 = 原生句柄，1 = 软件位图，
/// 2 = 软件自定义绘制），或 `VLC_FRAME_BRIDGE_RENDERING_MODE_DEFAULT` 表示使用已安装的默认值。
/// `view_flags` 为 `VLC_FRAME_BRIDGE_VIEW_FLAG_*` 的位掩码。
///
/// 调用线程会成为该 view 的 UI 线程。
///
/// 渲染模式未知时返回 NULL。
pub extern "C" fn vlc_frame_bridge_view_create(
    rendering_mode: u32,
    view_flags: u32,
) -> *mut VlcFrameBridgeView {
    let rendering_mode = if rendering_mode == VLC_FRAME_BRIDGE_RENDERING_MODE_DEFAULT {
        None
    } else {
        match RenderingMode::try_from(rendering_mode) {
            Ok(mode) => Some(mode),
            Err(err) => {
                tracing::warn!(%err, "view creation rejected");
                return std::ptr::null_mut();
            }
        }
    };

    let queue = Arc::new(UiThreadQueue::new());
    queue.bind_current_thread();
    let view = VideoView::new(queue.clone(), rendering_mode, ViewFlags::from_bits(view_flags));

    Box::into_raw(Box::new(VlcFrameBridgeView { view, queue }))
}

#[unsafe(no_mangle)]
/// ### English
/// Destroys a view created by `vlc_frame_bridge_view_create`.
///
/// Detaches the view first: video callbacks are unregistered from the player and the frame
/// buffers are freed before this returns.
///
/// ### 中文
/// 销毁由 `vlc_frame_bridge_view_create` 创建的 view。
///
/// 会先分离 view：返回前视频回调已从播放器注销，帧缓冲区已释放。
pub unsafe extern "C" fn vlc_frame_bridge_view_destroy(view: *mut VlcFrameBridgeView) {
    if view.is_null() {
        return;
    }
    unsafe {
        drop(Box::from_raw(view));
    }
}

#[unsafe(no_mangle)]
/// ### English
/// Attaches the view to the host's scene graph.
///
/// `native_handle` is the platform surface (HWND / NSView* / X11 window id) and is required in
/// native-handle mode; software modes ignore it.
///
/// Returns `false` if the handle is missing or unsupported on this platform.
///
/// ### 中文
/// 把 view 挂载到宿主的场景图。
///
/// `native_handle` 为平台 surface（HWND / NSView* / X11 窗口 id），原生句柄模式下必填，软件模式忽略。
///
/// 句柄缺失或当前平台不支持时返回 `false`。
pub unsafe extern "C" fn vlc_frame_bridge_view_attach(
    view: *mut VlcFrameBridgeView,
    native_handle: usize,
) -> bool {
    let Some(view) = (unsafe { view.as_mut() }) else {
        return false;
    };

    let handle = (native_handle != 0).then_some(native_handle);
    match view.view.attach(handle) {
        Ok(()) => true,
        Err(err) => {
            tracing::warn!(%err, "view attach failed");
            false
        }
    }
}

#[unsafe(no_mangle)]
/// ### English
/// Detaches the view: releases the frame pipeline and drops all event subscriptions.
///
/// ### 中文
/// 分离 view：释放帧管线并移除所有事件订阅。
pub unsafe extern "C" fn vlc_frame_bridge_view_detach(view: *mut VlcFrameBridgeView) {
    if let Some(view) = unsafe { view.as_mut() } {
        view.view.detach();
    }
}

#[unsafe(no_mangle)]
/// ### English
/// Associates a libvlc media player with the view (or clears it when `player` is NULL).
///
/// The previous player's callbacks are unregistered first. When `api` provides
/// `media_player_retain`, the player is retained until it is replaced or the view is destroyed.
///
/// ### 中文
/// 为 view 关联一个 libvlc 媒体播放器（`player` 为 NULL 时清除关联）。
///
/// 会先注销上一个播放器的回调。若 `api` 提供了 `media_player_retain`，播放器会被 retain，
/// 直到被替换或 view 被销毁。
pub unsafe extern "C" fn vlc_frame_bridge_view_set_player(
    view: *mut VlcFrameBridgeView,
    api: *const VlcPlayerApi,
    player: *mut c_void,
) -> bool {
    let Some(view) = (unsafe { view.as_mut() }) else {
        return false;
    };

    let player: Option<Arc<dyn MediaPlayer>> = if player.is_null() {
        None
    } else {
        let Some(api) = (unsafe { api.as_ref() }) else {
            return false;
        };
        match unsafe { FfiMediaPlayer::new(*api, player) } {
            Ok(player) => Some(Arc::new(player)),
            Err(err) => {
                tracing::warn!(%err, "invalid libvlc player table");
                return false;
            }
        }
    };

    match view.view.set_media_player(player) {
        Ok(()) => true,
        Err(err) => {
            tracing::warn!(%err, "media player assignment failed");
            false
        }
    }
}

#[unsafe(no_mangle)]
/// ### English
/// Installs the repaint callback invoked on the UI thread whenever a new frame is published.
///
/// Takes effect from the next player assignment / attach. Pass NULL to remove it.
///
/// ### 中文
/// 安装重绘回调：每次发布新帧时在 UI 线程调用。
///
/// 从下一次设置播放器 / attach 起生效。传入 NULL 表示移除。
pub unsafe extern "C" fn vlc_frame_bridge_view_set_invalidate(
    view: *mut VlcFrameBridgeView,
    callback: Option<unsafe extern "C" fn(*mut c_void)>,
    user_data: *mut c_void,
) {
    let Some(view) = (unsafe { view.as_mut() }) else {
        return;
    };

    let invalidate = callback.map(|callback| {
        let target = InvalidateTarget {
            callback,
            user_data: user_data as usize,
        };
        Arc::new(move || target.invoke()) as Arc<dyn Fn() + Send + Sync>
    });
    view.view.set_invalidate(invalidate);
}

#[unsafe(no_mangle)]
/// ### English
/// Runs the UI tasks queued by the decoder thread (frame publication, cleanup, events).
///
/// Call this from the host's UI loop (e.g. once per frame or when woken). Returns the number of
/// tasks executed.
///
/// ### 中文
/// 执行解码线程排入的 UI 任务（帧发布、cleanup、事件）。
///
/// 宿主应在 UI 循环中调用（例如每帧一次或被唤醒时）。返回执行的任务数量。
pub unsafe extern "C" fn vlc_frame_bridge_view_run_pending(view: *mut VlcFrameBridgeView) -> u32 {
    let Some(view) = (unsafe { view.as_ref() }) else {
        return 0;
    };
    u32::try_from(view.queue.run_pending()).unwrap_or(u32::MAX)
}

#[unsafe(no_mangle)]
/// ### English
/// Forwards a libvlc player event (`MediaEvent` ABI value) to the view's event subscribers.
///
/// Returns `false` for unknown events, or when the notification was suppressed or unobserved.
///
/// ### 中文
/// 把 libvlc 播放器事件（`MediaEvent` 的 ABI 值）转发给 view 的事件订阅者。
///
/// 事件未知、通知被抑制或无人监听时返回 `false`。
pub unsafe extern "C" fn vlc_frame_bridge_view_dispatch_event(
    view: *mut VlcFrameBridgeView,
    event: u32,
) -> bool {
    let Some(view) = (unsafe { view.as_ref() }) else {
        return false;
    };
    let Ok(event) = MediaEvent::try_from(event) else {
        return false;
    };
    view.view.events().dispatch(event)
}

#[unsafe(no_mangle)]
/// ### English
/// Writes the frame counters of the current stream into `out_stats`.
///
/// Returns `false` when the view has no software pipeline.
///
/// ### 中文
/// 把当前流的帧计数写入 `out_stats`。
///
/// view 没有软件管线时返回 `false`。
pub unsafe extern "C" fn vlc_frame_bridge_view_get_stats(
    view: *mut VlcFrameBridgeView,
    out_stats: *mut FrameStatsSnapshot,
) -> bool {
    let Some(view) = (unsafe { view.as_ref() }) else {
        return false;
    };
    if out_stats.is_null() {
        return false;
    }
    let Some(stats) = view.view.stats() else {
        return false;
    };
    unsafe { *out_stats = stats };
    true
}

#[unsafe(no_mangle)]
/// ### English
/// Sets the sampling quality reported to custom-draw callbacks (`InterpolationMode` ABI value).
///
/// Returns `false` for unknown values.
///
/// ### 中文
/// 设置传给自定义绘制回调的采样质量（`InterpolationMode` 的 ABI 值）。
///
/// 取值未知时返回 `false`。
pub unsafe extern "C" fn vlc_frame_bridge_view_set_interpolation(
    view: *mut VlcFrameBridgeView,
    interpolation: u32,
) -> bool {
    let Some(view) = (unsafe { view.as_mut() }) else {
        return false;
    };
    let Ok(interpolation) = InterpolationMode::try_from(interpolation) else {
        return false;
    };
    view.view.set_interpolation(interpolation);
    true
}
