//! ### English
//! libvlc media player supplied by the host as a function table plus a player pointer.
//!
//! ### 中文
//! 由宿主以函数表加播放器指针形式提供的 libvlc 媒体播放器。
use std::ffi::c_void;
use std::ptr::NonNull;

use crate::engine::error::{BridgeError, Result};
use crate::engine::player::{
    MediaPlayer, NativeWindowHandle, VideoCleanupCb, VideoDisplayCb, VideoFormatCb, VideoLockCb,
    VideoUnlockCb,
};

pub type SetCallbacksFn = unsafe extern "C" fn(
    *mut c_void,
    Option<VideoLockCb>,
    Option<VideoUnlockCb>,
    Option<VideoDisplayCb>,
    *mut c_void,
);
pub type SetFormatCallbacksFn =
    unsafe extern "C" fn(*mut c_void, Option<VideoFormatCb>, Option<VideoCleanupCb>);

#[repr(C)]
#[derive(Clone, Copy, Default)]
/// ### English
/// libvlc entry points provided by the embedder (usually resolved from `libvlc.so`/`libvlc.dll`).
///
/// `video_set_callbacks` and `video_set_format_callbacks` are required. The window-handle setters
/// are only needed for native-handle rendering; `media_player_retain`/`media_player_release` are
/// optional and, when present, keep the player alive while the bridge references it.
///
/// ### 中文
/// 由宿主提供的 libvlc 入口（通常从 `libvlc.so`/`libvlc.dll` 解析得到）。
///
/// `video_set_callbacks` 与 `video_set_format_callbacks` 为必填。窗口句柄 setter 仅在原生句柄渲染时需要；
/// `media_player_retain`/`media_player_release` 可选，提供时会在 bridge 引用播放器期间保持其存活。
pub struct VlcPlayerApi {
    pub video_set_callbacks: Option<SetCallbacksFn>,
    pub video_set_format_callbacks: Option<SetFormatCallbacksFn>,
    pub media_player_set_hwnd: Option<unsafe extern "C" fn(*mut c_void, *mut c_void)>,
    pub media_player_set_nsobject: Option<unsafe extern "C" fn(*mut c_void, *mut c_void)>,
    pub media_player_set_xwindow: Option<unsafe extern "C" fn(*mut c_void, u32)>,
    pub media_player_retain: Option<unsafe extern "C" fn(*mut c_void)>,
    pub media_player_release: Option<unsafe extern "C" fn(*mut c_void)>,
}

/// ### English
/// [`MediaPlayer`] over a raw `libvlc_media_player_t*`.
///
/// ### 中文
/// 基于原始 `libvlc_media_player_t*` 的 [`MediaPlayer`]。
pub(crate) struct FfiMediaPlayer {
    api: VlcPlayerApi,
    set_callbacks: SetCallbacksFn,
    set_format_callbacks: SetFormatCallbacksFn,
    player: NonNull<c_void>,
}

// libvlc player functions are thread-safe; the pointer is only passed back to them.
unsafe impl Send for FfiMediaPlayer {}
unsafe impl Sync for FfiMediaPlayer {}

impl FfiMediaPlayer {
    /// ### English
    /// Validates the table and retains the player.
    ///
    /// # Safety
    /// `player` must be a live `libvlc_media_player_t*` and every non-NULL entry of `api` must be
    /// the matching libvlc function.
    ///
    /// ### 中文
    /// 校验函数表并 retain 播放器。
    ///
    /// # Safety
    /// `player` 必须是存活的 `libvlc_media_player_t*`，且 `api` 中每个非 NULL 项必须是对应的 libvlc 函数。
    pub(crate) unsafe fn new(api: VlcPlayerApi, player: *mut c_void) -> Result<Self> {
        let player = NonNull::new(player).ok_or(BridgeError::NoPlayer)?;
        let (Some(set_callbacks), Some(set_format_callbacks)) =
            (api.video_set_callbacks, api.video_set_format_callbacks)
        else {
            return Err(BridgeError::NoPlayer);
        };

        if let Some(retain) = api.media_player_retain {
            unsafe { retain(player.as_ptr()) };
        }

        Ok(Self {
            api,
            set_callbacks,
            set_format_callbacks,
            player,
        })
    }
}

impl MediaPlayer for FfiMediaPlayer {
    fn set_video_format_callbacks(&self, format: VideoFormatCb, cleanup: VideoCleanupCb) {
        unsafe { (self.set_format_callbacks)(self.player.as_ptr(), Some(format), Some(cleanup)) };
    }

    fn set_video_callbacks(
        &self,
        lock: VideoLockCb,
        unlock: VideoUnlockCb,
        display: VideoDisplayCb,
        opaque: *mut c_void,
    ) {
        unsafe {
            (self.set_callbacks)(
                self.player.as_ptr(),
                Some(lock),
                Some(unlock),
                Some(display),
                opaque,
            )
        };
    }

    fn clear_video_callbacks(&self) {
        unsafe {
            (self.set_callbacks)(self.player.as_ptr(), None, None, None, std::ptr::null_mut());
            (self.set_format_callbacks)(self.player.as_ptr(), None, None);
        }
    }

    fn set_native_handle(&self, handle: NativeWindowHandle) -> Result<()> {
        let player = self.player.as_ptr();
        match handle {
            NativeWindowHandle::Hwnd(hwnd) => {
                let set = self
                    .api
                    .media_player_set_hwnd
                    .ok_or(BridgeError::UnsupportedPlatform)?;
                unsafe { set(player, hwnd as *mut c_void) };
            }
            NativeWindowHandle::NsObject(object) => {
                let set = self
                    .api
                    .media_player_set_nsobject
                    .ok_or(BridgeError::UnsupportedPlatform)?;
                unsafe { set(player, object as *mut c_void) };
            }
            NativeWindowHandle::XWindow(window) => {
                let set = self
                    .api
                    .media_player_set_xwindow
                    .ok_or(BridgeError::UnsupportedPlatform)?;
                unsafe { set(player, window) };
            }
        }
        Ok(())
    }
}

impl Drop for FfiMediaPlayer {
    fn drop(&mut self) {
        if let Some(release) = self.api.media_player_release {
            unsafe { release(self.player.as_ptr()) };
        }
    }
}
