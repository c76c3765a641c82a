//! ### English
//! The native media player as seen by this crate: a sink for the video callbacks and for a
//! native window handle.
//!
//! ### 中文
//! 本 crate 视角下的原生媒体播放器：视频回调与原生窗口句柄的接收方。
use std::ffi::{c_char, c_uint, c_void};

use super::error::{BridgeError, Result};

/// ### English
/// `format(opaque_ref, chroma, width, height, pitches, lines) -> buffer_count` (0 = failure).
///
/// ### 中文
/// `format(opaque_ref, chroma, width, height, pitches, lines) -> buffer_count`（0 表示失败）。
pub type VideoFormatCb = unsafe extern "C" fn(
    *mut *mut c_void,
    *mut c_char,
    *mut c_uint,
    *mut c_uint,
    *mut c_uint,
    *mut c_uint,
) -> c_uint;
pub type VideoCleanupCb = unsafe extern "C" fn(*mut c_void);
pub type VideoLockCb = unsafe extern "C" fn(*mut c_void, *mut *mut c_void) -> *mut c_void;
pub type VideoUnlockCb = unsafe extern "C" fn(*mut c_void, *mut c_void, *const *mut c_void);
pub type VideoDisplayCb = unsafe extern "C" fn(*mut c_void, *mut c_void);

/// ### English
/// The five decode-thread entry points registered together with one opaque pointer.
///
/// ### 中文
/// 与同一个 opaque 指针一起注册的五个解码线程入口。
#[derive(Clone, Copy, Debug)]
pub struct VideoCallbacks {
    pub format: VideoFormatCb,
    pub cleanup: VideoCleanupCb,
    pub lock: VideoLockCb,
    pub unlock: VideoUnlockCb,
    pub display: VideoDisplayCb,
}

/// ### English
/// Platform surface handed to the player for direct compositing.
///
/// Resolved once at setup for the compile-target platform.
///
/// ### 中文
/// 交给播放器做直接合成的平台 surface。
///
/// 在初始化时按编译目标平台解析一次。
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NativeWindowHandle {
    /// ### English
    /// Win32 `HWND`.
    ///
    /// ### 中文
    /// Win32 `HWND`。
    Hwnd(isize),
    /// ### English
    /// Cocoa `NSView*` / `NSObject*`.
    ///
    /// ### 中文
    /// Cocoa `NSView*` / `NSObject*`。
    NsObject(usize),
    /// ### English
    /// X11 window id.
    ///
    /// ### 中文
    /// X11 窗口 id。
    XWindow(u32),
}

impl NativeWindowHandle {
    /// ### English
    /// Wraps the host's raw handle value in the variant of the current platform.
    ///
    /// Fails with [`BridgeError::MissingNativeHandle`] for a zero handle and with
    /// [`BridgeError::UnsupportedPlatform`] on platforms without a handle sink.
    ///
    /// ### 中文
    /// 把宿主的原始句柄值包装为当前平台对应的变体。
    ///
    /// 句柄为 0 时返回 [`BridgeError::MissingNativeHandle`]；没有句柄接收方的平台返回
    /// [`BridgeError::UnsupportedPlatform`]。
    pub fn for_current_platform(raw: usize) -> Result<Self> {
        if raw == 0 {
            return Err(BridgeError::MissingNativeHandle);
        }

        #[cfg(windows)]
        {
            Ok(Self::Hwnd(raw as isize))
        }

        #[cfg(target_os = "macos")]
        {
            Ok(Self::NsObject(raw))
        }

        #[cfg(all(unix, not(target_os = "macos"), not(target_os = "android")))]
        {
            u32::try_from(raw)
                .map(Self::XWindow)
                .map_err(|_| BridgeError::MissingNativeHandle)
        }

        #[cfg(not(any(windows, all(unix, not(target_os = "android")))))]
        {
            Err(BridgeError::UnsupportedPlatform)
        }
    }
}

/// ### English
/// Native player collaborator.
///
/// Registration calls come from the UI thread. After `set_video_callbacks` the player may invoke
/// the callbacks on its own decode thread at any time until `clear_video_callbacks` returns.
///
/// ### 中文
/// 原生播放器协作方。
///
/// 注册调用来自 UI 线程。`set_video_callbacks` 之后，播放器可在自己的解码线程随时调用这些回调，
/// 直到 `clear_video_callbacks` 返回为止。
pub trait MediaPlayer: Send + Sync {
    fn set_video_format_callbacks(&self, format: VideoFormatCb, cleanup: VideoCleanupCb);

    fn set_video_callbacks(
        &self,
        lock: VideoLockCb,
        unlock: VideoUnlockCb,
        display: VideoDisplayCb,
        opaque: *mut c_void,
    );

    /// ### English
    /// Unregisters all video callbacks (format, cleanup, lock, unlock, display).
    ///
    /// ### 中文
    /// 注销所有视频回调（format、cleanup、lock、unlock、display）。
    fn clear_video_callbacks(&self);

    fn set_native_handle(&self, handle: NativeWindowHandle) -> Result<()>;
}
