//! ### English
//! `extern "C"` trampolines registered with libvlc.
//!
//! libvlc calls these on its decoder thread with the opaque pointer registered by
//! [`VideoSourceProvider::init`](crate::engine::bridge::VideoSourceProvider::init), which points
//! at a live [`CallbackBridge`]. Each body runs inside [`ffi_boundary_or`] so a panic becomes a
//! logged neutral return value instead of unwinding into the decoder.
//!
//! ### 中文
//! 注册给 libvlc 的 `extern "C"` 跳板函数。
//!
//! libvlc 在其解码线程上以 [`VideoSourceProvider::init`](crate::engine::bridge::VideoSourceProvider::init)
//! 注册的 opaque 指针调用它们，该指针指向一个存活的 [`CallbackBridge`]。每个函数体都在
//! [`ffi_boundary_or`] 内运行，panic 会变成带日志的中性返回值，而不会 unwind 进解码器。
use std::ffi::{c_char, c_uint, c_void};
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::ptr;

use crate::engine::bridge::CallbackBridge;
use crate::engine::player::VideoCallbacks;

/// ### English
/// The table handed to [`MediaPlayer`](crate::engine::player::MediaPlayer) registration.
///
/// ### 中文
/// 交给 [`MediaPlayer`](crate::engine::player::MediaPlayer) 注册的回调表。
pub(crate) const VIDEO_CALLBACKS: VideoCallbacks = VideoCallbacks {
    format: video_format,
    cleanup: video_cleanup,
    lock: video_lock,
    unlock: video_unlock,
    display: video_display,
};

/// ### English
/// Runs `f`, returning `default` if it panics. The panic is logged, never propagated.
///
/// ### 中文
/// 运行 `f`；若其 panic 则返回 `default`。panic 只记录日志，不会继续传播。
fn ffi_boundary_or<T>(default: T, callback: &'static str, f: impl FnOnce() -> T) -> T {
    match catch_unwind(AssertUnwindSafe(f)) {
        Ok(value) => value,
        Err(_panic) => {
            tracing::error!(callback, "caught Rust panic at the libvlc callback boundary");
            default
        }
    }
}

/// ### English
/// Reborrows the opaque pointer as the bridge.
///
/// # Safety
/// `opaque` must be NULL or the pointer registered by `VideoSourceProvider::init`, whose strong
/// reference outlives the registration.
///
/// ### 中文
/// 把 opaque 指针重新借用为 bridge。
///
/// # Safety
/// `opaque` 必须为 NULL，或为 `VideoSourceProvider::init` 注册的指针（其强引用存活时间长于注册期）。
unsafe fn bridge<'a>(opaque: *mut c_void) -> Option<&'a CallbackBridge> {
    unsafe { opaque.cast::<CallbackBridge>().as_ref() }
}

unsafe extern "C" fn video_format(
    opaque: *mut *mut c_void,
    chroma: *mut c_char,
    width: *mut c_uint,
    height: *mut c_uint,
    pitches: *mut c_uint,
    lines: *mut c_uint,
) -> c_uint {
    ffi_boundary_or(0, "format", || {
        if opaque.is_null()
            || chroma.is_null()
            || width.is_null()
            || height.is_null()
            || pitches.is_null()
            || lines.is_null()
        {
            return 0;
        }

        let Some(bridge) = (unsafe { bridge(*opaque) }) else {
            return 0;
        };
        let (requested_width, requested_height) = unsafe { (*width, *height) };
        let Some(reply) = bridge.format(requested_width, requested_height) else {
            return 0;
        };

        unsafe {
            ptr::copy_nonoverlapping(reply.chroma.as_bytes().as_ptr().cast::<c_char>(), chroma, 4);
            *pitches = reply.pitch;
            *lines = reply.lines;
        }
        reply.buffer_count
    })
}

unsafe extern "C" fn video_cleanup(opaque: *mut c_void) {
    ffi_boundary_or((), "cleanup", || {
        if let Some(bridge) = unsafe { bridge(opaque) } {
            bridge.cleanup();
        }
    });
}

unsafe extern "C" fn video_lock(opaque: *mut c_void, planes: *mut *mut c_void) -> *mut c_void {
    ffi_boundary_or(ptr::null_mut(), "lock", || {
        let Some(bridge) = (unsafe { bridge(opaque) }) else {
            return ptr::null_mut();
        };
        let plane = bridge.lock();
        if !planes.is_null() {
            unsafe { *planes = plane };
        }
        plane
    })
}

unsafe extern "C" fn video_unlock(
    opaque: *mut c_void,
    _picture: *mut c_void,
    _planes: *const *mut c_void,
) {
    ffi_boundary_or((), "unlock", || {
        if let Some(bridge) = unsafe { bridge(opaque) } {
            bridge.unlock();
        }
    });
}

unsafe extern "C" fn video_display(opaque: *mut c_void, _picture: *mut c_void) {
    ffi_boundary_or((), "display", || {
        if let Some(bridge) = unsafe { bridge(opaque) } {
            bridge.display();
        }
    });
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::engine::bridge::BridgeConfig;
    use crate::engine::dispatch::UiThreadQueue;

    #[test]
    fn null_arguments_are_neutral() {
        unsafe {
            assert_eq!(
                (VIDEO_CALLBACKS.format)(
                    ptr::null_mut(),
                    ptr::null_mut(),
                    ptr::null_mut(),
                    ptr::null_mut(),
                    ptr::null_mut(),
                    ptr::null_mut()
                ),
                0
            );
            assert!((VIDEO_CALLBACKS.lock)(ptr::null_mut(), ptr::null_mut()).is_null());
            (VIDEO_CALLBACKS.unlock)(ptr::null_mut(), ptr::null_mut(), ptr::null());
            (VIDEO_CALLBACKS.display)(ptr::null_mut(), ptr::null_mut());
            (VIDEO_CALLBACKS.cleanup)(ptr::null_mut());
        }
    }

    #[test]
    fn format_writes_chroma_and_layout() {
        let queue = Arc::new(UiThreadQueue::new());
        assert!(queue.bind_current_thread());
        let bridge = CallbackBridge::new(queue, BridgeConfig::default());
        let mut opaque = Arc::as_ptr(&bridge).cast_mut().cast::<c_void>();

        let mut chroma = [0 as c_char; 4];
        let (mut width, mut height, mut pitch, mut lines) = (1920, 1080, 0, 0);
        let count = unsafe {
            (VIDEO_CALLBACKS.format)(
                &mut opaque,
                chroma.as_mut_ptr(),
                &mut width,
                &mut height,
                &mut pitch,
                &mut lines,
            )
        };
        assert_eq!(count, 1);
        assert_eq!(chroma.map(|c| c as u8), *b"BGRA");
        assert_eq!((pitch, lines), (7680, 1088));

        let mut plane = ptr::null_mut();
        let picture = unsafe { (VIDEO_CALLBACKS.lock)(opaque, &mut plane) };
        assert!(!picture.is_null());
        assert_eq!(picture, plane);
    }

    #[test]
    fn panics_become_defaults() {
        let value = ffi_boundary_or(7u32, "test", || panic!("boom"));
        assert_eq!(value, 7);
    }
}
