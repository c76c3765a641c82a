//! ### English
//! C ABI surface for `vlc_frame_bridge`.
//!
//! All exported symbols are `extern "C"` functions; structs are `#[repr(C)]`. View functions
//! must be called from the host's UI thread; the libvlc callback trampolines in `callbacks` run on
//! the decoder thread and never unwind into native code.
//! Strings passed from the host must be NUL-terminated UTF-8 (C string); they will be validated as
//! UTF-8 and will be truncated at the first NUL byte.
//!
//! ### 中文
//! `vlc_frame_bridge` 的 C ABI 接口层。
//!
//! 所有导出符号均为 `extern "C"` 函数；结构体使用 `#[repr(C)]`。view 相关函数必须在宿主 UI 线程调用；
//! `callbacks` 中的 libvlc 回调跳板运行在解码线程，且绝不会把 panic 传播进原生代码。
//! 宿主传入的字符串必须是以 NUL 结尾的 UTF-8（C 字符串）；Rust 会校验 UTF-8，
//! 且在遇到第一个 NUL 字节处截断。
mod abi;
pub(crate) mod callbacks;
mod frame;
mod player;
mod view;

pub use abi::{
    vlc_frame_bridge_abi_version, vlc_frame_bridge_install_options, vlc_frame_bridge_libvlc_dir,
};
pub use frame::{
    VlcFrameBridgeDrawFn, vlc_frame_bridge_view_copy_frame, vlc_frame_bridge_view_draw,
};
pub use player::VlcPlayerApi;
pub use view::{
    vlc_frame_bridge_view_attach, vlc_frame_bridge_view_create, vlc_frame_bridge_view_destroy,
    vlc_frame_bridge_view_detach, vlc_frame_bridge_view_dispatch_event,
    vlc_frame_bridge_view_get_stats, vlc_frame_bridge_view_run_pending,
    vlc_frame_bridge_view_set_interpolation, vlc_frame_bridge_view_set_invalidate,
    vlc_frame_bridge_view_set_player,
};

use std::ffi::{CStr, c_char};
use std::path::PathBuf;
use std::sync::Arc;

use crate::engine::dispatch::UiThreadQueue;
use crate::engine::publisher::PresentedFrame;
use crate::engine::view::VideoView;

#[repr(C)]
/// ### English
/// Opaque view handle. Owns the view binding and the UI task queue the host pumps with
/// `vlc_frame_bridge_view_run_pending`.
///
/// ### 中文
/// 不透明 view 句柄。持有视图绑定，以及宿主通过 `vlc_frame_bridge_view_run_pending` pump 的 UI 任务队列。
pub struct VlcFrameBridgeView {
    view: VideoView,
    queue: Arc<UiThreadQueue>,
}

#[repr(C)]
/// ### English
/// Process-wide defaults installed by `vlc_frame_bridge_install_options`.
///
/// ### 中文
/// 由 `vlc_frame_bridge_install_options` 安装的进程级默认配置。
pub struct VlcFrameBridgeOptions {
    /// ### English
    /// Default rendering mode (`VLC_FRAME_BRIDGE_RENDERING_MODE_*`).
    ///
    /// ### 中文
    /// 默认渲染模式（`VLC_FRAME_BRIDGE_RENDERING_MODE_*`）。
    pub rendering_mode: u32,
    /// ### English
    /// Optional directory containing the libvlc binaries (NULL or empty = unset).
    ///
    /// ### 中文
    /// 可选的 libvlc 二进制目录（NULL 或空字符串表示不设置）。
    pub libvlc_dir: *const c_char,
}

#[repr(C)]
#[derive(Clone, Copy, Default)]
/// ### English
/// Description of the latest presented frame.
///
/// The pixel buffer is `stride * lines` bytes of BGRA; only the first `width * 4` bytes of the
/// first `height` rows are picture content.
///
/// ### 中文
/// 最近呈现帧的描述。
///
/// 像素缓冲区为 `stride * lines` 字节的 BGRA；只有前 `height` 行的前 `width * 4` 字节是图像内容。
pub struct VlcFrameBridgeFrame {
    /// ### English
    /// Frame number within the current stream (starts at 1).
    ///
    /// ### 中文
    /// 当前流内的帧号（从 1 开始）。
    pub sequence: u64,
    pub width: u32,
    pub height: u32,
    pub stride: u32,
    pub lines: u32,
    /// ### English
    /// FourCC of the pixel layout, little-endian packed (`'B' | 'G' << 8 | ...`).
    ///
    /// ### 中文
    /// 像素布局的 FourCC，按小端打包（`'B' | 'G' << 8 | ...`）。
    pub chroma: u32,
    pub dpi_x: f64,
    pub dpi_y: f64,
}

/// ### English
/// C ABI version for `vlc_frame_bridge`.
///
/// ### 中文
/// `vlc_frame_bridge` 的 C ABI 版本号。
const VLC_FRAME_BRIDGE_ABI_VERSION: u32 = 1;

/// ### English
/// `rendering_mode` value meaning "use the installed default".
///
/// ### 中文
/// 表示“使用已安装默认值”的 `rendering_mode` 取值。
pub const VLC_FRAME_BRIDGE_RENDERING_MODE_DEFAULT: u32 = u32::MAX;

/// ### English
/// Describes the published frame without touching the surface; the DPI is filled in later from
/// the bitmap actually being read.
///
/// ### 中文
/// 在不访问 surface 的情况下描述已发布的帧；DPI 稍后由实际读取的位图填入。
impl From<&PresentedFrame> for VlcFrameBridgeFrame {
    fn from(value: &PresentedFrame) -> Self {
        let format = value.format;
        Self {
            sequence: value.sequence,
            width: format.width,
            height: format.height,
            stride: format.stride,
            lines: format.lines,
            chroma: u32::from_le_bytes(*format.pixel_format.fourcc().as_bytes()),
            dpi_x: 0.0,
            dpi_y: 0.0,
        }
    }
}

/// ### English
/// Converts an optional NUL-terminated UTF-8 C string into a `PathBuf`.
///
/// Returns `None` for NULL pointers, invalid UTF-8, or empty strings.
///
/// # Safety
/// `ptr` must be valid and point to a NUL-terminated string for the duration of the call.
///
/// ### 中文
/// 将可选的 NUL 结尾 UTF-8 C 字符串转换为 `PathBuf`。
///
/// 对 NULL 指针、UTF-8 非法或空字符串返回 `None`。
///
/// # Safety
/// `ptr` 在本次调用期间必须有效，并指向以 NUL 结尾的字符串。
unsafe fn cstr_to_path(ptr: *const c_char) -> Option<PathBuf> {
    if ptr.is_null() {
        return None;
    }

    let value = unsafe { CStr::from_ptr(ptr) }.to_str().ok()?;
    if value.is_empty() {
        return None;
    }

    Some(PathBuf::from(value))
}
