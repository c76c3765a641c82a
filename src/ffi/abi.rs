use std::ffi::c_char;

use crate::engine::options::{self, BridgeOptions, RenderingMode};

use super::{VLC_FRAME_BRIDGE_RENDERING_MODE_DEFAULT, VlcFrameBridgeOptions};

#[unsafe(no_mangle)]
/// ### English
/// Returns the C ABI version.
///
/// ### 中文
/// 返回 C ABI 版本号。
pub extern "C" fn vlc_frame_bridge_abi_version() -> u32 {
    super::VLC_FRAME_BRIDGE_ABI_VERSION
}

#[unsafe(no_mangle)]
/// ### English
/// Installs process-wide defaults (rendering mode, libvlc directory).
///
/// Call once during application startup, before creating views. Views created earlier keep the
/// mode they were created with.
///
/// Returns `false` if `options` is NULL or the rendering mode is unknown.
///
/// ### 中文
/// 安装进程级默认配置（渲染模式、libvlc 目录）。
///
/// 应在应用启动、创建 view 之前调用一次；此前已创建的 view 保持创建时的模式。
///
/// `options` 为空指针或渲染模式未知时返回 `false`。
pub unsafe extern "C" fn vlc_frame_bridge_install_options(
    options: *const VlcFrameBridgeOptions,
) -> bool {
    let Some(raw) = (unsafe { options.as_ref() }) else {
        return false;
    };

    let rendering_mode = if raw.rendering_mode == VLC_FRAME_BRIDGE_RENDERING_MODE_DEFAULT {
        RenderingMode::default()
    } else {
        match RenderingMode::try_from(raw.rendering_mode) {
            Ok(mode) => mode,
            Err(err) => {
                tracing::warn!(%err, "rejecting bridge options");
                return false;
            }
        }
    };

    options::install(BridgeOptions {
        rendering_mode,
        libvlc_dir: unsafe { super::cstr_to_path(raw.libvlc_dir) },
    });
    true
}

#[unsafe(no_mangle)]
/// ### English
/// Reads the installed libvlc directory as a NUL-terminated UTF-8 string.
///
/// The host's libvlc loader calls this before resolving the `VlcPlayerApi` entry points. Returns
/// the buffer size required including the NUL terminator, or 0 when no directory is installed.
/// The string is written only when `buf` is non-NULL and `len` is at least that size, so the host
/// can query with a NULL buffer first.
///
/// ### 中文
/// 以 NUL 结尾的 UTF-8 字符串形式读取已安装的 libvlc 目录。
///
/// 宿主的 libvlc 加载器在解析 `VlcPlayerApi` 入口之前调用它。返回包含 NUL 结尾在内所需的缓冲区大小；
/// 未安装目录时返回 0。仅当 `buf` 非 NULL 且 `len` 不小于该大小时才写入，因此宿主可先传 NULL 查询。
pub unsafe extern "C" fn vlc_frame_bridge_libvlc_dir(buf: *mut c_char, len: usize) -> usize {
    let Some(dir) = options::options().libvlc_dir else {
        return 0;
    };
    let Some(dir) = dir.to_str() else {
        return 0;
    };

    let required = dir.len() + 1;
    if !buf.is_null() && len >= required {
        unsafe {
            std::ptr::copy_nonoverlapping(dir.as_ptr().cast::<c_char>(), buf, dir.len());
            *buf.add(dir.len()) = 0;
        }
    }
    required
}
