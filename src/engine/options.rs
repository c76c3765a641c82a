//! ### English
//! Process-wide bridge options (rendering mode, libvlc location).
//!
//! The embedder installs these once during application setup; views created afterwards pick up
//! the rendering mode unless they override it.
//!
//! ### 中文
//! 进程级 bridge 选项（渲染模式、libvlc 位置）。
//!
//! 宿主在应用启动阶段安装一次；之后创建的 view 默认使用这里的渲染模式（除非单独覆盖）。
use std::path::PathBuf;

use parking_lot::RwLock;

use super::error::BridgeError;

/// ### English
/// How a view gets video onto the screen.
///
/// ### 中文
/// view 显示视频的方式。
#[repr(u32)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum RenderingMode {
    /// ### English
    /// The player composites directly into the view's native window handle (no frame copies).
    ///
    /// ### 中文
    /// 播放器直接合成到 view 的原生窗口句柄（无帧拷贝）。
    #[default]
    NativeHandle = 0,
    /// ### English
    /// Frames are copied into a double-buffered bitmap and shown as an image source.
    ///
    /// ### 中文
    /// 帧被拷贝进双缓冲位图，并作为图像源显示。
    SoftwareBitmap = 1,
    /// ### English
    /// Same frame path as `SoftwareBitmap`, drawn through a custom draw operation.
    ///
    /// ### 中文
    /// 与 `SoftwareBitmap` 相同的帧路径，但通过自定义绘制操作绘制。
    SoftwareCustomDraw = 2,
}

impl RenderingMode {
    /// ### English
    /// Returns whether this mode uses the software frame pipeline.
    ///
    /// ### 中文
    /// 返回该模式是否使用软件帧管线。
    pub fn is_software(self) -> bool {
        !matches!(self, Self::NativeHandle)
    }
}

impl TryFrom<u32> for RenderingMode {
    type Error = BridgeError;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Self::NativeHandle),
            1 => Ok(Self::SoftwareBitmap),
            2 => Ok(Self::SoftwareCustomDraw),
            other => Err(BridgeError::InvalidRenderingMode(other)),
        }
    }
}

/// ### English
/// Bridge-wide options installed by the embedder.
///
/// ### 中文
/// 由宿主安装的 bridge 级选项。
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct BridgeOptions {
    /// ### English
    /// Default rendering mode for new views.
    ///
    /// ### 中文
    /// 新建 view 的默认渲染模式。
    pub rendering_mode: RenderingMode,
    /// ### English
    /// Directory libvlc should be loaded from; `None` means the system default.
    ///
    /// ### 中文
    /// libvlc 的加载目录；`None` 表示使用系统默认位置。
    pub libvlc_dir: Option<PathBuf>,
}

static OPTIONS: RwLock<BridgeOptions> = RwLock::new(BridgeOptions {
    rendering_mode: RenderingMode::NativeHandle,
    libvlc_dir: None,
});

/// ### English
/// Replaces the process-wide options.
///
/// ### 中文
/// 替换进程级选项。
pub fn install(options: BridgeOptions) {
    tracing::debug!(
        rendering_mode = ?options.rendering_mode,
        libvlc_dir = ?options.libvlc_dir,
        "installing bridge options"
    );
    *OPTIONS.write() = options;
}

/// ### English
/// Returns a snapshot of the process-wide options.
///
/// ### 中文
/// 返回进程级选项的快照。
pub fn options() -> BridgeOptions {
    OPTIONS.read().clone()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rendering_mode_round_trips_through_abi_values() {
        for mode in [
            RenderingMode::NativeHandle,
            RenderingMode::SoftwareBitmap,
            RenderingMode::SoftwareCustomDraw,
        ] {
            assert_eq!(RenderingMode::try_from(mode as u32), Ok(mode));
        }
        assert_eq!(
            RenderingMode::try_from(7),
            Err(BridgeError::InvalidRenderingMode(7))
        );
    }

    #[test]
    fn only_native_mode_skips_the_software_pipeline() {
        assert!(!RenderingMode::NativeHandle.is_software());
        assert!(RenderingMode::SoftwareBitmap.is_software());
        assert!(RenderingMode::SoftwareCustomDraw.is_software());
    }
}
