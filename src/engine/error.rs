//! ### English
//! Error type shared by the UI-thread side of the bridge.
//!
//! Decode-thread callbacks never return these across the native boundary; they log and fall back
//! to neutral values instead.
//!
//! ### 中文
//! bridge 的 UI 线程侧共用的错误类型。
//!
//! 解码线程回调不会把错误穿过 native 边界返回；它们只记录日志并返回中性值。

/// ### English
/// Errors surfaced to the embedder (UI thread).
///
/// ### 中文
/// 返回给宿主（UI 线程）的错误。
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum BridgeError {
    #[error("failed to allocate {bytes} bytes for the frame buffer")]
    Allocation { bytes: usize },

    #[error("invalid video format {width}x{height}")]
    InvalidFormat { width: u32, height: u32 },

    #[error("native window handles are not supported on this platform")]
    UnsupportedPlatform,

    #[error("the frame pipeline has been disposed")]
    Disposed,

    #[error("the view has no native window handle to hand to the player")]
    MissingNativeHandle,

    #[error("no media player is attached")]
    NoPlayer,

    #[error("unknown rendering mode {0}")]
    InvalidRenderingMode(u32),
}

pub type Result<T, E = BridgeError> = std::result::Result<T, E>;
