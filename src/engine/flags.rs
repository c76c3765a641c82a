//! ### English
//! Bitflags controlling optional view behaviors.
//!
//! These are passed through the C ABI as a `u32` bitmask.
//!
//! ### 中文
//! 控制 view 可选行为的位标志（bitflags）。
//!
//! 通过 C ABI 以 `u32` 位掩码传入。

/// ### English
/// Forces the custom draw operation path for a software-rendered view, regardless of the rendering
/// mode it was created with.
///
/// Ignored for views in native-handle mode.
///
/// ### 中文
/// 强制软件渲染的 view 使用自定义绘制操作路径（无论创建时的渲染模式是什么）。
///
/// 对原生句柄模式的 view 无效。
pub const VLC_FRAME_BRIDGE_VIEW_FLAG_CUSTOM_DRAW: u32 = 1 << 0;

/// ### English
/// Keeps the last presented frame on screen when the player issues its cleanup callback
/// (playback stop). By default the image is cleared.
///
/// ### 中文
/// 播放器发出 cleanup 回调（停止播放）时保留最后一帧。默认会清空图像。
pub const VLC_FRAME_BRIDGE_VIEW_FLAG_KEEP_LAST_FRAME: u32 = 1 << 1;

const KNOWN_FLAGS: u32 =
    VLC_FRAME_BRIDGE_VIEW_FLAG_CUSTOM_DRAW | VLC_FRAME_BRIDGE_VIEW_FLAG_KEEP_LAST_FRAME;

/// ### English
/// Decoded view flags.
///
/// ### 中文
/// 解码后的 view 标志。
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ViewFlags {
    pub custom_draw: bool,
    pub keep_last_frame: bool,
}

impl ViewFlags {
    /// ### English
    /// Decodes a C ABI bitmask. Unknown bits are ignored (and logged).
    ///
    /// ### 中文
    /// 解码 C ABI 位掩码；未知位会被忽略（并记录日志）。
    pub fn from_bits(bits: u32) -> Self {
        if bits & !KNOWN_FLAGS != 0 {
            tracing::debug!(bits, "ignoring unknown view flag bits");
        }
        Self {
            custom_draw: bits & VLC_FRAME_BRIDGE_VIEW_FLAG_CUSTOM_DRAW != 0,
            keep_last_frame: bits & VLC_FRAME_BRIDGE_VIEW_FLAG_KEEP_LAST_FRAME != 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_known_bits_and_ignores_the_rest() {
        let flags = ViewFlags::from_bits(VLC_FRAME_BRIDGE_VIEW_FLAG_KEEP_LAST_FRAME | (1 << 9));
        assert!(flags.keep_last_frame);
        assert!(!flags.custom_draw);
        assert_eq!(ViewFlags::from_bits(0), ViewFlags::default());
    }
}
