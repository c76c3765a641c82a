//! ### English
//! Video format negotiation: pixel layout, alignment and the native scratch buffer the decoder
//! writes into.
//!
//! ### 中文
//! 视频格式协商：像素布局、对齐，以及解码器写入的原生 scratch 缓冲区。
mod negotiate;
mod scratch;

pub use negotiate::{NegotiatedFormat, negotiate};
pub use scratch::NativeScratchBuffer;

use dpi::PhysicalSize;

use super::error::{BridgeError, Result};

/// ### English
/// Row pitch and scanline count are aligned to this many bytes/lines.
///
/// ### 中文
/// 行跨度（pitch）与扫描线数量按此值对齐。
pub const FRAME_ALIGNMENT: u32 = 32;

/// ### English
/// Four-character code naming a raw pixel layout.
///
/// ### 中文
/// 标识原始像素布局的四字符码。
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct FourCc(pub [u8; 4]);

impl FourCc {
    pub const BGRA: Self = Self(*b"BGRA");
    pub const RV32: Self = Self(*b"RV32");

    pub fn as_bytes(&self) -> &[u8; 4] {
        &self.0
    }
}

impl std::fmt::Display for FourCc {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for byte in self.0 {
            write!(f, "{}", char::from(byte))?;
        }
        Ok(())
    }
}

/// ### English
/// Pixel layouts the surface can hold. The software path only ever negotiates `Bgra8888`.
///
/// ### 中文
/// surface 可持有的像素布局；软件路径只会协商 `Bgra8888`。
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum PixelFormat {
    #[default]
    Bgra8888,
}

impl PixelFormat {
    /// ### English
    /// Bytes per pixel in the single packed plane.
    ///
    /// ### 中文
    /// 单个打包平面中每像素的字节数。
    pub const fn bytes_per_pixel(self) -> u32 {
        match self {
            Self::Bgra8888 => 4,
        }
    }

    /// ### English
    /// Chroma code handed to the decoder.
    ///
    /// ### 中文
    /// 交给解码器的 chroma 码。
    pub const fn fourcc(self) -> FourCc {
        match self {
            Self::Bgra8888 => FourCc::BGRA,
        }
    }
}

/// ### English
/// Rounds `n` up to the next multiple of `m` (`n` itself when already aligned).
///
/// ### 中文
/// 把 `n` 向上取整到 `m` 的倍数（已对齐时返回 `n` 本身）。
#[inline]
pub const fn align(n: u32, m: u32) -> u32 {
    let rem = n % m;
    if rem == 0 { n } else { n + (m - rem) }
}

/// ### English
/// Frame layout negotiated once per stream / resolution change.
///
/// Invariants: `stride >= width * 4` and `lines >= height`, both aligned to [`FRAME_ALIGNMENT`].
///
/// ### 中文
/// 每次流/分辨率变化时协商一次的帧布局。
///
/// 不变式：`stride >= width * 4` 且 `lines >= height`，二者都按 [`FRAME_ALIGNMENT`] 对齐。
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct FrameFormat {
    pub pixel_format: PixelFormat,
    pub width: u32,
    pub height: u32,
    /// ### English
    /// Bytes per row (pitch), aligned.
    ///
    /// ### 中文
    /// 每行字节数（pitch），已对齐。
    pub stride: u32,
    /// ### English
    /// Number of allocated scanlines, aligned.
    ///
    /// ### 中文
    /// 分配的扫描线数量，已对齐。
    pub lines: u32,
}

impl FrameFormat {
    /// ### English
    /// Computes the aligned layout for a `width`x`height` frame.
    ///
    /// Fails with [`BridgeError::InvalidFormat`] for empty frames, layouts whose aligned size
    /// does not fit the decoder's 32-bit pitch/line fields, and buffers too large to address.
    ///
    /// ### 中文
    /// 计算 `width`x`height` 帧的对齐布局。
    ///
    /// 对空帧、对齐后尺寸超出解码器 32 位 pitch/line 字段的布局，以及大到无法寻址的缓冲区，
    /// 返回 [`BridgeError::InvalidFormat`]。
    pub fn new(pixel_format: PixelFormat, width: u32, height: u32) -> Result<Self> {
        let invalid = || BridgeError::InvalidFormat { width, height };
        if width == 0 || height == 0 {
            return Err(invalid());
        }

        let row_bytes = width
            .checked_mul(pixel_format.bytes_per_pixel())
            .filter(|bytes| bytes.checked_add(FRAME_ALIGNMENT).is_some())
            .ok_or_else(invalid)?;
        height.checked_add(FRAME_ALIGNMENT).ok_or_else(invalid)?;

        let stride = align(row_bytes, FRAME_ALIGNMENT);
        let lines = align(height, FRAME_ALIGNMENT);
        // `buffer_len` multiplies unchecked; the product must also fit a slice.
        (stride as usize)
            .checked_mul(lines as usize)
            .filter(|&bytes| bytes <= isize::MAX as usize)
            .ok_or_else(invalid)?;

        Ok(Self {
            pixel_format,
            width,
            height,
            stride,
            lines,
        })
    }

    pub fn size(&self) -> PhysicalSize<u32> {
        PhysicalSize::new(self.width, self.height)
    }

    /// ### English
    /// Total bytes of one frame buffer (`stride * lines`).
    ///
    /// ### 中文
    /// 单个帧缓冲区的总字节数（`stride * lines`）。
    pub fn buffer_len(&self) -> usize {
        self.stride as usize * self.lines as usize
    }
}

#[cfg(test)]
mod tests {
    use quickcheck::quickcheck;

    use super::*;

    #[test]
    fn align_boundaries_up_to_32() {
        for n in 1..=32u32 {
            assert_eq!(align(n, 32), 32, "n = {n}");
        }
        assert_eq!(align(0, 32), 0);
        assert_eq!(align(33, 32), 64);
        assert_eq!(align(64, 32), 64);
    }

    quickcheck! {
        fn align_is_smallest_multiple_not_below(n: u32) -> bool {
            let n = n % (u32::MAX / 2);
            let aligned = align(n, 32);
            aligned % 32 == 0 && aligned >= n && aligned - n < 32
                && (n % 32 != 0 || aligned == n)
        }
    }

    #[test]
    fn full_hd_layout() {
        let format = FrameFormat::new(PixelFormat::Bgra8888, 1920, 1080).unwrap();
        assert_eq!(format.stride, 7680);
        assert_eq!(format.lines, 1088);
        assert_eq!(format.buffer_len(), 7680 * 1088);
    }

    #[test]
    fn odd_sizes_pad_rows_and_lines() {
        let format = FrameFormat::new(PixelFormat::Bgra8888, 301, 17).unwrap();
        assert_eq!(format.stride, 1216);
        assert!(format.stride >= 301 * 4);
        assert_eq!(format.lines, 32);
    }

    #[test]
    fn rejects_empty_and_oversized_frames() {
        assert_eq!(
            FrameFormat::new(PixelFormat::Bgra8888, 0, 10),
            Err(BridgeError::InvalidFormat { width: 0, height: 10 })
        );
        assert!(FrameFormat::new(PixelFormat::Bgra8888, u32::MAX / 2, 10).is_err());
        assert!(FrameFormat::new(PixelFormat::Bgra8888, 10, u32::MAX).is_err());
    }

    #[test]
    fn rejects_layouts_whose_buffer_cannot_be_addressed() {
        // Both aligned fields fit in 32 bits, their product does not fit a slice.
        let width = (u32::MAX - 32) / 4;
        let height = u32::MAX - 32;
        assert_eq!(
            FrameFormat::new(PixelFormat::Bgra8888, width, height),
            Err(BridgeError::InvalidFormat { width, height })
        );
    }

    #[test]
    fn fourcc_displays_as_ascii() {
        assert_eq!(PixelFormat::Bgra8888.fourcc().to_string(), "BGRA");
        assert_eq!(FourCc::RV32.as_bytes(), b"RV32");
    }
}
