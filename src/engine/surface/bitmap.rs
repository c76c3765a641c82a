use dpi::PhysicalSize;

use crate::engine::error::{BridgeError, Result};
use crate::engine::format::{FrameFormat, PixelFormat};

/// ### English
/// Dots per inch of a bitmap, per axis.
///
/// ### 中文
/// 位图每个轴向的 DPI。
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Dpi {
    pub x: f64,
    pub y: f64,
}

impl Dpi {
    pub const DEFAULT: Self = Self { x: 96.0, y: 96.0 };

    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

impl Default for Dpi {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// ### English
/// One CPU-side frame buffer. Always allocated at the aligned layout (`stride * lines`), so a
/// full raw copy of the decoder's scratch buffer fits exactly.
///
/// ### 中文
/// 单个 CPU 侧帧缓冲区。始终按对齐后的布局（`stride * lines`）分配，
/// 因此对解码器 scratch 缓冲区的完整原始拷贝恰好能放下。
pub struct Bitmap {
    layout: FrameFormat,
    dpi: Dpi,
    pixels: Box<[u8]>,
}

impl Bitmap {
    pub(super) fn allocate(size: PhysicalSize<u32>, dpi: Dpi, format: PixelFormat) -> Result<Self> {
        let layout = FrameFormat::new(format, size.width, size.height)?;
        let bytes = layout.buffer_len();

        let mut pixels = Vec::new();
        pixels
            .try_reserve_exact(bytes)
            .map_err(|_| BridgeError::Allocation { bytes })?;
        pixels.resize(bytes, 0);

        Ok(Self {
            layout,
            dpi,
            pixels: pixels.into_boxed_slice(),
        })
    }

    pub(super) fn matches(&self, size: PhysicalSize<u32>, dpi: Dpi, format: PixelFormat) -> bool {
        self.layout.size() == size && self.dpi == dpi && self.layout.pixel_format == format
    }

    pub(super) fn lock(&mut self) -> LockedFramebuffer<'_> {
        LockedFramebuffer { bitmap: self }
    }

    /// ### English
    /// Logical pixel size (unaligned).
    ///
    /// ### 中文
    /// 逻辑像素尺寸（未对齐）。
    pub fn size(&self) -> PhysicalSize<u32> {
        self.layout.size()
    }

    pub fn dpi(&self) -> Dpi {
        self.dpi
    }

    pub fn pixel_format(&self) -> PixelFormat {
        self.layout.pixel_format
    }

    pub fn stride(&self) -> u32 {
        self.layout.stride
    }

    /// ### English
    /// Full aligned layout of this bitmap.
    ///
    /// ### 中文
    /// 该位图完整的对齐布局。
    pub fn layout(&self) -> &FrameFormat {
        &self.layout
    }

    /// ### English
    /// Raw bytes, including row and line padding.
    ///
    /// ### 中文
    /// 原始字节（包含行与扫描线填充）。
    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }

    /// ### English
    /// Bytes of row `y` without the row padding, or `None` past the logical height.
    ///
    /// ### 中文
    /// 第 `y` 行的字节（不含行填充）；超出逻辑高度时返回 `None`。
    pub fn row(&self, y: u32) -> Option<&[u8]> {
        if y >= self.layout.height {
            return None;
        }
        let start = y as usize * self.layout.stride as usize;
        let len = self.layout.width as usize * self.layout.pixel_format.bytes_per_pixel() as usize;
        self.pixels.get(start..start + len)
    }
}

impl std::fmt::Debug for Bitmap {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Bitmap")
            .field("layout", &self.layout)
            .field("dpi", &self.dpi)
            .finish_non_exhaustive()
    }
}

/// ### English
/// Scoped, writable view of the surface's write buffer handed to the fill action.
///
/// ### 中文
/// 交给填充动作的、surface 写缓冲区的限定作用域可写视图。
pub struct LockedFramebuffer<'a> {
    bitmap: &'a mut Bitmap,
}

impl LockedFramebuffer<'_> {
    pub fn size(&self) -> PhysicalSize<u32> {
        self.bitmap.size()
    }

    pub fn layout(&self) -> &FrameFormat {
        &self.bitmap.layout
    }

    pub fn dpi(&self) -> Dpi {
        self.bitmap.dpi
    }

    /// ### English
    /// Start address of the buffer.
    ///
    /// ### 中文
    /// 缓冲区起始地址。
    pub fn address(&mut self) -> *mut u8 {
        self.bitmap.pixels.as_mut_ptr()
    }

    pub fn as_mut_slice(&mut self) -> &mut [u8] {
        &mut self.bitmap.pixels
    }

    /// ### English
    /// Copies a full raw frame into the buffer. The source must be exactly the buffer length.
    ///
    /// ### 中文
    /// 把一整帧原始数据拷贝进缓冲区；源长度必须与缓冲区长度完全一致。
    pub fn copy_from(&mut self, source: &[u8]) -> Result<()> {
        if source.len() != self.bitmap.pixels.len() {
            let size = self.bitmap.size();
            return Err(BridgeError::InvalidFormat {
                width: size.width,
                height: size.height,
            });
        }
        self.bitmap.pixels.copy_from_slice(source);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn allocates_at_aligned_size_and_exposes_rows() {
        let mut bitmap =
            Bitmap::allocate(PhysicalSize::new(3, 2), Dpi::DEFAULT, PixelFormat::Bgra8888).unwrap();
        assert_eq!(bitmap.stride(), 32);
        assert_eq!(bitmap.pixels().len(), 32 * 32);

        bitmap.lock().as_mut_slice()[32..44].fill(7);
        assert_eq!(bitmap.row(1), Some(&[7u8; 12][..]));
        assert_eq!(bitmap.row(0), Some(&[0u8; 12][..]));
        assert_eq!(bitmap.row(2), None);
    }

    #[test]
    fn copy_rejects_mismatched_sources() {
        let mut bitmap =
            Bitmap::allocate(PhysicalSize::new(8, 8), Dpi::DEFAULT, PixelFormat::Bgra8888).unwrap();
        let mut fb = bitmap.lock();
        assert!(fb.copy_from(&[1u8; 16]).is_err());
        let len = fb.layout().buffer_len();
        assert!(fb.copy_from(&vec![9u8; len]).is_ok());
        assert!(bitmap.pixels().iter().all(|&b| b == 9));
    }
}
