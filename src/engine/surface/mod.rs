//! ### English
//! Double-buffered frame surface shared between the decode thread (writer) and the UI thread
//! (reader).
//!
//! Two independent lock domains: the write lock covers reallocation and the fill, the read lock
//! only covers the reference swap and the consumer's access. A slow consumer therefore stalls
//! the decoder at most for the swap, never for a whole fill.
//!
//! ### 中文
//! 在解码线程（写端）与 UI 线程（读端）之间共享的双缓冲帧 surface。
//!
//! 两个独立的锁域：写锁覆盖重新分配与填充，读锁只覆盖引用交换与消费者访问。
//! 因此慢速消费者最多只会在交换瞬间阻塞解码器，而不会阻塞整个填充过程。
mod bitmap;

pub use bitmap::{Bitmap, Dpi, LockedFramebuffer};

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use dpi::PhysicalSize;
use parking_lot::Mutex;

use super::error::{BridgeError, Result};
use super::format::PixelFormat;

/// ### English
/// Thread-safe double-buffered image resource.
///
/// `read` is either empty or a fully written frame; `write` is never observed by a consumer.
/// Slots are only reachable through the scoped [`FrameSurface::write`] / [`FrameSurface::read`]
/// accessors.
///
/// ### 中文
/// 线程安全的双缓冲图像资源。
///
/// `read` 要么为空，要么是一帧完整写入的图像；`write` 永远不会被消费者看到。
/// 槽位只能通过限定作用域的 [`FrameSurface::write`] / [`FrameSurface::read`] 访问。
#[derive(Default)]
pub struct FrameSurface {
    write: Mutex<Option<Bitmap>>,
    read: Mutex<Option<Bitmap>>,
    /// ### English
    /// Bumped on every completed write and on clear.
    ///
    /// ### 中文
    /// 每次写入完成或 clear 时递增。
    generation: AtomicU64,
    rendered: AtomicU64,
    disposed: AtomicBool,
}

impl FrameSurface {
    pub fn new() -> Self {
        Self::default()
    }

    /// ### English
    /// Fills the write buffer and swaps it in as the new read buffer.
    ///
    /// The write buffer is reallocated first if `size`, `dpi` or `format` differ from its current
    /// allocation. `fill` returns whether the frame is complete; `false` skips the swap so the
    /// consumer keeps seeing the previous frame. After a committed write the former read buffer
    /// becomes the write buffer for the next call.
    ///
    /// #### Parameters
    /// - `size`: Logical pixel size of the frame.
    /// - `dpi`: Bitmap DPI.
    /// - `format`: Pixel layout.
    /// - `fill`: Writes the frame through a locked view of the write buffer.
    ///
    /// Returns `Ok(true)` when the frame was swapped in.
    ///
    /// ### 中文
    /// 填充写缓冲区，并将其交换为新的读缓冲区。
    ///
    /// 若 `size`、`dpi` 或 `format` 与写缓冲区当前分配不同，会先重新分配。`fill` 返回该帧是否完整；
    /// 返回 `false` 时跳过交换，消费者继续看到上一帧。提交后，原读缓冲区成为下一次调用的写缓冲区。
    ///
    /// #### 参数
    /// - `size`：帧的逻辑像素尺寸。
    /// - `dpi`：位图 DPI。
    /// - `format`：像素布局。
    /// - `fill`：通过写缓冲区的锁定视图写入该帧。
    ///
    /// 帧被交换进读缓冲区时返回 `Ok(true)`。
    pub fn write(
        &self,
        size: PhysicalSize<u32>,
        dpi: Dpi,
        format: PixelFormat,
        fill: impl FnOnce(&mut LockedFramebuffer<'_>) -> bool,
    ) -> Result<bool> {
        let mut write = self.write.lock();
        if self.disposed.load(Ordering::Acquire) {
            return Err(BridgeError::Disposed);
        }

        let reuse = write
            .as_ref()
            .is_some_and(|bitmap| bitmap.matches(size, dpi, format));
        if !reuse {
            *write = None;
            *write = Some(Bitmap::allocate(size, dpi, format)?);
        }

        let Some(bitmap) = write.as_mut() else {
            return Ok(false);
        };
        if !fill(&mut bitmap.lock()) {
            return Ok(false);
        }

        {
            let mut read = self.read.lock();
            std::mem::swap(&mut *read, &mut *write);
        }
        self.generation.fetch_add(1, Ordering::Release);
        Ok(true)
    }

    /// ### English
    /// Runs `consumer` against the current read buffer, if any.
    ///
    /// ### 中文
    /// 若存在读缓冲区，则以其调用 `consumer`。
    pub fn read<R>(&self, consumer: impl FnOnce(&Bitmap) -> R) -> Option<R> {
        let read = self.read.lock();
        read.as_ref().map(consumer)
    }

    /// ### English
    /// Reads the current frame for painting and counts it as rendered.
    ///
    /// ### 中文
    /// 读取当前帧用于绘制，并计入已渲染计数。
    pub fn render(&self, sink: impl FnOnce(&Bitmap)) -> bool {
        let drawn = self.read(sink).is_some();
        if drawn {
            self.rendered.fetch_add(1, Ordering::Relaxed);
        }
        drawn
    }

    /// ### English
    /// Drops both slots (write side first). Used when the stream stops.
    ///
    /// ### 中文
    /// 释放两个槽位（先写端）。在流停止时使用。
    pub fn clear(&self) {
        let mut write = self.write.lock();
        self.clear_locked(&mut write);
    }

    /// ### English
    /// Clears the surface only if no write or clear happened since `generation` was observed.
    ///
    /// The check and the clear both run under the write lock, so a frame committed concurrently
    /// is never wiped. Returns whether the surface was cleared.
    ///
    /// ### 中文
    /// 仅当观察到 `generation` 之后没有发生写入或 clear 时才清空 surface。
    ///
    /// 检查与清空都在写锁下进行，因此并发提交的帧绝不会被清掉。返回是否执行了清空。
    pub fn clear_if_unchanged(&self, generation: u64) -> bool {
        let mut write = self.write.lock();
        if self.generation.load(Ordering::Acquire) != generation {
            return false;
        }
        self.clear_locked(&mut write);
        true
    }

    fn clear_locked(&self, write: &mut Option<Bitmap>) {
        *write = None;
        *self.read.lock() = None;
        self.generation.fetch_add(1, Ordering::Release);
    }

    /// ### English
    /// Clears the surface and rejects further writes. Idempotent.
    ///
    /// ### 中文
    /// 清空 surface 并拒绝后续写入。幂等。
    pub fn dispose(&self) {
        if self.disposed.swap(true, Ordering::AcqRel) {
            return;
        }
        self.clear();
    }

    pub fn is_disposed(&self) -> bool {
        self.disposed.load(Ordering::Acquire)
    }

    /// ### English
    /// Pixel size of the presentable frame (`1x1` when there is none).
    ///
    /// ### 中文
    /// 可呈现帧的像素尺寸（无帧时为 `1x1`）。
    pub fn pixel_size(&self) -> Result<PhysicalSize<u32>> {
        self.value_or(PhysicalSize::new(1, 1), Bitmap::size)
    }

    pub fn dpi(&self) -> Result<Dpi> {
        self.value_or(Dpi::DEFAULT, Bitmap::dpi)
    }

    pub fn has_frame(&self) -> bool {
        self.read.lock().is_some()
    }

    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::Acquire)
    }

    pub fn rendered_count(&self) -> u64 {
        self.rendered.load(Ordering::Relaxed)
    }

    fn value_or<T>(&self, default: T, getter: impl FnOnce(&Bitmap) -> T) -> Result<T> {
        if self.is_disposed() {
            return Err(BridgeError::Disposed);
        }
        Ok(self.read(getter).unwrap_or(default))
    }
}

impl std::fmt::Debug for FrameSurface {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FrameSurface")
            .field("generation", &self.generation())
            .field("disposed", &self.is_disposed())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::AtomicBool;
    use std::thread;

    use super::*;

    fn fill_with(value: u8) -> impl FnOnce(&mut LockedFramebuffer<'_>) -> bool {
        move |fb| {
            fb.as_mut_slice().fill(value);
            true
        }
    }

    #[test]
    fn read_is_empty_until_first_write() {
        let surface = FrameSurface::new();
        assert_eq!(surface.read(|_| ()), None);
        assert_eq!(surface.pixel_size().unwrap(), PhysicalSize::new(1, 1));
        assert_eq!(surface.dpi().unwrap(), Dpi::DEFAULT);

        let size = PhysicalSize::new(4, 4);
        assert!(
            surface
                .write(size, Dpi::DEFAULT, PixelFormat::Bgra8888, fill_with(3))
                .unwrap()
        );
        assert_eq!(surface.pixel_size().unwrap(), size);
        assert_eq!(
            surface.read(|bitmap| bitmap.pixels().iter().all(|&b| b == 3)),
            Some(true)
        );
        assert_eq!(surface.generation(), 1);
    }

    #[test]
    fn aborted_fill_keeps_previous_frame() {
        let surface = FrameSurface::new();
        let size = PhysicalSize::new(2, 2);
        surface
            .write(size, Dpi::DEFAULT, PixelFormat::Bgra8888, fill_with(1))
            .unwrap();
        let committed = surface
            .write(size, Dpi::DEFAULT, PixelFormat::Bgra8888, |fb| {
                fb.as_mut_slice().fill(2);
                false
            })
            .unwrap();
        assert!(!committed);
        assert_eq!(surface.read(|bitmap| bitmap.pixels()[0]), Some(1));
    }

    #[test]
    fn swap_recycles_the_previous_read_buffer() {
        let surface = FrameSurface::new();
        let size = PhysicalSize::new(2, 2);
        for value in [1u8, 2, 3] {
            surface
                .write(size, Dpi::DEFAULT, PixelFormat::Bgra8888, fill_with(value))
                .unwrap();
        }
        // The write slot now holds frame 2, which is what the next fill sees before writing.
        let mut seen = None;
        surface
            .write(size, Dpi::DEFAULT, PixelFormat::Bgra8888, |fb| {
                seen = Some(fb.as_mut_slice()[0]);
                true
            })
            .unwrap();
        assert_eq!(seen, Some(2));
    }

    #[test]
    fn alternating_sizes_reallocate_without_stale_bleed() {
        let surface = FrameSurface::new();
        let small = PhysicalSize::new(8, 8);
        let large = PhysicalSize::new(40, 40);

        for i in 0..6 {
            let size = if i % 2 == 0 { small } else { large };
            surface
                .write(size, Dpi::DEFAULT, PixelFormat::Bgra8888, |fb| {
                    assert_eq!(fb.size(), size);
                    if size == large {
                        // Only touch the logical rows; padding must still be zeroed.
                        let stride = fb.layout().stride as usize;
                        let row_bytes = size.width as usize * 4;
                        let data = fb.as_mut_slice();
                        for y in 0..size.height as usize {
                            data[y * stride..y * stride + row_bytes].fill(0xEE);
                        }
                    } else {
                        fb.as_mut_slice().fill(0xFF);
                    }
                    true
                })
                .unwrap();

            surface.read(|bitmap| {
                assert_eq!(bitmap.size(), size);
                if size == large {
                    let layout = *bitmap.layout();
                    let row_bytes = layout.width as usize * 4;
                    for (y, row) in bitmap.pixels().chunks(layout.stride as usize).enumerate() {
                        let (visible, padding) = row.split_at(row_bytes);
                        if y < layout.height as usize {
                            assert!(visible.iter().all(|&b| b == 0xEE));
                        } else {
                            assert!(visible.iter().all(|&b| b == 0));
                        }
                        assert!(padding.iter().all(|&b| b == 0));
                    }
                }
            });
        }
    }

    #[test]
    fn dpi_change_reallocates() {
        let surface = FrameSurface::new();
        let size = PhysicalSize::new(2, 2);
        surface
            .write(size, Dpi::DEFAULT, PixelFormat::Bgra8888, fill_with(1))
            .unwrap();
        surface
            .write(size, Dpi::new(192.0, 192.0), PixelFormat::Bgra8888, fill_with(1))
            .unwrap();
        assert_eq!(surface.dpi().unwrap(), Dpi::new(192.0, 192.0));
    }

    #[test]
    fn clear_and_dispose() {
        let surface = FrameSurface::new();
        let size = PhysicalSize::new(2, 2);
        surface
            .write(size, Dpi::DEFAULT, PixelFormat::Bgra8888, fill_with(1))
            .unwrap();
        surface.clear();
        assert!(!surface.has_frame());

        surface.dispose();
        surface.dispose();
        assert!(surface.is_disposed());
        assert_eq!(surface.pixel_size(), Err(BridgeError::Disposed));
        assert_eq!(
            surface.write(size, Dpi::DEFAULT, PixelFormat::Bgra8888, fill_with(1)),
            Err(BridgeError::Disposed)
        );
        assert_eq!(surface.read(|_| ()), None);
    }

    #[test]
    fn conditional_clear_spares_newer_frames() {
        let surface = FrameSurface::new();
        let size = PhysicalSize::new(2, 2);
        surface
            .write(size, Dpi::DEFAULT, PixelFormat::Bgra8888, fill_with(1))
            .unwrap();
        let observed = surface.generation();

        surface
            .write(size, Dpi::DEFAULT, PixelFormat::Bgra8888, fill_with(2))
            .unwrap();
        assert!(!surface.clear_if_unchanged(observed));
        assert_eq!(surface.read(|bitmap| bitmap.pixels()[0]), Some(2));

        assert!(surface.clear_if_unchanged(surface.generation()));
        assert!(!surface.has_frame());
    }

    #[test]
    fn render_counts_only_drawn_frames() {
        let surface = FrameSurface::new();
        assert!(!surface.render(|_| ()));
        surface
            .write(PhysicalSize::new(1, 1), Dpi::DEFAULT, PixelFormat::Bgra8888, fill_with(1))
            .unwrap();
        assert!(surface.render(|_| ()));
        assert_eq!(surface.rendered_count(), 1);
    }

    #[test]
    fn concurrent_reader_never_sees_a_torn_frame() {
        let surface = Arc::new(FrameSurface::new());
        let done = Arc::new(AtomicBool::new(false));
        let size = PhysicalSize::new(64, 48);

        let writer = {
            let surface = surface.clone();
            let done = done.clone();
            thread::spawn(move || {
                for frame in 0..2_000u32 {
                    let value = (frame % 251) as u8;
                    surface
                        .write(size, Dpi::DEFAULT, PixelFormat::Bgra8888, |fb| {
                            for byte in fb.as_mut_slice() {
                                *byte = value;
                            }
                            true
                        })
                        .unwrap();
                }
                done.store(true, Ordering::Release);
            })
        };

        while !done.load(Ordering::Acquire) {
            surface.read(|bitmap| {
                let pixels = bitmap.pixels();
                let first = pixels[0];
                assert!(pixels.iter().all(|&b| b == first), "torn frame observed");
            });
        }
        writer.join().unwrap();
        assert!(surface.has_frame());
    }
}
