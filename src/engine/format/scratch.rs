use std::alloc::{self, Layout};
use std::ptr::NonNull;

use crate::engine::error::{BridgeError, Result};

use super::{FRAME_ALIGNMENT, FrameFormat};

/// ### English
/// Unmanaged, 32-byte aligned block the native decoder writes pixel data into.
///
/// Owned exclusively by the callback bridge between format negotiation and cleanup. The memory is
/// zero-initialized so a frame displayed before the decoder filled every padded row never exposes
/// stale heap contents.
///
/// ### 中文
/// 原生解码器写入像素数据的非托管内存块（32 字节对齐）。
///
/// 在格式协商与 cleanup 之间由回调 bridge 独占持有。内存初始化为 0，
/// 即使解码器未写满所有填充行，也不会暴露旧的堆内容。
pub struct NativeScratchBuffer {
    ptr: NonNull<u8>,
    layout: Layout,
    format: FrameFormat,
}

unsafe impl Send for NativeScratchBuffer {}

impl NativeScratchBuffer {
    /// ### English
    /// Allocates a buffer of `format.buffer_len()` bytes.
    ///
    /// Allocation failure is reported, not aborted on, so the caller can fail the stream.
    ///
    /// ### 中文
    /// 分配 `format.buffer_len()` 字节的缓冲区。
    ///
    /// 分配失败会以错误返回（不会 abort），便于调用方让该流失败。
    pub fn allocate(format: FrameFormat) -> Result<Self> {
        let bytes = format.buffer_len();
        let layout = Layout::from_size_align(bytes, FRAME_ALIGNMENT as usize)
            .map_err(|_| BridgeError::Allocation { bytes })?;
        if layout.size() == 0 {
            return Err(BridgeError::Allocation { bytes });
        }

        let ptr = unsafe { alloc::alloc_zeroed(layout) };
        let ptr = NonNull::new(ptr).ok_or(BridgeError::Allocation { bytes })?;
        Ok(Self {
            ptr,
            layout,
            format,
        })
    }

    pub fn format(&self) -> &FrameFormat {
        &self.format
    }

    /// ### English
    /// Address of the single plane handed to the decoder by the lock callback.
    ///
    /// ### 中文
    /// lock 回调交给解码器的单平面地址。
    pub fn as_mut_ptr(&self) -> *mut u8 {
        self.ptr.as_ptr()
    }

    pub fn len(&self) -> usize {
        self.layout.size()
    }

    pub fn is_empty(&self) -> bool {
        self.layout.size() == 0
    }

    /// ### English
    /// Views the buffer contents.
    ///
    /// The decoder only writes between lock and display, both of which run on the decode thread
    /// that also performs the copy, so the contents are stable while this borrow lives.
    ///
    /// ### 中文
    /// 以切片方式查看缓冲区内容。
    ///
    /// 解码器只在 lock 与 display 之间写入，而拷贝也发生在同一解码线程，因此借用期间内容稳定。
    pub fn as_slice(&self) -> &[u8] {
        unsafe { std::slice::from_raw_parts(self.ptr.as_ptr(), self.layout.size()) }
    }
}

impl Drop for NativeScratchBuffer {
    fn drop(&mut self) {
        unsafe { alloc::dealloc(self.ptr.as_ptr(), self.layout) };
    }
}

impl std::fmt::Debug for NativeScratchBuffer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NativeScratchBuffer")
            .field("ptr", &self.ptr)
            .field("len", &self.layout.size())
            .field("format", &self.format)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::format::PixelFormat;

    #[test]
    fn allocates_aligned_zeroed_memory() {
        let format = FrameFormat::new(PixelFormat::Bgra8888, 33, 7).unwrap();
        let buffer = NativeScratchBuffer::allocate(format).unwrap();
        assert_eq!(buffer.len(), format.buffer_len());
        assert_eq!(buffer.as_mut_ptr() as usize % FRAME_ALIGNMENT as usize, 0);
        assert!(buffer.as_slice().iter().all(|&b| b == 0));
    }
}
