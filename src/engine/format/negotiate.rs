use crate::engine::error::Result;

use super::{FourCc, FrameFormat, NativeScratchBuffer, PixelFormat};

/// ### English
/// Outcome of one format negotiation.
///
/// ### 中文
/// 一次格式协商的结果。
#[derive(Debug)]
pub struct NegotiatedFormat {
    pub format: FrameFormat,
    /// ### English
    /// Chroma code to write back into the decoder's output location.
    ///
    /// ### 中文
    /// 需要写回解码器输出位置的 chroma 码。
    pub chroma: FourCc,
    /// ### English
    /// Scratch buffer the decoder will fill, sized `stride * lines`.
    ///
    /// ### 中文
    /// 解码器将要填充的 scratch 缓冲区，大小为 `stride * lines`。
    pub buffer: NativeScratchBuffer,
    /// ### English
    /// Picture buffer count reported to the decoder (single packed plane, always 1).
    ///
    /// ### 中文
    /// 报告给解码器的图像缓冲区数量（单个打包平面，恒为 1）。
    pub buffer_count: u32,
}

/// ### English
/// Answers the decoder's format query for a `width`x`height` picture.
///
/// The pixel layout is always fixed to 32-bit BGRA; pitch and line count are aligned to 32.
/// Allocation failure is fatal to the stream and is not retried here.
///
/// ### 中文
/// 响应解码器对 `width`x`height` 图像的格式查询。
///
/// 像素布局固定为 32 位 BGRA；pitch 与行数按 32 对齐。分配失败对该流是致命的，这里不会重试。
pub fn negotiate(width: u32, height: u32) -> Result<NegotiatedFormat> {
    let pixel_format = PixelFormat::Bgra8888;
    let format = FrameFormat::new(pixel_format, width, height)?;
    let buffer = NativeScratchBuffer::allocate(format)?;

    tracing::debug!(
        width,
        height,
        stride = format.stride,
        lines = format.lines,
        bytes = format.buffer_len(),
        "negotiated video format"
    );

    Ok(NegotiatedFormat {
        format,
        chroma: pixel_format.fourcc(),
        buffer,
        buffer_count: 1,
    })
}
