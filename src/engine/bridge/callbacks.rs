//! ### English
//! Decode-thread entry points of [`CallbackBridge`].
//!
//! None of these return errors: failures become neutral values (`None`, null, a dropped frame)
//! and are logged, since the caller is native code.
//!
//! ### 中文
//! [`CallbackBridge`] 的解码线程入口。
//!
//! 这些方法都不返回错误：失败会变为中性值（`None`、空指针、丢帧）并记录日志，因为调用方是原生代码。
use std::ffi::c_void;
use std::ptr;
use std::sync::atomic::Ordering;

use crate::engine::format::{FourCc, negotiate};
use crate::engine::publisher::PresentedFrame;

use super::CallbackBridge;

/// ### English
/// Values written back to the decoder after a successful negotiation.
///
/// ### 中文
/// 协商成功后写回解码器的值。
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FormatReply {
    pub chroma: FourCc,
    pub pitch: u32,
    pub lines: u32,
    pub buffer_count: u32,
}

impl CallbackBridge {
    /// ### English
    /// Format callback: negotiates a BGRA layout for `width`x`height` and replaces the scratch
    /// buffer. Returns `None` (buffer count 0 for the decoder) on failure or after teardown began.
    ///
    /// ### 中文
    /// format 回调：为 `width`x`height` 协商 BGRA 布局并替换 scratch 缓冲区。
    /// 失败或 teardown 开始后返回 `None`（对解码器而言缓冲区数量为 0）。
    pub fn format(&self, width: u32, height: u32) -> Option<FormatReply> {
        let _call = self.guard.enter_negotiation()?;

        let negotiated = match negotiate(width, height) {
            Ok(negotiated) => negotiated,
            Err(err) => {
                tracing::error!(%err, width, height, "video format negotiation failed");
                return None;
            }
        };

        let format = negotiated.format;
        let previous = self.scratch.lock().replace(negotiated.buffer);
        drop(previous);

        self.stats.reset(self.surface.rendered_count());
        self.sequence.store(0, Ordering::Relaxed);
        self.guard.activate();
        self.formats.publish(Some(format));

        Some(FormatReply {
            chroma: negotiated.chroma,
            pitch: format.stride,
            lines: format.lines,
            buffer_count: negotiated.buffer_count,
        })
    }

    /// ### English
    /// Lock callback: hands back the single plane. Never allocates.
    ///
    /// ### 中文
    /// lock 回调：返回唯一的平面地址；从不分配内存。
    pub fn lock(&self) -> *mut c_void {
        let Some(_call) = self.guard.enter_active() else {
            return ptr::null_mut();
        };
        self.scratch
            .lock()
            .as_ref()
            .map_or(ptr::null_mut(), |buffer| buffer.as_mut_ptr().cast())
    }

    /// ### English
    /// Unlock callback: decoding of the picture finished. Nothing to do.
    ///
    /// ### 中文
    /// unlock 回调：该图像解码完成。无需任何操作。
    pub fn unlock(&self) {}

    /// ### English
    /// Display callback: copies the full scratch buffer into the surface, swaps, and publishes
    /// the new frame. Returns whether the frame was presented; mismatches are dropped frames.
    ///
    /// ### 中文
    /// display 回调：把整个 scratch 缓冲区拷贝进 surface、交换并发布新帧。
    /// 返回该帧是否被呈现；不匹配的情况按丢帧处理。
    pub fn display(&self) -> bool {
        let Some(_call) = self.guard.enter_active() else {
            return false;
        };

        let scratch = self.scratch.lock();
        let Some(buffer) = scratch.as_ref() else {
            tracing::warn!("display without a negotiated buffer; frame dropped");
            self.stats.record_dropped();
            return false;
        };

        let format = *buffer.format();
        let written = self.surface.write(
            format.size(),
            self.config.dpi,
            format.pixel_format,
            |framebuffer| match framebuffer.copy_from(buffer.as_slice()) {
                Ok(()) => true,
                Err(err) => {
                    tracing::warn!(%err, bytes = buffer.len(), "frame copy mismatch; frame dropped");
                    false
                }
            },
        );
        drop(scratch);

        match written {
            Ok(true) => {}
            Ok(false) => {
                self.stats.record_dropped();
                return false;
            }
            Err(err) => {
                tracing::warn!(%err, "frame surface rejected write; frame dropped");
                self.stats.record_dropped();
                return false;
            }
        }

        let sequence = self.sequence.fetch_add(1, Ordering::Relaxed) + 1;
        self.stats.record_displayed();
        self.frames.publish(Some(PresentedFrame {
            sequence,
            format,
            surface: self.surface.clone(),
        }));
        true
    }

    /// ### English
    /// Cleanup callback: frees the scratch buffer and, unless the last frame is kept, schedules
    /// clearing of the published image on the UI thread.
    ///
    /// ### 中文
    /// cleanup 回调：释放 scratch 缓冲区；除非配置为保留最后一帧，否则在 UI 线程上安排清空已发布的图像。
    pub fn cleanup(&self) {
        let Some(_call) = self.guard.enter_active() else {
            return;
        };

        let released = self.scratch.lock().take();
        if released.is_none() {
            return;
        }
        drop(released);
        tracing::debug!("video scratch buffer released");

        if self.config.keep_last_frame {
            return;
        }

        let frames = self.frames.clone();
        let surface = self.surface.clone();
        let generation = surface.generation();
        self.dispatcher.post(Box::new(move || {
            // A frame of the next stream may already be in the surface or on its way.
            if surface.clear_if_unchanged(generation) {
                frames.retract();
            }
        }));
    }
}
