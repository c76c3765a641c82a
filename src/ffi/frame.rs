//! ### English
//! C ABI access to the presented frame: raw copy-out and custom-draw.
//!
//! ### 中文
//! 已呈现帧的 C ABI 访问：原始拷贝与自定义绘制。

use std::ffi::c_void;

use crate::engine::render::{DrawingContext, InterpolationMode, Rect, Size};
use crate::engine::surface::Bitmap;

use super::{VlcFrameBridgeFrame, VlcFrameBridgeView};

/// ### English
/// Host draw callback: `(user_data, frame, pixels, pixels_len, source_rect, dest_rect, interpolation)`.
///
/// `pixels` is only valid for the duration of the call.
///
/// ### 中文
/// 宿主绘制回调：`(user_data, frame, pixels, pixels_len, source_rect, dest_rect, interpolation)`。
///
/// `pixels` 仅在本次调用期间有效。
pub type VlcFrameBridgeDrawFn = unsafe extern "C" fn(
    *mut c_void,
    *const VlcFrameBridgeFrame,
    *const u8,
    usize,
    Rect,
    Rect,
    u32,
);

#[unsafe(no_mangle)]
/// ### English
/// Copies the latest presented frame into `dst`.
///
/// `out_frame` (optional) always receives the frame description when a frame exists, so the host
/// can size `dst` (`stride * lines` bytes) and retry. The copy happens under the surface's read
/// lock and never observes a partially written frame.
///
/// Returns `true` only if the pixels were copied.
///
/// ### 中文
/// 把最近呈现的帧拷贝到 `dst`。
///
/// 存在帧时，`out_frame`（可选）总会写入帧描述，宿主可据此分配 `dst`（`stride * lines` 字节）后重试。
/// 拷贝在 surface 读锁下进行，绝不会看到写了一半的帧。
///
/// 仅当像素被拷贝时返回 `true`。
pub unsafe extern "C" fn vlc_frame_bridge_view_copy_frame(
    view: *mut VlcFrameBridgeView,
    out_frame: *mut VlcFrameBridgeFrame,
    dst: *mut u8,
    dst_len: usize,
) -> bool {
    let Some(view) = (unsafe { view.as_ref() }) else {
        return false;
    };
    let Some(frame) = view.view.video_source() else {
        return false;
    };

    let mut info = VlcFrameBridgeFrame::from(&frame);
    let copied = frame.surface.read(|bitmap| {
        describe(&mut info, bitmap);
        if !out_frame.is_null() {
            unsafe { *out_frame = info };
        }

        let pixels = bitmap.pixels();
        if dst.is_null() || dst_len < pixels.len() {
            return false;
        }
        unsafe { std::ptr::copy_nonoverlapping(pixels.as_ptr(), dst, pixels.len()) };
        true
    });
    copied.unwrap_or(false)
}

#[unsafe(no_mangle)]
/// ### English
/// Draws the current frame through `draw` with uniform stretch inside a `width`x`height` viewport.
///
/// Only valid for views in software custom-draw mode. `draw` receives the view's interpolation
/// mode (see `vlc_frame_bridge_view_set_interpolation`). Returns whether a frame was drawn.
///
/// ### 中文
/// 以等比拉伸方式，在 `width`x`height` 视口内通过 `draw` 绘制当前帧。
///
/// 仅适用于软件自定义绘制模式的 view。`draw` 会收到 view 的插值模式
/// （见 `vlc_frame_bridge_view_set_interpolation`）。返回是否绘制了帧。
pub unsafe extern "C" fn vlc_frame_bridge_view_draw(
    view: *mut VlcFrameBridgeView,
    width: f64,
    height: f64,
    draw: Option<VlcFrameBridgeDrawFn>,
    user_data: *mut c_void,
) -> bool {
    let Some(view) = (unsafe { view.as_ref() }) else {
        return false;
    };
    let Some(draw) = draw else {
        return false;
    };
    let Some(frame) = view.view.video_source() else {
        return false;
    };
    let Some(operation) = view.view.custom_draw_operation(Size::new(width, height)) else {
        return false;
    };

    let mut context = FfiDrawingContext {
        draw,
        user_data,
        info: VlcFrameBridgeFrame::from(&frame),
    };
    operation.render(&mut context)
}

struct FfiDrawingContext {
    draw: VlcFrameBridgeDrawFn,
    user_data: *mut c_void,
    info: VlcFrameBridgeFrame,
}

impl DrawingContext for FfiDrawingContext {
    fn draw_image(
        &mut self,
        bitmap: &Bitmap,
        _opacity: f64,
        source: Rect,
        dest: Rect,
        interpolation: InterpolationMode,
    ) {
        describe(&mut self.info, bitmap);
        let pixels = bitmap.pixels();
        unsafe {
            (self.draw)(
                self.user_data,
                &self.info,
                pixels.as_ptr(),
                pixels.len(),
                source,
                dest,
                interpolation as u32,
            )
        };
    }
}

/// ### English
/// Overwrites the layout fields with the bitmap actually being read.
///
/// ### 中文
/// 用实际读取的位图覆盖布局字段。
fn describe(info: &mut VlcFrameBridgeFrame, bitmap: &Bitmap) {
    let layout = bitmap.layout();
    info.width = layout.width;
    info.height = layout.height;
    info.stride = layout.stride;
    info.lines = layout.lines;
    info.dpi_x = bitmap.dpi().x;
    info.dpi_y = bitmap.dpi().y;
}
