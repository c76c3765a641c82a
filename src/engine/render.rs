//! ### English
//! Custom draw operation for [`RenderingMode::SoftwareCustomDraw`]: draws the surface's read
//! buffer straight into the host's drawing context with uniform stretch, centered.
//!
//! ### 中文
//! [`RenderingMode::SoftwareCustomDraw`] 使用的自定义绘制操作：以等比拉伸、居中的方式，
//! 把 surface 的读缓冲区直接绘制到宿主的绘制上下文中。
//!
//! [`RenderingMode::SoftwareCustomDraw`]: crate::engine::options::RenderingMode::SoftwareCustomDraw
use std::sync::Arc;

use super::surface::{Bitmap, FrameSurface};

#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Size {
    pub width: f64,
    pub height: f64,
}

impl Size {
    pub const fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    fn is_empty(self) -> bool {
        !(self.width > 0.0 && self.height > 0.0)
    }
}

#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    pub const fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub const fn from_size(size: Size) -> Self {
        Self::new(0.0, 0.0, size.width, size.height)
    }

    pub fn size(&self) -> Size {
        Size::new(self.width, self.height)
    }

    pub fn contains(&self, x: f64, y: f64) -> bool {
        x >= self.x && y >= self.y && x < self.x + self.width && y < self.y + self.height
    }

    /// ### English
    /// A rect of `size` centered inside `self`.
    ///
    /// ### 中文
    /// 在 `self` 内居中放置的、尺寸为 `size` 的矩形。
    fn center(&self, size: Size) -> Self {
        Self::new(
            self.x + (self.width - size.width) / 2.0,
            self.y + (self.height - size.height) / 2.0,
            size.width,
            size.height,
        )
    }

    fn intersect(&self, other: &Self) -> Self {
        let x = self.x.max(other.x);
        let y = self.y.max(other.y);
        let right = (self.x + self.width).min(other.x + other.width);
        let bottom = (self.y + self.height).min(other.y + other.height);
        if right <= x || bottom <= y {
            return Self::default();
        }
        Self::new(x, y, right - x, bottom - y)
    }
}

/// ### English
/// Bitmap sampling quality requested from the host.
///
/// ### 中文
/// 向宿主请求的位图采样质量。
#[repr(u32)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum InterpolationMode {
    #[default]
    Default = 0,
    LowQuality = 1,
    MediumQuality = 2,
    HighQuality = 3,
}

impl TryFrom<u32> for InterpolationMode {
    type Error = u32;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Self::Default),
            1 => Ok(Self::LowQuality),
            2 => Ok(Self::MediumQuality),
            3 => Ok(Self::HighQuality),
            other => Err(other),
        }
    }
}

/// ### English
/// Source and destination rectangles of one draw.
///
/// ### 中文
/// 一次绘制的源矩形与目标矩形。
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DrawPlan {
    pub source: Rect,
    pub dest: Rect,
}

/// ### English
/// Plans a uniform-stretch draw of a `source_size` image into `bounds`.
///
/// The image is scaled by `min(bounds.w / src.w, bounds.h / src.h)` and centered; the destination
/// is clipped to the viewport and the source rect is the matching centered region. Returns `None`
/// when either size is empty.
///
/// ### 中文
/// 规划把 `source_size` 图像以等比拉伸绘制进 `bounds`。
///
/// 图像按 `min(bounds.w / src.w, bounds.h / src.h)` 缩放并居中；目标矩形裁剪到视口内，
/// 源矩形为对应的居中区域。任一尺寸为空时返回 `None`。
pub fn plan_uniform(bounds: Size, source_size: Size) -> Option<DrawPlan> {
    if bounds.is_empty() || source_size.is_empty() {
        return None;
    }

    let scale = (bounds.width / source_size.width).min(bounds.height / source_size.height);
    let scaled = Size::new(source_size.width * scale, source_size.height * scale);

    let viewport = Rect::from_size(bounds);
    let dest = viewport.center(scaled).intersect(&viewport);
    let source = Rect::from_size(source_size)
        .center(Size::new(dest.width / scale, dest.height / scale));
    Some(DrawPlan { source, dest })
}

/// ### English
/// The host's immediate-mode drawing context.
///
/// ### 中文
/// 宿主的即时模式绘制上下文。
pub trait DrawingContext {
    fn draw_image(
        &mut self,
        bitmap: &Bitmap,
        opacity: f64,
        source: Rect,
        dest: Rect,
        interpolation: InterpolationMode,
    );
}

/// ### English
/// One scene-graph draw of the current frame. Never hit-tests and never compares equal, so the
/// host redraws it on every pass.
///
/// ### 中文
/// 对当前帧的一次场景图绘制。从不参与命中测试，也从不判等，因此宿主每次都会重绘。
pub struct CustomDrawOperation {
    surface: Arc<FrameSurface>,
    plan: DrawPlan,
    interpolation: InterpolationMode,
}

impl CustomDrawOperation {
    /// ### English
    /// Builds the operation for the surface's current frame, or `None` when there is nothing to
    /// draw.
    ///
    /// ### 中文
    /// 为 surface 的当前帧构建绘制操作；没有可绘制内容时返回 `None`。
    pub fn new(
        surface: Arc<FrameSurface>,
        bounds: Size,
        interpolation: InterpolationMode,
    ) -> Option<Self> {
        let pixels = surface.read(Bitmap::size)?;
        let source_size = Size::new(f64::from(pixels.width), f64::from(pixels.height));
        let plan = plan_uniform(bounds, source_size)?;
        Some(Self {
            surface,
            plan,
            interpolation,
        })
    }

    pub fn bounds(&self) -> Rect {
        self.plan.dest
    }

    pub fn plan(&self) -> DrawPlan {
        self.plan
    }

    pub fn hit_test(&self, _x: f64, _y: f64) -> bool {
        false
    }

    /// ### English
    /// Draws through `context` under the surface's read lock. Returns whether a frame was drawn.
    ///
    /// ### 中文
    /// 在 surface 读锁下通过 `context` 绘制；返回是否绘制了帧。
    pub fn render(&self, context: &mut dyn DrawingContext) -> bool {
        self.surface.render(|bitmap| {
            context.draw_image(bitmap, 1.0, self.plan.source, self.plan.dest, self.interpolation)
        })
    }
}

impl PartialEq for CustomDrawOperation {
    fn eq(&self, _other: &Self) -> bool {
        false
    }
}

#[cfg(test)]
mod tests {
    use dpi::PhysicalSize;

    use super::*;
    use crate::engine::format::PixelFormat;
    use crate::engine::surface::Dpi;

    #[test]
    fn letterboxes_wide_video_in_a_square() {
        let plan = plan_uniform(Size::new(400.0, 400.0), Size::new(1920.0, 1080.0)).unwrap();
        assert_eq!(plan.dest.x, 0.0);
        assert_eq!(plan.dest.width, 400.0);
        assert!((plan.dest.height - 225.0).abs() < 1e-9);
        assert!((plan.dest.y - 87.5).abs() < 1e-9);
        assert!((plan.source.width - 1920.0).abs() < 1e-9);
        assert!((plan.source.height - 1080.0).abs() < 1e-9);
    }

    #[test]
    fn pillarboxes_tall_video() {
        let plan = plan_uniform(Size::new(300.0, 100.0), Size::new(50.0, 100.0)).unwrap();
        assert_eq!(plan.dest, Rect::new(125.0, 0.0, 50.0, 100.0));
        assert_eq!(plan.source, Rect::new(0.0, 0.0, 50.0, 100.0));
    }

    #[test]
    fn empty_sizes_plan_nothing() {
        assert!(plan_uniform(Size::new(0.0, 10.0), Size::new(1.0, 1.0)).is_none());
        assert!(plan_uniform(Size::new(10.0, 10.0), Size::default()).is_none());
    }

    #[derive(Default)]
    struct RecordingContext {
        draws: Vec<(PhysicalSize<u32>, Rect)>,
    }

    impl DrawingContext for RecordingContext {
        fn draw_image(
            &mut self,
            bitmap: &Bitmap,
            _opacity: f64,
            _source: Rect,
            dest: Rect,
            _interpolation: InterpolationMode,
        ) {
            self.draws.push((bitmap.size(), dest));
        }
    }

    #[test]
    fn draws_the_current_frame_and_counts_it() {
        let surface = Arc::new(FrameSurface::new());
        assert!(
            CustomDrawOperation::new(surface.clone(), Size::new(10.0, 10.0), InterpolationMode::Default)
                .is_none()
        );

        let size = PhysicalSize::new(20, 10);
        surface
            .write(size, Dpi::DEFAULT, PixelFormat::Bgra8888, |_| true)
            .unwrap();
        let operation =
            CustomDrawOperation::new(surface.clone(), Size::new(10.0, 10.0), InterpolationMode::HighQuality)
                .unwrap();
        assert_eq!(operation.bounds(), Rect::new(0.0, 2.5, 10.0, 5.0));
        assert!(!operation.hit_test(5.0, 5.0));
        let again =
            CustomDrawOperation::new(surface.clone(), Size::new(10.0, 10.0), InterpolationMode::HighQuality)
                .unwrap();
        assert!(operation != again);

        let mut context = RecordingContext::default();
        assert!(operation.render(&mut context));
        assert_eq!(context.draws, vec![(size, Rect::new(0.0, 2.5, 10.0, 5.0))]);
        assert_eq!(surface.rendered_count(), 1);
    }
}
