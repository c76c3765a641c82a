use std::sync::atomic::{AtomicU64, Ordering};

/// ### English
/// Per-stream frame counters, reset whenever a new format is negotiated.
///
/// `rendered` is derived from the surface's render counter, relative to the value at the last
/// reset.
///
/// ### 中文
/// 每个流的帧计数器，每次协商出新格式时重置。
///
/// `rendered` 由 surface 的渲染计数推导，相对于上次重置时的值。
#[derive(Default)]
pub struct FrameStats {
    displayed: AtomicU64,
    dropped: AtomicU64,
    rendered_base: AtomicU64,
}

/// ### English
/// Point-in-time copy of [`FrameStats`].
///
/// ### 中文
/// [`FrameStats`] 的某一时刻快照。
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct FrameStatsSnapshot {
    pub displayed: u64,
    pub dropped: u64,
    pub rendered: u64,
}

impl FrameStats {
    pub(crate) fn record_displayed(&self) {
        self.displayed.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_dropped(&self) {
        self.dropped.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn reset(&self, surface_rendered: u64) {
        self.displayed.store(0, Ordering::Relaxed);
        self.dropped.store(0, Ordering::Relaxed);
        self.rendered_base.store(surface_rendered, Ordering::Relaxed);
    }

    pub fn snapshot(&self, surface_rendered: u64) -> FrameStatsSnapshot {
        FrameStatsSnapshot {
            displayed: self.displayed.load(Ordering::Relaxed),
            dropped: self.dropped.load(Ordering::Relaxed),
            rendered: surface_rendered.saturating_sub(self.rendered_base.load(Ordering::Relaxed)),
        }
    }
}
