//! ### English
//! Spin-then-yield backoff used while teardown waits for in-flight decode-thread callbacks.
//!
//! ### 中文
//! teardown 等待解码线程上仍在执行的回调时使用的“短自旋 + 让出调度”退避。

use std::thread;

/// ### English
/// Spin budget before switching to `yield_now()`.
///
/// ### 中文
/// 在切换到 `yield_now()` 之前允许的自旋次数预算。
const SPIN_LIMIT: u32 = 64;

pub(crate) struct Backoff {
    step: u32,
}

impl Backoff {
    #[inline]
    pub(crate) fn new() -> Self {
        Self { step: 0 }
    }

    /// ### English
    /// Performs one backoff step: spin while under budget, then yield the time slice.
    ///
    /// ### 中文
    /// 执行一次退避：预算内自旋，超出后让出时间片。
    #[inline]
    pub(crate) fn snooze(&mut self) {
        if self.step < SPIN_LIMIT {
            std::hint::spin_loop();
        } else {
            thread::yield_now();
        }
        self.step = self.step.saturating_add(1);
    }

    /// ### English
    /// Returns whether the spin budget is exhausted.
    ///
    /// ### 中文
    /// 返回自旋预算是否已耗尽。
    #[inline]
    pub(crate) fn is_yielding(&self) -> bool {
        self.step >= SPIN_LIMIT
    }
}
