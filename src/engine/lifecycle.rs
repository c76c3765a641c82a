//! ### English
//! Lifecycle/disposal guard for the callback bridge.
//!
//! `Uninitialized → Active → Disposing → Disposed`. Every native callback enters through the
//! guard, which counts it as in flight; teardown flips the state first and then waits for the
//! in-flight count to reach zero before any native memory is freed. A callback that arrives once
//! teardown has begun is refused and becomes a no-op.
//!
//! ### 中文
//! 回调 bridge 的生命周期/释放守卫。
//!
//! `Uninitialized → Active → Disposing → Disposed`。每个原生回调都经由守卫进入并计为 in-flight；
//! teardown 先切换状态，再等待 in-flight 计数归零，之后才释放任何原生内存。
//! teardown 开始后到达的回调会被拒绝，成为 no-op。
use std::sync::atomic::{AtomicU8, AtomicUsize, Ordering};

use crate::engine::cache::pad_after;
use crate::engine::lockfree::Backoff;

const STATE_PAD_BYTES: usize = pad_after::<AtomicU8>();

/// ### English
/// Lifecycle states of one bridge instance.
///
/// ### 中文
/// 单个 bridge 实例的生命周期状态。
#[repr(u8)]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LifecycleState {
    Uninitialized = 0,
    Active = 1,
    Disposing = 2,
    Disposed = 3,
}

impl LifecycleState {
    fn from_u8(value: u8) -> Self {
        match value {
            0 => Self::Uninitialized,
            1 => Self::Active,
            2 => Self::Disposing,
            _ => Self::Disposed,
        }
    }

    pub fn is_tearing_down(self) -> bool {
        matches!(self, Self::Disposing | Self::Disposed)
    }
}

/// ### English
/// Atomic state flag plus in-flight callback counter.
///
/// `state` and `in_flight` live on separate cache lines: the decode thread bumps `in_flight`
/// per callback while the UI thread polls `state`.
///
/// ### 中文
/// 原子状态标记与 in-flight 回调计数。
///
/// `state` 与 `in_flight` 位于不同缓存行：解码线程每次回调都会修改 `in_flight`，UI 线程则读取 `state`。
#[repr(C, align(64))]
pub struct LifecycleGuard {
    state: AtomicU8,
    _pad_state: [u8; STATE_PAD_BYTES],
    in_flight: AtomicUsize,
}

impl Default for LifecycleGuard {
    fn default() -> Self {
        Self {
            state: AtomicU8::new(LifecycleState::Uninitialized as u8),
            _pad_state: [0; STATE_PAD_BYTES],
            in_flight: AtomicUsize::new(0),
        }
    }
}

/// ### English
/// RAII marker of one in-flight callback; dropping it ends the call.
///
/// ### 中文
/// 单个 in-flight 回调的 RAII 标记；drop 时结束该调用。
#[must_use]
pub struct CallGuard<'a> {
    guard: &'a LifecycleGuard,
}

impl Drop for CallGuard<'_> {
    fn drop(&mut self) {
        self.guard.in_flight.fetch_sub(1, Ordering::SeqCst);
    }
}

impl LifecycleGuard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> LifecycleState {
        LifecycleState::from_u8(self.state.load(Ordering::Acquire))
    }

    /// ### English
    /// Enters a format-negotiation callback. Allowed before the first negotiation and while
    /// active (resolution changes); refused once teardown has begun.
    ///
    /// ### 中文
    /// 进入格式协商回调。首次协商前与 active 期间（分辨率变化）允许；teardown 开始后拒绝。
    pub fn enter_negotiation(&self) -> Option<CallGuard<'_>> {
        self.enter(|state| {
            matches!(
                state,
                LifecycleState::Uninitialized | LifecycleState::Active
            )
        })
    }

    /// ### English
    /// Enters a per-frame callback (lock/unlock/display/cleanup). Only allowed while active,
    /// which implies at least one negotiation has completed.
    ///
    /// ### 中文
    /// 进入逐帧回调（lock/unlock/display/cleanup）。仅在 active 时允许，这意味着至少完成过一次协商。
    pub fn enter_active(&self) -> Option<CallGuard<'_>> {
        self.enter(|state| state == LifecycleState::Active)
    }

    /// ### English
    /// Marks the first successful negotiation (`Uninitialized → Active`). No-op otherwise.
    ///
    /// ### 中文
    /// 标记首次协商成功（`Uninitialized → Active`）；其它状态下为 no-op。
    pub fn activate(&self) -> bool {
        self.state
            .compare_exchange(
                LifecycleState::Uninitialized as u8,
                LifecycleState::Active as u8,
                Ordering::SeqCst,
                Ordering::Acquire,
            )
            .is_ok()
    }

    /// ### English
    /// Starts teardown. Returns `true` only for the caller that performed the transition, so
    /// explicit dispose and drop can both call it safely.
    ///
    /// ### 中文
    /// 开始 teardown。只有真正完成状态切换的调用方返回 `true`，因此显式 dispose 与 drop 都可以安全调用。
    pub fn begin_dispose(&self) -> bool {
        let mut current = self.state.load(Ordering::Acquire);
        loop {
            if LifecycleState::from_u8(current).is_tearing_down() {
                return false;
            }
            match self.state.compare_exchange_weak(
                current,
                LifecycleState::Disposing as u8,
                Ordering::SeqCst,
                Ordering::Acquire,
            ) {
                Ok(_) => return true,
                Err(observed) => current = observed,
            }
        }
    }

    /// ### English
    /// Waits until every callback that entered before teardown began has returned.
    ///
    /// Callbacks are short (a pointer hand-back or one frame copy), so this spins briefly and
    /// then yields.
    ///
    /// ### 中文
    /// 等待 teardown 开始前进入的所有回调返回。
    ///
    /// 回调都很短（返回指针或一次帧拷贝），因此先短暂自旋再让出时间片。
    pub fn wait_for_callbacks(&self) {
        let mut backoff = Backoff::new();
        let mut reported = false;
        while self.in_flight.load(Ordering::SeqCst) != 0 {
            if backoff.is_yielding() && !reported {
                reported = true;
                tracing::debug!(
                    in_flight = self.in_flight(),
                    "teardown waiting for decoder callbacks"
                );
            }
            backoff.snooze();
        }
    }

    pub fn finish_dispose(&self) {
        self.state
            .store(LifecycleState::Disposed as u8, Ordering::Release);
    }

    pub fn in_flight(&self) -> usize {
        self.in_flight.load(Ordering::Acquire)
    }

    fn enter(&self, allowed: impl Fn(LifecycleState) -> bool) -> Option<CallGuard<'_>> {
        // Count first, then check: teardown stores the state before it reads the counter.
        self.in_flight.fetch_add(1, Ordering::SeqCst);
        let call = CallGuard { guard: self };
        let state = LifecycleState::from_u8(self.state.load(Ordering::SeqCst));
        if allowed(state) {
            Some(call)
        } else {
            tracing::trace!(?state, "callback refused by lifecycle guard");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::AtomicBool;
    use std::thread;
    use std::time::Duration;

    use super::*;

    #[test]
    fn frame_callbacks_wait_for_the_first_negotiation() {
        let guard = LifecycleGuard::new();
        assert!(guard.enter_active().is_none());
        assert!(guard.enter_negotiation().is_some());
        assert!(guard.activate());
        assert!(!guard.activate());
        assert!(guard.enter_active().is_some());
        assert_eq!(guard.in_flight(), 0);
    }

    #[test]
    fn dispose_runs_once_and_refuses_late_callbacks() {
        let guard = LifecycleGuard::new();
        guard.activate();
        assert!(guard.begin_dispose());
        assert!(!guard.begin_dispose());
        assert!(guard.enter_active().is_none());
        assert!(guard.enter_negotiation().is_none());

        guard.wait_for_callbacks();
        guard.finish_dispose();
        assert_eq!(guard.state(), LifecycleState::Disposed);
        assert!(!guard.begin_dispose());
        assert!(!guard.activate());
    }

    #[test]
    fn never_activated_guards_can_still_be_disposed() {
        let guard = LifecycleGuard::new();
        assert!(guard.begin_dispose());
        assert_eq!(guard.state(), LifecycleState::Disposing);
    }

    #[test]
    fn teardown_waits_for_in_flight_callbacks() {
        let guard = Arc::new(LifecycleGuard::new());
        guard.activate();
        let entered = Arc::new(AtomicBool::new(false));
        let finished = Arc::new(AtomicBool::new(false));

        let decoder = {
            let guard = guard.clone();
            let entered = entered.clone();
            let finished = finished.clone();
            thread::spawn(move || {
                let call = guard.enter_active().unwrap();
                entered.store(true, Ordering::Release);
                thread::sleep(Duration::from_millis(20));
                finished.store(true, Ordering::Release);
                drop(call);
            })
        };

        while !entered.load(Ordering::Acquire) {
            thread::yield_now();
        }
        assert!(guard.begin_dispose());
        guard.wait_for_callbacks();
        assert!(finished.load(Ordering::Acquire));
        decoder.join().unwrap();
    }
}
