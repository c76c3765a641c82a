//! ### English
//! Small lock-free primitives shared across the bridge.
//!
//! ### 中文
//! bridge 内复用的小型无锁原语。
mod backoff;
mod coalesced;

pub(crate) use backoff::Backoff;
pub(crate) use coalesced::CoalescedBox;
