//! ### English
//! Player event hub: explicit subscription list plus guarded dispatch.
//!
//! A subscription names a set of player events. While an internal operation runs
//! ([`EventHub::run_operation`]) dispatch is suppressed; when the outermost operation ends every
//! subscriber receives one [`Notification::Refresh`] so bound state is re-read once.
//!
//! ### 中文
//! 播放器事件中心：显式的订阅列表加上带守卫的分发。
//!
//! 每个订阅指定一组播放器事件。内部操作（[`EventHub::run_operation`]）运行期间分发被抑制；
//! 最外层操作结束时，每个订阅者收到一次 [`Notification::Refresh`]，以便重新读取绑定状态。
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};

use parking_lot::Mutex;

use super::dispatch::UiDispatcher;

/// ### English
/// Player events forwarded by the host. ABI values are stable.
///
/// ### 中文
/// 宿主转发的播放器事件；ABI 数值保持稳定。
#[repr(u32)]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum MediaEvent {
    NothingSpecial = 0,
    Playing = 1,
    Paused = 2,
    Stopped = 3,
    EndReached = 4,
    EncounteredError = 5,
    Buffering = 6,
    PositionChanged = 7,
    TimeChanged = 8,
    LengthChanged = 9,
    Muted = 10,
    Unmuted = 11,
    VolumeChanged = 12,
    FormatChanged = 13,
}

impl MediaEvent {
    const ALL: [Self; 14] = [
        Self::NothingSpecial,
        Self::Playing,
        Self::Paused,
        Self::Stopped,
        Self::EndReached,
        Self::EncounteredError,
        Self::Buffering,
        Self::PositionChanged,
        Self::TimeChanged,
        Self::LengthChanged,
        Self::Muted,
        Self::Unmuted,
        Self::VolumeChanged,
        Self::FormatChanged,
    ];

    const fn bit(self) -> u32 {
        1 << self as u32
    }
}

impl TryFrom<u32> for MediaEvent {
    type Error = u32;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        Self::ALL
            .into_iter()
            .find(|event| *event as u32 == value)
            .ok_or(value)
    }
}

/// ### English
/// Set of [`MediaEvent`]s a subscription listens to.
///
/// ### 中文
/// 订阅所监听的 [`MediaEvent`] 集合。
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct EventSet(u32);

impl EventSet {
    pub const EMPTY: Self = Self(0);

    pub fn all() -> Self {
        Self::of(&MediaEvent::ALL)
    }

    pub fn of(events: &[MediaEvent]) -> Self {
        Self(events.iter().fold(0, |bits, event| bits | event.bit()))
    }

    pub fn with(self, event: MediaEvent) -> Self {
        Self(self.0 | event.bit())
    }

    pub fn contains(self, event: MediaEvent) -> bool {
        self.0 & event.bit() != 0
    }

    pub fn is_empty(self) -> bool {
        self.0 == 0
    }
}

/// ### English
/// What a subscriber is told.
///
/// ### 中文
/// 订阅者收到的通知。
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Notification {
    Event(MediaEvent),
    /// ### English
    /// An internal operation finished; re-read all bound state.
    ///
    /// ### 中文
    /// 内部操作结束；重新读取所有绑定状态。
    Refresh,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct EventSubscriptionId(u64);

type Handler = Arc<dyn Fn(Notification) + Send + Sync>;

struct Subscription {
    id: EventSubscriptionId,
    events: EventSet,
    handler: Handler,
}

pub struct EventHub {
    subscriptions: Mutex<Vec<Subscription>>,
    operations: AtomicUsize,
    next_id: AtomicU64,
    dispatcher: Arc<dyn UiDispatcher>,
}

impl EventHub {
    pub fn new(dispatcher: Arc<dyn UiDispatcher>) -> Arc<Self> {
        Arc::new(Self {
            subscriptions: Mutex::new(Vec::new()),
            operations: AtomicUsize::new(0),
            next_id: AtomicU64::new(1),
            dispatcher,
        })
    }

    pub fn subscribe(
        &self,
        events: EventSet,
        handler: impl Fn(Notification) + Send + Sync + 'static,
    ) -> EventSubscriptionId {
        let id = EventSubscriptionId(self.next_id.fetch_add(1, Ordering::Relaxed));
        self.subscriptions.lock().push(Subscription {
            id,
            events,
            handler: Arc::new(handler),
        });
        id
    }

    pub fn unsubscribe(&self, id: EventSubscriptionId) -> bool {
        let mut subscriptions = self.subscriptions.lock();
        let before = subscriptions.len();
        subscriptions.retain(|subscription| subscription.id != id);
        subscriptions.len() != before
    }

    /// ### English
    /// Drops every subscription (view detach).
    ///
    /// ### 中文
    /// 移除所有订阅（视图分离时）。
    pub fn clear(&self) {
        self.subscriptions.lock().clear();
    }

    pub fn is_operation_active(&self) -> bool {
        self.operations.load(Ordering::Acquire) != 0
    }

    /// ### English
    /// Notifies subscribers of `event` on the UI thread. Returns `false` when suppressed by a
    /// running operation or when nobody listens.
    ///
    /// ### 中文
    /// 在 UI 线程通知订阅了 `event` 的订阅者。被正在运行的操作抑制或无人监听时返回 `false`。
    pub fn dispatch(&self, event: MediaEvent) -> bool {
        if self.is_operation_active() {
            tracing::trace!(?event, "event suppressed during operation");
            return false;
        }

        let handlers = self.handlers(|events| events.contains(event));
        if handlers.is_empty() {
            return false;
        }
        self.deliver(handlers, Notification::Event(event));
        true
    }

    /// ### English
    /// Runs `operation` with dispatch suppressed, then sends one refresh to every subscriber
    /// once the outermost operation returns.
    ///
    /// ### 中文
    /// 在抑制分发的情况下运行 `operation`；最外层操作返回后，向每个订阅者发送一次 refresh。
    pub fn run_operation<R>(&self, operation: impl FnOnce() -> R) -> R {
        let scope = OperationScope::enter(self);
        let result = operation();
        if scope.exit() {
            let handlers = self.handlers(|_| true);
            self.deliver(handlers, Notification::Refresh);
        }
        result
    }

    fn handlers(&self, wants: impl Fn(EventSet) -> bool) -> Vec<Handler> {
        self.subscriptions
            .lock()
            .iter()
            .filter(|subscription| wants(subscription.events))
            .map(|subscription| subscription.handler.clone())
            .collect()
    }

    fn deliver(&self, handlers: Vec<Handler>, notification: Notification) {
        if handlers.is_empty() {
            return;
        }
        let notify = move || {
            for handler in &handlers {
                handler(notification);
            }
        };
        if self.dispatcher.is_ui_thread() {
            notify();
        } else {
            self.dispatcher.post(Box::new(notify));
        }
    }
}

struct OperationScope<'a> {
    hub: &'a EventHub,
    exited: bool,
}

impl<'a> OperationScope<'a> {
    fn enter(hub: &'a EventHub) -> Self {
        hub.operations.fetch_add(1, Ordering::AcqRel);
        Self { hub, exited: false }
    }

    /// ### English
    /// Leaves the scope; returns whether this was the outermost operation.
    ///
    /// ### 中文
    /// 离开作用域；返回是否为最外层操作。
    fn exit(mut self) -> bool {
        self.exited = true;
        self.hub.operations.fetch_sub(1, Ordering::AcqRel) == 1
    }
}

impl Drop for OperationScope<'_> {
    fn drop(&mut self) {
        if !self.exited {
            self.hub.operations.fetch_sub(1, Ordering::AcqRel);
        }
    }
}
