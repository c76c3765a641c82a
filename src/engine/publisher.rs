//! ### English
//! Presentation publisher: the single "current displayable resource" slot bound by the GUI layer.
//!
//! Publishing from the decode thread only stores the value into a latest-wins slot and, on the
//! idle→pending transition, posts one drain task to the UI thread. Several publishes before the
//! UI thread drains collapse to the last one, so presentation runs at paint cadence rather than
//! decode cadence.
//!
//! ### 中文
//! 呈现发布器：由 GUI 层绑定的唯一“当前可显示资源”槽位。
//!
//! 解码线程发布时只把值写入 latest-wins 槽位，并在 idle→pending 转换时向 UI 线程投递一个 drain 任务。
//! UI 线程 drain 之前的多次发布会合并为最后一次，因此呈现速率取决于绘制节奏而非解码节奏。
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Weak};

use parking_lot::{Mutex, RwLock};

use super::dispatch::UiDispatcher;
use super::format::FrameFormat;
use super::lockfree::CoalescedBox;
use super::surface::FrameSurface;

/// ### English
/// Displayable resource announced after each presented frame.
///
/// Holds a strong reference to the surface: a painter still holding an older value keeps the
/// pixels alive. Pixel access always goes through [`FrameSurface::read`].
///
/// ### 中文
/// 每次呈现帧后发布的可显示资源。
///
/// 持有 surface 的强引用：仍持有旧值的绘制方会让像素保持存活。像素访问始终通过 [`FrameSurface::read`]。
#[derive(Clone, Debug)]
pub struct PresentedFrame {
    /// ### English
    /// Monotonic frame number within the current stream.
    ///
    /// ### 中文
    /// 当前流内单调递增的帧号。
    pub sequence: u64,
    pub format: FrameFormat,
    pub surface: Arc<FrameSurface>,
}

impl PartialEq for PresentedFrame {
    fn eq(&self, other: &Self) -> bool {
        self.sequence == other.sequence
            && self.format == other.format
            && Arc::ptr_eq(&self.surface, &other.surface)
    }
}

/// ### English
/// Handle returned by `subscribe`, used to unsubscribe.
///
/// ### 中文
/// `subscribe` 返回的句柄，用于取消订阅。
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

type Subscriber<T> = Arc<dyn Fn(Option<&T>) + Send + Sync>;

/// ### English
/// Single-value broadcast slot delivering on the UI thread.
///
/// ### 中文
/// 在 UI 线程投递的单值广播槽位。
pub struct PresentationSlot<T> {
    current: RwLock<Option<T>>,
    /// ### English
    /// Latest value published off the UI thread and not yet drained (`Some(None)` = clear).
    ///
    /// ### 中文
    /// 在 UI 线程外发布、尚未 drain 的最新值（`Some(None)` 表示清空）。
    pending: CoalescedBox<Option<T>>,
    drain_scheduled: AtomicBool,
    subscribers: Mutex<Vec<(SubscriptionId, Subscriber<T>)>>,
    next_id: AtomicU64,
    dispatcher: Arc<dyn UiDispatcher>,
}

impl<T> PresentationSlot<T>
where
    T: Clone + Send + Sync + 'static,
{
    pub fn new(dispatcher: Arc<dyn UiDispatcher>) -> Arc<Self> {
        Arc::new(Self {
            current: RwLock::new(None),
            pending: CoalescedBox::default(),
            drain_scheduled: AtomicBool::new(false),
            subscribers: Mutex::new(Vec::new()),
            next_id: AtomicU64::new(1),
            dispatcher,
        })
    }

    /// ### English
    /// Publishes `value` (or clears with `None`) from any thread.
    ///
    /// On the UI thread the value is applied immediately; elsewhere it is coalesced and a drain
    /// is posted. Never blocks on the UI thread.
    ///
    /// ### 中文
    /// 在任意线程发布 `value`（`None` 表示清空）。
    ///
    /// 在 UI 线程上立即生效；其它线程上会被合并并投递一次 drain。不会阻塞等待 UI 线程。
    pub fn publish(self: &Arc<Self>, value: Option<T>) {
        if self.dispatcher.is_ui_thread() {
            self.set_now(value);
            return;
        }

        // Whatever was still pending is superseded; it drops here on the publishing thread.
        drop(self.pending.replace(value));
        if self.drain_scheduled.swap(true, Ordering::AcqRel) {
            return;
        }

        let weak = Arc::downgrade(self);
        self.dispatcher.post(Box::new(move || {
            if let Some(slot) = Weak::upgrade(&weak) {
                slot.drain();
            }
        }));
    }

    /// ### English
    /// Applies `value` right away and notifies subscribers. Must be called on the UI thread.
    ///
    /// Any value still pending from another thread is discarded.
    ///
    /// ### 中文
    /// 立即应用 `value` 并通知订阅者；必须在 UI 线程调用。
    ///
    /// 来自其它线程、仍在等待的值会被丢弃。
    pub fn set_now(&self, value: Option<T>) {
        drop(self.pending.take());
        self.apply(value);
    }

    /// ### English
    /// Clears the displayed resource (UI thread).
    ///
    /// ### 中文
    /// 清空显示的资源（UI 线程）。
    pub fn clear(&self) {
        self.set_now(None);
    }

    /// ### English
    /// Latest applied value, for late subscribers and binding consumers.
    ///
    /// ### 中文
    /// 最近一次生效的值，供后来的订阅者与绑定方读取。
    pub fn current(&self) -> Option<T> {
        self.current.read().clone()
    }

    pub fn has_pending(&self) -> bool {
        self.pending.is_pending()
    }

    /// ### English
    /// Registers `subscriber`; it runs on the UI thread after each applied change.
    ///
    /// ### 中文
    /// 注册 `subscriber`；每次变更生效后在 UI 线程调用它。
    pub fn subscribe(
        &self,
        subscriber: impl Fn(Option<&T>) + Send + Sync + 'static,
    ) -> SubscriptionId {
        let id = SubscriptionId(self.next_id.fetch_add(1, Ordering::Relaxed));
        self.subscribers.lock().push((id, Arc::new(subscriber)));
        id
    }

    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let mut subscribers = self.subscribers.lock();
        let before = subscribers.len();
        subscribers.retain(|(existing, _)| *existing != id);
        subscribers.len() != before
    }

    pub fn unsubscribe_all(&self) {
        self.subscribers.lock().clear();
    }

    /// ### English
    /// Clears the applied value (UI thread) but leaves a pending publication in place, so a
    /// newer value published from another thread still lands afterwards.
    ///
    /// ### 中文
    /// 清空已生效的值（UI 线程），但保留仍在等待的发布，因此其它线程发布的更新值之后仍会生效。
    pub fn retract(&self) {
        self.apply(None);
    }

    fn drain(&self) {
        // Reset before taking so a publish racing with this drain schedules a fresh one.
        self.drain_scheduled.store(false, Ordering::Release);
        if let Some(value) = self.pending.take() {
            self.apply(value);
        }
    }

    fn apply(&self, value: Option<T>) {
        let previous = std::mem::replace(&mut *self.current.write(), value.clone());

        // Snapshot so subscribers may (un)subscribe from inside the callback.
        let subscribers: Vec<Subscriber<T>> = self
            .subscribers
            .lock()
            .iter()
            .map(|(_, subscriber)| subscriber.clone())
            .collect();
        for subscriber in subscribers {
            subscriber(value.as_ref());
        }

        drop(previous);
    }
}
