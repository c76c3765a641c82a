//! ### English
//! UI-thread marshaling.
//!
//! The decode thread never waits for the UI thread: it only posts tasks. The embedder drains them
//! from its event loop with `run_pending`.
//!
//! ### 中文
//! UI 线程投递。
//!
//! 解码线程从不等待 UI 线程，只投递任务；宿主在自己的事件循环中调用 `run_pending` drain 它们。
use std::sync::OnceLock;
use std::thread::{self, ThreadId};

use crossbeam_channel as channel;

/// ### English
/// Unit of work executed on the UI thread.
///
/// ### 中文
/// 在 UI 线程执行的工作单元。
pub type UiTask = Box<dyn FnOnce() + Send + 'static>;

/// ### English
/// Posts work onto the GUI framework's UI thread (post, never send).
///
/// ### 中文
/// 把工作投递到 GUI 框架的 UI 线程（只 post，不同步等待）。
pub trait UiDispatcher: Send + Sync {
    /// ### English
    /// Queues `task` for asynchronous execution on the UI thread. Must not block.
    ///
    /// ### 中文
    /// 将 `task` 排队到 UI 线程异步执行；不得阻塞。
    fn post(&self, task: UiTask);

    /// ### English
    /// Returns whether the caller is running on the UI thread.
    ///
    /// ### 中文
    /// 返回调用方是否运行在 UI 线程。
    fn is_ui_thread(&self) -> bool;
}

/// ### English
/// Channel-backed dispatcher for embedders that pump the queue from their own loop.
///
/// The first thread to call [`UiThreadQueue::run_pending`] (or [`UiThreadQueue::bind_current_thread`])
/// becomes the UI thread.
///
/// ### 中文
/// 基于 channel 的 dispatcher，适用于在自身循环中 pump 队列的宿主。
///
/// 第一个调用 [`UiThreadQueue::run_pending`]（或 [`UiThreadQueue::bind_current_thread`]）的线程成为 UI 线程。
pub struct UiThreadQueue {
    tx: channel::Sender<UiTask>,
    rx: channel::Receiver<UiTask>,
    ui_thread: OnceLock<ThreadId>,
}

impl Default for UiThreadQueue {
    fn default() -> Self {
        let (tx, rx) = channel::unbounded();
        Self {
            tx,
            rx,
            ui_thread: OnceLock::new(),
        }
    }
}

impl UiThreadQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// ### English
    /// Marks the calling thread as the UI thread. Later calls from other threads are ignored.
    ///
    /// ### 中文
    /// 把调用线程标记为 UI 线程；之后其它线程的调用会被忽略。
    pub fn bind_current_thread(&self) -> bool {
        let current = thread::current().id();
        *self.ui_thread.get_or_init(|| current) == current
    }

    /// ### English
    /// Runs every task queued before this call, on the calling (UI) thread.
    ///
    /// Tasks posted while draining are deferred to the next call. Returns the number of tasks
    /// executed; returns 0 without running anything when called off the bound UI thread.
    ///
    /// ### 中文
    /// 在调用线程（UI 线程）执行本次调用之前已排队的所有任务。
    ///
    /// drain 期间新投递的任务留到下一次调用。返回执行的任务数量；
    /// 若不在已绑定的 UI 线程调用，则不执行任何任务并返回 0。
    pub fn run_pending(&self) -> usize {
        if !self.bind_current_thread() {
            tracing::warn!("run_pending called off the UI thread; ignoring");
            return 0;
        }

        let snapshot = self.rx.len();
        let mut ran = 0;
        while ran < snapshot {
            let Ok(task) = self.rx.try_recv() else {
                break;
            };
            task();
            ran += 1;
        }
        ran
    }

    pub fn pending(&self) -> usize {
        self.rx.len()
    }
}

impl UiDispatcher for UiThreadQueue {
    fn post(&self, task: UiTask) {
        let _ = self.tx.send(task);
    }

    fn is_ui_thread(&self) -> bool {
        self.ui_thread
            .get()
            .is_some_and(|id| *id == thread::current().id())
    }
}
