use std::ptr;
use std::sync::atomic::{AtomicPtr, Ordering};

/// ### English
/// Latest-wins value slot backed by an atomic pointer swap, with a single-node free cache so
/// steady-state publishing does not allocate.
///
/// - Multi-producer friendly: writers use an atomic swap.
/// - A replaced value is handed back to the writer, so it is dropped on the writer's thread.
///
/// ### 中文
/// 基于原子指针交换的“只保留最新值（latest-wins）”槽位，带一个单节点 free cache，
/// 稳态发布时无需分配。
///
/// - 支持多生产者：写端使用原子 swap。
/// - 被替换的旧值会交还给写端，因此在写端线程上 drop。
pub(crate) struct CoalescedBox<T> {
    ptr: AtomicPtr<Option<T>>,
    free: AtomicPtr<Option<T>>,
}

unsafe impl<T: Send> Send for CoalescedBox<T> {}
unsafe impl<T: Send> Sync for CoalescedBox<T> {}

impl<T> Default for CoalescedBox<T> {
    fn default() -> Self {
        Self {
            ptr: AtomicPtr::new(ptr::null_mut()),
            free: AtomicPtr::new(ptr::null_mut()),
        }
    }
}

impl<T> CoalescedBox<T> {
    #[inline]
    pub(crate) fn is_pending(&self) -> bool {
        !self.ptr.load(Ordering::Acquire).is_null()
    }

    /// ### English
    /// Stores `value` as the pending value and returns the one it replaced (if still pending).
    ///
    /// ### 中文
    /// 把 `value` 存为待取值，并返回被替换的旧值（若仍未被取走）。
    pub(crate) fn replace(&self, value: T) -> Option<T> {
        let node = match self.pop_free() {
            Some(mut node) => {
                *node = Some(value);
                node
            }
            None => Box::new(Some(value)),
        };

        let old_ptr = self.ptr.swap(Box::into_raw(node), Ordering::AcqRel);
        if old_ptr.is_null() {
            return None;
        }

        let mut old = unsafe { Box::from_raw(old_ptr) };
        let previous = old.take();
        self.push_free(old);
        previous
    }

    /// ### English
    /// Takes the pending value, leaving the slot empty.
    ///
    /// ### 中文
    /// 取走待取值，槽位变为空。
    pub(crate) fn take(&self) -> Option<T> {
        let ptr = self.ptr.swap(ptr::null_mut(), Ordering::AcqRel);
        if ptr.is_null() {
            return None;
        }

        let mut node = unsafe { Box::from_raw(ptr) };
        let value = node.take();
        self.push_free(node);
        value
    }

    #[inline]
    fn pop_free(&self) -> Option<Box<Option<T>>> {
        let ptr = self.free.swap(ptr::null_mut(), Ordering::AcqRel);
        if ptr.is_null() {
            None
        } else {
            Some(unsafe { Box::from_raw(ptr) })
        }
    }

    #[inline]
    fn push_free(&self, node: Box<Option<T>>) {
        debug_assert!(node.is_none());
        let old_ptr = self.free.swap(Box::into_raw(node), Ordering::AcqRel);
        if !old_ptr.is_null() {
            unsafe {
                drop(Box::from_raw(old_ptr));
            }
        }
    }
}

impl<T> Drop for CoalescedBox<T> {
    fn drop(&mut self) {
        for slot in [&self.ptr, &self.free] {
            let ptr = slot.swap(ptr::null_mut(), Ordering::AcqRel);
            if !ptr.is_null() {
                unsafe {
                    drop(Box::from_raw(ptr));
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;

    #[test]
    fn keeps_only_the_latest_value() {
        let slot = CoalescedBox::default();
        assert!(!slot.is_pending());
        assert_eq!(slot.replace(1), None);
        assert_eq!(slot.replace(2), Some(1));
        assert_eq!(slot.replace(3), Some(2));
        assert!(slot.is_pending());
        assert_eq!(slot.take(), Some(3));
        assert_eq!(slot.take(), None);
        assert!(!slot.is_pending());
    }

    #[test]
    fn drops_pending_values_with_the_slot() {
        let value = Arc::new(());
        {
            let slot = CoalescedBox::default();
            slot.replace(value.clone());
            assert_eq!(Arc::strong_count(&value), 2);
        }
        assert_eq!(Arc::strong_count(&value), 1);
    }
}
