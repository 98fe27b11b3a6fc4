//! Request ids used to tell the latest fetch apart from superseded ones.

use std::sync::atomic::{AtomicU64, Ordering};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TaskId(pub u64);

/// Shared id generator. Ids are unique per store.
#[derive(Debug, Default)]
pub struct TaskSeq {
    next: AtomicU64,
}

impl TaskSeq {
    pub fn next_id(&self) -> TaskId {
        TaskId(self.next.fetch_add(1, Ordering::Relaxed))
    }
}

/// Tracks which request currently owns a state slice.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct TaskState {
    pub active: Option<TaskId>,
}

impl TaskState {
    pub fn is_running(&self) -> bool {
        self.active.is_some()
    }

    /// Marks `id` as the latest request; any earlier one is superseded.
    pub fn on_started(&mut self, id: TaskId) {
        self.active = Some(id);
    }

    /// Finishes `id` if it is still the latest request.
    ///
    /// Returns false for a superseded request, whose result must be dropped.
    pub fn finish_if_active(&mut self, id: TaskId) -> bool {
        let ok = self.active == Some(id);
        if ok {
            self.active = None;
        }
        ok
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ids_are_unique_and_increasing() {
        let seq = TaskSeq::default();
        let a = seq.next_id();
        let b = seq.next_id();
        assert_ne!(a, b);
        assert!(b.0 > a.0);
    }

    #[test]
    fn test_only_latest_task_finishes() {
        let seq = TaskSeq::default();
        let first = seq.next_id();
        let second = seq.next_id();

        let mut state = TaskState::default();
        state.on_started(first);
        state.on_started(second);

        assert!(!state.finish_if_active(first));
        assert!(state.is_running());
        assert!(state.finish_if_active(second));
        assert!(!state.is_running());
        assert!(!state.finish_if_active(second));
    }
}
