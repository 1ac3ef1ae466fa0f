//! FIFO queues for work the renderer postpones.
//!
//! The host drains them: frame tasks on its next animation frame, deferred
//! tasks once row exit animations have finished.

use std::collections::VecDeque;

use super::row_ctrl::RowCtrlId;

/// Work scheduled for the next animation frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FrameTask {
    /// Build the components of a controller created while scrolling.
    BuildRow(RowCtrlId),
}

/// Work scheduled to run after exit animations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeferredTask {
    /// Finish tearing down a batch of zombie controllers.
    FinishDestroy(Vec<RowCtrlId>),
}

/// Ordered task list.
#[derive(Debug, Clone)]
pub struct TaskQueue<T> {
    tasks: VecDeque<T>,
}

impl<T> Default for TaskQueue<T> {
    fn default() -> Self {
        Self {
            tasks: VecDeque::new(),
        }
    }
}

impl<T> TaskQueue<T> {
    /// Empty queue.
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue `task` behind the others.
    pub fn push(&mut self, task: T) {
        self.tasks.push_back(task);
    }

    /// Oldest queued task.
    pub fn pop(&mut self) -> Option<T> {
        self.tasks.pop_front()
    }

    /// Number of queued tasks.
    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    /// Whether nothing is queued.
    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Take every queued task, oldest first.
    pub fn drain(&mut self) -> Vec<T> {
        self.tasks.drain(..).collect()
    }

    /// Drop every queued task.
    pub fn clear(&mut self) {
        self.tasks.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tasks_come_out_in_push_order() {
        let mut queue = TaskQueue::new();
        queue.push(FrameTask::BuildRow(RowCtrlId::new(2)));
        queue.push(FrameTask::BuildRow(RowCtrlId::new(1)));

        assert_eq!(queue.len(), 2);
        assert_eq!(queue.pop(), Some(FrameTask::BuildRow(RowCtrlId::new(2))));
        assert_eq!(queue.drain(), vec![FrameTask::BuildRow(RowCtrlId::new(1))]);
        assert!(queue.is_empty());
    }

    #[test]
    fn tasks_pushed_while_draining_wait_for_next_drain() {
        let mut queue = TaskQueue::new();
        queue.push(DeferredTask::FinishDestroy(vec![RowCtrlId::new(1)]));

        let drained = queue.drain();
        queue.push(DeferredTask::FinishDestroy(vec![RowCtrlId::new(2)]));

        assert_eq!(drained.len(), 1);
        assert_eq!(queue.len(), 1);
    }
}
