// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2026 ® John Hauger Mitander <john@mitander.dev>

use crate::domain::task::{Task, TaskStatus};
use std::collections::HashMap;
use std::sync::Mutex;

/// In-memory task registry keyed by task id.
///
/// Single-writer: all mutation routes through the owning service. The inner
/// mutex only makes snapshot reads safe, it is not a licence for concurrent
/// uncoordinated writers.
#[derive(Default)]
pub struct TaskQueue {
    tasks: Mutex<HashMap<String, Task>>,
}

impl TaskQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a task, normalizing it to Idle with a zeroed retry counter.
    pub fn add_task(&self, task: Task) {
        let mut tasks = self.tasks.lock().unwrap();
        tasks.insert(
            task.id.clone(),
            Task {
                status: TaskStatus::Idle,
                retries: 0,
                ..task
            },
        );
    }

    pub fn remove_task(&self, task_id: &str) {
        self.tasks.lock().unwrap().remove(task_id);
    }

    pub fn get_task(&self, task_id: &str) -> Option<Task> {
        self.tasks.lock().unwrap().get(task_id).cloned()
    }

    pub fn all_tasks(&self) -> Vec<Task> {
        self.tasks.lock().unwrap().values().cloned().collect()
    }

    /// Update a task's status. Unknown ids are a silent no-op.
    pub fn update_status(&self, task_id: &str, status: TaskStatus) {
        let mut tasks = self.tasks.lock().unwrap();
        if let Some(task) = tasks.get_mut(task_id) {
            task.status = status;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn task(id: &str) -> Task {
        Task::new(id, "mint batch", "mint", json!({}))
    }

    #[test]
    fn add_normalizes_to_idle_with_zero_retries() {
        let queue = TaskQueue::new();
        let mut t = task("t1");
        t.status = TaskStatus::Running;
        t.retries = 3;
        queue.add_task(t);

        let stored = queue.get_task("t1").unwrap();
        assert_eq!(stored.status, TaskStatus::Idle);
        assert_eq!(stored.retries, 0);
    }

    #[test]
    fn update_status_unknown_id_is_noop() {
        let queue = TaskQueue::new();
        queue.update_status("ghost", TaskStatus::Failed);
        assert!(queue.get_task("ghost").is_none());
        assert!(queue.all_tasks().is_empty());
    }

    #[test]
    fn status_transitions_persist() {
        let queue = TaskQueue::new();
        queue.add_task(task("t1"));
        queue.update_status("t1", TaskStatus::Running);
        assert_eq!(queue.get_task("t1").unwrap().status, TaskStatus::Running);
        queue.update_status("t1", TaskStatus::Success);
        assert_eq!(queue.get_task("t1").unwrap().status, TaskStatus::Success);
    }

    #[test]
    fn remove_deletes_the_record() {
        let queue = TaskQueue::new();
        queue.add_task(task("t1"));
        queue.add_task(task("t2"));
        queue.remove_task("t1");
        assert!(queue.get_task("t1").is_none());
        assert_eq!(queue.all_tasks().len(), 1);
    }
}
