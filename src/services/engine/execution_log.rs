// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2026 ® John Hauger Mitander <john@mitander.dev>

use crate::common::time::current_unix;
use crate::domain::task::{ExecutionStatus, TaskExecution};
use std::sync::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};

/// Append-only log of per-wallet execution outcomes. Records are never
/// mutated after insertion.
#[derive(Default)]
pub struct ExecutionLog {
    records: Mutex<Vec<TaskExecution>>,
    next_id: AtomicU64,
}

impl ExecutionLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append(
        &self,
        task_id: &str,
        wallet_id: &str,
        status: ExecutionStatus,
        tx_hash: Option<String>,
        error: Option<String>,
    ) -> u64 {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let record = TaskExecution {
            id,
            task_id: task_id.to_string(),
            wallet_id: wallet_id.to_string(),
            status,
            tx_hash,
            error,
            created_at: current_unix(),
        };
        self.records.lock().unwrap().push(record);
        id
    }

    pub fn for_task(&self, task_id: &str) -> Vec<TaskExecution> {
        self.records
            .lock()
            .unwrap()
            .iter()
            .filter(|r| r.task_id == task_id)
            .cloned()
            .collect()
    }

    pub fn len(&self) -> usize {
        self.records.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.lock().unwrap().is_empty()
    }
}
