// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2026 ® John Hauger Mitander <john@mitander.dev>

use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

/// Lifecycle status of a supervised task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskStatus {
    Idle,
    Running,
    Success,
    Failed,
    Stopped,
}

/// A supervised unit of work tracked in the task queue.
///
/// Created by `TaskQueue::add_task`, mutated only through `update_status`,
/// never implicitly deleted. The `retries` counter is part of the record but
/// no retry scheduling consumes it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Task {
    pub id: String,
    pub name: String,
    pub kind: String,
    pub status: TaskStatus,
    pub retries: u32,
    /// Opaque task payload, parsed by the service that runs the task.
    pub config: JsonValue,
}

impl Task {
    pub fn new(id: impl Into<String>, name: impl Into<String>, kind: impl Into<String>, config: JsonValue) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            kind: kind.into(),
            status: TaskStatus::Idle,
            retries: 0,
            config,
        }
    }
}

/// Terminal status of one per-wallet execution record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExecutionStatus {
    Success,
    Error,
    Skipped,
}

/// Append-only per-wallet outcome record for one run of a task or job.
/// Never mutated after creation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskExecution {
    pub id: u64,
    pub task_id: String,
    pub wallet_id: String,
    pub status: ExecutionStatus,
    pub tx_hash: Option<String>,
    pub error: Option<String>,
    pub created_at: u64,
}
