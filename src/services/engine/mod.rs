// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2026 ® John Hauger Mitander <john@mitander.dev>

pub mod execution_log;
pub mod gas;
pub mod job_runner;
pub mod nonce;
pub mod pool;
pub mod task_queue;
pub mod task_service;
pub mod worker;
