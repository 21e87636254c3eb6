// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2026 ® John Hauger Mitander <john@mitander.dev>

pub mod app;
pub mod common;
pub mod domain;
pub mod infrastructure;
pub mod services;

// Shared aliases for frequently used modules.
pub use infrastructure::data;
pub use infrastructure::network;
pub use services::engine as core;
