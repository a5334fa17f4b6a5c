// SPDX-FileCopyrightText: 2026 Parlor Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test utilities for Parlor integration tests.

pub mod broken_cache;
pub mod harness;
pub mod mock_completion;

pub use broken_cache::BrokenCache;
pub use harness::temp_storage;
pub use mock_completion::{MockCompletion, ScriptedResult};
