// SPDX-FileCopyrightText: 2026 Parlor Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Usage counter trait backing admission decisions.

use async_trait::async_trait;

use crate::error::ParlorError;
use crate::traits::adapter::PluginAdapter;

/// Per-user-per-day atomic usage counter.
///
/// The key is `(user_id, date)` with the date as `YYYY-MM-DD`; rollover to a
/// fresh day needs no reset job because a new date is a new key.
#[async_trait]
pub trait CounterStore: PluginAdapter {
    /// Atomically increment-or-create the counter for `(user_id, date)` if it
    /// is below `limit`. Returns whether the increment happened.
    ///
    /// Implementations must make the check and the increment one atomic
    /// operation: two concurrent calls observing `limit - 1` must not both
    /// succeed. A read followed by a separate write is not a valid
    /// implementation.
    async fn try_increment(
        &self,
        user_id: i64,
        date: &str,
        limit: i64,
    ) -> Result<bool, ParlorError>;

    /// Current count for `(user_id, date)`, zero when absent.
    async fn count(&self, user_id: i64, date: &str) -> Result<i64, ParlorError>;
}
