// SPDX-FileCopyrightText: 2026 Parlor Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Read cache trait for room listings.

use std::time::Duration;

use async_trait::async_trait;

use crate::error::ParlorError;
use crate::traits::adapter::PluginAdapter;

/// Short-TTL read cache, invalidated on writes.
///
/// Cache content is never authoritative. Callers treat every error from this
/// trait as a miss and read through to the chat store.
#[async_trait]
pub trait CacheStore: PluginAdapter {
    /// Looks up a key. `None` is a miss.
    async fn get(&self, key: &str) -> Result<Option<String>, ParlorError>;

    /// Stores a value that expires after `ttl`.
    async fn set(&self, key: &str, value: &str, ttl: Duration) -> Result<(), ParlorError>;

    /// Drops a key. Invalidating an absent key is a no-op.
    async fn invalidate(&self, key: &str) -> Result<(), ParlorError>;
}
