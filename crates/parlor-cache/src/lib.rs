// SPDX-FileCopyrightText: 2026 Parlor Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! In-process TTL cache implementing the [`CacheStore`] seam.
//!
//! Backs the room-listing read cache. Entries expire lazily: an expired
//! entry is dropped on the read that finds it. The cache is never
//! authoritative; callers treat any miss (or error from a remote
//! implementation of the seam) as a cue to read through to storage.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use dashmap::DashMap;
use tracing::trace;

use parlor_core::{AdapterType, CacheStore, HealthStatus, ParlorError, PluginAdapter};

struct Entry {
    value: String,
    expires_at: Instant,
}

/// Sharded in-memory cache with per-entry TTL.
#[derive(Default)]
pub struct MemoryCache {
    entries: DashMap<String, Entry>,
}

impl MemoryCache {
    pub fn new() -> Self {
        Self {
            entries: DashMap::new(),
        }
    }

    /// Number of live (possibly expired, not yet swept) entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[async_trait]
impl PluginAdapter for MemoryCache {
    fn name(&self) -> &str {
        "memory"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Cache
    }

    async fn health_check(&self) -> Result<HealthStatus, ParlorError> {
        Ok(HealthStatus::Healthy)
    }

    async fn shutdown(&self) -> Result<(), ParlorError> {
        self.entries.clear();
        Ok(())
    }
}

#[async_trait]
impl CacheStore for MemoryCache {
    async fn get(&self, key: &str) -> Result<Option<String>, ParlorError> {
        if let Some(entry) = self.entries.get(key) {
            if entry.expires_at > Instant::now() {
                trace!(key, "cache hit");
                return Ok(Some(entry.value.clone()));
            }
            // Release the read guard before removing the expired entry.
            drop(entry);
            self.entries.remove(key);
        }
        trace!(key, "cache miss");
        Ok(None)
    }

    async fn set(&self, key: &str, value: &str, ttl: Duration) -> Result<(), ParlorError> {
        self.entries.insert(
            key.to_string(),
            Entry {
                value: value.to_string(),
                expires_at: Instant::now() + ttl,
            },
        );
        Ok(())
    }

    async fn invalidate(&self, key: &str) -> Result<(), ParlorError> {
        self.entries.remove(key);
        Ok(())
    }
}
