// SPDX-FileCopyrightText: 2026 Parlor Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! A cache whose every operation fails. Exercises the fail-open discipline
//! on the room-listing path.

use std::time::Duration;

use async_trait::async_trait;

use parlor_core::{AdapterType, CacheStore, HealthStatus, ParlorError, PluginAdapter};

/// Cache store that is permanently unreachable.
#[derive(Default)]
pub struct BrokenCache;

impl BrokenCache {
    pub fn new() -> Self {
        Self
    }

    fn unreachable() -> ParlorError {
        ParlorError::Cache {
            source: "cache store unreachable".into(),
        }
    }
}

#[async_trait]
impl PluginAdapter for BrokenCache {
    fn name(&self) -> &str {
        "broken-cache"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Cache
    }

    async fn health_check(&self) -> Result<HealthStatus, ParlorError> {
        Ok(HealthStatus::Unhealthy("always broken".into()))
    }

    async fn shutdown(&self) -> Result<(), ParlorError> {
        Ok(())
    }
}

#[async_trait]
impl CacheStore for BrokenCache {
    async fn get(&self, _key: &str) -> Result<Option<String>, ParlorError> {
        Err(Self::unreachable())
    }

    async fn set(&self, _key: &str, _value: &str, _ttl: Duration) -> Result<(), ParlorError> {
        Err(Self::unreachable())
    }

    async fn invalidate(&self, _key: &str) -> Result<(), ParlorError> {
        Err(Self::unreachable())
    }
}
