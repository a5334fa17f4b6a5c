// SPDX-FileCopyrightText: 2026 Parlor Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Gemini completion provider adapter for the Parlor chat backend.
//!
//! Wraps [`GeminiClient`] behind the [`CompletionProvider`] seam so the
//! worker pool only sees prompt-in, reply-or-classified-error-out.

pub mod client;
pub mod types;

use std::time::Duration;

use async_trait::async_trait;

use parlor_config::model::GeminiConfig;
use parlor_core::{
    AdapterType, CompletionError, CompletionProvider, HealthStatus, ParlorError, PluginAdapter,
};

pub use client::{DEFAULT_BASE_URL, GeminiClient};

/// Environment variable consulted when the config carries no API key.
const API_KEY_ENV: &str = "GEMINI_API_KEY";

/// Gemini-backed completion provider.
pub struct GeminiCompletion {
    client: GeminiClient,
}

impl GeminiCompletion {
    /// Build a provider from configuration.
    ///
    /// The API key comes from `gemini.api_key` or, failing that, the
    /// `GEMINI_API_KEY` environment variable. A missing key is a
    /// configuration error: the serve path refuses to start rather than
    /// dead-lettering every job at runtime.
    pub fn from_config(
        config: &GeminiConfig,
        request_timeout: Duration,
    ) -> Result<Self, ParlorError> {
        let api_key = config
            .api_key
            .clone()
            .or_else(|| std::env::var(API_KEY_ENV).ok())
            .ok_or_else(|| {
                ParlorError::Config(format!(
                    "no Gemini API key: set gemini.api_key or {API_KEY_ENV}"
                ))
            })?;

        let client = GeminiClient::new(
            api_key,
            config.model.clone(),
            config.base_url.clone(),
            request_timeout,
        )?;
        Ok(Self { client })
    }

    /// Build a provider around an existing client (tests).
    pub fn with_client(client: GeminiClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl PluginAdapter for GeminiCompletion {
    fn name(&self) -> &str {
        "gemini"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Provider
    }

    async fn health_check(&self) -> Result<HealthStatus, ParlorError> {
        // No probe request: a healthy client is one that was constructed
        // with credentials. Upstream failures surface per-call, classified.
        Ok(HealthStatus::Healthy)
    }

    async fn shutdown(&self) -> Result<(), ParlorError> {
        Ok(())
    }
}

#[async_trait]
impl CompletionProvider for GeminiCompletion {
    async fn complete(&self, prompt: &str) -> Result<String, CompletionError> {
        self.client.generate(prompt).await
    }
}
