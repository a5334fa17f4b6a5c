// SPDX-FileCopyrightText: 2026 Parlor Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Mock completion provider for deterministic testing.
//!
//! `MockCompletion` implements `CompletionProvider` with pre-scripted
//! results, enabling fast, CI-runnable worker tests without external API
//! calls.

use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::Mutex;

use parlor_core::{
    AdapterType, CompletionError, CompletionProvider, HealthStatus, ParlorError, PluginAdapter,
};

/// One scripted provider outcome.
#[derive(Debug, Clone)]
pub enum ScriptedResult {
    /// Return this reply text.
    Reply(String),
    /// Return this classified error.
    Fail(CompletionError),
    /// Never return; exercises the worker's outer timeout.
    Stall,
}

/// A mock completion provider that pops pre-scripted results.
///
/// Results are consumed FIFO. When the script is empty, a default
/// "mock reply" text is returned. Every call is counted.
pub struct MockCompletion {
    script: Arc<Mutex<VecDeque<ScriptedResult>>>,
    calls: AtomicUsize,
}

impl MockCompletion {
    /// Create a mock provider with an empty script.
    pub fn new() -> Self {
        Self {
            script: Arc::new(Mutex::new(VecDeque::new())),
            calls: AtomicUsize::new(0),
        }
    }

    /// Create a mock provider pre-loaded with the given results.
    pub fn with_script(script: Vec<ScriptedResult>) -> Self {
        Self {
            script: Arc::new(Mutex::new(VecDeque::from(script))),
            calls: AtomicUsize::new(0),
        }
    }

    /// Shorthand for a provider that always succeeds with `text`.
    pub fn replying(text: &str) -> Self {
        Self::with_script(vec![ScriptedResult::Reply(text.to_string())])
    }

    /// Append a result to the end of the script.
    pub async fn push(&self, result: ScriptedResult) {
        self.script.lock().await.push_back(result);
    }

    /// Number of `complete` calls made so far.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    async fn next_result(&self) -> ScriptedResult {
        self.script
            .lock()
            .await
            .pop_front()
            .unwrap_or_else(|| ScriptedResult::Reply("mock reply".to_string()))
    }
}

impl Default for MockCompletion {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PluginAdapter for MockCompletion {
    fn name(&self) -> &str {
        "mock-completion"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Provider
    }

    async fn health_check(&self) -> Result<HealthStatus, ParlorError> {
        Ok(HealthStatus::Healthy)
    }

    async fn shutdown(&self) -> Result<(), ParlorError> {
        Ok(())
    }
}

#[async_trait]
impl CompletionProvider for MockCompletion {
    async fn complete(&self, _prompt: &str) -> Result<String, CompletionError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match self.next_result().await {
            ScriptedResult::Reply(text) => Ok(text),
            ScriptedResult::Fail(err) => Err(err),
            ScriptedResult::Stall => {
                // Far beyond any worker timeout used in tests.
                tokio::time::sleep(Duration::from_secs(600)).await;
                Err(CompletionError::Unknown("stall elapsed".into()))
            }
        }
    }
}
