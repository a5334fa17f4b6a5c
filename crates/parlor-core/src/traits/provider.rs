// SPDX-FileCopyrightText: 2026 Parlor Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Completion provider trait for the external AI service boundary.

use async_trait::async_trait;

use crate::error::CompletionError;
use crate::traits::adapter::PluginAdapter;

/// Thin boundary around the external AI completion service.
///
/// Implementations bound every call with their own request timeout and map
/// failures into the classified [`CompletionError`] taxonomy; the worker pool
/// adds a second, outer timeout on top.
#[async_trait]
pub trait CompletionProvider: PluginAdapter {
    /// Generates a reply for the prompt.
    async fn complete(&self, prompt: &str) -> Result<String, CompletionError>;
}
