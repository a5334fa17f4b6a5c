// SPDX-FileCopyrightText: 2026 Parlor Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error types for the Parlor chat backend.

use std::time::Duration;

use thiserror::Error;

/// The primary error type used across all Parlor adapter traits and core operations.
#[derive(Debug, Error)]
pub enum ParlorError {
    /// Configuration errors (invalid TOML, missing required fields, type mismatches).
    #[error("configuration error: {0}")]
    Config(String),

    /// Storage backend errors (database connection, query failure, serialization).
    #[error("storage error: {source}")]
    Storage {
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Cache backend errors. Callers on the room-listing path absorb these and
    /// fall back to reading through to storage.
    #[error("cache error: {source}")]
    Cache {
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Job queue errors (enqueue/claim/ack failures).
    #[error("queue error: {0}")]
    Queue(String),

    /// Completion provider errors outside the classified taxonomy
    /// (client construction, credential problems).
    #[error("provider error: {message}")]
    Provider {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Operation timed out.
    #[error("operation timed out after {duration:?}")]
    Timeout { duration: Duration },

    /// The chatroom does not exist or is not owned by the requesting user.
    #[error("chatroom {chatroom_id} not found for user {user_id}")]
    RoomAccess { chatroom_id: i64, user_id: i64 },

    /// Internal or unexpected errors.
    #[error("internal error: {0}")]
    Internal(String),
}

/// Classified failure from the external completion service.
///
/// The worker pool uses [`CompletionError::is_terminal`] to decide between
/// requeue-with-backoff and persisting a terminal explanation reply.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CompletionError {
    /// The upstream service rejected the request with a 429-class response.
    #[error("rate limited by the completion service")]
    RateLimited,

    /// The upstream service rejected the request with a 403-class response.
    #[error("completion request forbidden: {0}")]
    Forbidden(String),

    /// The requested model does not exist (404-class response).
    #[error("completion model not found: {0}")]
    NotFound(String),

    /// The request did not complete within the configured bound.
    #[error("completion request timed out after {0:?}")]
    Timeout(Duration),

    /// Transport failures and unclassified upstream responses (5xx and friends).
    #[error("completion service failure: {0}")]
    Unknown(String),
}

impl CompletionError {
    /// Terminal errors cannot succeed on retry. The worker persists a
    /// user-facing explanation reply and acknowledges the job instead of
    /// requeueing it.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Forbidden(_) | Self::NotFound(_))
    }

    /// Reply content persisted into the chatroom when the failure is terminal.
    pub fn user_reply(&self) -> &'static str {
        match self {
            Self::RateLimited => "You've hit the rate limit. Please try again later.",
            Self::Forbidden(_) => "Forbidden: Check your API key or permissions.",
            Self::NotFound(_) => "Model not found. Check the model name.",
            Self::Timeout(_) | Self::Unknown(_) => {
                "The assistant is temporarily unavailable. Please try again later."
            }
        }
    }
}
