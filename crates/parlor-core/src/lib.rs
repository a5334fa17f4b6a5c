// SPDX-FileCopyrightText: 2026 Parlor Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Core library for the Parlor chat backend.
//!
//! This crate provides the foundational trait definitions, error types, and
//! domain types used throughout the Parlor workspace: the admission decision
//! model, the job queue wire contract, and the injected-interface seams for
//! storage, cache, queue, and the completion provider.

pub mod error;
pub mod traits;
pub mod types;

// Re-export key items at crate root for ergonomic imports.
pub use error::{CompletionError, ParlorError};
pub use types::{
    AdapterType, AdmissionDecision, DenialReason, HealthStatus, IntakeReceipt, JobPayload,
    NackOutcome, Tier,
};

// Re-export all adapter traits at crate root.
pub use traits::{
    CacheStore, ChatStore, CompletionProvider, CounterStore, PluginAdapter, QueueClient,
};
