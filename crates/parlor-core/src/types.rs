// SPDX-FileCopyrightText: 2026 Parlor Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Common types used across adapter traits and the Parlor pipeline.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Subscription tier controlling daily quota enforcement.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Tier {
    Basic,
    Pro,
}

/// Author role of a chat message.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Ai,
}

/// Health status reported by adapter health checks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HealthStatus {
    /// Adapter is fully operational.
    Healthy,
    /// Adapter is operational but experiencing issues.
    Degraded(String),
    /// Adapter is not operational.
    Unhealthy(String),
}

/// Identifies the type of adapter in the plugin seam.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
pub enum AdapterType {
    Storage,
    Cache,
    Queue,
    Provider,
}

/// Outcome of an admission check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AdmissionDecision {
    Allowed,
    Denied(DenialReason),
}

/// Why a message was refused admission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DenialReason {
    /// The user's daily quota is spent.
    QuotaExceeded,
    /// The counter store could not be reached; admission fails closed.
    Unavailable,
}

/// An inbound chat message handed to the core by the (out-of-scope) HTTP layer.
///
/// The caller has already authenticated the user and resolved their tier.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InboundMessage {
    pub chatroom_id: i64,
    pub user_id: i64,
    pub tier: Tier,
    pub content: String,
}

/// Synchronous receipt returned by message intake.
///
/// An `Accepted` receipt only promises that the user message is durable and a
/// reply job is queued; the AI reply itself lands later, out of band.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum IntakeReceipt {
    Accepted { message_id: i64, timestamp: String },
    Denied { reason: DenialReason },
}

/// Wire contract for a queued "generate reply" job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobPayload {
    pub user_message_id: i64,
    pub chatroom_id: i64,
    pub user_id: i64,
    pub prompt: String,
}

/// A registered user.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub phone: String,
    pub tier: String,
    pub created_at: String,
}

/// A chat room owned by a single user. Immutable after creation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chatroom {
    pub id: i64,
    pub user_id: i64,
    pub name: String,
    pub created_at: String,
}

/// A single chat message. Append-only.
///
/// `reply_to` is set only on AI messages and names the user message that
/// triggered the reply; a partial unique index over it makes duplicate
/// deliveries collapse into a single reply.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub id: i64,
    pub chatroom_id: i64,
    pub role: String,
    pub content: String,
    pub reply_to: Option<i64>,
    pub created_at: String,
}

/// A row in the durable job queue.
#[derive(Debug, Clone)]
pub struct QueueEntry {
    pub id: i64,
    pub queue_name: String,
    pub payload: String,
    pub status: String,
    pub attempts: i32,
    pub max_attempts: i32,
    pub created_at: String,
    pub updated_at: String,
    pub locked_until: Option<String>,
}

/// Result of a negative acknowledgement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NackOutcome {
    /// The job went back to pending and becomes claimable after the delay.
    Requeued { attempt: i32 },
    /// Attempts are exhausted; the job moved to the dead-letter sink.
    DeadLettered,
}

/// External subscription lifecycle event consumed from the payment feed.
///
/// The inbound adapter verifies the feed signature; the core only applies the
/// tier transition, idempotently keyed by `id`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubscriptionEvent {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: SubscriptionEventKind,
    #[serde(rename = "userId")]
    pub user_id: i64,
    #[serde(rename = "subscriptionId")]
    pub subscription_id: String,
}

/// Recognized subscription event types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SubscriptionEventKind {
    #[serde(rename = "checkout.session.completed")]
    PaymentCompleted,
    #[serde(rename = "customer.subscription.deleted")]
    SubscriptionCancelled,
}
