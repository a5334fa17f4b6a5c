// SPDX-FileCopyrightText: 2026 Parlor Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Message intake: admission, durable persistence of the user message, and
//! handoff to the reply queue.
//!
//! The caller gets a synchronous receipt only. The AI reply lands later via
//! the worker pool; an `Accepted` receipt means "durable and queued",
//! nothing more.

use std::sync::Arc;

use parlor_core::types::{AdmissionDecision, InboundMessage, IntakeReceipt, JobPayload};
use parlor_core::{ChatStore, ParlorError, QueueClient};
use tracing::{debug, info};

use crate::admission::AdmissionController;

/// Queue carrying "generate reply" jobs.
pub const REPLY_QUEUE: &str = "replies";

/// Accepts inbound messages into the pipeline.
pub struct MessageIntake {
    store: Arc<dyn ChatStore>,
    queue: Arc<dyn QueueClient>,
    admission: AdmissionController,
    max_attempts: i32,
}

impl MessageIntake {
    pub fn new(
        store: Arc<dyn ChatStore>,
        queue: Arc<dyn QueueClient>,
        admission: AdmissionController,
        max_attempts: u32,
    ) -> Self {
        Self {
            store,
            queue,
            admission,
            max_attempts: max_attempts as i32,
        }
    }

    /// Handle one inbound message: check room ownership, admit against the
    /// quota, persist the user message, enqueue the reply job.
    ///
    /// Ordering matters: the message is persisted only after a positive
    /// admission (a denial must not leave rows behind), and the job is
    /// enqueued only after the message is durable so every queued job
    /// references an existing message id.
    pub async fn submit(&self, inbound: InboundMessage) -> Result<IntakeReceipt, ParlorError> {
        let room = self
            .store
            .get_room(inbound.chatroom_id)
            .await?
            .filter(|room| room.user_id == inbound.user_id)
            .ok_or(ParlorError::RoomAccess {
                chatroom_id: inbound.chatroom_id,
                user_id: inbound.user_id,
            })?;

        let today = chrono::Utc::now().format("%Y-%m-%d").to_string();
        match self
            .admission
            .admit(inbound.user_id, inbound.tier, &today)
            .await
        {
            AdmissionDecision::Denied(reason) => {
                info!(
                    user_id = inbound.user_id,
                    chatroom_id = room.id,
                    ?reason,
                    "message denied"
                );
                Ok(IntakeReceipt::Denied { reason })
            }
            AdmissionDecision::Allowed => {
                let message = self
                    .store
                    .insert_user_message(room.id, &inbound.content)
                    .await?;

                let payload = JobPayload {
                    user_message_id: message.id,
                    chatroom_id: room.id,
                    user_id: inbound.user_id,
                    prompt: inbound.content,
                };
                let raw = serde_json::to_string(&payload)
                    .map_err(|e| ParlorError::Internal(format!("payload encoding: {e}")))?;
                let job_id = self
                    .queue
                    .enqueue(REPLY_QUEUE, &raw, self.max_attempts)
                    .await?;

                debug!(
                    job_id,
                    message_id = message.id,
                    chatroom_id = room.id,
                    "reply job enqueued"
                );
                Ok(IntakeReceipt::Accepted {
                    message_id: message.id,
                    timestamp: message.created_at,
                })
            }
        }
    }
}
