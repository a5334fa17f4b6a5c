// SPDX-FileCopyrightText: 2026 Parlor Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Durable job queue trait with at-least-once delivery.

use std::time::Duration;

use async_trait::async_trait;

use crate::error::ParlorError;
use crate::traits::adapter::PluginAdapter;
use crate::types::{NackOutcome, QueueEntry};

/// A durable, at-least-once job queue.
///
/// `dequeue` claims a job for a single consumer; the claim is held until
/// `ack`/`nack` or until the visibility window expires, after which the job
/// becomes claimable again. Consumers must therefore tolerate redelivery.
/// There is no cross-job ordering guarantee.
#[async_trait]
pub trait QueueClient: PluginAdapter {
    /// Appends a job and returns its id.
    async fn enqueue(
        &self,
        queue_name: &str,
        payload: &str,
        max_attempts: i32,
    ) -> Result<i64, ParlorError>;

    /// Claims the next eligible job, hiding it from other consumers for
    /// `visibility`. Returns `None` when the queue is empty; callers supply
    /// their own poll loop for blocking receive semantics.
    async fn dequeue(
        &self,
        queue_name: &str,
        visibility: Duration,
    ) -> Result<Option<QueueEntry>, ParlorError>;

    /// Acknowledges successful processing; the job will not be redelivered.
    async fn ack(&self, id: i64) -> Result<(), ParlorError>;

    /// Reports a transient failure. Below the attempt cap the job is requeued
    /// and becomes claimable after `retry_after`; at the cap it moves to the
    /// dead-letter sink.
    async fn nack(&self, id: i64, retry_after: Duration) -> Result<NackOutcome, ParlorError>;
}
