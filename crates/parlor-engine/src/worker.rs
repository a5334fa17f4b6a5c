// SPDX-FileCopyrightText: 2026 Parlor Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Reply worker pool: dequeue, call the completion provider, persist the
//! reply, ack or nack.
//!
//! Workers never crash on a failed job. Every processing arm resolves into
//! an ack (success, terminal failure, poison payload) or a nack with
//! exponential backoff (transient failure); exhausted jobs dead-letter
//! inside the queue and are logged as an observable failure event.

use std::sync::Arc;
use std::time::Duration;

use parlor_config::model::{QueueConfig, WorkerConfig};
use parlor_core::types::{JobPayload, NackOutcome, QueueEntry};
use parlor_core::{ChatStore, CompletionError, CompletionProvider, ParlorError, QueueClient};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::intake::REPLY_QUEUE;

/// Pool of concurrent reply workers over the durable queue.
#[derive(Clone)]
pub struct WorkerPool {
    queue: Arc<dyn QueueClient>,
    store: Arc<dyn ChatStore>,
    provider: Arc<dyn CompletionProvider>,
    concurrency: usize,
    completion_timeout: Duration,
    visibility: Duration,
    poll_interval: Duration,
    backoff_base: Duration,
    backoff_cap: Duration,
}

impl WorkerPool {
    pub fn new(
        queue: Arc<dyn QueueClient>,
        store: Arc<dyn ChatStore>,
        provider: Arc<dyn CompletionProvider>,
        worker: &WorkerConfig,
        queue_config: &QueueConfig,
    ) -> Self {
        Self {
            queue,
            store,
            provider,
            concurrency: worker.concurrency,
            completion_timeout: worker.completion_timeout(),
            visibility: queue_config.visibility_timeout(),
            poll_interval: queue_config.poll_interval(),
            backoff_base: queue_config.backoff_base(),
            backoff_cap: queue_config.backoff_cap(),
        }
    }

    /// Spawn the configured number of workers. Each runs until the token is
    /// cancelled, finishing its in-flight job first.
    pub fn spawn(&self, cancel: &CancellationToken) -> Vec<JoinHandle<()>> {
        (0..self.concurrency)
            .map(|index| {
                let pool = self.clone();
                let cancel = cancel.clone();
                tokio::spawn(async move { pool.run_worker(index, cancel).await })
            })
            .collect()
    }

    async fn run_worker(&self, index: usize, cancel: CancellationToken) {
        info!(worker = index, "reply worker started");
        loop {
            tokio::select! {
                _ = cancel.cancelled() => break,
                claimed = self.queue.dequeue(REPLY_QUEUE, self.visibility) => {
                    match claimed {
                        Ok(Some(entry)) => {
                            if let Err(e) = self.process_entry(&entry).await {
                                // Claim expiry will redeliver; at-least-once holds.
                                error!(worker = index, job = entry.id, error = %e,
                                       "job processing failed, leaving claim to expire");
                            }
                        }
                        Ok(None) => {
                            tokio::select! {
                                _ = cancel.cancelled() => break,
                                _ = tokio::time::sleep(self.poll_interval) => {}
                            }
                        }
                        Err(e) => {
                            error!(worker = index, error = %e, "dequeue failed");
                            tokio::select! {
                                _ = cancel.cancelled() => break,
                                _ = tokio::time::sleep(self.poll_interval) => {}
                            }
                        }
                    }
                }
            }
        }
        info!(worker = index, "reply worker stopped");
    }

    /// Process one claimed entry through to ack/nack.
    ///
    /// Returns `Err` only for storage/queue failures; completion failures
    /// are classified and absorbed here.
    pub async fn process_entry(&self, entry: &QueueEntry) -> Result<(), ParlorError> {
        let payload: JobPayload = match serde_json::from_str(&entry.payload) {
            Ok(payload) => payload,
            Err(e) => {
                // Poison message: no retry can fix an unparseable payload.
                error!(job = entry.id, error = %e, "unparseable job payload, dropping");
                self.queue.ack(entry.id).await?;
                return Ok(());
            }
        };

        let outcome =
            tokio::time::timeout(self.completion_timeout, self.provider.complete(&payload.prompt))
                .await;

        match outcome {
            Ok(Ok(reply)) => {
                self.persist_reply(entry, &payload, &reply).await?;
                self.queue.ack(entry.id).await?;
                debug!(job = entry.id, user_message_id = payload.user_message_id, "reply persisted");
            }
            Ok(Err(err)) if err.is_terminal() => {
                // Retrying cannot succeed; tell the user what happened
                // through the chat itself and finish the job.
                warn!(job = entry.id, error = %err, "terminal completion failure");
                self.persist_reply(entry, &payload, err.user_reply()).await?;
                self.queue.ack(entry.id).await?;
            }
            Ok(Err(err)) => {
                self.requeue(entry, &err).await?;
            }
            Err(_elapsed) => {
                let err = CompletionError::Timeout(self.completion_timeout);
                self.requeue(entry, &err).await?;
            }
        }
        Ok(())
    }

    async fn persist_reply(
        &self,
        entry: &QueueEntry,
        payload: &JobPayload,
        content: &str,
    ) -> Result<(), ParlorError> {
        let inserted = self
            .store
            .insert_ai_reply(payload.chatroom_id, content, payload.user_message_id)
            .await?;
        if !inserted {
            debug!(
                job = entry.id,
                user_message_id = payload.user_message_id,
                "duplicate delivery absorbed"
            );
        }
        Ok(())
    }

    async fn requeue(&self, entry: &QueueEntry, err: &CompletionError) -> Result<(), ParlorError> {
        let delay = backoff_delay(entry.attempts, self.backoff_base, self.backoff_cap);
        match self.queue.nack(entry.id, delay).await? {
            NackOutcome::Requeued { attempt } => {
                info!(
                    job = entry.id,
                    attempt,
                    delay_ms = delay.as_millis() as u64,
                    error = %err,
                    "transient completion failure, requeued"
                );
            }
            NackOutcome::DeadLettered => {
                warn!(
                    job = entry.id,
                    attempts = entry.attempts + 1,
                    error = %err,
                    "job dead-lettered"
                );
            }
        }
        Ok(())
    }
}

/// Exponential backoff: `base * 2^attempts`, capped.
fn backoff_delay(attempts: i32, base: Duration, cap: Duration) -> Duration {
    let factor = 2u32.saturating_pow(attempts.max(0) as u32);
    base.saturating_mul(factor).min(cap)
}

#[cfg(test)]
mod tests {
    use super::*;
    use parlor_config::model::{QueueConfig, WorkerConfig};
    use parlor_core::CompletionError;
    use parlor_storage::SqliteStorage;
    use parlor_test_utils::{MockCompletion, ScriptedResult, temp_storage};
    use proptest::prelude::*;

    const VIS: Duration = Duration::from_secs(30);

    fn fast_queue_config() -> QueueConfig {
        QueueConfig {
            max_attempts: 3,
            visibility_timeout_secs: 30,
            poll_interval_ms: 10,
            backoff_base_ms: 1,
            backoff_cap_ms: 4,
        }
    }

    fn pool_with(
        storage: Arc<SqliteStorage>,
        provider: Arc<MockCompletion>,
    ) -> WorkerPool {
        WorkerPool::new(
            storage.clone(),
            storage,
            provider,
            &WorkerConfig {
                concurrency: 1,
                completion_timeout_secs: 1,
            },
            &fast_queue_config(),
        )
    }

    /// Seed a user, room, user message, and a queued reply job.
    async fn seed_job(storage: &Arc<SqliteStorage>) -> (i64, JobPayload) {
        use parlor_core::types::Tier;
        use parlor_core::{ChatStore, QueueClient};

        let user = storage.create_user("+15550001111", Tier::Basic).await.unwrap();
        let room = storage.create_room(user.id, "general").await.unwrap();
        let msg = storage.insert_user_message(room.id, "hello").await.unwrap();
        let payload = JobPayload {
            user_message_id: msg.id,
            chatroom_id: room.id,
            user_id: user.id,
            prompt: "hello".into(),
        };
        let raw = serde_json::to_string(&payload).unwrap();
        let job_id = storage.enqueue(REPLY_QUEUE, &raw, 3).await.unwrap();
        (job_id, payload)
    }

    #[tokio::test]
    async fn successful_completion_persists_reply_and_acks() {
        use parlor_core::QueueClient;

        let (storage, _dir) = temp_storage().await;
        let provider = Arc::new(MockCompletion::replying("hi there"));
        let pool = pool_with(storage.clone(), provider);

        let (job_id, payload) = seed_job(&storage).await;
        let entry = storage.dequeue(REPLY_QUEUE, VIS).await.unwrap().unwrap();
        pool.process_entry(&entry).await.unwrap();

        let reply = storage
            .find_reply(payload.user_message_id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(reply.content, "hi there");
        assert_eq!(reply.role, "ai");

        let stored = storage.queue_entry(job_id).await.unwrap().unwrap();
        assert_eq!(stored.status, "completed");
    }

    #[tokio::test]
    async fn redelivered_job_produces_exactly_one_reply() {
        use parlor_core::{ChatStore, QueueClient};

        let (storage, _dir) = temp_storage().await;
        let provider = Arc::new(MockCompletion::with_script(vec![
            ScriptedResult::Reply("first delivery".into()),
            ScriptedResult::Reply("second delivery".into()),
        ]));
        let pool = pool_with(storage.clone(), provider);

        let (_job_id, payload) = seed_job(&storage).await;

        // At-least-once delivery: the same payload arrives twice (e.g. a
        // claim expired mid-flight and another worker reprocessed it).
        let entry = storage.dequeue(REPLY_QUEUE, VIS).await.unwrap().unwrap();
        pool.process_entry(&entry).await.unwrap();

        let raw = serde_json::to_string(&payload).unwrap();
        storage.enqueue(REPLY_QUEUE, &raw, 3).await.unwrap();
        let redelivery = storage.dequeue(REPLY_QUEUE, VIS).await.unwrap().unwrap();
        pool.process_entry(&redelivery).await.unwrap();

        let messages = storage
            .messages_for_room(payload.chatroom_id, None)
            .await
            .unwrap();
        let replies: Vec<_> = messages
            .iter()
            .filter(|m| m.reply_to == Some(payload.user_message_id))
            .collect();
        assert_eq!(replies.len(), 1, "duplicate delivery must be absorbed");
        assert_eq!(replies[0].content, "first delivery");
    }

    #[tokio::test]
    async fn terminal_failure_persists_explanation_and_never_retries() {
        use parlor_core::QueueClient;

        let (storage, _dir) = temp_storage().await;
        let provider = Arc::new(MockCompletion::with_script(vec![ScriptedResult::Fail(
            CompletionError::Forbidden("bad key".into()),
        )]));
        let pool = pool_with(storage.clone(), provider.clone());

        let (job_id, payload) = seed_job(&storage).await;
        let entry = storage.dequeue(REPLY_QUEUE, VIS).await.unwrap().unwrap();
        pool.process_entry(&entry).await.unwrap();

        let reply = storage
            .find_reply(payload.user_message_id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(reply.content, "Forbidden: Check your API key or permissions.");
        assert_eq!(reply.role, "ai");

        let stored = storage.queue_entry(job_id).await.unwrap().unwrap();
        assert_eq!(stored.status, "completed", "terminal failures are acked");
        assert_eq!(stored.attempts, 0);
        assert_eq!(provider.calls(), 1);
    }

    #[tokio::test]
    async fn rate_limit_requeues_without_persisting() {
        use parlor_core::QueueClient;

        let (storage, _dir) = temp_storage().await;
        let provider = Arc::new(MockCompletion::with_script(vec![ScriptedResult::Fail(
            CompletionError::RateLimited,
        )]));
        let pool = pool_with(storage.clone(), provider);

        let (job_id, payload) = seed_job(&storage).await;
        let entry = storage.dequeue(REPLY_QUEUE, VIS).await.unwrap().unwrap();
        pool.process_entry(&entry).await.unwrap();

        assert!(
            storage
                .find_reply(payload.user_message_id)
                .await
                .unwrap()
                .is_none(),
            "rate limit must not persist a message"
        );
        let stored = storage.queue_entry(job_id).await.unwrap().unwrap();
        assert_eq!(stored.status, "pending");
        assert_eq!(stored.attempts, 1);
    }

    #[tokio::test]
    async fn repeated_timeouts_dead_letter_the_job() {
        use parlor_core::QueueClient;

        let (storage, _dir) = temp_storage().await;
        let provider = Arc::new(MockCompletion::with_script(vec![
            ScriptedResult::Fail(CompletionError::Timeout(Duration::from_secs(1))),
            ScriptedResult::Fail(CompletionError::Timeout(Duration::from_secs(1))),
            ScriptedResult::Fail(CompletionError::Timeout(Duration::from_secs(1))),
        ]));
        let pool = pool_with(storage.clone(), provider.clone());

        let (job_id, payload) = seed_job(&storage).await;

        // max_attempts = 3: drive the job through its full retry budget.
        for _ in 0..3 {
            tokio::time::sleep(Duration::from_millis(10)).await;
            let entry = storage.dequeue(REPLY_QUEUE, VIS).await.unwrap().unwrap();
            pool.process_entry(&entry).await.unwrap();
        }

        let stored = storage.queue_entry(job_id).await.unwrap().unwrap();
        assert_eq!(stored.status, "dead");
        assert_eq!(stored.attempts, 3);
        assert_eq!(provider.calls(), 3);
        assert!(
            storage
                .find_reply(payload.user_message_id)
                .await
                .unwrap()
                .is_none(),
            "the user message stays unanswered until reconciliation"
        );

        let dead = storage.dead_letters(REPLY_QUEUE).await.unwrap();
        assert_eq!(dead.len(), 1);
        assert_eq!(dead[0].id, job_id);
    }

    #[tokio::test]
    async fn stalled_provider_hits_the_outer_timeout_and_requeues() {
        use parlor_core::QueueClient;

        let (storage, _dir) = temp_storage().await;
        let provider = Arc::new(MockCompletion::with_script(vec![ScriptedResult::Stall]));
        let pool = WorkerPool {
            completion_timeout: Duration::from_millis(50),
            ..pool_with(storage.clone(), provider)
        };

        let (job_id, _payload) = seed_job(&storage).await;
        let entry = storage.dequeue(REPLY_QUEUE, VIS).await.unwrap().unwrap();
        pool.process_entry(&entry).await.unwrap();

        let stored = storage.queue_entry(job_id).await.unwrap().unwrap();
        assert_eq!(stored.status, "pending");
        assert_eq!(stored.attempts, 1);
    }

    #[tokio::test]
    async fn unparseable_payload_is_dropped_not_retried() {
        use parlor_core::QueueClient;

        let (storage, _dir) = temp_storage().await;
        let provider = Arc::new(MockCompletion::new());
        let pool = pool_with(storage.clone(), provider.clone());

        let job_id = storage.enqueue(REPLY_QUEUE, "not json", 3).await.unwrap();
        let entry = storage.dequeue(REPLY_QUEUE, VIS).await.unwrap().unwrap();
        pool.process_entry(&entry).await.unwrap();

        let stored = storage.queue_entry(job_id).await.unwrap().unwrap();
        assert_eq!(stored.status, "completed");
        assert_eq!(provider.calls(), 0, "provider is never called for poison");
    }

    #[tokio::test]
    async fn spawned_workers_drain_the_queue_and_stop_on_cancel() {
        use parlor_core::ChatStore;

        let (storage, _dir) = temp_storage().await;
        let provider = Arc::new(MockCompletion::new());
        let pool = pool_with(storage.clone(), provider);

        let (_job_id, payload) = seed_job(&storage).await;

        let cancel = CancellationToken::new();
        let handles = pool.spawn(&cancel);
        assert_eq!(handles.len(), 1);

        // Poll until the reply lands.
        let mut reply = None;
        for _ in 0..200 {
            if let Some(found) = storage.find_reply(payload.user_message_id).await.unwrap() {
                reply = Some(found);
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        let reply = reply.expect("worker should persist the reply");
        assert_eq!(reply.content, "mock reply");

        cancel.cancel();
        for handle in handles {
            handle.await.unwrap();
        }
        storage.close().await.unwrap();
    }

    proptest! {
        #[test]
        fn backoff_delay_is_monotone_and_capped(attempts in 0i32..64) {
            let base = Duration::from_millis(100);
            let cap = Duration::from_secs(60);
            let delay = backoff_delay(attempts, base, cap);
            prop_assert!(delay >= base.min(cap));
            prop_assert!(delay <= cap);
            let next = backoff_delay(attempts + 1, base, cap);
            prop_assert!(next >= delay);
        }
    }
}
