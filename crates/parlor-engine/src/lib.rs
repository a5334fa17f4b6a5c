// SPDX-FileCopyrightText: 2026 Parlor Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Pipeline engine for the Parlor chat backend.
//!
//! The [`Engine`] is the central coordinator that:
//! - Admits inbound messages against the daily quota
//! - Persists user messages and hands reply jobs to the durable queue
//! - Runs the worker pool that calls the completion provider and persists
//!   AI replies
//! - Keeps the room-listing cache consistent with room writes
//! - Applies subscription events idempotently
//! - Handles graceful shutdown

pub mod admission;
pub mod intake;
pub mod rooms;
pub mod shutdown;
pub mod subscription;
pub mod worker;

use std::sync::Arc;
use std::time::Duration;

use parlor_config::model::ParlorConfig;
use parlor_core::types::{ChatMessage, Chatroom, InboundMessage, IntakeReceipt, SubscriptionEvent};
use parlor_core::{CacheStore, ChatStore, CompletionProvider, CounterStore, ParlorError, QueueClient};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::admission::AdmissionController;
use crate::intake::MessageIntake;
use crate::rooms::RoomService;
use crate::subscription::{EventApplication, SubscriptionProcessor};
use crate::worker::WorkerPool;

pub use crate::intake::REPLY_QUEUE;

/// The assembled pipeline: intake, rooms, subscriptions, and the worker pool
/// over injected storage, counter, queue, cache, and provider seams.
pub struct Engine {
    store: Arc<dyn ChatStore>,
    intake: MessageIntake,
    rooms: RoomService,
    subscriptions: SubscriptionProcessor,
    workers: WorkerPool,
}

impl Engine {
    pub fn new(
        config: &ParlorConfig,
        store: Arc<dyn ChatStore>,
        counter: Arc<dyn CounterStore>,
        queue: Arc<dyn QueueClient>,
        cache: Arc<dyn CacheStore>,
        provider: Arc<dyn CompletionProvider>,
    ) -> Self {
        let admission = AdmissionController::new(counter, config.quota.daily_limit);
        let intake = MessageIntake::new(
            store.clone(),
            queue.clone(),
            admission,
            config.queue.max_attempts,
        );
        let rooms = RoomService::new(store.clone(), cache, config.cache.ttl());
        let subscriptions = SubscriptionProcessor::new(store.clone());
        let workers = WorkerPool::new(queue, store.clone(), provider, &config.worker, &config.queue);

        info!(
            service = config.service.name.as_str(),
            daily_limit = config.quota.daily_limit,
            workers = config.worker.concurrency,
            "engine initialized"
        );

        Self {
            store,
            intake,
            rooms,
            subscriptions,
            workers,
        }
    }

    /// Accept a message into the pipeline; see [`MessageIntake::submit`].
    pub async fn post_message(&self, inbound: InboundMessage) -> Result<IntakeReceipt, ParlorError> {
        self.intake.submit(inbound).await
    }

    /// Create a room and invalidate the owner's cached listing.
    pub async fn create_room(&self, user_id: i64, name: &str) -> Result<Chatroom, ParlorError> {
        self.rooms.create_room(user_id, name).await
    }

    /// List a user's rooms through the cache.
    pub async fn list_rooms(&self, user_id: i64) -> Result<Vec<Chatroom>, ParlorError> {
        self.rooms.list_rooms(user_id).await
    }

    /// A room and its messages in arrival order.
    pub async fn room_detail(
        &self,
        user_id: i64,
        chatroom_id: i64,
    ) -> Result<(Chatroom, Vec<ChatMessage>), ParlorError> {
        self.rooms.room_detail(user_id, chatroom_id).await
    }

    /// Apply a subscription event, idempotently by event id.
    pub async fn apply_subscription_event(
        &self,
        event: &SubscriptionEvent,
    ) -> Result<EventApplication, ParlorError> {
        self.subscriptions.handle(event).await
    }

    /// Spawn the reply workers. They run until `cancel` fires.
    pub fn spawn_workers(&self, cancel: &CancellationToken) -> Vec<JoinHandle<()>> {
        self.workers.spawn(cancel)
    }

    /// Drain workers and close storage.
    pub async fn shutdown(
        &self,
        handles: Vec<JoinHandle<()>>,
        timeout: Duration,
    ) -> Result<(), ParlorError> {
        shutdown::drain_workers(handles, timeout).await;
        self.store.close().await?;
        info!("engine stopped");
        Ok(())
    }
}
