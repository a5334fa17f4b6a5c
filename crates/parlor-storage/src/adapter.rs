// SPDX-FileCopyrightText: 2026 Parlor Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! SQLite implementation of the ChatStore, CounterStore, and QueueClient traits.

use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::OnceCell;
use tracing::debug;

use parlor_config::model::StorageConfig;
use parlor_core::types::{
    ChatMessage, Chatroom, NackOutcome, QueueEntry, SubscriptionEvent, Tier, User,
};
use parlor_core::{
    AdapterType, ChatStore, CounterStore, HealthStatus, ParlorError, PluginAdapter, QueueClient,
};

use crate::database::Database;
use crate::queries;

/// SQLite-backed storage adapter.
///
/// One `SqliteStorage` serves three seams — chat store, usage counter, and
/// job queue — all backed by the same WAL-mode database with writes
/// serialized on tokio-rusqlite's single background thread. The database is
/// lazily initialized on the first call to [`ChatStore::initialize`].
pub struct SqliteStorage {
    config: StorageConfig,
    db: OnceCell<Database>,
}

impl SqliteStorage {
    /// Create a new SqliteStorage with the given configuration.
    ///
    /// The database connection is not opened until [`ChatStore::initialize`]
    /// is called.
    pub fn new(config: StorageConfig) -> Self {
        Self {
            config,
            db: OnceCell::new(),
        }
    }

    /// Returns a reference to the underlying Database, or an error if not initialized.
    fn db(&self) -> Result<&Database, ParlorError> {
        self.db.get().ok_or_else(|| ParlorError::Storage {
            source: "storage not initialized -- call initialize() first".into(),
        })
    }

    /// Fetch a queue entry by id. Observability helper for tests and
    /// reconciliation tooling; not part of the QueueClient seam.
    pub async fn queue_entry(&self, id: i64) -> Result<Option<QueueEntry>, ParlorError> {
        queries::queue::entry(self.db()?, id).await
    }

    /// Dead-lettered entries of a queue, oldest first.
    pub async fn dead_letters(&self, queue_name: &str) -> Result<Vec<QueueEntry>, ParlorError> {
        queries::queue::dead_letters(self.db()?, queue_name).await
    }

    /// The AI reply for a user message, if one landed yet.
    pub async fn find_reply(&self, reply_to: i64) -> Result<Option<ChatMessage>, ParlorError> {
        queries::messages::find_reply(self.db()?, reply_to).await
    }
}

#[async_trait]
impl PluginAdapter for SqliteStorage {
    fn name(&self) -> &str {
        "sqlite"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Storage
    }

    async fn health_check(&self) -> Result<HealthStatus, ParlorError> {
        let db = self.db()?;
        db.connection()
            .call(|conn| {
                conn.execute_batch("SELECT 1;")?;
                Ok(())
            })
            .await
            .map_err(crate::database::map_tr_err)?;
        Ok(HealthStatus::Healthy)
    }

    async fn shutdown(&self) -> Result<(), ParlorError> {
        // Shutdown delegates to close if the DB was initialized.
        if let Some(db) = self.db.get() {
            db.close().await?;
            debug!("shutdown: WAL checkpoint complete");
        }
        Ok(())
    }
}

#[async_trait]
impl ChatStore for SqliteStorage {
    async fn initialize(&self) -> Result<(), ParlorError> {
        let db = Database::open(&self.config.database_path).await?;
        if !self.config.wal_mode {
            db.connection()
                .call(|conn| {
                    conn.execute_batch("PRAGMA journal_mode = DELETE;")?;
                    Ok(())
                })
                .await
                .map_err(crate::database::map_tr_err)?;
        }
        self.db.set(db).map_err(|_| ParlorError::Storage {
            source: "storage already initialized".into(),
        })?;
        debug!(path = %self.config.database_path, "SQLite storage initialized");
        Ok(())
    }

    async fn close(&self) -> Result<(), ParlorError> {
        self.db()?.close().await
    }

    // --- User operations ---

    async fn create_user(&self, phone: &str, tier: Tier) -> Result<User, ParlorError> {
        queries::users::create_user(self.db()?, phone, tier).await
    }

    async fn get_user(&self, id: i64) -> Result<Option<User>, ParlorError> {
        queries::users::get_user(self.db()?, id).await
    }

    async fn set_tier(&self, user_id: i64, tier: Tier) -> Result<(), ParlorError> {
        queries::users::set_tier(self.db()?, user_id, tier).await
    }

    async fn record_subscription_event(
        &self,
        event: &SubscriptionEvent,
    ) -> Result<bool, ParlorError> {
        queries::subscriptions::record_event(self.db()?, event).await
    }

    // --- Room operations ---

    async fn create_room(&self, user_id: i64, name: &str) -> Result<Chatroom, ParlorError> {
        queries::rooms::create_room(self.db()?, user_id, name).await
    }

    async fn get_room(&self, id: i64) -> Result<Option<Chatroom>, ParlorError> {
        queries::rooms::get_room(self.db()?, id).await
    }

    async fn list_rooms(&self, user_id: i64) -> Result<Vec<Chatroom>, ParlorError> {
        queries::rooms::list_rooms_for_user(self.db()?, user_id).await
    }

    // --- Message operations ---

    async fn insert_user_message(
        &self,
        chatroom_id: i64,
        content: &str,
    ) -> Result<ChatMessage, ParlorError> {
        queries::messages::insert_user_message(self.db()?, chatroom_id, content).await
    }

    async fn insert_ai_reply(
        &self,
        chatroom_id: i64,
        content: &str,
        reply_to: i64,
    ) -> Result<bool, ParlorError> {
        queries::messages::insert_ai_reply(self.db()?, chatroom_id, content, reply_to).await
    }

    async fn messages_for_room(
        &self,
        chatroom_id: i64,
        limit: Option<i64>,
    ) -> Result<Vec<ChatMessage>, ParlorError> {
        queries::messages::messages_for_room(self.db()?, chatroom_id, limit).await
    }
}

#[async_trait]
impl CounterStore for SqliteStorage {
    async fn try_increment(
        &self,
        user_id: i64,
        date: &str,
        limit: i64,
    ) -> Result<bool, ParlorError> {
        queries::usage::try_increment(self.db()?, user_id, date, limit).await
    }

    async fn count(&self, user_id: i64, date: &str) -> Result<i64, ParlorError> {
        queries::usage::count(self.db()?, user_id, date).await
    }
}

#[async_trait]
impl QueueClient for SqliteStorage {
    async fn enqueue(
        &self,
        queue_name: &str,
        payload: &str,
        max_attempts: i32,
    ) -> Result<i64, ParlorError> {
        queries::queue::enqueue(self.db()?, queue_name, payload, max_attempts).await
    }

    async fn dequeue(
        &self,
        queue_name: &str,
        visibility: Duration,
    ) -> Result<Option<QueueEntry>, ParlorError> {
        queries::queue::dequeue(self.db()?, queue_name, visibility).await
    }

    async fn ack(&self, id: i64) -> Result<(), ParlorError> {
        queries::queue::ack(self.db()?, id).await
    }

    async fn nack(&self, id: i64, retry_after: Duration) -> Result<NackOutcome, ParlorError> {
        queries::queue::nack(self.db()?, id, retry_after).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn make_config(path: &str) -> StorageConfig {
        StorageConfig {
            database_path: path.to_string(),
            wal_mode: true,
        }
    }

    #[tokio::test]
    async fn sqlite_storage_implements_plugin_adapter() {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("test.db");
        let storage = SqliteStorage::new(make_config(db_path.to_str().unwrap()));

        assert_eq!(storage.name(), "sqlite");
        assert_eq!(storage.version(), semver::Version::new(0, 1, 0));
        assert_eq!(storage.adapter_type(), AdapterType::Storage);
    }

    #[tokio::test]
    async fn initialize_opens_database_at_configured_path() {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("init_test.db");
        let storage = SqliteStorage::new(make_config(db_path.to_str().unwrap()));

        storage.initialize().await.unwrap();
        assert!(db_path.exists(), "database file should be created");
    }

    #[tokio::test]
    async fn initialize_twice_returns_error() {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("double_init.db");
        let storage = SqliteStorage::new(make_config(db_path.to_str().unwrap()));

        storage.initialize().await.unwrap();
        let result = storage.initialize().await;
        assert!(result.is_err(), "second initialize should fail");
    }

    #[tokio::test]
    async fn health_check_returns_healthy_when_initialized() {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("health.db");
        let storage = SqliteStorage::new(make_config(db_path.to_str().unwrap()));

        storage.initialize().await.unwrap();
        let status = storage.health_check().await.unwrap();
        assert_eq!(status, HealthStatus::Healthy);
    }

    #[tokio::test]
    async fn health_check_fails_when_not_initialized() {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("no_init.db");
        let storage = SqliteStorage::new(make_config(db_path.to_str().unwrap()));

        let result = storage.health_check().await;
        assert!(result.is_err(), "health_check should fail before initialize");
    }

    #[tokio::test]
    async fn full_chat_lifecycle_through_adapter() {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("lifecycle.db");
        let storage = SqliteStorage::new(make_config(db_path.to_str().unwrap()));
        storage.initialize().await.unwrap();

        let user = storage.create_user("+15550001111", Tier::Basic).await.unwrap();
        let room = storage.create_room(user.id, "general").await.unwrap();

        let retrieved = storage.get_room(room.id).await.unwrap().unwrap();
        assert_eq!(retrieved.name, "general");
        assert_eq!(retrieved.user_id, user.id);

        let msg = storage.insert_user_message(room.id, "hello").await.unwrap();
        let inserted = storage
            .insert_ai_reply(room.id, "hi there", msg.id)
            .await
            .unwrap();
        assert!(inserted);

        let messages = storage.messages_for_room(room.id, None).await.unwrap();
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].role, "user");
        assert_eq!(messages[1].role, "ai");

        let rooms = storage.list_rooms(user.id).await.unwrap();
        assert_eq!(rooms.len(), 1);

        storage.close().await.unwrap();
    }

    #[tokio::test]
    async fn counter_operations_through_adapter() {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("counter_adapter.db");
        let storage = SqliteStorage::new(make_config(db_path.to_str().unwrap()));
        storage.initialize().await.unwrap();

        assert!(storage.try_increment(1, "2026-02-03", 2).await.unwrap());
        assert!(storage.try_increment(1, "2026-02-03", 2).await.unwrap());
        assert!(!storage.try_increment(1, "2026-02-03", 2).await.unwrap());
        assert_eq!(storage.count(1, "2026-02-03").await.unwrap(), 2);

        storage.close().await.unwrap();
    }

    #[tokio::test]
    async fn queue_operations_through_adapter() {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("queue_adapter.db");
        let storage = SqliteStorage::new(make_config(db_path.to_str().unwrap()));
        storage.initialize().await.unwrap();

        let id = storage
            .enqueue("replies", r#"{"prompt":"test"}"#, 5)
            .await
            .unwrap();
        assert!(id > 0);

        let claimed = storage
            .dequeue("replies", Duration::from_secs(30))
            .await
            .unwrap();
        assert!(claimed.is_some());
        let claimed = claimed.unwrap();
        assert_eq!(claimed.status, "processing");

        storage.ack(claimed.id).await.unwrap();
        let stored = storage.queue_entry(claimed.id).await.unwrap().unwrap();
        assert_eq!(stored.status, "completed");

        storage.close().await.unwrap();
    }

    #[tokio::test]
    async fn shutdown_runs_checkpoint() {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("shutdown.db");
        let storage = SqliteStorage::new(make_config(db_path.to_str().unwrap()));
        storage.initialize().await.unwrap();

        storage.create_user("+15550003333", Tier::Pro).await.unwrap();

        storage.shutdown().await.unwrap();
    }
}
