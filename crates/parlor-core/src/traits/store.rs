// SPDX-FileCopyrightText: 2026 Parlor Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Chat store trait: the authoritative record of users, rooms, and messages.

use async_trait::async_trait;

use crate::error::ParlorError;
use crate::traits::adapter::PluginAdapter;
use crate::types::{ChatMessage, Chatroom, SubscriptionEvent, Tier, User};

/// Durable storage of users, chat rooms, and messages.
///
/// The store is the single source of truth; the room-listing cache is always
/// a derivable, disposable view over `list_rooms`.
#[async_trait]
pub trait ChatStore: PluginAdapter {
    /// Initializes the storage backend (migrations, connection, etc.).
    async fn initialize(&self) -> Result<(), ParlorError>;

    /// Closes the storage backend, flushing pending writes.
    async fn close(&self) -> Result<(), ParlorError>;

    // --- User operations ---

    async fn create_user(&self, phone: &str, tier: Tier) -> Result<User, ParlorError>;

    async fn get_user(&self, id: i64) -> Result<Option<User>, ParlorError>;

    /// Sets the user's subscription tier. Set-to semantics: applying the same
    /// transition twice is a no-op.
    async fn set_tier(&self, user_id: i64, tier: Tier) -> Result<(), ParlorError>;

    /// Records an external subscription event id. Returns `false` when the
    /// event was already recorded (webhook replay).
    async fn record_subscription_event(
        &self,
        event: &SubscriptionEvent,
    ) -> Result<bool, ParlorError>;

    // --- Room operations ---

    async fn create_room(&self, user_id: i64, name: &str) -> Result<Chatroom, ParlorError>;

    async fn get_room(&self, id: i64) -> Result<Option<Chatroom>, ParlorError>;

    /// Lists the user's rooms, newest first.
    async fn list_rooms(&self, user_id: i64) -> Result<Vec<Chatroom>, ParlorError>;

    // --- Message operations ---

    async fn insert_user_message(
        &self,
        chatroom_id: i64,
        content: &str,
    ) -> Result<ChatMessage, ParlorError>;

    /// Inserts an AI reply keyed by `reply_to` (the triggering user message).
    /// Returns `false` when a reply for that key already exists — the
    /// duplicate-delivery case, absorbed rather than errored.
    async fn insert_ai_reply(
        &self,
        chatroom_id: i64,
        content: &str,
        reply_to: i64,
    ) -> Result<bool, ParlorError>;

    /// Messages of a room in arrival order.
    async fn messages_for_room(
        &self,
        chatroom_id: i64,
        limit: Option<i64>,
    ) -> Result<Vec<ChatMessage>, ParlorError>;
}
