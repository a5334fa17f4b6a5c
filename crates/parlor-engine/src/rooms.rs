// SPDX-FileCopyrightText: 2026 Parlor Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Room service: creation with cache invalidation, cached listings, and
//! room detail.
//!
//! Cache discipline: the store is written first, the cache invalidated
//! after — invalidating before the write is durable would let a concurrent
//! reader re-cache the pre-write state with nothing left to evict it. The
//! remaining interleaving (reader fetches, writer commits and invalidates,
//! reader populates stale) is accepted bounded staleness, capped by the TTL.
//! Cache failures never surface: listing degrades to read-through.

use std::sync::Arc;
use std::time::Duration;

use parlor_core::types::{ChatMessage, Chatroom};
use parlor_core::{CacheStore, ChatStore, ParlorError};
use tracing::{debug, warn};

/// Cache key for a user's room listing.
fn cache_key(user_id: i64) -> String {
    format!("chatrooms:user:{user_id}")
}

/// Room creation and listing with the read-through cache in front.
pub struct RoomService {
    store: Arc<dyn ChatStore>,
    cache: Arc<dyn CacheStore>,
    ttl: Duration,
}

impl RoomService {
    pub fn new(store: Arc<dyn ChatStore>, cache: Arc<dyn CacheStore>, ttl: Duration) -> Self {
        Self { store, cache, ttl }
    }

    /// Create a room, then invalidate the owner's cached listing.
    pub async fn create_room(&self, user_id: i64, name: &str) -> Result<Chatroom, ParlorError> {
        let room = self.store.create_room(user_id, name).await?;

        if let Err(e) = self.cache.invalidate(&cache_key(user_id)).await {
            // The entry still expires with its TTL; the write itself is safe.
            warn!(user_id, error = %e, "cache invalidation failed after room creation");
        }
        Ok(room)
    }

    /// List a user's rooms, newest first, through the cache.
    pub async fn list_rooms(&self, user_id: i64) -> Result<Vec<Chatroom>, ParlorError> {
        let key = cache_key(user_id);

        match self.cache.get(&key).await {
            Ok(Some(raw)) => match serde_json::from_str::<Vec<Chatroom>>(&raw) {
                Ok(rooms) => return Ok(rooms),
                Err(e) => {
                    debug!(user_id, error = %e, "undecodable cache entry, reading through");
                }
            },
            Ok(None) => {}
            Err(e) => {
                warn!(user_id, error = %e, "cache unreachable, reading through");
            }
        }

        let rooms = self.store.list_rooms(user_id).await?;

        match serde_json::to_string(&rooms) {
            Ok(raw) => {
                if let Err(e) = self.cache.set(&key, &raw, self.ttl).await {
                    debug!(user_id, error = %e, "cache populate failed");
                }
            }
            Err(e) => {
                debug!(user_id, error = %e, "room listing not cacheable");
            }
        }
        Ok(rooms)
    }

    /// A room owned by `user_id` plus its messages in arrival order.
    pub async fn room_detail(
        &self,
        user_id: i64,
        chatroom_id: i64,
    ) -> Result<(Chatroom, Vec<ChatMessage>), ParlorError> {
        let room = self
            .store
            .get_room(chatroom_id)
            .await?
            .filter(|room| room.user_id == user_id)
            .ok_or(ParlorError::RoomAccess {
                chatroom_id,
                user_id,
            })?;
        let messages = self.store.messages_for_room(room.id, None).await?;
        Ok((room, messages))
    }
}
