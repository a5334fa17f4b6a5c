// SPDX-FileCopyrightText: 2026 Parlor Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Message operations. Messages are append-only; AI replies are keyed by the
//! triggering user message so redelivered jobs collapse into one reply.

use parlor_core::ParlorError;
use rusqlite::params;

use crate::database::Database;
use crate::models::ChatMessage;

fn row_to_message(row: &rusqlite::Row<'_>) -> Result<ChatMessage, rusqlite::Error> {
    Ok(ChatMessage {
        id: row.get(0)?,
        chatroom_id: row.get(1)?,
        role: row.get(2)?,
        content: row.get(3)?,
        reply_to: row.get(4)?,
        created_at: row.get(5)?,
    })
}

/// Insert a user-authored message. Returns the stored row.
pub async fn insert_user_message(
    db: &Database,
    chatroom_id: i64,
    content: &str,
) -> Result<ChatMessage, ParlorError> {
    let content = content.to_string();
    db.connection()
        .call(move |conn| {
            let msg = conn.query_row(
                "INSERT INTO messages (chatroom_id, role, content) VALUES (?1, 'user', ?2)
                 RETURNING id, chatroom_id, role, content, reply_to, created_at",
                params![chatroom_id, content],
                row_to_message,
            )?;
            Ok(msg)
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Insert an AI-authored reply keyed by `reply_to`.
///
/// `INSERT OR IGNORE` against the partial unique index on `reply_to` makes
/// this safe to repeat: a second delivery of the same job inserts nothing.
/// Returns whether a row was inserted.
pub async fn insert_ai_reply(
    db: &Database,
    chatroom_id: i64,
    content: &str,
    reply_to: i64,
) -> Result<bool, ParlorError> {
    let content = content.to_string();
    db.connection()
        .call(move |conn| {
            let changed = conn.execute(
                "INSERT OR IGNORE INTO messages (chatroom_id, role, content, reply_to)
                 VALUES (?1, 'ai', ?2, ?3)",
                params![chatroom_id, content, reply_to],
            )?;
            Ok(changed == 1)
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Messages of a chatroom in arrival order.
pub async fn messages_for_room(
    db: &Database,
    chatroom_id: i64,
    limit: Option<i64>,
) -> Result<Vec<ChatMessage>, ParlorError> {
    db.connection()
        .call(move |conn| {
            let mut messages = Vec::new();
            match limit {
                Some(lim) => {
                    let mut stmt = conn.prepare(
                        "SELECT id, chatroom_id, role, content, reply_to, created_at
                         FROM messages WHERE chatroom_id = ?1
                         ORDER BY id ASC LIMIT ?2",
                    )?;
                    let rows = stmt.query_map(params![chatroom_id, lim], row_to_message)?;
                    for row in rows {
                        messages.push(row?);
                    }
                }
                None => {
                    let mut stmt = conn.prepare(
                        "SELECT id, chatroom_id, role, content, reply_to, created_at
                         FROM messages WHERE chatroom_id = ?1
                         ORDER BY id ASC",
                    )?;
                    let rows = stmt.query_map(params![chatroom_id], row_to_message)?;
                    for row in rows {
                        messages.push(row?);
                    }
                }
            }
            Ok(messages)
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Find the AI reply for a given user message, if one landed yet.
pub async fn find_reply(db: &Database, reply_to: i64) -> Result<Option<ChatMessage>, ParlorError> {
    db.connection()
        .call(move |conn| {
            let result = conn.query_row(
                "SELECT id, chatroom_id, role, content, reply_to, created_at
                 FROM messages WHERE reply_to = ?1",
                params![reply_to],
                row_to_message,
            );
            match result {
                Ok(msg) => Ok(Some(msg)),
                Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
                Err(e) => Err(e.into()),
            }
        })
        .await
        .map_err(crate::database::map_tr_err)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::queries::rooms::create_room;
    use crate::queries::users::create_user;
    use parlor_core::types::Tier;
    use tempfile::tempdir;

    async fn setup_db_with_room() -> (Database, i64, tempfile::TempDir) {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("test.db");
        let db = Database::open(db_path.to_str().unwrap()).await.unwrap();
        let user = create_user(&db, "+15550001111", Tier::Basic).await.unwrap();
        let room = create_room(&db, user.id, "general").await.unwrap();
        (db, room.id, dir)
    }

    #[tokio::test]
    async fn insert_user_message_returns_stored_row() {
        let (db, room_id, _dir) = setup_db_with_room().await;

        let msg = insert_user_message(&db, room_id, "hello").await.unwrap();
        assert!(msg.id > 0);
        assert_eq!(msg.chatroom_id, room_id);
        assert_eq!(msg.role, "user");
        assert_eq!(msg.content, "hello");
        assert!(msg.reply_to.is_none());

        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn ai_reply_is_inserted_once_per_user_message() {
        let (db, room_id, _dir) = setup_db_with_room().await;

        let user_msg = insert_user_message(&db, room_id, "hi").await.unwrap();

        let first = insert_ai_reply(&db, room_id, "hello there", user_msg.id)
            .await
            .unwrap();
        assert!(first, "first reply should insert");

        // Simulated redelivery: same idempotency key, nothing inserted.
        let second = insert_ai_reply(&db, room_id, "hello again", user_msg.id)
            .await
            .unwrap();
        assert!(!second, "duplicate reply should be absorbed");

        let messages = messages_for_room(&db, room_id, None).await.unwrap();
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[1].role, "ai");
        assert_eq!(messages[1].content, "hello there");
        assert_eq!(messages[1].reply_to, Some(user_msg.id));

        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn messages_come_back_in_arrival_order() {
        let (db, room_id, _dir) = setup_db_with_room().await;

        let m1 = insert_user_message(&db, room_id, "one").await.unwrap();
        insert_ai_reply(&db, room_id, "reply one", m1.id).await.unwrap();
        insert_user_message(&db, room_id, "two").await.unwrap();

        let messages = messages_for_room(&db, room_id, None).await.unwrap();
        assert_eq!(messages.len(), 3);
        assert_eq!(messages[0].content, "one");
        assert_eq!(messages[1].content, "reply one");
        assert_eq!(messages[2].content, "two");

        let limited = messages_for_room(&db, room_id, Some(2)).await.unwrap();
        assert_eq!(limited.len(), 2);

        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn find_reply_locates_the_ai_message() {
        let (db, room_id, _dir) = setup_db_with_room().await;

        let user_msg = insert_user_message(&db, room_id, "hi").await.unwrap();
        assert!(find_reply(&db, user_msg.id).await.unwrap().is_none());

        insert_ai_reply(&db, room_id, "hey", user_msg.id).await.unwrap();
        let reply = find_reply(&db, user_msg.id).await.unwrap().unwrap();
        assert_eq!(reply.content, "hey");
        assert_eq!(reply.role, "ai");

        db.close().await.unwrap();
    }
}
