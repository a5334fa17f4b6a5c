// SPDX-FileCopyrightText: 2026 Parlor Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Chatroom CRUD operations.

use parlor_core::ParlorError;
use rusqlite::params;

use crate::database::Database;
use crate::models::Chatroom;

/// Create a new chatroom for a user. Returns the stored row.
pub async fn create_room(db: &Database, user_id: i64, name: &str) -> Result<Chatroom, ParlorError> {
    let name = name.to_string();
    db.connection()
        .call(move |conn| {
            let room = conn.query_row(
                "INSERT INTO chatrooms (user_id, name) VALUES (?1, ?2)
                 RETURNING id, user_id, name, created_at",
                params![user_id, name],
                |row| {
                    Ok(Chatroom {
                        id: row.get(0)?,
                        user_id: row.get(1)?,
                        name: row.get(2)?,
                        created_at: row.get(3)?,
                    })
                },
            )?;
            Ok(room)
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Get a chatroom by id.
pub async fn get_room(db: &Database, id: i64) -> Result<Option<Chatroom>, ParlorError> {
    db.connection()
        .call(move |conn| {
            let result = conn.query_row(
                "SELECT id, user_id, name, created_at FROM chatrooms WHERE id = ?1",
                params![id],
                |row| {
                    Ok(Chatroom {
                        id: row.get(0)?,
                        user_id: row.get(1)?,
                        name: row.get(2)?,
                        created_at: row.get(3)?,
                    })
                },
            );
            match result {
                Ok(room) => Ok(Some(room)),
                Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
                Err(e) => Err(e.into()),
            }
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// List a user's chatrooms, newest first.
pub async fn list_rooms_for_user(
    db: &Database,
    user_id: i64,
) -> Result<Vec<Chatroom>, ParlorError> {
    db.connection()
        .call(move |conn| {
            let mut stmt = conn.prepare(
                "SELECT id, user_id, name, created_at FROM chatrooms
                 WHERE user_id = ?1 ORDER BY created_at DESC, id DESC",
            )?;
            let rows = stmt.query_map(params![user_id], |row| {
                Ok(Chatroom {
                    id: row.get(0)?,
                    user_id: row.get(1)?,
                    name: row.get(2)?,
                    created_at: row.get(3)?,
                })
            })?;
            let mut rooms = Vec::new();
            for row in rows {
                rooms.push(row?);
            }
            Ok(rooms)
        })
        .await
        .map_err(crate::database::map_tr_err)
}
