// SPDX-FileCopyrightText: 2026 Parlor Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! User CRUD and tier mutation.

use parlor_core::ParlorError;
use parlor_core::types::Tier;
use rusqlite::params;

use crate::database::Database;
use crate::models::User;

/// Create a new user. Returns the stored row.
pub async fn create_user(db: &Database, phone: &str, tier: Tier) -> Result<User, ParlorError> {
    let phone = phone.to_string();
    let tier = tier.to_string();
    db.connection()
        .call(move |conn| {
            let user = conn.query_row(
                "INSERT INTO users (phone, tier) VALUES (?1, ?2)
                 RETURNING id, phone, tier, created_at",
                params![phone, tier],
                |row| {
                    Ok(User {
                        id: row.get(0)?,
                        phone: row.get(1)?,
                        tier: row.get(2)?,
                        created_at: row.get(3)?,
                    })
                },
            )?;
            Ok(user)
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Get a user by id.
pub async fn get_user(db: &Database, id: i64) -> Result<Option<User>, ParlorError> {
    db.connection()
        .call(move |conn| {
            let result = conn.query_row(
                "SELECT id, phone, tier, created_at FROM users WHERE id = ?1",
                params![id],
                |row| {
                    Ok(User {
                        id: row.get(0)?,
                        phone: row.get(1)?,
                        tier: row.get(2)?,
                        created_at: row.get(3)?,
                    })
                },
            );
            match result {
                Ok(user) => Ok(Some(user)),
                Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
                Err(e) => Err(e.into()),
            }
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Set a user's subscription tier. Setting the current tier again is a no-op.
pub async fn set_tier(db: &Database, user_id: i64, tier: Tier) -> Result<(), ParlorError> {
    let tier = tier.to_string();
    db.connection()
        .call(move |conn| {
            conn.execute(
                "UPDATE users SET tier = ?1 WHERE id = ?2",
                params![tier, user_id],
            )?;
            Ok(())
        })
        .await
        .map_err(crate::database::map_tr_err)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    async fn setup_db() -> (Database, tempfile::TempDir) {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("test.db");
        let db = Database::open(db_path.to_str().unwrap()).await.unwrap();
        (db, dir)
    }

    #[tokio::test]
    async fn create_and_get_user_roundtrips() {
        let (db, _dir) = setup_db().await;

        let user = create_user(&db, "+15550001111", Tier::Basic).await.unwrap();
        assert!(user.id > 0);
        assert_eq!(user.phone, "+15550001111");
        assert_eq!(user.tier, "basic");
        assert!(!user.created_at.is_empty());

        let fetched = get_user(&db, user.id).await.unwrap().unwrap();
        assert_eq!(fetched.phone, user.phone);

        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn get_nonexistent_user_returns_none() {
        let (db, _dir) = setup_db().await;
        let result = get_user(&db, 9999).await.unwrap();
        assert!(result.is_none());
        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn duplicate_phone_is_rejected() {
        let (db, _dir) = setup_db().await;
        create_user(&db, "+15550001111", Tier::Basic).await.unwrap();
        let result = create_user(&db, "+15550001111", Tier::Pro).await;
        assert!(result.is_err(), "unique phone constraint should fire");
        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn set_tier_updates_and_is_idempotent() {
        let (db, _dir) = setup_db().await;
        let user = create_user(&db, "+15550002222", Tier::Basic).await.unwrap();

        set_tier(&db, user.id, Tier::Pro).await.unwrap();
        let fetched = get_user(&db, user.id).await.unwrap().unwrap();
        assert_eq!(fetched.tier, "pro");

        // Applying the same transition again changes nothing.
        set_tier(&db, user.id, Tier::Pro).await.unwrap();
        let fetched = get_user(&db, user.id).await.unwrap().unwrap();
        assert_eq!(fetched.tier, "pro");

        db.close().await.unwrap();
    }
}
