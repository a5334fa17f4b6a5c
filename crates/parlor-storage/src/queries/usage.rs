// SPDX-FileCopyrightText: 2026 Parlor Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Daily usage counters backing admission decisions.
//!
//! The increment-and-check is one guarded upsert so two concurrent requests
//! can never both squeeze past the limit. A read followed by a separate
//! write would race; that shape is deliberately not offered here.

use parlor_core::ParlorError;
use rusqlite::params;

use crate::database::Database;

/// Atomically increment-or-create the counter for `(user_id, date)` if it is
/// below `limit`. Returns whether the increment happened.
///
/// The insert arm covers the first message of the day (count becomes 1); the
/// update arm is guarded by `prompt_count < limit`, so an at-limit row is
/// left untouched and the statement reports zero changed rows.
pub async fn try_increment(
    db: &Database,
    user_id: i64,
    date: &str,
    limit: i64,
) -> Result<bool, ParlorError> {
    if limit < 1 {
        return Ok(false);
    }
    let date = date.to_string();
    db.connection()
        .call(move |conn| {
            let changed = conn.execute(
                "INSERT INTO daily_usage (user_id, usage_date, prompt_count)
                 VALUES (?1, ?2, 1)
                 ON CONFLICT (user_id, usage_date) DO UPDATE
                 SET prompt_count = prompt_count + 1
                 WHERE prompt_count < ?3",
                params![user_id, date, limit],
            )?;
            Ok(changed == 1)
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Current count for `(user_id, date)`, zero when absent.
pub async fn count(db: &Database, user_id: i64, date: &str) -> Result<i64, ParlorError> {
    let date = date.to_string();
    db.connection()
        .call(move |conn| {
            let result = conn.query_row(
                "SELECT prompt_count FROM daily_usage
                 WHERE user_id = ?1 AND usage_date = ?2",
                params![user_id, date],
                |row| row.get(0),
            );
            match result {
                Ok(n) => Ok(n),
                Err(rusqlite::Error::QueryReturnedNoRows) => Ok(0),
                Err(e) => Err(e.into()),
            }
        })
        .await
        .map_err(crate::database::map_tr_err)
}
