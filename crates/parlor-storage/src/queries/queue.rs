// SPDX-FileCopyrightText: 2026 Parlor Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Durable reply-job queue with at-least-once delivery.
//!
//! A claimed entry stays `processing` until acked or nacked; if its worker
//! dies, the claim expires at `locked_until` and the entry becomes claimable
//! again. Nacking below the attempt cap requeues with a delay; at the cap
//! the entry moves to `dead` for out-of-band reconciliation.

use std::time::Duration;

use parlor_core::ParlorError;
use parlor_core::types::NackOutcome;
use rusqlite::params;

use crate::database::Database;
use crate::models::QueueEntry;

const NOW: &str = "strftime('%Y-%m-%dT%H:%M:%fZ', 'now')";

/// SQLite datetime modifier for "now + duration", millisecond precision.
fn delay_modifier(delay: Duration) -> String {
    format!("+{:.3} seconds", delay.as_secs_f64())
}

fn row_to_entry(row: &rusqlite::Row<'_>) -> Result<QueueEntry, rusqlite::Error> {
    Ok(QueueEntry {
        id: row.get(0)?,
        queue_name: row.get(1)?,
        payload: row.get(2)?,
        status: row.get(3)?,
        attempts: row.get(4)?,
        max_attempts: row.get(5)?,
        created_at: row.get(6)?,
        updated_at: row.get(7)?,
        locked_until: row.get(8)?,
    })
}

/// Enqueue a new job. Returns the auto-generated queue entry ID.
pub async fn enqueue(
    db: &Database,
    queue_name: &str,
    payload: &str,
    max_attempts: i32,
) -> Result<i64, ParlorError> {
    let queue_name = queue_name.to_string();
    let payload = payload.to_string();
    db.connection()
        .call(move |conn| {
            conn.execute(
                "INSERT INTO queue (queue_name, payload, max_attempts) VALUES (?1, ?2, ?3)",
                params![queue_name, payload, max_attempts],
            )?;
            Ok(conn.last_insert_rowid())
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Claim the next eligible entry from the named queue.
///
/// Atomically selects the oldest claimable entry and marks it `processing`
/// with `locked_until = now + visibility`. Eligible entries are pending rows
/// whose retry delay (if any) has elapsed, plus processing rows whose claim
/// expired — the redelivery path after a worker crash. Returns `None` when
/// nothing is claimable.
pub async fn dequeue(
    db: &Database,
    queue_name: &str,
    visibility: Duration,
) -> Result<Option<QueueEntry>, ParlorError> {
    let queue_name = queue_name.to_string();
    let visibility = delay_modifier(visibility);
    db.connection()
        .call(move |conn| {
            // Use a transaction to atomically find + claim the next entry.
            let tx = conn.transaction()?;

            let result = {
                let mut stmt = tx.prepare(&format!(
                    "SELECT id, queue_name, payload, status, attempts, max_attempts,
                            created_at, updated_at, locked_until
                     FROM queue
                     WHERE queue_name = ?1
                       AND ((status = 'pending'
                             AND (locked_until IS NULL OR locked_until <= {NOW}))
                            OR (status = 'processing' AND locked_until <= {NOW}))
                     ORDER BY id ASC
                     LIMIT 1"
                ))?;
                stmt.query_row(params![queue_name], row_to_entry)
            };

            match result {
                Ok(entry) => {
                    tx.execute(
                        &format!(
                            "UPDATE queue SET status = 'processing',
                             locked_until = strftime('%Y-%m-%dT%H:%M:%fZ', 'now', ?2),
                             updated_at = {NOW}
                             WHERE id = ?1"
                        ),
                        params![entry.id, visibility],
                    )?;
                    tx.commit()?;

                    // Return the entry with updated status.
                    Ok(Some(QueueEntry {
                        status: "processing".to_string(),
                        ..entry
                    }))
                }
                Err(rusqlite::Error::QueryReturnedNoRows) => {
                    tx.commit()?;
                    Ok(None)
                }
                Err(e) => Err(e.into()),
            }
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Acknowledge successful processing of a queue entry.
///
/// Marks the entry as "completed".
pub async fn ack(db: &Database, id: i64) -> Result<(), ParlorError> {
    db.connection()
        .call(move |conn| {
            conn.execute(
                &format!(
                    "UPDATE queue SET status = 'completed', locked_until = NULL,
                     updated_at = {NOW}
                     WHERE id = ?1"
                ),
                params![id],
            )?;
            Ok(())
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Report a transient failure for a claimed entry.
///
/// Increments attempts. Below `max_attempts` the entry goes back to
/// `pending` and becomes claimable once `retry_after` elapses; at the cap it
/// moves to `dead` and stays there for out-of-band reconciliation.
pub async fn nack(
    db: &Database,
    id: i64,
    retry_after: Duration,
) -> Result<NackOutcome, ParlorError> {
    let retry_after = delay_modifier(retry_after);
    db.connection()
        .call(move |conn| {
            let (attempts, max_attempts): (i32, i32) = conn.query_row(
                "SELECT attempts, max_attempts FROM queue WHERE id = ?1",
                params![id],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )?;

            let new_attempts = attempts + 1;
            if new_attempts >= max_attempts {
                conn.execute(
                    &format!(
                        "UPDATE queue SET status = 'dead', attempts = ?1,
                         locked_until = NULL, updated_at = {NOW}
                         WHERE id = ?2"
                    ),
                    params![new_attempts, id],
                )?;
                Ok(NackOutcome::DeadLettered)
            } else {
                conn.execute(
                    &format!(
                        "UPDATE queue SET status = 'pending', attempts = ?1,
                         locked_until = strftime('%Y-%m-%dT%H:%M:%fZ', 'now', ?3),
                         updated_at = {NOW}
                         WHERE id = ?2"
                    ),
                    params![new_attempts, id, retry_after],
                )?;
                Ok(NackOutcome::Requeued {
                    attempt: new_attempts,
                })
            }
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Fetch a queue entry by id.
pub async fn entry(db: &Database, id: i64) -> Result<Option<QueueEntry>, ParlorError> {
    db.connection()
        .call(move |conn| {
            let result = conn.query_row(
                "SELECT id, queue_name, payload, status, attempts, max_attempts,
                        created_at, updated_at, locked_until
                 FROM queue WHERE id = ?1",
                params![id],
                row_to_entry,
            );
            match result {
                Ok(entry) => Ok(Some(entry)),
                Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
                Err(e) => Err(e.into()),
            }
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// All dead-lettered entries of a queue, oldest first. Input for an
/// out-of-band reconciliation sweep.
pub async fn dead_letters(db: &Database, queue_name: &str) -> Result<Vec<QueueEntry>, ParlorError> {
    let queue_name = queue_name.to_string();
    db.connection()
        .call(move |conn| {
            let mut stmt = conn.prepare(
                "SELECT id, queue_name, payload, status, attempts, max_attempts,
                        created_at, updated_at, locked_until
                 FROM queue WHERE queue_name = ?1 AND status = 'dead'
                 ORDER BY id ASC",
            )?;
            let rows = stmt.query_map(params![queue_name], row_to_entry)?;
            let mut entries = Vec::new();
            for row in rows {
                entries.push(row?);
            }
            Ok(entries)
        })
        .await
        .map_err(crate::database::map_tr_err)
}
