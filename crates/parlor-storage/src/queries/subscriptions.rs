// SPDX-FileCopyrightText: 2026 Parlor Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Subscription event ledger. Applied external events are recorded by id so
//! duplicate webhook deliveries do not reapply a transition.

use parlor_core::ParlorError;
use rusqlite::params;

use crate::database::Database;
use crate::models::SubscriptionEvent;

/// Record an external subscription event id.
///
/// Returns `true` if the event is new, `false` if it was already recorded
/// (a webhook replay). `INSERT OR IGNORE` against the primary key makes the
/// check-and-record atomic.
pub async fn record_event(db: &Database, event: &SubscriptionEvent) -> Result<bool, ParlorError> {
    let event_id = event.id.clone();
    let event_type = serde_json::to_value(event.kind)
        .ok()
        .and_then(|v| v.as_str().map(str::to_string))
        .unwrap_or_default();
    let user_id = event.user_id;
    db.connection()
        .call(move |conn| {
            let changed = conn.execute(
                "INSERT OR IGNORE INTO subscription_events (event_id, event_type, user_id)
                 VALUES (?1, ?2, ?3)",
                params![event_id, event_type, user_id],
            )?;
            Ok(changed == 1)
        })
        .await
        .map_err(crate::database::map_tr_err)
}
