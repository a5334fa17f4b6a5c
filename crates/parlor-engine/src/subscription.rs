// SPDX-FileCopyrightText: 2026 Parlor Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Subscription tier transitions driven by external payment events.
//!
//! The transition itself is a pure set-to function; idempotency across
//! webhook replays comes from recording each event id before applying it.

use std::str::FromStr;
use std::sync::Arc;

use parlor_core::types::{SubscriptionEvent, SubscriptionEventKind, Tier};
use parlor_core::{ChatStore, ParlorError};
use tracing::{debug, info};

/// Compute the tier after an event. Set-to semantics: the current tier does
/// not influence the result, which is what makes double application
/// harmless even before the event ledger rejects it.
pub fn apply_event(_current: Tier, event: &SubscriptionEvent) -> Tier {
    match event.kind {
        SubscriptionEventKind::PaymentCompleted => Tier::Pro,
        SubscriptionEventKind::SubscriptionCancelled => Tier::Basic,
    }
}

/// Outcome of handling one external event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventApplication {
    /// The transition was applied; the user now has this tier.
    Applied { tier: Tier },
    /// The event id was seen before; nothing was changed.
    Duplicate,
}

/// Applies subscription events to user records, exactly once per event id.
pub struct SubscriptionProcessor {
    store: Arc<dyn ChatStore>,
}

impl SubscriptionProcessor {
    pub fn new(store: Arc<dyn ChatStore>) -> Self {
        Self { store }
    }

    /// Handle one event from the payment feed.
    ///
    /// The event id is recorded first; a replay short-circuits before any
    /// tier read or write.
    pub async fn handle(&self, event: &SubscriptionEvent) -> Result<EventApplication, ParlorError> {
        if !self.store.record_subscription_event(event).await? {
            debug!(event_id = %event.id, "replayed subscription event absorbed");
            return Ok(EventApplication::Duplicate);
        }

        let user = self
            .store
            .get_user(event.user_id)
            .await?
            .ok_or_else(|| {
                ParlorError::Internal(format!(
                    "subscription event {} references unknown user {}",
                    event.id, event.user_id
                ))
            })?;
        let current = Tier::from_str(&user.tier)
            .map_err(|_| ParlorError::Internal(format!("unknown stored tier `{}`", user.tier)))?;

        let next = apply_event(current, event);
        self.store.set_tier(event.user_id, next).await?;

        info!(
            user_id = event.user_id,
            event_id = %event.id,
            tier = %next,
            "subscription tier updated"
        );
        Ok(EventApplication::Applied { tier: next })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn event(id: &str, kind: SubscriptionEventKind) -> SubscriptionEvent {
        SubscriptionEvent {
            id: id.to_string(),
            kind,
            user_id: 1,
            subscription_id: "sub_1".to_string(),
        }
    }

    #[test]
    fn payment_completed_promotes_to_pro() {
        let e = event("evt_1", SubscriptionEventKind::PaymentCompleted);
        assert_eq!(apply_event(Tier::Basic, &e), Tier::Pro);
        // Set-to: applying again from pro is a no-op transition.
        assert_eq!(apply_event(Tier::Pro, &e), Tier::Pro);
    }

    #[test]
    fn cancellation_demotes_to_basic() {
        let e = event("evt_2", SubscriptionEventKind::SubscriptionCancelled);
        assert_eq!(apply_event(Tier::Pro, &e), Tier::Basic);
        assert_eq!(apply_event(Tier::Basic, &e), Tier::Basic);
    }
}
