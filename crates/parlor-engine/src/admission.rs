// SPDX-FileCopyrightText: 2026 Parlor Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Admission control: the decision to accept or reject a message based on
//! the user's tier and daily quota.

use std::sync::Arc;

use parlor_core::types::{AdmissionDecision, DenialReason, Tier};
use parlor_core::CounterStore;
use tracing::{debug, warn};

/// Decides whether a message may enter the pipeline.
///
/// Pro users bypass the counter entirely. Basic users go through one atomic
/// increment-if-below-limit against the counter store; a denial never
/// increments. If the counter store is unreachable the decision fails
/// closed: denying one request is recoverable, unmetered usage is not.
pub struct AdmissionController {
    counter: Arc<dyn CounterStore>,
    daily_limit: i64,
}

impl AdmissionController {
    pub fn new(counter: Arc<dyn CounterStore>, daily_limit: u32) -> Self {
        Self {
            counter,
            daily_limit: i64::from(daily_limit),
        }
    }

    /// Admit or deny a message from `user_id` at `tier` on `date`
    /// (`YYYY-MM-DD`).
    pub async fn admit(&self, user_id: i64, tier: Tier, date: &str) -> AdmissionDecision {
        if tier == Tier::Pro {
            return AdmissionDecision::Allowed;
        }

        match self
            .counter
            .try_increment(user_id, date, self.daily_limit)
            .await
        {
            Ok(true) => AdmissionDecision::Allowed,
            Ok(false) => {
                debug!(user_id, date, limit = self.daily_limit, "daily quota exhausted");
                AdmissionDecision::Denied(DenialReason::QuotaExceeded)
            }
            Err(e) => {
                warn!(user_id, error = %e, "counter store unreachable, failing closed");
                AdmissionDecision::Denied(DenialReason::Unavailable)
            }
        }
    }
}
