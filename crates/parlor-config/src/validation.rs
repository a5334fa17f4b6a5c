// SPDX-FileCopyrightText: 2026 Parlor Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Post-deserialization validation for configuration values.
//!
//! Validates semantic constraints that cannot be expressed via serde
//! attributes, such as positive limits and the visibility/completion
//! timeout relationship.

use crate::diagnostic::ConfigError;
use crate::model::ParlorConfig;

const LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];

/// Validate a deserialized configuration for semantic correctness.
///
/// Returns `Ok(())` if all validations pass, or `Err(Vec<ConfigError>)` with
/// all collected validation errors (does not fail fast).
pub fn validate_config(config: &ParlorConfig) -> Result<(), Vec<ConfigError>> {
    let mut errors = Vec::new();

    if !LOG_LEVELS.contains(&config.service.log_level.as_str()) {
        errors.push(ConfigError::Validation {
            message: format!(
                "service.log_level must be one of {}, got `{}`",
                LOG_LEVELS.join(", "),
                config.service.log_level
            ),
        });
    }

    if config.quota.daily_limit == 0 {
        errors.push(ConfigError::Validation {
            message: "quota.daily_limit must be at least 1".to_string(),
        });
    }

    if config.queue.max_attempts == 0 {
        errors.push(ConfigError::Validation {
            message: "queue.max_attempts must be at least 1".to_string(),
        });
    }

    // A claimed job must stay hidden for longer than the worst-case
    // completion call, or it gets redelivered while legitimately in flight.
    if config.queue.visibility_timeout_secs <= config.worker.completion_timeout_secs {
        errors.push(ConfigError::Validation {
            message: format!(
                "queue.visibility_timeout_secs ({}) must exceed worker.completion_timeout_secs ({})",
                config.queue.visibility_timeout_secs, config.worker.completion_timeout_secs
            ),
        });
    }

    if config.queue.backoff_cap_ms < config.queue.backoff_base_ms {
        errors.push(ConfigError::Validation {
            message: format!(
                "queue.backoff_cap_ms ({}) must be at least queue.backoff_base_ms ({})",
                config.queue.backoff_cap_ms, config.queue.backoff_base_ms
            ),
        });
    }

    if config.worker.concurrency == 0 {
        errors.push(ConfigError::Validation {
            message: "worker.concurrency must be at least 1".to_string(),
        });
    }

    if config.gemini.model.trim().is_empty() {
        errors.push(ConfigError::Validation {
            message: "gemini.model must not be empty".to_string(),
        });
    }

    if config.storage.database_path.trim().is_empty() {
        errors.push(ConfigError::Validation {
            message: "storage.database_path must not be empty".to_string(),
        });
    }

    if errors.is_empty() { Ok(()) } else { Err(errors) }
}
