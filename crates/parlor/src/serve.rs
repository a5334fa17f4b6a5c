// SPDX-FileCopyrightText: 2026 Parlor Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `parlor serve` command implementation.
//!
//! Wires the SQLite storage, the in-process room-listing cache, and the
//! Gemini completion provider into the engine, spawns the reply worker
//! pool, and runs until SIGINT/SIGTERM. On shutdown, workers finish the
//! job they hold, the pool drains with a bounded wait, and storage closes
//! with a WAL checkpoint. Jobs still claimed at exit redeliver on the next
//! start once their visibility window lapses.

use std::sync::Arc;
use std::time::Duration;

use parlor_cache::MemoryCache;
use parlor_config::ParlorConfig;
use parlor_core::{ChatStore, ParlorError};
use parlor_engine::{Engine, shutdown};
use parlor_gemini::GeminiCompletion;
use parlor_storage::SqliteStorage;
use tracing::info;

/// Bound on the shutdown drain: one in-flight completion plus margin.
const DRAIN_TIMEOUT: Duration = Duration::from_secs(30);

/// Runs the `parlor serve` command.
pub async fn run_serve(config: ParlorConfig) -> Result<(), ParlorError> {
    init_tracing(&config.service.log_level);

    info!(service = config.service.name.as_str(), "starting parlor serve");

    // The provider is constructed first so a missing API key fails fast,
    // before any storage is touched.
    let provider = Arc::new(GeminiCompletion::from_config(
        &config.gemini,
        config.worker.completion_timeout(),
    )?);

    let storage = Arc::new(SqliteStorage::new(config.storage.clone()));
    storage.initialize().await?;

    let cache = Arc::new(MemoryCache::new());

    let engine = Engine::new(
        &config,
        storage.clone(),
        storage.clone(),
        storage.clone(),
        cache,
        provider,
    );

    let cancel = shutdown::install_signal_handler();
    let handles = engine.spawn_workers(&cancel);
    info!(workers = config.worker.concurrency, "reply workers running");

    cancel.cancelled().await;

    engine.shutdown(handles, DRAIN_TIMEOUT).await?;
    info!("parlor serve stopped");
    Ok(())
}

/// Initialize the tracing subscriber from the configured log level.
///
/// RUST_LOG still wins when set, so operators can raise verbosity per
/// module without touching the config file.
fn init_tracing(log_level: &str) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(log_level));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}
