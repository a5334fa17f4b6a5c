// SPDX-FileCopyrightText: 2026 Parlor Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Shared setup helpers for storage-backed tests.

use std::sync::Arc;

use parlor_config::model::StorageConfig;
use parlor_core::ChatStore;
use parlor_storage::SqliteStorage;

/// Open an initialized SqliteStorage on a fresh temporary database.
///
/// The returned TempDir must be kept alive for the duration of the test.
pub async fn temp_storage() -> (Arc<SqliteStorage>, tempfile::TempDir) {
    let dir = tempfile::tempdir().expect("tempdir");
    let db_path = dir.path().join("parlor-test.db");
    let storage = SqliteStorage::new(StorageConfig {
        database_path: db_path.to_string_lossy().into_owned(),
        wal_mode: true,
    });
    storage.initialize().await.expect("storage initialize");
    (Arc::new(storage), dir)
}
