use std::future::Future;

use chrono::Utc;
use tokio::runtime::{Builder, Runtime};

use super::{KeyValueStore, StorageError};
use crate::{connect_with_settings, migrations, DbPool};

/// Sqlite-backed store behind the synchronous [`KeyValueStore`] interface.
/// Owns a current-thread runtime and blocks on each query, so it must not be
/// used from inside another async runtime.
pub struct SqliteKeyValueStore {
    runtime: Runtime,
    pool: DbPool,
}

impl SqliteKeyValueStore {
    /// Connects and applies pending migrations.
    pub fn open(
        database_url: &str,
        max_connections: u32,
        timeout_secs: u64,
    ) -> Result<Self, StorageError> {
        let runtime = Builder::new_current_thread().enable_all().build().map_err(|error| {
            StorageError::Unavailable(format!("failed to initialize async runtime: {error}"))
        })?;

        let pool = runtime.block_on(async {
            let pool = connect_with_settings(database_url, max_connections, timeout_secs).await?;
            migrations::run_pending(&pool).await?;
            Ok::<DbPool, StorageError>(pool)
        })?;

        Ok(Self { runtime, pool })
    }

    pub fn pool(&self) -> &DbPool {
        &self.pool
    }

    fn block_on<F: Future>(&self, future: F) -> F::Output {
        self.runtime.block_on(future)
    }
}

impl Drop for SqliteKeyValueStore {
    fn drop(&mut self) {
        let pool = self.pool.clone();
        self.runtime.block_on(async move { pool.close().await });
    }
}

impl KeyValueStore for SqliteKeyValueStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        let value = self.block_on(
            sqlx::query_scalar::<_, String>("SELECT value FROM kv_entries WHERE key = ?1")
                .bind(key)
                .fetch_optional(&self.pool),
        )?;
        Ok(value)
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.block_on(
            sqlx::query(
                "INSERT INTO kv_entries (key, value, updated_at) VALUES (?1, ?2, ?3)
                 ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at",
            )
            .bind(key)
            .bind(value)
            .bind(Utc::now().to_rfc3339())
            .execute(&self.pool),
        )?;
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        self.block_on(
            sqlx::query("DELETE FROM kv_entries WHERE key = ?1").bind(key).execute(&self.pool),
        )?;
        Ok(())
    }

    fn entries(&self) -> Result<Vec<(String, String)>, StorageError> {
        let rows = self.block_on(
            sqlx::query_as::<_, (String, String)>(
                "SELECT key, value FROM kv_entries ORDER BY key",
            )
            .fetch_all(&self.pool),
        )?;
        Ok(rows)
    }
}
