pub mod connection;
pub mod migrations;
pub mod repositories;
pub mod store;

pub use connection::{connect_with_settings, DbPool};
pub use repositories::{InMemoryKeyValueStore, KeyValueStore, SqliteKeyValueStore, StorageError};
pub use store::{QuoteStore, StoreBackup, StoreStats};

use orcamento_core::config::{is_in_memory_url, DatabaseConfig};
use tracing::info;

/// `:memory:` gives a process-local store; any sqlite URL a migrated
/// [`SqliteKeyValueStore`].
pub fn open_store(database: &DatabaseConfig) -> Result<Box<dyn KeyValueStore>, StorageError> {
    if is_in_memory_url(&database.url) {
        info!(event_name = "storage.open", backend = "memory", "using in-memory store");
        return Ok(Box::new(InMemoryKeyValueStore::new()));
    }

    let store =
        SqliteKeyValueStore::open(&database.url, database.max_connections, database.timeout_secs)?;
    info!(event_name = "storage.open", backend = "sqlite", url = %database.url, "sqlite store ready");
    Ok(Box::new(store))
}
