//! Queue store selection and file-based persistence

pub mod file_store;

use std::sync::Arc;

use fieldsync_core::MutationStore;
use fieldsync_domain::{Result, StoreBackend, StoreConfig};
use tracing::info;

use crate::database::{DbManager, SqliteMutationStore};

pub use file_store::JsonFileMutationStore;

/// Open the durable queue described by the `store` configuration section.
///
/// SQLite stores are migrated before they are handed out.
pub fn open_store(config: &StoreConfig) -> Result<Arc<dyn MutationStore>> {
    info!(backend = %config.backend, path = %config.path, "Opening mutation queue");

    match config.backend {
        StoreBackend::Sqlite => {
            let db = DbManager::new(&config.path, config.pool_size)?;
            db.run_migrations()?;
            Ok(Arc::new(SqliteMutationStore::new(Arc::new(db))))
        }
        StoreBackend::File => Ok(Arc::new(JsonFileMutationStore::new(&config.path))),
    }
}
