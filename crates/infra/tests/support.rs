use std::sync::Arc;

use fieldsync_core::{ConnectivityFlag, EnqueueGate, MutationStore, ReplayEngine};
use fieldsync_infra::database::{DbManager, SqliteMutationStore};
use fieldsync_infra::http::HttpTransport;
use tempfile::TempDir;

/// Temporary database wrapper that keeps the underlying file alive for the
/// duration of a test run.
pub struct TestDatabase {
    pub manager: Arc<DbManager>,
    _temp_dir: TempDir,
}

impl TestDatabase {
    /// Create a new migrated temporary database.
    pub fn new() -> Self {
        let temp_dir = TempDir::new().expect("temp dir should be created");
        let db_path = temp_dir.path().join("queue.db");

        let manager = DbManager::new(&db_path, 4).expect("db manager should be created");
        manager.run_migrations().expect("migrations should apply");

        Self { manager: Arc::new(manager), _temp_dir: temp_dir }
    }

    pub fn store(&self) -> Arc<SqliteMutationStore> {
        Arc::new(SqliteMutationStore::new(Arc::clone(&self.manager)))
    }

    /// Execute a batch of SQL statements against the database.
    pub fn execute_batch(&self, sql: &str) {
        let conn = self
            .manager
            .get_connection()
            .expect("connection should be available for execute_batch");
        conn.execute_batch(sql).expect("SQL batch execution should succeed");
    }
}

impl Default for TestDatabase {
    fn default() -> Self {
        Self::new()
    }
}

/// Real store, real transport and a shared connectivity flag pointed at
/// `base_url`.
pub struct Harness {
    pub db: TestDatabase,
    pub store: Arc<SqliteMutationStore>,
    pub connectivity: Arc<ConnectivityFlag>,
    pub gate: EnqueueGate,
    pub engine: ReplayEngine,
}

impl Harness {
    pub fn new(base_url: &str) -> Self {
        let db = TestDatabase::new();
        let store = db.store();
        let connectivity = Arc::new(ConnectivityFlag::new(false));
        let transport = Arc::new(
            HttpTransport::builder()
                .base_url(base_url)
                .build()
                .expect("transport should build"),
        );

        let store_port: Arc<dyn MutationStore> = store.clone();
        let gate = EnqueueGate::new(
            Arc::clone(&store_port),
            transport.clone(),
            connectivity.clone(),
        );
        let engine = ReplayEngine::new(store_port, transport, connectivity.clone());

        Self { db, store, connectivity, gate, engine }
    }
}
