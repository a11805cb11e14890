use log::*;

use crate::SqliteStore;

/// Loads the test environment and logging. Safe to call from every test.
pub fn init_test_env() {
    dotenvy::from_filename(".env.test").ok();
    let _ = env_logger::try_init();
    debug!("🚀️ Logging initialised");
}

/// A fresh in-memory store with the schema applied. Each call returns an independent database.
pub async fn memory_store() -> SqliteStore {
    init_test_env();
    SqliteStore::new_in_memory().await.expect("Error creating in-memory store")
}
