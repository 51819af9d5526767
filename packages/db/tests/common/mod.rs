use std::sync::atomic::{AtomicUsize, Ordering};

use db::{Database, DbConfig, DbError, Store};

static NEXT_DB: AtomicUsize = AtomicUsize::new(0);

fn isolated() -> DbConfig {
    let n = NEXT_DB.fetch_add(1, Ordering::SeqCst);
    DbConfig::memory().with_database(format!("test_{}_{}", std::process::id(), n))
}

/// Open an isolated in-memory store for one test.
pub async fn open_store() -> Result<Store, DbError> {
    Store::open(&isolated()).await
}

/// Open an isolated in-memory database without wrapping it in a store,
/// for tests that need several independent store handles.
pub async fn open_database() -> Result<Database, DbError> {
    db::connect(&isolated()).await
}
