//! SurrealDB-backed durable store for the job queue system.
//!
//! This crate provides the database connection, schema, the claim
//! protocol and repositories for the three tables: `job`, `dlq` and
//! `config`.
//!
//! # Features
//!
//! - `memory` (default): Use in-memory storage for testing
//! - `rocksdb`: Use RocksDB for persistent file-based storage

mod connection;
mod records;
mod schema;
mod store;
pub mod repositories;

pub use connection::{Database, DbConfig, DbError, connect};
pub use schema::init_schema;
pub use store::Store;
