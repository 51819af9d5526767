//! Repository implementations for database operations.

mod config_repo;
mod dlq_repo;
mod job_repo;

pub use config_repo::ConfigRepository;
pub use dlq_repo::DlqRepository;
pub use job_repo::JobRepository;
