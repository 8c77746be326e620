//! Cloud persistence of saved biodata records.
//!
//! Records are stored whole, as JSON, so fields this build does not know
//! about survive a save/load cycle.

mod memory;
mod postgres;

pub use memory::InMemoryRepository;
pub use postgres::PgBiodataRepository;

use async_trait::async_trait;
use chrono::Utc;
use thiserror::Error;

use crate::record::Record;

#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error("biodata '{0}' not found")]
    NotFound(String),
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("failed to (de)serialize record: {0}")]
    Serialization(#[from] serde_json::Error),
}

#[async_trait]
pub trait BiodataRepository: Send + Sync {
    /// Create (no id) or update (id set) a record for `owner`; returns its id.
    async fn save(&self, owner: &str, record: Record) -> Result<String, PersistenceError>;
    async fn get(&self, id: &str) -> Result<Option<Record>, PersistenceError>;
    /// Most recently updated first.
    async fn list_by_owner(&self, owner: &str) -> Result<Vec<Record>, PersistenceError>;
    async fn delete(&self, id: &str) -> Result<(), PersistenceError>;
}

/// Stamp ownership and timestamps before a write.
fn stamp(mut record: Record, id: &str, owner: &str, is_new: bool) -> Record {
    let now = Utc::now();
    record.id = Some(id.to_string());
    record.owner = Some(owner.to_string());
    if is_new || record.created_at.is_none() {
        record.created_at = Some(now);
    }
    record.updated_at = Some(now);
    record
}
