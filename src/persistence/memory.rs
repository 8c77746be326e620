use std::collections::HashMap;

use async_trait::async_trait;
use parking_lot::RwLock;
use uuid::Uuid;

use super::{stamp, BiodataRepository, PersistenceError};
use crate::record::Record;

/// Repository kept in process memory. Used when no database is configured
/// and in tests.
#[derive(Default)]
pub struct InMemoryRepository {
    records: RwLock<HashMap<String, Record>>,
}

impl InMemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.records.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.read().is_empty()
    }
}

#[async_trait]
impl BiodataRepository for InMemoryRepository {
    async fn save(&self, owner: &str, record: Record) -> Result<String, PersistenceError> {
        let mut records = self.records.write();
        let (id, is_new) = match record.id.clone() {
            Some(id) => {
                if !records.contains_key(&id) {
                    return Err(PersistenceError::NotFound(id));
                }
                (id, false)
            }
            None => (Uuid::new_v4().to_string(), true),
        };
        records.insert(id.clone(), stamp(record, &id, owner, is_new));
        Ok(id)
    }

    async fn get(&self, id: &str) -> Result<Option<Record>, PersistenceError> {
        Ok(self.records.read().get(id).cloned())
    }

    async fn list_by_owner(&self, owner: &str) -> Result<Vec<Record>, PersistenceError> {
        let mut records: Vec<Record> = self
            .records
            .read()
            .values()
            .filter(|record| record.owner.as_deref() == Some(owner))
            .cloned()
            .collect();
        records.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        Ok(records)
    }

    async fn delete(&self, id: &str) -> Result<(), PersistenceError> {
        match self.records.write().remove(id) {
            Some(_) => Ok(()),
            None => Err(PersistenceError::NotFound(id.to_string())),
        }
    }
}
