//! Local draft backup.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::record::Record;

pub const DRAFT_FILE: &str = "biodata_draft.json";

#[derive(Debug, Error)]
pub enum DraftStorageError {
    #[error("draft file I/O failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("draft file is not a valid record: {0}")]
    Json(#[from] serde_json::Error),
}

/// Best-effort backup of the working record, independent of the cloud store.
pub trait LocalDraftStorage {
    fn save_draft(&self, record: &Record) -> Result<(), DraftStorageError>;
    fn load_draft(&self) -> Result<Option<Record>, DraftStorageError>;
    fn clear_draft(&self) -> Result<(), DraftStorageError>;
}

/// One JSON file per draft.
#[derive(Debug, Clone)]
pub struct FileDraftStorage {
    path: PathBuf,
}

impl FileDraftStorage {
    /// Draft stored as `biodata_draft.json` inside `dir`.
    pub fn in_dir(dir: impl AsRef<Path>) -> Self {
        Self {
            path: dir.as_ref().join(DRAFT_FILE),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl LocalDraftStorage for FileDraftStorage {
    fn save_draft(&self, record: &Record) -> Result<(), DraftStorageError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_vec_pretty(record)?;
        fs::write(&self.path, json)?;
        Ok(())
    }

    fn load_draft(&self) -> Result<Option<Record>, DraftStorageError> {
        match fs::read(&self.path) {
            Ok(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn clear_draft(&self) -> Result<(), DraftStorageError> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}
