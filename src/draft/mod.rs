//! Draft store: the working record and the wizard position.
//!
//! State transitions are pure; mirroring to local storage happens after each
//! transition and its failures are only logged.

mod local;
mod sessions;

pub use local::{DraftStorageError, FileDraftStorage, LocalDraftStorage, DRAFT_FILE};
pub use sessions::{DraftSessions, SharedDraft};

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::record::{Record, RecordPatch};

/// Form steps in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub enum WizardStep {
    Deity = 0,
    Personal = 1,
    Family = 2,
    Contact = 3,
    Photo = 4,
}

pub const STEP_COUNT: usize = 5;

impl WizardStep {
    pub const ALL: [WizardStep; STEP_COUNT] = [
        WizardStep::Deity,
        WizardStep::Personal,
        WizardStep::Family,
        WizardStep::Contact,
        WizardStep::Photo,
    ];

    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }

    pub fn index(self) -> usize {
        self as usize
    }
}

pub struct DraftStore<S> {
    record: Record,
    step: usize,
    storage: S,
}

impl<S: LocalDraftStorage> DraftStore<S> {
    pub fn new(storage: S) -> Self {
        Self {
            record: Record::default(),
            step: 0,
            storage,
        }
    }

    /// Start a session from the saved draft, if any.
    pub fn restore(storage: S) -> Self {
        let mut store = Self::new(storage);
        match store.storage.load_draft() {
            Ok(Some(record)) => {
                log::info!("Restored local draft");
                store.record = record;
            }
            Ok(None) => {}
            Err(e) => log::warn!("Ignoring unreadable local draft: {}", e),
        }
        store
    }

    pub fn record(&self) -> &Record {
        &self.record
    }

    pub fn step(&self) -> usize {
        self.step
    }

    /// Shallow-merge `patch` into the record. On a malformed patch the
    /// record is left untouched.
    pub fn set(&mut self, patch: &RecordPatch) -> Result<&Record, serde_json::Error> {
        self.record = self.record.merged(patch)?;
        self.mirror();
        Ok(&self.record)
    }

    /// Replace the record wholesale, e.g. after loading a saved biodata.
    pub fn load(&mut self, record: Record) {
        self.record = record;
        self.mirror();
    }

    /// Defaults everywhere, wizard back at the first step, saved draft gone.
    pub fn reset(&mut self) {
        self.record = Record::default();
        self.step = 0;
        if let Err(e) = self.storage.clear_draft() {
            log::error!("Failed to clear local draft: {}", e);
        }
    }

    /// Not clamped; callers keep `step` below [`STEP_COUNT`].
    pub fn set_step(&mut self, step: usize) {
        self.step = step;
    }

    fn mirror(&self) {
        if let Err(e) = self.storage.save_draft(&self.record) {
            log::error!("Failed to save local draft: {}", e);
        }
    }
}
