//! One draft store per HTTP session, each backed by its own draft file.
//!
//! Open stores live in a bounded cache. An idle session drops out of memory
//! and is restored from its file on the next request; anonymous sessions
//! take their file with them when they are evicted.

use std::fmt::Write as _;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use moka::future::Cache;
use moka::notification::RemovalCause;
use parking_lot::Mutex;

use super::{DraftStore, FileDraftStorage};

pub type SharedDraft = Arc<Mutex<DraftStore<FileDraftStorage>>>;

const USER_PREFIX: &str = "user-";
const ANON_PREFIX: &str = "anon-";

const MAX_OPEN_SESSIONS: u64 = 10_000;
const SESSION_IDLE: Duration = Duration::from_secs(2 * 60 * 60);

/// Directory name for a session key. ASCII letters, digits, `-` and `_` are
/// kept; every other byte becomes `%XX`, so distinct keys never share a
/// directory and no name can climb out of the draft root.
fn session_dir(key: &str) -> String {
    let mut dir = String::with_capacity(key.len());
    for byte in key.bytes() {
        if byte.is_ascii_alphanumeric() || byte == b'-' || byte == b'_' {
            dir.push(byte as char);
        } else {
            let _ = write!(dir, "%{:02X}", byte);
        }
    }
    dir
}

pub struct DraftSessions {
    root: PathBuf,
    stores: Cache<String, SharedDraft>,
}

impl DraftSessions {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self::with_idle(root, SESSION_IDLE)
    }

    /// Sessions untouched for `idle` are closed.
    pub fn with_idle(root: impl Into<PathBuf>, idle: Duration) -> Self {
        let root = root.into();
        let draft_root = root.clone();
        let stores = Cache::builder()
            .max_capacity(MAX_OPEN_SESSIONS)
            .time_to_idle(idle)
            .eviction_listener(move |dir: Arc<String>, _draft, cause: RemovalCause| {
                if !cause.was_evicted() || !dir.starts_with(ANON_PREFIX) {
                    return;
                }
                let path = draft_root.join(dir.as_str());
                match std::fs::remove_dir_all(&path) {
                    Ok(()) => log::debug!("Closed anonymous draft session '{}'", dir),
                    Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                    Err(e) => log::warn!("Failed to remove draft {}: {}", path.display(), e),
                }
            })
            .build();
        Self { root, stores }
    }

    pub fn user_key(uid: &str) -> String {
        format!("{USER_PREFIX}{uid}")
    }

    pub fn anonymous_key(session: &str) -> String {
        format!("{ANON_PREFIX}{session}")
    }

    /// Store for `key`, restored from its draft file on first use.
    pub async fn session(&self, key: &str) -> SharedDraft {
        let dir = session_dir(key);
        let storage = FileDraftStorage::in_dir(self.root.join(&dir));
        self.stores
            .get_with(dir.clone(), async move {
                log::debug!("Opening draft session '{}'", dir);
                let fallback = storage.clone();
                let store = match tokio::task::spawn_blocking(move || DraftStore::restore(storage))
                    .await
                {
                    Ok(store) => store,
                    Err(e) => {
                        log::error!("Draft restore for '{}' did not finish: {}", dir, e);
                        DraftStore::new(fallback)
                    }
                };
                Arc::new(Mutex::new(store))
            })
            .await
    }

    /// Sessions currently held in memory.
    pub async fn open_sessions(&self) -> u64 {
        self.stores.run_pending_tasks().await;
        self.stores.entry_count()
    }
}
