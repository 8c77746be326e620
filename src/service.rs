//! Saved-biodata operations on behalf of a signed-in user.
//!
//! Collaborator failures are turned into [`ServiceError`]s here and into
//! `{success: false, error}` results at the HTTP edge; nothing is allowed to
//! escape as a panic.

use std::sync::Arc;
use std::time::Duration;

use moka::future::Cache;
use serde::Serialize;
use thiserror::Error;

use crate::auth::CurrentUser;
use crate::persistence::{BiodataRepository, PersistenceError};
use crate::photo::{decode_data_uri, is_data_uri};
use crate::record::Record;
use crate::storage::{
    content_type_for, photo_object_path, ImageStorage, LocalImageStorage, StorageError,
    LOCAL_URL_PREFIX,
};

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("sign in to use saved biodata")]
    Unauthenticated,
    #[error("you do not have permission to access biodata '{0}'")]
    PermissionDenied(String),
    #[error(transparent)]
    Persistence(#[from] PersistenceError),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Outcome envelope returned to the UI.
#[derive(Debug, Serialize)]
pub struct ActionResult<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<T> ActionResult<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn err(message: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(message.into()),
        }
    }
}

impl<T, E: std::fmt::Display> From<Result<T, E>> for ActionResult<T> {
    fn from(result: Result<T, E>) -> Self {
        match result {
            Ok(data) => Self::ok(data),
            Err(e) => Self::err(e.to_string()),
        }
    }
}

#[derive(Clone)]
pub struct BiodataService {
    repository: Arc<dyn BiodataRepository>,
    images: Arc<dyn ImageStorage>,
    local_images: LocalImageStorage,
    http_client: reqwest::Client,
    owner_cache: Cache<String, Vec<Record>>,
    /// URL prefixes remote photos may be fetched from.
    photo_origins: Vec<String>,
}

fn require(user: Option<&CurrentUser>) -> Result<&CurrentUser, ServiceError> {
    user.ok_or(ServiceError::Unauthenticated)
}

impl BiodataService {
    pub fn new(
        repository: Arc<dyn BiodataRepository>,
        images: Arc<dyn ImageStorage>,
        local_images: LocalImageStorage,
        http_client: reqwest::Client,
    ) -> Self {
        let owner_cache = Cache::builder()
            .time_to_live(Duration::from_secs(10 * 60))
            .max_capacity(1_000)
            .build();
        Self {
            repository,
            images,
            local_images,
            http_client,
            owner_cache,
            photo_origins: Vec::new(),
        }
    }

    /// Allow exports to fetch photos whose URL starts with `prefix`, e.g. the
    /// public URL of the storage bucket.
    pub fn trust_photos_under(mut self, prefix: impl Into<String>) -> Self {
        self.photo_origins.push(prefix.into());
        self
    }

    /// Whether `url` points into trusted photo storage once normalised.
    pub fn accepts_remote_photo(&self, url: &str) -> bool {
        let Ok(parsed) = reqwest::Url::parse(url) else {
            return false;
        };
        if !matches!(parsed.scheme(), "http" | "https") {
            return false;
        }
        self.photo_origins
            .iter()
            .any(|prefix| parsed.as_str().starts_with(prefix.as_str()))
    }

    /// Record `id`, refused unless `user` owns it.
    async fn owned(&self, user: &CurrentUser, id: &str) -> Result<Record, ServiceError> {
        let record = self
            .repository
            .get(id)
            .await?
            .ok_or_else(|| PersistenceError::NotFound(id.to_string()))?;
        if record.owner.as_deref() != Some(user.uid.as_str()) {
            log::warn!("User {} attempted to access biodata {}", user.uid, id);
            return Err(ServiceError::PermissionDenied(id.to_string()));
        }
        Ok(record)
    }

    /// Create or update; returns the record id.
    pub async fn save(
        &self,
        user: Option<&CurrentUser>,
        record: Record,
    ) -> Result<String, ServiceError> {
        let user = require(user)?;
        if let Some(id) = record.id.as_deref() {
            self.owned(user, id).await?;
        }
        let id = self.repository.save(&user.uid, record).await?;
        self.owner_cache.invalidate(&user.uid).await;
        log::info!("Saved biodata {} for user {}", id, user.uid);
        Ok(id)
    }

    pub async fn get(&self, user: Option<&CurrentUser>, id: &str) -> Result<Record, ServiceError> {
        let user = require(user)?;
        self.owned(user, id).await
    }

    /// The user's records, most recently updated first.
    pub async fn list(&self, user: Option<&CurrentUser>) -> Result<Vec<Record>, ServiceError> {
        let user = require(user)?;
        if let Some(records) = self.owner_cache.get(&user.uid).await {
            log::debug!("Serving biodata list for {} from cache", user.uid);
            return Ok(records);
        }
        let records = self.repository.list_by_owner(&user.uid).await?;
        self.owner_cache
            .insert(user.uid.clone(), records.clone())
            .await;
        Ok(records)
    }

    /// Delete a record and, best effort, its photo.
    pub async fn delete(&self, user: Option<&CurrentUser>, id: &str) -> Result<(), ServiceError> {
        let user = require(user)?;
        let record = self.owned(user, id).await?;
        if let Some(url) = record.photo_url.as_deref() {
            self.delete_photo_quietly(url).await;
        }
        self.repository.delete(id).await?;
        self.owner_cache.invalidate(&user.uid).await;
        Ok(())
    }

    /// Upload a photo for a saved record and point the record at it.
    pub async fn attach_photo(
        &self,
        user: Option<&CurrentUser>,
        id: &str,
        filename: &str,
        data: &[u8],
    ) -> Result<String, ServiceError> {
        let user = require(user)?;
        let mut record = self.owned(user, id).await?;

        let path = photo_object_path(id, filename);
        let url = self
            .images
            .upload(&path, data, &content_type_for(filename))
            .await?;

        let previous = record.photo_url.replace(url.clone());
        if let Err(e) = self.repository.save(&user.uid, record).await {
            // The record still points at the previous photo.
            self.delete_photo_quietly(&url).await;
            return Err(e.into());
        }
        self.owner_cache.invalidate(&user.uid).await;

        if let Some(old) = previous.filter(|old| *old != url) {
            self.delete_photo_quietly(&old).await;
        }
        Ok(url)
    }

    async fn delete_photo_quietly(&self, url: &str) {
        if is_data_uri(url) {
            return;
        }
        if let Err(e) = self.images.delete(url).await {
            log::warn!("Ignoring failure to delete photo {}: {}", url, e);
        }
    }

    /// Bytes behind a photo URL for embedding in an export: a data URI, a
    /// locally stored image or an object in trusted storage. Anything else,
    /// and any failure, drops the photo.
    pub async fn fetch_photo(&self, url: &str) -> Option<Vec<u8>> {
        if is_data_uri(url) {
            return match decode_data_uri(url) {
                Ok((_, bytes)) => Some(bytes),
                Err(e) => {
                    log::warn!("Dropping undecodable photo data URI: {}", e);
                    None
                }
            };
        }

        if let Some(relative) = url
            .strip_prefix(LOCAL_URL_PREFIX)
            .and_then(|rest| rest.strip_prefix('/'))
        {
            let path = self.local_images.resolve(relative)?;
            return match tokio::fs::read(&path).await {
                Ok(bytes) => Some(bytes),
                Err(e) => {
                    log::warn!("Dropping photo {}: {}", url, e);
                    None
                }
            };
        }

        if !self.accepts_remote_photo(url) {
            log::warn!("Not fetching photo from untrusted location {}", url);
            return None;
        }

        let response = match self.http_client.get(url).send().await {
            Ok(response) => response,
            Err(e) => {
                log::warn!("Failed to fetch photo {}: {}", url, e);
                return None;
            }
        };
        if !response.status().is_success() {
            log::warn!("Photo {} returned status {}", url, response.status());
            return None;
        }
        match response.bytes().await {
            Ok(bytes) => Some(bytes.to_vec()),
            Err(e) => {
                log::warn!("Failed to read photo {}: {}", url, e);
                None
            }
        }
    }
}
