//! Photo storage backends.

use std::env;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use thiserror::Error;

pub const PHOTO_FOLDER: &str = "biodata-photos";
pub const LOCAL_URL_PREFIX: &str = "/images";

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("storage is not configured: {0}")]
    Config(String),
    #[error("file I/O failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("storage request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("storage rejected the request ({status}): {body}")]
    Rejected { status: u16, body: String },
    #[error("'{0}' does not belong to this storage")]
    ForeignUrl(String),
}

#[async_trait]
pub trait ImageStorage: Send + Sync {
    /// Store `data` under `path` and return its public URL.
    async fn upload(&self, path: &str, data: &[u8], content_type: &str)
        -> Result<String, StorageError>;
    /// Remove the object behind a URL previously returned by `upload`.
    async fn delete(&self, url: &str) -> Result<(), StorageError>;
}

/// `biodata-photos/<id>_<millis>.<ext>`
pub fn photo_object_path(record_id: &str, original_filename: &str) -> String {
    let extension = Path::new(original_filename)
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_ascii_lowercase())
        .unwrap_or_else(|| "jpg".to_string());
    format!(
        "{}/{}_{}.{}",
        PHOTO_FOLDER,
        sanitize_filename::sanitize(record_id),
        chrono::Utc::now().timestamp_millis(),
        extension
    )
}

pub fn content_type_for(filename: &str) -> String {
    mime_guess::from_path(filename)
        .first_or_octet_stream()
        .essence_str()
        .to_string()
}

#[derive(Debug, Clone)]
pub struct SupabaseConfig {
    pub url: String,
    pub anon_key: String,
    pub bucket: String,
}

impl SupabaseConfig {
    pub fn from_env() -> Result<Self, StorageError> {
        let var = |name: &str| {
            env::var(name).map_err(|_| StorageError::Config(format!("{name} must be set")))
        };
        Ok(Self {
            url: var("SUPABASE_URL")?.trim_end_matches('/').to_string(),
            anon_key: var("SUPABASE_ANON_KEY")?,
            bucket: env::var("SUPABASE_BUCKET").unwrap_or_else(|_| "biodata".to_string()),
        })
    }

    pub fn public_url(&self, path: &str) -> String {
        format!(
            "{}/storage/v1/object/public/{}/{}",
            self.url, self.bucket, path
        )
    }

    fn object_url(&self, path: &str) -> String {
        format!("{}/storage/v1/object/{}/{}", self.url, self.bucket, path)
    }

    /// Object path of a public URL from this bucket.
    pub fn path_of(&self, url: &str) -> Option<String> {
        let prefix = self.public_url("");
        url.strip_prefix(&prefix)
            .filter(|path| !path.is_empty())
            .map(str::to_string)
    }
}

/// Supabase Storage over its REST API.
pub struct SupabaseStorage {
    config: SupabaseConfig,
    client: reqwest::Client,
}

impl SupabaseStorage {
    pub fn new(config: SupabaseConfig, client: reqwest::Client) -> Self {
        Self { config, client }
    }
}

async fn check(response: reqwest::Response) -> Result<(), StorageError> {
    let status = response.status();
    if status.is_success() {
        return Ok(());
    }
    let body = response.text().await.unwrap_or_default();
    Err(StorageError::Rejected {
        status: status.as_u16(),
        body,
    })
}

#[async_trait]
impl ImageStorage for SupabaseStorage {
    async fn upload(
        &self,
        path: &str,
        data: &[u8],
        content_type: &str,
    ) -> Result<String, StorageError> {
        let response = self
            .client
            .post(self.config.object_url(path))
            .bearer_auth(&self.config.anon_key)
            .header("apikey", &self.config.anon_key)
            .header("x-upsert", "true")
            .header(reqwest::header::CONTENT_TYPE, content_type)
            .body(data.to_vec())
            .send()
            .await?;
        check(response).await?;
        log::info!("Uploaded {} ({} bytes) to Supabase", path, data.len());
        Ok(self.config.public_url(path))
    }

    async fn delete(&self, url: &str) -> Result<(), StorageError> {
        let path = self
            .config
            .path_of(url)
            .ok_or_else(|| StorageError::ForeignUrl(url.to_string()))?;
        let response = self
            .client
            .delete(self.config.object_url(&path))
            .bearer_auth(&self.config.anon_key)
            .header("apikey", &self.config.anon_key)
            .send()
            .await?;
        check(response).await
    }
}

/// Files under a local directory, served at [`LOCAL_URL_PREFIX`].
#[derive(Debug, Clone)]
pub struct LocalImageStorage {
    dir: PathBuf,
}

impl LocalImageStorage {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// On-disk path for a served file name, rejecting anything that would
    /// escape the storage directory.
    pub fn resolve(&self, relative: &str) -> Option<PathBuf> {
        let mut path = self.dir.clone();
        for part in relative.split('/') {
            if part.is_empty() || part == "." || part == ".." {
                return None;
            }
            path.push(sanitize_filename::sanitize(part));
        }
        Some(path)
    }
}

#[async_trait]
impl ImageStorage for LocalImageStorage {
    async fn upload(
        &self,
        path: &str,
        data: &[u8],
        _content_type: &str,
    ) -> Result<String, StorageError> {
        let target = self
            .resolve(path)
            .ok_or_else(|| StorageError::ForeignUrl(path.to_string()))?;
        if let Some(parent) = target.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(&target, data).await?;
        Ok(format!("{LOCAL_URL_PREFIX}/{path}"))
    }

    async fn delete(&self, url: &str) -> Result<(), StorageError> {
        let relative = url
            .strip_prefix(LOCAL_URL_PREFIX)
            .and_then(|rest| rest.strip_prefix('/'))
            .ok_or_else(|| StorageError::ForeignUrl(url.to_string()))?;
        let target = self
            .resolve(relative)
            .ok_or_else(|| StorageError::ForeignUrl(url.to_string()))?;
        tokio::fs::remove_file(target).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_photo_object_path() {
        let path = photo_object_path("abc-123", "Me.JPEG");
        assert!(path.starts_with("biodata-photos/abc-123_"));
        assert!(path.ends_with(".jpeg"));
        assert!(photo_object_path("abc", "noext").ends_with(".jpg"));
    }

    #[test]
    fn test_supabase_urls() {
        let config = SupabaseConfig {
            url: "https://test.supabase.co".into(),
            anon_key: "key".into(),
            bucket: "biodata".into(),
        };
        let url = config.public_url("biodata-photos/a.jpg");
        assert_eq!(
            url,
            "https://test.supabase.co/storage/v1/object/public/biodata/biodata-photos/a.jpg"
        );
        assert_eq!(config.path_of(&url).as_deref(), Some("biodata-photos/a.jpg"));
        assert_eq!(config.path_of("https://elsewhere.com/a.jpg"), None);
    }

    #[test]
    fn test_local_resolve_rejects_traversal() {
        let storage = LocalImageStorage::new("/srv/images");
        assert!(storage.resolve("../etc/passwd").is_none());
        assert!(storage.resolve("biodata-photos/../../x").is_none());
        assert_eq!(
            storage.resolve("biodata-photos/a.jpg"),
            Some(PathBuf::from("/srv/images/biodata-photos/a.jpg"))
        );
    }

    #[tokio::test]
    async fn test_local_upload_and_delete() {
        let dir = tempfile::tempdir().unwrap();
        let storage = LocalImageStorage::new(dir.path());
        let url = storage
            .upload("biodata-photos/x_1.jpg", b"jpeg", "image/jpeg")
            .await
            .unwrap();
        assert_eq!(url, "/images/biodata-photos/x_1.jpg");
        assert!(dir.path().join("biodata-photos/x_1.jpg").exists());

        storage.delete(&url).await.unwrap();
        assert!(!dir.path().join("biodata-photos/x_1.jpg").exists());
        assert!(storage.delete("https://cdn.example.com/a.jpg").await.is_err());
    }

    #[test]
    fn test_content_type_for() {
        assert_eq!(content_type_for("a.png"), "image/png");
        assert_eq!(content_type_for("a.jpg"), "image/jpeg");
    }
}
