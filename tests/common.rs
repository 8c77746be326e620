#![allow(dead_code)]

use std::collections::HashMap;
use std::io::Cursor;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use biodata_maker::auth::{CurrentUser, JwtKeys};
use biodata_maker::persistence::{BiodataRepository, InMemoryRepository, PersistenceError};
use biodata_maker::record::Record;
use biodata_maker::storage::{ImageStorage, StorageError};
use biodata_maker::{AppConfig, AppState};
use image::{DynamicImage, ImageFormat, RgbImage};
use serde_json::{json, Value};
use tempfile::TempDir;
use tokio::sync::Mutex;

pub const TEST_SECRET: &str = "test-secret";
pub const MOCK_URL_PREFIX: &str = "https://cdn.test/";

/// In-memory photo storage.
pub struct MockImageStorage {
    files: Arc<Mutex<HashMap<String, Vec<u8>>>>,
    fail_deletes: bool,
}

impl MockImageStorage {
    pub fn new() -> Self {
        Self {
            files: Arc::new(Mutex::new(HashMap::new())),
            fail_deletes: false,
        }
    }

    /// Storage whose deletes always fail.
    pub fn failing_deletes() -> Self {
        Self {
            fail_deletes: true,
            ..Self::new()
        }
    }

    pub async fn has_url(&self, url: &str) -> bool {
        let files = self.files.lock().await;
        url.strip_prefix(MOCK_URL_PREFIX)
            .is_some_and(|path| files.contains_key(path))
    }

    pub async fn len(&self) -> usize {
        self.files.lock().await.len()
    }
}

#[async_trait]
impl ImageStorage for MockImageStorage {
    async fn upload(
        &self,
        path: &str,
        data: &[u8],
        _content_type: &str,
    ) -> Result<String, StorageError> {
        let mut files = self.files.lock().await;
        files.insert(path.to_string(), data.to_vec());
        Ok(format!("{MOCK_URL_PREFIX}{path}"))
    }

    async fn delete(&self, url: &str) -> Result<(), StorageError> {
        if self.fail_deletes {
            return Err(StorageError::Rejected {
                status: 500,
                body: "storage unavailable".to_string(),
            });
        }
        let path = url
            .strip_prefix(MOCK_URL_PREFIX)
            .ok_or_else(|| StorageError::ForeignUrl(url.to_string()))?;
        self.files.lock().await.remove(path);
        Ok(())
    }
}

/// In-memory repository whose writes can be made to fail.
pub struct FlakyRepository {
    inner: InMemoryRepository,
    fail_saves: AtomicBool,
}

impl FlakyRepository {
    pub fn new() -> Self {
        Self {
            inner: InMemoryRepository::new(),
            fail_saves: AtomicBool::new(false),
        }
    }

    pub fn fail_saves(&self, fail: bool) {
        self.fail_saves.store(fail, Ordering::SeqCst);
    }
}

#[async_trait]
impl BiodataRepository for FlakyRepository {
    async fn save(&self, owner: &str, record: Record) -> Result<String, PersistenceError> {
        if self.fail_saves.load(Ordering::SeqCst) {
            return Err(PersistenceError::Database(sqlx::Error::PoolTimedOut));
        }
        self.inner.save(owner, record).await
    }

    async fn get(&self, id: &str) -> Result<Option<Record>, PersistenceError> {
        self.inner.get(id).await
    }

    async fn list_by_owner(&self, owner: &str) -> Result<Vec<Record>, PersistenceError> {
        self.inner.list_by_owner(owner).await
    }

    async fn delete(&self, id: &str) -> Result<(), PersistenceError> {
        self.inner.delete(id).await
    }
}

/// App state over in-memory backends. Keep `dir` alive for the test.
pub struct TestContext {
    pub state: AppState,
    pub images: Arc<MockImageStorage>,
    pub dir: TempDir,
}

pub fn test_context() -> TestContext {
    test_context_with(MockImageStorage::new())
}

pub fn test_context_with(images: MockImageStorage) -> TestContext {
    test_context_over(Arc::new(InMemoryRepository::new()), images)
}

pub fn test_context_over(
    repository: Arc<dyn BiodataRepository>,
    images: MockImageStorage,
) -> TestContext {
    let dir = tempfile::tempdir().unwrap();
    let config = AppConfig {
        draft_dir: dir.path().join("drafts"),
        image_dir: dir.path().join("images"),
        jwt_secret: Some(TEST_SECRET.to_string()),
        ..AppConfig::default()
    };
    let images = Arc::new(images);
    let state = AppState::with_parts(
        config,
        repository,
        images.clone(),
        reqwest::Client::new(),
    );
    TestContext { state, images, dir }
}

pub fn user(uid: &str) -> CurrentUser {
    CurrentUser {
        uid: uid.to_string(),
        display_name: Some(format!("User {}", uid)),
        email: Some(format!("{}@example.com", uid)),
        photo_url: None,
    }
}

pub fn bearer(uid: &str) -> (&'static str, String) {
    let token = JwtKeys::new(TEST_SECRET).issue(&user(uid)).unwrap();
    ("Authorization", format!("Bearer {}", token))
}

/// A new-generation record that passes every wizard step.
pub fn complete_record() -> Value {
    json!({
        "deity": { "name": "|| श्री गणेशाय नमः ||" },
        "personalInfo": {
            "name": "राम पाटील",
            "dateOfBirth": "1995-04-12",
            "birthTime": "14:30",
            "religion": "हिंदू",
            "caste": "मराठा",
            "height": "5'8\"",
            "education": "B.E.",
            "jobOrBusiness": "Engineer",
            "salary": "12 लाख"
        },
        "familyInfo": {
            "fatherName": "शंकर पाटील",
            "motherName": "सुनीता पाटील",
            "brothers": [{ "name": "श्याम", "maritalStatus": "Married" }]
        },
        "contact": {
            "address": "पुणे",
            "mobileNumber": "9876543210"
        },
        "templateId": "template-1"
    })
}

/// Record written before the current schema existed.
pub fn legacy_record() -> Value {
    json!({
        "header": { "text": "श्री गणेश", "showSymbols": true },
        "personalDetails": {
            "fullName": "Ram Patil",
            "fullNameMarathi": "राम पाटील",
            "age": 29,
            "height": "5'8\""
        },
        "familyDetails": {
            "fatherName": "शंकर पाटील",
            "brothers": 2,
            "brothersMarried": 1,
            "familyType": "Joint"
        },
        "contact": { "phone": "9876543210", "email": "ram@example.com" },
        "aboutMe": "शांत स्वभाव"
    })
}

pub fn png(width: u32, height: u32) -> Vec<u8> {
    let mut buffer = Cursor::new(Vec::new());
    DynamicImage::ImageRgb8(RgbImage::new(width, height))
        .write_to(&mut buffer, ImageFormat::Png)
        .unwrap();
    buffer.into_inner()
}
