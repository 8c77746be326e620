//! Application state shared by every handler.
//!
//! Backends are picked from [`AppConfig`]:
//! - records go to Postgres when `DATABASE_URL` is set, otherwise to memory
//! - photos go to Supabase Storage when configured, otherwise to `IMAGE_DIR`

use std::sync::Arc;
use std::time::Duration;

use crate::auth::JwtKeys;
use crate::config::AppConfig;
use crate::draft::DraftSessions;
use crate::export::TypstRenderEngine;
use crate::persistence::{BiodataRepository, InMemoryRepository, PgBiodataRepository};
use crate::service::BiodataService;
use crate::storage::{ImageStorage, LocalImageStorage, SupabaseStorage};

#[derive(Clone)]
pub struct AppState {
    pub config: AppConfig,
    pub service: BiodataService,
    pub drafts: Arc<DraftSessions>,
    pub engine: TypstRenderEngine,
    pub jwt: JwtKeys,
    pub local_images: LocalImageStorage,
}

fn http_client() -> reqwest::Result<reqwest::Client> {
    reqwest::Client::builder()
        .pool_idle_timeout(Duration::from_secs(900))
        .timeout(Duration::from_secs(30))
        .user_agent(concat!("biodata-maker/", env!("CARGO_PKG_VERSION")))
        .build()
}

impl AppState {
    pub async fn new(config: AppConfig) -> anyhow::Result<Self> {
        let http_client = http_client()?;

        let repository: Arc<dyn BiodataRepository> = match config.database_url.as_deref() {
            Some(database_url) => {
                let pool = sqlx::postgres::PgPoolOptions::new()
                    .max_connections(20)
                    .min_connections(2)
                    .acquire_timeout(Duration::from_secs(30))
                    .idle_timeout(Duration::from_secs(900))
                    .max_lifetime(Duration::from_secs(1800))
                    .connect(database_url)
                    .await?;
                let repository = PgBiodataRepository::new(pool);
                repository.migrate().await?;
                log::info!("Saved biodata are stored in Postgres");
                Arc::new(repository)
            }
            None => {
                log::warn!("DATABASE_URL not set, saved biodata are kept in memory only");
                Arc::new(InMemoryRepository::new())
            }
        };

        let images: Arc<dyn ImageStorage> = match config.supabase.clone() {
            Some(supabase) => Arc::new(SupabaseStorage::new(supabase, http_client.clone())),
            None => Arc::new(LocalImageStorage::new(&config.image_dir)),
        };

        Ok(Self::with_parts(config, repository, images, http_client))
    }

    /// State over explicit backends; used by `new` and by tests.
    pub fn with_parts(
        config: AppConfig,
        repository: Arc<dyn BiodataRepository>,
        images: Arc<dyn ImageStorage>,
        http_client: reqwest::Client,
    ) -> Self {
        let local_images = LocalImageStorage::new(&config.image_dir);
        let mut service =
            BiodataService::new(repository, images, local_images.clone(), http_client);
        if let Some(supabase) = &config.supabase {
            service = service.trust_photos_under(supabase.public_url(""));
        }
        let drafts = Arc::new(DraftSessions::new(&config.draft_dir));
        let engine = TypstRenderEngine::new(&config.typst_bin, config.typst_font_path.clone());
        let jwt = JwtKeys::from_secret(config.jwt_secret.clone());

        Self {
            config,
            service,
            drafts,
            engine,
            jwt,
            local_images,
        }
    }
}
