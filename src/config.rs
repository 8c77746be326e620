//! Runtime configuration from environment variables (`.env` supported).

use std::env;
use std::path::PathBuf;

use thiserror::Error;

use crate::storage::SupabaseConfig;

const DEFAULT_CORS_ORIGINS: &[&str] = &[
    "http://localhost:5173",
    "http://localhost:3000",
    "http://localhost:8080",
    "http://127.0.0.1:8080",
];

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{name} is not a valid value: '{value}'")]
    Invalid { name: &'static str, value: String },
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    /// Postgres URL; without it records are kept in memory.
    pub database_url: Option<String>,
    pub draft_dir: PathBuf,
    /// Used for photos when Supabase is not configured.
    pub image_dir: PathBuf,
    pub supabase: Option<SupabaseConfig>,
    pub typst_bin: PathBuf,
    pub typst_font_path: Option<PathBuf>,
    pub jwt_secret: Option<String>,
    pub cors_origins: Vec<String>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            database_url: None,
            draft_dir: PathBuf::from("./drafts"),
            image_dir: PathBuf::from("./images"),
            supabase: None,
            typst_bin: PathBuf::from("typst"),
            typst_font_path: None,
            jwt_secret: None,
            cors_origins: DEFAULT_CORS_ORIGINS.iter().map(|o| o.to_string()).collect(),
        }
    }
}

fn non_empty(name: &str) -> Option<String> {
    env::var(name).ok().filter(|value| !value.trim().is_empty())
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        let defaults = Self::default();

        let port = match non_empty("PORT") {
            Some(raw) => raw.trim().parse().map_err(|_| ConfigError::Invalid {
                name: "PORT",
                value: raw,
            })?,
            None => defaults.port,
        };

        let supabase = match SupabaseConfig::from_env() {
            Ok(config) => Some(config),
            Err(e) => {
                log::info!("Supabase storage disabled ({}), storing photos locally", e);
                None
            }
        };

        let cors_origins = non_empty("CORS_ORIGINS")
            .map(|raw| {
                raw.split(',')
                    .map(|origin| origin.trim().to_string())
                    .filter(|origin| !origin.is_empty())
                    .collect()
            })
            .unwrap_or(defaults.cors_origins);

        Ok(Self {
            host: non_empty("HOST").unwrap_or(defaults.host),
            port,
            database_url: non_empty("DATABASE_URL"),
            draft_dir: non_empty("DRAFT_DIR").map(PathBuf::from).unwrap_or(defaults.draft_dir),
            image_dir: non_empty("IMAGE_DIR").map(PathBuf::from).unwrap_or(defaults.image_dir),
            supabase,
            typst_bin: non_empty("TYPST_BIN").map(PathBuf::from).unwrap_or(defaults.typst_bin),
            typst_font_path: non_empty("TYPST_FONT_PATH").map(PathBuf::from),
            jwt_secret: non_empty("JWT_SECRET"),
            cors_origins,
        })
    }
}
