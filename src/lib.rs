use actix_cors::Cors;
use actix_web::middleware::Compress;
use actix_web::{http::header, web, App, HttpServer};
use actix_web_prometheus::PrometheusMetricsBuilder;
use serde::{Deserialize, Serialize};
use utoipa::{OpenApi, ToSchema};
use utoipa_swagger_ui::SwaggerUi;

pub mod auth;
pub mod biodata;
pub mod config;
pub mod db;
pub mod draft;
pub mod export;
pub mod persistence;
pub mod photo;
pub mod record;
pub mod resolve;
pub mod service;
pub mod storage;
pub mod template;
pub mod validation;

pub use crate::config::AppConfig;
pub use crate::db::AppState;

#[derive(Serialize, Deserialize, ToSchema)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
    pub timestamp: String,
}

impl ErrorResponse {
    pub fn new(error_type: &str, message: &str) -> Self {
        Self {
            error: error_type.to_string(),
            message: message.to_string(),
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }

    pub fn not_found(message: &str) -> Self {
        Self::new("NotFound", message)
    }

    pub fn bad_request(message: &str) -> Self {
        Self::new("BadRequest", message)
    }

    pub fn internal_error(message: &str) -> Self {
        Self::new("InternalServerError", message)
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        crate::auth::handlers::get_auth_state,
        crate::biodata::handlers::list_templates,
        crate::biodata::handlers::list_fields,
        crate::biodata::handlers::preview,
        crate::biodata::handlers::resolve_field,
        crate::biodata::handlers::export,
        crate::biodata::handlers::crop_photo,
        crate::biodata::drafts::get_draft,
        crate::biodata::drafts::patch_draft,
        crate::biodata::drafts::replace_draft,
        crate::biodata::drafts::reset_draft,
        crate::biodata::drafts::set_step,
        crate::biodata::drafts::validate_draft,
        crate::biodata::drafts::save_draft,
        crate::biodata::saved::list_biodata,
        crate::biodata::saved::save_biodata,
        crate::biodata::saved::get_biodata,
        crate::biodata::saved::delete_biodata,
        crate::biodata::saved::edit_biodata,
        crate::biodata::saved::upload_photo
    ),
    components(
        schemas(
            ErrorResponse,
            auth::CurrentUser,
            biodata::models::RecordBody,
            biodata::models::PatchBody,
            biodata::models::TemplateInfo,
            biodata::models::FieldInfo,
            biodata::models::ResolvedField,
            biodata::models::CaptureUpload,
            biodata::models::ExportRequest,
            biodata::models::PreviewSelection,
            biodata::models::CropRequest,
            biodata::models::CropResponse,
            biodata::models::DraftResponse,
            biodata::models::StepRequest,
            biodata::models::ValidationReport,
            biodata::models::SavedId,
            biodata::models::PhotoUrl,
            biodata::models::UploadPhotoRequest,
            draft::WizardStep,
            export::ExportStrategy,
            photo::CropArea,
            photo::PreviewRect,
            template::TemplateStyle,
            validation::ValidationError,
        )
    ),
    tags(
        (name = "Authentication", description = "Identity of the caller."),
        (name = "Templates", description = "Layouts, fields and live preview."),
        (name = "Export", description = "PDF and print export."),
        (name = "Photo", description = "Portrait cropping."),
        (name = "Draft", description = "Working draft and form wizard."),
        (name = "Saved Biodata", description = "Biodata saved to an account.")
    ),
    servers(
        (url = "http://127.0.0.1:8080", description = "Local server")
    )
)]
pub struct ApiDoc;

fn cors(origins: &[String]) -> Cors {
    origins
        .iter()
        .fold(Cors::default(), |cors, origin| cors.allowed_origin(origin))
        .allowed_methods(vec!["GET", "POST", "PUT", "PATCH", "DELETE", "OPTIONS"])
        .allowed_headers(vec![
            header::AUTHORIZATION,
            header::ACCEPT,
            header::CONTENT_TYPE,
            header::HeaderName::from_static("x-draft-session"),
        ])
        .expose_headers(vec![
            header::CONTENT_DISPOSITION,
            header::HeaderName::from_static("x-draft-session"),
        ])
        .supports_credentials()
        .max_age(3600)
}

pub async fn run() -> anyhow::Result<()> {
    dotenvy::dotenv().ok(); // Load .env file
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = AppConfig::from_env()?;
    let (host, port) = (config.host.clone(), config.port);
    let cors_origins = config.cors_origins.clone();

    let app_state = match AppState::new(config).await {
        Ok(state) => web::Data::new(state),
        Err(e) => {
            log::error!("Failed to initialise application state. Check DATABASE_URL and storage settings in .env. Error: {}", e);
            return Err(e);
        }
    };

    let prometheus = PrometheusMetricsBuilder::new("biodata_maker")
        .endpoint("/metrics")
        .build()
        .map_err(|e| anyhow::anyhow!("failed to create Prometheus metrics middleware: {}", e))?;

    log::info!("Starting server at http://{}:{}", host, port);

    HttpServer::new(move || {
        App::new()
            .wrap(Compress::default())
            .wrap(prometheus.clone())
            .wrap(cors(&cors_origins))
            .app_data(app_state.clone())
            .service(web::scope("/api").configure(biodata::routes::config))
            .configure(biodata::routes::images)
            .service(
                SwaggerUi::new("/swagger-ui/{_:.*}")
                    .url("/api-doc/openapi.json", ApiDoc::openapi()),
            )
    })
    .keep_alive(actix_web::http::KeepAlive::Os)
    .bind((host.as_str(), port))?
    .run()
    .await?;

    Ok(())
}
