use actix_web::web;

use super::{drafts, handlers, saved};
use crate::auth;

/// Photos and raster captures travel inside JSON as base64 data URIs; a
/// 10 MiB photo alone is about 14 MiB once encoded.
pub const JSON_LIMIT: usize = 32 * 1024 * 1024;

/// Everything mounted under `/api`.
pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.app_data(web::JsonConfig::default().limit(JSON_LIMIT))
        .service(web::resource("/auth/me").route(web::get().to(auth::get_auth_state)))
        .service(web::resource("/templates").route(web::get().to(handlers::list_templates)))
        .service(web::resource("/fields").route(web::get().to(handlers::list_fields)))
        .service(web::resource("/preview").route(web::post().to(handlers::preview)))
        .service(web::resource("/resolve/{field}").route(web::post().to(handlers::resolve_field)))
        .service(web::resource("/export").route(web::post().to(handlers::export)))
        .service(web::resource("/photo/crop").route(web::post().to(handlers::crop_photo)))
        .service(
            web::resource("/draft")
                .route(web::get().to(drafts::get_draft))
                .route(web::patch().to(drafts::patch_draft))
                .route(web::put().to(drafts::replace_draft))
                .route(web::delete().to(drafts::reset_draft)),
        )
        .service(web::resource("/draft/step").route(web::put().to(drafts::set_step)))
        .service(web::resource("/draft/validate").route(web::post().to(drafts::validate_draft)))
        .service(web::resource("/draft/save").route(web::post().to(drafts::save_draft)))
        .service(
            web::resource("/biodata")
                .route(web::get().to(saved::list_biodata))
                .route(web::post().to(saved::save_biodata)),
        )
        .service(
            web::resource("/biodata/{id}")
                .route(web::get().to(saved::get_biodata))
                .route(web::delete().to(saved::delete_biodata)),
        )
        .service(web::resource("/biodata/{id}/edit").route(web::post().to(saved::edit_biodata)))
        .service(web::resource("/biodata/{id}/photo").route(web::post().to(saved::upload_photo)));
}

/// Locally stored photos, outside `/api`.
pub fn images(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::resource("/images/{filename:.*}").route(web::get().to(handlers::serve_image)),
    );
}
