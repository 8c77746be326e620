//! Biodata saved to the caller's account.

use actix_multipart::Multipart;
use actix_web::http::StatusCode;
use actix_web::{web, HttpRequest, HttpResponse, Responder};
use futures_util::TryStreamExt;
use log::{error, info, warn};
use sanitize_filename::sanitize;

use super::drafts::{draft_worker_failed, with_store, DraftSession};
use super::models::{DraftResponse, PhotoUrl, RecordBody, SavedId, UploadPhotoRequest};
use crate::auth::current_user;
use crate::persistence::PersistenceError;
use crate::photo;
use crate::service::{ActionResult, ServiceError};
use crate::AppState;

const MAX_PHOTO_BYTES: usize = 10 * 1024 * 1024;

/// Map a service failure onto a status and an `{success: false}` body.
pub(crate) fn service_failure(e: ServiceError) -> HttpResponse {
    let status = match &e {
        ServiceError::Unauthenticated => StatusCode::UNAUTHORIZED,
        ServiceError::PermissionDenied(_) => StatusCode::FORBIDDEN,
        ServiceError::Persistence(PersistenceError::NotFound(_)) => StatusCode::NOT_FOUND,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    };
    if status.is_server_error() {
        error!("Biodata service failed: {}", e);
    }
    HttpResponse::build(status).json(ActionResult::<()>::err(e.to_string()))
}

#[utoipa::path(
    context_path = "/api",
    tag = "Saved Biodata",
    get,
    path = "/biodata",
    responses(
        (status = 200, description = "The caller's biodata, most recently updated first"),
        (status = 401, description = "Local-only mode")
    )
)]
pub async fn list_biodata(req: HttpRequest, state: web::Data<AppState>) -> impl Responder {
    let user = current_user(&req, &state.jwt);
    match state.service.list(user.as_ref()).await {
        Ok(records) => HttpResponse::Ok().json(ActionResult::ok(records)),
        Err(e) => service_failure(e),
    }
}

#[utoipa::path(
    context_path = "/api",
    tag = "Saved Biodata",
    post,
    path = "/biodata",
    request_body(content = RecordBody, content_type = "application/json"),
    responses(
        (status = 200, description = "Created, or updated when the record carries an id", body = SavedId),
        (status = 401, description = "Local-only mode"),
        (status = 403, description = "The record belongs to someone else")
    )
)]
pub async fn save_biodata(
    req: HttpRequest,
    state: web::Data<AppState>,
    body: web::Json<RecordBody>,
) -> impl Responder {
    let user = current_user(&req, &state.jwt);
    match state.service.save(user.as_ref(), body.into_inner().0).await {
        Ok(id) => HttpResponse::Ok().json(ActionResult::ok(SavedId { id })),
        Err(e) => service_failure(e),
    }
}

#[utoipa::path(
    context_path = "/api",
    tag = "Saved Biodata",
    get,
    path = "/biodata/{id}",
    responses(
        (status = 200, description = "Biodata found"),
        (status = 403, description = "The record belongs to someone else"),
        (status = 404, description = "Biodata not found")
    ),
    params(
        ("id" = String, Path, description = "ID of the biodata")
    )
)]
pub async fn get_biodata(
    req: HttpRequest,
    state: web::Data<AppState>,
    path: web::Path<String>,
) -> impl Responder {
    let user = current_user(&req, &state.jwt);
    match state.service.get(user.as_ref(), &path).await {
        Ok(record) => HttpResponse::Ok().json(ActionResult::ok(record)),
        Err(e) => service_failure(e),
    }
}

#[utoipa::path(
    context_path = "/api",
    tag = "Saved Biodata",
    delete,
    path = "/biodata/{id}",
    responses(
        (status = 200, description = "Biodata and its photo deleted"),
        (status = 403, description = "The record belongs to someone else"),
        (status = 404, description = "Biodata not found")
    ),
    params(
        ("id" = String, Path, description = "ID of the biodata")
    )
)]
pub async fn delete_biodata(
    req: HttpRequest,
    state: web::Data<AppState>,
    path: web::Path<String>,
) -> impl Responder {
    let user = current_user(&req, &state.jwt);
    let id = path.into_inner();
    match state.service.delete(user.as_ref(), &id).await {
        Ok(()) => {
            info!("Deleted biodata {}", id);
            HttpResponse::Ok().json(ActionResult::ok(SavedId { id }))
        }
        Err(e) => service_failure(e),
    }
}

#[utoipa::path(
    context_path = "/api",
    tag = "Saved Biodata",
    post,
    path = "/biodata/{id}/edit",
    responses(
        (status = 200, description = "Saved biodata loaded into the draft", body = DraftResponse),
        (status = 403, description = "The record belongs to someone else"),
        (status = 404, description = "Biodata not found")
    ),
    params(
        ("id" = String, Path, description = "ID of the biodata")
    )
)]
pub async fn edit_biodata(
    req: HttpRequest,
    state: web::Data<AppState>,
    path: web::Path<String>,
) -> impl Responder {
    let Some(user) = current_user(&req, &state.jwt) else {
        return service_failure(ServiceError::Unauthenticated);
    };
    match state.service.get(Some(&user), &path).await {
        Ok(record) => {
            let draft = DraftSession::of_user(&user.uid).draft(&state).await;
            let loaded = with_store(draft, move |store| {
                store.load(record);
                DraftResponse::from(&*store)
            })
            .await;
            match loaded {
                Ok(response) => HttpResponse::Ok().json(response),
                Err(e) => draft_worker_failed(e),
            }
        }
        Err(e) => service_failure(e),
    }
}

/// First `file` part of the form: sanitized filename and bytes.
async fn read_photo(mut payload: Multipart) -> Result<(String, Vec<u8>), String> {
    while let Some(mut field) = payload.try_next().await.map_err(|e| e.to_string())? {
        let content_disposition = field
            .content_disposition()
            .ok_or("Content-Disposition not set")?;
        if content_disposition.get_name() != Some("file") {
            continue;
        }
        let filename = content_disposition
            .get_filename()
            .map(sanitize)
            .ok_or_else(|| "No filename".to_string())?;

        let mut data = Vec::new();
        while let Some(chunk) = field.try_next().await.map_err(|e| e.to_string())? {
            if data.len() + chunk.len() > MAX_PHOTO_BYTES {
                return Err(format!("Photo exceeds {} bytes", MAX_PHOTO_BYTES));
            }
            data.extend_from_slice(&chunk);
        }
        return Ok((filename, data));
    }
    Err("No file part in form".to_string())
}

#[utoipa::path(
    context_path = "/api",
    tag = "Saved Biodata",
    post,
    path = "/biodata/{id}/photo",
    request_body(content = inline(UploadPhotoRequest), content_type = "multipart/form-data"),
    responses(
        (status = 200, description = "Photo stored and linked to the biodata", body = PhotoUrl),
        (status = 400, description = "Missing or undecodable image"),
        (status = 403, description = "The record belongs to someone else"),
        (status = 404, description = "Biodata not found")
    ),
    params(
        ("id" = String, Path, description = "ID of the biodata")
    )
)]
pub async fn upload_photo(
    req: HttpRequest,
    state: web::Data<AppState>,
    path: web::Path<String>,
    payload: Multipart,
) -> impl Responder {
    let (filename, data) = match read_photo(payload).await {
        Ok(upload) => upload,
        Err(e) => {
            warn!("Rejected photo upload: {}", e);
            return HttpResponse::BadRequest().json(ActionResult::<()>::err(e));
        }
    };
    if let Err(e) = photo::dimensions(&data) {
        warn!("Rejected photo upload {}: {}", filename, e);
        return HttpResponse::BadRequest().json(ActionResult::<()>::err(e.to_string()));
    }

    let user = current_user(&req, &state.jwt);
    match state
        .service
        .attach_photo(user.as_ref(), &path, &filename, &data)
        .await
    {
        Ok(url) => HttpResponse::Ok().json(ActionResult::ok(PhotoUrl { url })),
        Err(e) => service_failure(e),
    }
}
