//! The working draft of the current session.
//!
//! Signed-in users get one draft per account. Anonymous callers are told
//! apart by the `X-Draft-Session` header; a caller without one is given a
//! fresh id in that response header and should send it back from then on.

use actix_web::error::BlockingError;
use actix_web::http::StatusCode;
use actix_web::{web, HttpRequest, HttpResponse, HttpResponseBuilder, Responder};
use lazy_static::lazy_static;
use log::{error, info, warn};
use regex::Regex;
use serde_json::Value;
use uuid::Uuid;

use super::models::{DraftResponse, PatchBody, RecordBody, SavedId, StepRequest, ValidationReport};
use super::saved::service_failure;
use crate::auth::current_user;
use crate::draft::{DraftSessions, DraftStore, FileDraftStorage, SharedDraft, WizardStep, STEP_COUNT};
use crate::record::RecordPatch;
use crate::service::{ActionResult, ServiceError};
use crate::validation::{validate_record, validate_step, ValidationErrors};
use crate::{AppState, ErrorResponse};

pub const DRAFT_SESSION_HEADER: &str = "X-Draft-Session";

lazy_static! {
    static ref SESSION_ID: Regex = Regex::new(r"^[A-Za-z0-9_-]{8,64}$").expect("static pattern");
}

/// Whose draft a request works on.
pub(crate) struct DraftSession {
    key: String,
    /// Anonymous id echoed back so the caller can keep using it.
    echo: Option<String>,
}

impl DraftSession {
    pub(crate) fn of_user(uid: &str) -> Self {
        Self {
            key: DraftSessions::user_key(uid),
            echo: None,
        }
    }

    fn from_request(req: &HttpRequest, state: &AppState) -> Result<Self, HttpResponse> {
        if let Some(user) = current_user(req, &state.jwt) {
            return Ok(Self::of_user(&user.uid));
        }

        let header = req
            .headers()
            .get(DRAFT_SESSION_HEADER)
            .map(|value| value.to_str().map(str::trim));
        let id = match header {
            None => {
                let id = Uuid::new_v4().simple().to_string();
                info!("Started anonymous draft session {}", id);
                id
            }
            Some(Ok(id)) if SESSION_ID.is_match(id) => id.to_string(),
            Some(_) => {
                return Err(HttpResponse::BadRequest().json(ErrorResponse::bad_request(&format!(
                    "{} must be 8 to 64 letters, digits, '-' or '_'",
                    DRAFT_SESSION_HEADER
                ))))
            }
        };

        Ok(Self {
            key: DraftSessions::anonymous_key(&id),
            echo: Some(id),
        })
    }

    pub(crate) async fn draft(&self, state: &AppState) -> SharedDraft {
        state.drafts.session(&self.key).await
    }

    fn reply(&self, status: StatusCode) -> HttpResponseBuilder {
        let mut builder = HttpResponse::build(status);
        if let Some(id) = &self.echo {
            builder.insert_header((DRAFT_SESSION_HEADER, id.as_str()));
        }
        builder
    }
}

/// Run `f` on the locked store on the blocking pool; the store mirrors
/// itself to disk inside most operations.
pub(crate) async fn with_store<T, F>(draft: SharedDraft, f: F) -> Result<T, BlockingError>
where
    F: FnOnce(&mut DraftStore<FileDraftStorage>) -> T + Send + 'static,
    T: Send + 'static,
{
    web::block(move || f(&mut draft.lock())).await
}

pub(crate) fn draft_worker_failed(e: BlockingError) -> HttpResponse {
    error!("Draft worker failed: {}", e);
    HttpResponse::InternalServerError().json(ErrorResponse::internal_error("Draft worker failed"))
}

macro_rules! session_or_reject {
    ($req:expr, $state:expr) => {
        match DraftSession::from_request(&$req, &$state) {
            Ok(session) => session,
            Err(response) => return response,
        }
    };
}

#[utoipa::path(
    context_path = "/api",
    tag = "Draft",
    get,
    path = "/draft",
    params(
        ("X-Draft-Session" = Option<String>, Header, description = "Anonymous session id; minted and returned when absent")
    ),
    responses(
        (status = 200, description = "Current draft and wizard step", body = DraftResponse),
        (status = 400, description = "Malformed session id", body = ErrorResponse)
    )
)]
pub async fn get_draft(req: HttpRequest, state: web::Data<AppState>) -> impl Responder {
    let session = session_or_reject!(req, state);
    let draft = session.draft(&state).await;
    match with_store(draft, |store| DraftResponse::from(&*store)).await {
        Ok(response) => session.reply(StatusCode::OK).json(response),
        Err(e) => draft_worker_failed(e),
    }
}

#[utoipa::path(
    context_path = "/api",
    tag = "Draft",
    patch,
    path = "/draft",
    request_body(content = PatchBody, content_type = "application/json"),
    responses(
        (status = 200, description = "Draft after the merge", body = DraftResponse),
        (status = 400, description = "Patch does not fit the record shape", body = ErrorResponse)
    )
)]
pub async fn patch_draft(
    req: HttpRequest,
    state: web::Data<AppState>,
    body: web::Json<PatchBody>,
) -> impl Responder {
    let session = session_or_reject!(req, state);
    let patch = body.into_inner().0;
    let draft = session.draft(&state).await;

    let merged = with_store(draft, move |store| {
        if let Err(e) = store.set(&patch) {
            return Err(e.to_string());
        }
        Ok(DraftResponse::from(&*store))
    })
    .await;
    match merged {
        Ok(Ok(response)) => session.reply(StatusCode::OK).json(response),
        Ok(Err(e)) => {
            warn!("Rejected draft patch: {}", e);
            session
                .reply(StatusCode::BAD_REQUEST)
                .json(ErrorResponse::bad_request(&e))
        }
        Err(e) => draft_worker_failed(e),
    }
}

#[utoipa::path(
    context_path = "/api",
    tag = "Draft",
    put,
    path = "/draft",
    request_body(content = RecordBody, content_type = "application/json"),
    responses(
        (status = 200, description = "Draft replaced", body = DraftResponse)
    )
)]
pub async fn replace_draft(
    req: HttpRequest,
    state: web::Data<AppState>,
    body: web::Json<RecordBody>,
) -> impl Responder {
    let session = session_or_reject!(req, state);
    let record = body.into_inner().0;
    let draft = session.draft(&state).await;

    let replaced = with_store(draft, move |store| {
        store.load(record);
        DraftResponse::from(&*store)
    })
    .await;
    match replaced {
        Ok(response) => session.reply(StatusCode::OK).json(response),
        Err(e) => draft_worker_failed(e),
    }
}

#[utoipa::path(
    context_path = "/api",
    tag = "Draft",
    delete,
    path = "/draft",
    responses(
        (status = 200, description = "Draft back to defaults at the first step", body = DraftResponse)
    )
)]
pub async fn reset_draft(req: HttpRequest, state: web::Data<AppState>) -> impl Responder {
    let session = session_or_reject!(req, state);
    let draft = session.draft(&state).await;

    let reset = with_store(draft, |store| {
        store.reset();
        DraftResponse::from(&*store)
    })
    .await;
    match reset {
        Ok(response) => {
            info!("Draft reset");
            session.reply(StatusCode::OK).json(response)
        }
        Err(e) => draft_worker_failed(e),
    }
}

#[utoipa::path(
    context_path = "/api",
    tag = "Draft",
    put,
    path = "/draft/step",
    request_body(content = StepRequest, content_type = "application/json"),
    responses(
        (status = 200, description = "Wizard moved", body = DraftResponse),
        (status = 400, description = "No such step", body = ErrorResponse),
        (status = 422, description = "A step being left has missing required fields", body = ValidationReport)
    )
)]
pub async fn set_step(
    req: HttpRequest,
    state: web::Data<AppState>,
    body: web::Json<StepRequest>,
) -> impl Responder {
    let session = session_or_reject!(req, state);
    let target = body.step;
    if WizardStep::from_index(target).is_none() {
        return session
            .reply(StatusCode::BAD_REQUEST)
            .json(ErrorResponse::bad_request(&format!(
                "Step must be below {}",
                STEP_COUNT
            )));
    }

    let draft = session.draft(&state).await;
    let moved = with_store(draft, move |store| {
        // Going back is always allowed; going forward needs every skipped step filled.
        let mut errors = ValidationErrors::new();
        for step in (store.step()..target).filter_map(WizardStep::from_index) {
            errors.extend(validate_step(store.record(), step));
        }
        if !errors.is_empty() {
            return Err(ValidationReport::from(errors));
        }
        store.set_step(target);
        Ok(DraftResponse::from(&*store))
    })
    .await;

    match moved {
        Ok(Ok(response)) => session.reply(StatusCode::OK).json(response),
        Ok(Err(report)) => session.reply(StatusCode::UNPROCESSABLE_ENTITY).json(report),
        Err(e) => draft_worker_failed(e),
    }
}

#[utoipa::path(
    context_path = "/api",
    tag = "Draft",
    post,
    path = "/draft/validate",
    responses(
        (status = 200, description = "Validation of every step", body = ValidationReport)
    )
)]
pub async fn validate_draft(req: HttpRequest, state: web::Data<AppState>) -> impl Responder {
    let session = session_or_reject!(req, state);
    let draft = session.draft(&state).await;
    match with_store(draft, |store| ValidationReport::from(validate_record(store.record()))).await {
        Ok(report) => session.reply(StatusCode::OK).json(report),
        Err(e) => draft_worker_failed(e),
    }
}

#[utoipa::path(
    context_path = "/api",
    tag = "Draft",
    post,
    path = "/draft/save",
    responses(
        (status = 200, description = "Draft saved to the account", body = SavedId),
        (status = 401, description = "Local-only mode"),
        (status = 422, description = "Required fields are missing", body = ValidationReport)
    )
)]
pub async fn save_draft(req: HttpRequest, state: web::Data<AppState>) -> impl Responder {
    let Some(user) = current_user(&req, &state.jwt) else {
        return service_failure(ServiceError::Unauthenticated);
    };
    let draft = DraftSession::of_user(&user.uid).draft(&state).await;

    let checked = with_store(draft.clone(), |store| {
        let errors = validate_record(store.record());
        if errors.is_empty() {
            Ok(store.record().clone())
        } else {
            Err(ValidationReport::from(errors))
        }
    })
    .await;
    let record = match checked {
        Ok(Ok(record)) => record,
        Ok(Err(report)) => return HttpResponse::UnprocessableEntity().json(report),
        Err(e) => return draft_worker_failed(e),
    };

    match state.service.save(Some(&user), record).await {
        Ok(id) => {
            let mut patch = RecordPatch::new();
            patch.insert("id".to_string(), Value::String(id.clone()));
            let stamped_id = id.clone();
            let stamped = with_store(draft, move |store| {
                if let Err(e) = store.set(&patch) {
                    warn!("Saved biodata {} but could not stamp the draft: {}", stamped_id, e);
                }
            })
            .await;
            if let Err(e) = stamped {
                warn!("Saved biodata {} but the draft worker failed: {}", id, e);
            }
            HttpResponse::Ok().json(ActionResult::ok(SavedId { id }))
        }
        Err(e) => service_failure(e),
    }
}
