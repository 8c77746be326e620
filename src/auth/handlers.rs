use actix_web::{web, HttpRequest, HttpResponse, Responder};

use super::middleware::auth_state;
use crate::AppState;

/// Who is calling
#[utoipa::path(
    get,
    path = "/api/auth/me",
    tag = "Authentication",
    responses(
        (status = 200, description = "Identity state: unauthenticated, or authenticated with the current user")
    )
)]
pub async fn get_auth_state(req: HttpRequest, state: web::Data<AppState>) -> impl Responder {
    HttpResponse::Ok().json(auth_state(&req, &state.jwt))
}
