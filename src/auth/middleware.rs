use actix_web::HttpRequest;

use super::jwt::JwtKeys;
use super::model::{AuthState, CurrentUser};

/// Extract token from Authorization header
fn extract_token(req: &HttpRequest) -> Option<&str> {
    req.headers()
        .get("Authorization")
        .and_then(|h| h.to_str().ok())
        .and_then(|auth| auth.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty())
}

/// Identity of the caller. A missing or invalid token means local-only mode,
/// never an error.
pub fn auth_state(req: &HttpRequest, keys: &JwtKeys) -> AuthState {
    let Some(token) = extract_token(req) else {
        return AuthState::Unauthenticated;
    };
    match keys.validate(token) {
        Ok(claims) => AuthState::Authenticated(CurrentUser::from(claims)),
        Err(e) => {
            log::warn!("Token validation failed: {:?}", e);
            AuthState::Unauthenticated
        }
    }
}

/// Signed-in user, if any.
pub fn current_user(req: &HttpRequest, keys: &JwtKeys) -> Option<CurrentUser> {
    match auth_state(req, keys) {
        AuthState::Authenticated(user) => Some(user),
        _ => None,
    }
}
