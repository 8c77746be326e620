//! Unit tests for authentication module

use actix_web::test::TestRequest;

use super::*;

fn user() -> CurrentUser {
    CurrentUser {
        uid: "uid-42".into(),
        display_name: Some("Asha".into()),
        email: Some("asha@example.com".into()),
        photo_url: None,
    }
}

#[test]
fn test_issue_and_validate_token() {
    let keys = JwtKeys::new("test-secret");
    let token = keys.issue(&user()).expect("Failed to issue token");
    let claims = keys.validate(&token).expect("Failed to validate token");

    assert_eq!(claims.sub, "uid-42");
    assert_eq!(claims.email.as_deref(), Some("asha@example.com"));
    assert!(claims.exp > claims.iat);
    assert_eq!(CurrentUser::from(claims), user());
}

#[test]
fn test_token_from_other_secret_is_rejected() {
    let token = JwtKeys::new("one").issue(&user()).unwrap();
    assert!(JwtKeys::new("two").validate(&token).is_err());
    assert!(JwtKeys::new("one").validate("invalid.token.here").is_err());
}

#[test]
fn test_request_without_token_is_local_only() {
    let keys = JwtKeys::new("s");
    let req = TestRequest::default().to_http_request();
    let state = auth_state(&req, &keys);
    assert_eq!(state, AuthState::Unauthenticated);
    assert!(state.is_local_only());
}

#[test]
fn test_bearer_token_authenticates() {
    let keys = JwtKeys::new("s");
    let token = keys.issue(&user()).unwrap();
    let req = TestRequest::default()
        .insert_header(("Authorization", format!("Bearer {token}")))
        .to_http_request();
    assert_eq!(current_user(&req, &keys), Some(user()));
}

#[test]
fn test_bad_token_degrades_to_unauthenticated() {
    let keys = JwtKeys::new("s");
    let req = TestRequest::default()
        .insert_header(("Authorization", "Bearer garbage"))
        .to_http_request();
    assert_eq!(auth_state(&req, &keys), AuthState::Unauthenticated);
}

#[test]
fn test_auth_state_wire_shape() {
    assert_eq!(
        serde_json::to_value(AuthState::default()).unwrap(),
        serde_json::json!({ "status": "loading" })
    );
    let value = serde_json::to_value(AuthState::Authenticated(user())).unwrap();
    assert_eq!(value["status"], "authenticated");
    assert_eq!(value["user"]["uid"], "uid-42");
    assert_eq!(value["user"]["displayName"], "Asha");
}
