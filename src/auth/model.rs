use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// JWT claims issued by the identity provider.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String, // opaque user id
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub picture: Option<String>,
    pub exp: usize,
    pub iat: usize,
}

/// Signed-in user as seen by the rest of the app.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CurrentUser {
    pub uid: String,
    pub display_name: Option<String>,
    pub email: Option<String>,
    pub photo_url: Option<String>,
}

impl From<Claims> for CurrentUser {
    fn from(claims: Claims) -> Self {
        Self {
            uid: claims.sub,
            display_name: claims.name,
            email: claims.email,
            photo_url: claims.picture,
        }
    }
}

/// Identity state. Without a user the app runs in local-only mode.
///
/// `Loading` is what a client holds before its first identity check
/// completes; the server itself only reports the other two.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
#[serde(tag = "status", content = "user", rename_all = "camelCase")]
pub enum AuthState {
    #[default]
    Loading,
    Unauthenticated,
    Authenticated(CurrentUser),
}

impl AuthState {
    pub fn user(&self) -> Option<&CurrentUser> {
        match self {
            Self::Authenticated(user) => Some(user),
            _ => None,
        }
    }

    pub fn is_local_only(&self) -> bool {
        self.user().is_none()
    }
}
