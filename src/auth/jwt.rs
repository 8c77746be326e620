use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};

use super::model::{Claims, CurrentUser};

const DEFAULT_JWT_SECRET: &str = "biodata-maker-jwt-secret-change-in-production";
const ACCESS_TOKEN_EXPIRY_SECONDS: i64 = 60 * 60; // 1 hour

/// Shared HMAC secret for identity tokens.
#[derive(Clone)]
pub struct JwtKeys {
    secret: String,
}

impl JwtKeys {
    pub fn new(secret: impl Into<String>) -> Self {
        Self {
            secret: secret.into(),
        }
    }

    /// Secret from `JWT_SECRET`, falling back to a development default.
    pub fn from_secret(secret: Option<String>) -> Self {
        Self::new(secret.unwrap_or_else(|| {
            log::warn!("JWT_SECRET not set, using default secret. SET THIS IN PRODUCTION!");
            DEFAULT_JWT_SECRET.to_string()
        }))
    }

    /// Sign a token for `user`.
    pub fn issue(&self, user: &CurrentUser) -> Result<String, jsonwebtoken::errors::Error> {
        let now = chrono::Utc::now().timestamp() as usize;
        let claims = Claims {
            sub: user.uid.clone(),
            name: user.display_name.clone(),
            email: user.email.clone(),
            picture: user.photo_url.clone(),
            exp: now + ACCESS_TOKEN_EXPIRY_SECONDS as usize,
            iat: now,
        };
        encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(self.secret.as_bytes()),
        )
    }

    /// Validate and decode a token
    pub fn validate(&self, token: &str) -> Result<Claims, jsonwebtoken::errors::Error> {
        let token_data = decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.secret.as_bytes()),
            &Validation::default(),
        )?;
        Ok(token_data.claims)
    }
}
