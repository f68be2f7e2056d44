//! Bearer-token authentication.
//!
//! Tokens are issued by the external identity provider; this side only
//! verifies the HS256 signature with the shared secret and resolves the
//! `sub` claim to a user id. Every protected handler takes [`AuthUser`] as
//! an extractor.

use crate::error::ApiError;
use crate::state::AppState;
use axum::async_trait;
use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    /// User id.
    pub sub: String,
    /// Expiry, unix seconds.
    pub exp: usize,
}

/// The authenticated user id for this request.
pub struct AuthUser(pub String);

pub fn verify_token(token: &str, key: &DecodingKey) -> Result<String, ApiError> {
    let data = decode::<Claims>(token, key, &Validation::new(Algorithm::HS256))
        .map_err(|_| ApiError::unauthorized())?;
    Ok(data.claims.sub)
}

#[async_trait]
impl FromRequestParts<AppState> for AuthUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let header = parts
            .headers
            .get(axum::http::header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .ok_or_else(ApiError::unauthorized)?;
        let token = header
            .strip_prefix("Bearer ")
            .ok_or_else(ApiError::unauthorized)?;
        let uid = verify_token(token, &state.decoding_key)?;
        Ok(AuthUser(uid))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use jsonwebtoken::{encode, EncodingKey, Header};

    fn token(secret: &str, sub: &str, exp: usize) -> String {
        encode(
            &Header::default(),
            &Claims {
                sub: sub.to_string(),
                exp,
            },
            &EncodingKey::from_secret(secret.as_bytes()),
        )
        .expect("encode")
    }

    #[test]
    fn valid_token_resolves_to_user_id() {
        let key = DecodingKey::from_secret(b"s");
        let t = token("s", "u1", 4_000_000_000);
        assert_eq!(verify_token(&t, &key).unwrap(), "u1");
    }

    #[test]
    fn wrong_secret_is_rejected() {
        let key = DecodingKey::from_secret(b"other");
        let t = token("s", "u1", 4_000_000_000);
        assert!(verify_token(&t, &key).is_err());
    }
}
