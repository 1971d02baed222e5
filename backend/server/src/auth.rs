//! Token and password primitives plus the bearer-token extractor.
//!
//! Tokens are HS256 JWTs carrying the user's id, username and role, expiring
//! after eight hours. Customer routes take an [`AuthUser`] argument, which is
//! where the guard happens; routes without it are open.

use std::sync::Arc;

use axum::{extract::FromRequestParts, http::header::AUTHORIZATION, http::request::Parts};
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use store::model::{Role, User};

use crate::{error::AppError, state::AppState};

const TOKEN_LIFETIME_HOURS: i64 = 8;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub id: String,
    pub username: String,
    pub role: Role,
    pub exp: i64,
}

pub fn generate_token(user: &User, secret: &str) -> Result<String, jsonwebtoken::errors::Error> {
    let claims = Claims {
        id: user.user_id.clone(),
        username: user.username.clone(),
        role: user.role,
        exp: (Utc::now() + Duration::hours(TOKEN_LIFETIME_HOURS)).timestamp(),
    };
    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
}

pub fn verify_token(token: &str, secret: &str) -> Result<Claims, jsonwebtoken::errors::Error> {
    decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map(|data| data.claims)
}

pub fn hash_password(password: &str) -> Result<String, bcrypt::BcryptError> {
    bcrypt::hash(password, 10)
}

pub fn verify_password(password: &str, hash: &str) -> bool {
    bcrypt::verify(password, hash).unwrap_or(false)
}

/// Claims of the authenticated caller, extracted from the `Authorization:
/// Bearer` header.
pub struct AuthUser(pub Claims);

impl FromRequestParts<Arc<AppState>> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let header = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .ok_or(AppError::Unauthorized)?;
        let token = header.strip_prefix("Bearer ").ok_or(AppError::Unauthorized)?;
        let claims = verify_token(token, &state.config.auth_secret)
            .map_err(|_| AppError::Unauthorized)?;
        Ok(AuthUser(claims))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use store::model::Profile;

    fn user() -> User {
        User {
            user_id: "USER-1".to_owned(),
            username: "frontdesk".to_owned(),
            password_hash: String::new(),
            email: "frontdesk@example.com".to_owned(),
            role: Role::Admin,
            created_at: Utc::now(),
            updated_at: Utc::now(),
            profile: Profile::default(),
        }
    }

    #[test]
    fn token_round_trips_claims() {
        let token = generate_token(&user(), "secret").expect("sign");
        let claims = verify_token(&token, "secret").expect("verify");
        assert_eq!(claims.id, "USER-1");
        assert_eq!(claims.username, "frontdesk");
        assert_eq!(claims.role, Role::Admin);
    }

    #[test]
    fn token_rejects_wrong_secret() {
        let token = generate_token(&user(), "secret").expect("sign");
        assert!(verify_token(&token, "other").is_err());
    }

    #[test]
    fn password_hash_verifies() {
        let hash = hash_password("Work$hop1").expect("hash");
        assert!(verify_password("Work$hop1", &hash));
        assert!(!verify_password("Work$hop2", &hash));
    }
}
