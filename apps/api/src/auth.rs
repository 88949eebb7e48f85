//! JWT authentication module.
//!
//! Handles token generation and validation, and turns a verified bearer
//! token into the request's [`Actor`].

use axum::async_trait;
use axum::extract::FromRequestParts;
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use tillpoint_core::{Actor, Role};
use uuid::Uuid;

use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

const ACCESS: &str = "access";
const REFRESH: &str = "refresh";

/// JWT claims structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (user id)
    pub sub: String,

    pub role: Role,

    /// Issued at (Unix timestamp)
    pub iat: i64,

    /// Expiration (Unix timestamp)
    pub exp: i64,

    /// JWT ID (unique identifier for this token)
    pub jti: String,

    /// Token type ("access" or "refresh")
    pub token_type: String,
}

impl Claims {
    pub fn actor(&self) -> Actor {
        Actor {
            user_id: self.sub.clone(),
            role: self.role,
        }
    }
}

/// JWT token manager (HS256).
#[derive(Clone)]
pub struct JwtManager {
    encoding: EncodingKey,
    decoding: DecodingKey,
    access_lifetime_secs: i64,
    refresh_lifetime_secs: i64,
}

impl JwtManager {
    pub fn new(secret: &str, access_lifetime_secs: i64, refresh_lifetime_secs: i64) -> Self {
        JwtManager {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            access_lifetime_secs,
            refresh_lifetime_secs,
        }
    }

    pub fn access_lifetime_secs(&self) -> i64 {
        self.access_lifetime_secs
    }

    pub fn generate_access_token(&self, actor: &Actor) -> ApiResult<String> {
        self.generate(actor, ACCESS, self.access_lifetime_secs)
    }

    pub fn generate_refresh_token(&self, actor: &Actor) -> ApiResult<String> {
        self.generate(actor, REFRESH, self.refresh_lifetime_secs)
    }

    fn generate(&self, actor: &Actor, token_type: &str, lifetime_secs: i64) -> ApiResult<String> {
        let now = Utc::now();
        let claims = Claims {
            sub: actor.user_id.clone(),
            role: actor.role,
            iat: now.timestamp(),
            exp: (now + Duration::seconds(lifetime_secs)).timestamp(),
            jti: Uuid::new_v4().to_string(),
            token_type: token_type.to_string(),
        };

        encode(&Header::default(), &claims, &self.encoding)
            .map_err(|e| ApiError::internal(format!("Failed to generate {token_type} token: {e}")))
    }

    /// Validate and decode a token of any type.
    pub fn validate_token(&self, token: &str) -> ApiResult<Claims> {
        decode::<Claims>(token, &self.decoding, &Validation::default())
            .map(|data| data.claims)
            .map_err(|e| match e.kind() {
                jsonwebtoken::errors::ErrorKind::ExpiredSignature => {
                    ApiError::unauthorized("Token expired")
                }
                _ => ApiError::unauthorized("Invalid token"),
            })
    }

    pub fn validate_access_token(&self, token: &str) -> ApiResult<Claims> {
        self.validate_typed(token, ACCESS)
    }

    pub fn validate_refresh_token(&self, token: &str) -> ApiResult<Claims> {
        self.validate_typed(token, REFRESH)
    }

    fn validate_typed(&self, token: &str, expected: &str) -> ApiResult<Claims> {
        let claims = self.validate_token(token)?;
        if claims.token_type != expected {
            return Err(ApiError::unauthorized(format!("Expected {expected} token")));
        }
        Ok(claims)
    }
}

/// Extract bearer token from authorization header.
pub fn extract_bearer_token(auth_header: &str) -> Option<&str> {
    auth_header
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|t| !t.is_empty())
}

/// The authenticated caller, taken from a valid access token.
#[derive(Debug, Clone)]
pub struct CurrentActor(pub Actor);

#[async_trait]
impl FromRequestParts<AppState> for CurrentActor {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let token = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .and_then(extract_bearer_token)
            .ok_or_else(|| ApiError::unauthorized("Access token required"))?;

        let claims = state.jwt.validate_access_token(token)?;
        Ok(CurrentActor(claims.actor()))
    }
}

/// Product mutations are limited to admins and inventory managers.
pub fn require_inventory_role(actor: &Actor) -> ApiResult<()> {
    if actor.role.can_manage_inventory() {
        Ok(())
    } else {
        Err(ApiError::forbidden("Insufficient permissions"))
    }
}

/// Account management is admin only.
pub fn require_admin(actor: &Actor) -> ApiResult<()> {
    if actor.role == Role::Admin {
        Ok(())
    } else {
        Err(ApiError::forbidden("Insufficient permissions"))
    }
}
