//! `/api/auth`: login, logout, token refresh, the caller's profile and
//! admin-only account registration.

use axum::extract::State;
use serde::{Deserialize, Serialize};
use tillpoint_core::validation::{validate_email, validate_name, validate_password};
use tillpoint_core::{Role, User, ValidationError};
use tillpoint_db::{DbError, NewUser};
use tracing::{info, warn};

use crate::auth::{require_admin, CurrentActor};
use crate::error::{ApiError, ApiResult, ErrorCode};
use crate::extract::ApiJson;
use crate::response::ApiResponse;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct LoginBody {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct RegisterBody {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
    /// Defaults to `CASHIER`.
    pub role: Option<Role>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshBody {
    #[serde(default)]
    pub refresh_token: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginData {
    pub user: User,
    pub access_token: String,
    pub refresh_token: String,
    pub expires_in: i64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshData {
    pub access_token: String,
    pub expires_in: i64,
}

#[derive(Debug, Serialize)]
pub struct ProfileData {
    pub user: User,
}

#[derive(Debug, Serialize)]
pub struct RegisterData {
    pub user: User,
}

pub async fn login(
    State(state): State<AppState>,
    ApiJson(body): ApiJson<LoginBody>,
) -> ApiResult<ApiResponse<LoginData>> {
    validate_email(body.email.trim())?;
    if body.password.is_empty() {
        return Err(ApiError::invalid("Password required"));
    }

    let Some(user) = state
        .db
        .users()
        .verify_credentials(&body.email, &body.password)
        .await?
    else {
        warn!(email = %body.email.trim(), "Failed login");
        return Err(ApiError::unauthorized("Invalid credentials"));
    };

    let actor = tillpoint_core::Actor {
        user_id: user.id.clone(),
        role: user.role,
    };
    let data = LoginData {
        access_token: state.jwt.generate_access_token(&actor)?,
        refresh_token: state.jwt.generate_refresh_token(&actor)?,
        expires_in: state.jwt.access_lifetime_secs(),
        user,
    };

    info!(user_id = %actor.user_id, role = actor.role.as_str(), "User logged in");
    Ok(ApiResponse::ok(data).with_message("Login successful"))
}

pub async fn refresh(
    State(state): State<AppState>,
    ApiJson(body): ApiJson<RefreshBody>,
) -> ApiResult<ApiResponse<RefreshData>> {
    if body.refresh_token.trim().is_empty() {
        return Err(ApiError::invalid("Refresh token required"));
    }
    let claims = state.jwt.validate_refresh_token(body.refresh_token.trim())?;

    // The account may have been disabled since the token was issued.
    let user = state
        .db
        .users()
        .get(&claims.sub)
        .await?
        .filter(|u| u.is_active)
        .ok_or_else(|| ApiError::unauthorized("Invalid token"))?;

    let actor = tillpoint_core::Actor {
        user_id: user.id,
        role: user.role,
    };
    Ok(ApiResponse::ok(RefreshData {
        access_token: state.jwt.generate_access_token(&actor)?,
        expires_in: state.jwt.access_lifetime_secs(),
    }))
}

pub async fn profile(
    State(state): State<AppState>,
    CurrentActor(actor): CurrentActor,
) -> ApiResult<ApiResponse<ProfileData>> {
    let user = state
        .db
        .users()
        .get(&actor.user_id)
        .await?
        .ok_or_else(|| ApiError::not_found("User not found"))?;

    Ok(ApiResponse::ok(ProfileData { user }))
}

pub async fn register(
    State(state): State<AppState>,
    CurrentActor(actor): CurrentActor,
    ApiJson(body): ApiJson<RegisterBody>,
) -> ApiResult<ApiResponse<RegisterData>> {
    require_admin(&actor)?;

    let name = body.name.trim().to_string();
    validate_name("name", &name)?;
    if name.chars().count() < 2 {
        return Err(ValidationError::TooShort {
            field: "name".to_string(),
            min: 2,
        }
        .into());
    }
    validate_email(&body.email)?;
    validate_password(&body.password)?;

    let role = body.role.unwrap_or(Role::Cashier);
    let user = state
        .db
        .users()
        .create(NewUser {
            name,
            email: body.email,
            password: body.password,
            role,
        })
        .await
        .map_err(|e| match e {
            DbError::UniqueViolation { .. } => {
                ApiError::new(ErrorCode::Conflict, "User with this email already exists")
            }
            other => other.into(),
        })?;

    info!(user_id = %user.id, role = role.as_str(), created_by = %actor.user_id, "User registered");
    Ok(ApiResponse::created(
        "User registered successfully",
        RegisterData { user },
    ))
}

/// Tokens are stateless; the client discards them.
pub async fn logout() -> ApiResponse<()> {
    ApiResponse::message("Logout successful")
}
