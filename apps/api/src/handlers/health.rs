use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::warn;

use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct Health {
    pub success: bool,
    pub message: &'static str,
    pub database: &'static str,
    pub timestamp: DateTime<Utc>,
    pub environment: &'static str,
}

/// Liveness plus a database round trip. 503 when the database is down.
pub async fn health(State(state): State<AppState>) -> Response {
    let db_ok = state.db.health_check().await;
    if !db_ok {
        warn!("Health check failed: database unreachable");
    }

    let body = Health {
        success: db_ok,
        message: if db_ok {
            "POS System API is running"
        } else {
            "Database unavailable"
        },
        database: if db_ok { "connected" } else { "disconnected" },
        timestamp: Utc::now(),
        environment: state.app_env.as_str(),
    };
    let status = if db_ok {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };
    (status, Json(body)).into_response()
}
