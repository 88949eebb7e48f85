//! # tillpoint-api
//!
//! REST server for Tillpoint POS.
//!
//! ## Architecture
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Tillpoint API Server                            │
//! │                                                                         │
//! │  Dashboard ───► axum (3001) ───► handlers ───► SaleEngine ───► SQLite   │
//! │                   │                  │                                  │
//! │                   ▼                  └──► repositories (reads, CRUD)    │
//! │           TraceLayer, CORS,                                             │
//! │           bearer auth (Actor)                                           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Configuration
//! Environment variables (a `.env` file is honoured):
//! - `APP_ENV` - `development` (default) or `production`
//! - `HTTP_PORT` - HTTP port (default: 3001)
//! - `DATABASE_PATH` - SQLite file (default: ./data/tillpoint.db)
//! - `JWT_SECRET` - HS256 signing secret, required in production
//! - `CORS_ORIGIN` - allowed browser origin (default: http://localhost:3000)
//! - `SALE_TIMEOUT_SECS` - upper bound on one sale commit (default: 10)

pub mod auth;
pub mod config;
pub mod error;
pub mod extract;
pub mod handlers;
pub mod response;
pub mod routes;
pub mod state;
pub mod views;

pub use config::{ApiConfig, AppEnv};
pub use error::{ApiError, ApiResult};
pub use routes::build_router;
pub use state::AppState;
