//! Shared application state.

use std::sync::Arc;
use std::time::Duration;

use tillpoint_core::SaleEngine;
use tillpoint_db::{Database, SqliteSaleStore};

use crate::auth::JwtManager;
use crate::config::{ApiConfig, AppEnv};

/// Cloned into every handler. Everything inside is a cheap handle.
#[derive(Clone)]
pub struct AppState {
    pub db: Database,
    pub engine: Arc<SaleEngine<SqliteSaleStore>>,
    pub jwt: JwtManager,
    pub sale_timeout: Duration,
    pub app_env: AppEnv,
}

impl AppState {
    pub fn new(db: Database, config: &ApiConfig) -> Self {
        let engine = Arc::new(SaleEngine::new(db.sale_store()));
        AppState {
            db,
            engine,
            jwt: JwtManager::new(
                &config.jwt_secret,
                config.jwt_access_lifetime_secs,
                config.jwt_refresh_lifetime_secs,
            ),
            sale_timeout: config.sale_timeout,
            app_env: config.app_env,
        }
    }
}
