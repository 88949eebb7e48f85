//! Route table and middleware stack.

use axum::http::{header, HeaderValue, Method, Uri};
use axum::middleware;
use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::warn;

use crate::config::ApiConfig;
use crate::error::{expose_error_detail, ApiError};
use crate::handlers::{auth, customers, health, products, reports, sales};
use crate::state::AppState;

/// Builds the full application router.
pub fn build_router(state: AppState, config: &ApiConfig) -> Router {
    let api = Router::new()
        .route("/auth/login", post(auth::login))
        .route("/auth/register", post(auth::register))
        .route("/auth/logout", post(auth::logout))
        .route("/auth/refresh", post(auth::refresh))
        .route("/auth/profile", get(auth::profile))
        .route("/products", get(products::list).post(products::create))
        .route("/products/categories", get(products::categories))
        .route("/products/low-stock", get(products::low_stock))
        .route(
            "/products/:id",
            get(products::get)
                .put(products::update)
                .delete(products::delete),
        )
        .route("/customers", get(customers::list).post(customers::create))
        .route(
            "/customers/:id",
            get(customers::get)
                .put(customers::update)
                .delete(customers::delete),
        )
        .route("/sales", get(sales::list).post(sales::create))
        .route("/sales/daily", get(sales::daily))
        .route("/sales/:id", get(sales::get))
        .route("/reports/sales", get(reports::sales))
        .route("/reports/inventory", get(reports::inventory))
        .route("/reports/dashboard", get(reports::dashboard));

    let mut router = Router::new()
        .route("/health", get(health::health))
        .nest("/api", api)
        .fallback(route_not_found)
        .with_state(state);

    if config.app_env.is_development() {
        router = router.layer(middleware::map_response(expose_error_detail));
    }

    router
        .layer(cors_layer(&config.cors_origin))
        .layer(TraceLayer::new_for_http())
}

fn cors_layer(origin: &str) -> CorsLayer {
    let cors = CorsLayer::new()
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
        .allow_credentials(true);

    match origin.parse::<HeaderValue>() {
        Ok(value) => cors.allow_origin(value),
        Err(_) => {
            warn!(origin, "Ignoring invalid CORS origin");
            cors
        }
    }
}

async fn route_not_found(uri: Uri) -> ApiError {
    ApiError::not_found(format!("Route not found - {uri}"))
}
