//! Shared harness: an in-memory app, seeded users and request helpers.

#![allow(dead_code)]

use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::Value;
use tillpoint_api::{build_router, ApiConfig, AppState};
use tillpoint_core::{Actor, Role};
use tillpoint_db::{Database, NewUser};
use tower::ServiceExt;

pub struct TestApp {
    pub router: Router,
    pub state: AppState,
    pub admin: Actor,
    pub cashier: Actor,
}

impl TestApp {
    pub async fn new() -> Self {
        let config = ApiConfig::for_tests();
        let db = Database::new(config.db_config()).await.unwrap();

        let admin = create_user(&db, "Admin User", "admin@pos.com", "admin123", Role::Admin).await;
        let cashier =
            create_user(&db, "Cashier User", "cashier@pos.com", "cashier123", Role::Cashier).await;

        let state = AppState::new(db, &config);
        let router = build_router(state.clone(), &config);
        TestApp {
            router,
            state,
            admin,
            cashier,
        }
    }

    pub fn token(&self, actor: &Actor) -> String {
        self.state.jwt.generate_access_token(actor).unwrap()
    }

    pub async fn send(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        let request = match body {
            Some(json) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(json.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let json = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, json)
    }

    pub async fn get(&self, uri: &str, actor: &Actor) -> (StatusCode, Value) {
        let token = self.token(actor);
        self.send(Method::GET, uri, Some(&token), None).await
    }

    pub async fn post(&self, uri: &str, actor: &Actor, body: Value) -> (StatusCode, Value) {
        let token = self.token(actor);
        self.send(Method::POST, uri, Some(&token), Some(body)).await
    }

    /// Creates a product as admin and returns its id.
    pub async fn create_product(&self, sku: &str, name: &str, price: &str, stock: i64) -> String {
        let (status, body) = self
            .post(
                "/api/products",
                &self.admin,
                serde_json::json!({
                    "sku": sku,
                    "name": name,
                    "category": "General",
                    "price": price,
                    "costPrice": "1.00",
                    "stockQty": stock,
                }),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "{body}");
        body["data"]["product"]["id"].as_str().unwrap().to_string()
    }
}

async fn create_user(db: &Database, name: &str, email: &str, password: &str, role: Role) -> Actor {
    let user = db
        .users()
        .create(NewUser {
            name: name.to_string(),
            email: email.to_string(),
            password: password.to_string(),
            role,
        })
        .await
        .unwrap();
    Actor {
        user_id: user.id,
        role,
    }
}
