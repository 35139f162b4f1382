//! Shared test plumbing: in-memory stores and a router factory, so every
//! integration test drives the real router without a database.

#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::{Router, body::Body};
use chrono::{Duration, Utc};
use http::{Method, Request, Response, header};
use http_body_util::BodyExt;
use tower::ServiceExt;
use uuid::Uuid;
use zeroize::Zeroizing;

use tradepost::{
    config::Config,
    error::{AppError, Result},
    models::{
        product::{Product, ProductInput},
        session::Session,
        user::User,
    },
    repositories::{product::ProductStore, session::SessionStore, user::UserStore},
    routes,
    services::tokens::TokenService,
    state::AppState,
};

pub const PRIVATE_PEM: &str = include_str!("../fixtures/jwt_test_key.pem");
pub const PUBLIC_PEM: &str = include_str!("../fixtures/jwt_test_key.pub.pem");
pub const OTHER_PRIVATE_PEM: &str = include_str!("../fixtures/jwt_other_key.pem");
pub const OTHER_PUBLIC_PEM: &str = include_str!("../fixtures/jwt_other_key.pub.pem");

#[derive(Default)]
pub struct MemUserStore {
    users: Mutex<Vec<User>>,
}

impl MemUserStore {
    pub fn count(&self) -> usize {
        self.users.lock().unwrap().len()
    }
}

#[async_trait]
impl UserStore for MemUserStore {
    async fn create(&self, email: &str, name: &str, password_hash: &str) -> Result<User> {
        let mut users = self.users.lock().unwrap();
        if users.iter().any(|user| user.email == email) {
            return Err(AppError::Duplicate("Email already in use".to_string()));
        }
        let now = Utc::now();
        let user = User {
            id: Uuid::new_v4(),
            email: email.to_string(),
            name: name.to_string(),
            password: password_hash.to_string(),
            created_at: now,
            updated_at: now,
        };
        users.push(user.clone());
        Ok(user)
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>> {
        let users = self.users.lock().unwrap();
        Ok(users.iter().find(|user| user.email == email).cloned())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>> {
        let users = self.users.lock().unwrap();
        Ok(users.iter().find(|user| user.id == id).cloned())
    }
}

#[derive(Default)]
pub struct MemSessionStore {
    sessions: Mutex<Vec<Session>>,
}

impl MemSessionStore {
    pub fn count(&self) -> usize {
        self.sessions.lock().unwrap().len()
    }

    /// Every session still marked valid, across all users.
    pub fn list_valid(&self) -> Vec<Session> {
        self.sessions
            .lock()
            .unwrap()
            .iter()
            .filter(|session| session.valid)
            .cloned()
            .collect()
    }
}

#[async_trait]
impl SessionStore for MemSessionStore {
    async fn create(&self, user_id: Uuid, user_agent: Option<&str>) -> Result<Session> {
        let now = Utc::now();
        let session = Session {
            id: Uuid::new_v4(),
            user_id,
            valid: true,
            user_agent: user_agent.map(str::to_string),
            created_at: now,
            updated_at: now,
        };
        self.sessions.lock().unwrap().push(session.clone());
        Ok(session)
    }

    async fn get(&self, id: Uuid) -> Result<Option<Session>> {
        let sessions = self.sessions.lock().unwrap();
        Ok(sessions.iter().find(|session| session.id == id).cloned())
    }

    async fn list_valid_for_user(&self, user_id: Uuid) -> Result<Vec<Session>> {
        let sessions = self.sessions.lock().unwrap();
        Ok(sessions
            .iter()
            .filter(|session| session.user_id == user_id && session.valid)
            .cloned()
            .collect())
    }

    async fn invalidate(&self, id: Uuid) -> Result<()> {
        let mut sessions = self.sessions.lock().unwrap();
        if let Some(session) = sessions.iter_mut().find(|session| session.id == id) {
            session.valid = false;
            session.updated_at = Utc::now();
        }
        Ok(())
    }

    async fn invalidate_all_for_user(&self, user_id: Uuid) -> Result<u64> {
        let mut sessions = self.sessions.lock().unwrap();
        let mut revoked = 0;
        for session in sessions
            .iter_mut()
            .filter(|session| session.user_id == user_id && session.valid)
        {
            session.valid = false;
            session.updated_at = Utc::now();
            revoked += 1;
        }
        Ok(revoked)
    }
}

#[derive(Default)]
pub struct MemProductStore {
    products: Mutex<Vec<Product>>,
}

impl MemProductStore {
    pub fn count(&self) -> usize {
        self.products.lock().unwrap().len()
    }
}

#[async_trait]
impl ProductStore for MemProductStore {
    async fn create(&self, user_id: Uuid, input: &ProductInput) -> Result<Product> {
        let now = Utc::now();
        let product = Product {
            id: Uuid::new_v4(),
            user_id,
            title: input.title.clone(),
            description: input.description.clone(),
            price: input.price,
            image: input.image.clone(),
            created_at: now,
            updated_at: now,
        };
        self.products.lock().unwrap().push(product.clone());
        Ok(product)
    }

    async fn get(&self, id: Uuid) -> Result<Option<Product>> {
        let products = self.products.lock().unwrap();
        Ok(products.iter().find(|product| product.id == id).cloned())
    }

    async fn update(&self, id: Uuid, input: &ProductInput) -> Result<Option<Product>> {
        let mut products = self.products.lock().unwrap();
        let Some(product) = products.iter_mut().find(|product| product.id == id) else {
            return Ok(None);
        };
        product.title = input.title.clone();
        product.description = input.description.clone();
        product.price = input.price;
        product.image = input.image.clone();
        product.updated_at = Utc::now();
        Ok(Some(product.clone()))
    }

    async fn delete(&self, id: Uuid) -> Result<()> {
        let mut products = self.products.lock().unwrap();
        products.retain(|product| product.id != id);
        Ok(())
    }
}

/// The assembled application under test plus direct handles on its stores.
pub struct TestApp {
    pub router: Router,
    pub state: AppState,
    pub users: Arc<MemUserStore>,
    pub sessions: Arc<MemSessionStore>,
    pub products: Arc<MemProductStore>,
}

pub fn test_config() -> Config {
    Config {
        port: 0,
        database_url: "postgres://unused".to_string(),
        // Smallest work factor the config accepts, to keep hashing quick.
        hash_memory_mib: 8,
        access_token_ttl: Duration::minutes(15),
        refresh_token_ttl: Duration::days(365),
        rotate_refresh_tokens: false,
        jwt_private_key: Zeroizing::new(PRIVATE_PEM.to_string()),
        jwt_public_key: PUBLIC_PEM.to_string(),
        cors_allowed_origin: None,
    }
}

pub fn spawn_app() -> TestApp {
    spawn_app_with(test_config())
}

pub fn spawn_app_with(config: Config) -> TestApp {
    let users = Arc::new(MemUserStore::default());
    let sessions = Arc::new(MemSessionStore::default());
    let products = Arc::new(MemProductStore::default());
    let tokens = TokenService::new(&config.jwt_private_key, &config.jwt_public_key).unwrap();

    let state = AppState::with_stores(
        users.clone(),
        sessions.clone(),
        products.clone(),
        tokens,
        config,
    );

    TestApp {
        router: routes::router(state.clone()),
        state,
        users,
        sessions,
        products,
    }
}

pub async fn send(app: &TestApp, request: Request<Body>) -> Response<Body> {
    app.router.clone().oneshot(request).await.unwrap()
}

pub fn json_request(method: Method, uri: &str, body: serde_json::Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

pub fn authed_json_request(
    method: Method,
    uri: &str,
    token: &str,
    body: serde_json::Value,
) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .header(header::AUTHORIZATION, format!("Bearer {token}"))
        .body(Body::from(body.to_string()))
        .unwrap()
}

pub fn bare_request(method: Method, uri: &str) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

pub fn authed_request(method: Method, uri: &str, token: &str) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::AUTHORIZATION, format!("Bearer {token}"))
        .body(Body::empty())
        .unwrap()
}

pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

/// Registers a user through the API and asserts success.
pub async fn register(app: &TestApp, email: &str, name: &str, password: &str) -> serde_json::Value {
    let response = send(
        app,
        json_request(
            Method::POST,
            "/api/users",
            serde_json::json!({
                "email": email,
                "name": name,
                "password": password,
                "passwordConfirmation": password,
            }),
        ),
    )
    .await;
    assert_eq!(response.status(), http::StatusCode::OK);
    body_json(response).await
}

/// Logs in through the API and returns `(access_token, refresh_token)`.
pub async fn login(app: &TestApp, email: &str, password: &str) -> (String, String) {
    let response = send(
        app,
        json_request(
            Method::POST,
            "/api/sessions",
            serde_json::json!({ "email": email, "password": password }),
        ),
    )
    .await;
    assert_eq!(response.status(), http::StatusCode::OK);
    let body = body_json(response).await;
    (
        body["accessToken"].as_str().unwrap().to_string(),
        body["refreshToken"].as_str().unwrap().to_string(),
    )
}

/// Builds a GET /api/sessions request carrying an access token and a refresh
/// token the way a stale client would: expired bearer plus `x-refresh`.
pub fn stale_request(access: &str, refresh: &str) -> Request<Body> {
    Request::builder()
        .method(Method::GET)
        .uri("/api/sessions")
        .header(header::AUTHORIZATION, format!("Bearer {access}"))
        .header("x-refresh", refresh)
        .body(Body::empty())
        .unwrap()
}

/// Mints an already-expired access token for the same session/user as a
/// freshly issued one, far enough in the past to clear the leeway window.
pub fn expire(app: &TestApp, fresh_access: &str) -> String {
    let claims = app.state.tokens.verify_access(fresh_access).unwrap();
    app.state
        .tokens
        .sign_access(&claims.user, claims.sub, Duration::seconds(-120))
        .unwrap()
}
