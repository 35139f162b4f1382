use std::time::Duration;

use axum::{
    Router,
    http::StatusCode,
    middleware::from_fn_with_state,
    routing::{get, post},
};
use http::{HeaderValue, Method, header};
use tower_cookies::CookieManagerLayer;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::{DefaultMakeSpan, DefaultOnFailure, DefaultOnRequest, DefaultOnResponse, TraceLayer},
};
use tracing::Level;

use crate::{handlers, middleware_layer, state::AppState};

/// Liveness probe.
async fn healthcheck() -> StatusCode {
    StatusCode::OK
}

fn cors_layer(allowed_origin: Option<&str>) -> CorsLayer {
    let cors = CorsLayer::new()
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([
            header::CONTENT_TYPE,
            header::AUTHORIZATION,
            header::ACCEPT,
            header::COOKIE,
            "x-refresh".parse().unwrap(),
        ])
        .expose_headers([
            "x-access-token".parse().unwrap(),
            "x-refresh-token".parse().unwrap(),
        ])
        .max_age(Duration::from_secs(86400));

    // Credentialed CORS requires a concrete origin; the permissive default
    // stays cookie-less.
    match allowed_origin.and_then(|origin| origin.parse::<HeaderValue>().ok()) {
        Some(origin) => cors.allow_origin([origin]).allow_credentials(true),
        None => cors.allow_origin(Any),
    }
}

/// Assembles the application router.
///
/// Every route sits behind the opportunistic `deserialize_user` layer;
/// whether an attached identity is mandatory is decided per handler by the
/// `CurrentUser` extractor. The same router serves production and the
/// integration tests.
pub fn router(state: AppState) -> Router {
    let cors = cors_layer(state.config.cors_allowed_origin.as_deref());

    Router::new()
        .route("/healthcheck", get(healthcheck))
        .route("/api/users", post(handlers::users::create_user))
        .route(
            "/api/sessions",
            post(handlers::sessions::create_session)
                .get(handlers::sessions::list_sessions)
                .delete(handlers::sessions::delete_session),
        )
        .route("/api/products", post(handlers::products::create_product))
        .route(
            "/api/products/{product_id}",
            get(handlers::products::get_product)
                .put(handlers::products::update_product)
                .delete(handlers::products::delete_product),
        )
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::default())
                .on_request(DefaultOnRequest::default().level(Level::DEBUG))
                .on_response(DefaultOnResponse::default().level(Level::DEBUG))
                .on_failure(DefaultOnFailure::default().level(Level::ERROR)),
        )
        .layer(from_fn_with_state(
            state.clone(),
            middleware_layer::auth::deserialize_user,
        ))
        .layer(CookieManagerLayer::new())
        .layer(cors)
        .with_state(state)
}
