use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use uuid::Uuid;

use crate::{
    error::Result,
    middleware_layer::auth::CurrentUser,
    models::product::{Product, ProductInput},
    services::products as products_service,
    state::AppState,
    validation::products::validate_product,
};

/// Creates a product owned by the caller.
#[axum::debug_handler]
pub async fn create_product(
    State(state): State<AppState>,
    user: CurrentUser,
    Json(payload): Json<ProductInput>,
) -> Result<Json<Product>> {
    validate_product(&payload)?;
    let product = products_service::create_product(&state, user.user.id, &payload).await?;
    Ok(Json(product))
}

/// Fetches a product by id. Public route.
#[axum::debug_handler]
pub async fn get_product(
    State(state): State<AppState>,
    Path(product_id): Path<Uuid>,
) -> Result<Json<Product>> {
    let product = products_service::get_product(&state, product_id).await?;
    Ok(Json(product))
}

/// Replaces a product. Owner only.
#[axum::debug_handler]
pub async fn update_product(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(product_id): Path<Uuid>,
    Json(payload): Json<ProductInput>,
) -> Result<Json<Product>> {
    validate_product(&payload)?;
    let product =
        products_service::update_product(&state, user.user.id, product_id, &payload).await?;
    Ok(Json(product))
}

/// Deletes a product. Owner only.
#[axum::debug_handler]
pub async fn delete_product(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(product_id): Path<Uuid>,
) -> Result<Response> {
    products_service::delete_product(&state, user.user.id, product_id).await?;

    let response = sonic_rs::to_string(&sonic_rs::json!({
        "message": "Product deleted"
    }))
    .unwrap_or_else(|_| r#"{"message":"Product deleted"}"#.to_string());

    Ok((StatusCode::OK, response).into_response())
}
