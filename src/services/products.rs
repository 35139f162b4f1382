use uuid::Uuid;

use crate::{
    error::{AppError, Result},
    models::product::{Product, ProductInput},
    state::AppState,
};

/// Loads a product and enforces ownership for a mutation.
///
/// Ordering is load-bearing: a missing product is `NotFound` before any
/// ownership comparison, and a non-owner is `Forbidden` before any mutation
/// runs.
async fn owned_product(state: &AppState, product_id: Uuid, user_id: Uuid) -> Result<Product> {
    let product = state
        .products
        .get(product_id)
        .await?
        .ok_or(AppError::NotFound)?;

    if product.user_id != user_id {
        return Err(AppError::Forbidden);
    }

    Ok(product)
}

/// Creates a product owned by the caller.
pub async fn create_product(
    state: &AppState,
    user_id: Uuid,
    input: &ProductInput,
) -> Result<Product> {
    let product = state.products.create(user_id, input).await?;
    tracing::info!("✅ Product created: {} (owner {})", product.id, user_id);
    Ok(product)
}

/// Fetches a product. This is the public read path, no identity involved.
pub async fn get_product(state: &AppState, product_id: Uuid) -> Result<Product> {
    state
        .products
        .get(product_id)
        .await?
        .ok_or(AppError::NotFound)
}

/// Replaces a product's fields after the ownership check.
pub async fn update_product(
    state: &AppState,
    user_id: Uuid,
    product_id: Uuid,
    input: &ProductInput,
) -> Result<Product> {
    owned_product(state, product_id, user_id).await?;

    // The row can vanish between the check and the write; that is still a 404.
    state
        .products
        .update(product_id, input)
        .await?
        .ok_or(AppError::NotFound)
}

/// Deletes a product after the ownership check.
pub async fn delete_product(state: &AppState, user_id: Uuid, product_id: Uuid) -> Result<()> {
    owned_product(state, product_id, user_id).await?;
    state.products.delete(product_id).await?;
    tracing::info!("🗑️ Product deleted: {}", product_id);
    Ok(())
}
