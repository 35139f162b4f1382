use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio_postgres::Row;
use uuid::Uuid;

/// Represents a product listing.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    /// The unique identifier for the product.
    pub id: Uuid,
    /// The ID of the user who owns the product. Immutable after creation.
    pub user_id: Uuid,
    /// The product title.
    pub title: String,
    /// The free-text product description.
    pub description: String,
    /// The asking price.
    pub price: f64,
    /// An optional image reference.
    pub image: Option<String>,
    /// The timestamp when the product was created.
    pub created_at: DateTime<Utc>,
    /// The timestamp when the product was last updated.
    pub updated_at: DateTime<Utc>,
}

impl From<&Row> for Product {
    fn from(row: &Row) -> Self {
        Self {
            id: row.get("id"),
            user_id: row.get("user_id"),
            title: row.get("title"),
            description: row.get("description"),
            price: row.get("price"),
            image: row.get("image"),
            created_at: row.get("created_at"),
            updated_at: row.get("updated_at"),
        }
    }
}

/// The client-supplied product fields, shared by create and full update.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductInput {
    /// The product title.
    pub title: String,
    /// The free-text product description.
    pub description: String,
    /// The asking price.
    pub price: f64,
    /// An optional image reference.
    pub image: Option<String>,
}
