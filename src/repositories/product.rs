use async_trait::async_trait;
use deadpool_postgres::Pool;
use uuid::Uuid;

use crate::{
    error::Result,
    models::product::{Product, ProductInput},
};

/// Persistence contract for products.
#[async_trait]
pub trait ProductStore: Send + Sync {
    /// Inserts a product owned by `user_id`.
    async fn create(&self, user_id: Uuid, input: &ProductInput) -> Result<Product>;

    /// Fetches a product by ID.
    async fn get(&self, id: Uuid) -> Result<Option<Product>>;

    /// Replaces a product's mutable fields, returning the updated row or
    /// `None` when the product no longer exists.
    async fn update(&self, id: Uuid, input: &ProductInput) -> Result<Option<Product>>;

    /// Removes a product.
    async fn delete(&self, id: Uuid) -> Result<()>;
}

/// Postgres-backed [`ProductStore`].
pub struct PgProductStore {
    pool: Pool,
}

impl PgProductStore {
    pub fn new(pool: Pool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ProductStore for PgProductStore {
    async fn create(&self, user_id: Uuid, input: &ProductInput) -> Result<Product> {
        let client = self.pool.get().await?;
        let row = client
            .query_one(
                r#"
                INSERT INTO products (id, user_id, title, description, price, image)
                VALUES ($1, $2, $3, $4, $5, $6)
                RETURNING *
                "#,
                &[
                    &Uuid::new_v4(),
                    &user_id,
                    &input.title,
                    &input.description,
                    &input.price,
                    &input.image,
                ],
            )
            .await?;
        Ok(Product::from(&row))
    }

    async fn get(&self, id: Uuid) -> Result<Option<Product>> {
        let client = self.pool.get().await?;
        let row = client
            .query_opt(
                r#"
                SELECT *
                FROM products
                WHERE id = $1
                "#,
                &[&id],
            )
            .await?;
        Ok(row.map(|row| Product::from(&row)))
    }

    async fn update(&self, id: Uuid, input: &ProductInput) -> Result<Option<Product>> {
        let client = self.pool.get().await?;
        let row = client
            .query_opt(
                r#"
                UPDATE products
                SET title = $2, description = $3, price = $4, image = $5, updated_at = NOW()
                WHERE id = $1
                RETURNING *
                "#,
                &[&id, &input.title, &input.description, &input.price, &input.image],
            )
            .await?;
        Ok(row.map(|row| Product::from(&row)))
    }

    async fn delete(&self, id: Uuid) -> Result<()> {
        let client = self.pool.get().await?;
        client
            .execute(
                r#"
                DELETE FROM products
                WHERE id = $1
                "#,
                &[&id],
            )
            .await?;
        Ok(())
    }
}
