//! # Product Repository
//!
//! Menu items.
//!
//! ## Visibility
//! ```text
//!   disabled = 0  ──►  public menu (QR code) + staff screens
//!   disabled = 1  ──►  staff screens only
//! ```
//!
//! Products on any order cannot be deleted (`items.product_id` is RESTRICT);
//! disable them instead.

use sqlx::SqlitePool;
use tracing::debug;

use crate::error::{DbError, DbResult};
use comanda_core::Product;

const PRODUCT_COLUMNS: &str =
    "id, name, price_cents, description, disabled, category_id, created_at";

/// Repository for product database operations.
#[derive(Debug, Clone)]
pub struct ProductRepository {
    pool: SqlitePool,
}

impl ProductRepository {
    /// Creates a new ProductRepository.
    pub fn new(pool: SqlitePool) -> Self {
        ProductRepository { pool }
    }

    /// Inserts a product.
    ///
    /// ## Errors
    /// `DbError::ForeignKeyViolation` when the category does not exist.
    pub async fn insert(&self, product: &Product) -> DbResult<()> {
        debug!(product_id = %product.id, name = %product.name, "Inserting product");

        sqlx::query(
            r#"
            INSERT INTO products (id, name, price_cents, description, disabled, category_id, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            "#,
        )
        .bind(&product.id)
        .bind(&product.name)
        .bind(product.price_cents)
        .bind(&product.description)
        .bind(product.disabled)
        .bind(&product.category_id)
        .bind(product.created_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Product>> {
        let product = sqlx::query_as::<_, Product>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products WHERE id = ?1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(product)
    }

    /// Lists products, optionally only those with the given `disabled` flag.
    pub async fn list(&self, disabled: Option<bool>) -> DbResult<Vec<Product>> {
        let products = match disabled {
            Some(flag) => {
                sqlx::query_as::<_, Product>(&format!(
                    "SELECT {PRODUCT_COLUMNS} FROM products WHERE disabled = ?1 ORDER BY name COLLATE NOCASE"
                ))
                .bind(flag)
                .fetch_all(&self.pool)
                .await?
            }
            None => {
                sqlx::query_as::<_, Product>(&format!(
                    "SELECT {PRODUCT_COLUMNS} FROM products ORDER BY name COLLATE NOCASE"
                ))
                .fetch_all(&self.pool)
                .await?
            }
        };

        debug!(count = products.len(), "Listed products");
        Ok(products)
    }

    pub async fn list_by_category(&self, category_id: &str) -> DbResult<Vec<Product>> {
        let products = sqlx::query_as::<_, Product>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products WHERE category_id = ?1 ORDER BY name COLLATE NOCASE"
        ))
        .bind(category_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(products)
    }

    /// Writes every mutable column of `product`.
    pub async fn update(&self, product: &Product) -> DbResult<()> {
        debug!(product_id = %product.id, "Updating product");

        let result = sqlx::query(
            r#"
            UPDATE products SET
                name = ?2,
                price_cents = ?3,
                description = ?4,
                disabled = ?5,
                category_id = ?6
            WHERE id = ?1
            "#,
        )
        .bind(&product.id)
        .bind(&product.name)
        .bind(product.price_cents)
        .bind(&product.description)
        .bind(product.disabled)
        .bind(&product.category_id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Product", &product.id));
        }

        Ok(())
    }

    /// Deletes a product.
    ///
    /// ## Errors
    /// - `DbError::NotFound` when no row matched
    /// - `DbError::ForeignKeyViolation` when an order item references it
    pub async fn delete(&self, id: &str) -> DbResult<()> {
        debug!(product_id = %id, "Deleting product");

        let result = sqlx::query("DELETE FROM products WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Product", id));
        }

        Ok(())
    }

    /// Counts products (for diagnostics and the seeder).
    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM products")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use crate::{Database, DbConfig, DbError};
    use chrono::Utc;
    use comanda_core::{new_id, Category, Order, OrderType, Product};

    async fn setup() -> (Database, Category) {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let category = Category {
            id: new_id(),
            name: "Lanches".to_string(),
            created_at: Utc::now(),
        };
        db.categories().insert(&category).await.unwrap();
        (db, category)
    }

    fn product(category_id: &str, name: &str, price_cents: i64, disabled: bool) -> Product {
        Product {
            id: new_id(),
            name: name.to_string(),
            price_cents,
            description: "Pão, carne e queijo".to_string(),
            disabled,
            category_id: category_id.to_string(),
            created_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_list_filters_by_disabled() {
        let (db, cat) = setup().await;
        let repo = db.products();
        repo.insert(&product(&cat.id, "X-Burger", 2500, false)).await.unwrap();
        repo.insert(&product(&cat.id, "X-Bacon", 2900, true)).await.unwrap();

        assert_eq!(repo.list(None).await.unwrap().len(), 2);
        let enabled = repo.list(Some(false)).await.unwrap();
        assert_eq!(enabled.len(), 1);
        assert_eq!(enabled[0].name, "X-Burger");
        assert_eq!(repo.list(Some(true)).await.unwrap()[0].name, "X-Bacon");
        assert_eq!(repo.list_by_category(&cat.id).await.unwrap().len(), 2);
        assert_eq!(repo.count().await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_insert_with_unknown_category() {
        let (db, _) = setup().await;
        let err = db
            .products()
            .insert(&product(&new_id(), "Órfão", 100, false))
            .await
            .unwrap_err();
        assert!(err.is_foreign_key_violation());
    }

    #[tokio::test]
    async fn test_update_and_delete() {
        let (db, cat) = setup().await;
        let repo = db.products();
        let mut burger = product(&cat.id, "X-Burger", 2500, false);
        repo.insert(&burger).await.unwrap();

        burger.price_cents = 2700;
        burger.disabled = true;
        repo.update(&burger).await.unwrap();
        let stored = repo.get_by_id(&burger.id).await.unwrap().unwrap();
        assert_eq!(stored.price_cents, 2700);
        assert!(stored.disabled);

        repo.delete(&burger.id).await.unwrap();
        assert!(matches!(repo.delete(&burger.id).await, Err(DbError::NotFound { .. })));
    }

    #[tokio::test]
    async fn test_delete_ordered_product_is_rejected() {
        let (db, cat) = setup().await;
        let burger = product(&cat.id, "X-Burger", 2500, false);
        db.products().insert(&burger).await.unwrap();

        let order = Order::new(OrderType::Balcao);
        db.orders().insert(&order).await.unwrap();
        db.orders().add_item(&order.id, &burger.id, 1).await.unwrap();

        let err = db.products().delete(&burger.id).await.unwrap_err();
        assert!(err.is_foreign_key_violation());
    }
}
