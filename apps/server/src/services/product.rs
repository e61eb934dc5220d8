//! Menu products.

use chrono::Utc;
use serde::Deserialize;
use tracing::info;

use comanda_core::validation::{validate_name, validate_price};
use comanda_core::{new_id, Product};
use comanda_db::Database;

use crate::error::{ApiError, ApiResult};

#[derive(Debug, Clone, Deserialize)]
pub struct NewProduct {
    pub name: String,
    pub price_cents: i64,
    #[serde(default)]
    pub description: String,
    pub category_id: String,
    #[serde(default)]
    pub disabled: bool,
}

/// Partial update; absent fields keep their value.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProductUpdate {
    pub name: Option<String>,
    pub price_cents: Option<i64>,
    pub description: Option<String>,
    pub disabled: Option<bool>,
    pub category_id: Option<String>,
}

pub struct ProductService {
    db: Database,
}

impl ProductService {
    pub fn new(db: Database) -> Self {
        ProductService { db }
    }

    pub async fn create(&self, input: NewProduct) -> ApiResult<Product> {
        validate_name("name", &input.name)?;
        validate_price(input.price_cents)?;
        self.ensure_category(&input.category_id).await?;

        let product = Product {
            id: new_id(),
            name: input.name.trim().to_string(),
            price_cents: input.price_cents,
            description: input.description.trim().to_string(),
            disabled: input.disabled,
            category_id: input.category_id,
            created_at: Utc::now(),
        };
        self.db.products().insert(&product).await?;

        info!(product_id = %product.id, name = %product.name, price = product.price_cents, "Product created");
        Ok(product)
    }

    /// `disabled = None` lists everything.
    pub async fn list(&self, disabled: Option<bool>) -> ApiResult<Vec<Product>> {
        Ok(self.db.products().list(disabled).await?)
    }

    pub async fn list_by_category(&self, category_id: &str) -> ApiResult<Vec<Product>> {
        Ok(self.db.products().list_by_category(category_id).await?)
    }

    pub async fn update(&self, id: &str, changes: ProductUpdate) -> ApiResult<Product> {
        let mut product = self
            .db
            .products()
            .get_by_id(id)
            .await?
            .ok_or_else(|| ApiError::not_found("Product not found"))?;

        if let Some(name) = changes.name {
            validate_name("name", &name)?;
            product.name = name.trim().to_string();
        }
        if let Some(price) = changes.price_cents {
            validate_price(price)?;
            product.price_cents = price;
        }
        if let Some(description) = changes.description {
            product.description = description.trim().to_string();
        }
        if let Some(disabled) = changes.disabled {
            product.disabled = disabled;
        }
        if let Some(category_id) = changes.category_id {
            if category_id != product.category_id {
                self.ensure_category(&category_id).await?;
                product.category_id = category_id;
            }
        }

        self.db.products().update(&product).await?;
        Ok(product)
    }

    /// Refused once the product appears on any order.
    pub async fn delete(&self, id: &str) -> ApiResult<()> {
        self.db.products().delete(id).await.map_err(|e| {
            if e.is_foreign_key_violation() {
                ApiError::invalid_operation("Product is referenced by orders")
            } else {
                e.into()
            }
        })?;

        info!(product_id = %id, "Product deleted");
        Ok(())
    }

    async fn ensure_category(&self, category_id: &str) -> ApiResult<()> {
        match self.db.categories().get_by_id(category_id).await? {
            Some(_) => Ok(()),
            None => Err(ApiError::not_found("Category not found")),
        }
    }
}
