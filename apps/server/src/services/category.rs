//! Menu categories.

use chrono::Utc;
use tracing::info;

use comanda_core::validation::validate_name;
use comanda_core::{new_id, Category};
use comanda_db::Database;

use crate::error::{ApiError, ApiResult};

pub struct CategoryService {
    db: Database,
}

impl CategoryService {
    pub fn new(db: Database) -> Self {
        CategoryService { db }
    }

    pub async fn create(&self, name: &str) -> ApiResult<Category> {
        validate_name("name", name)?;

        let category = Category {
            id: new_id(),
            name: name.trim().to_string(),
            created_at: Utc::now(),
        };
        self.db.categories().insert(&category).await?;

        info!(category_id = %category.id, name = %category.name, "Category created");
        Ok(category)
    }

    pub async fn list(&self) -> ApiResult<Vec<Category>> {
        Ok(self.db.categories().list().await?)
    }

    pub async fn update(&self, id: &str, name: &str) -> ApiResult<Category> {
        validate_name("name", name)?;

        let mut category = self
            .db
            .categories()
            .get_by_id(id)
            .await?
            .ok_or_else(|| ApiError::not_found("Category not found"))?;

        category.name = name.trim().to_string();
        self.db.categories().update_name(id, &category.name).await?;
        Ok(category)
    }

    /// Refused while products still belong to the category.
    pub async fn delete(&self, id: &str) -> ApiResult<()> {
        self.db.categories().delete(id).await.map_err(|e| {
            if e.is_foreign_key_violation() {
                ApiError::invalid_operation("Category still has products")
            } else {
                e.into()
            }
        })?;

        info!(category_id = %id, "Category deleted");
        Ok(())
    }
}
