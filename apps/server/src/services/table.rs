//! Dine-in tables and their QR codes.

use chrono::Utc;
use serde::Deserialize;
use tracing::info;

use comanda_core::validation::validate_table_number;
use comanda_core::{new_id, Table};
use comanda_db::Database;

use crate::error::{ApiError, ApiResult};

#[derive(Debug, Clone, Default, Deserialize)]
pub struct TableUpdate {
    pub number: Option<i32>,
    pub is_active: Option<bool>,
}

pub struct TableService {
    db: Database,
}

impl TableService {
    pub fn new(db: Database) -> Self {
        TableService { db }
    }

    pub async fn create(&self, number: i32) -> ApiResult<Table> {
        validate_table_number(number)?;
        self.ensure_number_free(number, None).await?;

        let table = Table {
            id: new_id(),
            number,
            qr_code: Table::generate_qr_code(),
            is_active: true,
            created_at: Utc::now(),
        };
        self.db.tables().insert(&table).await?;

        info!(table_id = %table.id, number, qr_code = %table.qr_code, "Table created");
        Ok(table)
    }

    pub async fn list(&self) -> ApiResult<Vec<Table>> {
        Ok(self.db.tables().list().await?)
    }

    pub async fn get_by_id(&self, id: &str) -> ApiResult<Table> {
        self.db
            .tables()
            .get_by_id(id)
            .await?
            .ok_or_else(|| ApiError::not_found("Table not found"))
    }

    pub async fn get_by_qr_code(&self, qr_code: &str) -> ApiResult<Table> {
        self.db
            .tables()
            .get_by_qr_code(qr_code.trim())
            .await?
            .ok_or_else(|| ApiError::not_found("Table not found"))
    }

    pub async fn update(&self, id: &str, changes: TableUpdate) -> ApiResult<Table> {
        let mut table = self.get_by_id(id).await?;

        if let Some(number) = changes.number {
            validate_table_number(number)?;
            self.ensure_number_free(number, Some(id)).await?;
            table.number = number;
        }
        if let Some(is_active) = changes.is_active {
            table.is_active = is_active;
        }

        self.db.tables().update(&table).await?;
        Ok(table)
    }

    pub async fn delete(&self, id: &str) -> ApiResult<()> {
        self.db.tables().delete(id).await?;
        info!(table_id = %id, "Table deleted");
        Ok(())
    }

    async fn ensure_number_free(&self, number: i32, except_id: Option<&str>) -> ApiResult<()> {
        match self.db.tables().get_by_number(number).await? {
            Some(existing) if Some(existing.id.as_str()) != except_id => Err(
                ApiError::validation(format!("Table number {number} already exists")),
            ),
            _ => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;
    use crate::services::test_support;

    #[tokio::test]
    async fn test_create_and_lookup() {
        let service = TableService::new(test_support::db().await);

        let table = service.create(4).await.unwrap();
        assert_eq!(table.qr_code.len(), 16);
        assert!(table.is_active);

        assert_eq!(service.get_by_qr_code(&table.qr_code).await.unwrap().id, table.id);
        assert_eq!(service.get_by_id(&table.id).await.unwrap().number, 4);

        let err = service.create(4).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::ValidationError);

        let err = service.get_by_qr_code("NAOEXISTE").await.unwrap_err();
        assert_eq!(err.code, ErrorCode::NotFound);
    }

    #[tokio::test]
    async fn test_update_excludes_itself_from_duplicate_check() {
        let service = TableService::new(test_support::db().await);
        let one = service.create(1).await.unwrap();
        service.create(2).await.unwrap();

        let same = service
            .update(
                &one.id,
                TableUpdate {
                    number: Some(1),
                    is_active: Some(false),
                },
            )
            .await
            .unwrap();
        assert!(!same.is_active);

        let err = service
            .update(
                &one.id,
                TableUpdate {
                    number: Some(2),
                    ..TableUpdate::default()
                },
            )
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::ValidationError);
    }

    #[tokio::test]
    async fn test_delete_missing() {
        let service = TableService::new(test_support::db().await);
        let err = service.delete(&new_id()).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::NotFound);
    }
}
