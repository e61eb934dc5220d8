//! # Table Repository
//!
//! Dine-in tables. `number` and `qr_code` are both UNIQUE; duplicate
//! numbers are also checked up front by the service so the client gets a
//! readable message.

use sqlx::SqlitePool;
use tracing::debug;

use crate::error::{DbError, DbResult};
use comanda_core::Table;

const TABLE_COLUMNS: &str = "id, number, qr_code, is_active, created_at";

#[derive(Debug, Clone)]
pub struct TableRepository {
    pool: SqlitePool,
}

impl TableRepository {
    pub fn new(pool: SqlitePool) -> Self {
        TableRepository { pool }
    }

    pub async fn insert(&self, table: &Table) -> DbResult<()> {
        debug!(table_id = %table.id, number = table.number, "Inserting table");

        sqlx::query(
            r#"
            INSERT INTO tables (id, number, qr_code, is_active, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5)
            "#,
        )
        .bind(&table.id)
        .bind(table.number)
        .bind(&table.qr_code)
        .bind(table.is_active)
        .bind(table.created_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// All tables ordered by number.
    pub async fn list(&self) -> DbResult<Vec<Table>> {
        let tables = sqlx::query_as::<_, Table>(&format!(
            "SELECT {TABLE_COLUMNS} FROM tables ORDER BY number"
        ))
        .fetch_all(&self.pool)
        .await?;

        Ok(tables)
    }

    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Table>> {
        self.fetch_one_where("id = ?1", id).await
    }

    pub async fn get_by_qr_code(&self, qr_code: &str) -> DbResult<Option<Table>> {
        self.fetch_one_where("qr_code = ?1", qr_code).await
    }

    pub async fn get_by_number(&self, number: i32) -> DbResult<Option<Table>> {
        let table = sqlx::query_as::<_, Table>(&format!(
            "SELECT {TABLE_COLUMNS} FROM tables WHERE number = ?1"
        ))
        .bind(number)
        .fetch_optional(&self.pool)
        .await?;

        Ok(table)
    }

    pub async fn update(&self, table: &Table) -> DbResult<()> {
        let result = sqlx::query("UPDATE tables SET number = ?2, is_active = ?3 WHERE id = ?1")
            .bind(&table.id)
            .bind(table.number)
            .bind(table.is_active)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Table", &table.id));
        }

        Ok(())
    }

    /// Deletes a table. Orders keep their `table_number`; `table_id` is nulled.
    pub async fn delete(&self, id: &str) -> DbResult<()> {
        let result = sqlx::query("DELETE FROM tables WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Table", id));
        }

        Ok(())
    }

    async fn fetch_one_where(&self, predicate: &str, value: &str) -> DbResult<Option<Table>> {
        let table = sqlx::query_as::<_, Table>(&format!(
            "SELECT {TABLE_COLUMNS} FROM tables WHERE {predicate}"
        ))
        .bind(value)
        .fetch_optional(&self.pool)
        .await?;

        Ok(table)
    }
}
