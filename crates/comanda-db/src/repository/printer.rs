//! # Printer Repository
//!
//! Configured receipt printers.

use sqlx::SqlitePool;
use tracing::debug;

use crate::error::{DbError, DbResult};
use comanda_core::Printer;

const PRINTER_COLUMNS: &str = "id, name, printer_type, connection_type, connection_string, \
     is_active, paper_width, settings, auto_print, created_at";

#[derive(Debug, Clone)]
pub struct PrinterRepository {
    pool: SqlitePool,
}

impl PrinterRepository {
    pub fn new(pool: SqlitePool) -> Self {
        PrinterRepository { pool }
    }

    pub async fn insert(&self, printer: &Printer) -> DbResult<()> {
        debug!(printer_id = %printer.id, name = %printer.name, "Inserting printer");

        sqlx::query(
            r#"
            INSERT INTO printers (
                id, name, printer_type, connection_type, connection_string,
                is_active, paper_width, settings, auto_print, created_at
            )
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
            "#,
        )
        .bind(&printer.id)
        .bind(&printer.name)
        .bind(printer.printer_type)
        .bind(printer.connection_type)
        .bind(&printer.connection_string)
        .bind(printer.is_active)
        .bind(printer.paper_width)
        .bind(&printer.settings)
        .bind(printer.auto_print)
        .bind(printer.created_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// All printers in creation order.
    pub async fn list(&self) -> DbResult<Vec<Printer>> {
        let printers = sqlx::query_as::<_, Printer>(&format!(
            "SELECT {PRINTER_COLUMNS} FROM printers ORDER BY created_at, rowid"
        ))
        .fetch_all(&self.pool)
        .await?;

        Ok(printers)
    }

    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Printer>> {
        let printer = sqlx::query_as::<_, Printer>(&format!(
            "SELECT {PRINTER_COLUMNS} FROM printers WHERE id = ?1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(printer)
    }

    pub async fn update(&self, printer: &Printer) -> DbResult<()> {
        let result = sqlx::query(
            r#"
            UPDATE printers SET
                name = ?2,
                printer_type = ?3,
                connection_type = ?4,
                connection_string = ?5,
                is_active = ?6,
                paper_width = ?7,
                settings = ?8,
                auto_print = ?9
            WHERE id = ?1
            "#,
        )
        .bind(&printer.id)
        .bind(&printer.name)
        .bind(printer.printer_type)
        .bind(printer.connection_type)
        .bind(&printer.connection_string)
        .bind(printer.is_active)
        .bind(printer.paper_width)
        .bind(&printer.settings)
        .bind(printer.auto_print)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Printer", &printer.id));
        }

        Ok(())
    }

    pub async fn delete(&self, id: &str) -> DbResult<()> {
        let result = sqlx::query("DELETE FROM printers WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Printer", id));
        }

        Ok(())
    }
}
