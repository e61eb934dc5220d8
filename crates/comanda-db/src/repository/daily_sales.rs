//! # Daily Sales Repository
//!
//! One row per calendar day, kept current by every register sale.
//!
//! ```text
//!   sale   ──► upsert(date, amount, false) ──► total += amount, orders += 1
//!   refund ──► upsert(date, amount, true)  ──► total -= amount
//! ```

use chrono::{NaiveDate, Utc};
use sqlx::{Sqlite, SqlitePool, Transaction};
use tracing::debug;

use crate::error::DbResult;
use comanda_core::{new_id, DailySales};

const DAILY_SALES_COLUMNS: &str =
    "id, date, total_sales_cents, total_orders, last_updated, created_at";

#[derive(Debug, Clone)]
pub struct DailySalesRepository {
    pool: SqlitePool,
}

impl DailySalesRepository {
    pub fn new(pool: SqlitePool) -> Self {
        DailySalesRepository { pool }
    }

    /// Adds a sale (or subtracts a refund) to the rollup of `date`.
    ///
    /// A refund never counts as an order.
    pub async fn upsert(&self, date: NaiveDate, amount_cents: i64, is_refund: bool) -> DbResult<()> {
        let mut tx = self.pool.begin().await?;
        add_to_day(&mut tx, date, amount_cents, is_refund).await?;
        tx.commit().await?;
        Ok(())
    }

    pub async fn get(&self, date: NaiveDate) -> DbResult<Option<DailySales>> {
        let row = sqlx::query_as::<_, DailySales>(&format!(
            "SELECT {DAILY_SALES_COLUMNS} FROM daily_sales WHERE date = ?1"
        ))
        .bind(date)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row)
    }

    /// Rows with `start <= date <= end`, oldest first. Days without sales
    /// have no row.
    pub async fn range(&self, start: NaiveDate, end: NaiveDate) -> DbResult<Vec<DailySales>> {
        let rows = sqlx::query_as::<_, DailySales>(&format!(
            "SELECT {DAILY_SALES_COLUMNS} FROM daily_sales \
             WHERE date >= ?1 AND date <= ?2 ORDER BY date"
        ))
        .bind(start)
        .bind(end)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }
}

/// The rollup write of [`DailySalesRepository::upsert`], inside a caller's
/// transaction so a register sale and its rollup commit together.
pub(crate) async fn add_to_day(
    tx: &mut Transaction<'_, Sqlite>,
    date: NaiveDate,
    amount_cents: i64,
    is_refund: bool,
) -> DbResult<()> {
    let (delta, orders) = if is_refund {
        (-amount_cents, 0_i64)
    } else {
        (amount_cents, 1_i64)
    };
    debug!(%date, delta, orders, "Updating daily sales");

    sqlx::query(
        r#"
        INSERT INTO daily_sales (
            id, date, total_sales_cents, total_orders, last_updated, created_at
        )
        VALUES (?1, ?2, ?3, ?4, ?5, ?5)
        ON CONFLICT(date) DO UPDATE SET
            total_sales_cents = total_sales_cents + excluded.total_sales_cents,
            total_orders = total_orders + excluded.total_orders,
            last_updated = excluded.last_updated
        "#,
    )
    .bind(new_id())
    .bind(date)
    .bind(delta)
    .bind(orders)
    .bind(Utc::now())
    .execute(&mut **tx)
    .await?;

    Ok(())
}
