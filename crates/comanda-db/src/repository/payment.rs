//! # Payment Repository
//!
//! Payments recorded against orders. A payment may cover the whole order
//! or a subset of its items (`item_ids`, stored as a JSON array).
//!
//! Recording a payment, flagging the covered items and finishing the
//! order happen in one transaction.

use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use tracing::debug;

use super::order::mark_items_paid;
use crate::error::{DbError, DbResult};
use comanda_core::{OrderPayment, PaymentMethod};

#[derive(Debug, sqlx::FromRow)]
struct PaymentRow {
    id: String,
    order_id: String,
    payment_method: PaymentMethod,
    amount_cents: i64,
    received_amount_cents: i64,
    is_partial: bool,
    item_ids: String,
    created_at: DateTime<Utc>,
}

impl TryFrom<PaymentRow> for OrderPayment {
    type Error = DbError;

    fn try_from(row: PaymentRow) -> Result<Self, Self::Error> {
        let item_ids: Vec<String> =
            serde_json::from_str(&row.item_ids).map_err(|e| DbError::CorruptData {
                column: "order_payments.item_ids".to_string(),
                message: e.to_string(),
            })?;

        Ok(OrderPayment {
            id: row.id,
            order_id: row.order_id,
            payment_method: row.payment_method,
            amount_cents: row.amount_cents,
            received_amount_cents: row.received_amount_cents,
            is_partial: row.is_partial,
            item_ids,
            created_at: row.created_at,
        })
    }
}

const PAYMENT_COLUMNS: &str = "id, order_id, payment_method, amount_cents, \
     received_amount_cents, is_partial, item_ids, created_at";

#[derive(Debug, Clone)]
pub struct PaymentRepository {
    pool: SqlitePool,
}

impl PaymentRepository {
    pub fn new(pool: SqlitePool) -> Self {
        PaymentRepository { pool }
    }

    /// Records a payment.
    ///
    /// ## What This Does (one transaction)
    /// 1. Inserts the payment row
    /// 2. Flags `payment.item_ids` of the order as paid
    /// 3. Sets `finished = 1` on the order when `finish_order` is true
    pub async fn insert(&self, payment: &OrderPayment, finish_order: bool) -> DbResult<()> {
        debug!(
            order_id = %payment.order_id,
            amount = payment.amount_cents,
            method = %payment.payment_method,
            partial = payment.is_partial,
            "Recording order payment"
        );

        let item_ids = serde_json::to_string(&payment.item_ids)
            .map_err(|e| DbError::Internal(e.to_string()))?;

        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            INSERT INTO order_payments (
                id, order_id, payment_method, amount_cents,
                received_amount_cents, is_partial, item_ids, created_at
            )
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            "#,
        )
        .bind(&payment.id)
        .bind(&payment.order_id)
        .bind(payment.payment_method)
        .bind(payment.amount_cents)
        .bind(payment.received_amount_cents)
        .bind(payment.is_partial)
        .bind(item_ids)
        .bind(payment.created_at)
        .execute(&mut *tx)
        .await?;

        mark_items_paid(&mut tx, &payment.order_id, &payment.item_ids).await?;

        if finish_order {
            sqlx::query("UPDATE orders SET finished = 1 WHERE id = ?1")
                .bind(&payment.order_id)
                .execute(&mut *tx)
                .await?;
        }

        tx.commit().await?;
        Ok(())
    }

    /// Payments of one order, oldest first.
    pub async fn list_by_order(&self, order_id: &str) -> DbResult<Vec<OrderPayment>> {
        let rows = sqlx::query_as::<_, PaymentRow>(&format!(
            "SELECT {PAYMENT_COLUMNS} FROM order_payments WHERE order_id = ?1 ORDER BY created_at, rowid"
        ))
        .bind(order_id)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(OrderPayment::try_from).collect()
    }

    pub async fn list_all(&self) -> DbResult<Vec<OrderPayment>> {
        let rows = sqlx::query_as::<_, PaymentRow>(&format!(
            "SELECT {PAYMENT_COLUMNS} FROM order_payments ORDER BY created_at, rowid"
        ))
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(OrderPayment::try_from).collect()
    }
}
