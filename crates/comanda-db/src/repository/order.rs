//! # Order Repository
//!
//! Orders and their items.
//!
//! ## Order Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       Order Lifecycle                                   │
//! │                                                                         │
//! │  1. CREATE                                                             │
//! │     └── insert() → Order { draft: true }                               │
//! │                                                                         │
//! │  2. ADD ITEMS (waiter handheld or customer QR menu)                    │
//! │     └── add_item() / add_items() → OrderItem                           │
//! │                                                                         │
//! │  3. SEND TO KITCHEN                                                    │
//! │     └── update_flags(draft = false)                                    │
//! │     └── update_flags(viewed = true) when the kitchen acknowledges      │
//! │                                                                         │
//! │  4. PAY                                                                │
//! │     └── payment insert flags the covered items (partial or full)       │
//! │     └── update_flags(finished = true)                                  │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Reads return [`OrderDetail`]: the order plus every item joined with its
//! product (LEFT JOIN, so a line survives even if its product row is gone).
//! Lines are selected with the same predicate as their orders, never with a
//! list of bound ids, so the number of orders read at once is unbounded.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use sqlx::{QueryBuilder, Sqlite, SqlitePool, Transaction};
use tracing::debug;

use crate::error::{DbError, DbResult};
use comanda_core::{new_id, Order, OrderDetail, OrderItem, OrderLine, ProductSummary};

const ORDER_COLUMNS: &str = "id, table_number, table_id, finished, draft, name, phone, \
     command_number, order_type, viewed, created_at";

const LINE_SELECT: &str = r#"
    SELECT
        i.id, i.order_id, i.product_id, i.amount, i.is_paid,
        p.id AS p_id, p.name AS p_name,
        p.price_cents AS p_price_cents, p.description AS p_description
    FROM items i
    LEFT JOIN products p ON p.id = i.product_id
"#;

/// Upper bound on bound ids per statement, well under SQLite's limit.
const MAX_BOUND_IDS: usize = 500;

// =============================================================================
// Filter
// =============================================================================

/// Optional predicates for [`OrderRepository::list_details`]. Unset fields
/// match everything.
#[derive(Debug, Clone, Default)]
pub struct OrderFilter {
    pub draft: Option<bool>,
    pub finished: Option<bool>,
    pub table_number: Option<i32>,
    pub phone: Option<String>,
    pub command_number: Option<i32>,
    /// Case-insensitive substring of the customer name. Applied after the
    /// query with Unicode lower-casing; `%` and `_` are plain characters.
    pub name_contains: Option<String>,
}

impl OrderFilter {
    fn push_where(&self, qb: &mut QueryBuilder<'_, Sqlite>) {
        qb.push(" WHERE 1 = 1");
        if let Some(draft) = self.draft {
            qb.push(" AND draft = ").push_bind(draft);
        }
        if let Some(finished) = self.finished {
            qb.push(" AND finished = ").push_bind(finished);
        }
        if let Some(number) = self.table_number {
            qb.push(" AND table_number = ").push_bind(number);
        }
        if let Some(phone) = &self.phone {
            qb.push(" AND phone = ").push_bind(phone.clone());
        }
        if let Some(command) = self.command_number {
            qb.push(" AND command_number = ").push_bind(command);
        }
    }

    fn matches_name(&self, order: &Order) -> bool {
        let Some(needle) = &self.name_contains else {
            return true;
        };
        let needle = needle.trim().to_lowercase();
        order
            .name
            .as_deref()
            .is_some_and(|name| name.to_lowercase().contains(&needle))
    }
}

/// Item joined with its (possibly missing) product.
#[derive(Debug, sqlx::FromRow)]
struct LineRow {
    id: String,
    order_id: String,
    product_id: String,
    amount: i64,
    is_paid: bool,
    p_id: Option<String>,
    p_name: Option<String>,
    p_price_cents: Option<i64>,
    p_description: Option<String>,
}

impl LineRow {
    fn into_line(self) -> (String, OrderLine) {
        let product = match (self.p_id, self.p_name, self.p_price_cents) {
            (Some(id), Some(name), Some(price_cents)) => Some(ProductSummary {
                id,
                name,
                price_cents,
                description: self.p_description.unwrap_or_default(),
            }),
            _ => None,
        };
        (
            self.order_id,
            OrderLine {
                id: self.id,
                product_id: self.product_id,
                amount: self.amount,
                is_paid: self.is_paid,
                product,
            },
        )
    }
}

// =============================================================================
// Repository
// =============================================================================

/// Repository for order and item database operations.
#[derive(Debug, Clone)]
pub struct OrderRepository {
    pool: SqlitePool,
}

impl OrderRepository {
    pub fn new(pool: SqlitePool) -> Self {
        OrderRepository { pool }
    }

    // -------------------------------------------------------------------------
    // Orders
    // -------------------------------------------------------------------------

    pub async fn insert(&self, order: &Order) -> DbResult<()> {
        debug!(order_id = %order.id, order_type = %order.order_type, "Inserting order");

        sqlx::query(
            r#"
            INSERT INTO orders (
                id, table_number, table_id, finished, draft, name, phone,
                command_number, order_type, viewed, created_at
            )
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)
            "#,
        )
        .bind(&order.id)
        .bind(order.table_number)
        .bind(&order.table_id)
        .bind(order.finished)
        .bind(order.draft)
        .bind(&order.name)
        .bind(&order.phone)
        .bind(order.command_number)
        .bind(order.order_type)
        .bind(order.viewed)
        .bind(order.created_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    pub async fn get(&self, id: &str) -> DbResult<Option<Order>> {
        let order = sqlx::query_as::<_, Order>(&format!(
            "SELECT {ORDER_COLUMNS} FROM orders WHERE id = ?1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(order)
    }

    /// Sets whichever flags are `Some`, leaving the rest untouched.
    pub async fn update_flags(
        &self,
        id: &str,
        draft: Option<bool>,
        finished: Option<bool>,
        viewed: Option<bool>,
    ) -> DbResult<()> {
        debug!(order_id = %id, ?draft, ?finished, ?viewed, "Updating order flags");

        let result = sqlx::query(
            r#"
            UPDATE orders SET
                draft = COALESCE(?2, draft),
                finished = COALESCE(?3, finished),
                viewed = COALESCE(?4, viewed)
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .bind(draft)
        .bind(finished)
        .bind(viewed)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Order", id));
        }

        Ok(())
    }

    /// Overwrites the customer name and command number.
    pub async fn update_info(
        &self,
        id: &str,
        name: Option<&str>,
        command_number: Option<i32>,
    ) -> DbResult<()> {
        let result = sqlx::query("UPDATE orders SET name = ?2, command_number = ?3 WHERE id = ?1")
            .bind(id)
            .bind(name)
            .bind(command_number)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Order", id));
        }

        Ok(())
    }

    /// Deletes an order with its items and payments (CASCADE).
    pub async fn delete(&self, id: &str) -> DbResult<()> {
        debug!(order_id = %id, "Deleting order");

        let result = sqlx::query("DELETE FROM orders WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Order", id));
        }

        Ok(())
    }

    // -------------------------------------------------------------------------
    // Read models
    // -------------------------------------------------------------------------

    /// The order with every line, paid or not.
    pub async fn get_detail(&self, id: &str) -> DbResult<Option<OrderDetail>> {
        let Some(order) = self.get(id).await? else {
            return Ok(None);
        };

        let mut qb = QueryBuilder::<Sqlite>::new(LINE_SELECT);
        qb.push(" WHERE i.order_id = ").push_bind(id.to_string());
        qb.push(" ORDER BY i.created_at, i.rowid");
        let rows: Vec<LineRow> = qb.build_query_as().fetch_all(&self.pool).await?;

        let mut details = group_lines(vec![order], rows);
        Ok(details.pop())
    }

    /// Orders matching `filter`, newest first.
    pub async fn list_details(&self, filter: &OrderFilter) -> DbResult<Vec<OrderDetail>> {
        let mut qb = QueryBuilder::<Sqlite>::new(format!("SELECT {ORDER_COLUMNS} FROM orders"));
        filter.push_where(&mut qb);
        qb.push(" ORDER BY created_at DESC, rowid DESC");

        let mut orders: Vec<Order> = qb.build_query_as().fetch_all(&self.pool).await?;
        orders.retain(|order| filter.matches_name(order));
        debug!(count = orders.len(), ?filter, "Listed orders");

        if orders.is_empty() {
            return Ok(Vec::new());
        }

        let mut qb = QueryBuilder::<Sqlite>::new(LINE_SELECT);
        qb.push(" WHERE i.order_id IN (SELECT id FROM orders");
        filter.push_where(&mut qb);
        qb.push(") ORDER BY i.created_at, i.rowid");
        let rows: Vec<LineRow> = qb.build_query_as().fetch_all(&self.pool).await?;

        Ok(group_lines(orders, rows))
    }

    /// Every finished order (analytics input).
    pub async fn list_finished(&self) -> DbResult<Vec<OrderDetail>> {
        self.list_details(&OrderFilter {
            finished: Some(true),
            ..OrderFilter::default()
        })
        .await
    }

    // -------------------------------------------------------------------------
    // Items
    // -------------------------------------------------------------------------

    /// Adds one line to an order.
    ///
    /// ## Errors
    /// `DbError::ForeignKeyViolation` if the order or product is missing.
    pub async fn add_item(&self, order_id: &str, product_id: &str, amount: i64) -> DbResult<OrderItem> {
        let item = new_item(order_id, product_id, amount, Utc::now());
        debug!(order_id = %order_id, product_id = %product_id, amount, "Adding item");

        sqlx::query(
            r#"
            INSERT INTO items (id, order_id, product_id, amount, is_paid, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            "#,
        )
        .bind(&item.id)
        .bind(&item.order_id)
        .bind(&item.product_id)
        .bind(item.amount)
        .bind(item.is_paid)
        .bind(item.created_at)
        .execute(&self.pool)
        .await?;

        Ok(item)
    }

    /// Adds several lines in one transaction. Either all land or none.
    pub async fn add_items(
        &self,
        order_id: &str,
        lines: &[(String, i64)],
    ) -> DbResult<Vec<OrderItem>> {
        let now = Utc::now();
        let mut tx = self.pool.begin().await?;
        let mut items = Vec::with_capacity(lines.len());

        for (product_id, amount) in lines {
            let item = new_item(order_id, product_id, *amount, now);
            sqlx::query(
                r#"
                INSERT INTO items (id, order_id, product_id, amount, is_paid, created_at)
                VALUES (?1, ?2, ?3, ?4, ?5, ?6)
                "#,
            )
            .bind(&item.id)
            .bind(&item.order_id)
            .bind(&item.product_id)
            .bind(item.amount)
            .bind(item.is_paid)
            .bind(item.created_at)
            .execute(&mut *tx)
            .await?;
            items.push(item);
        }

        tx.commit().await?;
        debug!(order_id = %order_id, count = items.len(), "Added items");
        Ok(items)
    }

    pub async fn remove_item(&self, id: &str) -> DbResult<()> {
        let result = sqlx::query("DELETE FROM items WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Item", id));
        }

        Ok(())
    }
}

/// Flags the given items of `order_id` as paid inside `tx`. Ids from other
/// orders are ignored. Returns the number of items updated.
pub(crate) async fn mark_items_paid(
    tx: &mut Transaction<'_, Sqlite>,
    order_id: &str,
    item_ids: &[String],
) -> DbResult<u64> {
    let mut updated = 0;

    for chunk in item_ids.chunks(MAX_BOUND_IDS) {
        let mut qb = QueryBuilder::<Sqlite>::new("UPDATE items SET is_paid = 1 WHERE order_id = ");
        qb.push_bind(order_id.to_string());
        qb.push(" AND id IN (");
        let mut ids = qb.separated(", ");
        for id in chunk {
            ids.push_bind(id.clone());
        }
        ids.push_unseparated(")");

        updated += qb.build().execute(&mut **tx).await?.rows_affected();
    }

    Ok(updated)
}

/// Hangs each line under its order, keeping the order sequence.
fn group_lines(orders: Vec<Order>, rows: Vec<LineRow>) -> Vec<OrderDetail> {
    let mut by_order: HashMap<String, Vec<OrderLine>> = HashMap::new();
    for row in rows {
        let (order_id, line) = row.into_line();
        by_order.entry(order_id).or_default().push(line);
    }

    orders
        .into_iter()
        .map(|order| {
            let lines = by_order.remove(&order.id).unwrap_or_default();
            OrderDetail { order, lines }
        })
        .collect()
}

fn new_item(order_id: &str, product_id: &str, amount: i64, at: DateTime<Utc>) -> OrderItem {
    OrderItem {
        id: new_id(),
        order_id: order_id.to_string(),
        product_id: product_id.to_string(),
        amount,
        is_paid: false,
        created_at: at,
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
