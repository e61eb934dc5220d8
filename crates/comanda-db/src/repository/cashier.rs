//! # Cashier Repository
//!
//! Register sessions and their movement ledger.
//!
//! ## Ledger
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  cashiers (one row per session, at most one with is_open = 1)          │
//! │       │                                                                 │
//! │       └──► cashier_movements                                           │
//! │              OPEN        +initial      current = initial               │
//! │              SALE        +amount       current += amount, orders += 1  │
//! │                                        daily_sales rollup += amount    │
//! │              CHANGE_IN   +amount       current += amount               │
//! │              CHANGE_OUT  -amount       current -= amount, never < 0    │
//! │              CLOSE        current      is_open = 0                     │
//! │                                                                         │
//! │  Every balance change and its movement row commit together.            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{DateTime, Utc};
use sqlx::{Sqlite, SqlitePool, Transaction};
use tracing::{debug, info};

use super::daily_sales::add_to_day;
use crate::error::{DbError, DbResult};
use comanda_core::{Cashier, CashierMovement, CoreError};

const CASHIER_COLUMNS: &str = "id, is_open, opened_at, closed_at, opened_by, \
     initial_amount_cents, current_amount_cents, total_sales_cents, total_orders, created_at";

#[derive(Debug, Clone)]
pub struct CashierRepository {
    pool: SqlitePool,
}

impl CashierRepository {
    pub fn new(pool: SqlitePool) -> Self {
        CashierRepository { pool }
    }

    /// The open session, if any.
    pub async fn get_open(&self) -> DbResult<Option<Cashier>> {
        let cashier = sqlx::query_as::<_, Cashier>(&format!(
            "SELECT {CASHIER_COLUMNS} FROM cashiers WHERE is_open = 1 LIMIT 1"
        ))
        .fetch_optional(&self.pool)
        .await?;

        Ok(cashier)
    }

    /// Inserts a new open session and its OPEN movement.
    ///
    /// ## Errors
    /// `DbError::UniqueViolation` when another session is already open.
    pub async fn open(&self, cashier: &Cashier, movement: &CashierMovement) -> DbResult<()> {
        info!(cashier_id = %cashier.id, initial = cashier.initial_amount_cents, "Opening cashier");

        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            INSERT INTO cashiers (
                id, is_open, opened_at, closed_at, opened_by, initial_amount_cents,
                current_amount_cents, total_sales_cents, total_orders, created_at
            )
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
            "#,
        )
        .bind(&cashier.id)
        .bind(cashier.is_open)
        .bind(cashier.opened_at)
        .bind(cashier.closed_at)
        .bind(&cashier.opened_by)
        .bind(cashier.initial_amount_cents)
        .bind(cashier.current_amount_cents)
        .bind(cashier.total_sales_cents)
        .bind(cashier.total_orders)
        .bind(cashier.created_at)
        .execute(&mut *tx)
        .await
        .map_err(|e| match DbError::from(e) {
            DbError::UniqueViolation { .. } => DbError::duplicate("cashier", "open"),
            other => other,
        })?;

        insert_movement(&mut tx, movement).await?;
        tx.commit().await?;
        Ok(())
    }

    /// Closes an open session and records the CLOSE movement.
    pub async fn close(
        &self,
        id: &str,
        closed_at: DateTime<Utc>,
        movement: &CashierMovement,
    ) -> DbResult<()> {
        info!(cashier_id = %id, "Closing cashier");

        let mut tx = self.pool.begin().await?;

        let result =
            sqlx::query("UPDATE cashiers SET is_open = 0, closed_at = ?2 WHERE id = ?1 AND is_open = 1")
                .bind(id)
                .bind(closed_at)
                .execute(&mut *tx)
                .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Cashier (open)", id));
        }

        insert_movement(&mut tx, movement).await?;
        tx.commit().await?;
        Ok(())
    }

    /// Books a sale: drawer and sales totals grow by `amount`, one more order,
    /// and the rollup of the movement's UTC day grows with them.
    pub async fn record_sale(
        &self,
        cashier_id: &str,
        amount_cents: i64,
        movement: &CashierMovement,
    ) -> DbResult<()> {
        debug!(cashier_id = %cashier_id, amount_cents, "Recording sale");

        let mut tx = self.pool.begin().await?;

        let result = sqlx::query(
            r#"
            UPDATE cashiers SET
                current_amount_cents = current_amount_cents + ?2,
                total_sales_cents = total_sales_cents + ?2,
                total_orders = total_orders + 1
            WHERE id = ?1 AND is_open = 1
            "#,
        )
        .bind(cashier_id)
        .bind(amount_cents)
        .execute(&mut *tx)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Cashier (open)", cashier_id));
        }

        insert_movement(&mut tx, movement).await?;
        add_to_day(&mut tx, movement.created_at.date_naive(), amount_cents, false).await?;
        tx.commit().await?;
        Ok(())
    }

    /// Moves cash in (`delta > 0`) or out (`delta < 0`) of the drawer.
    ///
    /// ## Errors
    /// `DbError::Domain(CoreError::InsufficientDrawer)` when the drawer would
    /// go below zero. The balance check is part of the UPDATE itself.
    pub async fn record_adjustment(
        &self,
        cashier_id: &str,
        delta_cents: i64,
        movement: &CashierMovement,
    ) -> DbResult<()> {
        debug!(cashier_id = %cashier_id, delta_cents, "Adjusting drawer");

        let mut tx = self.pool.begin().await?;

        let result = sqlx::query(
            r#"
            UPDATE cashiers SET current_amount_cents = current_amount_cents + ?2
            WHERE id = ?1 AND is_open = 1 AND current_amount_cents + ?2 >= 0
            "#,
        )
        .bind(cashier_id)
        .bind(delta_cents)
        .execute(&mut *tx)
        .await?;

        if result.rows_affected() == 0 {
            let available: Option<i64> = sqlx::query_scalar(
                "SELECT current_amount_cents FROM cashiers WHERE id = ?1 AND is_open = 1",
            )
            .bind(cashier_id)
            .fetch_optional(&mut *tx)
            .await?;

            return Err(match available {
                Some(available) => CoreError::InsufficientDrawer {
                    available,
                    requested: delta_cents.saturating_abs(),
                }
                .into(),
                None => DbError::not_found("Cashier (open)", cashier_id),
            });
        }

        insert_movement(&mut tx, movement).await?;
        tx.commit().await?;
        Ok(())
    }

    /// Ledger of one session, oldest first.
    pub async fn list_movements(&self, cashier_id: &str) -> DbResult<Vec<CashierMovement>> {
        let movements = sqlx::query_as::<_, CashierMovement>(
            r#"
            SELECT id, cashier_id, kind, amount_cents, observation, payment_method, created_at
            FROM cashier_movements
            WHERE cashier_id = ?1
            ORDER BY created_at, rowid
            "#,
        )
        .bind(cashier_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(movements)
    }
}

async fn insert_movement(
    tx: &mut Transaction<'_, Sqlite>,
    movement: &CashierMovement,
) -> DbResult<()> {
    sqlx::query(
        r#"
        INSERT INTO cashier_movements (
            id, cashier_id, kind, amount_cents, observation, payment_method, created_at
        )
        VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
        "#,
    )
    .bind(&movement.id)
    .bind(&movement.cashier_id)
    .bind(movement.kind)
    .bind(movement.amount_cents)
    .bind(&movement.observation)
    .bind(movement.payment_method)
    .bind(movement.created_at)
    .execute(&mut **tx)
    .await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Database, DbConfig};
    use comanda_core::{new_id, Money, MovementKind, PaymentMethod};

    fn open_cashier(initial: i64) -> (Cashier, CashierMovement) {
        let now = Utc::now();
        let cashier = Cashier {
            id: new_id(),
            is_open: true,
            opened_at: now,
            closed_at: None,
            opened_by: new_id(),
            initial_amount_cents: initial,
            current_amount_cents: initial,
            total_sales_cents: 0,
            total_orders: 0,
            created_at: now,
        };
        let movement = CashierMovement::new(
            &cashier.id,
            MovementKind::Open,
            Money::from_cents(initial),
            "Abertura de caixa",
        );
        (cashier, movement)
    }

    async fn load(db: &Database, id: &str) -> Cashier {
        sqlx::query_as::<_, Cashier>(&format!("SELECT {CASHIER_COLUMNS} FROM cashiers WHERE id = ?1"))
            .bind(id)
            .fetch_one(db.pool())
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_open_sale_adjust_close() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let repo = db.cashiers();

        let (cashier, opening) = open_cashier(10_000);
        repo.open(&cashier, &opening).await.unwrap();
        assert_eq!(repo.get_open().await.unwrap().unwrap().id, cashier.id);

        let sale = CashierMovement::new(&cashier.id, MovementKind::Sale, Money::from_cents(4_500), "Pagamento")
            .with_method(PaymentMethod::Pix);
        repo.record_sale(&cashier.id, 4_500, &sale).await.unwrap();

        let out = CashierMovement::new(&cashier.id, MovementKind::ChangeOut, Money::from_cents(2_000), "Sangria");
        repo.record_adjustment(&cashier.id, -2_000, &out).await.unwrap();

        let current = load(&db, &cashier.id).await;
        assert_eq!(current.current_amount_cents, 12_500);
        assert_eq!(current.total_sales_cents, 4_500);
        assert_eq!(current.total_orders, 1);

        let closing = CashierMovement::new(&cashier.id, MovementKind::Close, current.current_amount(), "Fechamento de caixa");
        repo.close(&cashier.id, Utc::now(), &closing).await.unwrap();
        assert!(repo.get_open().await.unwrap().is_none());

        let closed = load(&db, &cashier.id).await;
        assert!(!closed.is_open);
        assert!(closed.closed_at.is_some());

        let kinds: Vec<MovementKind> = repo
            .list_movements(&cashier.id)
            .await
            .unwrap()
            .iter()
            .map(|m| m.kind)
            .collect();
        assert_eq!(
            kinds,
            vec![MovementKind::Open, MovementKind::Sale, MovementKind::ChangeOut, MovementKind::Close]
        );
    }

    #[tokio::test]
    async fn test_only_one_open_cashier() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let (first, m1) = open_cashier(100);
        db.cashiers().open(&first, &m1).await.unwrap();

        let (second, m2) = open_cashier(200);
        let err = db.cashiers().open(&second, &m2).await.unwrap_err();
        assert!(err.is_unique_violation());

        // the failed open left no movement behind
        assert!(db.cashiers().list_movements(&second.id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_sale_on_closed_cashier_fails() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let (cashier, opening) = open_cashier(100);
        db.cashiers().open(&cashier, &opening).await.unwrap();
        let closing = CashierMovement::new(&cashier.id, MovementKind::Close, Money::from_cents(100), "Fechamento de caixa");
        db.cashiers().close(&cashier.id, Utc::now(), &closing).await.unwrap();

        let sale = CashierMovement::new(&cashier.id, MovementKind::Sale, Money::from_cents(10), "x");
        let err = db.cashiers().record_sale(&cashier.id, 10, &sale).await.unwrap_err();
        assert!(matches!(err, DbError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_sale_feeds_daily_rollup() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let (cashier, opening) = open_cashier(0);
        db.cashiers().open(&cashier, &opening).await.unwrap();

        let sale = CashierMovement::new(&cashier.id, MovementKind::Sale, Money::from_cents(3_200), "Pagamento");
        db.cashiers().record_sale(&cashier.id, 3_200, &sale).await.unwrap();

        let day = db.daily_sales().get(sale.created_at.date_naive()).await.unwrap().unwrap();
        assert_eq!(day.total_sales_cents, 3_200);
        assert_eq!(day.total_orders, 1);
    }

    #[tokio::test]
    async fn test_overdraw_is_refused_by_the_update() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let repo = db.cashiers();
        let (cashier, opening) = open_cashier(1_000);
        repo.open(&cashier, &opening).await.unwrap();

        let out = |cents| CashierMovement::new(&cashier.id, MovementKind::ChangeOut, Money::from_cents(cents), "Sangria");

        let first = out(800);
        repo.record_adjustment(&cashier.id, -800, &first).await.unwrap();

        // a second withdrawal that read the old balance of 1000
        let second = out(800);
        let err = repo.record_adjustment(&cashier.id, -800, &second).await.unwrap_err();
        assert!(matches!(
            err,
            DbError::Domain(CoreError::InsufficientDrawer { available: 200, requested: 800 })
        ));

        assert_eq!(load(&db, &cashier.id).await.current_amount_cents, 200);
        let movements = repo.list_movements(&cashier.id).await.unwrap();
        assert_eq!(movements.len(), 2);

        // emptying the drawer exactly is allowed
        repo.record_adjustment(&cashier.id, -200, &out(200)).await.unwrap();
        assert_eq!(load(&db, &cashier.id).await.current_amount_cents, 0);

        let missing = repo.record_adjustment(&new_id(), -1, &out(1)).await.unwrap_err();
        assert!(matches!(missing, DbError::NotFound { .. }));
    }
}
