//! # Cashier Service
//!
//! The register. One session at a time; every cash event lands in the
//! session's movement ledger.
//!
//! ```text
//!   open(initial) ──► OPEN ──┬── receive_payment ──► SALE (+ daily rollup)
//!                            ├── adjust ───────────► CHANGE_IN / CHANGE_OUT
//!                            └── close ────────────► CLOSE (amount = drawer)
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;

use comanda_core::settlement::change_due;
use comanda_core::validation::{validate_positive_amount, validate_uuid};
use comanda_core::{
    new_id, Cashier, CashierMovement, CoreError, MovementKind, Money, PaymentMethod,
};
use comanda_db::Database;

use crate::auth::CurrentUser;
use crate::error::{ApiError, ApiResult};

const ALREADY_OPEN: &str = "A cashier is already open";
const NONE_OPEN: &str = "No cashier is open";

/// `GET /status` body: the open session, or `{"is_open": false}`.
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum CashierStatus {
    Open(Cashier),
    Closed { is_open: bool },
}

#[derive(Debug, Clone, Deserialize)]
pub struct ReceivePayment {
    pub order_id: Option<String>,
    pub amount_cents: i64,
    /// Any spelling `PaymentMethod` accepts. Defaults to DINHEIRO.
    pub payment_method: Option<String>,
    pub received_amount_cents: Option<i64>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CashierPayment {
    pub id: String,
    pub order_id: String,
    pub amount_cents: i64,
    pub payment_method: PaymentMethod,
    pub received_amount_cents: i64,
    pub change_cents: i64,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DrawerAdjustment {
    pub kind: MovementKind,
    pub amount_cents: i64,
    pub observation: Option<String>,
}

pub struct CashierService {
    db: Database,
}

impl CashierService {
    pub fn new(db: Database) -> Self {
        CashierService { db }
    }

    pub async fn status(&self) -> ApiResult<CashierStatus> {
        Ok(match self.db.cashiers().get_open().await? {
            Some(cashier) => CashierStatus::Open(cashier),
            None => CashierStatus::Closed { is_open: false },
        })
    }

    pub async fn open(&self, initial_amount_cents: i64, user: &CurrentUser) -> ApiResult<Cashier> {
        validate_positive_amount("initial_amount", initial_amount_cents)?;

        if self.db.cashiers().get_open().await?.is_some() {
            return Err(ApiError::invalid_operation(ALREADY_OPEN));
        }

        let now = Utc::now();
        let cashier = Cashier {
            id: new_id(),
            is_open: true,
            opened_at: now,
            closed_at: None,
            opened_by: user.id.clone(),
            initial_amount_cents,
            current_amount_cents: initial_amount_cents,
            total_sales_cents: 0,
            total_orders: 0,
            created_at: now,
        };
        let movement = CashierMovement::new(
            &cashier.id,
            MovementKind::Open,
            Money::from_cents(initial_amount_cents),
            "Abertura de caixa",
        );

        self.db
            .cashiers()
            .open(&cashier, &movement)
            .await
            .map_err(|e| {
                if e.is_unique_violation() {
                    ApiError::invalid_operation(ALREADY_OPEN)
                } else {
                    e.into()
                }
            })?;

        info!(cashier_id = %cashier.id, opened_by = %user.id, initial = initial_amount_cents, "Cashier opened");
        Ok(cashier)
    }

    pub async fn close(&self) -> ApiResult<Cashier> {
        let mut cashier = self.require_open().await?;

        let closed_at = Utc::now();
        let movement = CashierMovement::new(
            &cashier.id,
            MovementKind::Close,
            cashier.current_amount(),
            "Fechamento de caixa",
        );
        self.db.cashiers().close(&cashier.id, closed_at, &movement).await?;

        info!(
            cashier_id = %cashier.id,
            drawer = cashier.current_amount_cents,
            sales = cashier.total_sales_cents,
            orders = cashier.total_orders,
            "Cashier closed"
        );

        cashier.is_open = false;
        cashier.closed_at = Some(closed_at);
        Ok(cashier)
    }

    /// Books an order payment on the open register.
    ///
    /// ## Effects (one transaction)
    /// - SALE movement carrying the method and the change given
    /// - drawer and sales totals grow by `amount`, one more order
    /// - today's daily rollup grows by `amount`
    pub async fn receive_payment(&self, request: ReceivePayment) -> ApiResult<CashierPayment> {
        let order_id = request
            .order_id
            .as_deref()
            .map(str::trim)
            .unwrap_or_default()
            .to_string();
        validate_uuid("order_id", &order_id)?;
        validate_positive_amount("amount", request.amount_cents)?;

        let method = match request.payment_method.as_deref().map(str::trim) {
            None | Some("") => PaymentMethod::default(),
            Some(m) => m.parse::<PaymentMethod>()?,
        };

        let amount = Money::from_cents(request.amount_cents);
        let received = request.received_amount_cents.map(Money::from_cents);
        let change = change_due(amount, received)?;

        let cashier = self.require_open().await?;

        let mut observation = format!("Pagamento do pedido {order_id} - Método: {method}");
        if change.is_positive() {
            observation.push_str(&format!(" - Troco: {change}"));
        }
        let movement =
            CashierMovement::new(&cashier.id, MovementKind::Sale, amount, observation).with_method(method);

        self.db
            .cashiers()
            .record_sale(&cashier.id, amount.cents(), &movement)
            .await?;

        info!(
            cashier_id = %cashier.id,
            order_id = %order_id,
            amount = amount.cents(),
            method = %method,
            change = change.cents(),
            "Payment received"
        );

        Ok(CashierPayment {
            id: movement.id,
            order_id,
            amount_cents: amount.cents(),
            payment_method: method,
            received_amount_cents: received.unwrap_or(amount).cents(),
            change_cents: change.cents(),
            created_at: movement.created_at,
        })
    }

    /// Puts change into the drawer or takes cash out of it.
    ///
    /// A cash-out that would leave the drawer below zero is refused here
    /// and again by the repository's guarded UPDATE.
    pub async fn adjust(&self, request: DrawerAdjustment) -> ApiResult<CashierMovement> {
        validate_positive_amount("amount", request.amount_cents)?;

        let delta = match request.kind {
            MovementKind::ChangeIn => request.amount_cents,
            MovementKind::ChangeOut => -request.amount_cents,
            _ => {
                return Err(ApiError::validation(
                    "kind must be one of: CHANGE_IN, CHANGE_OUT",
                ))
            }
        };

        let cashier = self.require_open().await?;

        if cashier.current_amount_cents.saturating_add(delta) < 0 {
            return Err(CoreError::InsufficientDrawer {
                available: cashier.current_amount_cents,
                requested: request.amount_cents,
            }
            .into());
        }

        let movement = CashierMovement::new(
            &cashier.id,
            request.kind,
            Money::from_cents(request.amount_cents),
            request.observation.unwrap_or_default(),
        );
        self.db
            .cashiers()
            .record_adjustment(&cashier.id, delta, &movement)
            .await?;

        info!(cashier_id = %cashier.id, kind = ?request.kind, delta, "Drawer adjusted");
        Ok(movement)
    }

    /// The open session's ledger; empty when the register is closed.
    pub async fn movements(&self) -> ApiResult<Vec<CashierMovement>> {
        match self.db.cashiers().get_open().await? {
            Some(cashier) => Ok(self.db.cashiers().list_movements(&cashier.id).await?),
            None => Ok(Vec::new()),
        }
    }

    async fn require_open(&self) -> ApiResult<Cashier> {
        self.db
            .cashiers()
            .get_open()
            .await?
            .ok_or_else(|| ApiError::invalid_operation(NONE_OPEN))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;
    use crate::services::test_support;
    use comanda_core::MAX_AMOUNT_CENTS;

    fn user() -> CurrentUser {
        let staff = test_support::staff();
        CurrentUser {
            id: staff.id,
            email: staff.email,
            name: staff.name,
            role: staff.role,
        }
    }

    fn payment(amount: i64, received: Option<i64>, method: Option<&str>) -> ReceivePayment {
        ReceivePayment {
            order_id: Some(new_id()),
            amount_cents: amount,
            payment_method: method.map(str::to_string),
            received_amount_cents: received,
        }
    }

    #[tokio::test]
    async fn test_open_and_close() {
        let service = CashierService::new(test_support::db().await);

        assert!(matches!(
            service.status().await.unwrap(),
            CashierStatus::Closed { is_open: false }
        ));

        let cashier = service.open(10_000, &user()).await.unwrap();
        assert_eq!(cashier.current_amount_cents, 10_000);

        let err = service.open(5_000, &user()).await.unwrap_err();
        assert_eq!(err.message, ALREADY_OPEN);

        let closed = service.close().await.unwrap();
        assert!(!closed.is_open);
        assert!(closed.closed_at.is_some());

        let err = service.close().await.unwrap_err();
        assert_eq!(err.code, ErrorCode::InvalidOperation);
        assert_eq!(err.message, NONE_OPEN);
    }

    #[tokio::test]
    async fn test_open_requires_positive_amount() {
        let service = CashierService::new(test_support::db().await);
        let err = service.open(0, &user()).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::ValidationError);
    }

    #[tokio::test]
    async fn test_receive_payment_with_change() {
        let db = test_support::db().await;
        let service = CashierService::new(db.clone());
        service.open(5_000, &user()).await.unwrap();

        let request = payment(1_800, Some(2_000), Some("dinheiro"));
        let order_id = request.order_id.clone().unwrap();
        let receipt = service.receive_payment(request).await.unwrap();

        assert_eq!(receipt.change_cents, 200);
        assert_eq!(receipt.received_amount_cents, 2_000);
        assert_eq!(receipt.payment_method, PaymentMethod::Dinheiro);

        let CashierStatus::Open(cashier) = service.status().await.unwrap() else {
            panic!("cashier should be open");
        };
        assert_eq!(cashier.current_amount_cents, 6_800);
        assert_eq!(cashier.total_sales_cents, 1_800);
        assert_eq!(cashier.total_orders, 1);

        let movements = service.movements().await.unwrap();
        assert_eq!(movements.len(), 2);
        assert_eq!(movements[1].kind, MovementKind::Sale);
        assert_eq!(
            movements[1].observation,
            format!("Pagamento do pedido {order_id} - Método: DINHEIRO - Troco: R$ 2.00")
        );

        let today = db
            .daily_sales()
            .get(receipt.created_at.date_naive())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(today.total_sales_cents, 1_800);
        assert_eq!(today.total_orders, 1);
    }

    #[tokio::test]
    async fn test_receive_payment_defaults() {
        let service = CashierService::new(test_support::db().await);
        service.open(1_000, &user()).await.unwrap();

        let receipt = service.receive_payment(payment(500, None, None)).await.unwrap();
        assert_eq!(receipt.payment_method, PaymentMethod::Dinheiro);
        assert_eq!(receipt.received_amount_cents, 500);
        assert_eq!(receipt.change_cents, 0);

        let receipt = service
            .receive_payment(payment(500, None, Some("Crédito")))
            .await
            .unwrap();
        assert_eq!(receipt.payment_method, PaymentMethod::CartaoCredito);

        let movements = service.movements().await.unwrap();
        assert!(!movements[1].observation.contains("Troco"));
    }

    #[tokio::test]
    async fn test_receive_payment_rejections() {
        let service = CashierService::new(test_support::db().await);

        // no register open
        let err = service.receive_payment(payment(500, None, None)).await.unwrap_err();
        assert_eq!(err.message, NONE_OPEN);

        service.open(1_000, &user()).await.unwrap();

        let mut missing_order = payment(500, None, None);
        missing_order.order_id = None;
        assert_eq!(
            service.receive_payment(missing_order).await.unwrap_err().code,
            ErrorCode::ValidationError
        );

        let mut bad_order = payment(500, None, None);
        bad_order.order_id = Some("42".to_string());
        assert_eq!(
            service.receive_payment(bad_order).await.unwrap_err().code,
            ErrorCode::ValidationError
        );

        assert_eq!(
            service.receive_payment(payment(0, None, None)).await.unwrap_err().code,
            ErrorCode::ValidationError
        );
        assert_eq!(
            service
                .receive_payment(payment(MAX_AMOUNT_CENTS + 1, None, None))
                .await
                .unwrap_err()
                .code,
            ErrorCode::ValidationError
        );

        let err = service
            .receive_payment(payment(500, Some(400), None))
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::InvalidOperation);

        let err = service
            .receive_payment(payment(500, None, Some("cheque")))
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::ValidationError);
    }

    #[tokio::test]
    async fn test_adjustments() {
        let service = CashierService::new(test_support::db().await);

        assert!(service.movements().await.unwrap().is_empty());
        let err = service
            .adjust(DrawerAdjustment {
                kind: MovementKind::ChangeIn,
                amount_cents: 100,
                observation: None,
            })
            .await
            .unwrap_err();
        assert_eq!(err.message, NONE_OPEN);

        service.open(1_000, &user()).await.unwrap();

        service
            .adjust(DrawerAdjustment {
                kind: MovementKind::ChangeIn,
                amount_cents: 500,
                observation: Some("Troco do banco".to_string()),
            })
            .await
            .unwrap();

        let err = service
            .adjust(DrawerAdjustment {
                kind: MovementKind::ChangeOut,
                amount_cents: 1_600,
                observation: None,
            })
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::InvalidOperation);

        service
            .adjust(DrawerAdjustment {
                kind: MovementKind::ChangeOut,
                amount_cents: 1_500,
                observation: None,
            })
            .await
            .unwrap();

        let err = service
            .adjust(DrawerAdjustment {
                kind: MovementKind::Sale,
                amount_cents: 100,
                observation: None,
            })
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::ValidationError);

        let CashierStatus::Open(cashier) = service.status().await.unwrap() else {
            panic!("cashier should be open");
        };
        assert_eq!(cashier.current_amount_cents, 0);
        assert_eq!(service.movements().await.unwrap().len(), 3);
    }
}
