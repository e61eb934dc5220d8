//! Partial payments against an order ("split the bill").

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::info;

use comanda_core::settlement::{lines_total, PaymentProgress};
use comanda_core::validation::validate_positive_amount;
use comanda_core::{new_id, Money, OrderPayment, PaymentMethod};
use comanda_db::Database;

use crate::error::{ApiError, ApiResult};

#[derive(Debug, Clone, Deserialize)]
pub struct PartialPaymentRequest {
    /// Items covered. Absent or empty means the whole order.
    #[serde(default)]
    pub item_ids: Option<Vec<String>>,
    #[serde(default)]
    pub payment_method: PaymentMethod,
    pub received_amount_cents: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct PartialPaymentResult {
    pub success: bool,
    pub remaining_amount_cents: i64,
    pub total_received_cents: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct OrderPayments {
    pub payments: Vec<OrderPayment>,
    pub total_received_cents: i64,
    pub remaining_amount_cents: i64,
    /// Every item, paid or not.
    pub order_total_cents: i64,
}

pub struct OrderPaymentService {
    db: Database,
}

impl OrderPaymentService {
    pub fn new(db: Database) -> Self {
        OrderPaymentService { db }
    }

    /// Records a payment for some (or all) items of an order.
    ///
    /// ## What This Does
    /// 1. Prices the selected items (all items when none are given)
    /// 2. Adds the new amount to what the order already received
    /// 3. Stores the payment and flags the covered items as paid
    /// 4. Finishes the order once nothing remains
    pub async fn receive_partial(
        &self,
        order_id: &str,
        request: PartialPaymentRequest,
    ) -> ApiResult<PartialPaymentResult> {
        validate_positive_amount("received_amount", request.received_amount_cents)?;

        let detail = self
            .db
            .orders()
            .get_detail(order_id)
            .await?
            .ok_or_else(|| ApiError::not_found("Order not found"))?;

        let item_ids = request.item_ids.unwrap_or_default();
        let target = lines_total(&detail.lines, Some(item_ids.as_slice()));

        let previous: Money = self
            .db
            .payments()
            .list_by_order(order_id)
            .await?
            .iter()
            .map(|p| Money::from_cents(p.amount_cents))
            .sum();

        let received = Money::from_cents(request.received_amount_cents);
        let progress = PaymentProgress::compute(target, previous, received);

        let payment = OrderPayment {
            id: new_id(),
            order_id: order_id.to_string(),
            payment_method: request.payment_method,
            amount_cents: received.cents(),
            received_amount_cents: received.cents(),
            is_partial: true,
            item_ids,
            created_at: Utc::now(),
        };
        self.db.payments().insert(&payment, progress.settled).await?;

        info!(
            order_id = %order_id,
            amount = received.cents(),
            method = %payment.payment_method,
            remaining = progress.remaining.cents(),
            settled = progress.settled,
            "Partial payment received"
        );

        Ok(PartialPaymentResult {
            success: true,
            remaining_amount_cents: progress.remaining.cents(),
            total_received_cents: progress.total_received.cents(),
        })
    }

    pub async fn get_payments(&self, order_id: &str) -> ApiResult<OrderPayments> {
        let detail = self
            .db
            .orders()
            .get_detail(order_id)
            .await?
            .ok_or_else(|| ApiError::not_found("Order not found"))?;

        let payments = self.db.payments().list_by_order(order_id).await?;
        let total_received: Money = payments
            .iter()
            .map(|p| Money::from_cents(p.amount_cents))
            .sum();
        let order_total = detail.total();

        Ok(OrderPayments {
            payments,
            total_received_cents: total_received.cents(),
            remaining_amount_cents: (order_total - total_received).clamp_zero().cents(),
            order_total_cents: order_total.cents(),
        })
    }
}
