//! # Settlement
//!
//! Payment math shared by the register and the partial-payment flow.
//!
//! ```text
//!   order total ───────────────────────────────┐
//!                                              ▼
//!   previous payments ──► + new payment ──► total_received ──► remaining
//!                                                              (≥ 0)
//!                                                                │
//!                                              remaining == 0 ───┴──► settled
//! ```

use serde::{Deserialize, Serialize};

use crate::error::{CoreError, CoreResult};
use crate::money::Money;
use crate::types::OrderLine;

/// Change owed for a payment.
///
/// When nothing was handed over explicitly, the customer paid exactly.
///
/// ## Example
/// ```rust
/// use comanda_core::money::Money;
/// use comanda_core::settlement::change_due;
///
/// let change = change_due(Money::from_cents(1800), Some(Money::from_cents(2000))).unwrap();
/// assert_eq!(change.cents(), 200);
/// assert!(change_due(Money::from_cents(1800), Some(Money::from_cents(1000))).is_err());
/// assert!(change_due(Money::from_cents(1800), None).unwrap().is_zero());
/// ```
pub fn change_due(amount: Money, received: Option<Money>) -> CoreResult<Money> {
    match received {
        None => Ok(Money::zero()),
        Some(received) if received < amount => Err(CoreError::InsufficientPayment {
            due: amount.cents(),
            received: received.cents(),
        }),
        Some(received) => Ok(received - amount),
    }
}

/// Where an order stands after a payment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentProgress {
    pub total_received: Money,
    /// Never negative.
    pub remaining: Money,
    pub settled: bool,
}

impl PaymentProgress {
    pub fn compute(order_total: Money, previous_received: Money, new_received: Money) -> Self {
        let total_received = previous_received + new_received;
        let balance = order_total - total_received;
        PaymentProgress {
            total_received,
            remaining: balance.clamp_zero(),
            settled: !balance.is_positive(),
        }
    }
}

/// Sum of `price × amount` over the selected lines.
///
/// `None` or an empty slice selects every line.
pub fn lines_total(lines: &[OrderLine], item_ids: Option<&[String]>) -> Money {
    match item_ids {
        Some(ids) if !ids.is_empty() => lines
            .iter()
            .filter(|l| ids.iter().any(|id| id == &l.id))
            .map(OrderLine::total)
            .sum(),
        _ => lines.iter().map(OrderLine::total).sum(),
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ProductSummary;

    fn line(id: &str, price_cents: i64, amount: i64) -> OrderLine {
        OrderLine {
            id: id.to_string(),
            product_id: format!("p-{id}"),
            amount,
            is_paid: false,
            product: Some(ProductSummary {
                id: format!("p-{id}"),
                name: "Suco".to_string(),
                price_cents,
                description: String::new(),
            }),
        }
    }

    #[test]
    fn test_change_due_exact() {
        let change = change_due(Money::from_cents(500), Some(Money::from_cents(500))).unwrap();
        assert!(change.is_zero());
    }

    #[test]
    fn test_change_due_insufficient() {
        let err = change_due(Money::from_cents(500), Some(Money::from_cents(499))).unwrap_err();
        assert!(matches!(
            err,
            CoreError::InsufficientPayment {
                due: 500,
                received: 499
            }
        ));
    }

    #[test]
    fn test_progress_partial_then_settled() {
        let total = Money::from_cents(5000);

        let first = PaymentProgress::compute(total, Money::zero(), Money::from_cents(2000));
        assert_eq!(first.remaining.cents(), 3000);
        assert!(!first.settled);

        let second = PaymentProgress::compute(total, first.total_received, Money::from_cents(3500));
        assert_eq!(second.total_received.cents(), 5500);
        assert!(second.remaining.is_zero());
        assert!(second.settled);
    }

    #[test]
    fn test_lines_total_selection() {
        let lines = vec![line("a", 1000, 2), line("b", 450, 1), line("c", 300, 3)];

        assert_eq!(lines_total(&lines, None).cents(), 3350);
        assert_eq!(lines_total(&lines, Some(&[])).cents(), 3350);

        let ids = vec!["a".to_string(), "c".to_string()];
        assert_eq!(lines_total(&lines, Some(&ids)).cents(), 2900);

        let unknown = vec!["zzz".to_string()];
        assert!(lines_total(&lines, Some(&unknown)).is_zero());
    }
}
