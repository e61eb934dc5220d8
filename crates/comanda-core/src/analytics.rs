//! # Analytics
//!
//! Sales metrics computed from finished orders and their payments, plus
//! the zero-filled daily series built from the `daily_sales` rollup.
//!
//! ## Periods
//! ```text
//!   last week              this week (Sun..)       today
//!   ├──────────────────────┼───────────────────────┼────┤
//!   week_start - 7d        week_start              today
//!
//!   month: from the 1st of the current month
//! ```
//!
//! Everything is evaluated in UTC.

use std::collections::HashSet;

use chrono::{DateTime, Datelike, Duration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::money::Money;
use crate::types::{DailySales, OrderDetail, OrderPayment, PaymentMethod};

// =============================================================================
// Periods
// =============================================================================

/// Calendar boundaries relative to a reference instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Period {
    pub today: NaiveDate,
    /// Most recent Sunday (today when today is Sunday).
    pub week_start: NaiveDate,
    pub month_start: NaiveDate,
    pub last_week_start: NaiveDate,
}

impl Period {
    pub fn at(now: DateTime<Utc>) -> Self {
        let today = now.date_naive();
        let week_start =
            today - Duration::days(i64::from(today.weekday().num_days_from_sunday()));
        let month_start = today.with_day(1).unwrap_or(today);
        Period {
            today,
            week_start,
            month_start,
            last_week_start: week_start - Duration::days(7),
        }
    }

    pub fn is_today(&self, at: DateTime<Utc>) -> bool {
        at.date_naive() == self.today
    }

    pub fn in_week(&self, at: DateTime<Utc>) -> bool {
        at.date_naive() >= self.week_start
    }

    pub fn in_month(&self, at: DateTime<Utc>) -> bool {
        at.date_naive() >= self.month_start
    }

    /// `[week_start - 7d, week_start)`
    pub fn in_last_week(&self, at: DateTime<Utc>) -> bool {
        let day = at.date_naive();
        day >= self.last_week_start && day < self.week_start
    }
}

// =============================================================================
// Metrics
// =============================================================================

/// Revenue per payment method, in centavos.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub struct PaymentMethodTotals {
    pub dinheiro: i64,
    pub pix: i64,
    pub cartao_credito: i64,
    pub cartao_debito: i64,
}

impl PaymentMethodTotals {
    pub fn add(&mut self, method: PaymentMethod, cents: i64) {
        match method {
            PaymentMethod::Dinheiro => self.dinheiro += cents,
            PaymentMethod::Pix => self.pix += cents,
            PaymentMethod::CartaoCredito => self.cartao_credito += cents,
            PaymentMethod::CartaoDebito => self.cartao_debito += cents,
        }
    }
}

/// Dashboard numbers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Metrics {
    pub total_today: i64,
    pub total_week: i64,
    pub total_month: i64,
    pub orders_today: i64,
    pub orders_week: i64,
    pub orders_month: i64,
    /// Mean order value of today's finished orders.
    pub average_ticket: i64,
    /// Percent change of this week's revenue over last week's. Display only.
    pub growth_rate: f64,
    pub payment_methods: PaymentMethodTotals,
}

/// Computes [`Metrics`] as of `now`.
///
/// Only finished orders count, and only payments that belong to them.
/// Revenue is bucketed by payment time, order counts by order time.
pub fn compute_metrics(
    orders: &[OrderDetail],
    payments: &[OrderPayment],
    now: DateTime<Utc>,
) -> Metrics {
    let period = Period::at(now);

    let finished: Vec<&OrderDetail> = orders.iter().filter(|o| o.order.finished).collect();
    let finished_ids: HashSet<&str> = finished.iter().map(|o| o.order.id.as_str()).collect();
    let paid: Vec<&OrderPayment> = payments
        .iter()
        .filter(|p| finished_ids.contains(p.order_id.as_str()))
        .collect();

    let sum_where = |pred: &dyn Fn(DateTime<Utc>) -> bool| -> i64 {
        paid.iter()
            .filter(|p| pred(p.created_at))
            .map(|p| Money::from_cents(p.amount_cents))
            .sum::<Money>()
            .cents()
    };
    let count_where = |pred: &dyn Fn(DateTime<Utc>) -> bool| -> i64 {
        finished.iter().filter(|o| pred(o.order.created_at)).count() as i64
    };

    let total_week = sum_where(&|t| period.in_week(t));
    let last_week = sum_where(&|t| period.in_last_week(t));

    let today_orders: Vec<&&OrderDetail> = finished
        .iter()
        .filter(|o| period.is_today(o.order.created_at))
        .collect();
    let average_ticket = if today_orders.is_empty() {
        0
    } else {
        let sum: Money = today_orders.iter().map(|o| o.total()).sum();
        sum.cents() / today_orders.len() as i64
    };

    let growth_rate = if last_week > 0 {
        total_week.saturating_sub(last_week) as f64 / last_week as f64 * 100.0
    } else {
        0.0
    };

    let mut payment_methods = PaymentMethodTotals::default();
    for p in &paid {
        payment_methods.add(p.payment_method, p.amount_cents);
    }

    Metrics {
        total_today: sum_where(&|t| period.is_today(t)),
        total_week,
        total_month: sum_where(&|t| period.in_month(t)),
        orders_today: today_orders.len() as i64,
        orders_week: count_where(&|t| period.in_week(t)),
        orders_month: count_where(&|t| period.in_month(t)),
        average_ticket,
        growth_rate,
        payment_methods,
    }
}

// =============================================================================
// Daily Series
// =============================================================================

/// One calendar day of sales.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct DailyPoint {
    #[ts(as = "String")]
    pub date: NaiveDate,
    pub total_sales_cents: i64,
    pub total_orders: i64,
}

/// A contiguous run of days with totals.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct DailySeries {
    #[ts(as = "String")]
    pub start: NaiveDate,
    #[ts(as = "String")]
    pub end: NaiveDate,
    pub days: Vec<DailyPoint>,
    pub total_sales_cents: i64,
    pub total_orders: i64,
}

impl From<&DailySales> for DailyPoint {
    fn from(row: &DailySales) -> Self {
        DailyPoint {
            date: row.date,
            total_sales_cents: row.total_sales_cents,
            total_orders: row.total_orders,
        }
    }
}

/// One point per day in `[start, end]`, zero where no rollup row exists.
///
/// An inverted range yields an empty series.
pub fn daily_series(rows: &[DailySales], start: NaiveDate, end: NaiveDate) -> DailySeries {
    let days: Vec<DailyPoint> = start
        .iter_days()
        .take_while(|d| *d <= end)
        .map(|date| {
            rows.iter()
                .find(|r| r.date == date)
                .map(DailyPoint::from)
                .unwrap_or(DailyPoint {
                    date,
                    total_sales_cents: 0,
                    total_orders: 0,
                })
        })
        .collect();

    DailySeries {
        start,
        end,
        total_sales_cents: days
            .iter()
            .fold(0_i64, |acc, d| acc.saturating_add(d.total_sales_cents)),
        total_orders: days.iter().fold(0_i64, |acc, d| acc.saturating_add(d.total_orders)),
        days,
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{new_id, Order, OrderLine, OrderType, ProductSummary};
    use chrono::TimeZone;

    // Wednesday
    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 10, 14, 15, 0, 0).unwrap()
    }

    fn order(created_at: DateTime<Utc>, finished: bool, total_cents: i64) -> OrderDetail {
        let mut order = Order::new(OrderType::Mesa);
        order.created_at = created_at;
        order.finished = finished;
        OrderDetail {
            order,
            lines: vec![OrderLine {
                id: new_id(),
                product_id: "p".to_string(),
                amount: 1,
                is_paid: finished,
                product: Some(ProductSummary {
                    id: "p".to_string(),
                    name: "Prato".to_string(),
                    price_cents: total_cents,
                    description: String::new(),
                }),
            }],
        }
    }

    fn payment(order: &OrderDetail, method: PaymentMethod, cents: i64, at: DateTime<Utc>) -> OrderPayment {
        OrderPayment {
            id: new_id(),
            order_id: order.order.id.clone(),
            payment_method: method,
            amount_cents: cents,
            received_amount_cents: cents,
            is_partial: false,
            item_ids: vec![],
            created_at: at,
        }
    }

    #[test]
    fn test_period_boundaries() {
        let p = Period::at(now());
        assert_eq!(p.today, NaiveDate::from_ymd_opt(2026, 10, 14).unwrap());
        assert_eq!(p.week_start, NaiveDate::from_ymd_opt(2026, 10, 11).unwrap());
        assert_eq!(p.month_start, NaiveDate::from_ymd_opt(2026, 10, 1).unwrap());
        assert_eq!(p.last_week_start, NaiveDate::from_ymd_opt(2026, 10, 4).unwrap());

        let sunday = Utc.with_ymd_and_hms(2026, 10, 11, 9, 0, 0).unwrap();
        assert_eq!(Period::at(sunday).week_start, sunday.date_naive());
    }

    #[test]
    fn test_metrics_only_count_finished_orders() {
        let today = now();
        let monday = Utc.with_ymd_and_hms(2026, 10, 12, 12, 0, 0).unwrap();
        let last_week = Utc.with_ymd_and_hms(2026, 10, 6, 12, 0, 0).unwrap();

        let a = order(today, true, 3000);
        let b = order(today, true, 5000);
        let c = order(monday, true, 2000);
        let d = order(last_week, true, 4000);
        let open = order(today, false, 9999);

        let payments = vec![
            payment(&a, PaymentMethod::Pix, 3000, today),
            payment(&b, PaymentMethod::Dinheiro, 5000, today),
            payment(&c, PaymentMethod::CartaoDebito, 2000, monday),
            payment(&d, PaymentMethod::CartaoCredito, 4000, last_week),
            payment(&open, PaymentMethod::Pix, 9999, today),
        ];

        let m = compute_metrics(&[a, b, c, d, open], &payments, today);

        assert_eq!(m.total_today, 8000);
        assert_eq!(m.total_week, 10000);
        assert_eq!(m.total_month, 14000);
        assert_eq!(m.orders_today, 2);
        assert_eq!(m.orders_week, 3);
        assert_eq!(m.orders_month, 4);
        assert_eq!(m.average_ticket, 4000);
        assert!((m.growth_rate - 150.0).abs() < f64::EPSILON);
        assert_eq!(m.payment_methods.pix, 3000);
        assert_eq!(m.payment_methods.cartao_credito, 4000);
    }

    #[test]
    fn test_metrics_empty() {
        let m = compute_metrics(&[], &[], now());
        assert_eq!(m.total_today, 0);
        assert_eq!(m.average_ticket, 0);
        assert_eq!(m.growth_rate, 0.0);
    }

    #[test]
    fn test_payment_methods_wire_names() {
        let json = serde_json::to_value(PaymentMethodTotals::default()).unwrap();
        assert!(json.get("CARTAO_CREDITO").is_some());
        assert!(json.get("DINHEIRO").is_some());
    }

    #[test]
    fn test_daily_series_zero_fills() {
        let day = |d| NaiveDate::from_ymd_opt(2026, 10, d).unwrap();
        let rows = vec![DailySales {
            id: new_id(),
            date: day(12),
            total_sales_cents: 4500,
            total_orders: 3,
            last_updated: now(),
            created_at: now(),
        }];

        let series = daily_series(&rows, day(10), day(14));
        assert_eq!(series.days.len(), 5);
        assert_eq!(series.days[0].date, day(10));
        assert_eq!(series.days[2].total_sales_cents, 4500);
        assert_eq!(series.days[4].total_orders, 0);
        assert_eq!(series.total_sales_cents, 4500);
        assert_eq!(series.total_orders, 3);

        assert!(daily_series(&rows, day(14), day(10)).days.is_empty());
    }
}
