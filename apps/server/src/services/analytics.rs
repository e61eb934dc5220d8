//! Sales dashboard: live metrics from orders and payments, daily totals
//! from the `daily_sales` rollup.

use chrono::{Duration, NaiveDate, Utc};
use tracing::info;

use comanda_core::analytics::{compute_metrics, daily_series, DailyPoint, DailySeries, Metrics};
use comanda_core::validation::validate_positive_amount;
use comanda_core::ValidationError;
use comanda_db::Database;

use crate::error::{ApiError, ApiResult};

/// Longest window `daily_sales` serves.
pub const MAX_SERIES_DAYS: i64 = 366;

pub struct AnalyticsService {
    db: Database,
}

impl AnalyticsService {
    pub fn new(db: Database) -> Self {
        AnalyticsService { db }
    }

    pub async fn metrics(&self) -> ApiResult<Metrics> {
        let orders = self.db.orders().list_finished().await?;
        let payments = self.db.payments().list_all().await?;
        Ok(compute_metrics(&orders, &payments, Utc::now()))
    }

    /// The last `days` days, today included.
    pub async fn daily_sales(&self, days: i64) -> ApiResult<DailySeries> {
        if !(1..=MAX_SERIES_DAYS).contains(&days) {
            return Err(ValidationError::OutOfRange {
                field: "days".to_string(),
                min: 1,
                max: MAX_SERIES_DAYS,
            }
            .into());
        }

        let end = Utc::now().date_naive();
        let start = end - Duration::days(days - 1);
        self.range(start, end).await
    }

    pub async fn daily(&self, date: NaiveDate) -> ApiResult<DailyPoint> {
        Ok(match self.db.daily_sales().get(date).await? {
            Some(row) => DailyPoint::from(&row),
            None => DailyPoint {
                date,
                total_sales_cents: 0,
                total_orders: 0,
            },
        })
    }

    pub async fn range(&self, start: NaiveDate, end: NaiveDate) -> ApiResult<DailySeries> {
        if start > end {
            return Err(ApiError::validation("start must not be after end"));
        }
        let rows = self.db.daily_sales().range(start, end).await?;
        Ok(daily_series(&rows, start, end))
    }

    pub async fn record_sale(&self, date: NaiveDate, amount_cents: i64) -> ApiResult<()> {
        validate_positive_amount("amount", amount_cents)?;
        self.db.daily_sales().upsert(date, amount_cents, false).await?;
        Ok(())
    }

    /// Takes a refund off the day's total without touching the order count.
    pub async fn record_refund(&self, date: NaiveDate, amount_cents: i64) -> ApiResult<()> {
        validate_positive_amount("amount", amount_cents)?;
        self.db.daily_sales().upsert(date, amount_cents, true).await?;
        info!(%date, amount = amount_cents, "Refund recorded");
        Ok(())
    }
}
