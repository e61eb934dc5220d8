//! Dashboard routes. Dates are `YYYY-MM-DD`.

use axum::extract::State;
use axum::routing::get;
use axum::Router;
use chrono::{NaiveDate, Utc};
use serde::Deserialize;

use comanda_core::analytics::{DailyPoint, DailySeries, Metrics};

use super::extract::{Json, Query};
use crate::auth::CurrentUser;
use crate::error::{ApiError, ApiResult};
use crate::AppState;

const DEFAULT_SERIES_DAYS: i64 = 7;

#[derive(Debug, Default, Deserialize)]
pub struct DaysQuery {
    pub days: Option<i64>,
}

#[derive(Debug, Default, Deserialize)]
pub struct DateQuery {
    pub date: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct RangeQuery {
    pub start: Option<String>,
    pub end: Option<String>,
}

pub fn router() -> Router<AppState> {
    Router::new().nest(
        "/api/analytics",
        Router::new()
            .route("/metrics", get(metrics))
            .route("/daily-sales", get(daily_sales))
            .route("/daily", get(daily))
            .route("/range", get(range)),
    )
}

fn parse_date(field: &str, value: Option<&str>) -> ApiResult<NaiveDate> {
    let value = value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .ok_or_else(|| ApiError::validation(format!("{field} is required")))?;

    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .map_err(|_| ApiError::validation(format!("{field} must be a date in YYYY-MM-DD format")))
}

/// GET /api/analytics/metrics
async fn metrics(State(state): State<AppState>, _user: CurrentUser) -> ApiResult<Json<Metrics>> {
    Ok(Json(state.analytics().metrics().await?))
}

/// GET /api/analytics/daily-sales?days
async fn daily_sales(
    State(state): State<AppState>,
    _user: CurrentUser,
    Query(query): Query<DaysQuery>,
) -> ApiResult<Json<DailySeries>> {
    let days = query.days.unwrap_or(DEFAULT_SERIES_DAYS);
    Ok(Json(state.analytics().daily_sales(days).await?))
}

/// GET /api/analytics/daily?date
///
/// Today when no date is given.
async fn daily(
    State(state): State<AppState>,
    _user: CurrentUser,
    Query(query): Query<DateQuery>,
) -> ApiResult<Json<DailyPoint>> {
    let date = match query.date.as_deref() {
        None => Utc::now().date_naive(),
        Some(value) => parse_date("date", Some(value))?,
    };
    Ok(Json(state.analytics().daily(date).await?))
}

/// GET /api/analytics/range?start&end
async fn range(
    State(state): State<AppState>,
    _user: CurrentUser,
    Query(query): Query<RangeQuery>,
) -> ApiResult<Json<DailySeries>> {
    let start = parse_date("start", query.start.as_deref())?;
    let end = parse_date("end", query.end.as_deref())?;
    Ok(Json(state.analytics().range(start, end).await?))
}
