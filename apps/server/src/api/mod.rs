//! # HTTP API
//!
//! One module per resource. Each exposes `router()`, merged here into the
//! application router.
//!
//! ```text
//! /api/health              health
//! /api/auth/*              auth
//! /api/category/*          category
//! /api/product/*           product     (+ /api/public/products)
//! /api/table/*             table
//! /api/order/*             order
//! /api/public/order/*      public_order
//! /api/cashier/*           cashier     (+ /api/caixa alias)
//! /api/print/*             print       (+ /api/public/print)
//! /api/analytics/*         analytics
//! ```
//!
//! Access is decided by the extractors a handler takes: none (anonymous),
//! [`CurrentUser`](crate::auth::CurrentUser) or
//! [`AdminUser`](crate::auth::AdminUser).

pub mod analytics;
pub mod auth;
pub mod cashier;
pub mod category;
pub mod extract;
pub mod health;
pub mod order;
pub mod print;
pub mod product;
pub mod public_order;
pub mod table;

use axum::Router;
use uuid::Uuid;

use crate::error::{ApiError, ApiResult};
use crate::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .merge(health::router())
        .merge(auth::router())
        .merge(category::router())
        .merge(product::router())
        .merge(table::router())
        .merge(order::router())
        .merge(public_order::router())
        .merge(cashier::router())
        .merge(print::router())
        .merge(analytics::router())
}

/// Rejects ids that are not UUIDs with `Invalid <name> id`.
pub(crate) fn require_uuid(name: &str, id: &str) -> ApiResult<()> {
    Uuid::parse_str(id)
        .map(|_| ())
        .map_err(|_| ApiError::invalid_id(name))
}
