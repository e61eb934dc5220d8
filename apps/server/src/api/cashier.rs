//! Register routes, served under `/api/cashier` and `/api/caixa`.

use axum::extract::State;
use axum::routing::{get, post};
use axum::Router;
use serde::Deserialize;

use comanda_core::{Cashier, CashierMovement};

use super::extract::Json;
use crate::auth::CurrentUser;
use crate::error::ApiResult;
use crate::services::cashier::{CashierPayment, CashierStatus, DrawerAdjustment, ReceivePayment};
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct OpenRequest {
    pub initial_amount_cents: i64,
}

pub fn router() -> Router<AppState> {
    Router::new()
        .nest("/api/cashier", routes())
        .nest("/api/caixa", routes())
}

fn routes() -> Router<AppState> {
    Router::new()
        .route("/status", get(status))
        .route("/open", post(open))
        .route("/close", post(close))
        .route("/receive", post(receive))
        .route("/movement", post(movement))
        .route("/movements", get(movements))
}

/// GET /status
async fn status(State(state): State<AppState>, _user: CurrentUser) -> ApiResult<Json<CashierStatus>> {
    Ok(Json(state.cashier().status().await?))
}

/// POST /open
async fn open(
    State(state): State<AppState>,
    user: CurrentUser,
    Json(request): Json<OpenRequest>,
) -> ApiResult<Json<Cashier>> {
    Ok(Json(state.cashier().open(request.initial_amount_cents, &user).await?))
}

/// POST /close
async fn close(State(state): State<AppState>, _user: CurrentUser) -> ApiResult<Json<Cashier>> {
    Ok(Json(state.cashier().close().await?))
}

/// POST /receive
async fn receive(
    State(state): State<AppState>,
    _user: CurrentUser,
    Json(request): Json<ReceivePayment>,
) -> ApiResult<Json<CashierPayment>> {
    Ok(Json(state.cashier().receive_payment(request).await?))
}

/// POST /movement
async fn movement(
    State(state): State<AppState>,
    _user: CurrentUser,
    Json(request): Json<DrawerAdjustment>,
) -> ApiResult<Json<CashierMovement>> {
    Ok(Json(state.cashier().adjust(request).await?))
}

/// GET /movements
async fn movements(
    State(state): State<AppState>,
    _user: CurrentUser,
) -> ApiResult<Json<Vec<CashierMovement>>> {
    Ok(Json(state.cashier().movements().await?))
}
