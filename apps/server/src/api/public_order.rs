//! Anonymous order endpoints used by the QR-code menu. Ids travel in the
//! query string or the body instead of the path.

use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::{delete, get, post, put};
use axum::Router;
use serde::Deserialize;

use super::extract::{Json, Query};
use super::order::AddItemRequest;
use super::require_uuid;
use crate::error::{ApiError, ApiResult};
use crate::services::order::{NewOrder, OrderView};
use crate::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct OrderIdQuery {
    pub order_id: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ItemIdQuery {
    pub item_id: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct TableOrdersQuery {
    pub table: Option<i32>,
    pub draft: Option<bool>,
}

pub fn router() -> Router<AppState> {
    Router::new().nest(
        "/api/public/order",
        Router::new()
            .route("/", post(create))
            .route("/detail", get(detail))
            .route("/orders", get(orders_by_table))
            .route("/add", post(add_item))
            .route("/send", put(send))
            .route("/remove", delete(remove_item)),
    )
}

/// Missing and malformed ids get the same answer.
fn required_id(name: &str, id: Option<String>) -> ApiResult<String> {
    let id = id.unwrap_or_default();
    require_uuid(name, id.trim())?;
    Ok(id.trim().to_string())
}

/// POST /api/public/order
async fn create(
    State(state): State<AppState>,
    Json(request): Json<NewOrder>,
) -> ApiResult<(StatusCode, Json<OrderView>)> {
    let order = state.orders().create(request).await?;
    Ok((StatusCode::CREATED, Json(order)))
}

/// GET /api/public/order/detail?order_id
async fn detail(
    State(state): State<AppState>,
    Query(query): Query<OrderIdQuery>,
) -> ApiResult<Json<OrderView>> {
    let order_id = required_id("order", query.order_id)?;
    Ok(Json(state.orders().get(&order_id).await?))
}

/// GET /api/public/order/orders?table&draft
async fn orders_by_table(
    State(state): State<AppState>,
    Query(query): Query<TableOrdersQuery>,
) -> ApiResult<Json<Vec<OrderView>>> {
    let table = query
        .table
        .ok_or_else(|| ApiError::validation("table is required"))?;

    let mut orders = state.orders().list_by_table(table, None).await?;
    if let Some(draft) = query.draft {
        orders.retain(|o| o.order.draft == draft);
    }
    Ok(Json(orders))
}

/// POST /api/public/order/add
async fn add_item(
    State(state): State<AppState>,
    Json(request): Json<AddItemRequest>,
) -> ApiResult<Json<OrderView>> {
    let order_id = required_id("order", request.order_id)?;
    require_uuid("product", &request.product_id)?;
    let view = state
        .orders()
        .add_item(&order_id, &request.product_id, request.amount)
        .await?;
    Ok(Json(view))
}

/// PUT /api/public/order/send?order_id
async fn send(
    State(state): State<AppState>,
    Query(query): Query<OrderIdQuery>,
) -> ApiResult<Json<OrderView>> {
    let order_id = required_id("order", query.order_id)?;
    Ok(Json(state.orders().send(&order_id).await?))
}

/// DELETE /api/public/order/remove?item_id
async fn remove_item(
    State(state): State<AppState>,
    Query(query): Query<ItemIdQuery>,
) -> ApiResult<StatusCode> {
    let item_id = required_id("item", query.item_id)?;
    state.orders().remove_item(&item_id).await?;
    Ok(StatusCode::NO_CONTENT)
}
