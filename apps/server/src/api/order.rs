//! # Order Routes
//!
//! ```text
//! /api/order
//!   POST   /                      create (201)        auth
//!   POST   /public                create (201)        anon
//!   GET    /?draft                list                auth
//!   GET    /search?command&name   search              auth
//!   GET    /public?table&phone    by table            anon
//!   GET    /{id}                  one                 auth
//!   PUT    /{id}/send             to kitchen          auth
//!   PUT    /public/{id}/send      to kitchen          anon
//!   PUT    /{id}/finish           close               auth
//!   PUT    /{id}/viewed           kitchen saw it      auth
//!   PUT    /{id}/info             name / command      auth
//!   PUT    /{id}/command          command number      auth
//!   DELETE /{id}                  delete (204)        auth
//!   POST   /{id}/add              one item            auth
//!   POST   /add                   one item, id in body auth
//!   POST   /public/{id}/add       one item            anon
//!   POST   /{id}/items            several items       auth
//!   DELETE /remove/{item_id}      remove item (204)   auth
//!   POST   /{id}/payments         partial payment     auth
//!   GET    /{id}/payments         payment summary     auth
//! ```

use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::{delete, get, post, put};
use axum::Router;
use serde::Deserialize;

use super::extract::{Json, Path, Query};
use super::require_uuid;
use crate::auth::CurrentUser;
use crate::error::{ApiError, ApiResult};
use crate::services::order::{NewItem, NewOrder, OrderView};
use crate::services::payment::{OrderPayments, PartialPaymentRequest, PartialPaymentResult};
use crate::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct ListQuery {
    pub draft: Option<bool>,
}

#[derive(Debug, Default, Deserialize)]
pub struct SearchQuery {
    pub command: Option<i32>,
    pub name: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct TableQuery {
    pub table: Option<i32>,
    pub phone: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct AddItemRequest {
    /// Only read by `POST /api/order/add`.
    pub order_id: Option<String>,
    pub product_id: String,
    pub amount: i64,
}

#[derive(Debug, Deserialize)]
pub struct AddItemsRequest {
    pub items: Vec<NewItem>,
}

#[derive(Debug, Default, Deserialize)]
pub struct OrderInfoRequest {
    pub name: Option<String>,
    pub command_number: Option<i32>,
}

#[derive(Debug, Default, Deserialize)]
pub struct CommandRequest {
    pub command_number: Option<i32>,
}

pub fn router() -> Router<AppState> {
    Router::new().nest(
        "/api/order",
        Router::new()
            .route("/", post(create).get(list))
            .route("/search", get(search))
            .route("/public", post(create_public).get(list_by_table))
            .route("/public/{id}/send", put(send_public))
            .route("/public/{id}/add", post(add_item_public))
            .route("/add", post(add_item_from_body))
            .route("/remove/{item_id}", delete(remove_item))
            .route("/{id}", get(get_order).delete(delete_order))
            .route("/{id}/send", put(send))
            .route("/{id}/finish", put(finish))
            .route("/{id}/viewed", put(mark_viewed))
            .route("/{id}/info", put(update_info))
            .route("/{id}/command", put(update_command))
            .route("/{id}/add", post(add_item))
            .route("/{id}/items", post(add_items))
            .route("/{id}/payments", post(receive_payment).get(list_payments)),
    )
}

// =============================================================================
// Create & read
// =============================================================================

/// POST /api/order
async fn create(
    State(state): State<AppState>,
    _user: CurrentUser,
    Json(request): Json<NewOrder>,
) -> ApiResult<(StatusCode, Json<OrderView>)> {
    let order = state.orders().create(request).await?;
    Ok((StatusCode::CREATED, Json(order)))
}

/// POST /api/order/public
async fn create_public(
    State(state): State<AppState>,
    Json(request): Json<NewOrder>,
) -> ApiResult<(StatusCode, Json<OrderView>)> {
    let order = state.orders().create(request).await?;
    Ok((StatusCode::CREATED, Json(order)))
}

/// GET /api/order?draft
async fn list(
    State(state): State<AppState>,
    _user: CurrentUser,
    Query(query): Query<ListQuery>,
) -> ApiResult<Json<Vec<OrderView>>> {
    Ok(Json(state.orders().list(query.draft).await?))
}

/// GET /api/order/search?command&name
async fn search(
    State(state): State<AppState>,
    _user: CurrentUser,
    Query(query): Query<SearchQuery>,
) -> ApiResult<Json<Vec<OrderView>>> {
    Ok(Json(state.orders().search(query.command, query.name).await?))
}

/// GET /api/order/public?table&phone
async fn list_by_table(
    State(state): State<AppState>,
    Query(query): Query<TableQuery>,
) -> ApiResult<Json<Vec<OrderView>>> {
    let table = query
        .table
        .ok_or_else(|| ApiError::validation("table is required"))?;
    Ok(Json(state.orders().list_by_table(table, query.phone).await?))
}

/// GET /api/order/{id}
async fn get_order(
    State(state): State<AppState>,
    _user: CurrentUser,
    Path(id): Path<String>,
) -> ApiResult<Json<OrderView>> {
    require_uuid("order", &id)?;
    Ok(Json(state.orders().get(&id).await?))
}

// =============================================================================
// Lifecycle
// =============================================================================

/// PUT /api/order/{id}/send
async fn send(
    State(state): State<AppState>,
    _user: CurrentUser,
    Path(id): Path<String>,
) -> ApiResult<Json<OrderView>> {
    require_uuid("order", &id)?;
    Ok(Json(state.orders().send(&id).await?))
}

/// PUT /api/order/public/{id}/send
async fn send_public(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<OrderView>> {
    require_uuid("order", &id)?;
    Ok(Json(state.orders().send(&id).await?))
}

/// PUT /api/order/{id}/finish
async fn finish(
    State(state): State<AppState>,
    _user: CurrentUser,
    Path(id): Path<String>,
) -> ApiResult<Json<OrderView>> {
    require_uuid("order", &id)?;
    Ok(Json(state.orders().finish(&id).await?))
}

/// PUT /api/order/{id}/viewed
async fn mark_viewed(
    State(state): State<AppState>,
    _user: CurrentUser,
    Path(id): Path<String>,
) -> ApiResult<Json<OrderView>> {
    require_uuid("order", &id)?;
    Ok(Json(state.orders().mark_viewed(&id).await?))
}

/// PUT /api/order/{id}/info
async fn update_info(
    State(state): State<AppState>,
    _user: CurrentUser,
    Path(id): Path<String>,
    Json(request): Json<OrderInfoRequest>,
) -> ApiResult<Json<OrderView>> {
    require_uuid("order", &id)?;
    let view = state
        .orders()
        .update_order_info(&id, request.name, request.command_number)
        .await?;
    Ok(Json(view))
}

/// PUT /api/order/{id}/command
async fn update_command(
    State(state): State<AppState>,
    _user: CurrentUser,
    Path(id): Path<String>,
    Json(request): Json<CommandRequest>,
) -> ApiResult<Json<OrderView>> {
    require_uuid("order", &id)?;
    let view = state
        .orders()
        .update_command_number(&id, request.command_number)
        .await?;
    Ok(Json(view))
}

/// DELETE /api/order/{id}
async fn delete_order(
    State(state): State<AppState>,
    _user: CurrentUser,
    Path(id): Path<String>,
) -> ApiResult<StatusCode> {
    require_uuid("order", &id)?;
    state.orders().delete(&id).await?;
    Ok(StatusCode::NO_CONTENT)
}

// =============================================================================
// Items
// =============================================================================

async fn add_one(state: &AppState, order_id: &str, request: &AddItemRequest) -> ApiResult<OrderView> {
    require_uuid("order", order_id)?;
    require_uuid("product", &request.product_id)?;
    state
        .orders()
        .add_item(order_id, &request.product_id, request.amount)
        .await
}

/// POST /api/order/{id}/add
async fn add_item(
    State(state): State<AppState>,
    _user: CurrentUser,
    Path(id): Path<String>,
    Json(request): Json<AddItemRequest>,
) -> ApiResult<Json<OrderView>> {
    Ok(Json(add_one(&state, &id, &request).await?))
}

/// POST /api/order/add
async fn add_item_from_body(
    State(state): State<AppState>,
    _user: CurrentUser,
    Json(request): Json<AddItemRequest>,
) -> ApiResult<Json<OrderView>> {
    let order_id = request.order_id.clone().unwrap_or_default();
    Ok(Json(add_one(&state, &order_id, &request).await?))
}

/// POST /api/order/public/{id}/add
async fn add_item_public(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(request): Json<AddItemRequest>,
) -> ApiResult<Json<OrderView>> {
    Ok(Json(add_one(&state, &id, &request).await?))
}

/// POST /api/order/{id}/items
async fn add_items(
    State(state): State<AppState>,
    _user: CurrentUser,
    Path(id): Path<String>,
    Json(request): Json<AddItemsRequest>,
) -> ApiResult<Json<OrderView>> {
    require_uuid("order", &id)?;
    for item in &request.items {
        require_uuid("product", &item.product_id)?;
    }
    Ok(Json(state.orders().add_items(&id, &request.items).await?))
}

/// DELETE /api/order/remove/{item_id}
async fn remove_item(
    State(state): State<AppState>,
    _user: CurrentUser,
    Path(item_id): Path<String>,
) -> ApiResult<StatusCode> {
    require_uuid("item", &item_id)?;
    state.orders().remove_item(&item_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

// =============================================================================
// Payments
// =============================================================================

/// POST /api/order/{id}/payments
async fn receive_payment(
    State(state): State<AppState>,
    _user: CurrentUser,
    Path(id): Path<String>,
    Json(request): Json<PartialPaymentRequest>,
) -> ApiResult<Json<PartialPaymentResult>> {
    require_uuid("order", &id)?;
    if let Some(item_ids) = &request.item_ids {
        for item_id in item_ids {
            require_uuid("item", item_id)?;
        }
    }
    Ok(Json(state.payments().receive_partial(&id, request).await?))
}

/// GET /api/order/{id}/payments
async fn list_payments(
    State(state): State<AppState>,
    _user: CurrentUser,
    Path(id): Path<String>,
) -> ApiResult<Json<OrderPayments>> {
    require_uuid("order", &id)?;
    Ok(Json(state.payments().get_payments(&id).await?))
}
