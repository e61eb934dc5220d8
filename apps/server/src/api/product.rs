//! Menu products, including the anonymous listing the QR menu reads.

use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::{delete, get, post};
use axum::Router;
use serde::Deserialize;

use comanda_core::Product;

use super::extract::{Json, Path, Query};
use super::require_uuid;
use crate::auth::{AdminUser, CurrentUser};
use crate::error::ApiResult;
use crate::services::product::{NewProduct, ProductUpdate};
use crate::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct ProductFilter {
    pub disabled: Option<bool>,
}

/// `PUT /api/product` body: the id plus the fields to change.
#[derive(Debug, Deserialize)]
pub struct UpdateProductRequest {
    pub id: String,
    #[serde(flatten)]
    pub changes: ProductUpdate,
}

pub fn router() -> Router<AppState> {
    Router::new()
        .nest(
            "/api/product",
            Router::new()
                .route("/", post(create).get(list).put(update))
                .route("/public", get(list_public))
                .route("/category/{id}", get(list_by_category))
                .route("/{id}", delete(remove)),
        )
        .route("/api/public/products", get(list_public))
}

/// POST /api/product
async fn create(
    State(state): State<AppState>,
    _admin: AdminUser,
    Json(request): Json<NewProduct>,
) -> ApiResult<Json<Product>> {
    require_uuid("category", &request.category_id)?;
    Ok(Json(state.products().create(request).await?))
}

/// GET /api/product?disabled
async fn list(
    State(state): State<AppState>,
    _user: CurrentUser,
    Query(filter): Query<ProductFilter>,
) -> ApiResult<Json<Vec<Product>>> {
    Ok(Json(state.products().list(filter.disabled).await?))
}

/// GET /api/product/public?disabled and GET /api/public/products?disabled
///
/// Customers only see enabled products unless they ask otherwise.
async fn list_public(
    State(state): State<AppState>,
    Query(filter): Query<ProductFilter>,
) -> ApiResult<Json<Vec<Product>>> {
    let disabled = filter.disabled.unwrap_or(false);
    Ok(Json(state.products().list(Some(disabled)).await?))
}

/// GET /api/product/category/{id}
async fn list_by_category(
    State(state): State<AppState>,
    _user: CurrentUser,
    Path(id): Path<String>,
) -> ApiResult<Json<Vec<Product>>> {
    require_uuid("category", &id)?;
    Ok(Json(state.products().list_by_category(&id).await?))
}

/// PUT /api/product
async fn update(
    State(state): State<AppState>,
    _admin: AdminUser,
    Json(request): Json<UpdateProductRequest>,
) -> ApiResult<Json<Product>> {
    require_uuid("product", &request.id)?;
    if let Some(category_id) = &request.changes.category_id {
        require_uuid("category", category_id)?;
    }
    Ok(Json(state.products().update(&request.id, request.changes).await?))
}

/// DELETE /api/product/{id}
async fn remove(
    State(state): State<AppState>,
    _admin: AdminUser,
    Path(id): Path<String>,
) -> ApiResult<StatusCode> {
    require_uuid("product", &id)?;
    state.products().delete(&id).await?;
    Ok(StatusCode::NO_CONTENT)
}
