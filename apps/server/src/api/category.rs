use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::{get, post, put};
use axum::Router;
use serde::Deserialize;

use comanda_core::Category;

use super::extract::{Json, Path};
use super::require_uuid;
use crate::auth::{AdminUser, CurrentUser};
use crate::error::ApiResult;
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct CategoryRequest {
    pub name: String,
}

pub fn router() -> Router<AppState> {
    Router::new().nest(
        "/api/category",
        Router::new()
            .route("/", post(create).get(list))
            .route("/public", get(list_public))
            .route("/{id}", put(update).delete(delete)),
    )
}

/// POST /api/category
async fn create(
    State(state): State<AppState>,
    _admin: AdminUser,
    Json(request): Json<CategoryRequest>,
) -> ApiResult<Json<Category>> {
    Ok(Json(state.categories().create(&request.name).await?))
}

/// GET /api/category
async fn list(State(state): State<AppState>, _user: CurrentUser) -> ApiResult<Json<Vec<Category>>> {
    Ok(Json(state.categories().list().await?))
}

/// GET /api/category/public
async fn list_public(State(state): State<AppState>) -> ApiResult<Json<Vec<Category>>> {
    Ok(Json(state.categories().list().await?))
}

/// PUT /api/category/{id}
async fn update(
    State(state): State<AppState>,
    _admin: AdminUser,
    Path(id): Path<String>,
    Json(request): Json<CategoryRequest>,
) -> ApiResult<Json<Category>> {
    require_uuid("category", &id)?;
    Ok(Json(state.categories().update(&id, &request.name).await?))
}

/// DELETE /api/category/{id}
async fn delete(
    State(state): State<AppState>,
    _admin: AdminUser,
    Path(id): Path<String>,
) -> ApiResult<StatusCode> {
    require_uuid("category", &id)?;
    state.categories().delete(&id).await?;
    Ok(StatusCode::NO_CONTENT)
}
