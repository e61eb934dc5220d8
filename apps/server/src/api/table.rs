use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::Router;
use serde::Deserialize;

use comanda_core::Table;

use super::extract::{Json, Path};
use super::require_uuid;
use crate::auth::{AdminUser, CurrentUser};
use crate::error::ApiResult;
use crate::services::table::TableUpdate;
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct CreateTableRequest {
    pub number: i32,
}

pub fn router() -> Router<AppState> {
    Router::new().nest(
        "/api/table",
        Router::new()
            .route("/", post(create).get(list))
            .route("/qr/{qr}", get(get_by_qr_code))
            .route("/{id}", get(get_by_id).put(update).delete(delete)),
    )
}

/// POST /api/table
async fn create(
    State(state): State<AppState>,
    _admin: AdminUser,
    Json(request): Json<CreateTableRequest>,
) -> ApiResult<(StatusCode, Json<Table>)> {
    let table = state.tables().create(request.number).await?;
    Ok((StatusCode::CREATED, Json(table)))
}

/// GET /api/table
async fn list(State(state): State<AppState>, _user: CurrentUser) -> ApiResult<Json<Vec<Table>>> {
    Ok(Json(state.tables().list().await?))
}

/// GET /api/table/qr/{qr}
///
/// Anonymous: this is how a customer's phone finds its table.
async fn get_by_qr_code(
    State(state): State<AppState>,
    Path(qr): Path<String>,
) -> ApiResult<Json<Table>> {
    Ok(Json(state.tables().get_by_qr_code(&qr).await?))
}

/// GET /api/table/{id}
async fn get_by_id(
    State(state): State<AppState>,
    _user: CurrentUser,
    Path(id): Path<String>,
) -> ApiResult<Json<Table>> {
    require_uuid("table", &id)?;
    Ok(Json(state.tables().get_by_id(&id).await?))
}

/// PUT /api/table/{id}
async fn update(
    State(state): State<AppState>,
    _admin: AdminUser,
    Path(id): Path<String>,
    Json(changes): Json<TableUpdate>,
) -> ApiResult<Json<Table>> {
    require_uuid("table", &id)?;
    Ok(Json(state.tables().update(&id, changes).await?))
}

/// DELETE /api/table/{id}
async fn delete(
    State(state): State<AppState>,
    _admin: AdminUser,
    Path(id): Path<String>,
) -> ApiResult<StatusCode> {
    require_uuid("table", &id)?;
    state.tables().delete(&id).await?;
    Ok(StatusCode::NO_CONTENT)
}
