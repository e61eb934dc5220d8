//! # Print Routes
//!
//! ```text
//! /api/print
//!   POST   /receipt                    render + pick printer   auth
//!   GET    /receipt/{order_id}?type    receipt only            auth
//!   GET    /printers                   list                    auth
//!   POST   /printers                   create                  admin
//!   PUT    /printers                   update (id in body)     admin
//!   DELETE /printers/{id}              delete (204)            admin
//!
//! /api/public/print
//!   POST   /receipt                    render + pick printer   anon
//!   GET    /receipt/{order_id}?type    receipt only            anon
//! ```
//!
//! `receipt_type` is ORDER, PAYMENT or CANCEL in any case, in the JSON body
//! and in the query string alike.

use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::{delete, get, post};
use axum::Router;
use serde::Deserialize;

use comanda_core::receipt::{Receipt, ReceiptType};
use comanda_core::Printer;

use super::extract::{Json, Path, Query};
use super::require_uuid;
use crate::auth::{AdminUser, CurrentUser};
use crate::error::ApiResult;
use crate::services::print::{NewPrinter, PrintRequest, PrintResult, PrinterUpdate};
use crate::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct ReceiptQuery {
    /// ORDER, PAYMENT or CANCEL, any case. Defaults to ORDER.
    pub receipt_type: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct UpdatePrinterRequest {
    pub id: String,
    #[serde(flatten)]
    pub changes: PrinterUpdate,
}

pub fn router() -> Router<AppState> {
    Router::new()
        .nest(
            "/api/print",
            Router::new()
                .route("/receipt", post(print_receipt))
                .route("/receipt/{order_id}", get(get_receipt))
                .route(
                    "/printers",
                    get(list_printers).post(create_printer).put(update_printer),
                )
                .route("/printers/{id}", delete(delete_printer)),
        )
        .nest(
            "/api/public/print",
            Router::new()
                .route("/receipt", post(print_receipt_public))
                .route("/receipt/{order_id}", get(get_receipt_public)),
        )
}

async fn print(state: &AppState, request: PrintRequest) -> ApiResult<PrintResult> {
    require_uuid("order", &request.order_id)?;
    if let Some(printer_id) = &request.printer_id {
        require_uuid("printer", printer_id)?;
    }
    state.print().print(request).await
}

async fn receipt(state: &AppState, order_id: &str, query: ReceiptQuery) -> ApiResult<Receipt> {
    require_uuid("order", order_id)?;
    let receipt_type = match query.receipt_type.as_deref() {
        Some(t) if !t.trim().is_empty() => t.parse::<ReceiptType>()?,
        _ => ReceiptType::default(),
    };
    state.print().generate_receipt(order_id, receipt_type).await
}

/// POST /api/print/receipt
async fn print_receipt(
    State(state): State<AppState>,
    _user: CurrentUser,
    Json(request): Json<PrintRequest>,
) -> ApiResult<Json<PrintResult>> {
    Ok(Json(print(&state, request).await?))
}

/// POST /api/public/print/receipt
async fn print_receipt_public(
    State(state): State<AppState>,
    Json(request): Json<PrintRequest>,
) -> ApiResult<Json<PrintResult>> {
    Ok(Json(print(&state, request).await?))
}

/// GET /api/print/receipt/{order_id}?receipt_type
async fn get_receipt(
    State(state): State<AppState>,
    _user: CurrentUser,
    Path(order_id): Path<String>,
    Query(query): Query<ReceiptQuery>,
) -> ApiResult<Json<Receipt>> {
    Ok(Json(receipt(&state, &order_id, query).await?))
}

/// GET /api/public/print/receipt/{order_id}?receipt_type
async fn get_receipt_public(
    State(state): State<AppState>,
    Path(order_id): Path<String>,
    Query(query): Query<ReceiptQuery>,
) -> ApiResult<Json<Receipt>> {
    Ok(Json(receipt(&state, &order_id, query).await?))
}

// =============================================================================
// Printers
// =============================================================================

/// GET /api/print/printers
async fn list_printers(
    State(state): State<AppState>,
    _user: CurrentUser,
) -> ApiResult<Json<Vec<Printer>>> {
    Ok(Json(state.print().list_printers().await?))
}

/// POST /api/print/printers
async fn create_printer(
    State(state): State<AppState>,
    _admin: AdminUser,
    Json(request): Json<NewPrinter>,
) -> ApiResult<Json<Printer>> {
    Ok(Json(state.print().create_printer(request).await?))
}

/// PUT /api/print/printers
async fn update_printer(
    State(state): State<AppState>,
    _admin: AdminUser,
    Json(request): Json<UpdatePrinterRequest>,
) -> ApiResult<Json<Printer>> {
    require_uuid("printer", &request.id)?;
    Ok(Json(state.print().update_printer(&request.id, request.changes).await?))
}

/// DELETE /api/print/printers/{id}
async fn delete_printer(
    State(state): State<AppState>,
    _admin: AdminUser,
    Path(id): Path<String>,
) -> ApiResult<StatusCode> {
    require_uuid("printer", &id)?;
    state.print().delete_printer(&id).await?;
    Ok(StatusCode::NO_CONTENT)
}
