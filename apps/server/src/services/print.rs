//! # Print Service
//!
//! Builds receipts from orders and renders them for the selected printer.
//!
//! ```text
//!   order + lines ──► Receipt ──► format_thermal(width) ──► raw_data
//!        │                              ▲
//!   payments (PAYMENT slips)      printer.paper_width (58 | 80)
//! ```
//!
//! Nothing is sent to a device here; the caller ships `raw_data` to the
//! printer it chose.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use comanda_core::receipt::{format_thermal, Receipt, ReceiptType};
use comanda_core::validation::{validate_name, validate_paper_width};
use comanda_core::{
    new_id, ConnectionType, Money, Printer, PrinterType, DEFAULT_PAPER_WIDTH,
};
use comanda_db::Database;

use crate::error::{ApiError, ApiResult};

/// Rendered when an order line points at a deleted product.
pub const MISSING_PRODUCT_NAME: &str = "Produto não encontrado";

const PRINT_OK_MESSAGE: &str = "Cupom gerado com sucesso";

#[derive(Debug, Clone, Deserialize)]
pub struct PrintRequest {
    pub order_id: String,
    pub printer_id: Option<String>,
    #[serde(default)]
    pub receipt_type: ReceiptType,
}

#[derive(Debug, Clone, Serialize)]
pub struct PrintResult {
    pub success: bool,
    pub message: String,
    pub receipt: Receipt,
    /// Text for the printer, one receipt line per line.
    pub raw_data: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewPrinter {
    pub name: String,
    #[serde(default)]
    pub printer_type: PrinterType,
    #[serde(default)]
    pub connection_type: ConnectionType,
    pub connection_string: Option<String>,
    #[serde(default = "default_paper_width")]
    pub paper_width: i32,
    pub settings: Option<String>,
    #[serde(default)]
    pub auto_print: bool,
}

fn default_paper_width() -> i32 {
    DEFAULT_PAPER_WIDTH
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PrinterUpdate {
    pub name: Option<String>,
    pub printer_type: Option<PrinterType>,
    pub connection_type: Option<ConnectionType>,
    pub connection_string: Option<String>,
    pub is_active: Option<bool>,
    pub paper_width: Option<i32>,
    pub settings: Option<String>,
    pub auto_print: Option<bool>,
}

pub struct PrintService {
    db: Database,
}

impl PrintService {
    pub fn new(db: Database) -> Self {
        PrintService { db }
    }

    /// Builds the receipt model for an order.
    ///
    /// ORDER and CANCEL slips list only what is still unpaid. PAYMENT slips
    /// list everything and, once the order is finished, what was received.
    pub async fn generate_receipt(
        &self,
        order_id: &str,
        receipt_type: ReceiptType,
    ) -> ApiResult<Receipt> {
        let detail = self
            .db
            .orders()
            .get_detail(order_id)
            .await?
            .ok_or_else(|| ApiError::not_found("Order not found"))?;

        let order = &detail.order;
        let mut receipt = Receipt::new(&order.id, receipt_type, order.order_type, order.created_at);
        receipt.table_number = order.table_number;
        receipt.command_number = order.command_number;
        receipt.customer_name = order.name.clone();
        receipt.phone = order.phone.clone();

        for line in &detail.lines {
            if line.is_paid && receipt_type != ReceiptType::Payment {
                continue;
            }
            match &line.product {
                Some(product) => {
                    receipt.push_item(&product.name, line.amount, Money::from_cents(product.price_cents))
                }
                None => receipt.push_item(MISSING_PRODUCT_NAME, line.amount, Money::zero()),
            }
        }

        if receipt_type == ReceiptType::Payment && order.finished {
            let payments = self.db.payments().list_by_order(order_id).await?;
            let received: Money = payments
                .iter()
                .map(|p| Money::from_cents(p.received_amount_cents))
                .sum();
            let change = (received - Money::from_cents(receipt.total_cents)).clamp_zero();

            receipt.received_amount_cents = Some(received.cents());
            receipt.change_cents = change.is_positive().then(|| change.cents());
            receipt.payment_method = payments.first().map(|p| p.payment_method);
        }

        Ok(receipt)
    }

    /// Generates a receipt and lays it out for a printer.
    ///
    /// ## Printer Selection
    /// 1. `printer_id`, if given and active
    /// 2. otherwise the first active printer with `auto_print`
    /// 3. otherwise none, and the layout uses 80mm paper
    pub async fn print(&self, request: PrintRequest) -> ApiResult<PrintResult> {
        let receipt = self
            .generate_receipt(&request.order_id, request.receipt_type)
            .await?;

        let printer = self.select_printer(request.printer_id.as_deref()).await?;
        let paper_width = printer
            .as_ref()
            .map(|p| p.paper_width)
            .unwrap_or(DEFAULT_PAPER_WIDTH);
        let raw_data = format_thermal(&receipt, paper_width);

        info!(
            order_id = %receipt.order_id,
            receipt_type = %receipt.receipt_type,
            printer = printer.as_ref().map(|p| p.name.as_str()).unwrap_or("-"),
            paper_width,
            "Receipt generated"
        );

        Ok(PrintResult {
            success: true,
            message: PRINT_OK_MESSAGE.to_string(),
            receipt,
            raw_data,
        })
    }

    async fn select_printer(&self, requested: Option<&str>) -> ApiResult<Option<Printer>> {
        if let Some(id) = requested {
            match self.db.printers().get_by_id(id).await? {
                Some(printer) if printer.is_active => return Ok(Some(printer)),
                _ => debug!(printer_id = %id, "Requested printer unavailable, falling back"),
            }
        }

        Ok(self
            .db
            .printers()
            .list()
            .await?
            .into_iter()
            .find(|p| p.is_active && p.auto_print))
    }

    // =========================================================================
    // Printer Management
    // =========================================================================

    pub async fn create_printer(&self, input: NewPrinter) -> ApiResult<Printer> {
        validate_name("name", &input.name)?;
        validate_paper_width(input.paper_width)?;

        let printer = Printer {
            id: new_id(),
            name: input.name.trim().to_string(),
            printer_type: input.printer_type,
            connection_type: input.connection_type,
            connection_string: input.connection_string,
            is_active: true,
            paper_width: input.paper_width,
            settings: input.settings,
            auto_print: input.auto_print,
            created_at: Utc::now(),
        };
        self.db.printers().insert(&printer).await?;

        info!(printer_id = %printer.id, name = %printer.name, "Printer registered");
        Ok(printer)
    }

    pub async fn list_printers(&self) -> ApiResult<Vec<Printer>> {
        Ok(self.db.printers().list().await?)
    }

    pub async fn update_printer(&self, id: &str, changes: PrinterUpdate) -> ApiResult<Printer> {
        let mut printer = self
            .db
            .printers()
            .get_by_id(id)
            .await?
            .ok_or_else(|| ApiError::not_found("Printer not found"))?;

        if let Some(name) = changes.name {
            validate_name("name", &name)?;
            printer.name = name.trim().to_string();
        }
        if let Some(width) = changes.paper_width {
            validate_paper_width(width)?;
            printer.paper_width = width;
        }
        if let Some(kind) = changes.printer_type {
            printer.printer_type = kind;
        }
        if let Some(connection) = changes.connection_type {
            printer.connection_type = connection;
        }
        if changes.connection_string.is_some() {
            printer.connection_string = changes.connection_string;
        }
        if let Some(active) = changes.is_active {
            printer.is_active = active;
        }
        if changes.settings.is_some() {
            printer.settings = changes.settings;
        }
        if let Some(auto) = changes.auto_print {
            printer.auto_print = auto;
        }

        self.db.printers().update(&printer).await?;
        Ok(printer)
    }

    pub async fn delete_printer(&self, id: &str) -> ApiResult<()> {
        self.db.printers().delete(id).await?;
        info!(printer_id = %id, "Printer removed");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;
    use crate::services::order::{NewOrder, OrderService};
    use crate::services::payment::{OrderPaymentService, PartialPaymentRequest};
    use crate::services::test_support;
    use comanda_core::PaymentMethod;

    fn printer(name: &str, paper_width: i32, auto_print: bool) -> NewPrinter {
        NewPrinter {
            name: name.to_string(),
            printer_type: PrinterType::Thermal,
            connection_type: ConnectionType::Usb,
            connection_string: None,
            paper_width,
            settings: None,
            auto_print,
        }
    }

    #[tokio::test]
    async fn test_order_receipt_skips_paid_lines() {
        let db = test_support::db().await;
        let burger = test_support::product(&db, "X-Burger", 2000).await;
        let soda = test_support::product(&db, "Refrigerante", 600).await;
        let orders = OrderService::new(db.clone());

        let id = orders
            .create(NewOrder {
                table: Some(4),
                command_number: Some(12),
                ..NewOrder::default()
            })
            .await
            .unwrap()
            .order
            .id;
        orders.add_item(&id, &burger.id, 2).await.unwrap();
        let view = orders.add_item(&id, &soda.id, 1).await.unwrap();
        let soda_line = view
            .items
            .iter()
            .find(|l| l.product_id == soda.id)
            .unwrap()
            .id
            .clone();

        OrderPaymentService::new(db.clone())
            .receive_partial(
                &id,
                PartialPaymentRequest {
                    item_ids: Some(vec![soda_line]),
                    payment_method: PaymentMethod::Pix,
                    received_amount_cents: 600,
                },
            )
            .await
            .unwrap();

        let service = PrintService::new(db);
        let receipt = service.generate_receipt(&id, ReceiptType::Order).await.unwrap();
        assert_eq!(receipt.items.len(), 1);
        assert_eq!(receipt.items[0].product_name, "X-Burger");
        assert_eq!(receipt.total_cents, 4000);
        assert_eq!(receipt.command_number, Some(12));
        assert!(receipt.received_amount_cents.is_none());

        let receipt = service.generate_receipt(&id, ReceiptType::Payment).await.unwrap();
        assert_eq!(receipt.items.len(), 2);
        assert_eq!(receipt.total_cents, 4600);
        // not finished yet, so no payment block
        assert!(receipt.payment_method.is_none());
    }

    #[tokio::test]
    async fn test_payment_receipt_of_finished_order() {
        let db = test_support::db().await;
        let dish = test_support::product(&db, "Moqueca", 4500).await;
        let orders = OrderService::new(db.clone());
        let id = orders.create(NewOrder::default()).await.unwrap().order.id;
        orders.add_item(&id, &dish.id, 1).await.unwrap();

        OrderPaymentService::new(db.clone())
            .receive_partial(
                &id,
                PartialPaymentRequest {
                    item_ids: None,
                    payment_method: PaymentMethod::Dinheiro,
                    received_amount_cents: 5000,
                },
            )
            .await
            .unwrap();

        let receipt = PrintService::new(db)
            .generate_receipt(&id, ReceiptType::Payment)
            .await
            .unwrap();
        assert_eq!(receipt.received_amount_cents, Some(5000));
        assert_eq!(receipt.change_cents, Some(500));
        assert_eq!(receipt.payment_method, Some(PaymentMethod::Dinheiro));
    }

    #[tokio::test]
    async fn test_receipt_for_missing_order() {
        let service = PrintService::new(test_support::db().await);
        let err = service
            .generate_receipt(&new_id(), ReceiptType::Order)
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::NotFound);
    }

    #[tokio::test]
    async fn test_print_uses_printer_width() {
        let db = test_support::db().await;
        let dish = test_support::product(&db, "Pastel", 800).await;
        let orders = OrderService::new(db.clone());
        let id = orders.create(NewOrder::default()).await.unwrap().order.id;
        orders.add_item(&id, &dish.id, 1).await.unwrap();

        let service = PrintService::new(db);

        // no printers at all: 80mm layout
        let result = service
            .print(PrintRequest {
                order_id: id.clone(),
                printer_id: None,
                receipt_type: ReceiptType::Order,
            })
            .await
            .unwrap();
        assert!(result.success);
        assert_eq!(result.message, PRINT_OK_MESSAGE);
        assert!(result.raw_data.lines().any(|l| l == "=".repeat(48)));

        let narrow = service.create_printer(printer("Balcão", 58, true)).await.unwrap();
        let result = service
            .print(PrintRequest {
                order_id: id.clone(),
                printer_id: None,
                receipt_type: ReceiptType::Order,
            })
            .await
            .unwrap();
        assert!(result.raw_data.lines().any(|l| l == "=".repeat(32)));

        // an inactive requested printer falls back to auto-print
        let wide = service.create_printer(printer("Cozinha", 80, false)).await.unwrap();
        service
            .update_printer(
                &wide.id,
                PrinterUpdate {
                    is_active: Some(false),
                    ..PrinterUpdate::default()
                },
            )
            .await
            .unwrap();
        let result = service
            .print(PrintRequest {
                order_id: id,
                printer_id: Some(wide.id),
                receipt_type: ReceiptType::Order,
            })
            .await
            .unwrap();
        assert!(result.raw_data.lines().any(|l| l == "=".repeat(32)));

        service.delete_printer(&narrow.id).await.unwrap();
        assert_eq!(service.list_printers().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_printer_management() {
        let service = PrintService::new(test_support::db().await);

        let created = service.create_printer(printer(" Caixa ", 80, false)).await.unwrap();
        assert!(created.is_active);
        assert_eq!(created.name, "Caixa");

        let err = service.create_printer(printer("Torta", 70, false)).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::ValidationError);

        let updated = service
            .update_printer(
                &created.id,
                PrinterUpdate {
                    paper_width: Some(58),
                    auto_print: Some(true),
                    ..PrinterUpdate::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.paper_width, 58);
        assert!(updated.auto_print);
        assert_eq!(updated.name, "Caixa");

        let err = service
            .update_printer(&new_id(), PrinterUpdate::default())
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::NotFound);

        let err = service.delete_printer(&new_id()).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::NotFound);
    }
}
