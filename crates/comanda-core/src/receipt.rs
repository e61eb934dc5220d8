//! # Receipt Module
//!
//! The receipt model and its plain-text layout for thermal printers.
//!
//! ## Layout (80mm paper, 48 columns)
//! ```text
//! ================================================
//!                 Estabelecimento
//! ================================================
//!
//! Pedido: 3f2a9c1b
//! Data: 17/10/2026 20:41:05
//!
//! Mesa: 12
//! Comanda: 7
//!
//! ------------------------------------------------
//! ITEM                    QTD  UNIT    TOTAL
//! ------------------------------------------------
//! X-Burger               2 R$ 25.00   R$ 50.00
//! ------------------------------------------------
//! SUBTOTAL:                               R$ 50.00
//! TOTAL:                                  R$ 50.00
//!
//! ================================================
//!            OBRIGADO PELA PREFERENCIA!
//! ================================================
//! ```
//!
//! 58mm paper gets 32 columns. Anything other than 80 is treated as 58.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::ValidationError;
use crate::money::Money;
use crate::types::{OrderType, PaymentMethod};
use crate::DEFAULT_ESTABLISHMENT_NAME;

/// Width of the product column in the item table.
const ITEM_NAME_WIDTH: usize = 20;

// =============================================================================
// Receipt Type
// =============================================================================

/// What the slip is for.
///
/// Deserializes through [`FromStr`], so JSON bodies and query strings
/// accept the same spellings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "UPPERCASE", try_from = "String")]
pub enum ReceiptType {
    /// Kitchen / table check. Paid items are left out.
    Order,
    /// Payment slip. Includes every item plus what was received.
    Payment,
    Cancel,
}

impl Default for ReceiptType {
    fn default() -> Self {
        ReceiptType::Order
    }
}

impl fmt::Display for ReceiptType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReceiptType::Order => f.write_str("ORDER"),
            ReceiptType::Payment => f.write_str("PAYMENT"),
            ReceiptType::Cancel => f.write_str("CANCEL"),
        }
    }
}

impl FromStr for ReceiptType {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "ORDER" => Ok(ReceiptType::Order),
            "PAYMENT" => Ok(ReceiptType::Payment),
            "CANCEL" => Ok(ReceiptType::Cancel),
            _ => Err(ValidationError::NotAllowed {
                field: "receipt_type".to_string(),
                allowed: vec![
                    "ORDER".to_string(),
                    "PAYMENT".to_string(),
                    "CANCEL".to_string(),
                ],
            }),
        }
    }
}

impl TryFrom<String> for ReceiptType {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

// =============================================================================
// Receipt Model
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ReceiptItem {
    pub product_name: String,
    pub quantity: i64,
    pub unit_price_cents: i64,
    pub total_price_cents: i64,
}

/// Everything printed on a slip.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Receipt {
    pub order_id: String,
    pub receipt_type: ReceiptType,
    pub order_type: OrderType,
    pub table_number: Option<i32>,
    pub command_number: Option<i32>,
    pub customer_name: Option<String>,
    pub phone: Option<String>,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    pub items: Vec<ReceiptItem>,
    pub subtotal_cents: i64,
    pub total_cents: i64,
    pub payment_method: Option<PaymentMethod>,
    pub received_amount_cents: Option<i64>,
    pub change_cents: Option<i64>,
    pub establishment_name: String,
    pub establishment_address: Option<String>,
    pub establishment_phone: Option<String>,
    pub establishment_tax_id: Option<String>,
}

impl Receipt {
    /// An empty receipt for an order, with the default establishment header.
    pub fn new(
        order_id: impl Into<String>,
        receipt_type: ReceiptType,
        order_type: OrderType,
        created_at: DateTime<Utc>,
    ) -> Self {
        Receipt {
            order_id: order_id.into(),
            receipt_type,
            order_type,
            table_number: None,
            command_number: None,
            customer_name: None,
            phone: None,
            created_at,
            items: Vec::new(),
            subtotal_cents: 0,
            total_cents: 0,
            payment_method: None,
            received_amount_cents: None,
            change_cents: None,
            establishment_name: DEFAULT_ESTABLISHMENT_NAME.to_string(),
            establishment_address: None,
            establishment_phone: None,
            establishment_tax_id: None,
        }
    }

    /// Appends a line and keeps subtotal/total in step.
    pub fn push_item(&mut self, product_name: impl Into<String>, quantity: i64, unit_price: Money) {
        let total = unit_price.multiply_quantity(quantity);
        self.items.push(ReceiptItem {
            product_name: product_name.into(),
            quantity,
            unit_price_cents: unit_price.cents(),
            total_price_cents: total.cents(),
        });
        self.subtotal_cents = self.subtotal_cents.saturating_add(total.cents());
        self.total_cents = self.subtotal_cents;
    }
}

// =============================================================================
// Thermal Layout
// =============================================================================

/// Characters per line for a paper width in millimetres.
pub fn chars_per_line(paper_width: i32) -> usize {
    if paper_width == 80 {
        48
    } else {
        32
    }
}

/// Renders a receipt as plain text for an ESC/POS style printer.
pub fn format_thermal(receipt: &Receipt, paper_width: i32) -> String {
    let width = chars_per_line(paper_width);
    let double_rule = "=".repeat(width);
    let single_rule = "-".repeat(width);
    let mut lines: Vec<String> = Vec::with_capacity(32 + receipt.items.len());

    // Header
    lines.push(double_rule.clone());
    if !receipt.establishment_name.is_empty() {
        lines.push(center_text(&receipt.establishment_name, width));
    }
    for extra in [&receipt.establishment_address, &receipt.establishment_phone]
        .into_iter()
        .flatten()
        .filter(|s| !s.is_empty())
    {
        lines.push(center_text(extra, width));
    }
    if let Some(tax_id) = receipt.establishment_tax_id.as_deref().filter(|s| !s.is_empty()) {
        lines.push(center_text(&format!("CNPJ: {tax_id}"), width));
    }
    lines.push(double_rule.clone());
    lines.push(String::new());

    // Order
    let short_id: String = receipt.order_id.chars().take(8).collect();
    lines.push(format!("Pedido: {short_id}"));
    lines.push(format!(
        "Data: {}",
        receipt.created_at.format("%d/%m/%Y %H:%M:%S")
    ));
    lines.push(String::new());

    match receipt.order_type {
        OrderType::Mesa => {
            let table = receipt
                .table_number
                .map(|n| n.to_string())
                .unwrap_or_default();
            lines.push(format!("Mesa: {table}"));
            if let Some(command) = receipt.command_number {
                lines.push(format!("Comanda: {command}"));
            }
        }
        OrderType::Balcao => {
            if let Some(name) = receipt.customer_name.as_deref().filter(|s| !s.is_empty()) {
                lines.push(format!("Cliente: {name}"));
            }
            if let Some(phone) = receipt.phone.as_deref().filter(|s| !s.is_empty()) {
                lines.push(format!("Telefone: {phone}"));
            }
        }
    }
    lines.push(String::new());
    lines.push(single_rule.clone());

    // Items
    lines.push("ITEM                    QTD  UNIT    TOTAL".to_string());
    lines.push(single_rule.clone());
    for item in &receipt.items {
        lines.push(format!(
            "{:<20} {:>3} {:>8} {:>10}",
            truncate_text(&item.product_name, ITEM_NAME_WIDTH),
            item.quantity,
            format_currency(item.unit_price_cents),
            format_currency(item.total_price_cents),
        ));
    }
    lines.push(single_rule);

    // Totals
    lines.push(format!(
        "SUBTOTAL: {:>w$}",
        format_currency(receipt.subtotal_cents),
        w = width - 9
    ));
    lines.push(format!(
        "TOTAL: {:>w$}",
        format_currency(receipt.total_cents),
        w = width - 6
    ));
    if let Some(received) = receipt.received_amount_cents {
        lines.push(format!(
            "RECEBIDO: {:>w$}",
            format_currency(received),
            w = width - 9
        ));
    }
    if let Some(change) = receipt.change_cents.filter(|c| *c > 0) {
        lines.push(format!("TROCO: {:>w$}", format_currency(change), w = width - 6));
    }
    if let Some(method) = receipt.payment_method {
        lines.push(format!("FORMA DE PAGAMENTO: {method}"));
    }

    // Footer
    lines.push(String::new());
    lines.push(double_rule.clone());
    lines.push(center_text("OBRIGADO PELA PREFERENCIA!", width));
    lines.push(double_rule);
    lines.push(String::new());
    lines.push(String::new());

    lines.join("\n")
}

/// `R$ 12.50`
pub fn format_currency(cents: i64) -> String {
    Money::from_cents(cents).to_string()
}

/// Centres `text` in `width` columns, cutting it when it does not fit.
pub fn center_text(text: &str, width: usize) -> String {
    let len = text.chars().count();
    if len >= width {
        return text.chars().take(width).collect();
    }
    let left = (width - len) / 2;
    format!("{}{}{}", " ".repeat(left), text, " ".repeat(width - len - left))
}

/// Cuts `text` to `max` characters, ending in `...` when shortened.
pub fn truncate_text(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        return text.to_string();
    }
    let kept: String = text.chars().take(max.saturating_sub(3)).collect();
    format!("{kept}...")
}

// =============================================================================
// Unit Tests
// =============================================================================
