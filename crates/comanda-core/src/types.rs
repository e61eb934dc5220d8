//! # Domain Types
//!
//! Core domain types used throughout Comanda.
//!
//! ## Type Map
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  Catalog            Floor               Register                        │
//! │  ─────────────      ─────────────       ─────────────────               │
//! │  Category ◄──┐      Table               Cashier                         │
//! │  Product ────┘        │ number            │ is_open (max 1)             │
//! │     ▲                 │ qr_code           ▼                             │
//! │     │                 ▼                 CashierMovement                 │
//! │     │              Order ◄──────────┐     OPEN / SALE / CLOSE           │
//! │     │               │ MESA|BALCAO   │     CHANGE_IN / CHANGE_OUT        │
//! │     │               │ draft         │                                   │
//! │     │               │ finished      OrderPayment                        │
//! │     │               ▼                 full or partial                   │
//! │     └──────────  OrderItem                                              │
//! │                   amount, is_paid   DailySales (one row per day)        │
//! │                                                                         │
//! │  User (ADMIN | STAFF)               Printer (THERMAL | LASER | INKJET)  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Identity
//! Every entity is keyed by a UUID v4 string. Tables also carry a
//! human-facing `number` and a `qr_code` printed on the table tent.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;
use uuid::Uuid;

use crate::error::ValidationError;
use crate::money::Money;

/// Generates a new entity id.
#[inline]
pub fn new_id() -> String {
    Uuid::new_v4().to_string()
}

// =============================================================================
// User
// =============================================================================

/// Access level of a staff account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "UPPERCASE"))]
#[ts(export)]
#[serde(rename_all = "UPPERCASE")]
pub enum Role {
    /// Manages catalog, tables, printers.
    Admin,
    /// Takes orders and runs the register.
    Staff,
}

impl Default for Role {
    fn default() -> Self {
        Role::Staff
    }
}

impl Role {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "ADMIN",
            Role::Staff => "STAFF",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "ADMIN" => Ok(Role::Admin),
            "STAFF" => Ok(Role::Staff),
            _ => Err(ValidationError::NotAllowed {
                field: "role".to_string(),
                allowed: vec!["ADMIN".to_string(), "STAFF".to_string()],
            }),
        }
    }
}

/// A staff account. Never serialized directly; see [`UserView`].
#[derive(Debug, Clone)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct User {
    pub id: String,
    pub name: String,
    /// Stored trimmed and lower-cased.
    pub email: String,
    /// Argon2 PHC string.
    pub password_hash: String,
    pub role: Role,
    pub created_at: DateTime<Utc>,
}

/// Public projection of a [`User`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct UserView {
    pub id: String,
    pub name: String,
    pub email: String,
    pub role: Role,
}

impl From<&User> for UserView {
    fn from(user: &User) -> Self {
        UserView {
            id: user.id.clone(),
            name: user.name.clone(),
            email: user.email.clone(),
            role: user.role,
        }
    }
}

/// Normalizes an email for storage and lookup.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

// =============================================================================
// Catalog
// =============================================================================

/// A menu section ("Bebidas", "Lanches", ...).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Category {
    pub id: String,
    pub name: String,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

/// A sellable menu item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Product {
    pub id: String,
    pub name: String,
    /// Unit price in centavos.
    pub price_cents: i64,
    pub description: String,
    /// Hidden from the public menu when true.
    pub disabled: bool,
    pub category_id: String,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

impl Product {
    #[inline]
    pub fn price(&self) -> Money {
        Money::from_cents(self.price_cents)
    }
}

/// The product fields shown next to an order line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ProductSummary {
    pub id: String,
    pub name: String,
    pub price_cents: i64,
    pub description: String,
}

impl From<&Product> for ProductSummary {
    fn from(p: &Product) -> Self {
        ProductSummary {
            id: p.id.clone(),
            name: p.name.clone(),
            price_cents: p.price_cents,
            description: p.description.clone(),
        }
    }
}

// =============================================================================
// Table
// =============================================================================

/// A dine-in table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Table {
    pub id: String,
    /// Number painted on the table. Unique.
    pub number: i32,
    /// Code encoded in the table's QR tent. Unique.
    pub qr_code: String,
    pub is_active: bool,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

impl Table {
    /// 16 upper-case hex characters from a fresh UUID v4.
    ///
    /// ## Example
    /// ```rust
    /// use comanda_core::Table;
    ///
    /// let code = Table::generate_qr_code();
    /// assert_eq!(code.len(), 16);
    /// assert!(code.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_lowercase()));
    /// ```
    pub fn generate_qr_code() -> String {
        Uuid::new_v4().simple().to_string()[..16].to_uppercase()
    }
}

// =============================================================================
// Order
// =============================================================================

/// Where the order is served.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "UPPERCASE"))]
#[ts(export)]
#[serde(rename_all = "UPPERCASE")]
pub enum OrderType {
    /// Dine-in, tied to a table.
    Mesa,
    /// Counter / takeaway.
    Balcao,
}

impl Default for OrderType {
    fn default() -> Self {
        OrderType::Mesa
    }
}

impl fmt::Display for OrderType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OrderType::Mesa => f.write_str("MESA"),
            OrderType::Balcao => f.write_str("BALCAO"),
        }
    }
}

/// An order ("comanda").
///
/// ## Lifecycle
/// ```text
///   created ──► draft=true ──send──► draft=false ──finish──► finished=true
///                  │                      │
///                  └── items added        └── kitchen sees it (viewed)
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Order {
    pub id: String,
    pub table_number: Option<i32>,
    pub table_id: Option<String>,
    pub finished: bool,
    /// Not yet sent to the kitchen.
    pub draft: bool,
    /// Customer name.
    pub name: Option<String>,
    pub phone: Option<String>,
    /// Number of the physical command card.
    pub command_number: Option<i32>,
    pub order_type: OrderType,
    /// Kitchen has acknowledged the order.
    pub viewed: bool,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

impl Order {
    /// A fresh draft order.
    pub fn new(order_type: OrderType) -> Self {
        Order {
            id: new_id(),
            table_number: None,
            table_id: None,
            finished: false,
            draft: true,
            name: None,
            phone: None,
            command_number: None,
            order_type,
            viewed: false,
            created_at: Utc::now(),
        }
    }
}

/// One product line on an order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct OrderItem {
    pub id: String,
    pub order_id: String,
    pub product_id: String,
    /// Quantity.
    pub amount: i64,
    pub is_paid: bool,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

/// An item joined with its product (the product may have been removed).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct OrderLine {
    pub id: String,
    pub product_id: String,
    pub amount: i64,
    pub is_paid: bool,
    pub product: Option<ProductSummary>,
}

impl OrderLine {
    /// `price × amount`, zero when the product is gone.
    pub fn total(&self) -> Money {
        self.product
            .as_ref()
            .map(|p| Money::from_cents(p.price_cents).multiply_quantity(self.amount))
            .unwrap_or_default()
    }
}

/// An order with all of its lines.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderDetail {
    pub order: Order,
    pub lines: Vec<OrderLine>,
}

impl OrderDetail {
    /// Sum of every line, paid or not.
    pub fn total(&self) -> Money {
        self.lines.iter().map(OrderLine::total).sum()
    }

    pub fn unpaid_lines(&self) -> impl Iterator<Item = &OrderLine> {
        self.lines.iter().filter(|l| !l.is_paid)
    }

    /// Sum of the lines still owed.
    pub fn unpaid_total(&self) -> Money {
        self.unpaid_lines().map(OrderLine::total).sum()
    }
}

// =============================================================================
// Payment Method
// =============================================================================

/// How the customer paid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "SCREAMING_SNAKE_CASE"))]
#[ts(export)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentMethod {
    Dinheiro,
    Pix,
    CartaoCredito,
    CartaoDebito,
}

impl Default for PaymentMethod {
    fn default() -> Self {
        PaymentMethod::Dinheiro
    }
}

impl PaymentMethod {
    pub const ALL: [PaymentMethod; 4] = [
        PaymentMethod::Dinheiro,
        PaymentMethod::Pix,
        PaymentMethod::CartaoCredito,
        PaymentMethod::CartaoDebito,
    ];

    pub const fn as_str(&self) -> &'static str {
        match self {
            PaymentMethod::Dinheiro => "DINHEIRO",
            PaymentMethod::Pix => "PIX",
            PaymentMethod::CartaoCredito => "CARTAO_CREDITO",
            PaymentMethod::CartaoDebito => "CARTAO_DEBITO",
        }
    }
}

impl fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Accepts the wire names plus the spellings the waiter apps send.
///
/// ```rust
/// use comanda_core::PaymentMethod;
///
/// assert_eq!(" pix ".parse::<PaymentMethod>().unwrap(), PaymentMethod::Pix);
/// assert_eq!("Crédito".parse::<PaymentMethod>().unwrap(), PaymentMethod::CartaoCredito);
/// assert!("cheque".parse::<PaymentMethod>().is_err());
/// ```
impl FromStr for PaymentMethod {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "DINHEIRO" | "CASH" => Ok(PaymentMethod::Dinheiro),
            "PIX" => Ok(PaymentMethod::Pix),
            "CARTAO_CREDITO" | "CARTAO_CRÉDITO" | "CREDITO" | "CRÉDITO" => {
                Ok(PaymentMethod::CartaoCredito)
            }
            "CARTAO_DEBITO" | "CARTAO_DÉBITO" | "DEBITO" | "DÉBITO" => {
                Ok(PaymentMethod::CartaoDebito)
            }
            _ => Err(ValidationError::NotAllowed {
                field: "payment_method".to_string(),
                allowed: PaymentMethod::ALL
                    .iter()
                    .map(|m| m.as_str().to_string())
                    .collect(),
            }),
        }
    }
}

// =============================================================================
// Cashier
// =============================================================================

/// A register session. At most one is open at a time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Cashier {
    pub id: String,
    pub is_open: bool,
    #[ts(as = "String")]
    pub opened_at: DateTime<Utc>,
    #[ts(as = "Option<String>")]
    pub closed_at: Option<DateTime<Utc>>,
    /// User id of whoever opened the drawer.
    pub opened_by: String,
    pub initial_amount_cents: i64,
    /// Money physically in the drawer.
    pub current_amount_cents: i64,
    pub total_sales_cents: i64,
    pub total_orders: i64,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

impl Cashier {
    pub fn current_amount(&self) -> Money {
        Money::from_cents(self.current_amount_cents)
    }
}

/// Kind of entry in the register ledger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "SCREAMING_SNAKE_CASE"))]
#[ts(export)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MovementKind {
    Open,
    Close,
    Sale,
    /// Cash added to the drawer (change float).
    ChangeIn,
    /// Cash removed from the drawer.
    ChangeOut,
}

/// An entry in a cashier's ledger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct CashierMovement {
    pub id: String,
    pub cashier_id: String,
    pub kind: MovementKind,
    pub amount_cents: i64,
    pub observation: String,
    pub payment_method: Option<PaymentMethod>,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

impl CashierMovement {
    pub fn new(
        cashier_id: impl Into<String>,
        kind: MovementKind,
        amount: Money,
        observation: impl Into<String>,
    ) -> Self {
        CashierMovement {
            id: new_id(),
            cashier_id: cashier_id.into(),
            kind,
            amount_cents: amount.cents(),
            observation: observation.into(),
            payment_method: None,
            created_at: Utc::now(),
        }
    }

    pub fn with_method(mut self, method: PaymentMethod) -> Self {
        self.payment_method = Some(method);
        self
    }
}

// =============================================================================
// Order Payment
// =============================================================================

/// A payment recorded against an order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct OrderPayment {
    pub id: String,
    pub order_id: String,
    pub payment_method: PaymentMethod,
    pub amount_cents: i64,
    pub received_amount_cents: i64,
    pub is_partial: bool,
    /// Items this payment covers. Empty means the whole order.
    pub item_ids: Vec<String>,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

// =============================================================================
// Printer
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "UPPERCASE"))]
#[ts(export)]
#[serde(rename_all = "UPPERCASE")]
pub enum PrinterType {
    Thermal,
    Laser,
    Inkjet,
}

impl Default for PrinterType {
    fn default() -> Self {
        PrinterType::Thermal
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "UPPERCASE"))]
#[ts(export)]
#[serde(rename_all = "UPPERCASE")]
pub enum ConnectionType {
    Usb,
    Network,
    Bluetooth,
    Serial,
}

impl Default for ConnectionType {
    fn default() -> Self {
        ConnectionType::Usb
    }
}

/// A configured receipt printer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Printer {
    pub id: String,
    pub name: String,
    pub printer_type: PrinterType,
    pub connection_type: ConnectionType,
    /// Device path, `host:port`, or MAC depending on the connection.
    pub connection_string: Option<String>,
    pub is_active: bool,
    /// Paper width in millimetres (58 or 80).
    pub paper_width: i32,
    /// Free-form JSON settings blob.
    pub settings: Option<String>,
    /// Print automatically when an order is paid.
    pub auto_print: bool,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

// =============================================================================
// Daily Sales
// =============================================================================

/// Per-day sales rollup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct DailySales {
    pub id: String,
    #[ts(as = "String")]
    pub date: NaiveDate,
    pub total_sales_cents: i64,
    pub total_orders: i64,
    #[ts(as = "String")]
    pub last_updated: DateTime<Utc>,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

// =============================================================================
// Unit Tests
// =============================================================================
