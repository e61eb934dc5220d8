//! # comanda-core: Pure Business Logic for Comanda POS
//!
//! Every rule that does not need a database or a socket lives here:
//! entities, money, validation, settlement math, receipt layout and
//! sales metrics.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Comanda Architecture                             │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │              Waiter app / QR menu / Cashier screen              │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │ REST/JSON                              │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                apps/server (handlers + services)                │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ comanda-core (THIS CRATE) ★                     │   │
//! │  │                                                                 │   │
//! │  │  ┌─────────┐ ┌─────────┐ ┌────────────┐ ┌─────────┐ ┌────────┐ │   │
//! │  │  │  types  │ │  money  │ │ settlement │ │ receipt │ │analytics│ │   │
//! │  │  └─────────┘ └─────────┘ └────────────┘ └─────────┘ └────────┘ │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO NETWORK • PURE FUNCTIONS           │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                  comanda-db (SQLite repositories)               │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Entities (Order, Product, Cashier, ...) and wire enums
//! - [`money`] - Integer centavo arithmetic
//! - [`error`] - Domain error types
//! - [`validation`] - Input rules shared by every service
//! - [`settlement`] - Change and partial-payment math
//! - [`receipt`] - Receipt model and thermal printer layout
//! - [`analytics`] - Sales metrics and daily series
//!
//! ## Example Usage
//!
//! ```rust
//! use comanda_core::money::Money;
//! use comanda_core::settlement::change_due;
//!
//! let total = Money::from_cents(4_250);
//! let change = change_due(total, Some(Money::from_cents(5_000))).unwrap();
//! assert_eq!(change.cents(), 750);
//! assert_eq!(total.to_string(), "R$ 42.50");
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod analytics;
pub mod error;
pub mod money;
pub mod receipt;
pub mod settlement;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use error::{CoreError, CoreResult, ValidationError};
pub use money::Money;
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Maximum quantity of a single product on one order line.
///
/// ## Business Reason
/// Catches fat-fingered quantities (100 instead of 10) at the waiter's
/// handheld before they reach the kitchen.
pub const MAX_ITEM_QUANTITY: i64 = 999;

/// Highest menu price accepted (R$ 1.000.000,00).
pub const MAX_PRICE_CENTS: i64 = 100_000_000;

/// Highest single cash amount accepted: openings, payments, drawer moves
/// (R$ 100.000.000,00).
pub const MAX_AMOUNT_CENTS: i64 = 10_000_000_000;

/// Name printed on receipts until the establishment is configured.
pub const DEFAULT_ESTABLISHMENT_NAME: &str = "Estabelecimento";

/// Paper width (mm) assumed when no printer is selected.
pub const DEFAULT_PAPER_WIDTH: i32 = 80;
