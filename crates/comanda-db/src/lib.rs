//! # comanda-db: Database Layer for Comanda POS
//!
//! SQLite persistence for every aggregate of the ordering backend.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Comanda Data Flow                                │
//! │                                                                         │
//! │  HTTP handler ──► Service (apps/server)                                │
//! │                      │                                                  │
//! │                      ▼                                                  │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                   comanda-db (THIS CRATE)                       │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────────┐    ┌────────────────┐    ┌──────────────┐  │   │
//! │  │   │   Database    │    │  Repositories  │    │  Migrations  │  │   │
//! │  │   │   (pool.rs)   │    │                │    │  (embedded)  │  │   │
//! │  │   │               │    │ users  orders  │    │              │  │   │
//! │  │   │ SqlitePool    │◄───│ tables cashiers│    │ 001_initial  │  │   │
//! │  │   │               │    │ products ...   │    │              │  │   │
//! │  │   └───────────────┘    └────────────────┘    └──────────────┘  │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │                      │                                                  │
//! │                      ▼                                                  │
//! │               comanda.db (WAL)                                          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//!
//! ```rust,ignore
//! use comanda_db::{Database, DbConfig};
//!
//! let db = Database::new(DbConfig::new("comanda.db")).await?;
//! let open = db.cashiers().get_open().await?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod migrations;
pub mod pool;
pub mod repository;

// =============================================================================
// Re-exports
// =============================================================================

pub use error::{DbError, DbResult};
pub use pool::{Database, DbConfig};

pub use repository::cashier::CashierRepository;
pub use repository::category::CategoryRepository;
pub use repository::daily_sales::DailySalesRepository;
pub use repository::order::{OrderFilter, OrderRepository};
pub use repository::payment::PaymentRepository;
pub use repository::printer::PrinterRepository;
pub use repository::product::ProductRepository;
pub use repository::table::TableRepository;
pub use repository::user::UserRepository;
