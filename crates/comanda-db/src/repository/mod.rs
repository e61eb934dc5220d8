//! # Repository Module
//!
//! One repository per aggregate. Each holds a clone of the pool and owns
//! the SQL for its tables.
//!
//! ## Repository Pattern
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  OrderService                                                          │
//! │       │                                                                 │
//! │       │  db.orders().add_items(&order_id, &lines)                      │
//! │       ▼                                                                 │
//! │  OrderRepository                                                       │
//! │  ├── insert / update_flags / update_info / delete                      │
//! │  ├── get_detail / list_details / list_finished                         │
//! │  └── add_item / add_items / remove_item                                │
//! │       │                                                                 │
//! │       │  SQL (single statement, or one transaction for multi-row)      │
//! │       ▼                                                                 │
//! │  SQLite Database                                                       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Available Repositories
//!
//! - [`user::UserRepository`] - Staff accounts
//! - [`category::CategoryRepository`] - Menu sections
//! - [`product::ProductRepository`] - Menu items
//! - [`table::TableRepository`] - Dine-in tables and QR codes
//! - [`order::OrderRepository`] - Orders and their items
//! - [`cashier::CashierRepository`] - Register sessions and ledger
//! - [`payment::PaymentRepository`] - Order payments
//! - [`printer::PrinterRepository`] - Receipt printers
//! - [`daily_sales::DailySalesRepository`] - Per-day rollup

pub mod cashier;
pub mod category;
pub mod daily_sales;
pub mod order;
pub mod payment;
pub mod printer;
pub mod product;
pub mod table;
pub mod user;
