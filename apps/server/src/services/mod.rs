//! # Services
//!
//! Business operations behind the HTTP handlers. Each service is a thin
//! struct over a cloned [`Database`](comanda_db::Database) handle; build
//! one per request through [`AppState`](crate::AppState).
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  handler ──► state.orders().send(&id) ──► OrderService                  │
//! │                                              │ validate (comanda-core)  │
//! │                                              │ read / write (comanda-db)│
//! │                                              ▼                          │
//! │                                           ApiResult<OrderView>          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Services return [`ApiError`](crate::error::ApiError) directly so the
//! messages a waiter sees are decided here, not in the handlers.

pub mod analytics;
pub mod auth;
pub mod cashier;
pub mod category;
pub mod order;
pub mod payment;
pub mod print;
pub mod product;
pub mod table;
pub mod user;

pub use analytics::AnalyticsService;
pub use auth::AuthService;
pub use cashier::CashierService;
pub use category::CategoryService;
pub use order::OrderService;
pub use payment::OrderPaymentService;
pub use print::PrintService;
pub use product::ProductService;
pub use table::TableService;
pub use user::UserService;

#[cfg(test)]
pub(crate) mod test_support {
    use chrono::Utc;
    use comanda_core::{new_id, Category, Product, Role, User};
    use comanda_db::{Database, DbConfig};

    pub async fn db() -> Database {
        Database::new(DbConfig::in_memory()).await.unwrap()
    }

    pub async fn product(db: &Database, name: &str, price_cents: i64) -> Product {
        let category = Category {
            id: new_id(),
            name: format!("Categoria {name}"),
            created_at: Utc::now(),
        };
        db.categories().insert(&category).await.unwrap();

        let product = Product {
            id: new_id(),
            name: name.to_string(),
            price_cents,
            description: String::new(),
            disabled: false,
            category_id: category.id,
            created_at: Utc::now(),
        };
        db.products().insert(&product).await.unwrap();
        product
    }

    pub fn staff() -> User {
        User {
            id: new_id(),
            name: "Caixa".to_string(),
            email: "caixa@bar.com".to_string(),
            password_hash: String::new(),
            role: Role::Staff,
            created_at: Utc::now(),
        }
    }
}
