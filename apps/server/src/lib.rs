//! # Comanda Server
//!
//! REST backend for the restaurant floor: menu, tables, orders, split
//! payments, the cash register, receipts and the sales dashboard.
//!
//! ## Architecture
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                          Comanda Server                                 │
//! │                                                                         │
//! │  Waiter app ─┐                                                          │
//! │  QR menu ────┼──► axum Router ──► extractors ──► handlers (api/)       │
//! │  Cashier ────┘    Trace + CORS    CurrentUser        │                  │
//! │                                   AdminUser          ▼                  │
//! │                                               services/ ──► comanda-db │
//! │                                                   │                     │
//! │                                                   └──► comanda-core     │
//! │                                                                         │
//! │  ┌──────────────────────────────────────────────────────────────────┐  │
//! │  │                        Infrastructure                            │  │
//! │  │  ┌──────────────┐  ┌──────────────┐  ┌────────────────────────┐  │  │
//! │  │  │   SQLite     │  │  JWT (HS256) │  │  Tunnel                │  │  │
//! │  │  │  comanda.db  │  │  argon2      │  │  local | cloudflared   │  │  │
//! │  │  └──────────────┘  └──────────────┘  └────────────────────────┘  │  │
//! │  └──────────────────────────────────────────────────────────────────┘  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Configuration
//! See [`config`]. The only required value is `jwt.secret`
//! (`COMANDA_JWT__SECRET`).

pub mod api;
pub mod auth;
pub mod config;
pub mod error;
pub mod logging;
pub mod services;
pub mod tunnel;

use std::sync::Arc;

use axum::http::HeaderValue;
use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::warn;

use comanda_db::Database;

use crate::auth::JwtManager;
use crate::services::{
    AnalyticsService, AuthService, CashierService, CategoryService, OrderPaymentService,
    OrderService, PrintService, ProductService, TableService, UserService,
};

// Re-exports
pub use config::ServerConfig;
pub use error::{ApiError, ApiResult};

/// Shared application state, cloned into every handler.
#[derive(Clone)]
pub struct AppState {
    pub db: Database,
    pub jwt: Arc<JwtManager>,
    pub config: Arc<ServerConfig>,
}

impl AppState {
    pub fn new(db: Database, config: ServerConfig) -> Self {
        AppState {
            db,
            jwt: Arc::new(JwtManager::from_config(&config.jwt)),
            config: Arc::new(config),
        }
    }

    pub fn auth(&self) -> AuthService {
        AuthService::new(self.db.clone(), self.jwt.clone())
    }

    pub fn users(&self) -> UserService {
        UserService::new(self.db.clone())
    }

    pub fn categories(&self) -> CategoryService {
        CategoryService::new(self.db.clone())
    }

    pub fn products(&self) -> ProductService {
        ProductService::new(self.db.clone())
    }

    pub fn tables(&self) -> TableService {
        TableService::new(self.db.clone())
    }

    pub fn orders(&self) -> OrderService {
        OrderService::new(self.db.clone())
    }

    pub fn payments(&self) -> OrderPaymentService {
        OrderPaymentService::new(self.db.clone())
    }

    pub fn cashier(&self) -> CashierService {
        CashierService::new(self.db.clone())
    }

    pub fn print(&self) -> PrintService {
        PrintService::new(self.db.clone())
    }

    pub fn analytics(&self) -> AnalyticsService {
        AnalyticsService::new(self.db.clone())
    }
}

/// Builds the full HTTP application.
pub fn build_router(state: AppState) -> Router {
    let cors = cors_layer(&state.config.server.cors_origins);

    api::router()
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

/// `*` anywhere in the list allows every origin.
fn cors_layer(origins: &[String]) -> CorsLayer {
    let layer = CorsLayer::new().allow_methods(Any).allow_headers(Any);

    if origins.iter().any(|o| o == "*") {
        return layer.allow_origin(Any);
    }

    let allowed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                warn!(%origin, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    layer.allow_origin(allowed)
}
