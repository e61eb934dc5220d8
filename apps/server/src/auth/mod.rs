//! # Authentication
//!
//! ```text
//! POST /api/auth/session ──► password::verify_password ──► JwtManager::issue
//!                                                              │
//!            Authorization: Bearer <token>  ◄──────────────────┘
//!                        │
//!                        ▼
//!    CurrentUser extractor (401) ──► AdminUser extractor (403)
//! ```

pub mod extractor;
pub mod jwt;
pub mod password;

pub use extractor::{AdminUser, CurrentUser};
pub use jwt::{Claims, JwtError, JwtManager};
