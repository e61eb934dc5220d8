//! Login.

use std::sync::Arc;

use serde::Serialize;
use tracing::{info, warn};

use comanda_core::{normalize_email, UserView};
use comanda_db::Database;

use crate::auth::password::verify_password;
use crate::auth::JwtManager;
use crate::error::{ApiError, ApiResult};

const INVALID_CREDENTIALS: &str = "Invalid email or password";

#[derive(Debug, Clone, Serialize)]
pub struct AuthResponse {
    pub token: String,
    pub user: UserView,
}

pub struct AuthService {
    db: Database,
    jwt: Arc<JwtManager>,
}

impl AuthService {
    pub fn new(db: Database, jwt: Arc<JwtManager>) -> Self {
        AuthService { db, jwt }
    }

    /// Checks the credentials and signs a token.
    ///
    /// Unknown email and wrong password give the same 401.
    pub async fn authenticate(&self, email: &str, password: &str) -> ApiResult<AuthResponse> {
        let email = normalize_email(email);

        let Some(user) = self.db.users().get_by_email(&email).await? else {
            warn!(%email, "Login for unknown email");
            return Err(ApiError::unauthorized(INVALID_CREDENTIALS));
        };

        if !verify_password(password, &user.password_hash) {
            warn!(user_id = %user.id, "Login with wrong password");
            return Err(ApiError::unauthorized(INVALID_CREDENTIALS));
        }

        let token = self.jwt.issue(&user)?;
        info!(user_id = %user.id, role = %user.role, "User logged in");

        Ok(AuthResponse {
            token,
            user: UserView::from(&user),
        })
    }
}
