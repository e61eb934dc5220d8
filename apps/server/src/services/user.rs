//! Staff accounts.

use chrono::Utc;
use serde::Deserialize;
use tracing::{info, warn};

use comanda_core::validation::{validate_email, validate_name, validate_password};
use comanda_core::{new_id, normalize_email, Role, User, UserView};
use comanda_db::Database;

use crate::auth::password::hash_password;
use crate::auth::CurrentUser;
use crate::error::{ApiError, ApiResult};

#[derive(Debug, Clone, Deserialize)]
pub struct NewUser {
    pub name: String,
    pub email: String,
    pub password: String,
    #[serde(default)]
    pub role: Role,
}

pub struct UserService {
    db: Database,
}

impl UserService {
    pub fn new(db: Database) -> Self {
        UserService { db }
    }

    /// Registers an account. The email is stored trimmed and lower-cased.
    ///
    /// ## Role
    /// - admin caller: the requested role
    /// - no account exists yet: the requested role (first-run setup)
    /// - anyone else: STAFF, whatever was requested
    pub async fn create_user(
        &self,
        input: NewUser,
        caller: Option<&CurrentUser>,
    ) -> ApiResult<UserView> {
        validate_name("name", &input.name)?;
        validate_email(&input.email)?;
        validate_password(&input.password)?;

        let email = normalize_email(&input.email);
        if self.db.users().get_by_email(&email).await?.is_some() {
            return Err(ApiError::validation("Email already registered"));
        }

        let role = self.granted_role(input.role, caller).await?;

        let password_hash = hash_password(&input.password)
            .map_err(|e| ApiError::internal(format!("Failed to hash password: {e}")))?;

        let user = User {
            id: new_id(),
            name: input.name.trim().to_string(),
            email,
            password_hash,
            role,
            created_at: Utc::now(),
        };

        self.db.users().insert(&user).await.map_err(|e| {
            if e.is_unique_violation() {
                ApiError::validation("Email already registered")
            } else {
                e.into()
            }
        })?;

        info!(user_id = %user.id, role = %user.role, "User registered");
        Ok(UserView::from(&user))
    }

    async fn granted_role(&self, requested: Role, caller: Option<&CurrentUser>) -> ApiResult<Role> {
        if requested == Role::Staff || caller.is_some_and(CurrentUser::is_admin) {
            return Ok(requested);
        }
        if self.db.users().count().await? == 0 {
            info!(role = %requested, "Bootstrapping first account");
            return Ok(requested);
        }

        warn!(requested = %requested, "Role requested without admin rights, granting STAFF");
        Ok(Role::Staff)
    }

    pub async fn get_user(&self, id: &str) -> ApiResult<UserView> {
        self.db
            .users()
            .get_by_id(id)
            .await?
            .map(|u| UserView::from(&u))
            .ok_or_else(|| ApiError::not_found("User not found"))
    }
}
