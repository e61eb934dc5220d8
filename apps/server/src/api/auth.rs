//! Login, sign-up and "who am I".

use axum::extract::State;
use axum::routing::{get, post};
use axum::Router;
use serde::Deserialize;

use comanda_core::UserView;

use super::extract::Json;
use crate::auth::CurrentUser;
use crate::error::ApiResult;
use crate::services::auth::AuthResponse;
use crate::services::user::NewUser;
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct SessionRequest {
    pub email: String,
    pub password: String,
}

pub fn router() -> Router<AppState> {
    Router::new().nest(
        "/api/auth",
        Router::new()
            .route("/session", post(session))
            .route("/users", post(create_user))
            .route("/me", get(me)),
    )
}

/// POST /api/auth/session
async fn session(
    State(state): State<AppState>,
    Json(request): Json<SessionRequest>,
) -> ApiResult<Json<AuthResponse>> {
    let response = state
        .auth()
        .authenticate(&request.email, &request.password)
        .await?;
    Ok(Json(response))
}

/// POST /api/auth/users
///
/// Open to anonymous callers, who always get STAFF once an account exists.
async fn create_user(
    State(state): State<AppState>,
    caller: Option<CurrentUser>,
    Json(request): Json<NewUser>,
) -> ApiResult<Json<UserView>> {
    Ok(Json(state.users().create_user(request, caller.as_ref()).await?))
}

/// GET /api/auth/me
async fn me(State(state): State<AppState>, user: CurrentUser) -> ApiResult<Json<UserView>> {
    Ok(Json(state.users().get_user(&user.id).await?))
}
