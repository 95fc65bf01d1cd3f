//! services/api/src/web/auth.rs
//!
//! Authentication endpoints: email login, logout, and the current-user probe.

use axum::{
    extract::State,
    http::{header, HeaderMap, StatusCode},
    response::IntoResponse,
    Extension, Json,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use somnova_core::domain::UserId;
use somnova_core::ports::PortError;
use std::sync::Arc;
use utoipa::ToSchema;

use crate::web::error::{ErrorBody, HttpError};
use crate::web::middleware::session_token;
use crate::web::state::AppState;

//=========================================================================================
// Request/Response Types
//=========================================================================================

#[derive(Deserialize, ToSchema)]
pub struct LoginRequest {
    #[serde(default)]
    pub email: String,
}

#[derive(Serialize, ToSchema)]
pub struct UserResponse {
    pub id: i64,
    pub email: String,
}

#[derive(Serialize, ToSchema)]
pub struct LoginResponse {
    pub success: bool,
    pub user: UserResponse,
}

#[derive(Serialize, ToSchema)]
pub struct LogoutResponse {
    pub success: bool,
}

//=========================================================================================
// Handlers
//=========================================================================================

/// POST /login - Resolve or lazily create the user for an email and start a session
#[utoipa::path(
    post,
    path = "/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login successful", body = LoginResponse),
        (status = 400, description = "Email missing", body = ErrorBody)
    )
)]
pub async fn login_handler(
    State(state): State<Arc<AppState>>,
    Json(req): Json<LoginRequest>,
) -> Result<impl IntoResponse, HttpError> {
    let email = req.email.trim();
    if email.is_empty() {
        return Err(PortError::Validation("Email required".to_string()).into());
    }

    // First login with a fresh email creates the user row; repeat logins
    // resolve to the same row.
    let user = state.identity.find_or_create_by_email(email).await?;
    let session = state.sessions.start(user.id).await?;

    let max_age = (session.expires_at - Utc::now()).num_seconds();
    let cookie = format!(
        "session={}; HttpOnly; Secure; SameSite=None; Path=/; Max-Age={}",
        session.id, max_age
    );

    let response = LoginResponse {
        success: true,
        user: UserResponse {
            id: user.id,
            email: user.email,
        },
    };

    Ok((StatusCode::OK, [(header::SET_COOKIE, cookie)], Json(response)))
}

/// GET /me - Return the identity bound to the current session
#[utoipa::path(
    get,
    path = "/me",
    responses(
        (status = 200, description = "The current user", body = UserResponse),
        (status = 401, description = "No valid session", body = ErrorBody)
    )
)]
pub async fn me_handler(
    State(state): State<Arc<AppState>>,
    Extension(user_id): Extension<UserId>,
) -> Result<Json<UserResponse>, HttpError> {
    let user = state.identity.get_by_id(user_id).await?;
    Ok(Json(UserResponse {
        id: user.id,
        email: user.email,
    }))
}

/// POST /logout - End the current session and clear the cookie
///
/// Idempotent: a missing or already-ended session still yields success.
#[utoipa::path(
    post,
    path = "/logout",
    responses(
        (status = 200, description = "Session ended", body = LogoutResponse)
    )
)]
pub async fn logout_handler(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, HttpError> {
    if let Some(token) = session_token(&headers) {
        state.sessions.end(token).await?;
    }

    let cookie = "session=; HttpOnly; Secure; SameSite=None; Path=/; Max-Age=0";

    Ok((
        StatusCode::OK,
        [(header::SET_COOKIE, cookie.to_string())],
        Json(LogoutResponse { success: true }),
    ))
}
