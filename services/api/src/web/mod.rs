pub mod auth;
pub mod dreams;
pub mod error;
pub mod middleware;
pub mod rest;
pub mod state;

use axum::{
    extract::DefaultBodyLimit,
    middleware as axum_middleware,
    routing::{get, post},
    Router,
};
use std::sync::Arc;

use state::AppState;

pub use middleware::require_auth;

/// Builds the API router: public auth routes plus the session-gated journal
/// routes, sharing one `AppState`. The body limit covers base64 image and
/// voice payloads.
pub fn router(app_state: Arc<AppState>) -> Router {
    let public_routes = Router::new()
        .route("/login", post(auth::login_handler))
        .route("/logout", post(auth::logout_handler));

    let protected_routes = Router::new()
        .route("/me", get(auth::me_handler))
        .route(
            "/dreams",
            get(dreams::list_dreams_handler).post(dreams::create_dream_handler),
        )
        .route("/dreams/complete", post(dreams::complete_dream_handler))
        .route_layer(axum_middleware::from_fn_with_state(
            app_state.clone(),
            require_auth,
        ));

    Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .layer(DefaultBodyLimit::max(50 * 1024 * 1024))
        .with_state(app_state)
}
