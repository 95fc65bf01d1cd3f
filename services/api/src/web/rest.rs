//! services/api/src/web/rest.rs
//!
//! Master definition for the OpenAPI specification.

use utoipa::OpenApi;

use crate::web::{auth, dreams, error};

#[derive(OpenApi)]
#[openapi(
    paths(
        auth::login_handler,
        auth::me_handler,
        auth::logout_handler,
        dreams::list_dreams_handler,
        dreams::create_dream_handler,
        dreams::complete_dream_handler,
    ),
    components(
        schemas(
            auth::LoginRequest,
            auth::LoginResponse,
            auth::LogoutResponse,
            auth::UserResponse,
            dreams::CompleteDreamRequest,
            dreams::CompleteDreamResponse,
            dreams::CreateDreamRequest,
            dreams::CreateDreamResponse,
            dreams::DreamResponse,
            error::ErrorBody,
        )
    ),
    tags(
        (name = "Somnova API", description = "API endpoints for the dream journal.")
    )
)]
pub struct ApiDoc;
