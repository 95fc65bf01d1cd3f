//! crates/somnova_core/src/ports.rs
//!
//! Defines the service contracts (traits) for the application's core logic.
//! These traits form the boundary of the hexagonal architecture, allowing the core
//! to be independent of specific external implementations like databases or APIs.

use async_trait::async_trait;

use crate::domain::{AuthSession, Dream, DreamFragment, DreamId, User, UserId};

//=========================================================================================
// Generic Port Error and Result Types
//=========================================================================================

/// A generic error type for all port operations.
/// This abstracts away the specific errors from external services (e.g., database, network).
#[derive(Debug, thiserror::Error)]
pub enum PortError {
    #[error("Item not found: {0}")]
    NotFound(String),
    #[error("{0}")]
    Validation(String),
    #[error("Unauthorized")]
    Unauthorized,
    #[error("Upstream service failure: {0}")]
    Upstream(String),
    #[error("An unexpected error occurred: {0}")]
    Unexpected(String),
}

/// A convenience type alias for `Result<T, PortError>`.
pub type PortResult<T> = Result<T, PortError>;

//=========================================================================================
// Service Ports (Traits)
//=========================================================================================

#[async_trait]
pub trait IdentityStore: Send + Sync {
    /// Looks a user up by exact email, inserting a fresh row on first login.
    /// Concurrent first logins with the same email must converge on one row;
    /// a uniqueness constraint on the email column is the backstop.
    /// An empty email is a `Validation` error.
    async fn find_or_create_by_email(&self, email: &str) -> PortResult<User>;

    async fn get_by_id(&self, user_id: UserId) -> PortResult<User>;
}

#[async_trait]
pub trait DreamStore: Send + Sync {
    /// Inserts a new dream for `owner_id` and returns the assigned id.
    /// The owner must reference an existing user.
    async fn create(
        &self,
        owner_id: UserId,
        content: &str,
        completed_text: &str,
    ) -> PortResult<DreamId>;

    /// All dreams belonging to `owner_id`, most recent first. An owner with
    /// no dreams yields an empty list, not an error.
    async fn list_by_owner(&self, owner_id: UserId) -> PortResult<Vec<Dream>>;
}

#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Creates a new session bound to `user_id` and returns it, token included.
    async fn start(&self, user_id: UserId) -> PortResult<AuthSession>;

    /// Resolves a token to the bound user id. Missing, unknown, and expired
    /// tokens all resolve to `None`.
    async fn resolve(&self, token: &str) -> PortResult<Option<UserId>>;

    /// Invalidates a session. Idempotent: ending an already-ended or unknown
    /// session is not an error.
    async fn end(&self, token: &str) -> PortResult<()>;
}

#[async_trait]
pub trait DreamCompletionService: Send + Sync {
    /// Sends the multi-modal fragment to the generation service and returns
    /// the completed narrative text. Single attempt; transport or service
    /// failures surface as `Upstream` errors.
    async fn complete_dream(&self, fragment: &DreamFragment) -> PortResult<String>;
}

#[async_trait]
pub trait VoiceSynthesisService: Send + Sync {
    /// Narrates the completed text. Returns `None` when the service produced
    /// no audio; callers must never let a voice failure block the narrative.
    async fn synthesize_voice(&self, completed_text: &str) -> PortResult<Option<Vec<u8>>>;
}
