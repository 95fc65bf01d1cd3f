//! services/api/src/web/state.rs
//!
//! Defines the application's shared state.

use crate::config::Config;
use somnova_core::ports::{
    DreamCompletionService, DreamStore, IdentityStore, SessionStore, VoiceSynthesisService,
};
use std::sync::Arc;

/// The shared application state, created once at startup and passed to all handlers.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub identity: Arc<dyn IdentityStore>,
    pub dreams: Arc<dyn DreamStore>,
    pub sessions: Arc<dyn SessionStore>,
    pub completion: Arc<dyn DreamCompletionService>,
    pub voice: Arc<dyn VoiceSynthesisService>,
}
