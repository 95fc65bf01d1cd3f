pub mod domain;
pub mod ports;

pub use domain::{AuthSession, Dream, DreamFragment, DreamId, User, UserId};
pub use ports::{
    DreamCompletionService, DreamStore, IdentityStore, PortError, PortResult, SessionStore,
    VoiceSynthesisService,
};
