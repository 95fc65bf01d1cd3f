//! services/api/src/adapters/sessions.rs
//!
//! In-memory implementation of the `SessionStore` port. Tokens are opaque
//! UUIDs mapped to their bound user; the map lives only as long as the
//! process, matching cookie-session semantics.

use async_trait::async_trait;
use chrono::{Duration, Utc};
use somnova_core::domain::{AuthSession, UserId};
use somnova_core::ports::{PortResult, SessionStore};
use std::collections::HashMap;
use tokio::sync::RwLock;
use uuid::Uuid;

/// A session store backed by a process-local map.
pub struct InMemorySessionStore {
    ttl: Duration,
    sessions: RwLock<HashMap<String, AuthSession>>,
}

impl InMemorySessionStore {
    /// Creates a new store whose sessions expire `ttl` after creation.
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            sessions: RwLock::new(HashMap::new()),
        }
    }
}

#[async_trait]
impl SessionStore for InMemorySessionStore {
    async fn start(&self, user_id: UserId) -> PortResult<AuthSession> {
        let session = AuthSession {
            id: Uuid::new_v4().to_string(),
            user_id,
            expires_at: Utc::now() + self.ttl,
        };
        self.sessions
            .write()
            .await
            .insert(session.id.clone(), session.clone());
        Ok(session)
    }

    async fn resolve(&self, token: &str) -> PortResult<Option<UserId>> {
        let expired = {
            let sessions = self.sessions.read().await;
            match sessions.get(token) {
                Some(session) if session.expires_at > Utc::now() => {
                    return Ok(Some(session.user_id));
                }
                Some(_) => true,
                None => false,
            }
        };

        // Evict lazily; an expired token behaves exactly like an unknown one.
        if expired {
            self.sessions.write().await.remove(token);
        }
        Ok(None)
    }

    async fn end(&self, token: &str) -> PortResult<()> {
        self.sessions.write().await.remove(token);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn start_then_resolve_returns_bound_user() {
        let store = InMemorySessionStore::new(Duration::days(30));
        let session = store.start(7).await.unwrap();
        assert_eq!(store.resolve(&session.id).await.unwrap(), Some(7));
    }

    #[tokio::test]
    async fn unknown_and_ended_tokens_resolve_to_none() {
        let store = InMemorySessionStore::new(Duration::days(30));
        assert_eq!(store.resolve("no-such-token").await.unwrap(), None);

        let session = store.start(1).await.unwrap();
        store.end(&session.id).await.unwrap();
        assert_eq!(store.resolve(&session.id).await.unwrap(), None);

        // Ending again is not an error.
        store.end(&session.id).await.unwrap();
    }

    #[tokio::test]
    async fn expired_sessions_resolve_to_none() {
        let store = InMemorySessionStore::new(Duration::seconds(-1));
        let session = store.start(3).await.unwrap();
        assert_eq!(store.resolve(&session.id).await.unwrap(), None);
    }
}
