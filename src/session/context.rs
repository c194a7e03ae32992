use std::sync::Arc;

use tokio::sync::watch;
use tracing::{debug, info};

use super::model::{Session, SessionUser};
use super::store::SessionStore;
use crate::error::ApiError;

/// Shared handle to the current session.
///
/// Writes go to the backing store first and are then published to every
/// subscriber, so a receiver never observes a session that failed to persist.
/// Clearing is the reverse: subscribers lose the session even if the store
/// cannot forget it.
#[derive(Clone)]
pub struct SessionContext {
    store: Arc<dyn SessionStore>,
    tx: Arc<watch::Sender<Option<Session>>>,
}

impl SessionContext {
    /// Builds a context seeded from whatever the store currently holds.
    pub async fn load(store: Arc<dyn SessionStore>) -> Result<Self, ApiError> {
        let initial = store.load().await?;
        if let Some(s) = &initial {
            debug!(user = %s.user.display_name(), "restored session");
        }
        let (tx, _rx) = watch::channel(initial);
        Ok(Self {
            store,
            tx: Arc::new(tx),
        })
    }

    pub fn current(&self) -> Option<Session> {
        self.tx.borrow().clone()
    }

    pub fn token(&self) -> Option<String> {
        self.tx
            .borrow()
            .as_ref()
            .filter(|s| s.has_token())
            .map(|s| s.token.clone())
    }

    pub fn user(&self) -> Option<SessionUser> {
        self.tx.borrow().as_ref().map(|s| s.user.clone())
    }

    pub fn is_authenticated(&self) -> bool {
        self.token().is_some()
    }

    pub async fn set(&self, session: Session) -> Result<(), ApiError> {
        self.store.save(&session).await?;
        info!(user = %session.user.display_name(), "session started");
        self.tx.send_replace(Some(session));
        Ok(())
    }

    /// Replaces the profile while keeping the token. No-op without a session.
    pub async fn update_user(&self, user: SessionUser) -> Result<bool, ApiError> {
        let Some(mut session) = self.current() else {
            return Ok(false);
        };
        session.user = user;
        self.store.save(&session).await?;
        self.tx.send_replace(Some(session));
        Ok(true)
    }

    /// Drops the session for every subscriber, then deletes the stored copy.
    /// A store failure is returned but the in-memory session stays cleared.
    pub async fn clear(&self) -> Result<(), ApiError> {
        let had = self.tx.send_replace(None).is_some();
        if had {
            info!("session cleared");
        }
        self.store.clear().await
    }

    /// Receiver that wakes on every session change.
    pub fn subscribe(&self) -> watch::Receiver<Option<Session>> {
        self.tx.subscribe()
    }
}
