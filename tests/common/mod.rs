#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use shopadmin::http::{MemoryNavigator, Navigator};
use shopadmin::session::{MemorySessionStore, Session, SessionStore, SessionUser};
use shopadmin::{AppState, ClientConfig};
use wiremock::MockServer;

pub const TOKEN: &str = "tok-123";

pub fn user(role: &str) -> SessionUser {
    SessionUser {
        id: Some(1),
        username: Some("alice".into()),
        email: Some("alice@example.com".into()),
        role: Some(role.into()),
        ..SessionUser::default()
    }
}

pub fn config(server: &MockServer) -> ClientConfig {
    let mut cfg = ClientConfig::for_base_url(&server.uri());
    cfg.batch.poll_interval = Duration::from_millis(50);
    cfg.timeout = Duration::from_secs(5);
    cfg
}

/// App wired to `server`, starting at `path`, optionally already logged in.
pub async fn app_with_store(
    server: &MockServer,
    path: &str,
    store: Arc<dyn SessionStore>,
) -> (AppState, Arc<MemoryNavigator>) {
    let navigator = Arc::new(MemoryNavigator::new(path));
    let state = AppState::from_parts(
        Arc::new(config(server)),
        store,
        Arc::clone(&navigator) as Arc<dyn Navigator>,
    )
    .await
    .unwrap();
    (state, navigator)
}

pub async fn app(
    server: &MockServer,
    path: &str,
    session: Option<Session>,
) -> (AppState, Arc<MemoryNavigator>) {
    let store = match session {
        Some(s) => MemorySessionStore::with_session(s),
        None => MemorySessionStore::new(),
    };
    app_with_store(server, path, Arc::new(store)).await
}

pub async fn logged_in(server: &MockServer, path: &str, role: &str) -> (AppState, Arc<MemoryNavigator>) {
    app(server, path, Some(Session::new(TOKEN, user(role)))).await
}
