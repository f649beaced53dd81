//! The authenticated session: bearer token plus user profile.
//!
//! [`AuthSession`] is the only way to change the session. It is shared as an
//! `Arc` by the HTTP middleware and the router, and every change is written to
//! the snapshot repository under [`AUTH_STORE_ID`].

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::models::{LoginResponse, UserProfile};
use crate::store::{PersistedStore, SnapshotRepository};

/// Snapshot key of the auth store.
pub const AUTH_STORE_ID: &str = "auth";

/// Session state as persisted: `{"token": "...", "user": {...} | null}`.
///
/// An empty token means nobody is logged in.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub token: String,
    pub user: Option<UserProfile>,
}

impl Session {
    pub fn is_authenticated(&self) -> bool {
        !self.token.is_empty()
    }

    pub fn state(&self) -> AuthState {
        if self.is_authenticated() {
            AuthState::Authenticated
        } else {
            AuthState::Unauthenticated
        }
    }
}

/// Whether requests currently go out with credentials.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthState {
    Unauthenticated,
    Authenticated,
}

/// Process-wide auth store.
#[derive(Debug)]
pub struct AuthSession {
    store: PersistedStore<Session>,
}

impl AuthSession {
    /// Open the auth store, restoring whatever session was last saved.
    pub fn open(repository: Arc<dyn SnapshotRepository>) -> Self {
        let store = PersistedStore::open(AUTH_STORE_ID, repository);
        let state = store.read(Session::state);
        tracing::debug!(?state, "Auth session opened");
        Self { store }
    }

    /// Take the token and user from a successful login. Both change in one
    /// mutation, so no reader sees a token without its user.
    pub fn login(&self, response: LoginResponse) {
        self.store.mutate(|s| {
            s.token = response.token;
            s.user = Some(response.user);
        });
        tracing::info!("Logged in");
    }

    /// Forget both the token and the user.
    pub fn logout(&self) {
        self.store.mutate(|s| {
            s.token.clear();
            s.user = None;
        });
        tracing::info!("Logged out");
    }

    /// Replace the token, leaving the user as is.
    pub fn set_token(&self, token: impl Into<String>) {
        let token = token.into();
        self.store.mutate(|s| s.token = token);
    }

    /// Empty the token but keep the user. Unlike [`logout`](Self::logout),
    /// the stale profile stays readable until the next login.
    pub fn clear_token(&self) {
        self.store.mutate(|s| s.token.clear());
    }

    pub fn is_authenticated(&self) -> bool {
        self.store.read(Session::is_authenticated)
    }

    pub fn state(&self) -> AuthState {
        self.store.read(Session::state)
    }

    pub fn token(&self) -> String {
        self.store.read(|s| s.token.clone())
    }

    pub fn user(&self) -> Option<UserProfile> {
        self.store.read(|s| s.user.clone())
    }

    /// Copy of the whole session, read under one lock.
    pub fn snapshot(&self) -> Session {
        self.store.read(Session::clone)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemorySnapshotRepository;
    use serde_json::json;

    fn login_response(token: &str) -> LoginResponse {
        serde_json::from_value(json!({ "token": token, "user": { "id": 1 } })).unwrap()
    }

    #[test]
    fn login_is_a_single_write() {
        let repo = Arc::new(MemorySnapshotRepository::new());
        let session = AuthSession::open(repo.clone());

        session.login(login_response("abc"));

        assert_eq!(repo.writes(AUTH_STORE_ID), 1);
        let saved: serde_json::Value =
            serde_json::from_str(&repo.get(AUTH_STORE_ID).unwrap()).unwrap();
        assert_eq!(saved, json!({ "token": "abc", "user": { "id": 1 } }));
    }

    #[test]
    fn logout_persists_null_user() {
        let repo = Arc::new(MemorySnapshotRepository::new());
        let session = AuthSession::open(repo.clone());
        session.login(login_response("abc"));

        session.logout();

        let saved: serde_json::Value =
            serde_json::from_str(&repo.get(AUTH_STORE_ID).unwrap()).unwrap();
        assert_eq!(saved, json!({ "token": "", "user": null }));
    }

    #[test]
    fn state_tracks_token() {
        let session = AuthSession::open(Arc::new(MemorySnapshotRepository::new()));
        assert_eq!(session.state(), AuthState::Unauthenticated);

        session.set_token("t");
        assert_eq!(session.state(), AuthState::Authenticated);

        session.clear_token();
        assert_eq!(session.state(), AuthState::Unauthenticated);
    }
}
