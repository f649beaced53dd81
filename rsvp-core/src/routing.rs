//! Application routes and the authentication guard in front of them.
//!
//! There are two routes: `/` (home, protected) and `/login`. Every navigation,
//! whether a user action or forced by the HTTP layer after a 401, goes through
//! [`RouteGuard::check`].

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use crate::session::AuthSession;

pub const HOME_PATH: &str = "/";
pub const LOGIN_PATH: &str = "/login";

/// Locations a [`Router`] remembers; older ones are dropped.
pub const HISTORY_LIMIT: usize = 32;

/// A route in the application.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Route {
    pub path: &'static str,
    pub name: &'static str,
    pub requires_auth: bool,
}

pub const HOME: Route = Route {
    path: HOME_PATH,
    name: "home",
    requires_auth: true,
};

pub const LOGIN: Route = Route {
    path: LOGIN_PATH,
    name: "Login",
    requires_auth: false,
};

/// The routes known to the application.
#[derive(Debug, Clone)]
pub struct RouteTable {
    routes: Vec<Route>,
}

impl RouteTable {
    pub fn new(routes: Vec<Route>) -> Self {
        Self { routes }
    }

    /// Exact match on path, ignoring any query string or fragment.
    pub fn resolve(&self, path: &str) -> Option<&Route> {
        let path = path.split(['?', '#']).next().unwrap_or(path);
        self.routes.iter().find(|r| r.path == path)
    }

    pub fn routes(&self) -> &[Route] {
        &self.routes
    }
}

impl Default for RouteTable {
    fn default() -> Self {
        Self::new(vec![HOME, LOGIN])
    }
}

/// Outcome of a navigation attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Navigation {
    /// Navigation completes at the requested path.
    Proceed { path: String },
    /// The guard sent the user to `to` instead of `from`.
    Redirect { from: String, to: String },
}

impl Navigation {
    /// Where the user ends up.
    pub fn destination(&self) -> &str {
        match self {
            Self::Proceed { path } => path,
            Self::Redirect { to, .. } => to,
        }
    }

    pub fn is_redirect(&self) -> bool {
        matches!(self, Self::Redirect { .. })
    }
}

/// Keeps unauthenticated users out of routes that require authentication.
#[derive(Debug, Clone)]
pub struct RouteGuard {
    session: Arc<AuthSession>,
    routes: RouteTable,
}

impl RouteGuard {
    pub fn new(session: Arc<AuthSession>, routes: RouteTable) -> Self {
        Self { session, routes }
    }

    /// Decide where a navigation to `path` lands.
    ///
    /// Paths matching no route are not guarded.
    pub fn check(&self, path: &str) -> Navigation {
        let requires_auth = match self.routes.resolve(path) {
            Some(route) => route.requires_auth,
            None => {
                tracing::debug!(path, "No route matches");
                false
            }
        };

        if requires_auth && !self.session.is_authenticated() {
            tracing::info!(from = path, to = LOGIN_PATH, "Redirecting unauthenticated navigation");
            return Navigation::Redirect {
                from: path.to_string(),
                to: LOGIN_PATH.to_string(),
            };
        }

        Navigation::Proceed {
            path: path.to_string(),
        }
    }
}

/// Something that can move the user to another route.
pub trait Navigator: Send + Sync {
    fn navigate(&self, path: &str) -> Navigation;
}

/// Guarded navigation with a remembered current location.
#[derive(Debug)]
pub struct Router {
    guard: RouteGuard,
    history: Mutex<VecDeque<String>>,
}

impl Router {
    pub fn new(session: Arc<AuthSession>) -> Self {
        Self::with_routes(session, RouteTable::default())
    }

    pub fn with_routes(session: Arc<AuthSession>, routes: RouteTable) -> Self {
        Self {
            guard: RouteGuard::new(session, routes),
            history: Mutex::new(VecDeque::with_capacity(HISTORY_LIMIT)),
        }
    }

    /// Navigate to `path`, recording wherever the guard lets the user land.
    pub fn push(&self, path: &str) -> Navigation {
        let navigation = self.guard.check(path);
        let mut history = self.history.lock().unwrap_or_else(|p| p.into_inner());
        if history.len() == HISTORY_LIMIT {
            history.pop_front();
        }
        history.push_back(navigation.destination().to_string());
        navigation
    }

    /// Current location, `None` before the first navigation.
    pub fn current(&self) -> Option<String> {
        self.history
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .back()
            .cloned()
    }

    /// The last [`HISTORY_LIMIT`] locations visited, oldest first.
    pub fn history(&self) -> Vec<String> {
        self.history
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .iter()
            .cloned()
            .collect()
    }

    pub fn guard(&self) -> &RouteGuard {
        &self.guard
    }
}

impl Navigator for Router {
    fn navigate(&self, path: &str) -> Navigation {
        self.push(path)
    }
}
