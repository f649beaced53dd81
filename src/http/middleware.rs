//! Authorization middleware around the HTTP client.

use std::sync::Arc;

use reqwest::{
    header::{HeaderValue, AUTHORIZATION},
    Request, Response, StatusCode,
};

use super::ClientError;
use crate::routing::{Navigator, LOGIN_PATH};
use crate::session::AuthSession;

/// Runs on every outgoing request before it is sent.
pub trait RequestMiddleware: Send + Sync {
    /// Return the (possibly rewritten) request, or an error that aborts it.
    fn on_request(&self, request: Request) -> Result<Request, ClientError>;
}

/// Runs on every outcome, success or failure, before the caller sees it.
pub trait ResponseMiddleware: Send + Sync {
    fn on_response(
        &self,
        outcome: Result<Response, ClientError>,
    ) -> Result<Response, ClientError>;
}

/// Adds `Authorization: Bearer <token>` while the session holds a token.
#[derive(Debug, Clone)]
pub struct BearerAuth {
    session: Arc<AuthSession>,
}

impl BearerAuth {
    pub fn new(session: Arc<AuthSession>) -> Self {
        Self { session }
    }
}

impl RequestMiddleware for BearerAuth {
    fn on_request(&self, mut request: Request) -> Result<Request, ClientError> {
        if !self.session.is_authenticated() {
            return Ok(request);
        }

        // Read once: the token may have been cleared since the check above.
        let token = self.session.token();
        if token.is_empty() {
            return Ok(request);
        }

        let mut value = HeaderValue::from_str(&format!("Bearer {token}"))?;
        value.set_sensitive(true);
        request.headers_mut().insert(AUTHORIZATION, value);
        tracing::debug!(url = %request.url(), "Attached bearer token");
        Ok(request)
    }
}

/// Drops the session and sends the user to the login route when the server
/// answers 401. The 401 is still returned to the caller.
#[derive(Clone)]
pub struct UnauthorizedRedirect {
    session: Arc<AuthSession>,
    navigator: Arc<dyn Navigator>,
}

impl UnauthorizedRedirect {
    pub fn new(session: Arc<AuthSession>, navigator: Arc<dyn Navigator>) -> Self {
        Self { session, navigator }
    }
}

impl ResponseMiddleware for UnauthorizedRedirect {
    fn on_response(
        &self,
        outcome: Result<Response, ClientError>,
    ) -> Result<Response, ClientError> {
        if let Err(e) = &outcome {
            if e.status() == Some(StatusCode::UNAUTHORIZED) {
                tracing::warn!("Server rejected credentials, logging out");
                self.session.logout();
                self.navigator.navigate(LOGIN_PATH);
            }
        }
        outcome
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::LoginResponse;
    use crate::routing::Router;
    use crate::store::MemorySnapshotRepository;

    fn session() -> Arc<AuthSession> {
        Arc::new(AuthSession::open(Arc::new(MemorySnapshotRepository::new())))
    }

    fn logged_in(token: &str) -> Arc<AuthSession> {
        let session = session();
        let response: LoginResponse =
            serde_json::from_value(serde_json::json!({ "token": token, "user": { "id": 1 } }))
                .unwrap();
        session.login(response);
        session
    }

    fn request() -> Request {
        reqwest::Client::new()
            .get("http://localhost/events")
            .build()
            .unwrap()
    }

    #[test]
    fn bearer_auth_leaves_anonymous_requests_alone() {
        let request = BearerAuth::new(session()).on_request(request()).unwrap();
        assert!(request.headers().get(AUTHORIZATION).is_none());
    }

    #[test]
    fn bearer_auth_attaches_token() {
        let request = BearerAuth::new(logged_in("abc")).on_request(request()).unwrap();

        let header = request.headers().get(AUTHORIZATION).unwrap();
        assert_eq!(header, "Bearer abc");
        assert!(header.is_sensitive());
    }

    #[test]
    fn bearer_auth_replaces_existing_header() {
        let mut req = request();
        req.headers_mut()
            .insert(AUTHORIZATION, HeaderValue::from_static("Basic xyz"));

        let req = BearerAuth::new(logged_in("abc")).on_request(req).unwrap();

        assert_eq!(req.headers().get_all(AUTHORIZATION).iter().count(), 1);
        assert_eq!(req.headers().get(AUTHORIZATION).unwrap(), "Bearer abc");
    }

    #[test]
    fn bearer_auth_rejects_tokens_that_are_not_header_safe() {
        let session = session();
        session.set_token("abc\ndef");

        let result = BearerAuth::new(session).on_request(request());

        assert!(matches!(result, Err(ClientError::InvalidHeader(_))));
    }

    #[test]
    fn unauthorized_logs_out_and_navigates_to_login() {
        let session = logged_in("abc");
        let router = Arc::new(Router::new(session.clone()));
        let middleware = UnauthorizedRedirect::new(session.clone(), router.clone());

        let outcome = middleware.on_response(Err(ClientError::Unauthorized));

        assert!(matches!(outcome, Err(ClientError::Unauthorized)));
        assert!(!session.is_authenticated());
        assert!(session.user().is_none());
        assert_eq!(router.current().as_deref(), Some(LOGIN_PATH));
    }

    #[test]
    fn other_failures_pass_through() {
        let session = logged_in("abc");
        let router = Arc::new(Router::new(session.clone()));
        let middleware = UnauthorizedRedirect::new(session.clone(), router.clone());

        let outcome = middleware.on_response(Err(ClientError::Forbidden("no".into())));

        assert!(matches!(outcome, Err(ClientError::Forbidden(m)) if m == "no"));
        assert_eq!(session.token(), "abc");
        assert!(router.current().is_none());
    }
}
