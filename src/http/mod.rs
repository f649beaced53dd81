//! HTTP client with request/response middleware.
//!
//! Every call goes through the same pipeline:
//!
//! 1. the request is built; a build error short-circuits to step 4,
//! 2. request middleware runs in registration order and may rewrite it,
//! 3. the request is sent; a non-2xx status becomes a [`ClientError`],
//! 4. response middleware runs in registration order over the outcome.
//!
//! Middleware that does not care about an outcome must hand it back unchanged.

mod middleware;

use std::sync::Arc;
use std::time::Duration;

use reqwest::{header::InvalidHeaderValue, Client, Method, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use thiserror::Error;

pub use middleware::{BearerAuth, RequestMiddleware, ResponseMiddleware, UnauthorizedRedirect};

/// HTTP client errors.
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Invalid header value: {0}")]
    InvalidHeader(#[from] InvalidHeaderValue),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Unauthorized: not logged in or session expired")]
    Unauthorized,

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Server responded {status}: {message}")]
    Status { status: StatusCode, message: String },

    #[error("Unexpected login response: {0}")]
    InvalidLoginResponse(String),

    #[error("Unexpected response body: {0}")]
    Decode(#[from] serde_json::Error),
}

impl ClientError {
    /// Map a failed response to an error, keeping the server's message.
    pub async fn from_response(response: Response) -> Self {
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        Self::from_status(status, &body)
    }

    pub fn from_status(status: StatusCode, body: &str) -> Self {
        let message = error_message(body);
        match status {
            StatusCode::BAD_REQUEST | StatusCode::UNPROCESSABLE_ENTITY => Self::BadRequest(message),
            StatusCode::UNAUTHORIZED => Self::Unauthorized,
            StatusCode::FORBIDDEN => Self::Forbidden(message),
            StatusCode::NOT_FOUND => Self::NotFound(message),
            _ => Self::Status { status, message },
        }
    }

    /// HTTP status behind the error, if the server answered at all.
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            Self::BadRequest(_) => Some(StatusCode::BAD_REQUEST),
            Self::Unauthorized => Some(StatusCode::UNAUTHORIZED),
            Self::Forbidden(_) => Some(StatusCode::FORBIDDEN),
            Self::NotFound(_) => Some(StatusCode::NOT_FOUND),
            Self::Status { status, .. } => Some(*status),
            Self::Http(e) => e.status(),
            Self::InvalidHeader(_) | Self::InvalidLoginResponse(_) | Self::Decode(_) => None,
        }
    }
}

/// Prefer the `message` field of a JSON error body, else the raw body.
fn error_message(body: &str) -> String {
    serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|v| v.get("message").and_then(|m| m.as_str()).map(str::to_string))
        .unwrap_or_else(|| body.trim().to_string())
}

/// Reqwest client bound to a base URL, wrapped in middleware.
pub struct HttpClient {
    base_url: String,
    client: Client,
    request_middleware: Vec<Arc<dyn RequestMiddleware>>,
    response_middleware: Vec<Arc<dyn ResponseMiddleware>>,
}

impl std::fmt::Debug for HttpClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpClient")
            .field("base_url", &self.base_url)
            .field("request_middleware", &self.request_middleware.len())
            .field("response_middleware", &self.response_middleware.len())
            .finish()
    }
}

impl HttpClient {
    pub fn builder(base_url: impl Into<String>) -> HttpClientBuilder {
        HttpClientBuilder {
            base_url: base_url.into(),
            timeout: None,
            request_middleware: Vec::new(),
            response_middleware: Vec::new(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Start a request for `path` relative to the base URL.
    pub fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let url = format!("{}{}", self.base_url, path);
        self.client.request(method, url)
    }

    /// Run a request through the middleware pipeline.
    pub async fn send(&self, builder: RequestBuilder) -> Result<Response, ClientError> {
        let outcome = self.dispatch(builder).await;
        self.response_middleware
            .iter()
            .fold(outcome, |outcome, middleware| middleware.on_response(outcome))
    }

    /// Send and decode a JSON body.
    pub async fn send_json<T: DeserializeOwned>(
        &self,
        builder: RequestBuilder,
    ) -> Result<T, ClientError> {
        let response = self.send(builder).await?;
        Ok(response.json().await?)
    }

    /// Send, ignoring whatever body comes back (e.g. 204 No Content).
    pub async fn send_empty(&self, builder: RequestBuilder) -> Result<(), ClientError> {
        self.send(builder).await?;
        Ok(())
    }

    async fn dispatch(&self, builder: RequestBuilder) -> Result<Response, ClientError> {
        let mut request = builder.build()?;
        for middleware in &self.request_middleware {
            request = middleware.on_request(request)?;
        }

        tracing::debug!(method = %request.method(), url = %request.url(), "Sending request");
        let response = self.client.execute(request).await?;

        let status = response.status();
        if status.is_success() {
            Ok(response)
        } else {
            tracing::debug!(%status, "Request failed");
            Err(ClientError::from_response(response).await)
        }
    }
}

pub struct HttpClientBuilder {
    base_url: String,
    timeout: Option<Duration>,
    request_middleware: Vec<Arc<dyn RequestMiddleware>>,
    response_middleware: Vec<Arc<dyn ResponseMiddleware>>,
}

impl HttpClientBuilder {
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Append request middleware; it runs after those added before it.
    pub fn request_middleware(mut self, middleware: impl RequestMiddleware + 'static) -> Self {
        self.request_middleware.push(Arc::new(middleware));
        self
    }

    /// Append response middleware; it runs after those added before it.
    pub fn response_middleware(mut self, middleware: impl ResponseMiddleware + 'static) -> Self {
        self.response_middleware.push(Arc::new(middleware));
        self
    }

    /// Build the client. Cookies are always kept and sent back, so
    /// cookie-based credentials work alongside the bearer token.
    pub fn build(self) -> Result<HttpClient, ClientError> {
        let mut client = Client::builder().cookie_store(true);
        if let Some(timeout) = self.timeout {
            client = client.timeout(timeout);
        }

        Ok(HttpClient {
            base_url: self.base_url.trim_end_matches('/').to_string(),
            client: client.build()?,
            request_middleware: self.request_middleware,
            response_middleware: self.response_middleware,
        })
    }
}
