//! Typed client for the event registration API.

use std::sync::Arc;

use reqwest::Method;
use serde::de::DeserializeOwned;
use serde_json::{json, Value};

use crate::http::{ClientError, HttpClient};
use crate::models::{EventResource, LoginResponse, UserProfile};
use crate::session::AuthSession;

/// Resources come back either bare or wrapped in `{ "data": ... }`.
///
/// Decoding errors name the offending field of the resource itself.
fn unwrap_data<T: DeserializeOwned>(body: Value) -> Result<T, ClientError> {
    let resource = match body {
        Value::Object(mut map) if map.contains_key("data") => {
            map.remove("data").unwrap_or_default()
        }
        other => other,
    };
    Ok(serde_json::from_value(resource)?)
}

/// API client bound to the shared session.
#[derive(Debug, Clone)]
pub struct EventClient {
    http: Arc<HttpClient>,
    session: Arc<AuthSession>,
}

impl EventClient {
    pub fn new(http: Arc<HttpClient>, session: Arc<AuthSession>) -> Self {
        Self { http, session }
    }

    pub fn session(&self) -> &Arc<AuthSession> {
        &self.session
    }

    /// The underlying pipeline, for endpoints without a typed wrapper.
    pub fn http(&self) -> &HttpClient {
        &self.http
    }

    // ============================================================
    // Session
    // ============================================================

    /// Log in and store the returned token and user.
    ///
    /// A response without a string `token` and an object `user` is rejected
    /// and leaves the session as it was.
    pub async fn login(&self, email: &str, password: &str) -> Result<UserProfile, ClientError> {
        let request = self
            .http
            .request(Method::POST, "/login")
            .json(&json!({ "email": email, "password": password }));

        let body: Value = self.http.send_json(request).await?;
        let response: LoginResponse = serde_json::from_value(body)
            .map_err(|e| ClientError::InvalidLoginResponse(e.to_string()))?;

        let user = response.user.clone();
        self.session.login(response);
        Ok(user)
    }

    /// Forget the local session. There is no server-side revocation.
    pub fn logout(&self) {
        self.session.logout();
    }

    // ============================================================
    // Events
    // ============================================================

    pub async fn list_events(&self) -> Result<Vec<EventResource>, ClientError> {
        let request = self.http.request(Method::GET, "/events");
        unwrap_data(self.http.send_json(request).await?)
    }

    pub async fn get_event(&self, id: u64) -> Result<EventResource, ClientError> {
        let request = self.http.request(Method::GET, &format!("/events/{id}"));
        unwrap_data(self.http.send_json(request).await?)
    }

    /// Register as a participant.
    pub async fn join_event(&self, id: u64) -> Result<(), ClientError> {
        let request = self
            .http
            .request(Method::POST, &format!("/events/{id}/participants"));
        self.http.send_empty(request).await
    }

    /// Give up a participant seat.
    pub async fn leave_event(&self, id: u64) -> Result<(), ClientError> {
        let request = self
            .http
            .request(Method::DELETE, &format!("/events/{id}/participants"));
        self.http.send_empty(request).await
    }

    pub async fn join_waitlist(&self, id: u64) -> Result<(), ClientError> {
        let request = self
            .http
            .request(Method::POST, &format!("/events/{id}/waitlist"));
        self.http.send_empty(request).await
    }

    pub async fn leave_waitlist(&self, id: u64) -> Result<(), ClientError> {
        let request = self
            .http
            .request(Method::DELETE, &format!("/events/{id}/waitlist"));
        self.http.send_empty(request).await
    }
}
