//! Client for the event registration service.
//!
//! [`app::App`] wires the pieces together: the persisted [`session`], the
//! guarded [`routing::Router`], and an [`http::HttpClient`] whose middleware
//! attaches the bearer token and drops the session when the server answers
//! 401. [`client::EventClient`] is the typed API on top.

pub mod app;
pub mod client;
pub mod config;
pub mod http;

pub use rsvp_core::{models, notify, routing, session, store};
