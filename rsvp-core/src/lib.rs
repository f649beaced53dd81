//! Core library for the rsvp event registration client.
//!
//! # Core Concepts
//!
//! - [`store::PersistedStore`]: a piece of state mirrored to durable storage on
//!   every mutation and rehydrated when the store is opened.
//! - [`session::AuthSession`]: the bearer token and user profile of whoever is
//!   logged in, persisted under the `auth` store identifier.
//! - [`routing::Router`]: the two application routes and the guard that keeps
//!   unauthenticated users out of protected ones.
//! - [`notify::Notifier`]: fire-and-forget success/error messages.
//! - [`models`]: wire shapes returned by the event registration API.

pub mod models;
pub mod notify;
pub mod routing;
pub mod session;
pub mod store;
