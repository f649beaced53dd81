//! Wire shapes exchanged with the event registration API.
//!
//! - [`EventResource`]: an event as listed by the API, including the flags the
//!   server derives for the requesting user.
//! - [`UserProfile`]: the logged-in user. Opaque to the client.
//! - [`LoginResponse`]: what a successful login returns.

mod event;
mod user;

pub use event::*;
pub use user::*;
