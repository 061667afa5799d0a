//! Authentication module for managing the user session.
//!
//! This module provides:
//! - `SessionStore`: the in-memory session, mirrored to durable storage,
//!   with automatic expiry
//! - `decode_expiry`: reads the `exp` claim from an issued JWT
//! - `Route` / `route_for`: what area of the app the session allows
//!
//! The in-memory session is a cache of storage: every write goes to storage
//! before memory, so the request adapter (which reads storage) never sends a
//! token the session has already dropped.

pub mod gate;
pub mod session;
pub mod token;

pub use gate::{landing_group, route_for, wait_for_route, Route};
pub use session::{ExpiryPolicy, SessionError, SessionKeys, SessionSnapshot, SessionStore};
pub use token::{decode_expiry, TokenError};
