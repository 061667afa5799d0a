//! Core library for the racha shared-expense client.
//!
//! Two pieces carry the client's state:
//!
//! - [`auth::SessionStore`] owns the bearer token and its expiry, mirrors them
//!   to durable storage, and signs out on its own when the token expires.
//! - [`api::HttpAdapter`] builds every outbound request, reading the token
//!   from the same durable storage at call time.
//!
//! [`api::RachaClient`] layers the backend's REST operations on top, and
//! [`auth::route_for`] tells a front end which area the session allows.

pub mod api;
pub mod auth;
pub mod config;
pub mod models;
pub mod storage;
pub mod utils;

pub use api::{ApiError, HttpAdapter, RachaClient};
pub use auth::{ExpiryPolicy, Route, SessionError, SessionSnapshot, SessionStore};
pub use config::Config;
pub use storage::{KeyValueStore, SharedStore, StorageError};
