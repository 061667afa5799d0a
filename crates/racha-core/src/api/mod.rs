//! REST API access for the racha backend.
//!
//! - `HttpAdapter`: builds requests against the configured origin, attaching
//!   the stored bearer token and content headers on every call
//! - `RachaClient`: one typed method per backend operation
//! - `safe_error_message`: extracts the backend's `message`/`error` field
//!
//! The backend authenticates `/api/...` calls with `Authorization: Bearer`.
//! `/auth/...` endpoints are called anonymously.

pub mod adapter;
pub mod client;
pub mod error;
pub mod forms;

pub use adapter::{Body, HttpAdapter, RequestOptions};
pub use client::RachaClient;
pub use error::{safe_error_message, ApiError};
pub use forms::{Attachment, ExpenseForm, GroupForm, ProfileUpdate, SettlementForm};
