//! Data models for the racha backend.
//!
//! This module contains the request and response bodies of the REST API:
//!
//! - Auth payloads: `LoginPayload`, `RegisterPayload`, `AuthResponse`, password reset
//! - `User`, `Group`, `GroupMember`
//! - Expense types: `ExpenseResponse`, `Debt`, `ReceivableResponse`, `ExpenseSummaryResponse`
//! - Transaction history: `TransactionResponse`, `TransactionDetailResponse`
//!
//! Wire names are camelCase; amounts are plain decimal numbers as the server
//! sends them. Splits and balances are computed server-side.

pub mod auth;
pub mod expense;
pub mod group;
pub mod transaction;
pub mod user;

pub use auth::{
    AuthResponse, LoginPayload, MessageResponse, ProvisionalResetPasswordRequest, RegisterPayload,
    ResetPasswordConfirmRequest, ResetPasswordRequest, ValidateResetCodeRequest,
};
pub use expense::{
    Debt, ExpenseCategory, ExpenseDebtsResponse, ExpenseResponse, ExpenseSummaryResponse,
    ReceivableResponse, UpdateExpenseSplitRequest,
};
pub use group::{Group, GroupMember, JoinGroupResponse};
pub use transaction::{
    ExpenseSplitDetail, TransactionDetailResponse, TransactionResponse, TransactionType,
};
pub use user::User;
