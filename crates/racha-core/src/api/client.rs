//! Typed calls against the racha backend.
//!
//! Each method issues one request through the [`HttpAdapter`], turns a non-2xx
//! status into an [`ApiError`] carrying the backend's message (or a fixed
//! Portuguese fallback the app shows to the user), and decodes the body.

use reqwest::{Method, Response};
use serde::de::DeserializeOwned;
use tracing::{info, warn};

use super::adapter::{Body, HttpAdapter, RequestOptions};
use super::error::safe_error_message;
use super::forms::{ExpenseForm, GroupForm, ProfileUpdate, SettlementForm};
use super::ApiError;
use crate::auth::SessionStore;
use crate::models::{
    AuthResponse, ExpenseDebtsResponse, ExpenseResponse, ExpenseSummaryResponse, Group,
    GroupMember, JoinGroupResponse, LoginPayload, MessageResponse,
    ProvisionalResetPasswordRequest, ReceivableResponse, RegisterPayload,
    ResetPasswordConfirmRequest, ResetPasswordRequest, TransactionDetailResponse,
    TransactionResponse, UpdateExpenseSplitRequest, User, ValidateResetCodeRequest,
};

/// API client for the racha backend.
/// Clone is cheap - the adapter shares its connection pool.
#[derive(Clone)]
pub struct RachaClient {
    http: HttpAdapter,
}

impl RachaClient {
    pub fn new(http: HttpAdapter) -> Self {
        Self { http }
    }

    pub fn http(&self) -> &HttpAdapter {
        &self.http
    }

    /// Pass 2xx responses through; otherwise build the user-facing error.
    async fn check_response(response: Response, fallback: &str) -> Result<Response, ApiError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let url = response.url().clone();
        let message = safe_error_message(response)
            .await
            .unwrap_or_else(|| fallback.to_string());
        warn!(%status, url = %url, message = %message, "Request rejected");
        Err(ApiError::from_status(status, message))
    }

    async fn decode<T: DeserializeOwned>(response: Response) -> Result<T, ApiError> {
        let url = response.url().clone();
        response
            .json()
            .await
            .map_err(|e| ApiError::Decode(format!("{}: {}", url, e)))
    }

    async fn call(
        &self,
        method: Method,
        path: &str,
        body: Option<Body>,
        options: RequestOptions,
        fallback: &str,
    ) -> Result<Response, ApiError> {
        let response = self.http.request(method, path, body, options).await?;
        Self::check_response(response, fallback).await
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str, fallback: &str) -> Result<T, ApiError> {
        let response = self
            .call(Method::GET, path, None, RequestOptions::default(), fallback)
            .await?;
        Self::decode(response).await
    }

    async fn send_json<T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        body: Body,
        options: RequestOptions,
        fallback: &str,
    ) -> Result<T, ApiError> {
        let response = self.call(method, path, Some(body), options, fallback).await?;
        Self::decode(response).await
    }

    // ===== Auth =====

    pub async fn login(&self, payload: &LoginPayload) -> Result<AuthResponse, ApiError> {
        self.send_json(
            Method::POST,
            "/auth/login",
            Body::json(payload)?,
            RequestOptions::anonymous(),
            "Não foi possível fazer login.",
        )
        .await
    }

    pub async fn register(&self, payload: &RegisterPayload) -> Result<AuthResponse, ApiError> {
        self.send_json(
            Method::POST,
            "/auth/register",
            Body::json(payload)?,
            RequestOptions::anonymous(),
            "Não foi possível criar conta.",
        )
        .await
    }

    /// Log in and start the session with the issued token.
    pub async fn login_and_sign_in(
        &self,
        session: &SessionStore,
        payload: &LoginPayload,
    ) -> Result<(), ApiError> {
        let auth = self.login(payload).await?;
        session.sign_in(&auth.access_token).await?;
        info!("Login successful");
        Ok(())
    }

    /// Register and start the session with the issued token.
    pub async fn register_and_sign_in(
        &self,
        session: &SessionStore,
        payload: &RegisterPayload,
    ) -> Result<(), ApiError> {
        let auth = self.register(payload).await?;
        session.sign_in(&auth.access_token).await?;
        info!("Registration successful");
        Ok(())
    }

    pub async fn request_password_reset(
        &self,
        payload: &ResetPasswordRequest,
    ) -> Result<MessageResponse, ApiError> {
        self.send_json(
            Method::POST,
            "/auth/reset-password/request",
            Body::json(payload)?,
            RequestOptions::default(),
            "Não foi possível solicitar o reset de senha.",
        )
        .await
    }

    pub async fn validate_reset_code(
        &self,
        payload: &ValidateResetCodeRequest,
    ) -> Result<MessageResponse, ApiError> {
        self.send_json(
            Method::POST,
            "/auth/reset-password/validate",
            Body::json(payload)?,
            RequestOptions::default(),
            "Código de reset inválido.",
        )
        .await
    }

    pub async fn confirm_password_reset(
        &self,
        payload: &ResetPasswordConfirmRequest,
    ) -> Result<MessageResponse, ApiError> {
        self.send_json(
            Method::POST,
            "/auth/reset-password/confirm",
            Body::json(payload)?,
            RequestOptions::default(),
            "Não foi possível redefinir a senha.",
        )
        .await
    }

    pub async fn provisional_reset_password(
        &self,
        payload: &ProvisionalResetPasswordRequest,
    ) -> Result<MessageResponse, ApiError> {
        self.send_json(
            Method::POST,
            "/auth/reset-password/provisor",
            Body::json(payload)?,
            RequestOptions::default(),
            "Não foi possível realizar o reset provisório.",
        )
        .await
    }

    /// Backend liveness; returns the plain-text body.
    pub async fn health_check(&self) -> Result<String, ApiError> {
        let response = self
            .call(
                Method::GET,
                "/check",
                None,
                RequestOptions::default(),
                "Falha ao se comunicar com o servidor!",
            )
            .await?;
        Ok(response.text().await?)
    }

    // ===== User =====

    pub async fn get_user(&self) -> Result<User, ApiError> {
        self.get_json("/api/user", "Não foi possível buscar o usuário.")
            .await
    }

    pub async fn update_user(&self, update: ProfileUpdate) -> Result<User, ApiError> {
        self.send_json(
            Method::PUT,
            "/api/user",
            Body::Multipart(update.into_form()?),
            RequestOptions::default(),
            "Não foi possível atualizar o usuário.",
        )
        .await
    }

    // ===== Groups =====

    pub async fn get_groups(&self) -> Result<Vec<Group>, ApiError> {
        self.get_json("/api/groups", "Não foi possível buscar os grupos.")
            .await
    }

    pub async fn create_group(&self, group: GroupForm) -> Result<Group, ApiError> {
        self.send_json(
            Method::POST,
            "/api/groups",
            Body::Multipart(group.into_form()?),
            RequestOptions::default(),
            "Não foi possível criar o grupo.",
        )
        .await
    }

    pub async fn edit_group(&self, group_id: &str, group: GroupForm) -> Result<Group, ApiError> {
        self.send_json(
            Method::PUT,
            &format!("/api/groups/{}", group_id),
            Body::Multipart(group.into_form()?),
            RequestOptions::default(),
            "Não foi possível editar o grupo.",
        )
        .await
    }

    pub async fn leave_or_delete_group(&self, group_id: &str) -> Result<(), ApiError> {
        self.call(
            Method::DELETE,
            &format!("/api/groups/{}", group_id),
            None,
            RequestOptions::default(),
            "Não foi possível sair ou deletar o grupo.",
        )
        .await?;
        Ok(())
    }

    /// Leave a group and drop it as the remembered group if it was.
    pub async fn leave_and_forget(&self, session: &SessionStore, group_id: &str) -> Result<(), ApiError> {
        self.leave_or_delete_group(group_id).await?;
        match session.last_group().await {
            Ok(Some(last)) if last == group_id => {
                if let Err(e) = session.forget_group().await {
                    warn!(error = %e, "Failed to forget last group");
                }
            }
            Ok(_) => {}
            Err(e) => warn!(error = %e, "Failed to read last group"),
        }
        Ok(())
    }

    pub async fn generate_invite(&self, group_id: &str) -> Result<MessageResponse, ApiError> {
        self.send_json(
            Method::POST,
            &format!("/api/groups/{}/invite", group_id),
            Body::empty(),
            RequestOptions::default(),
            "Não foi possível gerar o convite.",
        )
        .await
    }

    pub async fn get_invite(&self, group_id: &str) -> Result<MessageResponse, ApiError> {
        self.get_json(
            &format!("/api/groups/{}/invite", group_id),
            "Não foi possível buscar o convite.",
        )
        .await
    }

    pub async fn join_group(&self, code: &str) -> Result<JoinGroupResponse, ApiError> {
        self.send_json(
            Method::POST,
            &format!("/api/groups/join/{}", code.trim()),
            Body::empty(),
            RequestOptions::default(),
            "Não foi possível entrar no grupo.",
        )
        .await
    }

    /// Join a group and remember it as the one to open next.
    pub async fn join_and_remember(
        &self,
        session: &SessionStore,
        code: &str,
    ) -> Result<JoinGroupResponse, ApiError> {
        let joined = self.join_group(code).await?;
        if let Err(e) = session.remember_group(&joined.group_id).await {
            warn!(error = %e, "Failed to remember joined group");
        }
        Ok(joined)
    }

    pub async fn get_group_members(&self, group_id: &str) -> Result<Vec<GroupMember>, ApiError> {
        self.get_json(
            &format!("/api/groups/{}/members", group_id),
            "Não foi possível buscar os membros do grupo.",
        )
        .await
    }

    // ===== Expenses =====

    pub async fn create_expense(
        &self,
        group_id: &str,
        expense: ExpenseForm,
    ) -> Result<ExpenseResponse, ApiError> {
        self.send_json(
            Method::POST,
            &format!("/api/expense/{}", group_id),
            Body::Multipart(expense.into_form()?),
            RequestOptions::default(),
            "Não foi possível criar a despesa.",
        )
        .await
    }

    pub async fn get_expense_debts(&self, group_id: &str) -> Result<ExpenseDebtsResponse, ApiError> {
        self.get_json(
            &format!("/api/expense/{}/debts", group_id),
            "Não foi possível buscar as dívidas.",
        )
        .await
    }

    pub async fn get_expense_receivables(
        &self,
        group_id: &str,
    ) -> Result<Vec<ReceivableResponse>, ApiError> {
        self.get_json(
            &format!("/api/expense/{}/receivables", group_id),
            "Não foi possível buscar os valores a receber.",
        )
        .await
    }

    pub async fn get_expense_summary(
        &self,
        group_id: &str,
    ) -> Result<ExpenseSummaryResponse, ApiError> {
        self.get_json(
            &format!("/api/expense/{}/summary", group_id),
            "Não foi possível buscar o resumo das despesas.",
        )
        .await
    }

    pub async fn settle_expense_splits(&self, settlement: SettlementForm) -> Result<(), ApiError> {
        self.call(
            Method::POST,
            "/api/expense/settle",
            Some(Body::Multipart(settlement.into_form()?)),
            RequestOptions::default(),
            "Não foi possível realizar o pagamento.",
        )
        .await?;
        Ok(())
    }

    pub async fn update_expense_split(
        &self,
        expense_split_id: &str,
        payload: &UpdateExpenseSplitRequest,
    ) -> Result<(), ApiError> {
        self.call(
            Method::PUT,
            &format!("/api/expense/split/{}", expense_split_id),
            Some(Body::json(payload)?),
            RequestOptions::default(),
            "Não foi possível atualizar o status do pagamento.",
        )
        .await?;
        Ok(())
    }

    // ===== Transactions =====

    pub async fn get_transactions(&self, group_id: &str) -> Result<Vec<TransactionResponse>, ApiError> {
        self.get_json(
            &format!("/api/transaction/{}", group_id),
            "Não foi possível buscar as transações.",
        )
        .await
    }

    pub async fn get_transaction_detail(
        &self,
        transaction_id: &str,
    ) -> Result<TransactionDetailResponse, ApiError> {
        self.get_json(
            &format!("/api/transaction/detail/{}", transaction_id),
            "Não foi possível buscar os detalhes da transação.",
        )
        .await
    }
}
