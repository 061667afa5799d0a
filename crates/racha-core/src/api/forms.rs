//! Multipart payloads for endpoints that accept file uploads.
//!
//! Each form is a plain struct that converts into a `reqwest::multipart::Form`.
//! List fields are sent as repeated parts under the same name.

use std::path::Path;

use reqwest::multipart::{Form, Part};

use super::ApiError;
use crate::models::ExpenseCategory;

/// A file sent as one multipart part.
#[derive(Debug, Clone)]
pub struct Attachment {
    pub file_name: String,
    pub mime: String,
    pub bytes: Vec<u8>,
}

impl Attachment {
    pub fn new(file_name: impl Into<String>, mime: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            file_name: file_name.into(),
            mime: mime.into(),
            bytes,
        }
    }

    /// Read a file, guessing its type from the extension
    pub async fn from_path(path: &Path) -> std::io::Result<Self> {
        let bytes = tokio::fs::read(path).await?;
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "upload".to_string());
        let mime = mime_for(&file_name);
        Ok(Self::new(file_name, mime, bytes))
    }

    fn into_part(self) -> Result<Part, ApiError> {
        Ok(Part::bytes(self.bytes)
            .file_name(self.file_name)
            .mime_str(&self.mime)?)
    }
}

/// Content type for a file name. Images default to JPEG like camera uploads.
pub fn mime_for(file_name: &str) -> String {
    let ext = file_name
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_ascii_lowercase())
        .unwrap_or_default();
    match ext.as_str() {
        "jpg" | "jpeg" => "image/jpeg".to_string(),
        "png" | "gif" | "webp" | "heic" => format!("image/{}", ext),
        "pdf" => "application/pdf".to_string(),
        _ => "image/jpeg".to_string(),
    }
}

fn attach(form: Form, name: &'static str, file: Option<Attachment>) -> Result<Form, ApiError> {
    match file {
        Some(file) => Ok(form.part(name, file.into_part()?)),
        None => Ok(form),
    }
}

/// Profile edit (`PUT /api/user`)
#[derive(Debug, Clone, Default)]
pub struct ProfileUpdate {
    pub name: Option<String>,
    pub email: Option<String>,
    pub pix_key: Option<String>,
    pub thumbnail: Option<Attachment>,
}

impl ProfileUpdate {
    pub fn into_form(self) -> Result<Form, ApiError> {
        let mut form = Form::new();
        if let Some(name) = self.name {
            form = form.text("name", name);
        }
        if let Some(email) = self.email {
            form = form.text("email", email);
        }
        if let Some(pix_key) = self.pix_key {
            form = form.text("pixKey", pix_key);
        }
        attach(form, "thumbnail", self.thumbnail)
    }
}

/// Group create and edit (`POST /api/groups`, `PUT /api/groups/{id}`)
#[derive(Debug, Clone, Default)]
pub struct GroupForm {
    pub name: String,
    pub description: Option<String>,
    pub thumbnail: Option<Attachment>,
}

impl GroupForm {
    pub fn into_form(self) -> Result<Form, ApiError> {
        let mut form = Form::new().text("name", self.name);
        if let Some(description) = self.description.filter(|d| !d.is_empty()) {
            form = form.text("description", description);
        }
        attach(form, "thumbnail", self.thumbnail)
    }
}

/// New expense (`POST /api/expense/{groupId}`).
/// An empty `divide_to` splits among every member.
#[derive(Debug, Clone)]
pub struct ExpenseForm {
    pub title: String,
    pub amount: f64,
    pub category: ExpenseCategory,
    pub divide_to: Vec<String>,
    pub invoice: Option<Attachment>,
}

impl ExpenseForm {
    pub fn into_form(self) -> Result<Form, ApiError> {
        let mut form = Form::new()
            .text("title", self.title)
            .text("amount", self.amount.to_string())
            .text("category", self.category.as_str());
        for member_id in self.divide_to {
            form = form.text("divideTo", member_id);
        }
        attach(form, "invoice", self.invoice)
    }
}

/// Settle splits with optional proof of payment (`POST /api/expense/settle`)
#[derive(Debug, Clone, Default)]
pub struct SettlementForm {
    pub expense_split_ids: Vec<String>,
    pub evidence: Option<Attachment>,
}

impl SettlementForm {
    pub fn into_form(self) -> Result<Form, ApiError> {
        let mut form = Form::new();
        for split_id in self.expense_split_ids {
            form = form.text("expenseSplitIds", split_id);
        }
        attach(form, "evidence", self.evidence)
    }
}

/// Parse a user-typed amount, accepting a decimal comma ("12,50").
pub fn parse_amount(input: &str) -> Option<f64> {
    let amount: f64 = input.trim().replacen(',', ".", 1).parse().ok()?;
    (amount.is_finite() && amount > 0.0).then_some(amount)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mime_for() {
        assert_eq!(mime_for("photo.JPG"), "image/jpeg");
        assert_eq!(mime_for("shot.png"), "image/png");
        assert_eq!(mime_for("nota.pdf"), "application/pdf");
        assert_eq!(mime_for("noext"), "image/jpeg");
    }

    #[test]
    fn test_parse_amount() {
        assert_eq!(parse_amount("12,50"), Some(12.5));
        assert_eq!(parse_amount(" 3.25 "), Some(3.25));
        assert_eq!(parse_amount("0"), None);
        assert_eq!(parse_amount("-1"), None);
        assert_eq!(parse_amount("abc"), None);
    }

    #[test]
    fn test_forms_build_with_attachments() {
        let expense = ExpenseForm {
            title: "Mercado".to_string(),
            amount: 99.9,
            category: ExpenseCategory::Food,
            divide_to: vec!["u1".to_string(), "u2".to_string()],
            invoice: Some(Attachment::new("nota.png", "image/png", vec![1, 2, 3])),
        };
        assert!(!expense.into_form().unwrap().boundary().is_empty());

        let bad = SettlementForm {
            expense_split_ids: vec!["s1".to_string()],
            evidence: Some(Attachment::new("x", "not a mime type", vec![])),
        };
        assert!(bad.into_form().is_err());
    }
}
