use std::fmt;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ExpenseCategory {
    Food,
    Fuel,
    Drinks,
    Rent,
    Entertainment,
    Others,
}

impl ExpenseCategory {
    /// Wire name, as sent in multipart form fields
    pub fn as_str(&self) -> &'static str {
        match self {
            ExpenseCategory::Food => "FOOD",
            ExpenseCategory::Fuel => "FUEL",
            ExpenseCategory::Drinks => "DRINKS",
            ExpenseCategory::Rent => "RENT",
            ExpenseCategory::Entertainment => "ENTERTAINMENT",
            ExpenseCategory::Others => "OTHERS",
        }
    }
}

impl fmt::Display for ExpenseCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExpenseResponse {
    pub id: String,
    pub group_id: String,
    pub created_by_id: String,
    pub title: String,
    pub amount: f64,
    pub created_at: String,
}

/// What the current user owes one member, across unpaid splits.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Debt {
    pub expense_split_ids: Vec<String>,
    pub user_id: String,
    pub user_name: String,
    #[serde(default)]
    pub user_pix: Option<String>,
    #[serde(default)]
    pub user_thumbnail: Option<String>,
    pub total_amount: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExpenseDebtsResponse {
    pub debts: Vec<Debt>,
}

/// What one member owes the current user.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReceivableResponse {
    pub payer_id: String,
    pub payer_name: String,
    #[serde(default)]
    pub payer_thumbnail_url: Option<String>,
    pub amount: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExpenseSummaryResponse {
    pub total_spent: f64,
    pub total_to_receive: f64,
    pub total_to_pay: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct UpdateExpenseSplitRequest {
    pub paid: bool,
}
