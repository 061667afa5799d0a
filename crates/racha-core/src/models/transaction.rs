use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TransactionType {
    Expense,
    Payment,
    Receive,
    Transfer,
    Member,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionResponse {
    pub id: String,
    pub group_id: String,
    pub user_id: String,
    #[serde(rename = "type")]
    pub kind: TransactionType,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub expense_id: Option<String>,
    pub name: String,
    pub amount: f64,
    pub created_at: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExpenseSplitDetail {
    pub user_id: String,
    pub user_name: String,
    pub amount: f64,
    pub paid: bool,
    #[serde(default)]
    pub paid_at: Option<String>,
    #[serde(default)]
    pub evidence: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionDetailResponse {
    pub id: String,
    pub group_id: String,
    pub group_name: String,
    pub user_id: String,
    pub user_name: String,
    #[serde(rename = "type")]
    pub kind: TransactionType,
    #[serde(default)]
    pub category: Option<String>,
    pub name: String,
    pub amount: f64,
    pub created_at: String,
    #[serde(default)]
    pub expense_id: Option<String>,
    #[serde(default)]
    pub expense_title: Option<String>,
    #[serde(default)]
    pub expense_invoice: Option<String>,
    #[serde(default)]
    pub splits: Vec<ExpenseSplitDetail>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_transaction_detail_without_splits() {
        let json = r#"{"id":"t1","groupId":"g1","groupName":"Viagem","userId":"u1","userName":"Ana","type":"PAYMENT","name":"Pix","amount":10,"createdAt":"2025-03-01T12:00:00Z"}"#;
        let detail: TransactionDetailResponse = serde_json::from_str(json).unwrap();
        assert_eq!(detail.kind, TransactionType::Payment);
        assert!(detail.splits.is_empty());
        assert!(detail.category.is_none());
        assert_eq!(detail.amount, 10.0);
    }
}
