use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

use super::repo_types::Expense;

#[derive(Debug, Default, Deserialize)]
pub struct ProcessSpendingRequest {
    #[serde(default)]
    pub sentence: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ProcessSpendingResponse {
    pub amount: f64,
    pub tag: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionItem {
    pub id: Uuid,
    pub user_id: Uuid,
    pub amount: f64,
    pub category: String,
    pub sentence: String,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

impl From<Expense> for TransactionItem {
    fn from(e: Expense) -> Self {
        Self {
            id: e.id,
            user_id: e.user_id,
            amount: e.amount,
            category: e.category,
            sentence: e.sentence,
            created_at: e.created_at,
            updated_at: e.updated_at,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct AnalyticsQuery {
    /// `YYYY-MM`; narrows the monthly series only.
    pub month: Option<String>,
}
