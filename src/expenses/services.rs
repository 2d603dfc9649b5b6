use lazy_static::lazy_static;
use regex::Regex;
use sqlx::PgPool;
use tracing::{info, warn};
use uuid::Uuid;

use super::repo;
use crate::{error::ApiError, llm::LlmClient};

pub const PREDEFINED_TAGS: [&str; 10] = [
    "entertainment",
    "food",
    "groceries",
    "travel",
    "shopping",
    "rent",
    "utilities",
    "coffee",
    "books",
    "electronics",
];

/// Amount and category pulled out of a model reply.
#[derive(Debug, Clone, PartialEq)]
pub struct Extraction {
    pub amount: f64,
    pub category: String,
}

pub fn build_prompt(sentence: &str) -> String {
    format!(
        r#"Extract the amount and category (tag) from the following sentence: "{sentence}".
The possible tags for the categories are:
{tags}.
Make sure the amount is a numerical value (integer or decimal).
Return the response in the following JSON format:
{{
  "amount": <amount>,
  "category": "<category>"
}}"#,
        tags = PREDEFINED_TAGS.join(", ")
    )
}

/// Both fields must match; the reply is otherwise free-form text.
pub fn extract(reply: &str) -> Option<Extraction> {
    lazy_static! {
        static ref AMOUNT_RE: Regex = Regex::new(r#""amount":\s*(\d+(\.\d+)?)"#).unwrap();
        static ref CATEGORY_RE: Regex = Regex::new(r#""category":\s*"([^"]+)""#).unwrap();
    }
    let amount = AMOUNT_RE
        .captures(reply)?
        .get(1)?
        .as_str()
        .parse::<f64>()
        .ok()
        .filter(|a| a.is_finite())?;
    let category = CATEGORY_RE.captures(reply)?.get(1)?.as_str().trim();
    if category.is_empty() {
        return None;
    }
    Some(Extraction {
        amount,
        category: category.to_string(),
    })
}

/// Lowercased sentence as sent, or `None` when nothing but whitespace was sent.
pub fn normalize_sentence(raw: Option<&str>) -> Option<String> {
    let raw = raw.unwrap_or_default();
    (!raw.trim().is_empty()).then(|| raw.to_lowercase())
}

pub async fn process_spending(
    llm: &dyn LlmClient,
    db: &PgPool,
    user_id: Uuid,
    sentence: &str,
) -> Result<Extraction, ApiError> {
    let reply = llm
        .generate(&build_prompt(sentence))
        .await
        .map_err(ApiError::Processing)?;

    let Some(extraction) = extract(&reply) else {
        warn!(%user_id, "model reply missing amount or category");
        return Err(ApiError::ExtractionFailed);
    };

    let expense = repo::insert(db, user_id, extraction.amount, &extraction.category, sentence)
        .await
        .map_err(ApiError::Processing)?;

    info!(%user_id, expense_id = %expense.id, category = %expense.category, "expense recorded");
    Ok(extraction)
}
