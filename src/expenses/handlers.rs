use axum::{
    extract::{rejection::JsonRejection, Query, State},
    routing::{get, post},
    Json, Router,
};
use tracing::{error, instrument, warn};

use super::{
    analytics::{self, Analytics},
    dto::{AnalyticsQuery, ProcessSpendingRequest, ProcessSpendingResponse, TransactionItem},
    repo,
    repo_types::Expense,
    services,
};
use crate::{auth::extractors::AuthUser, error::ApiError, state::AppState};
use uuid::Uuid;

pub fn expense_routes() -> Router<AppState> {
    Router::new()
        .route("/expense/process_spending", post(process_spending))
        .route("/expense/transactions", get(list_transactions))
        .route("/expense/analytics", get(get_analytics))
}

#[instrument(skip(state, payload))]
pub async fn process_spending(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    payload: Result<Json<ProcessSpendingRequest>, JsonRejection>,
) -> Result<Json<ProcessSpendingResponse>, ApiError> {
    // Without a JSON content type the body is treated as empty.
    let payload = match payload {
        Ok(Json(p)) => p,
        Err(JsonRejection::MissingJsonContentType(_)) => ProcessSpendingRequest::default(),
        Err(e) => return Err(ApiError::BadRequest(e.body_text())),
    };

    let Some(sentence) = services::normalize_sentence(payload.sentence.as_deref()) else {
        warn!(%user_id, "empty sentence");
        return Err(ApiError::NoSentence);
    };

    let extraction =
        services::process_spending(state.llm.as_ref(), &state.db, user_id, &sentence).await?;

    Ok(Json(ProcessSpendingResponse {
        amount: extraction.amount,
        tag: extraction.category,
    }))
}

#[instrument(skip(state))]
pub async fn list_transactions(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> Result<Json<Vec<TransactionItem>>, ApiError> {
    let rows = load_expenses(&state, user_id).await?;
    Ok(Json(rows.into_iter().map(TransactionItem::from).collect()))
}

#[instrument(skip(state))]
pub async fn get_analytics(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Query(q): Query<AnalyticsQuery>,
) -> Result<Json<Analytics>, ApiError> {
    let month = q.month.as_deref().map(str::trim).filter(|m| !m.is_empty());
    if let Some(m) = month {
        if !analytics::is_valid_month(m) {
            return Err(ApiError::InvalidMonth);
        }
    }

    let rows = load_expenses(&state, user_id).await?;
    Ok(Json(analytics::summarize(&rows, month)))
}

async fn load_expenses(state: &AppState, user_id: Uuid) -> Result<Vec<Expense>, ApiError> {
    repo::list_by_user(&state.db, user_id).await.map_err(|e| {
        error!(error = %e, %user_id, "error retrieving transactions");
        ApiError::RetrievalFailed
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::datetime;

    #[test]
    fn transaction_item_shape() {
        let at = datetime!(2024-05-01 10:00 UTC);
        let item = TransactionItem::from(Expense {
            id: Uuid::nil(),
            user_id: Uuid::nil(),
            amount: 120.0,
            category: "food".into(),
            sentence: "spent 120 on a biryani".into(),
            created_at: at,
            updated_at: at,
        });
        let json = serde_json::to_value(&item).unwrap();
        assert_eq!(json["userId"], Uuid::nil().to_string());
        assert_eq!(json["amount"], 120.0);
        assert_eq!(json["createdAt"], "2024-05-01T10:00:00Z");
        assert_eq!(json["updatedAt"], "2024-05-01T10:00:00Z");
    }

    #[test]
    fn process_response_uses_tag() {
        let json = serde_json::to_value(ProcessSpendingResponse {
            amount: 45.5,
            tag: "coffee".into(),
        })
        .unwrap();
        assert_eq!(json, serde_json::json!({ "amount": 45.5, "tag": "coffee" }));
    }
}
