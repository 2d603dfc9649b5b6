use anyhow::Context;
use sqlx::PgPool;
use uuid::Uuid;

use super::repo_types::Expense;

pub async fn insert(
    db: &PgPool,
    user_id: Uuid,
    amount: f64,
    category: &str,
    sentence: &str,
) -> anyhow::Result<Expense> {
    let row = sqlx::query_as::<_, Expense>(
        r#"
        INSERT INTO expenses (user_id, amount, category, sentence)
        VALUES ($1, $2, $3, $4)
        RETURNING id, user_id, amount, category, sentence, created_at, updated_at
        "#,
    )
    .bind(user_id)
    .bind(amount)
    .bind(category)
    .bind(sentence)
    .fetch_one(db)
    .await
    .context("insert expense")?;
    Ok(row)
}

/// Every expense owned by `user_id`, oldest first.
pub async fn list_by_user(db: &PgPool, user_id: Uuid) -> anyhow::Result<Vec<Expense>> {
    let rows = sqlx::query_as::<_, Expense>(
        r#"
        SELECT id, user_id, amount, category, sentence, created_at, updated_at
          FROM expenses
         WHERE user_id = $1
         ORDER BY created_at ASC, id ASC
        "#,
    )
    .bind(user_id)
    .fetch_all(db)
    .await
    .context("list expenses by user")?;
    Ok(rows)
}
