use async_trait::async_trait;
use sqlx::PgPool;

use crate::expenses::repo_types::{Expense, NewExpense};

#[async_trait]
pub trait ExpenseStore: Send + Sync {
    async fn create(&self, owner_id: i64, expense: &NewExpense) -> anyhow::Result<Expense>;

    /// Only the owner's records, ordered by id ascending.
    async fn list_by_owner(&self, owner_id: i64) -> anyhow::Result<Vec<Expense>>;
}

#[derive(Clone)]
pub struct PgExpenseStore {
    db: PgPool,
}

impl PgExpenseStore {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl ExpenseStore for PgExpenseStore {
    async fn create(&self, owner_id: i64, expense: &NewExpense) -> anyhow::Result<Expense> {
        let row = sqlx::query_as::<_, Expense>(
            r#"
            INSERT INTO expenses (description, amount_cents, category, expense_date, user_id)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, description, amount_cents, category, expense_date, user_id,
                      created_at, updated_at
            "#,
        )
        .bind(&expense.description)
        .bind(expense.amount_cents)
        .bind(&expense.category)
        .bind(expense.expense_date)
        .bind(owner_id)
        .fetch_one(&self.db)
        .await?;
        Ok(row)
    }

    async fn list_by_owner(&self, owner_id: i64) -> anyhow::Result<Vec<Expense>> {
        let rows = sqlx::query_as::<_, Expense>(
            r#"
            SELECT id, description, amount_cents, category, expense_date, user_id,
                   created_at, updated_at
            FROM expenses
            WHERE user_id = $1
            ORDER BY id ASC
            "#,
        )
        .bind(owner_id)
        .fetch_all(&self.db)
        .await?;
        Ok(rows)
    }
}
