use sqlx::FromRow;
use time::OffsetDateTime;

/// Expense record in the database. `user_id` is fixed at creation.
#[derive(Debug, Clone, FromRow)]
pub struct Expense {
    pub id: i64,
    pub description: String,
    pub amount_cents: i64,
    pub category: String,
    pub expense_date: OffsetDateTime,
    pub user_id: i64,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}

/// Validated input for a new expense, amount already in cents.
#[derive(Debug, Clone)]
pub struct NewExpense {
    pub description: String,
    pub amount_cents: i64,
    pub category: String,
    pub expense_date: OffsetDateTime,
}
