use serde::{de, Deserialize, Deserializer, Serialize};
use time::{
    format_description::well_known::Rfc3339, macros::format_description, Date, OffsetDateTime,
    PrimitiveDateTime,
};

use crate::{
    error::AppError,
    expenses::{
        money::{from_cents, to_cents},
        repo_types::{Expense, NewExpense},
    },
};

/// Request body for creating an expense. `amount` is in currency units.
#[derive(Debug, Deserialize)]
pub struct CreateExpenseRequest {
    pub description: String,
    pub amount: f64,
    pub category: String,
    #[serde(deserialize_with = "deserialize_expense_date")]
    pub expense_date: OffsetDateTime,
}

impl CreateExpenseRequest {
    /// The single decimal-to-cents conversion on the way in.
    pub fn into_new_expense(self) -> Result<NewExpense, AppError> {
        Ok(NewExpense {
            description: self.description,
            amount_cents: to_cents(self.amount)?,
            category: self.category,
            expense_date: self.expense_date,
        })
    }
}

#[derive(Debug, Serialize)]
pub struct ExpenseResponse {
    pub id: i64,
    pub description: String,
    pub amount: f64,
    pub category: String,
    #[serde(with = "time::serde::rfc3339")]
    pub expense_date: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub time_created: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub time_updated: OffsetDateTime,
    pub user_id: i64,
}

impl From<Expense> for ExpenseResponse {
    fn from(e: Expense) -> Self {
        Self {
            id: e.id,
            description: e.description,
            amount: from_cents(e.amount_cents),
            category: e.category,
            expense_date: e.expense_date,
            time_created: e.created_at,
            time_updated: e.updated_at,
            user_id: e.user_id,
        }
    }
}

/// Accepts RFC 3339, an offset-less `YYYY-MM-DDTHH:MM:SS` (taken as UTC),
/// or a bare `YYYY-MM-DD` (midnight UTC).
pub fn parse_expense_date(raw: &str) -> Option<OffsetDateTime> {
    if let Ok(dt) = OffsetDateTime::parse(raw, &Rfc3339) {
        return Some(dt);
    }
    let naive = format_description!("[year]-[month]-[day]T[hour]:[minute]:[second]");
    if let Ok(dt) = PrimitiveDateTime::parse(raw, naive) {
        return Some(dt.assume_utc());
    }
    let date_only = format_description!("[year]-[month]-[day]");
    Date::parse(raw, date_only)
        .ok()
        .map(|d| d.midnight().assume_utc())
}

fn deserialize_expense_date<'de, D>(deserializer: D) -> Result<OffsetDateTime, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    parse_expense_date(&raw)
        .ok_or_else(|| de::Error::custom(format!("invalid expense_date: {raw}")))
}
