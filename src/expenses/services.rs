use tracing::{error, info};

use crate::{
    error::AppError,
    expenses::{
        repo::ExpenseStore,
        repo_types::{Expense, NewExpense},
    },
};

const MAX_DESCRIPTION_LEN: usize = 200;
const MAX_CATEGORY_LEN: usize = 50;

fn validate(expense: &NewExpense) -> Result<(), AppError> {
    if expense.amount_cents < 0 {
        return Err(AppError::InvalidAmount);
    }
    let description = expense.description.trim();
    if description.is_empty() || description.chars().count() > MAX_DESCRIPTION_LEN {
        return Err(AppError::Validation(format!(
            "description must be 1-{MAX_DESCRIPTION_LEN} characters"
        )));
    }
    let category = expense.category.trim();
    if category.is_empty() || category.chars().count() > MAX_CATEGORY_LEN {
        return Err(AppError::Validation(format!(
            "category must be 1-{MAX_CATEGORY_LEN} characters"
        )));
    }
    Ok(())
}

/// Records an expense owned by `owner_id`.
pub async fn create_expense(
    store: &dyn ExpenseStore,
    owner_id: i64,
    mut expense: NewExpense,
) -> Result<Expense, AppError> {
    validate(&expense)?;
    expense.description = expense.description.trim().to_owned();
    expense.category = expense.category.trim().to_owned();

    let created = store.create(owner_id, &expense).await.map_err(|e| {
        error!(error = %e, owner_id, "create expense failed");
        AppError::Internal(e)
    })?;
    info!(expense_id = created.id, owner_id, amount_cents = created.amount_cents, "expense created");
    Ok(created)
}

pub async fn list_expenses(store: &dyn ExpenseStore, owner_id: i64) -> Result<Vec<Expense>, AppError> {
    store.list_by_owner(owner_id).await.map_err(|e| {
        error!(error = %e, owner_id, "list expenses failed");
        AppError::Internal(e)
    })
}
