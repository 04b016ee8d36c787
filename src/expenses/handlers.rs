use axum::{extract::State, http::StatusCode, routing::post, Json, Router};
use tracing::instrument;

use crate::{
    auth::extractors::CurrentUser,
    error::AppError,
    json::AppJson,
    expenses::{
        dto::{CreateExpenseRequest, ExpenseResponse},
        services,
    },
    state::AppState,
};

pub fn expense_routes() -> Router<AppState> {
    Router::new().route("/expenses/", post(create_expense).get(list_expenses))
}

#[instrument(skip_all)]
pub async fn create_expense(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    AppJson(payload): AppJson<CreateExpenseRequest>,
) -> Result<(StatusCode, Json<ExpenseResponse>), AppError> {
    let new = payload.into_new_expense()?;
    let expense = services::create_expense(state.expenses.as_ref(), user.id, new).await?;
    Ok((StatusCode::CREATED, Json(expense.into())))
}

#[instrument(skip_all)]
pub async fn list_expenses(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> Result<Json<Vec<ExpenseResponse>>, AppError> {
    let rows = services::list_expenses(state.expenses.as_ref(), user.id).await?;
    Ok(Json(rows.into_iter().map(ExpenseResponse::from).collect()))
}
