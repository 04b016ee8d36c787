use axum::{async_trait, extract::FromRequestParts, http::request::Parts};

use crate::{
    auth::{repo_types::User, services::resolve_identity},
    error::AppError,
    state::AppState,
};

/// The user named by a valid `Authorization: Bearer <token>` header.
pub struct CurrentUser(pub User);

/// Token part of a bearer `Authorization` value; the scheme is case-insensitive.
pub(crate) fn bearer_token(header: &str) -> Option<&str> {
    let (scheme, token) = header.trim().split_once(' ')?;
    let token = token.trim();
    (scheme.eq_ignore_ascii_case("bearer") && !token.is_empty()).then_some(token)
}

#[async_trait]
impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = parts
            .headers
            .get(axum::http::header::AUTHORIZATION)
            .and_then(|h| h.to_str().ok())
            .and_then(bearer_token)
            .ok_or(AppError::Unauthenticated)?;

        let user = resolve_identity(state.users.as_ref(), &state.keys, token).await?;
        Ok(CurrentUser(user))
    }
}
