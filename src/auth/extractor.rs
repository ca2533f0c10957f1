use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use axum_extra::TypedHeader;
use axum_extra::headers::Authorization;
use axum_extra::headers::authorization::Bearer;

use crate::auth::resolver::{self, ResolveError};
use crate::error::AppError;
use crate::models::User;
use crate::state::SharedState;

pub const INVALID_CREDENTIALS: &str = "Could not validate credentials";

/// The caller behind a `Authorization: Bearer` header, freshly loaded from the store.
#[derive(Debug, Clone)]
pub struct CurrentUser(pub User);

impl FromRequestParts<SharedState> for CurrentUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &SharedState,
    ) -> Result<Self, Self::Rejection> {
        let TypedHeader(Authorization(bearer)) =
            TypedHeader::<Authorization<Bearer>>::from_request_parts(parts, state)
                .await
                .map_err(|_| AppError::Unauthorized(INVALID_CREDENTIALS.to_string()))?;

        match resolver::resolve(state.store.as_ref(), &state.tokens, bearer.token()).await {
            Ok(user) => Ok(CurrentUser(user)),
            Err(ResolveError::Token(reason)) => {
                tracing::debug!("Rejected bearer token: {reason}");
                Err(AppError::Unauthorized(INVALID_CREDENTIALS.to_string()))
            }
            Err(ResolveError::Store(e)) => {
                tracing::error!("User lookup failed while resolving token: {e}");
                Err(AppError::Unauthorized(INVALID_CREDENTIALS.to_string()))
            }
        }
    }
}
