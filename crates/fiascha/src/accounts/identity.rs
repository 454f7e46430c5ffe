use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

use super::access::AccessError;
use super::domain::AccountId;
use crate::http::error_response;

/// Header carrying the authenticated account id, supplied by the identity layer in front of
/// the portal.
pub const ACCOUNT_HEADER: &str = "x-account-id";

/// The account a request acts on behalf of. Services still verify it exists and is active.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Actor(pub AccountId);

#[axum::async_trait]
impl<S> FromRequestParts<S> for Actor
where
    S: Send + Sync,
{
    type Rejection = AccessError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let raw = parts
            .headers
            .get(ACCOUNT_HEADER)
            .and_then(|value| value.to_str().ok())
            .ok_or(AccessError::Unauthenticated)?;
        let id = raw
            .trim()
            .parse::<u64>()
            .map_err(|_| AccessError::Unauthenticated)?;
        Ok(Actor(AccountId(id)))
    }
}

impl IntoResponse for AccessError {
    fn into_response(self) -> Response {
        let status = match self {
            AccessError::Unauthenticated | AccessError::UnknownAccount(_) => {
                StatusCode::UNAUTHORIZED
            }
            AccessError::Inactive(_) | AccessError::PermissionDenied(_) => StatusCode::FORBIDDEN,
        };
        error_response(status, self.to_string())
    }
}
