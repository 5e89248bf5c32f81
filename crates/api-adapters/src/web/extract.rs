use axum::extract::FromRequestParts;
use axum::http::request::Parts;

use super::error::ApiError;

/// Header the identity gateway sets after authenticating the caller.
pub const USER_ID_HEADER: &str = "x-user-id";

/// Opaque, already-authenticated subject id. No verification happens here.
#[derive(Debug, Clone)]
pub struct AuthenticatedUser(pub String);

impl<S> FromRequestParts<S> for AuthenticatedUser
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .headers
            .get(USER_ID_HEADER)
            .and_then(|value| value.to_str().ok())
            .map(str::trim)
            .filter(|id| !id.is_empty())
            .map(|id| AuthenticatedUser(id.to_string()))
            .ok_or(ApiError::Unauthenticated)
    }
}
