//! Request extractors.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use common::UserId;
use uuid::Uuid;

use crate::error::ApiError;

/// The authenticated user's identity, resolved from the `x-user-id` header.
///
/// Identity resolution proper (token issuance and validation) lives in front
/// of this service; by the time a request arrives here the header carries
/// the resolved user id. A missing or malformed header is rejected with 401.
#[derive(Debug, Clone, Copy)]
pub struct AuthenticatedUser(pub UserId);

impl<S> FromRequestParts<S> for AuthenticatedUser
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let value = parts
            .headers
            .get("x-user-id")
            .and_then(|v| v.to_str().ok())
            .ok_or(ApiError::Unauthenticated)?;

        let uuid = Uuid::parse_str(value).map_err(|_| ApiError::Unauthenticated)?;
        Ok(Self(UserId::from_uuid(uuid)))
    }
}
