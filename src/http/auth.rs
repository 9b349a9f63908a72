use super::error::ApiError;
use axum::{
    async_trait,
    extract::{FromRequestParts, Query},
    http::request::Parts,
};
use std::collections::HashMap;

pub const USER_HEADER: &str = "x-user-id";

/// Authenticated wearer, from the `x-user-id` header or a `user_id` query
/// parameter (image tags in the webview cannot set headers).
#[derive(Debug, Clone)]
pub struct AuthUser(pub String);

#[async_trait]
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let from_header = parts
            .headers
            .get(USER_HEADER)
            .and_then(|v| v.to_str().ok())
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .map(str::to_owned);

        let user = from_header.or_else(|| {
            Query::<HashMap<String, String>>::try_from_uri(&parts.uri)
                .ok()
                .and_then(|Query(params)| params.get("user_id").cloned())
                .filter(|v| !v.trim().is_empty())
        });

        user.map(AuthUser).ok_or(ApiError::Unauthenticated)
    }
}
