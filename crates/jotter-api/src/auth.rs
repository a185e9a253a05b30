//! Bearer token authentication.

use axum::{
    extract::FromRequestParts,
    http::{header, request::Parts, HeaderMap},
};
use uuid::Uuid;

use jotter_core::{User, UserRepository};

use crate::{ApiError, AppState};

/// Extractor that requires a valid bearer token for an existing user.
///
/// Usage:
/// ```ignore
/// async fn my_handler(RequireUser(user): RequireUser) -> impl IntoResponse {
///     format!("hello {}", user.username)
/// }
/// ```
#[derive(Debug, Clone)]
pub struct RequireUser(pub User);

/// Token from an `Authorization: Bearer <token>` header.
pub fn bearer_token(headers: &HeaderMap) -> Result<&str, ApiError> {
    let value = headers
        .get(header::AUTHORIZATION)
        .ok_or_else(|| ApiError::Unauthorized("missing bearer token".to_string()))?;
    let value = value
        .to_str()
        .map_err(|_| ApiError::Unauthorized("invalid authorization header format".to_string()))?;

    match value.split_once(' ') {
        Some((scheme, token)) if scheme.eq_ignore_ascii_case("bearer") && !token.trim().is_empty() => {
            Ok(token.trim())
        }
        _ => Err(ApiError::Unauthorized(
            "invalid authorization header format".to_string(),
        )),
    }
}

#[axum::async_trait]
impl FromRequestParts<AppState> for RequireUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = bearer_token(&parts.headers)?;

        let claims = state.tokens.verify(token).map_err(|e| {
            tracing::debug!(subsystem = "api", component = "auth", error = %e, "Token rejected");
            ApiError::Unauthorized("invalid token".to_string())
        })?;
        let user_id = Uuid::parse_str(&claims.sub)
            .map_err(|_| ApiError::Unauthorized("invalid token".to_string()))?;

        let user = state
            .db
            .users
            .get(user_id)
            .await?
            .ok_or_else(|| ApiError::Unauthorized("user not found".to_string()))?;

        Ok(RequireUser(user))
    }
}

#[cfg(test)]
mod tests {
    use axum::http::HeaderValue;

    use super::*;

    fn headers(value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, HeaderValue::from_str(value).unwrap());
        headers
    }

    fn message(err: ApiError) -> String {
        match err {
            ApiError::Unauthorized(msg) => msg,
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_bearer_token_ok() {
        assert_eq!(bearer_token(&headers("Bearer abc.def")).unwrap(), "abc.def");
        assert_eq!(bearer_token(&headers("bearer  abc ")).unwrap(), "abc");
    }

    #[test]
    fn test_missing_header() {
        let err = bearer_token(&HeaderMap::new()).unwrap_err();
        assert_eq!(message(err), "missing bearer token");
    }

    #[test]
    fn test_wrong_scheme() {
        let err = bearer_token(&headers("Basic dXNlcjpwYXNz")).unwrap_err();
        assert_eq!(message(err), "invalid authorization header format");

        let err = bearer_token(&headers("Bearer")).unwrap_err();
        assert_eq!(message(err), "invalid authorization header format");
    }
}
