//! Session authentication.
//!
//! Tokens are read from `Authorization: Bearer <token>`, falling back to the
//! `jotter_session` cookie (browsers cannot set headers on `EventSource`).

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use axum::http::{header, HeaderMap};
use uuid::Uuid;

use jotter_core::{Session, SessionRepository};

use crate::{ApiError, AppState};

/// Cookie carrying the session token.
pub const SESSION_COOKIE: &str = "jotter_session";

/// Extractor that requires a valid session.
#[derive(Debug, Clone)]
pub struct RequireUser {
    pub user_id: Uuid,
    pub session: Session,
    /// Raw token, kept so the session can be revoked.
    pub token: String,
}

#[axum::async_trait]
impl FromRequestParts<AppState> for RequireUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = session_token(&parts.headers)
            .ok_or_else(|| ApiError::Unauthorized("Authentication required".to_string()))?;

        let session = state
            .db
            .sessions
            .validate(token)
            .await?
            .ok_or_else(|| ApiError::Unauthorized("Invalid or expired session".to_string()))?;

        Ok(RequireUser {
            user_id: session.user_id,
            session,
            token: token.to_string(),
        })
    }
}

/// Find the session token in the request headers.
pub fn session_token(headers: &HeaderMap) -> Option<&str> {
    let bearer = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty());

    bearer.or_else(|| {
        headers
            .get_all(header::COOKIE)
            .iter()
            .filter_map(|v| v.to_str().ok())
            .flat_map(|v| v.split(';'))
            .filter_map(|pair| pair.trim().split_once('='))
            .find(|(name, _)| *name == SESSION_COOKIE)
            .map(|(_, value)| value.trim())
            .filter(|t| !t.is_empty())
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn headers(pairs: &[(header::HeaderName, &'static str)]) -> HeaderMap {
        let mut map = HeaderMap::new();
        for (name, value) in pairs {
            map.append(name.clone(), HeaderValue::from_static(value));
        }
        map
    }

    #[test]
    fn test_bearer_token() {
        let h = headers(&[(header::AUTHORIZATION, "Bearer jt_abc")]);
        assert_eq!(session_token(&h), Some("jt_abc"));
    }

    #[test]
    fn test_non_bearer_scheme_is_ignored() {
        let h = headers(&[(header::AUTHORIZATION, "Basic dXNlcjpwYXNz")]);
        assert_eq!(session_token(&h), None);
    }

    #[test]
    fn test_cookie_fallback() {
        let h = headers(&[(header::COOKIE, "theme=dark; jotter_session=jt_xyz; other=1")]);
        assert_eq!(session_token(&h), Some("jt_xyz"));
    }

    #[test]
    fn test_header_wins_over_cookie() {
        let h = headers(&[
            (header::AUTHORIZATION, "Bearer jt_header"),
            (header::COOKIE, "jotter_session=jt_cookie"),
        ]);
        assert_eq!(session_token(&h), Some("jt_header"));
    }

    #[test]
    fn test_empty_values_are_missing() {
        let h = headers(&[
            (header::AUTHORIZATION, "Bearer "),
            (header::COOKIE, "jotter_session="),
        ]);
        assert_eq!(session_token(&h), None);
    }
}
