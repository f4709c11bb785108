use axum::{
    async_trait,
    extract::{FromRef, FromRequestParts},
    http::{header::AUTHORIZATION, request::Parts, HeaderMap},
};
use tracing::debug;

use super::{jwt::JwtKeys, repo::User};
use crate::{error::AppError, state::AppState};

/// The authenticated principal of a request.
///
/// Taking this extractor is what makes a route protected: the token is
/// verified and the user is loaded before the handler body runs.
#[derive(Debug, Clone)]
pub struct AuthUser(pub User);

#[async_trait]
impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        resolve_principal(&parts.headers, state).await.map(AuthUser)
    }
}

/// Every failure except a store outage collapses to `Unauthenticated`.
pub async fn resolve_principal(headers: &HeaderMap, state: &AppState) -> Result<User, AppError> {
    let token = bearer_token(headers).ok_or_else(|| {
        debug!("missing or malformed Authorization header");
        AppError::Unauthenticated
    })?;

    let claims = JwtKeys::from_ref(state).verify(token).map_err(|e| {
        debug!(reason = %e, "token rejected");
        AppError::Unauthenticated
    })?;

    match state.users.find_by_id(claims.sub).await? {
        Some(user) => Ok(user),
        None => {
            debug!(user_id = %claims.sub, "token subject no longer exists");
            Err(AppError::Unauthenticated)
        }
    }
}

fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    let value = headers.get(AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = value.trim().split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("bearer") {
        return None;
    }
    let token = token.trim();
    (!token.is_empty()).then_some(token)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::repo::NewUser;
    use axum::http::HeaderValue;
    use time::{Duration, OffsetDateTime};
    use uuid::Uuid;

    fn headers_with(value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, HeaderValue::from_str(value).unwrap());
        headers
    }

    async fn state_with_user() -> (AppState, User) {
        let state = AppState::fake();
        let user = state
            .users
            .create(NewUser {
                username: "ana".into(),
                email: "ana@example.com".into(),
                password_hash: "$argon2id$stub".into(),
            })
            .await
            .unwrap();
        (state, user)
    }

    #[test]
    fn bearer_scheme_parsing() {
        assert_eq!(bearer_token(&headers_with("Bearer abc")), Some("abc"));
        assert_eq!(bearer_token(&headers_with("bearer abc")), Some("abc"));
        assert_eq!(bearer_token(&headers_with("Basic abc")), None);
        assert_eq!(bearer_token(&headers_with("Bearer ")), None);
        assert_eq!(bearer_token(&headers_with("Bearer")), None);
        assert_eq!(bearer_token(&HeaderMap::new()), None);
    }

    #[tokio::test]
    async fn valid_token_resolves_user() {
        let (state, user) = state_with_user().await;
        let token = JwtKeys::from_ref(&state).sign(user.id).unwrap();

        let principal = resolve_principal(&headers_with(&format!("Bearer {token}")), &state)
            .await
            .expect("resolves");
        assert_eq!(principal.id, user.id);
    }

    #[tokio::test]
    async fn every_token_failure_is_unauthenticated() {
        let (state, user) = state_with_user().await;
        let keys = JwtKeys::from_ref(&state);

        let expired = keys
            .sign_at(user.id, OffsetDateTime::now_utc() - Duration::hours(1))
            .unwrap();
        let unknown_subject = keys.sign(Uuid::new_v4()).unwrap();

        for header in [
            format!("Bearer {expired}"),
            format!("Bearer {unknown_subject}"),
            "Bearer garbage".to_string(),
            "Token abc".to_string(),
        ] {
            let err = resolve_principal(&headers_with(&header), &state)
                .await
                .unwrap_err();
            assert!(matches!(err, AppError::Unauthenticated), "{header}: {err:?}");
        }

        let err = resolve_principal(&HeaderMap::new(), &state).await.unwrap_err();
        assert!(matches!(err, AppError::Unauthenticated));
    }
}
