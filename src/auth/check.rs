//! The `AuthCheck` axum extractor: resolves a request's Bearer token (from
//! the `Authorization` header or the configured cookie) to a [`User`],
//! consulting the [`TokenCache`] before touching the database. Every
//! protected route is wrapped the same way: look up the raw header value
//! in the in-memory store; on a miss, decode the JWT, load the user, and
//! populate the store for next time.

use axum::extract::{FromRef, FromRequestParts};
use axum::http::request::Parts;
use axum::RequestPartsExt;
use axum_extra::extract::CookieJar;

use crate::app::AppState;
use crate::auth::{jwt, AuthError, CachedAuth, Token};
use crate::errors::AppError;
use crate::models::{Role, User};

const AUTH_COOKIE_NAME: &str = "auth_token";

pub struct AuthCheck {
    pub user: User,
    pub token: Token,
}

impl AuthCheck {
    pub fn require_superuser(&self) -> Result<(), AppError> {
        if self.token.login.is_empty() {
            return Err(AppError::Unauthorized);
        }
        if self.user.role != Role::Superuser {
            return Err(AppError::Forbidden);
        }
        Ok(())
    }
}

#[axum::async_trait]
impl<S> FromRequestParts<S> for AuthCheck
where
    AppState: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let app_state = AppState::from_ref(state);

        let raw_token = bearer_token(parts).await?;

        if let Some(cached) = app_state.token_cache.get(&raw_token).await {
            return Ok(AuthCheck { user: cached.user, token: cached.token });
        }

        let token = jwt::decode_jwt_token(&raw_token, app_state.config.jwt_secret_bytes())
            .map_err(AppError::from)?;

        let user_id = token.sub;
        let user = crate::db::run(&app_state.db_pool, move |conn| crate::store::find_user_by_id(conn, user_id))
            .await?
            .ok_or(AppError::Unauthorized)?;

        app_state
            .token_cache
            .insert(raw_token, CachedAuth { token: token.clone(), user: user.clone() })
            .await;

        Ok(AuthCheck { user, token })
    }
}

async fn bearer_token(parts: &mut Parts) -> Result<String, AppError> {
    if let Some(header) = parts.headers.get(axum::http::header::AUTHORIZATION) {
        let header = header.to_str().map_err(|_| AppError::from(AuthError::InvalidToken))?;
        if let Some(token) = header.strip_prefix("Bearer ") {
            return Ok(token.to_string());
        }
    }

    let jar: CookieJar = parts.extract().await.map_err(|_| AppError::from(AuthError::InvalidToken))?;
    if let Some(cookie) = jar.get(AUTH_COOKIE_NAME) {
        return Ok(cookie.value().to_string());
    }

    Err(AppError::from(AuthError::InvalidToken))
}
