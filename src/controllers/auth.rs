//! `POST /v1/auth/token`, `PUT /v1/auth/password`, `POST /v1/admin/signup`.

use axum::extract::State;
use axum::Json;
use serde::Deserialize;
use uuid::Uuid;

use crate::app::AppState;
use crate::auth::jwt::{encode_jwt_token, TokenResponse};
use crate::auth::password::{generate_salt_and_hashed_password, verify_password};
use crate::auth::AuthCheck;
use crate::db;
use crate::errors::{AppError, AppResult};
use crate::models::{NewUser, Role, User};
use crate::store;

#[derive(Debug, Deserialize)]
pub struct TokenRequest {
    pub login: String,
    pub password: String,
}

pub async fn issue_token(
    State(state): State<AppState>,
    Json(body): Json<TokenRequest>,
) -> AppResult<Json<TokenResponse>> {
    let login = body.login.clone();
    let user = db::run(&state.db_pool, move |conn| store::find_user_by_login(conn, &login))
        .await?
        .ok_or(AppError::Unauthorized)?;

    let verified = verify_password(&user.salt, &user.hashed_password, &body.password).map_err(AppError::from)?;
    if !verified {
        return Err(AppError::Unauthorized);
    }

    let response = encode_jwt_token(user.id, &user.login, state.config.jwt_secret_bytes(), state.config.default_token_ttl_seconds)
        .map_err(AppError::from)?;

    Ok(Json(response))
}

#[derive(Debug, Deserialize)]
pub struct PasswordChangeRequest {
    pub login: String,
    pub password: String,
    pub new_password: String,
}

pub async fn change_password(
    State(state): State<AppState>,
    Json(body): Json<PasswordChangeRequest>,
) -> AppResult<()> {
    if body.new_password == body.password {
        return Err(AppError::BadRequest("new_password must differ from password".into()));
    }
    if !crate::auth::password::validate_password_policy(&body.new_password) {
        return Err(AppError::BadRequest("new_password does not meet the password policy".into()));
    }

    let login = body.login.clone();
    let user = db::run(&state.db_pool, move |conn| store::find_user_by_login(conn, &login))
        .await?
        .ok_or(AppError::Unauthorized)?;

    let verified = verify_password(&user.salt, &user.hashed_password, &body.password).map_err(AppError::from)?;
    if !verified {
        return Err(AppError::Unauthorized);
    }

    let (salt, hashed_password) =
        generate_salt_and_hashed_password(&body.new_password).map_err(AppError::from)?;

    db::run(&state.db_pool, move |conn| {
        store::update_password(conn, user.id, &salt, &hashed_password)
    })
    .await?;

    Ok(())
}

#[derive(Debug, Deserialize)]
pub struct SignupRequest {
    pub login: String,
    pub password: String,
}

/// SUPERUSER only; 409 on login collision.
pub async fn signup(
    State(state): State<AppState>,
    auth: AuthCheck,
    Json(body): Json<SignupRequest>,
) -> AppResult<(axum::http::StatusCode, Json<UserView>)> {
    auth.require_superuser()?;

    if !crate::models::validate_login(&body.login) {
        return Err(AppError::BadRequest("invalid login".into()));
    }
    if !crate::auth::password::validate_password_policy(&body.password) {
        return Err(AppError::BadRequest("password does not meet the password policy".into()));
    }

    let (salt, hashed_password) = generate_salt_and_hashed_password(&body.password).map_err(AppError::from)?;

    let new_user = NewUser { id: Uuid::new_v4(), login: body.login.clone(), salt, hashed_password, role: Role::User };

    let login_for_conflict_check = body.login.clone();
    let existing = db::run(&state.db_pool, move |conn| store::find_user_by_login(conn, &login_for_conflict_check))
        .await?;
    if existing.is_some() {
        return Err(AppError::Conflict(body.login));
    }

    let user = db::run(&state.db_pool, move |conn| store::insert_user(conn, &new_user)).await?;

    Ok((axum::http::StatusCode::CREATED, Json(UserView::from(user))))
}

#[derive(Debug, serde::Serialize)]
pub struct UserView {
    pub id: Uuid,
    pub login: String,
    pub role: Role,
}

impl From<User> for UserView {
    fn from(user: User) -> Self {
        UserView { id: user.id, login: user.login, role: user.role }
    }
}
