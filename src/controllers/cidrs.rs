//! CIDR admission and read endpoints:
//! `POST /v1/list/{id}/cidr/{add,delete}[/raw]`,
//! `GET /v1/cidr/`, `/collapsed`, `/collapsed/by-ip-version`.

use axum::extract::{Path, Query, State};
use axum::Json;
use serde::Deserialize;

use crate::app::AppState;
use crate::auth::AuthCheck;
use crate::db;
use crate::errors::{AppError, AppResult};
use crate::models::{CidrJob, CidrRow, ListType};
use crate::net::parse;
use crate::query;
use crate::store;

#[derive(Debug, Deserialize)]
pub struct AddCidrRequest {
    pub cidrs: Vec<String>,
    pub ttl: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct DeleteCidrRequest {
    pub cidrs: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub struct AddCidrRawRequest {
    pub cidrs: String,
    pub ttl: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct DeleteCidrRawRequest {
    pub cidrs: String,
}

/// Loads the caller's own list (404 if absent/not theirs) and enqueues one
/// `CidrJob`, transactionally with the queue write.
async fn enqueue_job(
    state: &AppState,
    user_id: uuid::Uuid,
    list_id: String,
    job_builder: impl FnOnce(&crate::models::List) -> CidrJob + Send + 'static,
) -> AppResult<CidrJob> {
    db::run(&state.db_pool, move |conn| {
        let list = store::find_list(conn, &list_id, user_id)?.ok_or(diesel::result::Error::RollbackTransaction)?;
        let job = job_builder(&list);
        store::enqueue(conn, &job)?;
        Ok(job)
    })
    .await
    .map_err(|err| match err {
        AppError::Database(diesel::result::Error::RollbackTransaction) => AppError::NotFound,
        other => other,
    })
}

pub async fn add_cidrs(
    State(state): State<AppState>,
    auth: AuthCheck,
    Path(list_id): Path<String>,
    Json(body): Json<AddCidrRequest>,
) -> AppResult<(axum::http::StatusCode, Json<CidrJob>)> {
    if let Some(ttl) = body.ttl {
        if ttl <= 0 {
            return Err(AppError::BadRequest("ttl must be strictly positive".into()));
        }
    }

    let user_id = auth.user.id;
    let job = enqueue_job(&state, user_id, list_id.clone(), move |list| {
        CidrJob::new_add(list_id, list.list_type, list.enabled, user_id, body.cidrs, body.ttl)
    })
    .await?;

    Ok((axum::http::StatusCode::CREATED, Json(job)))
}

pub async fn delete_cidrs(
    State(state): State<AppState>,
    auth: AuthCheck,
    Path(list_id): Path<String>,
    Json(body): Json<DeleteCidrRequest>,
) -> AppResult<(axum::http::StatusCode, Json<CidrJob>)> {
    let user_id = auth.user.id;
    let job = enqueue_job(&state, user_id, list_id.clone(), move |list| {
        CidrJob::new_delete(list_id, list.list_type, list.enabled, user_id, body.cidrs)
    })
    .await?;

    Ok((axum::http::StatusCode::CREATED, Json(job)))
}

/// Regex-extracts CIDR-shaped tokens from free text before enqueuing.
/// Non-global filtering honours the process config.
pub async fn add_cidrs_raw(
    State(state): State<AppState>,
    auth: AuthCheck,
    Path(list_id): Path<String>,
    Json(body): Json<AddCidrRawRequest>,
) -> AppResult<(axum::http::StatusCode, Json<CidrJob>)> {
    if let Some(ttl) = body.ttl {
        if ttl <= 0 {
            return Err(AppError::BadRequest("ttl must be strictly positive".into()));
        }
    }

    let parsed = parse::parse_raw_free_text(&body.cidrs, state.config.only_global_cidrs);
    let cidrs: Vec<String> = parsed.all().iter().map(ToString::to_string).collect();

    let user_id = auth.user.id;
    let job = enqueue_job(&state, user_id, list_id.clone(), move |list| {
        CidrJob::new_add(list_id, list.list_type, list.enabled, user_id, cidrs, body.ttl)
    })
    .await?;

    Ok((axum::http::StatusCode::CREATED, Json(job)))
}

pub async fn delete_cidrs_raw(
    State(state): State<AppState>,
    auth: AuthCheck,
    Path(list_id): Path<String>,
    Json(body): Json<DeleteCidrRawRequest>,
) -> AppResult<(axum::http::StatusCode, Json<CidrJob>)> {
    let parsed = parse::parse_raw_free_text(&body.cidrs, false);
    let cidrs: Vec<String> = parsed.all().iter().map(ToString::to_string).collect();

    let user_id = auth.user.id;
    let job = enqueue_job(&state, user_id, list_id.clone(), move |list| {
        CidrJob::new_delete(list_id, list.list_type, list.enabled, user_id, cidrs)
    })
    .await?;

    Ok((axum::http::StatusCode::CREATED, Json(job)))
}

#[derive(Debug, Deserialize)]
pub struct CidrQuery {
    pub list_type: ListType,
    pub list_id: Option<String>,
    pub tags: Option<String>,
}

fn split_tags(tags: &Option<String>) -> Vec<String> {
    tags.as_ref()
        .map(|t| t.split(',').map(|s| s.trim().to_string()).filter(|s| !s.is_empty()).collect())
        .unwrap_or_default()
}

async fn load_rows(state: &AppState, user_id: uuid::Uuid, q: &CidrQuery) -> AppResult<Vec<CidrRow>> {
    let user_id2 = user_id;
    let list_type = q.list_type;
    if let Some(list_id) = q.list_id.clone() {
        Ok(db::run(&state.db_pool, move |conn| query::by_list(conn, user_id2, &list_id, list_type)).await?)
    } else {
        let tags = split_tags(&q.tags);
        Ok(db::run(&state.db_pool, move |conn| query::by_type(conn, user_id2, list_type, &tags)).await?)
    }
}

pub async fn get_cidrs(
    State(state): State<AppState>,
    auth: AuthCheck,
    Query(q): Query<CidrQuery>,
) -> AppResult<Json<Vec<CidrRow>>> {
    let rows = load_rows(&state, auth.user.id, &q).await?;
    Ok(Json(rows))
}

pub async fn get_cidrs_collapsed(
    State(state): State<AppState>,
    auth: AuthCheck,
    Query(q): Query<CidrQuery>,
) -> AppResult<Json<Vec<String>>> {
    let rows = load_rows(&state, auth.user.id, &q).await?;
    Ok(Json(query::collapsed(&rows)))
}

pub async fn get_cidrs_collapsed_by_version(
    State(state): State<AppState>,
    auth: AuthCheck,
    Query(q): Query<CidrQuery>,
) -> AppResult<Json<query::CollapsedByVersion>> {
    let rows = load_rows(&state, auth.user.id, &q).await?;
    Ok(Json(query::collapsed_by_version(&rows)))
}
