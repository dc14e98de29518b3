//! List CRUD: `GET/POST /v1/list`,
//! `GET/PUT/DELETE /v1/list/{id}`, `GET /v1/list/{id}/cidr`.

use axum::extract::{Path, State};
use axum::Json;
use diesel::Connection;
use serde::{Deserialize, Serialize};

use crate::app::AppState;
use crate::auth::AuthCheck;
use crate::db;
use crate::errors::{AppError, AppResult};
use crate::models::{
    with_default_tag, CidrJob, List, ListChanges, ListType, NewList, MAX_DESCRIPTION_LEN, MAX_LIST_ID_LEN,
    MAX_TAG_LEN, TAG_PATTERN,
};
use crate::store;

static LIST_ID_RE: once_cell::sync::Lazy<regex::Regex> =
    once_cell::sync::Lazy::new(|| regex::Regex::new(crate::models::LIST_ID_PATTERN).unwrap());
static TAG_RE: once_cell::sync::Lazy<regex::Regex> =
    once_cell::sync::Lazy::new(|| regex::Regex::new(TAG_PATTERN).unwrap());

fn validate_list_id(id: &str) -> AppResult<()> {
    if id.len() > MAX_LIST_ID_LEN || !LIST_ID_RE.is_match(id) {
        return Err(AppError::BadRequest("invalid list id".into()));
    }
    Ok(())
}

fn validate_tags(tags: &[String]) -> AppResult<()> {
    for tag in tags {
        if tag.len() > MAX_TAG_LEN || !TAG_RE.is_match(tag) {
            return Err(AppError::BadRequest(format!("invalid tag: {tag}")));
        }
    }
    Ok(())
}

#[derive(Debug, Deserialize)]
pub struct CreateListRequest {
    pub id: String,
    pub list_type: ListType,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub enabled: bool,
    #[serde(default)]
    pub description: String,
}

pub async fn list_all(State(state): State<AppState>, auth: AuthCheck) -> AppResult<Json<Vec<List>>> {
    let user_id = auth.user.id;
    let lists = db::run(&state.db_pool, move |conn| store::all_lists_for_user(conn, user_id)).await?;
    Ok(Json(lists))
}

pub async fn create_list(
    State(state): State<AppState>,
    auth: AuthCheck,
    Json(body): Json<CreateListRequest>,
) -> AppResult<(axum::http::StatusCode, Json<List>)> {
    validate_list_id(&body.id)?;
    validate_tags(&body.tags)?;
    if body.description.len() > MAX_DESCRIPTION_LEN {
        return Err(AppError::BadRequest("description too long".into()));
    }

    let id = body.id.clone();
    let tags = with_default_tag(body.tags.clone());
    let list_type = body.list_type;
    let enabled = body.enabled;
    let description = body.description.clone();
    let user_id = auth.user.id;

    let inserted = db::run(&state.db_pool, {
        let id = id.clone();
        move |conn| {
            let new_list = NewList { id: &id, user_id, list_type, enabled, tags, description: &description };
            store::insert_list(conn, &new_list)
        }
    })
    .await?;

    if inserted == store::Inserted::AlreadyExists {
        return Err(AppError::Conflict(id));
    }

    let list = db::run(&state.db_pool, move |conn| store::find_list(conn, &id, user_id))
        .await?
        .ok_or(AppError::NotFound)?;

    Ok((axum::http::StatusCode::CREATED, Json(list)))
}

pub async fn get_list(
    State(state): State<AppState>,
    auth: AuthCheck,
    Path(id): Path<String>,
) -> AppResult<Json<List>> {
    let user_id = auth.user.id;
    let list = db::run(&state.db_pool, move |conn| store::find_list(conn, &id, user_id))
        .await?
        .ok_or(AppError::NotFound)?;
    Ok(Json(list))
}

#[derive(Debug, Deserialize)]
pub struct UpdateListRequest {
    pub list_type: Option<ListType>,
    pub enabled: Option<bool>,
    pub tags: Option<Vec<String>>,
    pub description: Option<String>,
}

/// Applies a partial update, then — if this is a SAFE list transitioning
/// `enabled: false -> true` — enqueues the deferred cleanup `UPDATE` job in
/// the same transaction as the write.
pub async fn update_list(
    State(state): State<AppState>,
    auth: AuthCheck,
    Path(id): Path<String>,
    Json(body): Json<UpdateListRequest>,
) -> AppResult<Json<List>> {
    if let Some(tags) = &body.tags {
        validate_tags(tags)?;
    }
    if let Some(description) = &body.description {
        if description.len() > MAX_DESCRIPTION_LEN {
            return Err(AppError::BadRequest("description too long".into()));
        }
    }

    let user_id = auth.user.id;

    let updated = db::run(&state.db_pool, move |conn| {
        conn.build_transaction().read_write().run(|conn| {
            let current = store::find_list(conn, &id, user_id)?.ok_or(diesel::result::Error::RollbackTransaction)?;

            let list_type = body.list_type.unwrap_or(current.list_type);
            let enabled = body.enabled.unwrap_or(current.enabled);
            let tags = body
                .tags
                .clone()
                .map(with_default_tag)
                .unwrap_or(current.tags.clone());
            let description = body.description.clone().unwrap_or(current.description.clone());

            let changes = ListChanges { list_type, enabled, tags, description };
            let updated = store::update_list(conn, &id, user_id, &changes)?
                .ok_or(diesel::result::Error::RollbackTransaction)?;

            if current.list_type == ListType::Safe && !current.enabled && updated.enabled {
                let job = CidrJob::new_update_cleanup(id.clone(), user_id);
                store::enqueue(conn, &job)?;
            }

            Ok(updated)
        })
    })
    .await;

    match updated {
        Ok(list) => Ok(Json(list)),
        Err(AppError::Database(diesel::result::Error::RollbackTransaction)) => Err(AppError::NotFound),
        Err(err) => Err(err),
    }
}

pub async fn delete_list(
    State(state): State<AppState>,
    auth: AuthCheck,
    Path(id): Path<String>,
) -> AppResult<axum::http::StatusCode> {
    let user_id = auth.user.id;
    let deleted = db::run(&state.db_pool, move |conn| store::delete_list(conn, &id, user_id)).await?;

    if deleted == 0 {
        return Err(AppError::NotFound);
    }

    Ok(axum::http::StatusCode::NO_CONTENT)
}

#[derive(Debug, Serialize)]
pub struct ListWithCidrs {
    #[serde(flatten)]
    pub list: List,
    pub cidrs: Vec<crate::models::CidrRow>,
}

pub async fn list_cidrs(
    State(state): State<AppState>,
    auth: AuthCheck,
    Path(id): Path<String>,
) -> AppResult<Json<ListWithCidrs>> {
    let user_id = auth.user.id;
    let id2 = id.clone();

    let list = db::run(&state.db_pool, move |conn| store::find_list(conn, &id2, user_id))
        .await?
        .ok_or(AppError::NotFound)?;

    let id3 = id.clone();
    let cidrs = db::run(&state.db_pool, move |conn| store::cidrs_for_list(conn, &id3)).await?;

    Ok(Json(ListWithCidrs { list, cidrs }))
}
