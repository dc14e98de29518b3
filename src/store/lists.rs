use diesel::prelude::*;
use uuid::Uuid;

use crate::models::{List, ListChanges, NewList};
use crate::schema::list;

/// Whether an insert actually happened, since `list.id` collisions are a
/// 409 at the admission boundary, not a hard error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Inserted {
    Created,
    AlreadyExists,
}

pub fn insert_list(conn: &mut PgConnection, new_list: &NewList<'_>) -> QueryResult<Inserted> {
    let rows = diesel::insert_into(list::table)
        .values(new_list)
        .on_conflict(list::id)
        .do_nothing()
        .execute(conn)?;

    Ok(if rows == 0 {
        Inserted::AlreadyExists
    } else {
        Inserted::Created
    })
}

pub fn find_list(conn: &mut PgConnection, id: &str, user_id: Uuid) -> QueryResult<Option<List>> {
    list::table
        .filter(list::id.eq(id))
        .filter(list::user_id.eq(user_id))
        .first(conn)
        .optional()
}

pub fn update_list(
    conn: &mut PgConnection,
    id: &str,
    user_id: Uuid,
    changes: &ListChanges,
) -> QueryResult<Option<List>> {
    diesel::update(list::table.filter(list::id.eq(id)).filter(list::user_id.eq(user_id)))
        .set(changes)
        .get_result(conn)
        .optional()
}

pub fn delete_list(conn: &mut PgConnection, id: &str, user_id: Uuid) -> QueryResult<usize> {
    diesel::delete(list::table.filter(list::id.eq(id)).filter(list::user_id.eq(user_id))).execute(conn)
}

pub fn all_lists_for_user(conn: &mut PgConnection, user_id: Uuid) -> QueryResult<Vec<List>> {
    list::table
        .filter(list::user_id.eq(user_id))
        .order(list::id.asc())
        .load(conn)
}

