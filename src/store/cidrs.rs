use diesel::dsl::now;
use diesel::prelude::*;
use ipnetwork::IpNetwork;

use crate::models::{CidrRow, ListType, NewCidr};
use crate::schema::{cidr, list};

/// Upserts one batch in a single statement, updating only `expires_at` on
/// conflict (the conflict target is `(address, list_id)`).
pub fn upsert_cidrs(conn: &mut PgConnection, rows: &[NewCidr]) -> QueryResult<Vec<CidrRow>> {
    if rows.is_empty() {
        return Ok(vec![]);
    }

    diesel::insert_into(cidr::table)
        .values(rows)
        .on_conflict((cidr::address, cidr::list_id))
        .do_update()
        .set(cidr::expires_at.eq(diesel::upsert::excluded(cidr::expires_at)))
        .get_results(conn)
}

/// Deletes `addresses` from `list_id`, batched into one statement.
pub fn delete_cidrs(conn: &mut PgConnection, list_id: &str, addresses: &[IpNetwork]) -> QueryResult<usize> {
    if addresses.is_empty() {
        return Ok(0);
    }

    diesel::delete(
        cidr::table
            .filter(cidr::list_id.eq(list_id))
            .filter(cidr::address.eq_any(addresses)),
    )
    .execute(conn)
}

pub fn cidrs_for_list(conn: &mut PgConnection, list_id: &str) -> QueryResult<Vec<CidrRow>> {
    cidr::table
        .filter(cidr::list_id.eq(list_id))
        .order(cidr::id.asc())
        .load(conn)
}

/// All CIDRs belonging to any enabled list of `list_type` for `user_id` —
/// the exclusion/scope set the ADD processor and the cleanup subroutine
/// fold over.
pub fn cidrs_by_type_for_user(
    conn: &mut PgConnection,
    user_id: uuid::Uuid,
    list_type: ListType,
) -> QueryResult<Vec<CidrRow>> {
    cidr::table
        .inner_join(list::table.on(cidr::list_id.eq(list::id)))
        .filter(list::user_id.eq(user_id))
        .filter(list::enabled.eq(true))
        .filter(list::list_type.eq(list_type))
        .select(CidrRow::as_select())
        .order(cidr::id.asc())
        .load(conn)
}

/// CIDRs of one specific list, scoped additionally by `list_type` for the
/// read-path join.
pub fn cidrs_by_list_and_type(
    conn: &mut PgConnection,
    user_id: uuid::Uuid,
    list_id: &str,
    list_type: ListType,
) -> QueryResult<Vec<CidrRow>> {
    cidr::table
        .inner_join(list::table.on(cidr::list_id.eq(list::id)))
        .filter(list::user_id.eq(user_id))
        .filter(list::enabled.eq(true))
        .filter(list::list_type.eq(list_type))
        .filter(list::id.eq(list_id))
        .select(CidrRow::as_select())
        .order(cidr::id.asc())
        .load(conn)
}

/// CIDRs of one specific list, gated on that list's own `enabled` flag
/// rather than the caller's. Used by the SAFE re-enable cleanup job, which
/// has to see the list's current CIDRs as of when it runs, not as of when
/// it was enqueued.
pub fn enabled_cidrs_for_list(conn: &mut PgConnection, list_id: &str) -> QueryResult<Vec<CidrRow>> {
    cidr::table
        .inner_join(list::table.on(cidr::list_id.eq(list::id)))
        .filter(list::id.eq(list_id))
        .filter(list::enabled.eq(true))
        .select(CidrRow::as_select())
        .order(cidr::id.asc())
        .load(conn)
}

/// Tag-filtered variant of [`cidrs_by_type_for_user`] — OR across the
/// given tag set via array overlap.
pub fn cidrs_by_type_and_tags_for_user(
    conn: &mut PgConnection,
    user_id: uuid::Uuid,
    list_type: ListType,
    tags: &[String],
) -> QueryResult<Vec<CidrRow>> {
    use diesel::dsl::sql;
    use diesel::sql_types::{Array, Bool, Text};

    let mut query = cidr::table
        .inner_join(list::table.on(cidr::list_id.eq(list::id)))
        .filter(list::user_id.eq(user_id))
        .filter(list::enabled.eq(true))
        .filter(list::list_type.eq(list_type))
        .select(CidrRow::as_select())
        .into_boxed();

    if !tags.is_empty() {
        query = query.filter(sql::<Bool>("list.tags && ").bind::<Array<Text>, _>(tags));
    }

    query.order(cidr::id.asc()).load(conn)
}

/// `WHERE list_id = $1 [AND id < $cursor] ORDER BY id DESC LIMIT $limit`.
pub fn paginated_by_list(
    conn: &mut PgConnection,
    list_id: &str,
    cursor: Option<i64>,
    limit: i64,
) -> QueryResult<Vec<CidrRow>> {
    let mut query = cidr::table.filter(cidr::list_id.eq(list_id)).into_boxed();

    if let Some(cursor) = cursor {
        query = query.filter(cidr::id.lt(cursor));
    }

    query.order(cidr::id.desc()).limit(limit).load(conn)
}

/// `DELETE FROM cidr WHERE expires_at < now()` — the TTL reaper's one
/// statement.
pub fn delete_expired(conn: &mut PgConnection) -> QueryResult<usize> {
    diesel::delete(cidr::table.filter(cidr::expires_at.lt(now))).execute(conn)
}
