//! Read paths. These bypass the job queue entirely and observe only
//! committed state: read-after-write is not guaranteed for a client that
//! just enqueued a job.

use diesel::{PgConnection, QueryResult};
use ipnetwork::IpNetwork;
use serde::Serialize;
use uuid::Uuid;

use crate::models::{CidrRow, ListType};
use crate::net::range;
use crate::store;

/// `{ipv4: [...], ipv6: [...]}` for `/v1/cidr/collapsed/by-ip-version`.
#[derive(Debug, Default, Clone, Serialize)]
pub struct CollapsedByVersion {
    pub ipv4: Vec<String>,
    pub ipv6: Vec<String>,
}

/// By list type, optionally intersected with a tag set (OR across tags).
pub fn by_type(
    conn: &mut PgConnection,
    user_id: Uuid,
    list_type: ListType,
    tags: &[String],
) -> QueryResult<Vec<CidrRow>> {
    if tags.is_empty() {
        store::cidrs_by_type_for_user(conn, user_id, list_type)
    } else {
        store::cidrs_by_type_and_tags_for_user(conn, user_id, list_type, tags)
    }
}

/// By a specific list, scoped to the caller's own lists.
pub fn by_list(
    conn: &mut PgConnection,
    user_id: Uuid,
    list_id: &str,
    list_type: ListType,
) -> QueryResult<Vec<CidrRow>> {
    store::cidrs_by_list_and_type(conn, user_id, list_id, list_type)
}

/// `WHERE list_id = $1 [AND id < $cursor] ORDER BY id DESC LIMIT $limit`.
pub fn paginated(
    conn: &mut PgConnection,
    list_id: &str,
    cursor: Option<i64>,
    limit: i64,
) -> QueryResult<Vec<CidrRow>> {
    store::paginated_by_list(conn, list_id, cursor, limit)
}

/// Minimal CIDR cover across both address families, as plain strings.
pub fn collapsed(rows: &[CidrRow]) -> Vec<String> {
    let mut nets: Vec<IpNetwork> = rows.iter().map(|row| row.address).collect();
    range::collapse(&mut nets);
    nets.iter().map(IpNetwork::to_string).collect()
}

/// Same as [`collapsed`] but split by address family.
pub fn collapsed_by_version(rows: &[CidrRow]) -> CollapsedByVersion {
    let mut v4 = Vec::new();
    let mut v6 = Vec::new();

    for row in rows {
        match row.address {
            IpNetwork::V4(_) => v4.push(row.address),
            IpNetwork::V6(_) => v6.push(row.address),
        }
    }

    range::collapse(&mut v4);
    range::collapse(&mut v6);

    CollapsedByVersion {
        ipv4: v4.iter().map(IpNetwork::to_string).collect(),
        ipv6: v6.iter().map(IpNetwork::to_string).collect(),
    }
}
