use chrono::{DateTime, Utc};
use diesel::prelude::*;
use ipnetwork::IpNetwork;
use serde::Serialize;

use crate::schema::cidr;

/// A stored CIDR row. `address` is always canonical network form — host
/// bits zero — by construction: every writer of this table goes through
/// `net::parse` first.
#[derive(Debug, Clone, Queryable, Identifiable, Selectable, Serialize)]
#[diesel(table_name = cidr, check_for_backend(diesel::pg::Pg))]
pub struct CidrRow {
    pub id: i64,
    pub address: IpNetwork,
    pub list_id: String,
    pub expires_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Insertable, AsChangeset)]
#[diesel(table_name = cidr, check_for_backend(diesel::pg::Pg))]
pub struct NewCidr {
    pub address: IpNetwork,
    pub list_id: String,
    pub expires_at: Option<DateTime<Utc>>,
}
