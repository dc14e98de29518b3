use chrono::{DateTime, Utc};
use diesel::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::schema::user_login;

/// `USER` vs `SUPERUSER`, matching `auth/schemas.py::UserRoleEnum`.
///
/// Stored as `TEXT` rather than a Postgres enum so that adding a role
/// doesn't require a migration that touches a type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, AsExpression, FromSqlRow)]
#[diesel(sql_type = diesel::sql_types::Text)]
pub enum Role {
    #[serde(rename = "USER")]
    User,
    #[serde(rename = "SUPERUSER")]
    Superuser,
}

impl Role {
    fn as_str(self) -> &'static str {
        match self {
            Role::User => "USER",
            Role::Superuser => "SUPERUSER",
        }
    }
}

impl diesel::serialize::ToSql<diesel::sql_types::Text, diesel::pg::Pg> for Role {
    fn to_sql<'b>(
        &'b self,
        out: &mut diesel::serialize::Output<'b, '_, diesel::pg::Pg>,
    ) -> diesel::serialize::Result {
        diesel::serialize::ToSql::<diesel::sql_types::Text, diesel::pg::Pg>::to_sql(self.as_str(), out)
    }
}

impl diesel::deserialize::FromSql<diesel::sql_types::Text, diesel::pg::Pg> for Role {
    fn from_sql(bytes: diesel::pg::PgValue<'_>) -> diesel::deserialize::Result<Self> {
        let s = <String as diesel::deserialize::FromSql<diesel::sql_types::Text, diesel::pg::Pg>>::from_sql(bytes)?;
        match s.as_str() {
            "USER" => Ok(Role::User),
            "SUPERUSER" => Ok(Role::Superuser),
            other => Err(format!("unknown role: {other}").into()),
        }
    }
}

/// A user of the CIDR listing service, identified by an opaque UUID.
///
/// `salt`/`hashed_password` are never serialised out of the process — every
/// view type that wraps a `User` for an HTTP response excludes them.
#[derive(Debug, Clone, Queryable, Identifiable, Selectable)]
#[diesel(table_name = user_login, check_for_backend(diesel::pg::Pg))]
pub struct User {
    pub id: Uuid,
    pub login: String,
    pub salt: String,
    pub hashed_password: String,
    pub role: Role,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = user_login, check_for_backend(diesel::pg::Pg))]
pub struct NewUser {
    pub id: Uuid,
    pub login: String,
    pub salt: String,
    pub hashed_password: String,
    pub role: Role,
}

/// `login` is `^[a-z][a-z0-9_]*$`, 3-64 chars.
pub const LOGIN_PATTERN: &str = r"^[a-z][a-z0-9_]*$";
pub const MIN_LOGIN_LEN: usize = 3;
pub const MAX_LOGIN_LEN: usize = 64;

pub const MIN_PASSWORD_LEN: usize = 10;
pub const MAX_PASSWORD_LEN: usize = 64;

static LOGIN_RE: once_cell::sync::Lazy<regex::Regex> =
    once_cell::sync::Lazy::new(|| regex::Regex::new(LOGIN_PATTERN).unwrap());

pub fn validate_login(login: &str) -> bool {
    (MIN_LOGIN_LEN..=MAX_LOGIN_LEN).contains(&login.len()) && LOGIN_RE.is_match(login)
}
