use chrono::{DateTime, Utc};
use diesel::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::schema::list;

pub const MAX_LIST_ID_LEN: usize = 64;
pub const MAX_TAG_LEN: usize = 16;
pub const MAX_DESCRIPTION_LEN: usize = 256;

pub const LIST_ID_PATTERN: &str = r"^[A-Z][A-Z0-9_]*$";
pub const TAG_PATTERN: &str = r"^[A-Z][A-Z0-9]*$";

/// Every list implicitly carries this tag.
pub const DEFAULT_TAG: &str = "DEFAULT";

/// DENY (block) or SAFE (allow). Dispatches the polarity-specific behavior
/// in `jobs::processors::add_cidrs` — a sum type rather than a trait
/// hierarchy, since the two variants share every field and differ only in
/// how `add_cidrs` treats them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, AsExpression, FromSqlRow)]
#[diesel(sql_type = diesel::sql_types::Text)]
pub enum ListType {
    #[serde(rename = "DENY")]
    Deny,
    #[serde(rename = "SAFE")]
    Safe,
}

impl ListType {
    pub fn as_str(self) -> &'static str {
        match self {
            ListType::Deny => "DENY",
            ListType::Safe => "SAFE",
        }
    }
}

impl diesel::serialize::ToSql<diesel::sql_types::Text, diesel::pg::Pg> for ListType {
    fn to_sql<'b>(
        &'b self,
        out: &mut diesel::serialize::Output<'b, '_, diesel::pg::Pg>,
    ) -> diesel::serialize::Result {
        diesel::serialize::ToSql::<diesel::sql_types::Text, diesel::pg::Pg>::to_sql(self.as_str(), out)
    }
}

impl diesel::deserialize::FromSql<diesel::sql_types::Text, diesel::pg::Pg> for ListType {
    fn from_sql(bytes: diesel::pg::PgValue<'_>) -> diesel::deserialize::Result<Self> {
        let s = <String as diesel::deserialize::FromSql<diesel::sql_types::Text, diesel::pg::Pg>>::from_sql(bytes)?;
        match s.as_str() {
            "DENY" => Ok(ListType::Deny),
            "SAFE" => Ok(ListType::Safe),
            other => Err(format!("unknown list_type: {other}").into()),
        }
    }
}

#[derive(Debug, Clone, Queryable, Identifiable, Selectable, Serialize)]
#[diesel(table_name = list, check_for_backend(diesel::pg::Pg))]
pub struct List {
    pub id: String,
    pub user_id: Uuid,
    pub list_type: ListType,
    pub enabled: bool,
    pub tags: Vec<String>,
    pub description: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = list, check_for_backend(diesel::pg::Pg))]
pub struct NewList<'a> {
    pub id: &'a str,
    pub user_id: Uuid,
    pub list_type: ListType,
    pub enabled: bool,
    pub tags: Vec<String>,
    pub description: &'a str,
}

#[derive(Debug, AsChangeset)]
#[diesel(table_name = list, check_for_backend(diesel::pg::Pg))]
pub struct ListChanges {
    pub list_type: ListType,
    pub enabled: bool,
    pub tags: Vec<String>,
    pub description: String,
}

/// Forces `DEFAULT` into a tag set: every list insert or tag update must
/// leave `DEFAULT` present.
pub fn with_default_tag(mut tags: Vec<String>) -> Vec<String> {
    if !tags.iter().any(|t| t == DEFAULT_TAG) {
        tags.push(DEFAULT_TAG.to_string());
    }
    tags.sort();
    tags.dedup();
    tags
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn with_default_tag_adds_default_once() {
        assert_eq!(with_default_tag(vec![]), vec!["DEFAULT".to_string()]);
        assert_eq!(
            with_default_tag(vec!["TAG1".to_string(), "DEFAULT".to_string()]),
            vec!["DEFAULT".to_string(), "TAG1".to_string()]
        );
    }
}
