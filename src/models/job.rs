use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::list::ListType;

/// What a `CidrJob` asks the worker to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Action {
    Add,
    Delete,
    Update,
}

/// The payload stored in `job_queue.payload`.
///
/// `cidrs` is empty for `Action::Update` jobs — the processor reloads the
/// SAFE list's current CIDRs itself, since the set may have grown between
/// admission and drain.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CidrJob {
    pub job_id: Uuid,
    pub action: Action,
    pub list_id: String,
    pub list_type: ListType,
    pub list_enabled: bool,
    pub user_id: Uuid,
    pub cidrs: Vec<String>,
    pub ttl: Option<i64>,
}

impl CidrJob {
    pub fn new_add(
        list_id: impl Into<String>,
        list_type: ListType,
        list_enabled: bool,
        user_id: Uuid,
        cidrs: Vec<String>,
        ttl: Option<i64>,
    ) -> Self {
        CidrJob {
            job_id: Uuid::new_v4(),
            action: Action::Add,
            list_id: list_id.into(),
            list_type,
            list_enabled,
            user_id,
            cidrs,
            ttl,
        }
    }

    pub fn new_delete(
        list_id: impl Into<String>,
        list_type: ListType,
        list_enabled: bool,
        user_id: Uuid,
        cidrs: Vec<String>,
    ) -> Self {
        CidrJob {
            job_id: Uuid::new_v4(),
            action: Action::Delete,
            list_id: list_id.into(),
            list_type,
            list_enabled,
            user_id,
            cidrs,
            ttl: None,
        }
    }

    pub fn new_update_cleanup(list_id: impl Into<String>, user_id: Uuid) -> Self {
        CidrJob {
            job_id: Uuid::new_v4(),
            action: Action::Update,
            list_id: list_id.into(),
            list_type: ListType::Safe,
            list_enabled: true,
            user_id,
            cidrs: vec![],
            ttl: None,
        }
    }
}
