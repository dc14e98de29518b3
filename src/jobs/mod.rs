//! The asynchronous job pipeline: the three processors (`ADD`, `DELETE`,
//! `UPDATE`) and the worker loop that drains the durable queue.

pub mod processors;
pub mod worker;

use diesel::PgConnection;
use thiserror::Error;

use crate::models::{Action, CidrJob};

pub use worker::CidrWorker;

#[derive(Debug, Error)]
pub enum JobError {
    #[error("database error: {0}")]
    Db(#[from] diesel::result::Error),
    #[error("malformed job payload")]
    MalformedPayload,
    #[error("update (cleanup) job targeted a non-SAFE list")]
    InvalidUpdateTarget,
}

/// Dispatches a dequeued job to its processor.
pub fn process(conn: &mut PgConnection, job: &CidrJob, only_global: bool) -> Result<(), JobError> {
    match job.action {
        Action::Add => processors::add_cidrs(conn, job, only_global),
        Action::Delete => processors::delete_cidrs(conn, job),
        Action::Update => processors::update_cleanup(conn, job),
    }
}
