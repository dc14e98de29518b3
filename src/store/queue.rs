use diesel::prelude::*;
use diesel::sql_query;
use uuid::Uuid;

use crate::models::CidrJob;
use crate::schema::job_queue;

#[derive(Debug, QueryableByName)]
#[diesel(table_name = job_queue, check_for_backend(diesel::pg::Pg))]
pub struct JobRow {
    pub id: i64,
    pub job_id: Uuid,
    pub payload: serde_json::Value,
}

impl JobRow {
    pub fn job(&self) -> serde_json::Result<CidrJob> {
        serde_json::from_value(self.payload.clone())
    }
}

pub fn enqueue(conn: &mut PgConnection, job: &CidrJob) -> QueryResult<()> {
    let payload = serde_json::to_value(job).expect("CidrJob always serialises");

    diesel::insert_into(job_queue::table)
        .values((job_queue::job_id.eq(job.job_id), job_queue::payload.eq(payload)))
        .execute(conn)?;

    Ok(())
}

/// Atomically claims and removes every row currently visible and
/// unlocked, so two concurrent workers never see the same row.
pub fn dequeue_batch(conn: &mut PgConnection) -> QueryResult<Vec<JobRow>> {
    sql_query(
        "DELETE FROM job_queue USING ( \
            SELECT id FROM job_queue ORDER BY id FOR UPDATE SKIP LOCKED \
         ) q WHERE q.id = job_queue.id RETURNING job_queue.*",
    )
    .load(conn)
}
