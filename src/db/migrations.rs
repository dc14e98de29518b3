use diesel::prelude::*;
use diesel::sql_query;
use diesel::sql_types::{Bool, Int4};
use tracing::{info, instrument};

/// The entire schema as one migration. A second migration would be added
/// as a sibling `NNNN_*.sql` file plus another `current_version < N` arm
/// below — not attempted here since the schema has never changed.
const MIGRATION_0001: &str = include_str!("../../migrations/0001_init.sql");

#[derive(QueryableByName)]
struct Exists {
    #[diesel(sql_type = Bool)]
    exists: bool,
}

#[derive(QueryableByName)]
struct CurrentVersion {
    #[diesel(sql_type = Int4)]
    version: i32,
}

/// Hand-rolled migration runner tracking applied versions in a literal
/// `_migrations(version, created_at, updated_at)` table, rather than
/// `diesel_migrations`' own bookkeeping table: check whether `_migrations`
/// exists, read the current version, and apply every migration numbered
/// higher than it.
#[instrument(skip(conn))]
pub fn run_migrations(conn: &mut PgConnection) -> QueryResult<()> {
    let exists: Exists = sql_query(
        "SELECT EXISTS ( \
            SELECT FROM pg_tables WHERE schemaname = 'public' AND tablename = '_migrations' \
         ) AS exists",
    )
    .get_result(conn)?;

    let current_version = if exists.exists {
        let row: CurrentVersion = sql_query("SELECT version FROM _migrations").get_result(conn)?;
        row.version
    } else {
        0
    };

    if current_version < 1 {
        info!(version = 1, "applying migration 0001_init");
        sql_query(MIGRATION_0001).execute(conn)?;
    }

    Ok(())
}
