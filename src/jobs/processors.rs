use std::collections::HashMap;

use chrono::{DateTime, Duration, Utc};
use diesel::PgConnection;
use ipnetwork::IpNetwork;

use crate::jobs::JobError;
use crate::models::{CidrJob, CidrRow, ListType, NewCidr};
use crate::net::{parse, range};
use crate::store;

/// Applies an `add` job: parses the raw CIDRs, excludes any overlap with
/// the opposing list type, and upserts the remainder.
pub fn add_cidrs(conn: &mut PgConnection, job: &CidrJob, only_global: bool) -> Result<(), JobError> {
    let parsed = parse::parse_raw(&job.cidrs, only_global);
    if parsed.is_empty() {
        return Ok(());
    }

    let expires_at = job.ttl.map(|ttl| Utc::now() + Duration::seconds(ttl));

    let (v4, v6) = match job.list_type {
        ListType::Deny => {
            let safe_rows = store::cidrs_by_type_for_user(conn, job.user_id, ListType::Safe)?;
            let (safe_v4, safe_v6) = split_by_version(&safe_rows);

            let v4 = parsed
                .ipv4
                .iter()
                .flat_map(|net| range::exclude_many(*net, &safe_v4))
                .collect();
            let v6 = parsed
                .ipv6
                .iter()
                .flat_map(|net| range::exclude_many(*net, &safe_v6))
                .collect();
            (v4, v6)
        }
        ListType::Safe if job.list_enabled => {
            let deny_rows = store::cidrs_by_type_for_user(conn, job.user_id, ListType::Deny)?;
            cleanup(conn, &parsed.ipv4, &parsed.ipv6, deny_rows)?;
            (parsed.ipv4.clone(), parsed.ipv6.clone())
        }
        ListType::Safe => (parsed.ipv4.clone(), parsed.ipv6.clone()),
    };

    let rows: Vec<NewCidr> = v4
        .into_iter()
        .chain(v6)
        .map(|address| NewCidr { address, list_id: job.list_id.clone(), expires_at })
        .collect();

    store::upsert_cidrs(conn, &rows)?;
    Ok(())
}

/// Applies a `delete` job. `only_global` is always `false` here — users
/// may delete addresses they stored under a looser policy than is
/// currently configured.
pub fn delete_cidrs(conn: &mut PgConnection, job: &CidrJob) -> Result<(), JobError> {
    let parsed = parse::parse_raw(&job.cidrs, false);
    if parsed.is_empty() {
        return Ok(());
    }

    let scope = store::cidrs_for_list(conn, &job.list_id)?;
    cleanup(conn, &parsed.ipv4, &parsed.ipv6, scope)?;
    Ok(())
}

/// Applies an `update` (cleanup) job, enqueued when a SAFE list flips
/// disabled→enabled.
pub fn update_cleanup(conn: &mut PgConnection, job: &CidrJob) -> Result<(), JobError> {
    if job.list_type != ListType::Safe {
        return Err(JobError::InvalidUpdateTarget);
    }

    let own_rows = store::enabled_cidrs_for_list(conn, &job.list_id)?;
    let (mut v4, mut v6) = split_by_version(&own_rows);
    range::collapse(&mut v4);
    range::collapse(&mut v6);

    let deny_rows = store::cidrs_by_type_for_user(conn, job.user_id, ListType::Deny)?;
    cleanup(conn, &v4, &v6, deny_rows)?;
    Ok(())
}

fn split_by_version(rows: &[CidrRow]) -> (Vec<IpNetwork>, Vec<IpNetwork>) {
    let mut v4 = Vec::new();
    let mut v6 = Vec::new();
    for row in rows {
        match row.address {
            IpNetwork::V4(_) => v4.push(row.address),
            IpNetwork::V6(_) => v6.push(row.address),
        }
    }
    (v4, v6)
}

/// The cleanup subroutine shared by the SAFE-addition branch of `ADD`,
/// `DELETE`, and `UPDATE`: strips `exclusion_{v4,v6}` out of every row in
/// `scope`, deleting rows that change and upserting their remainder (if
/// any) with the parent's `expires_at` inherited by every fragment.
fn cleanup(
    conn: &mut PgConnection,
    exclusion_v4: &[IpNetwork],
    exclusion_v6: &[IpNetwork],
    scope: Vec<CidrRow>,
) -> Result<(), JobError> {
    let mut deletes: HashMap<String, Vec<IpNetwork>> = HashMap::new();
    let mut upserts: Vec<NewCidr> = Vec::new();

    for row in scope {
        let exclusions = match row.address {
            IpNetwork::V4(_) => exclusion_v4,
            IpNetwork::V6(_) => exclusion_v6,
        };

        let remaining = range::exclude_many(row.address, exclusions);
        let unchanged = remaining.len() == 1 && remaining[0] == row.address;

        if unchanged {
            upserts.push(new_cidr(row.address, &row.list_id, row.expires_at));
            continue;
        }

        deletes.entry(row.list_id.clone()).or_default().push(row.address);
        for fragment in remaining {
            upserts.push(new_cidr(fragment, &row.list_id, row.expires_at));
        }
    }

    for (list_id, addresses) in &deletes {
        store::delete_cidrs(conn, list_id, addresses)?;
    }
    store::upsert_cidrs(conn, &upserts)?;

    Ok(())
}

fn new_cidr(address: IpNetwork, list_id: &str, expires_at: Option<DateTime<Utc>>) -> NewCidr {
    NewCidr { address, list_id: list_id.to_string(), expires_at }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn split_by_version_separates_families() {
        let rows = vec![
            CidrRow {
                id: 1,
                address: "10.0.0.0/24".parse().unwrap(),
                list_id: "A".into(),
                expires_at: None,
                created_at: Utc::now(),
                updated_at: Utc::now(),
            },
            CidrRow {
                id: 2,
                address: "2001:db8::/32".parse().unwrap(),
                list_id: "A".into(),
                expires_at: None,
                created_at: Utc::now(),
                updated_at: Utc::now(),
            },
        ];

        let (v4, v6) = split_by_version(&rows);
        assert_eq!(v4.len(), 1);
        assert_eq!(v6.len(), 1);
    }
}
