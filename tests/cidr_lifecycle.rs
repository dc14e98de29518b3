//! Database-backed integration tests for the job pipeline, exercising the
//! concrete scenarios from `spec.md` §8 against a real (per-test) Postgres
//! database rather than mocking the store layer.
//!
//! Each test spins up its own database via `cidrlist_test_db::TestDatabase`
//! (a clone of a migrated template, dropped on `Drop`), so tests never see
//! each other's rows and can reuse list ids freely despite `list.id` being
//! globally unique.

use cidrlist::jobs;
use cidrlist::models::{CidrJob, ListType, NewList, NewUser, Role};
use cidrlist::net::range;
use cidrlist::query;
use cidrlist::store;
use cidrlist_test_db::TestDatabase;
use diesel::PgConnection;
use ipnetwork::IpNetwork;
use uuid::Uuid;

fn new_user(conn: &mut PgConnection) -> Uuid {
    let id = Uuid::new_v4();
    let new_user = NewUser {
        id,
        login: format!("u{}", id.simple()),
        salt: "salt".to_string(),
        hashed_password: "hash".to_string(),
        role: Role::User,
    };
    store::insert_user(conn, &new_user).unwrap();
    id
}

fn new_list(conn: &mut PgConnection, id: &str, user_id: Uuid, list_type: ListType, enabled: bool, tags: Vec<String>) {
    let new_list = NewList { id, user_id, list_type, enabled, tags, description: "" };
    assert_eq!(store::insert_list(conn, &new_list).unwrap(), store::Inserted::Created);
}

fn list_addresses(conn: &mut PgConnection, list_id: &str) -> Vec<String> {
    let mut addrs: Vec<String> = store::cidrs_for_list(conn, list_id)
        .unwrap()
        .into_iter()
        .map(|row| row.address.to_string())
        .collect();
    addrs.sort();
    addrs
}

#[test]
fn safe_masks_deny_on_add() {
    let db = TestDatabase::new();
    let mut conn = db.connect();

    let user_id = new_user(&mut conn);
    new_list(&mut conn, "SAFE_A", user_id, ListType::Safe, true, vec![]);
    new_list(&mut conn, "DENY_A", user_id, ListType::Deny, true, vec![]);

    let safe_net: IpNetwork = "13.1.0.0/16".parse().unwrap();
    store::upsert_cidrs(
        &mut conn,
        &[cidrlist::models::NewCidr { address: safe_net, list_id: "SAFE_A".into(), expires_at: None }],
    )
    .unwrap();

    let job = CidrJob::new_add("DENY_A".into(), ListType::Deny, true, user_id, vec!["13.1.1.0/24".into()], None);
    jobs::process(&mut conn, &job, true).unwrap();

    assert!(list_addresses(&mut conn, "DENY_A").is_empty());
}

#[test]
fn safe_added_later_splits_deny() {
    let db = TestDatabase::new();
    let mut conn = db.connect();

    let user_id = new_user(&mut conn);
    new_list(&mut conn, "DENY_B", user_id, ListType::Deny, true, vec![]);
    new_list(&mut conn, "SAFE_B", user_id, ListType::Safe, true, vec![]);

    let deny_net: IpNetwork = "66.66.1.0/24".parse().unwrap();
    store::upsert_cidrs(
        &mut conn,
        &[cidrlist::models::NewCidr { address: deny_net, list_id: "DENY_B".into(), expires_at: None }],
    )
    .unwrap();

    let job = CidrJob::new_add("SAFE_B".into(), ListType::Safe, true, user_id, vec!["66.66.1.0/26".into()], None);
    jobs::process(&mut conn, &job, true).unwrap();

    assert_eq!(
        list_addresses(&mut conn, "DENY_B"),
        vec!["66.66.1.128/25".to_string(), "66.66.1.64/26".to_string()]
    );
}

#[test]
fn split_fragments_inherit_parent_ttl() {
    let db = TestDatabase::new();
    let mut conn = db.connect();

    let user_id = new_user(&mut conn);
    new_list(&mut conn, "DENY_TTL", user_id, ListType::Deny, true, vec![]);
    new_list(&mut conn, "SAFE_TTL", user_id, ListType::Safe, true, vec![]);

    let add_job = CidrJob::new_add(
        "DENY_TTL".into(),
        ListType::Deny,
        true,
        user_id,
        vec!["66.66.1.0/24".into()],
        Some(3600),
    );
    jobs::process(&mut conn, &add_job, true).unwrap();

    let split_job =
        CidrJob::new_add("SAFE_TTL".into(), ListType::Safe, true, user_id, vec!["66.66.1.0/26".into()], None);
    jobs::process(&mut conn, &split_job, true).unwrap();

    let rows = store::cidrs_for_list(&mut conn, "DENY_TTL").unwrap();
    assert_eq!(rows.len(), 2);
    assert!(rows.iter().all(|row| row.expires_at.is_some()));
}

#[test]
fn disabled_safe_does_not_split_until_enabled() {
    let db = TestDatabase::new();
    let mut conn = db.connect();

    let user_id = new_user(&mut conn);
    new_list(&mut conn, "DENY_C", user_id, ListType::Deny, true, vec![]);
    new_list(&mut conn, "SAFE_C", user_id, ListType::Safe, false, vec![]);

    let add_job = CidrJob::new_add("DENY_C".into(), ListType::Deny, true, user_id, vec!["66.66.1.0/24".into()], None);
    jobs::process(&mut conn, &add_job, true).unwrap();

    assert_eq!(list_addresses(&mut conn, "DENY_C"), vec!["66.66.1.0/24".to_string()]);

    // The admission layer would enqueue this when the list flips
    // disabled -> enabled (see `controllers::lists::update_list`); here we
    // enqueue and drain it directly, mirroring what that handler does in
    // one transaction.
    store::update_list(
        &mut conn,
        "SAFE_C",
        user_id,
        &cidrlist::models::ListChanges {
            list_type: ListType::Safe,
            enabled: true,
            tags: vec!["DEFAULT".into()],
            description: String::new(),
        },
    )
    .unwrap();
    store::upsert_cidrs(
        &mut conn,
        &[cidrlist::models::NewCidr {
            address: "66.66.1.0/26".parse().unwrap(),
            list_id: "SAFE_C".into(),
            expires_at: None,
        }],
    )
    .unwrap();

    let update_job = CidrJob::new_update_cleanup("SAFE_C".into(), user_id);
    jobs::process(&mut conn, &update_job, true).unwrap();

    assert_eq!(
        list_addresses(&mut conn, "DENY_C"),
        vec!["66.66.1.128/25".to_string(), "66.66.1.64/26".to_string()]
    );
}

#[test]
fn update_cleanup_skips_a_list_disabled_again_before_processing() {
    let db = TestDatabase::new();
    let mut conn = db.connect();

    let user_id = new_user(&mut conn);
    new_list(&mut conn, "DENY_C2", user_id, ListType::Deny, true, vec![]);
    new_list(&mut conn, "SAFE_C2", user_id, ListType::Safe, true, vec![]);

    let add_job =
        CidrJob::new_add("DENY_C2".into(), ListType::Deny, true, user_id, vec!["66.66.1.0/24".into()], None);
    jobs::process(&mut conn, &add_job, true).unwrap();

    store::upsert_cidrs(
        &mut conn,
        &[cidrlist::models::NewCidr {
            address: "66.66.1.0/26".parse().unwrap(),
            list_id: "SAFE_C2".into(),
            expires_at: None,
        }],
    )
    .unwrap();

    // The cleanup job was enqueued while SAFE_C2 was enabled, but the list
    // flips back to disabled before a worker gets to it. The cleanup must
    // see the list's *current* state and do nothing, rather than splitting
    // DENY_C2 against CIDRs of a now-disabled SAFE list.
    store::update_list(
        &mut conn,
        "SAFE_C2",
        user_id,
        &cidrlist::models::ListChanges {
            list_type: ListType::Safe,
            enabled: false,
            tags: vec![],
            description: String::new(),
        },
    )
    .unwrap();

    let update_job = CidrJob::new_update_cleanup("SAFE_C2".into(), user_id);
    jobs::process(&mut conn, &update_job, true).unwrap();

    assert_eq!(list_addresses(&mut conn, "DENY_C2"), vec!["66.66.1.0/24".to_string()]);
}

#[test]
fn delete_summarises_remainder_within_the_same_list() {
    let db = TestDatabase::new();
    let mut conn = db.connect();

    let user_id = new_user(&mut conn);
    new_list(&mut conn, "DENY_D", user_id, ListType::Deny, true, vec![]);

    let add_job = CidrJob::new_add("DENY_D".into(), ListType::Deny, true, user_id, vec!["10.0.0.0/16".into()], None);
    jobs::process(&mut conn, &add_job, true).unwrap();

    let delete_job = CidrJob::new_delete("DENY_D".into(), ListType::Deny, true, user_id, vec!["10.0.0.0/24".into()]);
    jobs::process(&mut conn, &delete_job, false).unwrap();

    let remaining = list_addresses(&mut conn, "DENY_D");
    let mut nets: Vec<IpNetwork> = remaining.iter().map(|s| s.parse().unwrap()).collect();
    range::collapse(&mut nets);
    assert_eq!(nets, vec!["10.0.1.0/24".parse::<IpNetwork>().unwrap(), "10.0.2.0/23".parse::<IpNetwork>().unwrap(), "10.0.4.0/22".parse::<IpNetwork>().unwrap(), "10.0.8.0/21".parse::<IpNetwork>().unwrap(), "10.0.16.0/20".parse::<IpNetwork>().unwrap(), "10.0.32.0/19".parse::<IpNetwork>().unwrap(), "10.0.64.0/18".parse::<IpNetwork>().unwrap(), "10.0.128.0/17".parse::<IpNetwork>().unwrap()]);
}

#[test]
fn adding_the_same_cidr_twice_is_idempotent() {
    let db = TestDatabase::new();
    let mut conn = db.connect();

    let user_id = new_user(&mut conn);
    new_list(&mut conn, "DENY_E", user_id, ListType::Deny, true, vec![]);

    let job = CidrJob::new_add("DENY_E".into(), ListType::Deny, true, user_id, vec!["77.0.1.0/24".into()], None);
    jobs::process(&mut conn, &job, true).unwrap();
    jobs::process(&mut conn, &job, true).unwrap();

    assert_eq!(list_addresses(&mut conn, "DENY_E"), vec!["77.0.1.0/24".to_string()]);
}

#[test]
fn tag_intersection_matches_any_shared_tag() {
    let db = TestDatabase::new();
    let mut conn = db.connect();

    let user_id = new_user(&mut conn);
    new_list(
        &mut conn,
        "SAFE_F1",
        user_id,
        ListType::Safe,
        true,
        vec!["TAG1".into(), "COMMON".into()],
    );
    new_list(
        &mut conn,
        "SAFE_F2",
        user_id,
        ListType::Safe,
        true,
        vec!["TAG2".into(), "OK".into(), "COMMON".into()],
    );

    let job_a = CidrJob::new_add("SAFE_F1".into(), ListType::Safe, true, user_id, vec!["1.1.1.0/24".into()], None);
    let job_b = CidrJob::new_add("SAFE_F2".into(), ListType::Safe, true, user_id, vec!["2.2.2.0/24".into()], None);
    jobs::process(&mut conn, &job_a, true).unwrap();
    jobs::process(&mut conn, &job_b, true).unwrap();

    let common = query::by_type(&mut conn, user_id, ListType::Safe, &["COMMON".to_string()]).unwrap();
    assert_eq!(common.len(), 2);

    let tag1_only = query::by_type(&mut conn, user_id, ListType::Safe, &["TAG1".to_string()]).unwrap();
    assert_eq!(tag1_only.len(), 1);

    let none = query::by_type(&mut conn, user_id, ListType::Safe, &["XXX1".to_string()]).unwrap();
    assert!(none.is_empty());
}

#[test]
fn ttl_expired_rows_are_reaped() {
    let db = TestDatabase::new();
    let mut conn = db.connect();

    let user_id = new_user(&mut conn);
    new_list(&mut conn, "DENY_G", user_id, ListType::Deny, true, vec![]);

    let job = CidrJob::new_add("DENY_G".into(), ListType::Deny, true, user_id, vec!["77.0.1.0/24".into()], Some(2));
    jobs::process(&mut conn, &job, true).unwrap();
    assert_eq!(list_addresses(&mut conn, "DENY_G"), vec!["77.0.1.0/24".to_string()]);

    // Before expiry the reaper is a no-op.
    assert_eq!(store::delete_expired(&mut conn).unwrap(), 0);
    assert_eq!(list_addresses(&mut conn, "DENY_G"), vec!["77.0.1.0/24".to_string()]);

    std::thread::sleep(std::time::Duration::from_secs(3));

    assert_eq!(store::delete_expired(&mut conn).unwrap(), 1);
    assert!(list_addresses(&mut conn, "DENY_G").is_empty());
}

#[test]
fn queue_dequeue_is_fifo_and_at_most_once() {
    let db = TestDatabase::new();
    let mut conn = db.connect();

    let user_id = new_user(&mut conn);
    new_list(&mut conn, "DENY_H", user_id, ListType::Deny, true, vec![]);

    let first = CidrJob::new_add("DENY_H".into(), ListType::Deny, true, user_id, vec!["1.1.1.0/24".into()], None);
    let second = CidrJob::new_add("DENY_H".into(), ListType::Deny, true, user_id, vec!["2.2.2.0/24".into()], None);
    store::enqueue(&mut conn, &first).unwrap();
    store::enqueue(&mut conn, &second).unwrap();

    // `DELETE ... RETURNING` doesn't promise the subquery's `ORDER BY id` is
    // reflected in the returned row order, so only the set membership (not
    // the order) is asserted here — ordering is "best-effort" per spec.md §4.4.
    let batch = store::dequeue_batch(&mut conn).unwrap();
    let ids: Vec<Uuid> = batch.iter().map(|row| row.job().unwrap().job_id).collect();
    assert_eq!(ids.len(), 2);
    assert!(ids.contains(&first.job_id));
    assert!(ids.contains(&second.job_id));

    // The rows are gone: a second dequeue sees nothing left.
    assert!(store::dequeue_batch(&mut conn).unwrap().is_empty());
}

#[test]
fn global_list_id_uniqueness_is_enforced_across_users() {
    let db = TestDatabase::new();
    let mut conn = db.connect();

    let user_a = new_user(&mut conn);
    let user_b = new_user(&mut conn);

    new_list(&mut conn, "SHARED_ID", user_a, ListType::Deny, true, vec![]);

    let collision = NewList {
        id: "SHARED_ID",
        user_id: user_b,
        list_type: ListType::Deny,
        enabled: true,
        tags: vec![],
        description: "",
    };
    assert_eq!(store::insert_list(&mut conn, &collision).unwrap(), store::Inserted::AlreadyExists);
}
