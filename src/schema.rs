//! Diesel table definitions for the four tables this service owns.
//!
//! Hand-written rather than generated by `diesel print-schema`, matching
//! `migrations/0001_init.sql` exactly. `_migrations` itself has no model —
//! it's only ever touched by `db::migrations` via raw SQL.

diesel::table! {
    user_login (id) {
        id -> Uuid,
        login -> Text,
        salt -> Text,
        hashed_password -> Text,
        role -> Text,
        created_at -> Timestamptz,
        updated_at -> Timestamptz,
    }
}

diesel::table! {
    list (id) {
        id -> Text,
        user_id -> Uuid,
        list_type -> Text,
        enabled -> Bool,
        tags -> Array<Text>,
        description -> Text,
        created_at -> Timestamptz,
        updated_at -> Timestamptz,
    }
}

diesel::table! {
    cidr (id) {
        id -> Int8,
        address -> Inet,
        list_id -> Text,
        expires_at -> Nullable<Timestamptz>,
        created_at -> Timestamptz,
        updated_at -> Timestamptz,
    }
}

diesel::table! {
    job_queue (id) {
        id -> Int8,
        job_id -> Uuid,
        payload -> Jsonb,
    }
}

diesel::joinable!(list -> user_login (user_id));
diesel::joinable!(cidr -> list (list_id));

diesel::allow_tables_to_appear_in_same_query!(user_login, list, cidr, job_queue,);
