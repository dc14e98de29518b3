//! This crate implements the backend server for the CIDR listing
//! service: user-scoped DENY/SAFE network lists, their asynchronous
//! add/delete/update job pipeline, and the thin HTTP surface above it.
//!
//! The CIDR set-algebra engine lives in [`net`]; the durable job queue and
//! its three processors live in [`jobs`]; the TTL reaper lives in
//! [`scheduler`]; the read paths live in [`query`].

#![warn(clippy::all, rust_2018_idioms)]
#![allow(clippy::extra_unused_lifetimes)]

#[macro_use]
extern crate diesel;

pub mod app;
pub mod auth;
pub mod boot;
pub mod config;
pub mod controllers;
pub mod db;
pub mod errors;
pub mod jobs;
pub mod middleware;
pub mod models;
pub mod net;
pub mod query;
pub mod router;
pub mod scheduler;
pub mod schema;
pub mod store;

pub use crate::app::AppState;

/// Used for setting different values depending on whether the app is run
/// in production, in development, or for testing.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum Env {
    Development,
    Test,
    Production,
}

/// Builds the full axum `Router`, wiring the route table onto the
/// middleware stack (`src/bin/server.rs` calls this once at boot).
pub fn build_handler(state: AppState) -> axum::Router {
    let axum_router = router::build_axum_router();
    middleware::apply_axum_middleware(state, axum_router)
}
