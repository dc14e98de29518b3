//! Middleware stack applied to every axum route.
//!
//! This service has no session-backed HTML UI or static asset serving to
//! layer in, so only the request-shaping layers the admission boundary
//! needs are kept — compression, timeouts, panic isolation, and request
//! logging — composed with `tower::ServiceBuilder`.

pub mod log_request;

use std::time::Duration;

use axum::Router;
use tower_http::add_extension::AddExtensionLayer;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::compression::{CompressionLayer, CompressionLevel};
use tower_http::timeout::TimeoutLayer;

use crate::app::AppState;

pub fn apply_axum_middleware(state: AppState, router: Router<AppState>) -> Router {
    let router = router.with_state(state.clone());

    let middleware = tower::ServiceBuilder::new()
        .layer(CompressionLayer::new().quality(CompressionLevel::Fastest))
        .layer(TimeoutLayer::new(Duration::from_secs(30)))
        .layer(axum::middleware::from_fn(log_request::log_requests))
        .layer(CatchPanicLayer::new())
        .layer(AddExtensionLayer::new(state));

    router.layer(middleware)
}
