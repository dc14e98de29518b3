//! Route table for the `/v1` HTTP surface.

use axum::routing::{get, post, put};
use axum::Router;

use crate::app::AppState;
use crate::controllers::{auth, cidrs, lists};

pub fn build_axum_router() -> Router<AppState> {
    Router::new()
        .route("/v1/auth/token", post(auth::issue_token))
        .route("/v1/auth/password", put(auth::change_password))
        .route("/v1/admin/signup", post(auth::signup))
        .route("/v1/list", get(lists::list_all).post(lists::create_list))
        .route(
            "/v1/list/:id",
            get(lists::get_list).put(lists::update_list).delete(lists::delete_list),
        )
        .route("/v1/list/:id/cidr", get(lists::list_cidrs))
        .route("/v1/list/:id/cidr/add", post(cidrs::add_cidrs))
        .route("/v1/list/:id/cidr/delete", post(cidrs::delete_cidrs))
        .route("/v1/list/:id/cidr/add/raw", post(cidrs::add_cidrs_raw))
        .route("/v1/list/:id/cidr/delete/raw", post(cidrs::delete_cidrs_raw))
        .route("/v1/cidr/", get(cidrs::get_cidrs))
        .route("/v1/cidr/collapsed", get(cidrs::get_cidrs_collapsed))
        .route(
            "/v1/cidr/collapsed/by-ip-version",
            get(cidrs::get_cidrs_collapsed_by_version),
        )
}
