use axum::{
    routing::{get, post, put},
    Router,
};
use std::sync::Arc;

use crate::features::users::handlers::{add_org_membership, get_me, upsert_user};
use crate::features::users::services::UserService;

/// Caller-facing user routes
pub fn routes(user_service: Arc<UserService>) -> Router {
    Router::new()
        .route("/api/users/me", get(get_me))
        .with_state(user_service)
}

/// Identity-sync routes; mounted behind basic auth in `main`
pub fn internal_routes(user_service: Arc<UserService>) -> Router {
    Router::new()
        .route("/internal/users", put(upsert_user))
        .route("/internal/users/org-memberships", post(add_org_membership))
        .with_state(user_service)
}
