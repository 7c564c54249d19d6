pub mod health;

use axum::routing::{delete, get, post, put};
use axum::Router;

use crate::pages;
use crate::posts;
use crate::profile;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(health::root_handler))
        .route("/hello", get(health::hello_handler))
        .route("/health", get(health::health_handler))
        // Pages & summaries
        .route("/pages/user", get(pages::handlers::handle_pages_by_user))
        .route(
            "/get_profile_summary",
            get(profile::handlers::handle_profile_summary),
        )
        // Profile CRUD
        .route("/user/profile", post(profile::handlers::handle_create_profile))
        .route(
            "/user/profile/get",
            get(profile::handlers::handle_get_profile),
        )
        .route(
            "/user/profile/update",
            put(profile::handlers::handle_update_profile),
        )
        .route(
            "/user/profile/delete",
            delete(profile::handlers::handle_delete_profile),
        )
        .route(
            "/user/profile/list",
            get(profile::handlers::handle_list_profiles),
        )
        // Post CRUD, dispatched by op_type
        .route(
            "/user/post",
            get(posts::handlers::handle_user_post)
                .post(posts::handlers::handle_user_post)
                .put(posts::handlers::handle_user_post)
                .delete(posts::handlers::handle_user_post),
        )
        .with_state(state)
}
