use axum::{
    routing::{get, post},
    Router,
};

use crate::state::AppState;

mod dto;
pub mod handlers;
pub mod repo;

pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/post",
            post(handlers::create_post).get(handlers::all_posts),
        )
        .route(
            "/post/:id",
            get(handlers::detail_post)
                .put(handlers::update_post)
                .delete(handlers::delete_post),
        )
        .route("/user-posts", get(handlers::user_posts))
}
