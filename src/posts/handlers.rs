use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection},
        Path, Query, State,
    },
    http::StatusCode,
    Json,
};
use serde_json::json;
use tracing::{error, info, instrument, warn};

use crate::{
    auth::jwt::AuthUser,
    error::ApiError,
    posts::{
        dto::{CreatePostRequest, ListQuery, PageMeta, PostResponse, UpdatePostRequest},
        repo::{self, Post},
    },
    state::AppState,
};

fn store_err(e: sqlx::Error, message: &str) -> ApiError {
    error!(error = %e, "database error");
    ApiError::Store(message.into())
}

fn parse_post_id(id: Result<Path<i64>, PathRejection>) -> Result<i64, ApiError> {
    let Path(id) = id.map_err(|e| {
        warn!(error = %e, "invalid post id");
        ApiError::Validation("Invalid post ID".into())
    })?;
    Ok(id)
}

/// Mutation and deletion require the acting identity to equal the post's
/// recorded owner. Reads are unrestricted.
fn ensure_owner(user_id: i64, post: &Post, action: &str) -> Result<(), ApiError> {
    if post.user_id != user_id {
        warn!(
            user_id,
            post_id = post.id,
            owner_id = post.user_id,
            "ownership check failed"
        );
        return Err(ApiError::Forbidden(format!(
            "Unauthorized to {action} this post"
        )));
    }
    Ok(())
}

#[instrument(skip(state, payload))]
pub async fn create_post(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    payload: Result<Json<CreatePostRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<serde_json::Value>), ApiError> {
    let Json(payload) = payload.map_err(|e| {
        warn!(error = %e, "unable to parse body");
        ApiError::Validation("Invalid request body".into())
    })?;

    let post = repo::create(
        &state.db,
        user_id,
        &payload.title,
        &payload.description,
        &payload.image,
    )
    .await
    .map_err(|e| store_err(e, "Failed to create post"))?;

    info!(post_id = post.id, user_id, "post created");
    Ok((
        StatusCode::CREATED,
        Json(json!({
            "data": PostResponse::from(post),
            "message": "Post created successfully",
        })),
    ))
}

#[instrument(skip(state))]
pub async fn all_posts(
    State(state): State<AppState>,
    AuthUser(_user_id): AuthUser,
    Query(q): Query<ListQuery>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let mut page = q.page;
    let mut per_page = q.per_page;
    if per_page < 1 {
        per_page = 10;
    }

    // page 0 disables paging and returns every row
    let fetch_all = page == 0;
    if fetch_all {
        page = 1;
    }
    let offset = ((page - 1) * per_page).max(0);
    let limit = if fetch_all { None } else { Some(per_page) };

    let posts = repo::list_paged(&state.db, limit, offset)
        .await
        .map_err(|e| store_err(e, "Failed to retrieve posts"))?;
    let total = repo::count_all(&state.db)
        .await
        .map_err(|e| store_err(e, "Failed to count posts"))?;

    let meta = PageMeta::compute(page, per_page, total, fetch_all);
    let data: Vec<PostResponse> = posts.into_iter().map(PostResponse::from).collect();
    Ok(Json(json!({
        "data": data,
        "message": "Posts fetched successfully",
        "meta": meta,
    })))
}

#[instrument(skip(state, id))]
pub async fn detail_post(
    State(state): State<AppState>,
    AuthUser(_user_id): AuthUser,
    id: Result<Path<i64>, PathRejection>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let id = parse_post_id(id)?;

    let post = repo::find_detail(&state.db, id)
        .await
        .map_err(|e| store_err(e, "Failed to retrieve post"))?
        .ok_or_else(|| ApiError::NotFound("Post not found".into()))?;

    Ok(Json(json!({ "data": PostResponse::from(post) })))
}

#[instrument(skip(state, id, payload))]
pub async fn update_post(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    id: Result<Path<i64>, PathRejection>,
    payload: Result<Json<UpdatePostRequest>, JsonRejection>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let id = parse_post_id(id)?;
    let Json(payload) = payload.map_err(|e| {
        warn!(error = %e, "unable to parse body");
        ApiError::Validation("Invalid request body".into())
    })?;

    let post = repo::find_by_id(&state.db, id)
        .await
        .map_err(|e| store_err(e, "Failed to retrieve post"))?
        .ok_or_else(|| ApiError::NotFound("Post not found".into()))?;

    ensure_owner(user_id, &post, "update")?;

    repo::update(
        &state.db,
        id,
        payload.title.as_deref(),
        payload.description.as_deref(),
        payload.image.as_deref(),
    )
    .await
    .map_err(|e| store_err(e, "Failed to update post"))?;

    info!(post_id = id, user_id, "post updated");
    Ok(Json(json!({ "message": "Post updated successfully" })))
}

#[instrument(skip(state))]
pub async fn user_posts(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> Result<Json<serde_json::Value>, ApiError> {
    let posts = repo::list_by_user(&state.db, user_id)
        .await
        .map_err(|e| store_err(e, "Failed to retrieve posts"))?;

    let data: Vec<PostResponse> = posts.into_iter().map(PostResponse::from).collect();
    Ok(Json(json!({ "data": data })))
}

#[instrument(skip(state, id))]
pub async fn delete_post(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    id: Result<Path<i64>, PathRejection>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let id = parse_post_id(id)?;

    let post = repo::find_by_id(&state.db, id)
        .await
        .map_err(|e| store_err(e, "Failed to retrieve post"))?
        .ok_or_else(|| ApiError::NotFound("Post not found".into()))?;

    ensure_owner(user_id, &post, "delete")?;

    repo::delete(&state.db, id)
        .await
        .map_err(|e| store_err(e, "Failed to delete post"))?;

    info!(post_id = id, user_id, "post deleted");
    Ok(Json(json!({ "message": "Post deleted successfully" })))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_post(owner: i64) -> Post {
        Post {
            id: 1,
            title: "title".into(),
            description: "desc".into(),
            image: "image.png".into(),
            user_id: owner,
        }
    }

    #[test]
    fn owner_may_mutate() {
        assert!(ensure_owner(5, &sample_post(5), "update").is_ok());
    }

    #[test]
    fn non_owner_is_forbidden() {
        let err = ensure_owner(6, &sample_post(5), "update").unwrap_err();
        match err {
            ApiError::Forbidden(msg) => {
                assert_eq!(msg, "Unauthorized to update this post");
            }
            other => panic!("expected Forbidden, got {other:?}"),
        }
    }

    #[test]
    fn forbidden_message_names_the_action() {
        let err = ensure_owner(6, &sample_post(5), "delete").unwrap_err();
        assert_eq!(err.to_string(), "Unauthorized to delete this post");
    }
}
