use serde::{Deserialize, Serialize};

use crate::auth::dto::UserResponse;
use crate::posts::repo::{Post, PostWithOwner};

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CreatePostRequest {
    pub title: String,
    #[serde(rename = "desc")]
    pub description: String,
    pub image: String,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UpdatePostRequest {
    pub title: Option<String>,
    #[serde(rename = "desc")]
    pub description: Option<String>,
    pub image: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PostResponse {
    pub id: i64,
    pub title: String,
    #[serde(rename = "desc")]
    pub description: String,
    pub image: String,
    pub user_id: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user: Option<UserResponse>,
}

impl From<Post> for PostResponse {
    fn from(post: Post) -> Self {
        Self {
            id: post.id,
            title: post.title,
            description: post.description,
            image: post.image,
            user_id: post.user_id,
            user: None,
        }
    }
}

impl From<PostWithOwner> for PostResponse {
    fn from(row: PostWithOwner) -> Self {
        Self {
            id: row.id,
            title: row.title,
            description: row.description,
            image: row.image,
            user_id: row.user_id,
            user: Some(UserResponse {
                id: row.user_id,
                first_name: row.first_name,
                last_name: row.last_name,
                email: row.email,
                phone: row.phone,
            }),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    #[serde(default = "default_page")]
    pub page: i64,
    #[serde(rename = "perPage", default = "default_per_page")]
    pub per_page: i64,
}

fn default_page() -> i64 {
    1
}

fn default_per_page() -> i64 {
    10
}

#[derive(Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PageMeta {
    pub page: i64,
    pub per_page: i64,
    pub total: i64,
    pub page_count: i64,
    pub next_page: i64,
    pub has_next_page: bool,
    pub has_prev_page: bool,
}

impl PageMeta {
    /// `fetch_all` covers the `page=0` request: every row was returned, so
    /// the reported perPage becomes the total row count and pageCount
    /// collapses to 0 or 1.
    pub fn compute(page: i64, per_page: i64, total: i64, fetch_all: bool) -> Self {
        let page_count = if fetch_all {
            i64::from(total > 0)
        } else {
            (total + per_page - 1) / per_page
        };
        let has_next_page = page < page_count;
        let has_prev_page = page > 1;
        Self {
            page,
            per_page: if fetch_all { total } else { per_page },
            total,
            page_count,
            next_page: if has_next_page { page + 1 } else { 0 },
            has_next_page,
            has_prev_page,
        }
    }
}
