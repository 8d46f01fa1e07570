use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Post {
    pub id: i64,
    pub title: String,
    pub description: String,
    pub image: String,
    pub user_id: i64,
}

/// Post joined with its owner's public columns, one flat row per post.
#[derive(Debug, Clone, FromRow)]
pub struct PostWithOwner {
    pub id: i64,
    pub title: String,
    pub description: String,
    pub image: String,
    pub user_id: i64,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: String,
}

const OWNER_SELECT: &str = r#"
    SELECT p.id, p.title, p.description, p.image, p.user_id,
           u.first_name, u.last_name, u.email, u.phone
    FROM posts p
    JOIN users u ON u.id = p.user_id
"#;

pub async fn create(
    db: &PgPool,
    user_id: i64,
    title: &str,
    description: &str,
    image: &str,
) -> sqlx::Result<Post> {
    sqlx::query_as::<_, Post>(
        r#"
        INSERT INTO posts (title, description, image, user_id)
        VALUES ($1, $2, $3, $4)
        RETURNING id, title, description, image, user_id
        "#,
    )
    .bind(title)
    .bind(description)
    .bind(image)
    .bind(user_id)
    .fetch_one(db)
    .await
}

pub async fn find_by_id(db: &PgPool, id: i64) -> sqlx::Result<Option<Post>> {
    sqlx::query_as::<_, Post>(
        r#"
        SELECT id, title, description, image, user_id
        FROM posts
        WHERE id = $1
        "#,
    )
    .bind(id)
    .fetch_optional(db)
    .await
}

pub async fn find_detail(db: &PgPool, id: i64) -> sqlx::Result<Option<PostWithOwner>> {
    sqlx::query_as::<_, PostWithOwner>(&format!("{OWNER_SELECT} WHERE p.id = $1"))
        .bind(id)
        .fetch_optional(db)
        .await
}

/// `limit: None` fetches every row (`LIMIT NULL` is unbounded in Postgres).
pub async fn list_paged(
    db: &PgPool,
    limit: Option<i64>,
    offset: i64,
) -> sqlx::Result<Vec<PostWithOwner>> {
    sqlx::query_as::<_, PostWithOwner>(&format!(
        "{OWNER_SELECT} ORDER BY p.id LIMIT $1 OFFSET $2"
    ))
    .bind(limit)
    .bind(offset)
    .fetch_all(db)
    .await
}

pub async fn list_by_user(db: &PgPool, user_id: i64) -> sqlx::Result<Vec<PostWithOwner>> {
    sqlx::query_as::<_, PostWithOwner>(&format!(
        "{OWNER_SELECT} WHERE p.user_id = $1 ORDER BY p.id"
    ))
    .bind(user_id)
    .fetch_all(db)
    .await
}

pub async fn count_all(db: &PgPool) -> sqlx::Result<i64> {
    sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM posts")
        .fetch_one(db)
        .await
}

/// Only the provided fields change; `None` keeps the stored value.
pub async fn update(
    db: &PgPool,
    id: i64,
    title: Option<&str>,
    description: Option<&str>,
    image: Option<&str>,
) -> sqlx::Result<Post> {
    sqlx::query_as::<_, Post>(
        r#"
        UPDATE posts
        SET title       = COALESCE($2, title),
            description = COALESCE($3, description),
            image       = COALESCE($4, image)
        WHERE id = $1
        RETURNING id, title, description, image, user_id
        "#,
    )
    .bind(id)
    .bind(title)
    .bind(description)
    .bind(image)
    .fetch_one(db)
    .await
}

pub async fn delete(db: &PgPool, id: i64) -> sqlx::Result<()> {
    sqlx::query("DELETE FROM posts WHERE id = $1")
        .bind(id)
        .execute(db)
        .await?;
    Ok(())
}
