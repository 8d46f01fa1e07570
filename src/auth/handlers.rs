use axum::{
    extract::{rejection::JsonRejection, FromRef, State},
    http::{header, StatusCode},
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use cookie::Cookie;
use lazy_static::lazy_static;
use regex::Regex;
use serde_json::json;
use time::{Duration, OffsetDateTime};
use tracing::{error, info, instrument, warn};

use crate::{
    auth::{
        dto::{LoginRequest, RegisterRequest, UserResponse},
        jwt::{JwtKeys, SESSION_COOKIE},
        password::{hash_password, verify_password},
        repo::User,
    },
    error::ApiError,
    state::AppState,
};

pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
        .route("/logout", get(logout))
}

fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex =
            Regex::new(r"^[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}$").unwrap();
    }
    EMAIL_RE.is_match(email)
}

fn session_cookie(token: String, ttl: Duration) -> Cookie<'static> {
    let mut cookie = Cookie::new(SESSION_COOKIE, token);
    cookie.set_http_only(true);
    cookie.set_path("/");
    cookie.set_expires(OffsetDateTime::now_utc() + ttl);
    cookie
}

fn expired_session_cookie() -> Cookie<'static> {
    let mut cookie = Cookie::new(SESSION_COOKIE, "");
    cookie.set_http_only(true);
    cookie.set_path("/");
    cookie.set_expires(OffsetDateTime::now_utc() - Duration::hours(1));
    cookie
}

#[instrument(skip(state, payload))]
pub async fn register(
    State(state): State<AppState>,
    payload: Result<Json<RegisterRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<serde_json::Value>), ApiError> {
    let Json(payload) = payload.map_err(|e| {
        warn!(error = %e, "unable to parse body");
        ApiError::Validation("Invalid request payload".into())
    })?;

    if payload.password.len() <= 6 {
        warn!("password too short");
        return Err(ApiError::Validation(
            "Password must be greater than 6 characters".into(),
        ));
    }

    let email = payload.email.trim();
    if !is_valid_email(email) {
        warn!(email, "invalid email");
        return Err(ApiError::Validation("Invalid email address".into()));
    }

    match User::find_by_email(&state.db, email).await {
        Ok(Some(_)) => {
            warn!(email, "email already registered");
            return Err(ApiError::Validation("Email already exists".into()));
        }
        Ok(None) => {}
        Err(e) => {
            error!(error = %e, "find_by_email failed");
            return Err(ApiError::Store("Database error".into()));
        }
    }

    let hash = hash_password(&payload.password).map_err(|e| {
        error!(error = %e, "hash_password failed");
        ApiError::Store("Failed to create account".into())
    })?;

    // A concurrent registration with the same email loses the race at the
    // store's unique constraint, not here.
    let user = User::create(
        &state.db,
        &payload.first_name,
        &payload.last_name,
        email,
        &payload.phone,
        &hash,
    )
    .await
    .map_err(|e| match e {
        sqlx::Error::Database(ref db) if db.is_unique_violation() => {
            warn!(email, "email already exists");
            ApiError::Validation("Email already exists".into())
        }
        e => {
            error!(error = %e, "create user failed");
            ApiError::Store("Failed to create account".into())
        }
    })?;

    info!(user_id = user.id, email = %user.email, "user registered");
    Ok((
        StatusCode::CREATED,
        Json(json!({
            "data": UserResponse::from(user),
            "message": "Account created successfully",
        })),
    ))
}

#[instrument(skip(state, payload))]
pub async fn login(
    State(state): State<AppState>,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(payload) = payload.map_err(|e| {
        warn!(error = %e, "unable to parse body");
        ApiError::Validation("Invalid request payload".into())
    })?;

    let user = match User::find_by_email(&state.db, &payload.email).await {
        Ok(Some(u)) => u,
        Ok(None) => {
            warn!(email = %payload.email, "login unknown email");
            return Err(ApiError::Unauthenticated(
                "Incorrect email address or password".into(),
            ));
        }
        Err(e) => {
            error!(error = %e, "find_by_email failed");
            return Err(ApiError::Store("Database error".into()));
        }
    };

    // Unknown email and wrong password answer identically.
    if !verify_password(&payload.password, &user.password_hash).unwrap_or(false) {
        warn!(user_id = user.id, "login invalid password");
        return Err(ApiError::Unauthenticated(
            "Incorrect email address or password".into(),
        ));
    }

    let keys = JwtKeys::from_ref(&state);
    let token = keys.sign(user.id).map_err(|e| {
        error!(error = %e, "jwt sign failed");
        ApiError::Store("Failed to generate token".into())
    })?;

    let cookie = session_cookie(token, keys.ttl);
    info!(user_id = user.id, email = %user.email, "user logged in");
    Ok((
        [(header::SET_COOKIE, cookie.to_string())],
        Json(json!({
            "data": UserResponse::from(user),
            "message": "Logged in successfully",
        })),
    ))
}

#[instrument]
pub async fn logout() -> impl IntoResponse {
    let cookie = expired_session_cookie();
    (
        [(header::SET_COOKIE, cookie.to_string())],
        Json(json!({ "message": "Logged out successfully" })),
    )
}
