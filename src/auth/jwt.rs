use axum::{
    async_trait,
    extract::{FromRef, FromRequestParts},
    http::{header, request::Parts},
};
use cookie::Cookie;
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use time::{Duration, OffsetDateTime};
use tracing::{debug, warn};

use crate::{config::JwtConfig, error::ApiError, state::AppState};

/// Name of the cookie carrying the session token.
pub const SESSION_COOKIE: &str = "jwt";

/// JWT payload: subject (user ID as decimal string) plus the time bounds.
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub iat: usize,
    pub exp: usize,
}

#[derive(Clone)]
pub struct JwtKeys {
    pub encoding: EncodingKey,
    pub decoding: DecodingKey,
    pub ttl: Duration,
}

impl FromRef<AppState> for JwtKeys {
    fn from_ref(state: &AppState) -> Self {
        let JwtConfig { secret, ttl_hours } = state.config.jwt.clone();
        Self::new(&secret, ttl_hours)
    }
}

impl JwtKeys {
    pub fn new(secret: &str, ttl_hours: i64) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            ttl: Duration::hours(ttl_hours),
        }
    }

    pub fn sign(&self, user_id: i64) -> anyhow::Result<String> {
        let now = OffsetDateTime::now_utc();
        let claims = Claims {
            sub: user_id.to_string(),
            iat: now.unix_timestamp() as usize,
            exp: (now + self.ttl).unix_timestamp() as usize,
        };
        let token = encode(&Header::default(), &claims, &self.encoding)?;
        debug!(user_id, "jwt signed");
        Ok(token)
    }

    /// Expired, tampered and malformed tokens all fail the same way; callers
    /// must not distinguish them in responses.
    pub fn verify(&self, token: &str) -> anyhow::Result<i64> {
        let data = decode::<Claims>(token, &self.decoding, &Validation::default())?;
        let user_id = data.claims.sub.parse::<i64>()?;
        debug!(user_id, "jwt verified");
        Ok(user_id)
    }
}

/// Session boundary: reads the `jwt` cookie, verifies it and hands the
/// resolved user ID to the handler. Handlers trust this value; no other
/// code verifies tokens.
pub struct AuthUser(pub i64);

#[async_trait]
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
    JwtKeys: FromRef<S>,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let keys = JwtKeys::from_ref(state);

        let mut token = None;
        for value in parts.headers.get_all(header::COOKIE) {
            let Ok(raw) = value.to_str() else { continue };
            for cookie in Cookie::split_parse(raw).flatten() {
                if cookie.name() == SESSION_COOKIE {
                    token = Some(cookie.value().to_string());
                }
            }
        }

        let token = token.ok_or_else(|| {
            warn!("missing session cookie");
            ApiError::Unauthenticated("Unauthorized".into())
        })?;

        let user_id = keys.verify(&token).map_err(|e| {
            warn!(error = %e, "invalid session token");
            ApiError::Unauthenticated("Unauthorized".into())
        })?;

        Ok(AuthUser(user_id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_keys() -> JwtKeys {
        JwtKeys::new("test-secret", 24)
    }

    #[test]
    fn sign_and_verify_roundtrip() {
        let keys = make_keys();
        let token = keys.sign(42).expect("sign");
        assert_eq!(keys.verify(&token).expect("verify"), 42);
    }

    #[test]
    fn verify_rejects_expired_token() {
        let keys = make_keys();
        let now = OffsetDateTime::now_utc();
        let claims = Claims {
            sub: "42".into(),
            iat: (now - Duration::hours(2)).unix_timestamp() as usize,
            exp: (now - Duration::hours(1)).unix_timestamp() as usize,
        };
        let token = encode(&Header::default(), &claims, &keys.encoding).expect("encode");
        assert!(keys.verify(&token).is_err());
    }

    #[test]
    fn verify_rejects_tampered_signature() {
        let keys = make_keys();
        let other = JwtKeys::new("another-secret", 24);
        let token = other.sign(42).expect("sign");
        assert!(keys.verify(&token).is_err());
    }

    #[test]
    fn verify_rejects_malformed_token() {
        let keys = make_keys();
        assert!(keys.verify("not-a-jwt").is_err());
    }

    #[test]
    fn verify_rejects_non_numeric_subject() {
        let keys = make_keys();
        let now = OffsetDateTime::now_utc();
        let claims = Claims {
            sub: "abc".into(),
            iat: now.unix_timestamp() as usize,
            exp: (now + Duration::hours(1)).unix_timestamp() as usize,
        };
        let token = encode(&Header::default(), &claims, &keys.encoding).expect("encode");
        assert!(keys.verify(&token).is_err());
    }
}
