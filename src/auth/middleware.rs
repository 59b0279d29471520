//! Axum extractors for authentication and rate limiting.

use crate::auth::service;
use crate::auth::token::TokenIssuer;
use crate::config::Config;
use crate::error::AppError;
use crate::models::StoredAccount;
use crate::notify::Notifier;
use axum::{extract::FromRequestParts, http::request::Parts};
use redis::AsyncCommands;
use std::sync::Arc;

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    pub redis: redis::Client,
    pub config: Arc<Config>,
    pub issuer: Arc<TokenIssuer>,
    pub notifier: Arc<dyn Notifier>,
}

/// Authenticated account extractor.
///
/// Extracts the token from the `Authorization: Bearer {token}` header and
/// resolves it to a live account. Every failure mode (missing header,
/// malformed, expired, unknown account, revoked token) collapses to the
/// same 401 rejection; only a store failure is a 500.
pub struct AuthAccount(pub StoredAccount);

impl FromRequestParts<AppState> for AuthAccount {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        // Extract Authorization header
        let auth_header = parts
            .headers
            .get("authorization")
            .and_then(|v| v.to_str().ok())
            .ok_or(AppError::Unauthorized)?;

        // Parse Bearer token
        let token = auth_header
            .strip_prefix("Bearer ")
            .ok_or(AppError::Unauthorized)?;

        // Check signature and expiry before touching the store, so a bad
        // token never costs a connection and cannot surface a store error
        if state.issuer.validate(token).is_none() {
            return Err(AppError::Unauthorized);
        }

        // Get Redis connection
        let mut con = state
            .redis
            .get_multiplexed_async_connection()
            .await
            .map_err(|e| AppError::Internal(format!("Redis connection error: {}", e)))?;

        // Resolve token to account; fails closed
        let account = service::resolve_from_token(&mut con, &state.issuer, token)
            .await?
            .ok_or(AppError::Unauthorized)?;

        Ok(AuthAccount(account))
    }
}

/// Check rate limit using Redis INCR with TTL.
///
/// # Arguments
/// * `con` - Redis connection
/// * `key` - Rate limit key (e.g., "ratelimit:auth:127.0.0.1")
/// * `max` - Maximum requests allowed in window
/// * `window_secs` - Time window in seconds
///
/// # Returns
/// * `Ok(true)` if under limit
/// * `Ok(false)` if limit exceeded
pub async fn check_rate_limit<C>(
    con: &mut C,
    key: &str,
    max: u32,
    window_secs: u64,
) -> Result<bool, redis::RedisError>
where
    C: AsyncCommands,
{
    // Increment counter
    let count: u32 = con.incr(key, 1).await?;

    // Set TTL on first request
    if count == 1 {
        con.expire::<_, ()>(key, window_secs as i64).await?;
    }

    Ok(count <= max)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::NOT_AUTHORIZED;
    use axum::{body::Body, http::Request, routing::get, Json, Router};
    use tower::ServiceExt;

    fn test_state() -> AppState {
        // The client doesn't connect until a request needs Redis, and the
        // rejection paths below never get that far
        let config = Config {
            redis_url: "redis://127.0.0.1:6379".to_string(),
            bind_addr: "127.0.0.1:0".parse().unwrap(),
            token_secret: "0123456789abcdef0123456789abcdef".to_string(),
            token_ttl_secs: 3600,
            public_base_url: "http://localhost:3000".to_string(),
            email_from: "no-reply@localhost".to_string(),
            sendgrid_api_key: None,
            avatars_dir: std::path::PathBuf::from("public/avatars"),
            max_upload_bytes: 5_242_880,
            rate_limit_auth_per_min: 10,
        };
        AppState {
            redis: redis::Client::open(config.redis_url.as_str()).unwrap(),
            issuer: Arc::new(TokenIssuer::new(&config.token_secret, config.token_ttl_secs)),
            notifier: Arc::new(crate::notify::LogNotifier),
            config: Arc::new(config),
        }
    }

    async fn protected(AuthAccount(account): AuthAccount) -> Json<serde_json::Value> {
        Json(serde_json::json!({ "email": account.email }))
    }

    async fn body_json(response: axum::response::Response) -> serde_json::Value {
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&body).unwrap()
    }

    #[tokio::test]
    async fn test_rejections_are_uniform() {
        let app = Router::new()
            .route("/protected", get(protected))
            .with_state(test_state());

        // Missing header, non-Bearer scheme, and a garbage token must all
        // produce the same 401 body. None of these reach the store.
        let requests = [
            Request::builder().uri("/protected").body(Body::empty()),
            Request::builder()
                .uri("/protected")
                .header("authorization", "Token abc")
                .body(Body::empty()),
            Request::builder()
                .uri("/protected")
                .header("authorization", "Bearer not.a.token")
                .body(Body::empty()),
        ];

        for request in requests {
            let response = app.clone().oneshot(request.unwrap()).await.unwrap();
            assert_eq!(response.status(), axum::http::StatusCode::UNAUTHORIZED);
            let body = body_json(response).await;
            assert_eq!(body["error"], NOT_AUTHORIZED);
        }
    }

    #[tokio::test]
    async fn test_check_rate_limit() {
        // Note: This test requires a running Redis instance
        // Skip if REDIS_URL is not set
        let redis_url =
            std::env::var("REDIS_URL").unwrap_or_else(|_| "redis://127.0.0.1:6379".to_string());

        let client = match redis::Client::open(redis_url) {
            Ok(c) => c,
            Err(_) => {
                eprintln!("Skipping test: Redis not available");
                return;
            }
        };

        let mut con = match client.get_multiplexed_async_connection().await {
            Ok(c) => c,
            Err(_) => {
                eprintln!("Skipping test: Redis connection failed");
                return;
            }
        };

        let test_key = "test:ratelimit:unit";

        // Clean up before test
        let _: Result<(), _> = con.del(test_key).await;

        // First three requests are under the limit of 3
        for _ in 0..3 {
            let result = check_rate_limit(&mut con, test_key, 3, 60).await;
            assert!(result.is_ok());
            assert!(result.unwrap());
        }

        // Fourth request should fail (over limit)
        let result = check_rate_limit(&mut con, test_key, 3, 60).await;
        assert!(result.is_ok());
        assert!(!result.unwrap());

        // Clean up
        let _: Result<(), _> = con.del(test_key).await;
    }
}
