//! Account API endpoints.

use crate::auth::middleware::{check_rate_limit, AppState, AuthAccount};
use crate::auth::{service, verification};
use crate::avatar;
use crate::error::AppError;
use crate::models::{
    AvatarResponse, CredentialsRequest, LoginResponse, ResendVerificationRequest, SignupResponse,
    SubscriptionRequest, SubscriptionTier,
};
use crate::routes::{validate_credentials, validate_id};
use crate::storage;
use axum::{
    extract::{ConnectInfo, Multipart, Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use std::hash::{Hash, Hasher};
use std::net::SocketAddr;

/// Length of the nanoid verification codes in URLs.
const VERIFICATION_CODE_LEN: usize = 21;

/// Rate limit signups and logins by client IP; logs a hashed IP on refusal.
async fn enforce_auth_rate_limit<C>(
    con: &mut C,
    state: &AppState,
    addr: &SocketAddr,
    endpoint: &str,
) -> Result<(), AppError>
where
    C: redis::AsyncCommands,
{
    let rate_limit_key = format!("ratelimit:auth:{}", addr.ip());
    let allowed = check_rate_limit(
        con,
        &rate_limit_key,
        state.config.rate_limit_auth_per_min,
        60,
    )
    .await
    .map_err(|e| AppError::Internal(format!("Rate limit check failed: {}", e)))?;

    if !allowed {
        let mut hasher = std::hash::DefaultHasher::new();
        addr.ip().hash(&mut hasher);
        let ip_hash = format!("{:x}", hasher.finish());
        tracing::warn!(action = "rate_limited", endpoint = %endpoint, ip_hash = %ip_hash, "Rate limit exceeded");
        return Err(AppError::RateLimited);
    }

    Ok(())
}

/// POST /api/users/signup — Register a new account
pub async fn signup(
    State(state): State<AppState>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    Json(req): Json<CredentialsRequest>,
) -> Result<impl IntoResponse, AppError> {
    validate_credentials(&req.email, &req.password)?;

    let mut con = state
        .redis
        .get_multiplexed_async_connection()
        .await
        .map_err(|e| AppError::Internal(format!("Redis connection error: {}", e)))?;

    enforce_auth_rate_limit(&mut con, &state, &addr, "users/signup").await?;

    let account = service::signup(&mut con, &state.notifier, &req.email, &req.password).await?;

    Ok((
        StatusCode::CREATED,
        Json(SignupResponse {
            user: account.summary(),
        }),
    ))
}

/// POST /api/users/login — Authenticate and issue a bearer token
pub async fn login(
    State(state): State<AppState>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    Json(req): Json<CredentialsRequest>,
) -> Result<impl IntoResponse, AppError> {
    validate_credentials(&req.email, &req.password)?;

    let mut con = state
        .redis
        .get_multiplexed_async_connection()
        .await
        .map_err(|e| AppError::Internal(format!("Redis connection error: {}", e)))?;

    enforce_auth_rate_limit(&mut con, &state, &addr, "users/login").await?;

    let (token, account) = service::login(&mut con, &state.issuer, &req.email, &req.password).await?;

    Ok(Json(LoginResponse {
        token,
        user: account.summary(),
    }))
}

/// GET /api/users/logout — Invalidate the current bearer token
pub async fn logout(
    AuthAccount(account): AuthAccount,
    State(state): State<AppState>,
) -> Result<impl IntoResponse, AppError> {
    let mut con = state
        .redis
        .get_multiplexed_async_connection()
        .await
        .map_err(|e| AppError::Internal(format!("Redis connection error: {}", e)))?;

    service::logout(&mut con, &account.id).await?;

    Ok(StatusCode::NO_CONTENT)
}

/// GET /api/users/current — Return the authenticated account
pub async fn current(AuthAccount(account): AuthAccount) -> impl IntoResponse {
    Json(account.summary())
}

/// GET /api/users/verify/{code} — Consume a verification code
pub async fn verify_email(
    State(state): State<AppState>,
    Path(code): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    validate_id(&code, "verification code", VERIFICATION_CODE_LEN)?;

    let mut con = state
        .redis
        .get_multiplexed_async_connection()
        .await
        .map_err(|e| AppError::Internal(format!("Redis connection error: {}", e)))?;

    let account = verification::consume(&mut con, &code).await?;

    tracing::info!(action = "email_verified", account_id = %account.id, "Email verified");

    Ok(Json(serde_json::json!({
        "message": "Verification successful"
    })))
}

/// POST /api/users/verify — Re-send the verification email
pub async fn resend_verification(
    State(state): State<AppState>,
    Json(req): Json<ResendVerificationRequest>,
) -> Result<impl IntoResponse, AppError> {
    let email = req
        .email
        .as_deref()
        .ok_or_else(|| AppError::Validation("missing required field email".to_string()))?;

    let mut con = state
        .redis
        .get_multiplexed_async_connection()
        .await
        .map_err(|e| AppError::Internal(format!("Redis connection error: {}", e)))?;

    let account = storage::account::find_by_email(&mut con, email)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

    verification::reissue(&mut con, &state.notifier, &account).await?;

    Ok(Json(serde_json::json!({
        "message": "Verification email sent"
    })))
}

/// PATCH /api/users — Update the subscription tier
pub async fn update_subscription(
    AuthAccount(account): AuthAccount,
    State(state): State<AppState>,
    Json(req): Json<SubscriptionRequest>,
) -> Result<impl IntoResponse, AppError> {
    let tier = req
        .subscription
        .parse::<SubscriptionTier>()
        .map_err(AppError::Validation)?;

    let mut con = state
        .redis
        .get_multiplexed_async_connection()
        .await
        .map_err(|e| AppError::Internal(format!("Redis connection error: {}", e)))?;

    let updated = storage::account::update_subscription(&mut con, &account.id, tier.as_str())
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

    tracing::info!(action = "subscription_updated", account_id = %account.id, tier = %tier, "Subscription updated");

    Ok(Json(updated.summary()))
}

/// PATCH /api/users/avatars — Upload a new avatar
///
/// Accepts a multipart form with a "file" field.
pub async fn update_avatar(
    AuthAccount(account): AuthAccount,
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<impl IntoResponse, AppError> {
    let mut upload: Option<(String, Vec<u8>)> = None;

    // Parse multipart form
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::Validation(format!("Invalid multipart: {}", e)))?
    {
        if field.name() != Some("file") {
            continue;
        }

        let filename = field.file_name().unwrap_or("avatar.jpg").to_string();
        let data = field
            .bytes()
            .await
            .map_err(|e| AppError::Validation(format!("Failed to read file: {}", e)))?
            .to_vec();
        upload = Some((filename, data));
    }

    let (filename, data) =
        upload.ok_or_else(|| AppError::Validation("No file uploaded".to_string()))?;

    if data.is_empty() {
        return Err(AppError::Validation("Uploaded file is empty".to_string()));
    }
    if data.len() > state.config.max_upload_bytes {
        return Err(AppError::Validation(format!(
            "File too large: {} bytes exceeds limit of {} bytes",
            data.len(),
            state.config.max_upload_bytes
        )));
    }

    let avatar_url =
        avatar::process_upload(&account.id, &data, &filename, &state.config.avatars_dir).await?;

    let mut con = state
        .redis
        .get_multiplexed_async_connection()
        .await
        .map_err(|e| AppError::Internal(format!("Redis connection error: {}", e)))?;

    storage::account::set_avatar_url(&mut con, &account.id, &avatar_url)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

    tracing::info!(action = "avatar_updated", account_id = %account.id, "Avatar updated");

    Ok(Json(AvatarResponse { avatar_url }))
}
