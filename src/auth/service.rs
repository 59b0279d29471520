//! Account lifecycle: signup, login, logout, token resolution.
//!
//! Orchestrates the password hasher, token issuer, verification codes,
//! and the account store. All state transitions on an account happen
//! through the functions in this module.

use crate::auth::password;
use crate::auth::token::{unix_now, TokenIssuer};
use crate::auth::verification;
use crate::avatar;
use crate::error::AppError;
use crate::models::{StoredAccount, SubscriptionTier};
use crate::notify::{self, Notifier};
use crate::storage;
use redis::AsyncCommands;
use std::sync::Arc;

/// Register a new account.
///
/// Hashes the password, derives a default avatar, generates a
/// verification code, and persists the account unverified. The
/// verification email is dispatched fire-and-forget. Does not log the
/// account in.
pub async fn signup<C>(
    con: &mut C,
    notifier: &Arc<dyn Notifier>,
    email: &str,
    password_plain: &str,
) -> Result<StoredAccount, AppError>
where
    C: AsyncCommands,
{
    let password_hash = password::hash_password(password_plain)?;
    let code = verification::generate_code();

    let account = StoredAccount {
        id: nanoid::nanoid!(12),
        email: email.to_string(),
        password_hash,
        subscription: SubscriptionTier::Starter.as_str().to_string(),
        avatar_url: avatar::derive_avatar_url(email),
        verified: false,
        active_token: None,
        verification_code: Some(code.clone()),
        created_at: unix_now(),
    };

    // The store's unique-email guard is the only duplicate check;
    // checking first and creating after would race
    let created = storage::account::create(con, &account).await?;
    if !created {
        return Err(AppError::Conflict("Email in use".to_string()));
    }

    notify::dispatch(Arc::clone(notifier), account.email.clone(), code);

    tracing::info!(action = "signup", account_id = %account.id, "Account created");

    Ok(account)
}

/// Authenticate and issue a bearer token.
///
/// Unknown email, unverified account, and wrong password all fail with
/// the same `Authentication` error so callers cannot tell which check
/// failed. On success the issued token is persisted as the account's one
/// active token, displacing any previous one.
pub async fn login<C>(
    con: &mut C,
    issuer: &TokenIssuer,
    email: &str,
    password_plain: &str,
) -> Result<(String, StoredAccount), AppError>
where
    C: AsyncCommands,
{
    let Some(account) = storage::account::find_by_email(con, email).await? else {
        return Err(AppError::Authentication);
    };

    if !account.verified {
        return Err(AppError::Authentication);
    }

    if !password::verify_password(password_plain, &account.password_hash)? {
        tracing::warn!(action = "login_failed", account_id = %account.id, "Wrong password");
        return Err(AppError::Authentication);
    }

    let token = issuer.issue(&account.id, &account.email)?;
    storage::account::set_active_token(con, &account.id, &token).await?;

    tracing::info!(action = "login", account_id = %account.id, "Account logged in");

    Ok((token, account))
}

/// Clear the account's active token. Idempotent: a second logout (or a
/// logout with no active token) is a no-op.
pub async fn logout<C>(con: &mut C, account_id: &str) -> Result<(), AppError>
where
    C: AsyncCommands,
{
    storage::account::clear_active_token(con, account_id).await?;

    tracing::info!(action = "logout", account_id = %account_id, "Account logged out");

    Ok(())
}

/// Resolve a presented bearer token to a live account.
///
/// Fails closed (`None`) on any of: malformed/tampered/expired token,
/// unknown account, or a token that is no longer the account's active one
/// (logout and re-login both revoke earlier tokens before their
/// cryptographic expiry). Store failures are real errors, not `None`.
pub async fn resolve_from_token<C>(
    con: &mut C,
    issuer: &TokenIssuer,
    token: &str,
) -> Result<Option<StoredAccount>, AppError>
where
    C: AsyncCommands,
{
    let Some(claims) = issuer.validate(token) else {
        return Ok(None);
    };

    let Some(account) = storage::account::find_by_email(con, &claims.email).await? else {
        return Ok(None);
    };

    if account.active_token.as_deref() != Some(token) {
        return Ok(None);
    }

    Ok(Some(account))
}
