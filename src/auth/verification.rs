//! Email-verification codes: generation, consumption, re-issue.

use crate::error::AppError;
use crate::models::StoredAccount;
use crate::notify::{self, Notifier};
use crate::storage;
use redis::AsyncCommands;
use std::sync::Arc;

/// Generate an opaque single-use verification code.
///
/// Returns a 21-character URL-safe nanoid (~126 bits of entropy), so
/// collisions are negligible without a storage-level uniqueness check.
pub fn generate_code() -> String {
    nanoid::nanoid!()
}

/// Consume a verification code: atomically flips the matching unverified
/// account to verified and clears the code.
///
/// A code that is unknown, already consumed, or attached to an account
/// that somehow got verified through another path all report not-found.
pub async fn consume<C>(con: &mut C, code: &str) -> Result<StoredAccount, AppError>
where
    C: AsyncCommands,
{
    storage::account::consume_verification_code(con, code)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".to_string()))
}

/// Overwrite the account's pending code with a fresh one and dispatch it.
///
/// Fails if the account is already verified. The notifier dispatch is
/// fire-and-forget: delivery failure never fails the re-issue.
pub async fn reissue<C>(
    con: &mut C,
    notifier: &Arc<dyn Notifier>,
    account: &StoredAccount,
) -> Result<(), AppError>
where
    C: AsyncCommands,
{
    if account.verified {
        return Err(AppError::Validation(
            "Verification has already been passed".to_string(),
        ));
    }

    let code = generate_code();
    let updated = storage::account::set_verification_code(con, &account.id, &code).await?;
    if !updated {
        // Lost a race against a concurrent verification
        return Err(AppError::Validation(
            "Verification has already been passed".to_string(),
        ));
    }

    notify::dispatch(Arc::clone(notifier), account.email.clone(), code);
    Ok(())
}
