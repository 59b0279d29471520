//! Avatar collaborator boundary.
//!
//! Two capabilities: a signup-time default avatar derived from the email
//! address, and persistence of an uploaded image under the public avatars
//! directory. Image resizing/transcoding is the serving side's concern
//! and stays out of this crate.

use crate::error::AppError;
use sha2::{Digest, Sha256};
use std::path::Path;

/// Derive the default avatar URL for an email address.
///
/// Gravatar identicon keyed by the SHA-256 of the normalized
/// (trimmed, lowercased) address, so the same email always maps to the
/// same image without storing anything.
pub fn derive_avatar_url(email: &str) -> String {
    let digest = Sha256::digest(email.trim().to_lowercase().as_bytes());
    format!(
        "https://www.gravatar.com/avatar/{}?d=identicon",
        hex::encode(digest)
    )
}

/// Persist an uploaded avatar and return its public URL.
///
/// The file lands in `avatars_dir` as `{account_id}-{timestamp}.{ext}`
/// and is served statically under `/avatars/`.
pub async fn process_upload(
    account_id: &str,
    data: &[u8],
    original_filename: &str,
    avatars_dir: &Path,
) -> Result<String, AppError> {
    tokio::fs::create_dir_all(avatars_dir)
        .await
        .map_err(|e| AppError::Internal(format!("Failed to create avatars dir: {}", e)))?;

    let filename = format!(
        "{}-{}.{}",
        account_id,
        crate::auth::token::unix_now(),
        sanitize_extension(original_filename)
    );

    tokio::fs::write(avatars_dir.join(&filename), data)
        .await
        .map_err(|e| AppError::Internal(format!("Failed to write avatar: {}", e)))?;

    Ok(format!("/avatars/{}", filename))
}

/// Extract a safe lowercase extension from the uploaded filename,
/// falling back to jpg.
fn sanitize_extension(filename: &str) -> String {
    let ext = filename.rsplit('.').next().unwrap_or("").to_lowercase();
    if !ext.is_empty() && ext.len() <= 5 && ext.chars().all(|c| c.is_ascii_alphanumeric()) {
        ext
    } else {
        "jpg".to_string()
    }
}
