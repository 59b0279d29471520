//! API route handlers.

pub mod contacts;
pub mod users;

use crate::auth::middleware::AppState;
use crate::error::AppError;
use axum::{
    routing::{get, patch, post},
    Router,
};

/// Validate that a string is a valid nanoid (alphanumeric, hyphens, underscores).
pub fn validate_id(id: &str, label: &str, expected_len: usize) -> Result<(), AppError> {
    if id.len() != expected_len
        || !id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
    {
        return Err(AppError::Validation(format!("Invalid {} format", label)));
    }
    Ok(())
}

/// Minimal email shape check: one `@`, a non-empty local part, and a
/// dotted domain. Full address validation is the mail provider's job.
pub fn validate_email(email: &str) -> Result<(), AppError> {
    let valid = email.len() <= 254
        && !email.chars().any(char::is_whitespace)
        && match email.split_once('@') {
            Some((local, domain)) => {
                !local.is_empty()
                    && !domain.is_empty()
                    && !domain.contains('@')
                    && domain.split('.').count() >= 2
                    && domain.split('.').all(|part| !part.is_empty())
            }
            None => false,
        };

    if !valid {
        return Err(AppError::Validation("Invalid email format".to_string()));
    }
    Ok(())
}

/// Validate a signup/login body: email shape plus password length.
pub fn validate_credentials(email: &str, password: &str) -> Result<(), AppError> {
    validate_email(email)?;
    if password.len() < 8 {
        return Err(AppError::Validation(
            "Password must be at least 8 characters".to_string(),
        ));
    }
    Ok(())
}

/// Build the API router with all endpoints.
pub fn api_router() -> Router<AppState> {
    Router::new()
        // Account endpoints
        .route("/api/users/signup", post(users::signup))
        .route("/api/users/login", post(users::login))
        .route("/api/users/logout", get(users::logout))
        .route("/api/users/current", get(users::current))
        .route("/api/users/verify/{code}", get(users::verify_email))
        .route("/api/users/verify", post(users::resend_verification))
        .route("/api/users", patch(users::update_subscription))
        .route("/api/users/avatars", patch(users::update_avatar))
        // Contact endpoints
        .route(
            "/api/contacts",
            get(contacts::list_contacts).post(contacts::create_contact),
        )
        .route(
            "/api/contacts/{id}",
            get(contacts::get_contact)
                .put(contacts::update_contact)
                .delete(contacts::delete_contact),
        )
        .route("/api/contacts/{id}/favorite", patch(contacts::set_favorite))
}
