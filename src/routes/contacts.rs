//! Contact API endpoints.

use crate::auth::middleware::AppState;
use crate::error::AppError;
use crate::models::{ContactListResponse, ContactRequest, FavoriteRequest, StoredContact};
use crate::routes::{validate_email, validate_id};
use crate::storage;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde::Deserialize;

/// Length of contact nanoids.
const CONTACT_ID_LEN: usize = 12;

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    pub page: Option<u64>,
    pub limit: Option<u64>,
    pub favorite: Option<bool>,
}

fn validate_contact(req: &ContactRequest) -> Result<(), AppError> {
    if req.name.trim().is_empty() {
        return Err(AppError::Validation("missing required field name".to_string()));
    }
    validate_email(&req.email)?;
    if req.phone.trim().is_empty() {
        return Err(AppError::Validation("missing required field phone".to_string()));
    }
    Ok(())
}

/// GET /api/contacts — List contacts with pagination and favorite filter
pub async fn list_contacts(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> Result<impl IntoResponse, AppError> {
    let page = query.page.unwrap_or(1).max(1);
    let limit = query.limit.unwrap_or(20).clamp(1, 100);

    let mut con = state
        .redis
        .get_multiplexed_async_connection()
        .await
        .map_err(|e| AppError::Internal(format!("Redis connection error: {}", e)))?;

    let (contacts, total) =
        storage::contact::list_contacts(&mut con, page, limit, query.favorite).await?;

    Ok(Json(ContactListResponse {
        contacts,
        total_pages: total.div_ceil(limit),
        current_page: page,
    }))
}

/// GET /api/contacts/{id} — Fetch a single contact
pub async fn get_contact(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    validate_id(&id, "contact id", CONTACT_ID_LEN)?;

    let mut con = state
        .redis
        .get_multiplexed_async_connection()
        .await
        .map_err(|e| AppError::Internal(format!("Redis connection error: {}", e)))?;

    let contact = storage::contact::get_contact(&mut con, &id)
        .await?
        .ok_or_else(|| AppError::NotFound("Contact not found".to_string()))?;

    Ok(Json(contact))
}

/// POST /api/contacts — Create a contact
pub async fn create_contact(
    State(state): State<AppState>,
    Json(req): Json<ContactRequest>,
) -> Result<impl IntoResponse, AppError> {
    validate_contact(&req)?;

    let mut con = state
        .redis
        .get_multiplexed_async_connection()
        .await
        .map_err(|e| AppError::Internal(format!("Redis connection error: {}", e)))?;

    let contact = StoredContact {
        id: nanoid::nanoid!(CONTACT_ID_LEN),
        name: req.name,
        email: req.email,
        phone: req.phone,
        favorite: req.favorite,
        created_at: crate::auth::token::unix_now(),
    };

    storage::contact::store_contact(&mut con, &contact).await?;

    tracing::info!(action = "contact_created", contact_id = %contact.id, "Contact created");

    Ok((StatusCode::CREATED, Json(contact)))
}

/// PUT /api/contacts/{id} — Replace a contact's fields
pub async fn update_contact(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(req): Json<ContactRequest>,
) -> Result<impl IntoResponse, AppError> {
    validate_id(&id, "contact id", CONTACT_ID_LEN)?;
    validate_contact(&req)?;

    let mut con = state
        .redis
        .get_multiplexed_async_connection()
        .await
        .map_err(|e| AppError::Internal(format!("Redis connection error: {}", e)))?;

    let contact = storage::contact::update_contact(&mut con, &id, &req)
        .await?
        .ok_or_else(|| AppError::NotFound("Contact not found".to_string()))?;

    Ok(Json(contact))
}

/// DELETE /api/contacts/{id} — Remove a contact
pub async fn delete_contact(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    validate_id(&id, "contact id", CONTACT_ID_LEN)?;

    let mut con = state
        .redis
        .get_multiplexed_async_connection()
        .await
        .map_err(|e| AppError::Internal(format!("Redis connection error: {}", e)))?;

    storage::contact::delete_contact(&mut con, &id)
        .await?
        .ok_or_else(|| AppError::NotFound("Contact not found".to_string()))?;

    tracing::info!(action = "contact_deleted", contact_id = %id, "Contact deleted");

    Ok(Json(serde_json::json!({
        "message": "Contact deleted"
    })))
}

/// PATCH /api/contacts/{id}/favorite — Toggle the favorite flag
pub async fn set_favorite(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(req): Json<FavoriteRequest>,
) -> Result<impl IntoResponse, AppError> {
    validate_id(&id, "contact id", CONTACT_ID_LEN)?;

    let favorite = req
        .favorite
        .ok_or_else(|| AppError::Validation("missing field favorite".to_string()))?;

    let mut con = state
        .redis
        .get_multiplexed_async_connection()
        .await
        .map_err(|e| AppError::Internal(format!("Redis connection error: {}", e)))?;

    let contact = storage::contact::set_favorite(&mut con, &id, favorite)
        .await?
        .ok_or_else(|| AppError::NotFound("Contact not found".to_string()))?;

    Ok(Json(contact))
}
