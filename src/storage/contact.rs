//! Contact Redis operations.
//!
//! Redis key pattern:
//! - `contact:{nanoid}` — individual contact data (JSON)
//!
//! Contacts are plain records: no indexes, no conditional updates.
//! Listing scans `contact:*`; updates are last-write-wins.

use crate::models::{ContactRequest, StoredContact};
use redis::AsyncCommands;

/// Store a contact.
pub async fn store_contact<C>(con: &mut C, contact: &StoredContact) -> Result<(), redis::RedisError>
where
    C: AsyncCommands,
{
    let key = format!("contact:{}", contact.id);
    let json = serde_json::to_string(contact).map_err(|e| {
        redis::RedisError::from((
            redis::ErrorKind::TypeError,
            "JSON serialize",
            e.to_string(),
        ))
    })?;

    con.set::<_, _, ()>(&key, json).await?;
    Ok(())
}

/// Get a contact by ID.
pub async fn get_contact<C>(
    con: &mut C,
    id: &str,
) -> Result<Option<StoredContact>, redis::RedisError>
where
    C: AsyncCommands,
{
    let key = format!("contact:{}", id);
    let json: Option<String> = con.get(&key).await?;

    match json {
        Some(data) => {
            let contact = serde_json::from_str(&data).map_err(|e| {
                redis::RedisError::from((
                    redis::ErrorKind::TypeError,
                    "JSON deserialize",
                    e.to_string(),
                ))
            })?;
            Ok(Some(contact))
        }
        None => Ok(None),
    }
}

/// Overwrite a contact's mutable fields, returning the updated record.
pub async fn update_contact<C>(
    con: &mut C,
    id: &str,
    fields: &ContactRequest,
) -> Result<Option<StoredContact>, redis::RedisError>
where
    C: AsyncCommands,
{
    let Some(mut contact) = get_contact(con, id).await? else {
        return Ok(None);
    };

    contact.name = fields.name.clone();
    contact.email = fields.email.clone();
    contact.phone = fields.phone.clone();
    contact.favorite = fields.favorite;

    store_contact(con, &contact).await?;
    Ok(Some(contact))
}

/// Toggle a contact's favorite flag, returning the updated record.
pub async fn set_favorite<C>(
    con: &mut C,
    id: &str,
    favorite: bool,
) -> Result<Option<StoredContact>, redis::RedisError>
where
    C: AsyncCommands,
{
    let Some(mut contact) = get_contact(con, id).await? else {
        return Ok(None);
    };

    contact.favorite = favorite;

    store_contact(con, &contact).await?;
    Ok(Some(contact))
}

/// Delete a contact, returning the removed record if it existed.
pub async fn delete_contact<C>(
    con: &mut C,
    id: &str,
) -> Result<Option<StoredContact>, redis::RedisError>
where
    C: AsyncCommands,
{
    let contact = get_contact(con, id).await?;

    if contact.is_some() {
        let key = format!("contact:{}", id);
        con.del::<_, ()>(&key).await?;
    }

    Ok(contact)
}

/// List contacts with pagination and an optional favorite filter.
///
/// Scans for keys matching `contact:*`, filters, and sorts by creation
/// time (newest last) for a stable page order. Returns the page plus the
/// total number of matching contacts.
pub async fn list_contacts<C>(
    con: &mut C,
    page: u64,
    limit: u64,
    favorite: Option<bool>,
) -> Result<(Vec<StoredContact>, u64), redis::RedisError>
where
    C: AsyncCommands,
{
    let mut contacts = Vec::new();
    let keys = super::scan_keys(con, "contact:*").await?;

    for key in keys {
        let json: Option<String> = con.get(&key).await?;
        if let Some(data) = json {
            if let Ok(contact) = serde_json::from_str::<StoredContact>(&data) {
                if favorite.map_or(true, |want| contact.favorite == want) {
                    contacts.push(contact);
                }
            }
        }
    }

    contacts.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));

    let total = contacts.len() as u64;
    let limit = limit.max(1);
    let page = page.max(1);
    let start = ((page - 1) * limit) as usize;

    let page_items = contacts
        .into_iter()
        .skip(start)
        .take(limit as usize)
        .collect();

    Ok((page_items, total))
}
