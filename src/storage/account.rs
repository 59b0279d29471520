//! Account Redis operations.
//!
//! Redis key patterns:
//! - `account:{nanoid}` — individual account data (JSON)
//! - `account_email:{email}` — email lookup to account id (STRING)
//! - `account_verify:{code}` — verification-code lookup to account id (STRING)
//!
//! The email key doubles as the uniqueness constraint: `create` claims it
//! with SET NX, so two concurrent signups for the same address cannot
//! both succeed.
//!
//! Field mutations (token set/clear, verification consumption, tier and
//! avatar updates) run as Lua scripts: each is one atomic read-check-write
//! against a single account, which is what keeps verification codes
//! single-use under concurrent requests.
//!
//! ## Security: Zeroizing Sensitive Data
//!
//! Account JSON carries the password hash and the active bearer token, so
//! fetched payloads are wrapped in `zeroize::Zeroizing` and cleared from
//! this process's memory after deserialization.

use crate::models::StoredAccount;
use redis::AsyncCommands;
use zeroize::Zeroizing;

/// Create a new account, claiming its email.
///
/// Returns `Ok(false)` without writing anything when the email is already
/// taken (the store-level duplicate-key outcome).
pub async fn create<C>(con: &mut C, account: &StoredAccount) -> Result<bool, redis::RedisError>
where
    C: AsyncCommands,
{
    let email_key = format!("account_email:{}", account.email);

    // SET NX atomically claims the email; losing the race means duplicate
    let claimed: bool = redis::cmd("SET")
        .arg(&email_key)
        .arg(&account.id)
        .arg("NX")
        .query_async(con)
        .await?;

    if !claimed {
        return Ok(false);
    }

    let account_key = format!("account:{}", account.id);
    let json = serde_json::to_string(account).map_err(|e| {
        redis::RedisError::from((
            redis::ErrorKind::TypeError,
            "JSON serialize",
            e.to_string(),
        ))
    })?;

    con.set::<_, _, ()>(&account_key, json).await?;

    if let Some(code) = &account.verification_code {
        let verify_key = format!("account_verify:{}", code);
        con.set::<_, _, ()>(&verify_key, &account.id).await?;
    }

    Ok(true)
}

/// Get an account by ID.
///
/// The account JSON is zeroized after deserialization.
pub async fn find_by_id<C>(con: &mut C, id: &str) -> Result<Option<StoredAccount>, redis::RedisError>
where
    C: AsyncCommands,
{
    let key = format!("account:{}", id);
    let json: Option<String> = con.get(&key).await?;

    match json {
        Some(data) => {
            // Wrap the JSON string in Zeroizing to clear it after use
            let zeroizing_data = Zeroizing::new(data);
            let account = serde_json::from_str(&zeroizing_data).map_err(|e| {
                redis::RedisError::from((
                    redis::ErrorKind::TypeError,
                    "JSON deserialize",
                    e.to_string(),
                ))
            })?;
            // zeroizing_data is automatically zeroized when dropped here
            Ok(Some(account))
        }
        None => Ok(None),
    }
}

/// Get an account by email.
///
/// Performs a two-step lookup: email -> account_id -> account data.
pub async fn find_by_email<C>(
    con: &mut C,
    email: &str,
) -> Result<Option<StoredAccount>, redis::RedisError>
where
    C: AsyncCommands,
{
    let email_key = format!("account_email:{}", email);
    let account_id: Option<String> = con.get(&email_key).await?;

    match account_id {
        Some(id) => find_by_id(con, &id).await,
        None => Ok(None),
    }
}

/// Get an account by its pending verification code.
pub async fn find_by_verification_code<C>(
    con: &mut C,
    code: &str,
) -> Result<Option<StoredAccount>, redis::RedisError>
where
    C: AsyncCommands,
{
    let verify_key = format!("account_verify:{}", code);
    let account_id: Option<String> = con.get(&verify_key).await?;

    match account_id {
        Some(id) => find_by_id(con, &id).await,
        None => Ok(None),
    }
}

/// Atomically consume a verification code.
///
/// In one script: resolve the code, require the account to still be
/// unverified, flip it to verified, clear the pending code, and drop the
/// code index. Two concurrent requests with the same code cannot both
/// succeed. Returns the updated account, or None for an unknown or
/// already-consumed code.
pub async fn consume_verification_code<C>(
    con: &mut C,
    code: &str,
) -> Result<Option<StoredAccount>, redis::RedisError>
where
    C: AsyncCommands,
{
    let script = redis::Script::new(
        r"
        local id = redis.call('GET', KEYS[1])
        if not id then
            return false
        end
        local key = 'account:' .. id
        local val = redis.call('GET', key)
        if not val then
            return false
        end
        local acc = cjson.decode(val)
        if acc.verified then
            return false
        end
        acc.verified = true
        acc.verification_code = nil
        local out = cjson.encode(acc)
        redis.call('SET', key, out)
        redis.call('DEL', KEYS[1])
        return out
        ",
    );

    let verify_key = format!("account_verify:{}", code);
    let json: Option<String> = script.key(&verify_key).invoke_async(con).await?;

    match json {
        Some(data) => {
            let zeroizing_data = Zeroizing::new(data);
            let account = serde_json::from_str(&zeroizing_data).map_err(|e| {
                redis::RedisError::from((
                    redis::ErrorKind::TypeError,
                    "JSON deserialize",
                    e.to_string(),
                ))
            })?;
            Ok(Some(account))
        }
        None => Ok(None),
    }
}

/// Replace the pending verification code of an unverified account.
///
/// Atomically swaps the code and its index key. Returns false if the
/// account does not exist or has already been verified.
pub async fn set_verification_code<C>(
    con: &mut C,
    id: &str,
    code: &str,
) -> Result<bool, redis::RedisError>
where
    C: AsyncCommands,
{
    let script = redis::Script::new(
        r"
        local val = redis.call('GET', KEYS[1])
        if not val then
            return 0
        end
        local acc = cjson.decode(val)
        if acc.verified then
            return 0
        end
        if acc.verification_code then
            redis.call('DEL', 'account_verify:' .. acc.verification_code)
        end
        acc.verification_code = ARGV[1]
        redis.call('SET', KEYS[1], cjson.encode(acc))
        redis.call('SET', 'account_verify:' .. ARGV[1], acc.id)
        return 1
        ",
    );

    let account_key = format!("account:{}", id);
    let updated: i32 = script.key(&account_key).arg(code).invoke_async(con).await?;
    Ok(updated > 0)
}

/// Persist a freshly issued token as the account's single active token.
///
/// Last write wins under concurrent logins; each issued token stays
/// cryptographically valid, but only the persisted one authorizes.
pub async fn set_active_token<C>(
    con: &mut C,
    id: &str,
    token: &str,
) -> Result<(), redis::RedisError>
where
    C: AsyncCommands,
{
    let script = redis::Script::new(
        r"
        local val = redis.call('GET', KEYS[1])
        if not val then
            return 0
        end
        local acc = cjson.decode(val)
        acc.active_token = ARGV[1]
        redis.call('SET', KEYS[1], cjson.encode(acc))
        return 1
        ",
    );

    let account_key = format!("account:{}", id);
    let _: i32 = script.key(&account_key).arg(token).invoke_async(con).await?;
    Ok(())
}

/// Clear the account's active token. A missing account or an already
/// cleared token is a no-op.
pub async fn clear_active_token<C>(con: &mut C, id: &str) -> Result<(), redis::RedisError>
where
    C: AsyncCommands,
{
    let script = redis::Script::new(
        r"
        local val = redis.call('GET', KEYS[1])
        if not val then
            return 0
        end
        local acc = cjson.decode(val)
        acc.active_token = nil
        redis.call('SET', KEYS[1], cjson.encode(acc))
        return 1
        ",
    );

    let account_key = format!("account:{}", id);
    let _: i32 = script.key(&account_key).invoke_async(con).await?;
    Ok(())
}

/// Update the account's subscription tier, returning the updated account.
pub async fn update_subscription<C>(
    con: &mut C,
    id: &str,
    subscription: &str,
) -> Result<Option<StoredAccount>, redis::RedisError>
where
    C: AsyncCommands,
{
    update_field(con, id, "subscription", subscription).await
}

/// Update the account's avatar URL, returning the updated account.
pub async fn set_avatar_url<C>(
    con: &mut C,
    id: &str,
    avatar_url: &str,
) -> Result<Option<StoredAccount>, redis::RedisError>
where
    C: AsyncCommands,
{
    update_field(con, id, "avatar_url", avatar_url).await
}

/// Atomically set one string field on the account JSON.
async fn update_field<C>(
    con: &mut C,
    id: &str,
    field: &str,
    value: &str,
) -> Result<Option<StoredAccount>, redis::RedisError>
where
    C: AsyncCommands,
{
    let script = redis::Script::new(
        r"
        local val = redis.call('GET', KEYS[1])
        if not val then
            return false
        end
        local acc = cjson.decode(val)
        acc[ARGV[1]] = ARGV[2]
        local out = cjson.encode(acc)
        redis.call('SET', KEYS[1], out)
        return out
        ",
    );

    let account_key = format!("account:{}", id);
    let json: Option<String> = script
        .key(&account_key)
        .arg(field)
        .arg(value)
        .invoke_async(con)
        .await?;

    match json {
        Some(data) => {
            let zeroizing_data = Zeroizing::new(data);
            let account = serde_json::from_str(&zeroizing_data).map_err(|e| {
                redis::RedisError::from((
                    redis::ErrorKind::TypeError,
                    "JSON deserialize",
                    e.to_string(),
                ))
            })?;
            Ok(Some(account))
        }
        None => Ok(None),
    }
}
