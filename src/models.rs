//! Request and response models for the API.
//!
//! All models use serde for serialization/deserialization.
//! Storage models represent Redis data structures.

use serde::{Deserialize, Serialize};

// ============================================================================
// Account Models
// ============================================================================

/// Signup/login request body. Both endpoints take the same credentials.
#[derive(Debug, Deserialize)]
pub struct CredentialsRequest {
    pub email: String,
    pub password: String,
}

/// Public view of an account: what signup, login and current return.
#[derive(Debug, Serialize)]
pub struct AccountSummary {
    pub email: String,
    pub subscription: String,
}

/// Response after a successful login.
#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub token: String,
    pub user: AccountSummary,
}

/// Response after a successful signup.
#[derive(Debug, Serialize)]
pub struct SignupResponse {
    pub user: AccountSummary,
}

/// Request to re-send a verification email.
///
/// `email` is optional so a missing field yields the documented 400
/// message instead of a generic deserialization rejection.
#[derive(Debug, Deserialize)]
pub struct ResendVerificationRequest {
    pub email: Option<String>,
}

/// Request to change the subscription tier.
#[derive(Debug, Deserialize)]
pub struct SubscriptionRequest {
    pub subscription: String,
}

/// Response after an avatar upload.
#[derive(Debug, Serialize)]
pub struct AvatarResponse {
    pub avatar_url: String,
}

// ============================================================================
// Contact Models
// ============================================================================

/// Contact create/update request body.
#[derive(Debug, Deserialize)]
pub struct ContactRequest {
    pub name: String,
    pub email: String,
    pub phone: String,
    #[serde(default)]
    pub favorite: bool,
}

/// Request to toggle a contact's favorite flag.
///
/// `favorite` is optional so a missing field yields the documented 400
/// message instead of a generic deserialization rejection.
#[derive(Debug, Deserialize)]
pub struct FavoriteRequest {
    pub favorite: Option<bool>,
}

/// Paginated contact listing.
#[derive(Debug, Serialize)]
pub struct ContactListResponse {
    pub contacts: Vec<StoredContact>,
    pub total_pages: u64,
    pub current_page: u64,
}

// ============================================================================
// Storage Models
// ============================================================================

/// Account data as stored in Redis.
///
/// Optional fields are omitted from the JSON entirely when absent so the
/// store's conditional-update scripts can clear them by key removal.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredAccount {
    pub id: String,
    pub email: String,
    pub password_hash: String,
    pub subscription: String,
    pub avatar_url: String,
    pub verified: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub active_token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub verification_code: Option<String>,
    pub created_at: u64,
}

impl StoredAccount {
    pub fn summary(&self) -> AccountSummary {
        AccountSummary {
            email: self.email.clone(),
            subscription: self.subscription.clone(),
        }
    }
}

/// Contact data as stored in Redis.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredContact {
    pub id: String,
    pub name: String,
    pub email: String,
    pub phone: String,
    #[serde(default)]
    pub favorite: bool,
    pub created_at: u64,
}

// ============================================================================
// Subscription Tiers
// ============================================================================

/// Subscription tier types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SubscriptionTier {
    Starter,
    Pro,
    Business,
}

impl SubscriptionTier {
    pub fn as_str(&self) -> &'static str {
        match self {
            SubscriptionTier::Starter => "starter",
            SubscriptionTier::Pro => "pro",
            SubscriptionTier::Business => "business",
        }
    }
}

impl std::fmt::Display for SubscriptionTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for SubscriptionTier {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "starter" => Ok(SubscriptionTier::Starter),
            "pro" => Ok(SubscriptionTier::Pro),
            "business" => Ok(SubscriptionTier::Business),
            _ => Err(format!("Invalid subscription tier: {}", s)),
        }
    }
}
