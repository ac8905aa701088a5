//! User model for storage and API.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// User record as persisted in the credential store.
///
/// `password_hash` and `refresh_token` never leave the store layer in API
/// responses; handlers return [`PublicUser`] instead.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    /// Stable opaque id (also the store key)
    pub id: Uuid,
    /// Unique handle, lowercased and trimmed
    pub username: String,
    /// Unique email, lowercased and trimmed
    pub email: String,
    /// Argon2 PHC-format password hash
    pub password_hash: String,
    /// Display name
    pub full_name: String,
    /// Avatar media reference (required at registration)
    pub avatar: String,
    /// Optional cover image media reference
    pub cover_image: Option<String>,
    /// Ordered list of watched content ids
    pub watch_history: Vec<Uuid>,
    /// The single currently-valid refresh token, if any
    pub refresh_token: Option<String>,
    /// When the account was created
    pub created_at: DateTime<Utc>,
    /// Last mutation timestamp
    pub updated_at: DateTime<Utc>,
}

/// Sanitized user view returned to clients.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicUser {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub full_name: String,
    pub avatar: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cover_image: Option<String>,
    pub watch_history: Vec<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<&User> for PublicUser {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            username: user.username.clone(),
            email: user.email.clone(),
            full_name: user.full_name.clone(),
            avatar: user.avatar.clone(),
            cover_image: user.cover_image.clone(),
            watch_history: user.watch_history.clone(),
            created_at: user.created_at,
            updated_at: user.updated_at,
        }
    }
}

/// Canonical form for usernames and emails: lowercased, surrounding
/// whitespace removed. Uniqueness checks operate on this form.
pub fn normalize_identifier(raw: &str) -> String {
    raw.trim().to_lowercase()
}
