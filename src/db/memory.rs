// SPDX-License-Identifier: MIT

//! In-process credential store with single-record atomic updates.
//!
//! Records are keyed by user id in a [`DashMap`]; username and email each
//! have a secondary index enforcing uniqueness. A `get_mut` guard covers a
//! whole read-compare-write sequence on one record, which is what the
//! refresh-token compare-and-swap relies on.

use chrono::Utc;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use std::sync::Arc;
use subtle::ConstantTimeEq;
use uuid::Uuid;

use crate::error::AppError;
use crate::models::User;

/// Why a conditional refresh-token swap did not happen.
#[derive(Debug, PartialEq, Eq)]
pub enum RotateError {
    /// No record exists for the id embedded in the token.
    UnknownUser,
    /// The presented token no longer matches the stored one (superseded,
    /// cleared by logout, or lost a rotation race).
    StaleToken,
}

/// Fields needed to create a user record.
pub struct NewUser {
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub full_name: String,
    pub avatar: String,
    pub cover_image: Option<String>,
}

/// Shared in-memory user store.
#[derive(Clone, Default)]
pub struct UserStore {
    users: Arc<DashMap<Uuid, User>>,
    by_username: Arc<DashMap<String, Uuid>>,
    by_email: Arc<DashMap<String, Uuid>>,
}

impl UserStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a new user, enforcing username and email uniqueness.
    ///
    /// Both index entries are claimed before the record is written; if the
    /// email turns out to be taken, the username claim is released again so
    /// a failed registration leaves no trace.
    pub fn create_user(&self, new: NewUser) -> Result<User, AppError> {
        let id = Uuid::new_v4();

        match self.by_username.entry(new.username.clone()) {
            Entry::Occupied(_) => {
                return Err(AppError::Conflict(format!(
                    "Username '{}' is already taken",
                    new.username
                )));
            }
            Entry::Vacant(slot) => {
                slot.insert(id);
            }
        }

        match self.by_email.entry(new.email.clone()) {
            Entry::Occupied(_) => {
                self.by_username.remove(&new.username);
                return Err(AppError::Conflict(format!(
                    "Email '{}' is already registered",
                    new.email
                )));
            }
            Entry::Vacant(slot) => {
                slot.insert(id);
            }
        }

        let now = Utc::now();
        let user = User {
            id,
            username: new.username,
            email: new.email,
            password_hash: new.password_hash,
            full_name: new.full_name,
            avatar: new.avatar,
            cover_image: new.cover_image,
            watch_history: Vec::new(),
            refresh_token: None,
            created_at: now,
            updated_at: now,
        };
        self.users.insert(id, user.clone());

        Ok(user)
    }

    pub fn find_by_id(&self, id: Uuid) -> Option<User> {
        self.users.get(&id).map(|u| u.clone())
    }

    pub fn find_by_username(&self, username: &str) -> Option<User> {
        let id = *self.by_username.get(username)?;
        self.find_by_id(id)
    }

    pub fn find_by_email(&self, email: &str) -> Option<User> {
        let id = *self.by_email.get(email)?;
        self.find_by_id(id)
    }

    /// Unconditionally set the stored refresh token (login path).
    ///
    /// Only the token field and `updated_at` are touched; the rest of the
    /// record is not revalidated.
    pub fn set_refresh_token(&self, id: Uuid, token: &str) -> Result<(), AppError> {
        let mut user = self
            .users
            .get_mut(&id)
            .ok_or_else(|| AppError::NotFound(format!("User {id} not found")))?;
        user.refresh_token = Some(token.to_string());
        user.updated_at = Utc::now();
        Ok(())
    }

    /// Conditionally replace the stored refresh token (refresh path).
    ///
    /// The swap only happens if the stored token still equals `presented`
    /// at write time; the record guard is held across compare and write, so
    /// two rotations racing on the same presented token cannot both win.
    pub fn rotate_refresh_token(
        &self,
        id: Uuid,
        presented: &str,
        replacement: &str,
    ) -> Result<(), RotateError> {
        let mut user = self.users.get_mut(&id).ok_or(RotateError::UnknownUser)?;

        let matches = match user.refresh_token.as_deref() {
            Some(stored) => stored.as_bytes().ct_eq(presented.as_bytes()).into(),
            None => false,
        };
        if !matches {
            return Err(RotateError::StaleToken);
        }

        user.refresh_token = Some(replacement.to_string());
        user.updated_at = Utc::now();
        Ok(())
    }

    /// Clear the stored refresh token (logout path). Idempotent: returns
    /// `false` when the field was already empty and nothing was written.
    pub fn clear_refresh_token(&self, id: Uuid) -> Result<bool, AppError> {
        let mut user = self
            .users
            .get_mut(&id)
            .ok_or_else(|| AppError::NotFound(format!("User {id} not found")))?;
        if user.refresh_token.is_none() {
            return Ok(false);
        }
        user.refresh_token = None;
        user.updated_at = Utc::now();
        Ok(true)
    }

    /// Replace the stored password hash without touching other fields.
    pub fn update_password_hash(&self, id: Uuid, hash: &str) -> Result<(), AppError> {
        let mut user = self
            .users
            .get_mut(&id)
            .ok_or_else(|| AppError::NotFound(format!("User {id} not found")))?;
        user.password_hash = hash.to_string();
        user.updated_at = Utc::now();
        Ok(())
    }

    /// Remove a user record and its index entries.
    pub fn delete_user(&self, id: Uuid) -> Option<User> {
        let (_, user) = self.users.remove(&id)?;
        self.by_username.remove(&user.username);
        self.by_email.remove(&user.email);
        Some(user)
    }
}
