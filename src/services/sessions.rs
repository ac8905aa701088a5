// SPDX-License-Identifier: MIT

//! Session lifecycle: login, refresh-token rotation, logout and password
//! change.
//!
//! The stored refresh token is the single revocation slot per user: login
//! overwrites it, refresh replaces it only if the presented value still
//! matches (compare-and-swap in the store), logout clears it. A pair is
//! never returned to the caller unless the store write already succeeded.

use std::sync::Arc;
use uuid::Uuid;

use crate::db::{RotateError, UserStore};
use crate::error::AppError;
use crate::models::{normalize_identifier, PublicUser, User};
use crate::services::password::{hash_password, verify_password};
use crate::services::tokens::{TokenIssuer, TokenPair};

/// Successful login: sanitized user plus the fresh token pair.
#[derive(Debug)]
pub struct SessionResult {
    pub user: PublicUser,
    pub tokens: TokenPair,
}

/// Drives the token lifecycle against the credential store.
#[derive(Clone)]
pub struct SessionService {
    store: UserStore,
    tokens: Arc<TokenIssuer>,
}

impl SessionService {
    pub fn new(store: UserStore, tokens: Arc<TokenIssuer>) -> Self {
        Self { store, tokens }
    }

    /// Log a user in by username or email plus password.
    pub fn login(
        &self,
        username: Option<&str>,
        email: Option<&str>,
        password: &str,
    ) -> Result<SessionResult, AppError> {
        let user = self.lookup(username, email)?;

        if !verify_password(&user.password_hash, password) {
            tracing::debug!(user = %user.username, "Password verification failed");
            return Err(AppError::Unauthenticated);
        }

        let pair = self.tokens.issue_pair(&user)?;
        self.store.set_refresh_token(user.id, &pair.refresh_token)?;

        tracing::info!(user = %user.username, "User logged in");

        Ok(SessionResult {
            user: PublicUser::from(&user),
            tokens: pair,
        })
    }

    /// Rotate a refresh token into a new pair.
    ///
    /// Expired or malformed tokens fail as `InvalidToken` before any store
    /// lookup, so a superseded-but-expired token is never reported as
    /// reuse. The swap is conditional on the stored value still equaling
    /// the presented one; losing that race is `TokenReuse`.
    pub fn refresh(&self, presented: &str) -> Result<TokenPair, AppError> {
        let claims = self.tokens.verify_refresh(presented)?;
        let user_id: Uuid = claims.sub.parse().map_err(|_| AppError::InvalidToken)?;

        let user = self
            .store
            .find_by_id(user_id)
            .ok_or(AppError::InvalidToken)?;

        let pair = self.tokens.issue_pair(&user)?;

        match self
            .store
            .rotate_refresh_token(user_id, presented, &pair.refresh_token)
        {
            Ok(()) => {}
            Err(RotateError::UnknownUser) => return Err(AppError::InvalidToken),
            Err(RotateError::StaleToken) => {
                tracing::warn!(user = %user.username, "Stale refresh token presented");
                return Err(AppError::TokenReuse);
            }
        }

        tracing::debug!(user = %user.username, "Refresh token rotated");

        Ok(pair)
    }

    /// Clear the stored refresh token. Safe to call repeatedly; the second
    /// call performs no write.
    pub fn logout(&self, user_id: Uuid) -> Result<(), AppError> {
        let cleared = self.store.clear_refresh_token(user_id)?;
        if cleared {
            tracing::info!(%user_id, "User logged out");
        }
        Ok(())
    }

    /// Replace the password after verifying the old one. Outstanding
    /// tokens are left untouched; they expire naturally.
    pub fn change_password(
        &self,
        user_id: Uuid,
        old_password: &str,
        new_password: &str,
    ) -> Result<(), AppError> {
        let user = self
            .store
            .find_by_id(user_id)
            .ok_or_else(|| AppError::NotFound(format!("User {user_id} not found")))?;

        if !verify_password(&user.password_hash, old_password) {
            return Err(AppError::Unauthenticated);
        }

        let hash = hash_password(new_password)?;
        self.store.update_password_hash(user_id, &hash)?;

        tracing::info!(user = %user.username, "Password changed");
        Ok(())
    }

    fn lookup(&self, username: Option<&str>, email: Option<&str>) -> Result<User, AppError> {
        let found = match (username, email) {
            (Some(name), _) if !name.trim().is_empty() => {
                self.store.find_by_username(&normalize_identifier(name))
            }
            (_, Some(addr)) if !addr.trim().is_empty() => {
                self.store.find_by_email(&normalize_identifier(addr))
            }
            _ => {
                return Err(AppError::Validation(
                    "Username or email is required".to_string(),
                ))
            }
        };

        found.ok_or_else(|| AppError::NotFound("User does not exist".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::NewUser;

    fn service() -> (SessionService, Uuid) {
        let store = UserStore::new();
        let user = store
            .create_user(NewUser {
                username: "alice".into(),
                email: "alice@x.com".into(),
                password_hash: hash_password("pw123").unwrap(),
                full_name: "Alice A".into(),
                avatar: "/media/a.png".into(),
                cover_image: None,
            })
            .unwrap();
        let tokens = Arc::new(TokenIssuer::new(b"acc", b"ref", 900, 86400));
        (SessionService::new(store, tokens), user.id)
    }

    #[test]
    fn test_login_persists_refresh_token() {
        let (svc, id) = service();
        let session = svc.login(Some("alice"), None, "pw123").unwrap();

        let stored = svc.store.find_by_id(id).unwrap().refresh_token;
        assert_eq!(stored.as_deref(), Some(session.tokens.refresh_token.as_str()));
    }

    #[test]
    fn test_login_by_email_and_case_insensitive() {
        let (svc, _) = service();
        svc.login(None, Some("  ALICE@X.COM "), "pw123").unwrap();
        svc.login(Some("Alice"), None, "pw123").unwrap();
    }

    #[test]
    fn test_login_failures() {
        let (svc, _) = service();

        assert!(matches!(
            svc.login(None, None, "pw123").unwrap_err(),
            AppError::Validation(_)
        ));
        assert!(matches!(
            svc.login(Some("bob"), None, "pw123").unwrap_err(),
            AppError::NotFound(_)
        ));
        assert!(matches!(
            svc.login(Some("alice"), None, "wrong").unwrap_err(),
            AppError::Unauthenticated
        ));

        // No refresh token persisted by any failed path.
        let user = svc.store.find_by_username("alice").unwrap();
        assert!(user.refresh_token.is_none());
    }

    #[test]
    fn test_refresh_rotates_and_rejects_reuse() {
        let (svc, _) = service();
        let session = svc.login(Some("alice"), None, "pw123").unwrap();

        let pair = svc.refresh(&session.tokens.refresh_token).unwrap();
        assert_ne!(pair.refresh_token, session.tokens.refresh_token);

        // The superseded token still has a valid signature but must fail.
        assert!(matches!(
            svc.refresh(&session.tokens.refresh_token).unwrap_err(),
            AppError::TokenReuse
        ));

        // The current one keeps working.
        svc.refresh(&pair.refresh_token).unwrap();
    }

    #[test]
    fn test_refresh_after_logout_is_rejected() {
        let (svc, id) = service();
        let session = svc.login(Some("alice"), None, "pw123").unwrap();

        svc.logout(id).unwrap();
        assert!(matches!(
            svc.refresh(&session.tokens.refresh_token).unwrap_err(),
            AppError::TokenReuse
        ));
    }

    #[test]
    fn test_expired_refresh_is_invalid_not_reuse() {
        let (svc, id) = service();
        let expired_issuer = TokenIssuer::new(b"acc", b"ref", -60, -60);
        let user = svc.store.find_by_id(id).unwrap();
        let pair = expired_issuer.issue_pair(&user).unwrap();
        svc.store.set_refresh_token(id, &pair.refresh_token).unwrap();

        assert!(matches!(
            svc.refresh(&pair.refresh_token).unwrap_err(),
            AppError::InvalidToken
        ));
    }

    #[test]
    fn test_refresh_for_deleted_user_is_invalid() {
        let (svc, id) = service();
        let session = svc.login(Some("alice"), None, "pw123").unwrap();
        svc.store.delete_user(id).unwrap();

        assert!(matches!(
            svc.refresh(&session.tokens.refresh_token).unwrap_err(),
            AppError::InvalidToken
        ));
    }

    #[test]
    fn test_logout_idempotent() {
        let (svc, id) = service();
        svc.login(Some("alice"), None, "pw123").unwrap();

        svc.logout(id).unwrap();
        svc.logout(id).unwrap();
    }

    #[test]
    fn test_change_password() {
        let (svc, id) = service();

        assert!(matches!(
            svc.change_password(id, "wrong", "newpw").unwrap_err(),
            AppError::Unauthenticated
        ));

        svc.change_password(id, "pw123", "newpw").unwrap();
        assert!(matches!(
            svc.login(Some("alice"), None, "pw123").unwrap_err(),
            AppError::Unauthenticated
        ));
        svc.login(Some("alice"), None, "newpw").unwrap();
    }
}
