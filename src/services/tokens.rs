// SPDX-License-Identifier: MIT

//! Access and refresh token issuance and verification.
//!
//! Two independent HS256 keys: the access token carries the identity
//! fields and is verified statelessly; the refresh token carries only the
//! user id and must additionally match the value stored on the user record
//! (checked by the session layer, not here).

use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use crate::config::Config;
use crate::error::AppError;
use crate::models::User;

/// Claims carried by an access token.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct AccessClaims {
    /// Subject (user id)
    pub sub: String,
    pub email: String,
    pub username: String,
    pub fullname: String,
    /// Issued at (Unix timestamp)
    pub iat: usize,
    /// Expiration time (Unix timestamp)
    pub exp: usize,
}

/// Claims carried by a refresh token: the user id only.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct RefreshClaims {
    pub sub: String,
    pub iat: usize,
    pub exp: usize,
}

/// A freshly minted access/refresh token pair.
#[derive(Debug, Clone)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
}

/// Signs and verifies token pairs. Pure function of user identity and the
/// current time; persistence of the refresh token is the caller's job.
pub struct TokenIssuer {
    access_encoding: EncodingKey,
    access_decoding: DecodingKey,
    refresh_encoding: EncodingKey,
    refresh_decoding: DecodingKey,
    access_ttl_secs: i64,
    refresh_ttl_secs: i64,
}

impl TokenIssuer {
    pub fn new(
        access_secret: &[u8],
        refresh_secret: &[u8],
        access_ttl_secs: i64,
        refresh_ttl_secs: i64,
    ) -> Self {
        Self {
            access_encoding: EncodingKey::from_secret(access_secret),
            access_decoding: DecodingKey::from_secret(access_secret),
            refresh_encoding: EncodingKey::from_secret(refresh_secret),
            refresh_decoding: DecodingKey::from_secret(refresh_secret),
            access_ttl_secs,
            refresh_ttl_secs,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(
            &config.access_token_secret,
            &config.refresh_token_secret,
            config.access_token_ttl_secs,
            config.refresh_token_ttl_secs,
        )
    }

    /// Mint an access/refresh pair for a user. Fails only on signing
    /// misconfiguration, which is fatal rather than user-facing.
    pub fn issue_pair(&self, user: &User) -> Result<TokenPair, AppError> {
        let now = chrono::Utc::now().timestamp();
        let header = Header::new(Algorithm::HS256);

        let access_claims = AccessClaims {
            sub: user.id.to_string(),
            email: user.email.clone(),
            username: user.username.clone(),
            fullname: user.full_name.clone(),
            iat: now as usize,
            exp: (now + self.access_ttl_secs) as usize,
        };
        let access_token = encode(&header, &access_claims, &self.access_encoding)
            .map_err(|e| AppError::Fatal(anyhow::anyhow!("access token signing failed: {e}")))?;

        let refresh_claims = RefreshClaims {
            sub: user.id.to_string(),
            iat: now as usize,
            exp: (now + self.refresh_ttl_secs) as usize,
        };
        let refresh_token = encode(&header, &refresh_claims, &self.refresh_encoding)
            .map_err(|e| AppError::Fatal(anyhow::anyhow!("refresh token signing failed: {e}")))?;

        Ok(TokenPair {
            access_token,
            refresh_token,
        })
    }

    /// Verify an access token's signature and expiry.
    pub fn verify_access(&self, token: &str) -> Result<AccessClaims, AppError> {
        decode::<AccessClaims>(token, &self.access_decoding, &strict_validation())
            .map(|data| data.claims)
            .map_err(|_| AppError::InvalidToken)
    }

    /// Verify a refresh token's signature and expiry. The stored-value
    /// comparison happens separately in the session layer.
    pub fn verify_refresh(&self, token: &str) -> Result<RefreshClaims, AppError> {
        decode::<RefreshClaims>(token, &self.refresh_decoding, &strict_validation())
            .map(|data| data.claims)
            .map_err(|_| AppError::InvalidToken)
    }
}

/// HS256 validation with zero leeway, so expiry is deterministic.
fn strict_validation() -> Validation {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.leeway = 0;
    validation
}
