// SPDX-License-Identifier: MIT

//! Core services: token issuance, session lifecycle, password hashing and
//! media storage.

pub mod media;
pub mod password;
pub mod sessions;
pub mod tokens;

pub use media::MediaStore;
pub use sessions::{SessionResult, SessionService};
pub use tokens::{AccessClaims, RefreshClaims, TokenIssuer, TokenPair};
