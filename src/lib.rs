// SPDX-License-Identifier: MIT

//! Vidtube: backend API for a small video-sharing platform.
//!
//! This crate provides user registration with avatar upload, JWT-based
//! login with access/refresh token rotation, and profile endpoints.

pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod models;
pub mod response;
pub mod routes;
pub mod services;

use std::sync::Arc;

use config::Config;
use db::UserStore;
use services::{MediaStore, SessionService, TokenIssuer};

/// Shared application state.
pub struct AppState {
    pub config: Config,
    pub store: UserStore,
    pub tokens: Arc<TokenIssuer>,
    pub media: MediaStore,
    pub sessions: SessionService,
}

impl AppState {
    /// Wire up state from a config and a (possibly pre-populated) store.
    pub fn new(config: Config, store: UserStore) -> Self {
        let tokens = Arc::new(TokenIssuer::from_config(&config));
        let media = MediaStore::new(&config.media_dir);
        let sessions = SessionService::new(store.clone(), tokens.clone());

        Self {
            config,
            store,
            tokens,
            media,
            sessions,
        }
    }
}
