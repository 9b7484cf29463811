// src/lib.rs

use config::ClientConfig;
use error::ClientError;
use services::{backend_client::BackendClient, session_store::SessionStore};

/// Everything a front end needs, built once from the configuration.
#[derive(Clone)]
pub struct ClientState {
    pub config: ClientConfig,
    pub session: SessionStore,
    pub backend: BackendClient,
}

impl ClientState {
    pub fn from_config(config: ClientConfig) -> Result<Self, ClientError> {
        let session = SessionStore::open(&config.token_dir)?;
        let backend = BackendClient::with_settings(
            config.api_url.clone(),
            session.clone(),
            config.http_timeout,
            config.detail_cache_ttl,
        )?;
        Ok(Self {
            config,
            session,
            backend,
        })
    }
}

pub mod services {
    pub mod backend_client;
    pub mod session_store;
    pub mod push_channel;
    pub mod stomp;
}

pub mod models {
    pub mod coin;
    pub mod auth;
    pub mod favorite;
    pub mod news;
}

pub mod views {
    pub mod format;
    pub mod table;
    pub mod pagination;
    pub mod board;
    pub mod ticker;
    pub mod detail;
    pub mod favorites;
    pub mod news;
    pub mod forms;
    pub mod notification;
    pub mod terminal;
}

pub mod jobs;
pub mod config;
pub mod error;
