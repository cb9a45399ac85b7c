//! Session token storage.
//!
//! This module provides:
//! - `TokenStore`: the get/set/clear contract shared by the HTTP client and the route guard
//! - `MemoryTokenStore`: process-local store
//! - `FileTokenStore`: key-value file in the cache directory, survives restarts
//! - `KeyringTokenStore`: OS keychain entry
//!
//! A stored token is trusted until it is overwritten or cleared; there is no
//! client-side expiry.

pub mod keychain;
pub mod session;

use std::sync::Arc;

use anyhow::Result;

use crate::config::{Config, TokenBackend};

pub use keychain::KeyringTokenStore;
pub use session::{FileTokenStore, MemoryTokenStore, TokenStore, TOKEN_KEY};

/// Session context injected into the HTTP clients and the router.
pub type SharedSession = Arc<dyn TokenStore>;

/// Open the token store selected by the configuration.
pub fn open_session(config: &Config) -> Result<SharedSession> {
    let session: SharedSession = match config.token_backend {
        TokenBackend::File => Arc::new(FileTokenStore::open(config.cache_dir()?)?),
        TokenBackend::Keyring => Arc::new(KeyringTokenStore::new()?),
    };
    Ok(session)
}
