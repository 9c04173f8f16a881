//! Token persistence and session-expiry hooks injected into the transport.

use std::{
    fs,
    path::{Path, PathBuf},
    sync::RwLock,
};

use shared::protocol::TokenPair;
use tracing::{info, warn};

use crate::error::ClientResult;

pub trait TokenStore: Send + Sync {
    fn tokens(&self) -> Option<TokenPair>;
    fn store(&self, tokens: TokenPair) -> ClientResult<()>;
    fn clear(&self) -> ClientResult<()>;

    fn access_token(&self) -> Option<String> {
        self.tokens().map(|tokens| tokens.access_token)
    }

    fn refresh_token(&self) -> Option<String> {
        self.tokens().and_then(|tokens| tokens.refresh_token)
    }

    fn has_session(&self) -> bool {
        self.access_token().is_some()
    }
}

/// Notified once the refresh attempt has failed and the tokens are gone.
pub trait SessionListener: Send + Sync {
    fn session_expired(&self, login_path: &str);
}

pub struct NoopSessionListener;

impl SessionListener for NoopSessionListener {
    fn session_expired(&self, _login_path: &str) {}
}

pub struct LoggingSessionListener;

impl SessionListener for LoggingSessionListener {
    fn session_expired(&self, login_path: &str) {
        warn!(login_path, "session expired; sign in again");
    }
}

#[derive(Default)]
pub struct MemoryTokenStore {
    tokens: RwLock<Option<TokenPair>>,
}

impl MemoryTokenStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_tokens(tokens: TokenPair) -> Self {
        Self {
            tokens: RwLock::new(Some(tokens)),
        }
    }
}

impl TokenStore for MemoryTokenStore {
    fn tokens(&self) -> Option<TokenPair> {
        self.tokens
            .read()
            .map(|guard| guard.clone())
            .unwrap_or_else(|poisoned| poisoned.into_inner().clone())
    }

    fn store(&self, tokens: TokenPair) -> ClientResult<()> {
        match self.tokens.write() {
            Ok(mut guard) => *guard = Some(tokens),
            Err(poisoned) => *poisoned.into_inner() = Some(tokens),
        }
        Ok(())
    }

    fn clear(&self) -> ClientResult<()> {
        match self.tokens.write() {
            Ok(mut guard) => *guard = None,
            Err(poisoned) => *poisoned.into_inner() = None,
        }
        Ok(())
    }
}

/// JSON file holding the token pair; a missing or unreadable file means
/// no session.
pub struct FileTokenStore {
    path: PathBuf,
    cached: MemoryTokenStore,
}

impl FileTokenStore {
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let cached = match read_tokens(&path) {
            Some(tokens) => MemoryTokenStore::with_tokens(tokens),
            None => MemoryTokenStore::new(),
        };
        Self { path, cached }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

fn read_tokens(path: &Path) -> Option<TokenPair> {
    let raw = fs::read_to_string(path).ok()?;
    match serde_json::from_str(&raw) {
        Ok(tokens) => Some(tokens),
        Err(err) => {
            warn!(path = %path.display(), "ignoring unreadable session file: {err}");
            None
        }
    }
}

impl TokenStore for FileTokenStore {
    fn tokens(&self) -> Option<TokenPair> {
        self.cached.tokens()
    }

    fn store(&self, tokens: TokenPair) -> ClientResult<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&self.path, serde_json::to_vec_pretty(&tokens)?)?;
        self.cached.store(tokens)
    }

    fn clear(&self) -> ClientResult<()> {
        if self.path.exists() {
            fs::remove_file(&self.path)?;
            info!(path = %self.path.display(), "removed session file");
        }
        self.cached.clear()
    }
}
