use crate::models::TokenPair;
use std::sync::{Arc, RwLock};

/// Where the remote client reads its bearer credential from.
pub trait SessionProvider: Send + Sync {
    fn token(&self) -> Option<String>;
    fn clear(&self);
}

/// Process-wide token holder, shared between the web surface and the clients.
#[derive(Debug, Clone, Default)]
pub struct MemorySession {
    inner: Arc<RwLock<SessionData>>,
}

#[derive(Debug, Clone, Default)]
struct SessionData {
    username: Option<String>,
    tokens: Option<TokenPair>,
}

impl MemorySession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_tokens(username: Option<String>, tokens: TokenPair) -> Self {
        let session = Self::new();
        session.set(username, tokens);
        session
    }

    pub fn set(&self, username: Option<String>, tokens: TokenPair) {
        let mut data = self.inner.write().unwrap_or_else(|poisoned| poisoned.into_inner());
        data.username = username;
        data.tokens = Some(tokens);
    }

    pub fn username(&self) -> Option<String> {
        let data = self.inner.read().unwrap_or_else(|poisoned| poisoned.into_inner());
        data.username.clone()
    }

    pub fn tokens(&self) -> Option<TokenPair> {
        let data = self.inner.read().unwrap_or_else(|poisoned| poisoned.into_inner());
        data.tokens.clone()
    }

    pub fn is_signed_in(&self) -> bool {
        self.token().is_some()
    }
}

impl SessionProvider for MemorySession {
    fn token(&self) -> Option<String> {
        let data = self.inner.read().unwrap_or_else(|poisoned| poisoned.into_inner());
        data.tokens
            .as_ref()
            .map(|tokens| tokens.access.clone())
            .filter(|access| !access.is_empty())
    }

    fn clear(&self) {
        let mut data = self.inner.write().unwrap_or_else(|poisoned| poisoned.into_inner());
        *data = SessionData::default();
    }
}
