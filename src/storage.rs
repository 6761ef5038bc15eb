use crate::models::TokenPair;
use crate::session::MemorySession;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tokio::fs;
use tracing::error;

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
struct StoredSession {
    #[serde(default)]
    username: Option<String>,
    #[serde(default)]
    tokens: Option<TokenPair>,
}

/// Restores the session saved by a previous run. Unreadable or corrupt files
/// yield a signed-out session.
pub async fn load_session(path: &Path) -> MemorySession {
    let stored = match fs::read(path).await {
        Ok(bytes) => match serde_json::from_slice::<StoredSession>(&bytes) {
            Ok(stored) => stored,
            Err(err) => {
                error!("failed to parse session file: {err}");
                StoredSession::default()
            }
        },
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => StoredSession::default(),
        Err(err) => {
            error!("failed to read session file: {err}");
            StoredSession::default()
        }
    };

    let session = MemorySession::new();
    if let Some(tokens) = stored.tokens {
        session.set(stored.username, tokens);
    }
    session
}

pub async fn persist_session(path: &Path, session: &MemorySession) -> Result<(), std::io::Error> {
    let stored = StoredSession {
        username: session.username(),
        tokens: session.tokens(),
    };
    let payload = serde_json::to_vec_pretty(&stored)?;
    if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
        fs::create_dir_all(parent).await?;
    }
    fs::write(path, payload).await?;
    Ok(())
}
