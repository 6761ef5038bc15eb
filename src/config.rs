use std::{env, path::PathBuf};

pub const DEFAULT_API_URL: &str = "http://127.0.0.1:8000";
pub const DEFAULT_PORT: u16 = 8080;
pub const DEFAULT_SESSION_PATH: &str = "data/session.json";
pub const DEFAULT_GYM_ID: u64 = 1;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub api_base_url: String,
    pub port: u16,
    pub session_path: PathBuf,
    pub gym_id: u64,
}

impl Config {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the configuration from an arbitrary key lookup. Missing or
    /// unparsable values fall back to the defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let api_base_url = lookup("GYM_API_URL")
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty())
            .unwrap_or_else(|| DEFAULT_API_URL.to_string());

        let port = lookup("PORT")
            .and_then(|value| value.parse::<u16>().ok())
            .unwrap_or(DEFAULT_PORT);

        let session_path = lookup("GYM_SESSION_PATH")
            .filter(|value| !value.is_empty())
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_SESSION_PATH));

        let gym_id = lookup("GYM_ID")
            .and_then(|value| value.parse::<u64>().ok())
            .unwrap_or(DEFAULT_GYM_ID);

        Self {
            api_base_url: api_base_url.trim_end_matches('/').to_string(),
            port,
            session_path,
            gym_id,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::from_lookup(|_| None)
    }
}
