//! Subcommand implementations and the setup they share.

pub mod auth;
pub mod playlist;

use std::path::Path;

use anyhow::Result;
use ayna_core::{ApiClient, Config, FileTokenStore, TokenCache};
use tracing::debug;

pub type Tokens = TokenCache<ApiClient, FileTokenStore>;

/// Load the config, persisting a freshly generated device id, then apply
/// environment overrides (which are not persisted).
pub fn load_config(path: Option<&Path>) -> Result<Config> {
    let mut config = Config::load(path)?;
    if config.ensure_device_id() {
        debug!(device_id = %config.device_id, "Generated device id");
        config.save(path)?;
    }
    config.apply_env();
    Ok(config)
}

/// Token cache over the file store, plus a client for data calls that
/// shares its connection pool.
pub fn token_cache(config: &Config, password: Option<String>) -> Result<(Tokens, ApiClient)> {
    let password = match password {
        Some(password) => password,
        // Only needed if we end up logging in
        None => config.password().unwrap_or_else(|e| {
            debug!(error = %e, "No password available");
            String::new()
        }),
    };

    let api = ApiClient::new(config)?;
    let store = FileTokenStore::new(config.token_path()?);
    let tokens = TokenCache::new(api.clone(), store, config.login_request(password))
        .with_margin(config.refresh_margin());
    Ok((tokens, api))
}

/// Truncate a token for display, adding ellipsis if needed
pub fn preview(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let truncated: String = s.chars().take(max_len).collect();
        format!("{}...", truncated)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_preview() {
        assert_eq!(preview("short", 40), "short");
        assert_eq!(preview("abcdefghij", 4), "abcd...");
    }

    #[test]
    fn test_load_config_generates_and_persists_device_id() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("config.json");

        let first = load_config(Some(&path)).expect("config");
        assert_eq!(first.device_id.len(), 32);
        assert!(path.exists());

        let second = load_config(Some(&path)).expect("config");
        assert_eq!(second.device_id, first.device_id);
    }
}
