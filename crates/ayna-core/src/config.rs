//! Application configuration management.
//!
//! This module handles loading and saving the application configuration:
//! API endpoint, operator and device identity, account login, client
//! profiles and timeouts.
//!
//! Configuration is stored at `~/.config/ayna-m3u/config.json`. The account
//! password is never written here; it comes from `AYNA_PASSWORD` or the OS
//! keychain.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::Duration;
use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::auth::{PasswordVault, DEFAULT_REFRESH_MARGIN_SECS, TOKEN_FILE};
use crate::models::{LoginRequest, MAX_EXPIRES_IN_SECS};

/// Application name used for config/cache directory paths
pub const APP_NAME: &str = "ayna-m3u";

/// Config file name
const CONFIG_FILE: &str = "config.json";

pub const ENV_LOGIN: &str = "AYNA_LOGIN";
pub const ENV_PASSWORD: &str = "AYNA_PASSWORD";

const DEFAULT_BASE_URL: &str = "https://web.aynaott.com";
const DEFAULT_OPERATOR_ID: &str = "1fb1b4c7-dbd9-469e-88a2-c207dc195869";

/// Client identification sent alongside API calls
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeviceProfile {
    pub client: String,
    pub os: String,
    pub platform: String,
    pub density: f64,
}

impl DeviceProfile {
    fn new(client: &str, os: &str, platform: &str, density: f64) -> Self {
        Self {
            client: client.to_string(),
            os: os.to_string(),
            platform: platform.to_string(),
            density,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub base_url: String,
    pub operator_id: String,
    /// 32 upper-case hex characters; generated on first use
    pub device_id: String,
    /// Sent as `x-user-id` when set
    pub user_id: Option<String>,
    pub language: String,
    pub login: Option<String>,
    pub login_profile: DeviceProfile,
    pub catalog_profile: DeviceProfile,
    pub stream_profile: DeviceProfile,
    pub refresh_margin_secs: i64,
    pub request_timeout_secs: u64,
    pub link_check_timeout_secs: u64,
    pub token_file: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            operator_id: DEFAULT_OPERATOR_ID.to_string(),
            device_id: String::new(),
            user_id: None,
            language: "en".to_string(),
            login: None,
            login_profile: DeviceProfile::new("browser", "ios", "mobile", 3.0000001192092896),
            catalog_profile: DeviceProfile::new("browser", "ios", "mobile", 1.25),
            stream_profile: DeviceProfile::new("browser", "windows", "web", 1.25),
            refresh_margin_secs: DEFAULT_REFRESH_MARGIN_SECS,
            request_timeout_secs: 15,
            link_check_timeout_secs: 5,
            token_file: None,
        }
    }
}

impl Config {
    /// Load from `path`, or the default location when `None`.
    /// A missing file yields the defaults.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let path = match path {
            Some(p) => p.to_path_buf(),
            None => Self::config_path()?,
        };
        if path.exists() {
            let contents = std::fs::read_to_string(&path)
                .with_context(|| format!("Failed to read config file {}", path.display()))?;
            serde_json::from_str(&contents)
                .with_context(|| format!("Failed to parse config file {}", path.display()))
        } else {
            debug!(path = %path.display(), "No config file, using defaults");
            Ok(Self::default())
        }
    }

    pub fn save(&self, path: Option<&Path>) -> Result<()> {
        let path = match path {
            Some(p) => p.to_path_buf(),
            None => Self::config_path()?,
        };
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let contents = serde_json::to_string_pretty(self)?;
        std::fs::write(path, contents)?;
        Ok(())
    }

    pub fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find config directory"))?;
        Ok(config_dir.join(APP_NAME).join(CONFIG_FILE))
    }

    pub fn cache_dir(&self) -> Result<PathBuf> {
        let cache_dir = dirs::cache_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find cache directory"))?;
        Ok(cache_dir.join(APP_NAME))
    }

    /// Token file location: `token_file` if set, else `<cache>/token.json`
    pub fn token_path(&self) -> Result<PathBuf> {
        match self.token_file {
            Some(ref path) => Ok(path.clone()),
            None => Ok(self.cache_dir()?.join(TOKEN_FILE)),
        }
    }

    /// Apply overrides from the process environment
    pub fn apply_env(&mut self) {
        self.apply_vars(|key| std::env::var(key).ok());
    }

    fn apply_vars(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(login) = lookup(ENV_LOGIN).filter(|v| !v.is_empty()) {
            self.login = Some(login);
        }
    }

    /// Generate a device id if none is configured. Returns true when the
    /// config changed and should be saved.
    pub fn ensure_device_id(&mut self) -> bool {
        if !self.device_id.is_empty() {
            return false;
        }
        let bytes: [u8; 16] = rand::thread_rng().gen();
        self.device_id = bytes.iter().map(|b| format!("{:02X}", b)).collect();
        true
    }

    pub fn account_login(&self) -> Result<&str> {
        self.login
            .as_deref()
            .filter(|l| !l.is_empty())
            .ok_or_else(|| {
                anyhow::anyhow!(
                    "No account login configured. Set {} or run `ayna-m3u login`.",
                    ENV_LOGIN
                )
            })
    }

    /// Account password from `AYNA_PASSWORD`, falling back to the keychain
    pub fn password(&self) -> Result<String> {
        if let Ok(password) = std::env::var(ENV_PASSWORD) {
            if !password.is_empty() {
                return Ok(password);
            }
        }
        let login = self.account_login()?;
        PasswordVault::for_login(login).password().with_context(|| {
            format!("No password for {}. Set {} or run `ayna-m3u login`.", login, ENV_PASSWORD)
        })
    }

    /// Login body for the configured account. The login is left empty
    /// when none is configured; the token cache refuses to send that.
    pub fn login_request(&self, password: String) -> LoginRequest {
        LoginRequest {
            client: self.login_profile.client.clone(),
            density: self.login_profile.density,
            device_id: self.device_id.clone(),
            language: self.language.clone(),
            login: self.login.clone().unwrap_or_default(),
            operator_id: self.operator_id.clone(),
            os: self.login_profile.os.clone(),
            password,
            platform: self.login_profile.platform.clone(),
        }
    }

    /// Refresh margin, clamped to between zero and the longest accepted
    /// token lifetime
    pub fn refresh_margin(&self) -> Duration {
        Duration::seconds(self.refresh_margin_secs.clamp(0, MAX_EXPIRES_IN_SECS))
    }
}
