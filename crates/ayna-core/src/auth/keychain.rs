use anyhow::{Context, Result};
use keyring::Entry;

const SERVICE_NAME: &str = "ayna-m3u";

/// The account password for one login, kept in the OS keychain so it never
/// lands in the config file.
pub struct PasswordVault {
    login: String,
}

impl PasswordVault {
    pub fn for_login(login: &str) -> Self {
        Self {
            login: login.to_string(),
        }
    }

    fn entry(&self) -> Result<Entry> {
        Entry::new(SERVICE_NAME, &self.login).context("Failed to open keychain entry")
    }

    pub fn store(&self, password: &str) -> Result<()> {
        self.entry()?
            .set_password(password)
            .with_context(|| format!("Failed to store password for {} in keychain", self.login))
    }

    pub fn password(&self) -> Result<String> {
        self.entry()?
            .get_password()
            .with_context(|| format!("No keychain password for {}", self.login))
    }

    pub fn forget(&self) -> Result<()> {
        self.entry()?
            .delete_credential()
            .with_context(|| format!("Failed to delete keychain password for {}", self.login))
    }
}
