use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing::{debug, warn};

use super::Credential;

/// Token file name in the cache directory
pub const TOKEN_FILE: &str = "token.json";

/// Persistence for the current credential.
///
/// Single-writer: nothing here coordinates between processes.
pub trait TokenStore {
    fn load(&self) -> Result<Option<Credential>>;
    fn save(&mut self, credential: &Credential) -> Result<()>;
    fn clear(&mut self) -> Result<()>;
}

/// Credential kept as JSON on disk, readable by the owner only.
pub struct FileTokenStore {
    path: PathBuf,
}

impl FileTokenStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Store at `token.json` inside `cache_dir`
    pub fn in_dir(cache_dir: &Path) -> Self {
        Self::new(cache_dir.join(TOKEN_FILE))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_else(|| TOKEN_FILE.into());
        name.push(".tmp");
        self.path.with_file_name(name)
    }

    fn write_private(path: &Path, contents: &str) -> Result<()> {
        let mut options = OpenOptions::new();
        options.write(true).create(true).truncate(true);
        #[cfg(unix)]
        {
            use std::os::unix::fs::OpenOptionsExt;
            options.mode(0o600);
        }
        let mut file = options
            .open(path)
            .with_context(|| format!("Failed to open {}", path.display()))?;
        #[cfg(unix)]
        {
            // mode() only applies on creation; tighten a pre-existing file too
            use std::fs::Permissions;
            use std::os::unix::fs::PermissionsExt;
            file.set_permissions(Permissions::from_mode(0o600))?;
        }
        file.write_all(contents.as_bytes())?;
        file.sync_all()?;
        Ok(())
    }
}

impl TokenStore for FileTokenStore {
    fn load(&self) -> Result<Option<Credential>> {
        if !self.path.exists() {
            return Ok(None);
        }
        let contents = match std::fs::read_to_string(&self.path) {
            Ok(contents) => contents,
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "Token file unreadable, ignoring");
                return Ok(None);
            }
        };
        match serde_json::from_str::<Credential>(&contents) {
            Ok(credential) => Ok(Some(credential)),
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "Token file corrupt, ignoring");
                Ok(None)
            }
        }
    }

    fn save(&mut self, credential: &Credential) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let contents = serde_json::to_string_pretty(credential)?;

        // Write aside and rename so a failed write never clobbers the
        // previous credential
        let temp = self.temp_path();
        let written = Self::write_private(&temp, &contents).and_then(|()| {
            std::fs::rename(&temp, &self.path)
                .with_context(|| format!("Failed to replace {}", self.path.display()))
        });
        if let Err(e) = written {
            if temp.is_file() {
                if let Err(cleanup) = std::fs::remove_file(&temp) {
                    warn!(
                        path = %temp.display(),
                        error = %cleanup,
                        "Failed to remove temp token file"
                    );
                }
            }
            return Err(e);
        }

        debug!(path = %self.path.display(), "Token saved");
        Ok(())
    }

    fn clear(&mut self) -> Result<()> {
        if self.path.exists() {
            std::fs::remove_file(&self.path)
                .with_context(|| format!("Failed to remove {}", self.path.display()))?;
        }
        Ok(())
    }
}

/// In-process store for tests and throwaway sessions
#[derive(Debug, Default, Clone)]
pub struct MemoryTokenStore {
    credential: Option<Credential>,
    saves: usize,
}

impl MemoryTokenStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(credential: Credential) -> Self {
        Self {
            credential: Some(credential),
            saves: 0,
        }
    }

    /// Number of successful `save` calls
    pub fn saves(&self) -> usize {
        self.saves
    }

    pub fn current(&self) -> Option<&Credential> {
        self.credential.as_ref()
    }
}

impl TokenStore for MemoryTokenStore {
    fn load(&self) -> Result<Option<Credential>> {
        Ok(self.credential.clone())
    }

    fn save(&mut self, credential: &Credential) -> Result<()> {
        self.credential = Some(credential.clone());
        self.saves += 1;
        Ok(())
    }

    fn clear(&mut self) -> Result<()> {
        self.credential = None;
        Ok(())
    }
}
