//! Client-side session state
//!
//! The access token lives in a [`TokenStore`], a persisted slot that survives
//! restarts and is cleared on logout. The refresh credential is a server-managed
//! cookie; [`CookieFile`] carries the cookie jar across runs without ever looking
//! inside it.

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};

use chrono::{DateTime, Utc};
use reqwest::Url;
use reqwest::cookie::{CookieStore, Jar};
use serde::{Deserialize, Serialize};

use crate::client::AccessToken;
use crate::error::{ConfigError, Result};

pub mod notify;

pub use notify::{Notice, SessionEvents};

/// Persisted slot for the current access token.
///
/// Only the HTTP client and explicit login/logout write to it.
pub trait TokenStore: Send + Sync {
    /// Current token, `None` when absent or empty
    fn get(&self) -> Option<AccessToken>;

    /// Replace the stored token
    fn set(&self, token: &AccessToken) -> Result<()>;

    /// Remove the stored token
    fn clear(&self) -> Result<()>;
}

/// In-process token store
#[cfg(test)]
#[derive(Debug, Default)]
pub struct MemoryTokenStore {
    token: Mutex<Option<AccessToken>>,
}

#[cfg(test)]
impl MemoryTokenStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_token(token: impl Into<String>) -> Self {
        Self {
            token: Mutex::new(AccessToken::non_empty(token.into())),
        }
    }
}

#[cfg(test)]
impl TokenStore for MemoryTokenStore {
    fn get(&self) -> Option<AccessToken> {
        self.token
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn set(&self, token: &AccessToken) -> Result<()> {
        *self.token.lock().unwrap_or_else(PoisonError::into_inner) = Some(token.clone());
        Ok(())
    }

    fn clear(&self) -> Result<()> {
        *self.token.lock().unwrap_or_else(PoisonError::into_inner) = None;
        Ok(())
    }
}

/// On-disk session record
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct SessionRecord {
    #[serde(skip_serializing_if = "Option::is_none")]
    access_token: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    saved_at: Option<DateTime<Utc>>,
}

/// Token store backed by `~/.storeops/session.yaml`.
///
/// The file is written with mode 600 on Unix and deleted when the token is
/// cleared.
#[derive(Debug)]
pub struct FileTokenStore {
    path: PathBuf,
    cached: Mutex<Option<AccessToken>>,
}

impl FileTokenStore {
    /// Open the store in the same directory as the config file
    pub fn beside(config_path: &Path) -> Result<Self> {
        let dir = config_path.parent().unwrap_or_else(|| Path::new("."));
        Self::open(dir.join("session.yaml"))
    }

    /// Open the store at an explicit path, reading any saved token
    pub fn open(path: PathBuf) -> Result<Self> {
        let cached = if path.exists() {
            let contents = std::fs::read_to_string(&path)?;
            let record: SessionRecord =
                serde_yaml::from_str(&contents).map_err(ConfigError::from)?;
            record.access_token.and_then(AccessToken::non_empty)
        } else {
            None
        };

        Ok(Self {
            path,
            cached: Mutex::new(cached),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// When the token was last written, if a session file exists
    pub fn saved_at(&self) -> Option<DateTime<Utc>> {
        let contents = std::fs::read_to_string(&self.path).ok()?;
        let record: SessionRecord = serde_yaml::from_str(&contents).ok()?;
        record.saved_at
    }

    fn write(&self, record: &SessionRecord) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let contents =
            serde_yaml::to_string(record).map_err(|e| ConfigError::SaveError(e.to_string()))?;
        std::fs::write(&self.path, contents)?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let mut perms = std::fs::metadata(&self.path)?.permissions();
            perms.set_mode(0o600);
            std::fs::set_permissions(&self.path, perms)?;
        }

        Ok(())
    }
}

impl TokenStore for FileTokenStore {
    fn get(&self) -> Option<AccessToken> {
        self.cached
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// The in-memory slot is updated even if the write fails, so the running
    /// process keeps the newest token.
    fn set(&self, token: &AccessToken) -> Result<()> {
        *self.cached.lock().unwrap_or_else(PoisonError::into_inner) = Some(token.clone());
        self.write(&SessionRecord {
            access_token: Some(token.as_str().to_string()),
            saved_at: Some(Utc::now()),
        })
    }

    fn clear(&self) -> Result<()> {
        *self.cached.lock().unwrap_or_else(PoisonError::into_inner) = None;
        match std::fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

/// Carries the cookie jar between runs.
///
/// Cookies are stored as the `Cookie` header value the jar would send to the
/// refresh endpoint; attributes such as expiry stay with the server.
#[derive(Debug, Clone)]
pub struct CookieFile {
    path: PathBuf,
}

impl CookieFile {
    pub fn beside(config_path: &Path) -> Self {
        let dir = config_path.parent().unwrap_or_else(|| Path::new("."));
        Self {
            path: dir.join("cookies"),
        }
    }

    /// Seed `jar` with previously saved cookies for `url`
    pub fn restore(&self, jar: &Arc<Jar>, url: &Url) -> Result<()> {
        if !self.path.exists() {
            return Ok(());
        }

        let contents = std::fs::read_to_string(&self.path)?;
        for pair in contents.trim().split(';').map(str::trim) {
            if !pair.is_empty() {
                jar.add_cookie_str(pair, url);
            }
        }
        log::debug!("Restored cookies from {}", self.path.display());
        Ok(())
    }

    /// Save whatever the jar would send to `url`
    pub fn save(&self, jar: &Arc<Jar>, url: &Url) -> Result<()> {
        let Some(header) = jar.cookies(url) else {
            return Ok(());
        };
        let value = header
            .to_str()
            .map_err(|e| ConfigError::SaveError(format!("Unreadable cookie header: {}", e)))?;

        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&self.path, value)?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let mut perms = std::fs::metadata(&self.path)?.permissions();
            perms.set_mode(0o600);
            std::fs::set_permissions(&self.path, perms)?;
        }

        Ok(())
    }

    pub fn remove(&self) -> Result<()> {
        match std::fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}
