//! Command execution context
//!
//! Loads config, opens the persisted session and builds the admin client, so
//! handlers only deal with their own command.

use std::path::PathBuf;
use std::sync::Arc;

use crate::cli::OutputFormat;
use crate::cli::args::GlobalOptions;
use crate::client::AdminClient;
use crate::config::Config;
use crate::error::Result;
use crate::session::{CookieFile, FileTokenStore, SessionEvents, TokenStore};

/// Context for command execution
pub struct CommandContext {
    /// Loaded configuration with CLI overrides applied
    pub config: Config,
    /// Where the config was loaded from; the session files live next to it
    pub config_path: PathBuf,
    /// Persisted access token
    pub store: Arc<FileTokenStore>,
    /// Admin API client (Arc-wrapped for concurrent requests)
    pub client: Arc<AdminClient>,
    /// Output format preference
    pub format: OutputFormat,
}

impl CommandContext {
    /// Build the context for a command.
    ///
    /// # Errors
    /// Returns error if the config or the session file cannot be read, or the
    /// resulting config is invalid.
    pub fn new(opts: &GlobalOptions) -> Result<Self> {
        let config_path = Config::resolve_path(opts.config_ref())?;
        let mut config = Config::load_from(config_path.clone())?;

        if let Some(host) = opts.api_host_ref() {
            config.api_host = host.to_string();
            config.validate()?;
        }

        let store = Arc::new(FileTokenStore::beside(&config_path)?);
        let events = SessionEvents::terminal(
            config.login_route.clone(),
            config.timeouts.logout_delay(),
        );
        let client = AdminClient::new(&config, store.clone(), events)?
            .with_cookie_file(CookieFile::beside(&config_path))?;

        log::debug!(
            "Using {} (session {})",
            client.base_url(),
            store.path().display()
        );

        Ok(Self {
            config,
            config_path,
            store,
            client: Arc::new(client),
            format: opts.format,
        })
    }

    /// Whether a token is stored
    pub fn has_session(&self) -> bool {
        self.store.get().is_some()
    }

    /// Fail early with a login hint when no token is stored
    pub fn require_session(&self) -> Result<()> {
        if self.has_session() {
            Ok(())
        } else {
            Err(crate::error::ConfigError::NotLoggedIn.into())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn opts(config: &std::path::Path) -> GlobalOptions {
        GlobalOptions {
            format: OutputFormat::Json,
            config: Some(config.display().to_string()),
            api_host: None,
        }
    }

    #[test]
    fn test_context_without_session() {
        let temp = tempdir().unwrap();
        let ctx = CommandContext::new(&opts(&temp.path().join("config.yaml"))).unwrap();

        assert!(!ctx.has_session());
        assert!(ctx.require_session().is_err());
        assert_eq!(ctx.format, OutputFormat::Json);
    }

    #[test]
    fn test_api_host_override() {
        let temp = tempdir().unwrap();
        let mut options = opts(&temp.path().join("config.yaml"));
        options.api_host = Some("https://admin.example.com".to_string());

        let ctx = CommandContext::new(&options).unwrap();
        assert_eq!(ctx.config.api_host, "https://admin.example.com");
        assert_eq!(
            ctx.client.base_url(),
            "https://admin.example.com/api/v1/admin"
        );
    }

    #[test]
    fn test_invalid_api_host_override() {
        let temp = tempdir().unwrap();
        let mut options = opts(&temp.path().join("config.yaml"));
        options.api_host = Some("admin.example.com".to_string());

        assert!(CommandContext::new(&options).is_err());
    }

    #[test]
    fn test_session_picked_up_from_disk() {
        let temp = tempdir().unwrap();
        std::fs::write(
            temp.path().join("session.yaml"),
            "access_token: storedTok12345\n",
        )
        .unwrap();

        let ctx = CommandContext::new(&opts(&temp.path().join("config.yaml"))).unwrap();
        assert!(ctx.has_session());
        assert!(ctx.require_session().is_ok());
    }
}
