//! User-facing side effects: notifications and the end-of-session redirect

use std::sync::Arc;
use std::time::Duration;

use colored::Colorize;

use super::TokenStore;

/// Message shown when the session cannot be recovered
pub const SESSION_EXPIRED_MESSAGE: &str = "Session expired. Please login again.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Warning,
    Error,
}

/// A message for the user
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
}

impl Notice {
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Error,
            message: message.into(),
        }
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Warning,
            message: message.into(),
        }
    }
}

/// Global notification channel (the "toast")
pub trait Notifier: Send + Sync {
    fn notify(&self, notice: &Notice);
}

/// Moves the user to the login route once the session is gone
pub trait Navigator: Send + Sync {
    fn navigate(&self, route: &str);
}

/// Colored one-line notices on stderr
#[derive(Debug, Default)]
pub struct TerminalNotifier;

impl Notifier for TerminalNotifier {
    fn notify(&self, notice: &Notice) {
        let marker = match notice.level {
            NoticeLevel::Warning => "⚠".yellow(),
            NoticeLevel::Error => "✗".red(),
        };
        eprintln!("{} {}", marker, notice.message);
    }
}

/// Points the user at `storeops login`
#[derive(Debug, Default)]
pub struct LoginHint;

impl Navigator for LoginHint {
    fn navigate(&self, route: &str) {
        eprintln!(
            "  → Run {} to sign in again ({})",
            "storeops login".cyan(),
            route.dimmed()
        );
    }
}

/// Notification channel with an alert fallback when no notifier is installed
#[derive(Clone, Default)]
pub struct Notifications {
    notifier: Option<Arc<dyn Notifier>>,
}

impl Notifications {
    pub fn new(notifier: Option<Arc<dyn Notifier>>) -> Self {
        Self { notifier }
    }

    pub fn show(&self, notice: Notice) {
        match &self.notifier {
            Some(notifier) => notifier.notify(&notice),
            None => eprintln!("{}", notice.message),
        }
    }
}

/// Terminal session handling: clear the token, tell the user, redirect.
#[derive(Clone)]
pub struct SessionEvents {
    notifications: Notifications,
    navigator: Arc<dyn Navigator>,
    login_route: String,
    logout_delay: Duration,
}

impl SessionEvents {
    pub fn new(
        notifications: Notifications,
        navigator: Arc<dyn Navigator>,
        login_route: impl Into<String>,
        logout_delay: Duration,
    ) -> Self {
        Self {
            notifications,
            navigator,
            login_route: login_route.into(),
            logout_delay,
        }
    }

    /// Terminal-friendly defaults
    pub fn terminal(login_route: impl Into<String>, logout_delay: Duration) -> Self {
        Self::new(
            Notifications::new(Some(Arc::new(TerminalNotifier))),
            Arc::new(LoginHint),
            login_route,
            logout_delay,
        )
    }

    pub fn notifications(&self) -> &Notifications {
        &self.notifications
    }

    /// Clear the token and tell the user. Store failures are logged, never
    /// returned.
    pub fn end_session(&self, store: &dyn TokenStore) {
        if let Err(e) = store.clear() {
            log::warn!("Failed to clear stored token: {}", e);
        }

        self.notifications
            .show(Notice::warning(SESSION_EXPIRED_MESSAGE));
    }

    /// Wait for the notice to be seen, then move to the login route
    pub async fn redirect_to_login(&self) {
        if !self.logout_delay.is_zero() {
            tokio::time::sleep(self.logout_delay).await;
        }

        log::info!("Redirecting to {}", self.login_route);
        self.navigator.navigate(&self.login_route);
    }
}
