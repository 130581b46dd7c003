//! Session commands: login, logout, whoami

use colored::Colorize;
use dialoguer::{Input, Password, theme::ColorfulTheme};
use serde::Serialize;

use crate::cli::args::GlobalOptions;
use crate::cli::{CommandContext, OutputFormat};
use crate::client::{AuthApi, TokenClaims, decode_claims, has_role};
use crate::error::Result;
use crate::output::{self, table};

/// Read instead of prompting when set, for scripted logins
const PASSWORD_ENV: &str = "STOREOPS_PASSWORD";

const ADMIN_ROLE: &str = "admin";

/// Run the login command
pub async fn login(opts: &GlobalOptions, email: Option<String>) -> Result<()> {
    let mut ctx = CommandContext::new(opts)?;
    let theme = ColorfulTheme::default();

    let email = match email.or_else(|| ctx.config.email.clone()) {
        Some(email) => email,
        None => Input::<String>::with_theme(&theme)
            .with_prompt("Email")
            .interact_text()?,
    };
    let password = match std::env::var(PASSWORD_ENV) {
        Ok(password) if !password.is_empty() => password,
        _ => Password::with_theme(&theme)
            .with_prompt("Password")
            .interact()?,
    };

    ctx.client.login(&email, &password).await?;

    if ctx.config.email.as_deref() != Some(email.as_str()) {
        ctx.config.email = Some(email.clone());
        ctx.config.save_to(ctx.config_path.clone())?;
    }

    println!("{} Signed in as {}", "✓".green(), email.bold());
    Ok(())
}

/// Run the logout command
pub async fn logout(opts: &GlobalOptions) -> Result<()> {
    let ctx = CommandContext::new(opts)?;

    if !ctx.has_session() {
        println!("{} Not signed in", "○".dimmed());
        return Ok(());
    }

    ctx.client.logout().await?;
    println!("{} Signed out", "✓".green());
    Ok(())
}

/// Decoded identity for display
#[derive(Debug, Serialize)]
struct Identity {
    subject: Option<String>,
    roles: Vec<String>,
    admin: bool,
    expires_at: Option<String>,
    expired: bool,
}

impl From<TokenClaims> for Identity {
    fn from(claims: TokenClaims) -> Self {
        let expired = claims
            .expires_at
            .is_some_and(|exp| exp <= chrono::Utc::now());
        Self {
            subject: claims.subject,
            roles: claims.roles,
            admin: false,
            expires_at: claims.expires_at.map(|exp| exp.to_rfc3339()),
            expired,
        }
    }
}

/// Run the whoami command.
///
/// Reads the claims of the stored token locally; nothing is sent to the server.
pub fn whoami(opts: &GlobalOptions) -> Result<()> {
    let ctx = CommandContext::new(opts)?;
    ctx.require_session()?;

    let Some(token) = ctx.client.token_store().get() else {
        return Ok(());
    };
    let identity = Identity {
        admin: has_role(&token, ADMIN_ROLE),
        ..Identity::from(decode_claims(&token))
    };

    match ctx.format {
        OutputFormat::Json | OutputFormat::Pretty => {
            output::print_json(&identity, ctx.format)?;
        }
        OutputFormat::Table => {
            let rows = vec![
                ["SUBJECT".to_string(), display_or_dash(identity.subject.as_deref())],
                ["ROLES".to_string(), display_roles(&identity.roles)],
                [
                    "ADMIN".to_string(),
                    if identity.admin { "yes" } else { "no" }.to_string(),
                ],
                ["EXPIRES".to_string(), display_expiry(&identity)],
            ];
            println!("{}", table::format_rows(None, rows));
        }
    }

    Ok(())
}

fn display_or_dash(value: Option<&str>) -> String {
    value.unwrap_or("-").to_string()
}

fn display_roles(roles: &[String]) -> String {
    if roles.is_empty() {
        "-".to_string()
    } else {
        roles.join(", ")
    }
}

fn display_expiry(identity: &Identity) -> String {
    match identity.expires_at {
        Some(ref at) if identity.expired => format!("{} (expired, refreshes on next request)", at),
        Some(ref at) => at.clone(),
        None => "-".to_string(),
    }
}
