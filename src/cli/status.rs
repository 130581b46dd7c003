//! Status command implementation

use colored::Colorize;

use crate::cli::CommandContext;
use crate::cli::args::GlobalOptions;
use crate::client::decode_claims;
use crate::error::Result;

/// Run the status command to display configuration and session status
pub fn run(opts: &GlobalOptions) -> Result<()> {
    println!("{}\n", "storeops status".bold());

    let ctx = match CommandContext::new(opts) {
        Ok(ctx) => ctx,
        Err(err) => {
            println!("{} Configuration could not be loaded: {}", "✗".red(), err);
            return Ok(());
        }
    };

    if ctx.config_path.exists() {
        println!("Config file: {}", ctx.config_path.display().to_string().cyan());
    } else {
        println!(
            "Config file: {} {}",
            ctx.config_path.display().to_string().cyan(),
            "(not created yet, using defaults)".dimmed()
        );
    }
    println!("API: {}", ctx.client.base_url().cyan());
    if let Some(ref email) = ctx.config.email {
        println!("Account: {}", email);
    }
    println!();

    match ctx.client.token_store().get() {
        Some(token) => {
            let saved = ctx
                .store
                .saved_at()
                .map(|at| at.to_rfc3339())
                .unwrap_or_else(|| "unknown".to_string());
            match decode_claims(&token).expires_at {
                Some(exp) if exp <= chrono::Utc::now() => println!(
                    "{} Access token expired (will refresh on next request)",
                    "⚠".yellow()
                ),
                Some(exp) => {
                    let remaining = exp.signed_duration_since(chrono::Utc::now());
                    println!(
                        "{} Access token valid (expires in {}h {}m)",
                        "✓".green(),
                        remaining.num_hours(),
                        remaining.num_minutes() % 60
                    );
                }
                None => println!("{} Access token stored", "✓".green()),
            }
            println!("  Saved: {}", saved.dimmed());
        }
        None => {
            println!("{} Not signed in", "✗".red());
            println!("  → Run {} to sign in", "storeops login".cyan());
        }
    }

    let timeouts = &ctx.config.timeouts;
    println!();
    println!(
        "{}",
        format!(
            "Timeouts: request {}s, refresh {}s, queue {}s",
            timeouts.request_secs, timeouts.refresh_secs, timeouts.queue_secs
        )
        .dimmed()
    );

    Ok(())
}
