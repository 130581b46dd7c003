//! Admin resource commands: list, get, create, update, delete

use colored::Colorize;
use futures::future::join_all;

use crate::cli::args::GlobalOptions;
use crate::cli::{CommandContext, ResourceCommands, read_json_arg};
use crate::client::{AdminApi, ResourceApi};
use crate::client::models::Resource;
use crate::error::{Error, Result};
use crate::output;

/// Run a resource subcommand
pub async fn run(opts: &GlobalOptions, resource: Resource, cmd: &ResourceCommands) -> Result<()> {
    let ctx = CommandContext::new(opts)?;
    ctx.require_session()?;
    let client = &ctx.client;

    match cmd {
        ResourceCommands::List { pagination } => {
            let data = client.list(resource, Some(&pagination.to_params())).await?;
            output::print_value(&data, ctx.format)
        }
        ResourceCommands::Get { id } => {
            let data = client.fetch(resource, id).await?;
            output::print_value(&data, ctx.format)
        }
        ResourceCommands::Create { data } => {
            let body = read_json_arg(data)?;
            let created = client.create(resource, body).await?;
            eprintln!("{} Created {}", "✓".green(), resource.label());
            output::print_value(&created, ctx.format)
        }
        ResourceCommands::Update { id, data } => {
            let body = read_json_arg(data)?;
            let updated = client.update(resource, id, body).await?;
            eprintln!("{} Updated {} {}", "✓".green(), resource.label(), id);
            output::print_value(&updated, ctx.format)
        }
        ResourceCommands::Delete { ids } => delete_all(&**client, resource, ids).await,
    }
}

/// Delete concurrently; an expired token is refreshed once for the whole batch
async fn delete_all(client: &dyn AdminApi, resource: Resource, ids: &[String]) -> Result<()> {
    let results = join_all(ids.iter().map(|id| client.remove(resource, id))).await;

    let mut failed = 0;
    for (id, result) in ids.iter().zip(results) {
        match result {
            Ok(_) => println!("{} Deleted {} {}", "✓".green(), resource.label(), id),
            Err(err) => {
                failed += 1;
                eprintln!("{} {} {}: {}", "✗".red(), resource.label(), id, err);
            }
        }
    }

    if failed > 0 {
        return Err(Error::Other(format!(
            "{} of {} deletions failed",
            failed,
            ids.len()
        )));
    }
    Ok(())
}
