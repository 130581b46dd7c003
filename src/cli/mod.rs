//! CLI command definitions and handlers

use clap::{Args, Parser, Subcommand};

pub mod args;
pub mod auth;
pub mod context;
pub mod request;
pub mod resource;
pub mod status;

pub use args::{OutputFormat, PaginationArgs};
pub use context::CommandContext;

use crate::client::models::Resource;

/// storeops - command-line companion for the store admin API
#[derive(Parser, Debug)]
#[command(name = "storeops")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,

    /// Output format (pretty, table, json)
    #[arg(
        long,
        global = true,
        env = "STOREOPS_FORMAT",
        default_value = "table",
        hide_env = true,
        hide_possible_values = true
    )]
    pub format: OutputFormat,

    /// Override config file location
    #[arg(long, global = true, env = "STOREOPS_CONFIG", hide_env = true)]
    pub config: Option<String>,

    /// Backend host, e.g. https://shop.example.com
    #[arg(long, global = true, env = "STOREOPS_API_HOST", hide_env = true)]
    pub api_host: Option<String>,

    /// Enable debug logging
    #[arg(long, global = true, env = "STOREOPS_DEBUG", hide_env = true)]
    pub debug: bool,
}

/// Available CLI commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Sign in and store the session
    Login {
        /// Account email (defaults to the last one used)
        #[arg(long, short = 'e')]
        email: Option<String>,
    },

    /// End the session and forget the stored token
    Logout,

    /// Show configuration and session status
    Status,

    /// Show who the stored token belongs to
    Whoami,

    /// Manage products
    #[command(subcommand)]
    Product(ResourceCommands),

    /// Manage categories
    #[command(subcommand)]
    Category(ResourceCommands),

    /// Manage collections
    #[command(subcommand)]
    Collection(ResourceCommands),

    /// Manage discounts
    #[command(subcommand)]
    Discount(ResourceCommands),

    /// Manage orders
    #[command(subcommand)]
    Order(ResourceCommands),

    /// Manage users
    #[command(subcommand)]
    User(ResourceCommands),

    /// Browse the admin activity log
    #[command(subcommand)]
    Log(ResourceCommands),

    /// Send an arbitrary request through the authenticated client
    Request(RequestArgs),

    /// Display version information
    Version,
}

impl Commands {
    /// Resource targeted by a resource subcommand
    pub fn resource(&self) -> Option<(Resource, &ResourceCommands)> {
        let resource = match self {
            Commands::Product(cmd) => (Resource::Product, cmd),
            Commands::Category(cmd) => (Resource::Category, cmd),
            Commands::Collection(cmd) => (Resource::Collection, cmd),
            Commands::Discount(cmd) => (Resource::Discount, cmd),
            Commands::Order(cmd) => (Resource::Order, cmd),
            Commands::User(cmd) => (Resource::User, cmd),
            Commands::Log(cmd) => (Resource::AdminLog, cmd),
            _ => return None,
        };
        Some(resource)
    }
}

/// Operations shared by every admin resource
#[derive(Subcommand, Debug)]
pub enum ResourceCommands {
    /// List records
    #[command(visible_alias = "ls")]
    List {
        #[command(flatten)]
        pagination: PaginationArgs,
    },

    /// Show a single record
    Get {
        /// Record ID
        id: String,
    },

    /// Create a record from a JSON document
    Create {
        /// JSON body, or @file to read it from a file
        #[arg(long, short = 'd')]
        data: String,
    },

    /// Replace a record with a JSON document
    Update {
        /// Record ID
        id: String,

        /// JSON body, or @file to read it from a file
        #[arg(long, short = 'd')]
        data: String,
    },

    /// Delete one or more records
    #[command(visible_alias = "rm")]
    Delete {
        /// Record IDs
        #[arg(required = true)]
        ids: Vec<String>,
    },
}

/// Raw request arguments
#[derive(Args, Debug)]
pub struct RequestArgs {
    /// HTTP method (GET, POST, PUT, PATCH, DELETE)
    pub method: String,

    /// Path under the admin API prefix, e.g. /products
    pub path: String,

    /// JSON body, or @file to read it from a file
    #[arg(long, short = 'd')]
    pub data: Option<String>,

    /// Query parameter as key=value (repeatable)
    #[arg(long = "query", short = 'q', value_parser = parse_key_val)]
    pub query: Vec<(String, String)>,
}

fn parse_key_val(s: &str) -> std::result::Result<(String, String), String> {
    s.split_once('=')
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .ok_or_else(|| format!("expected key=value, got '{}'", s))
}

/// Parse a `--data` argument: inline JSON or `@path`
pub fn read_json_arg(data: &str) -> crate::error::Result<serde_json::Value> {
    let text = match data.strip_prefix('@') {
        Some(path) => std::fs::read_to_string(path)?,
        None => data.to_string(),
    };
    Ok(serde_json::from_str(&text)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_resource_subcommand_parses() {
        let cli = Cli::parse_from(["storeops", "product", "list", "--page", "2"]);
        let (resource, cmd) = cli.command.resource().unwrap();
        assert_eq!(resource, Resource::Product);
        match cmd {
            ResourceCommands::List { pagination } => assert_eq!(pagination.page, Some(2)),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_delete_requires_ids() {
        assert!(Cli::try_parse_from(["storeops", "order", "delete"]).is_err());
        let cli = Cli::parse_from(["storeops", "order", "rm", "o1", "o2"]);
        match cli.command.resource() {
            Some((Resource::Order, ResourceCommands::Delete { ids })) => {
                assert_eq!(ids, &vec!["o1".to_string(), "o2".to_string()])
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_request_query_pairs() {
        let cli = Cli::parse_from([
            "storeops", "request", "GET", "/orders", "-q", "status=paid", "-q", "page=2",
        ]);
        match cli.command {
            Commands::Request(args) => {
                assert_eq!(args.method, "GET");
                assert_eq!(args.query[0], ("status".to_string(), "paid".to_string()));
                assert_eq!(args.query.len(), 2);
            }
            other => panic!("unexpected {:?}", other),
        }
        assert!(Cli::try_parse_from(["storeops", "request", "GET", "/x", "-q", "bad"]).is_err());
    }

    #[test]
    fn test_read_json_arg_inline_and_file() {
        assert_eq!(
            read_json_arg(r#"{"name":"Mug"}"#).unwrap(),
            serde_json::json!({ "name": "Mug" })
        );

        let temp = tempfile::NamedTempFile::new().unwrap();
        std::fs::write(temp.path(), r#"{"price":12}"#).unwrap();
        let arg = format!("@{}", temp.path().display());
        assert_eq!(read_json_arg(&arg).unwrap()["price"], 12);

        assert!(read_json_arg("not json").is_err());
    }
}
