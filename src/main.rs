//! storeops - command-line companion for the store admin API

use clap::Parser;

mod cli;
mod client;
mod config;
mod error;
mod output;
mod session;

use cli::args::GlobalOptions;
use cli::{Cli, Commands};
use error::Result;

#[tokio::main]
async fn main() {
    if let Err(err) = run().await {
        if !err.already_shown() {
            eprintln!("Error: {}", err);
        }
        std::process::exit(1);
    }
}

fn init_logging(debug: bool) {
    let mut builder = env_logger::Builder::from_default_env();
    if debug {
        builder.filter_level(log::LevelFilter::Debug);
    }
    builder.format_timestamp_millis().init();
}

async fn run() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.debug);

    let opts = GlobalOptions::from_cli(&cli);

    match cli.command {
        Commands::Login { email } => cli::auth::login(&opts, email).await,
        Commands::Logout => cli::auth::logout(&opts).await,
        Commands::Status => cli::status::run(&opts),
        Commands::Whoami => cli::auth::whoami(&opts),
        Commands::Request(ref args) => cli::request::run(&opts, args).await,
        Commands::Version => {
            println!("storeops version {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
        ref command => match command.resource() {
            Some((resource, cmd)) => cli::resource::run(&opts, resource, cmd).await,
            None => Ok(()),
        },
    }
}
