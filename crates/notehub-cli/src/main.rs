//! notehub CLI - Command-line interface for cloud-synced notes
//!
//! Every remote command loads the server listing into a note store, applies
//! one operation, and exits once it has been saved.

mod cli;
mod commands;
mod error;
mod settings;

#[cfg(test)]
mod tests;

use clap::Parser;

use crate::cli::{Cli, Commands};
use crate::commands::attach::{run_attach, run_detach};
use crate::commands::common::GlobalArgs;
use crate::commands::completions::run_completions;
use crate::commands::delete::{run_delete, run_empty_trash};
use crate::commands::edit::run_edit;
use crate::commands::favorite::run_favorite;
use crate::commands::list::run_list;
use crate::commands::new::run_new;
use crate::commands::restore::run_restore;
use crate::commands::show::run_show;
use crate::error::CliError;

#[tokio::main]
async fn main() {
    if let Err(error) = run().await {
        eprintln!("Error: {error}");
        std::process::exit(1);
    }
}

async fn run() -> Result<(), CliError> {
    dotenvy::dotenv().ok();

    let mut filter = tracing_subscriber::EnvFilter::from_default_env();
    if let Ok(directive) = "notehub=info".parse() {
        filter = filter.add_directive(directive);
    }
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let args = GlobalArgs {
        api_url: cli.api_url,
        email: cli.email,
        token: cli.token,
        config: cli.config,
    };

    match cli.command {
        Commands::List {
            filter,
            search,
            json,
        } => run_list(filter.into(), search.as_deref(), json, &args).await?,
        Commands::New { title, content } => run_new(title, content, &args).await?,
        Commands::Show { id, json } => run_show(&id, json, &args).await?,
        Commands::Edit { id, title, content } => run_edit(&id, title, content, &args).await?,
        Commands::Favorite { id } => run_favorite(&id, &args).await?,
        Commands::Restore { id } => run_restore(&id, &args).await?,
        Commands::Delete { id } => run_delete(&id, &args).await?,
        Commands::Attach { id, paths } => run_attach(&id, &paths, &args).await?,
        Commands::Detach { id, attachment_id } => run_detach(&id, &attachment_id, &args).await?,
        Commands::EmptyTrash => run_empty_trash(&args).await?,
        Commands::Completions { shell, output } => run_completions(shell, output.as_deref())?,
    }

    Ok(())
}
