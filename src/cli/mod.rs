//! Command-line request layer.
//!
//! Each subcommand maps to one request operation of the service graph.

pub mod commands;
pub mod output;

use anyhow::Result;
use clap::{Parser, Subcommand};

use crate::domain::errors::DomainError;
use crate::domain::models::Config;

use commands::{ask, config, history, index, query, search, threads};

#[derive(Parser, Debug)]
#[command(name = "ragguard")]
#[command(about = "Self-validating question answering over your own documents", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Output as JSON
    #[arg(long, global = true)]
    pub json: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Build the vector index from a folder of documents
    Index(index::IndexArgs),
    /// Retrieve and condense passages for a question
    Search(search::SearchArgs),
    /// Raw nearest-neighbour query against the index
    Query(query::QueryArgs),
    /// Ask a question and get a validated answer
    Ask(ask::AskArgs),
    /// Show the messages of a conversation thread
    History(history::HistoryArgs),
    /// List stored conversation threads
    Threads(threads::ThreadsArgs),
    /// Print the effective configuration
    Config(config::ConfigArgs),
}

/// Dispatch a parsed command line.
pub async fn run(cli: Cli, config: Config) -> Result<()> {
    match cli.command {
        Commands::Index(args) => index::execute(args, &config, cli.json).await,
        Commands::Search(args) => search::execute(args, &config, cli.json).await,
        Commands::Query(args) => query::execute(args, &config, cli.json).await,
        Commands::Ask(args) => ask::execute(args, &config, cli.json).await,
        Commands::History(args) => history::execute(args, &config, cli.json).await,
        Commands::Threads(args) => threads::execute(args, &config, cli.json).await,
        Commands::Config(args) => config::execute(args, &config, cli.json),
    }
}

/// Report a failed command and pick the exit code.
///
/// Configuration problems exit with 2, everything else with 1.
pub fn handle_error(err: &anyhow::Error, json: bool) -> i32 {
    let kind = err
        .chain()
        .find_map(|cause| cause.downcast_ref::<DomainError>())
        .map_or("error", DomainError::kind);

    if json {
        let body = serde_json::json!({
            "error": {
                "kind": kind,
                "message": format!("{err:#}"),
            }
        });
        println!("{}", serde_json::to_string_pretty(&body).unwrap_or_default());
    } else {
        eprintln!("Error: {err:#}");
    }

    if kind == "configuration_error" {
        2
    } else {
        1
    }
}
