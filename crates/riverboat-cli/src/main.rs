//! `riverboat` -- operator CLI for the Riverboat task pipeline.
//!
//! Provides the following subcommands:
//!
//! - `riverboat process` -- Run a task envelope file through the pipeline.
//! - `riverboat records` -- List, inspect, and delete stored records.
//! - `riverboat status` -- Show configuration and storage diagnostics.
//! - `riverboat workflows` -- List, activate, and reload workflows.
//! - `riverboat purge` -- Delete records past the retention age.
//! - `riverboat stats` -- Print storage statistics.

use clap::{Parser, Subcommand};

mod commands;

/// Riverboat task pipeline CLI.
#[derive(Parser)]
#[command(name = "riverboat", about = "Riverboat task pipeline CLI", version)]
struct Cli {
    /// Enable verbose (debug-level) logging.
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Top-level subcommands.
#[derive(Subcommand)]
enum Commands {
    /// Run a task envelope file through the pipeline.
    Process(commands::process::ProcessArgs),

    /// List, inspect, and delete stored records.
    Records {
        #[command(subcommand)]
        action: RecordsAction,
    },

    /// Show configuration and storage diagnostics.
    Status(commands::status::StatusArgs),

    /// List, activate, and reload workflows.
    Workflows {
        #[command(subcommand)]
        action: WorkflowsAction,
    },

    /// Delete stored records past the retention age.
    Purge {
        /// Maximum age to keep, in days (defaults to the configured retention).
        #[arg(long)]
        days: Option<u32>,

        /// Config file path (overrides the default location).
        #[arg(short, long)]
        config: Option<String>,
    },

    /// Print storage statistics.
    Stats {
        /// Config file path (overrides the default location).
        #[arg(short, long)]
        config: Option<String>,
    },
}

/// Subcommands for `riverboat records`.
#[derive(Subcommand)]
enum RecordsAction {
    /// List stored records, newest first.
    List {
        /// Filter by direction (incoming, outgoing, processing).
        #[arg(long)]
        direction: Option<String>,

        /// Maximum number of records to show.
        #[arg(long, default_value = "20")]
        limit: usize,

        /// Number of records to skip.
        #[arg(long, default_value = "0")]
        offset: usize,

        /// Config file path (overrides the default location).
        #[arg(short, long)]
        config: Option<String>,
    },

    /// Show a record's metadata and payload.
    Show {
        /// Record id to show.
        id: String,

        /// Config file path (overrides the default location).
        #[arg(short, long)]
        config: Option<String>,
    },

    /// Show the processing status of a record.
    Status {
        /// Record id to query.
        id: String,

        /// Config file path (overrides the default location).
        #[arg(short, long)]
        config: Option<String>,
    },

    /// Delete one stored record.
    Delete {
        /// Record id to delete.
        id: String,

        /// Config file path (overrides the default location).
        #[arg(short, long)]
        config: Option<String>,
    },
}

/// Subcommands for `riverboat workflows`.
#[derive(Subcommand)]
enum WorkflowsAction {
    /// List registered workflows and workers.
    List {
        /// Config file path (overrides the default location).
        #[arg(short, long)]
        config: Option<String>,
    },

    /// Set the active workflow.
    Activate {
        /// Workflow name to activate.
        name: String,

        /// Config file path (overrides the default location).
        #[arg(short, long)]
        config: Option<String>,
    },

    /// Re-read the workflow definition file.
    Reload {
        /// Config file path (overrides the default location).
        #[arg(short, long)]
        config: Option<String>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let default_filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .init();

    match cli.command {
        Commands::Process(args) => commands::process::run(args).await?,
        Commands::Records { action } => match action {
            RecordsAction::List {
                direction,
                limit,
                offset,
                config,
            } => {
                commands::records::records_list(
                    direction.as_deref(),
                    limit,
                    offset,
                    config.as_deref(),
                )
                .await?;
            }
            RecordsAction::Show { id, config } => {
                commands::records::records_show(&id, config.as_deref()).await?;
            }
            RecordsAction::Status { id, config } => {
                commands::records::records_status(&id, config.as_deref()).await?;
            }
            RecordsAction::Delete { id, config } => {
                commands::records::records_delete(&id, config.as_deref()).await?;
            }
        },
        Commands::Status(args) => commands::status::run(args).await?,
        Commands::Workflows { action } => match action {
            WorkflowsAction::List { config } => {
                commands::workflows::workflows_list(config.as_deref()).await?;
            }
            WorkflowsAction::Activate { name, config } => {
                commands::workflows::workflows_activate(&name, config.as_deref()).await?;
            }
            WorkflowsAction::Reload { config } => {
                commands::workflows::workflows_reload(config.as_deref()).await?;
            }
        },
        Commands::Purge { days, config } => {
            commands::records::records_purge(days, config.as_deref()).await?;
        }
        Commands::Stats { config } => {
            commands::records::records_stats(config.as_deref()).await?;
        }
    }

    Ok(())
}
