//! `riverboat status` -- show configuration and storage diagnostics.
//!
//! Resolves the active configuration, loads the workflow registry, and
//! prints a summary of the pipeline settings plus storage statistics.
//! With `--detailed`, also shows validation ceilings.
//!
//! # Examples
//!
//! ```text
//! riverboat status
//! riverboat status --detailed
//! ```

use clap::Args;

use super::{build_pipeline, config_path, format_size, format_timestamp};

/// Arguments for the `riverboat status` subcommand.
#[derive(Args)]
pub struct StatusArgs {
    /// Show validation ceilings too.
    #[arg(long)]
    pub detailed: bool,

    /// Config file path (overrides the default location).
    #[arg(short, long)]
    pub config: Option<String>,
}

/// Run the status command.
pub async fn run(args: StatusArgs) -> anyhow::Result<()> {
    println!("riverboat status");
    println!("================");
    println!();

    let path = config_path(args.config.as_deref());
    if path.exists() {
        println!("Config: {}", path.display());
    } else {
        println!("Config: not found (using defaults)");
        println!("  Expected at: {}", path.display());
    }

    let boat = build_pipeline(args.config.as_deref()).await?;
    let config = boat.config();

    println!();
    println!("Pipeline:");
    println!("  Timeout:    {}s", config.pipeline.timeout_secs);
    if config.pipeline.cache_enabled {
        println!("  Cache:      enabled ({}s ttl)", config.pipeline.cache_ttl_secs);
    } else {
        println!("  Cache:      disabled");
    }
    println!("  Retention:  {} day(s)", config.pipeline.retention_days);
    println!("  Storage:    {}", config.storage.root.display());

    println!();
    println!("Generation:");
    println!("  Service:    {}", config.generation.name);
    println!("  Model:      {}", config.generation.model);
    println!("  Endpoint:   {}", config.generation.base_url);
    println!("  Key env:    {}", config.generation.api_key_env);

    if args.detailed {
        println!();
        println!("Limits:");
        println!("  Max file size:   {}", format_size(config.limits.max_file_bytes as u64));
        println!("  Max total size:  {}", format_size(config.limits.max_total_bytes as u64));
        println!("  Max attachments: {}", config.limits.max_attachments);
        println!("  Max line length: {}", config.limits.max_line_length);
        println!("  Max lines:       {}", config.limits.max_lines);
    }

    let snapshot = boat.workflow_snapshot().await;
    println!();
    println!(
        "Workflows: {} loaded, {} worker(s), active: {}",
        snapshot.workflows.len(),
        snapshot.workers.len(),
        snapshot.active
    );

    let stats = boat.stats().await?;
    println!();
    println!("Storage:");
    println!(
        "  Records: {} ({} incoming, {} outgoing, {} processing)",
        stats.total_records, stats.incoming, stats.outgoing, stats.processing
    );
    println!("  Size:    {}", format_size(stats.total_size_bytes));
    if let Some(newest) = &stats.newest {
        println!("  Newest:  {}", format_timestamp(newest));
    }

    Ok(())
}
