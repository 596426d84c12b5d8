//! `riverboat process` -- run a task envelope through the pipeline.
//!
//! Reads a JSON task envelope from a file, drives it through unpack,
//! validate, collaborate, and package, and prints either the resulting
//! package or the security verdict that rejected it. A rejection exits
//! non-zero.
//!
//! # Examples
//!
//! ```text
//! riverboat process request.json
//! riverboat process request.json --workflow quick_response
//! riverboat process request.json --json > package.json
//! ```

use std::path::PathBuf;

use clap::Args;
use comfy_table::{Table, presets::UTF8_FULL};

use riverboat_types::PipelineOutcome;
use riverboat_types::envelope::TaskEnvelope;
use riverboat_types::package::Package;
use riverboat_types::verdict::ValidationVerdict;

use super::build_pipeline;

/// Arguments for the `riverboat process` subcommand.
#[derive(Args)]
pub struct ProcessArgs {
    /// Path to a JSON task envelope file.
    pub file: PathBuf,

    /// Activate this workflow before processing.
    #[arg(long)]
    pub workflow: Option<String>,

    /// Print the raw outcome as JSON instead of a summary.
    #[arg(long)]
    pub json: bool,

    /// Config file path (overrides the default location).
    #[arg(short, long)]
    pub config: Option<String>,
}

/// Run the process command.
pub async fn run(args: ProcessArgs) -> anyhow::Result<()> {
    let raw = tokio::fs::read_to_string(&args.file)
        .await
        .map_err(|e| anyhow::anyhow!("failed to read {}: {e}", args.file.display()))?;
    let envelope: TaskEnvelope = serde_json::from_str(&raw)
        .map_err(|e| anyhow::anyhow!("failed to parse {}: {e}", args.file.display()))?;

    let boat = build_pipeline(args.config.as_deref()).await?;
    if let Some(workflow) = &args.workflow {
        boat.set_active_workflow(workflow).await?;
    }

    let outcome = boat.receive(envelope).await?;

    if args.json {
        let value = match &outcome {
            PipelineOutcome::Completed(package) => serde_json::to_value(package)?,
            PipelineOutcome::Rejected(verdict) => serde_json::to_value(verdict)?,
        };
        println!("{}", serde_json::to_string_pretty(&value)?);
    }

    match outcome {
        PipelineOutcome::Completed(package) => {
            if !args.json {
                print_package(&package);
            }
        }
        PipelineOutcome::Rejected(verdict) => {
            if !args.json {
                print_verdict(&verdict);
            }
            std::process::exit(1);
        }
    }
    Ok(())
}

fn print_package(package: &Package) {
    let summary = &package.results.processing_summary;
    println!("Pipeline completed ({})", package.workflow.workflow_name);
    println!("  Gate:        {}", package.workflow.gate_status);
    println!("  Campers:     {}", summary.total_campers);
    println!("  Files:       {}", summary.files_generated);
    println!("  Commands:    {}", summary.commands_generated);
    println!("  Suggestions: {}", summary.suggestions_generated);
    println!(
        "  Cache:       {}",
        if package.metadata.cache_hit { "hit" } else { "miss" }
    );

    if !package.results.responses.is_empty() {
        println!();
        let mut table = Table::new();
        table.load_preset(UTF8_FULL);
        table.set_header(["ROLE", "TYPE", "CONFIDENCE", "BLOCKED", "CONTENT"]);
        for response in &package.results.responses {
            let response_type = response.response_type.to_string();
            let confidence = format!("{:.2}", response.confidence_score);
            let blocked = if response.publication_blocked { "yes" } else { "" };
            let content = preview(&response.content, 60);
            table.add_row([
                response.role.as_str(),
                &response_type,
                &confidence,
                blocked,
                &content,
            ]);
        }
        println!("{table}");
    }

    if !package.results.files_to_create.is_empty() {
        println!();
        println!("Files to create:");
        for file in &package.results.files_to_create {
            println!("  {} ({} bytes)", file.path, file.content.len());
        }
    }

    if !package.results.commands_to_execute.is_empty() {
        println!();
        println!("Commands to execute:");
        for command in &package.results.commands_to_execute {
            println!("  {command}");
        }
    }
}

fn print_verdict(verdict: &ValidationVerdict) {
    println!("Envelope rejected ({})", verdict.security_level);
    for error in &verdict.errors {
        println!("  error: {error}");
    }
    for warning in &verdict.warnings {
        println!("  warning: {warning}");
    }
}

/// Single-line content preview, truncated to `max_chars`.
fn preview(content: &str, max_chars: usize) -> String {
    let flat = content.replace('\n', " ");
    let truncated: String = flat.chars().take(max_chars).collect();
    if flat.chars().count() > max_chars {
        format!("{truncated}...")
    } else {
        truncated
    }
}
