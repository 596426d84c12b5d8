//! `riverboat workflows` -- list, activate, and reload workflows.
//!
//! # Examples
//!
//! ```text
//! riverboat workflows list
//! riverboat workflows activate quick_response
//! riverboat workflows reload
//! ```

use comfy_table::{Table, presets::UTF8_FULL};

use super::build_pipeline;

/// List registered workflows, active first.
pub async fn workflows_list(config: Option<&str>) -> anyhow::Result<()> {
    let boat = build_pipeline(config).await?;
    let snapshot = boat.workflow_snapshot().await;

    let mut table = Table::new();
    table.load_preset(UTF8_FULL);
    table.set_header(["NAME", "STEPS", "GATE", "MODE", "DESCRIPTION"]);
    for name in boat.list_workflows().await {
        let Some(workflow) = snapshot.workflows.get(&name) else {
            continue;
        };
        let display_name = if name == snapshot.active {
            format!("{name} (active)")
        } else {
            name.clone()
        };
        let steps = workflow.sequence.len().to_string();
        let gate = if workflow.audit_gate { "audit" } else { "-" };
        let mode = if workflow.parallel_execution {
            "parallel"
        } else {
            "sequential"
        };
        table.add_row([
            display_name.as_str(),
            &steps,
            gate,
            mode,
            workflow.description.as_deref().unwrap_or(""),
        ]);
    }
    println!("{table}");
    println!(
        "  {} workflow(s), {} worker(s)",
        snapshot.workflows.len(),
        snapshot.workers.len()
    );
    Ok(())
}

/// Activate a workflow by name.
pub async fn workflows_activate(name: &str, config: Option<&str>) -> anyhow::Result<()> {
    let boat = build_pipeline(config).await?;
    boat.set_active_workflow(name).await?;
    println!("Active workflow: {name}");
    Ok(())
}

/// Re-read the workflow definition file and swap the registry.
pub async fn workflows_reload(config: Option<&str>) -> anyhow::Result<()> {
    let boat = build_pipeline(config).await?;
    let count = boat.reload_workflows().await?;
    println!("Reloaded {count} workflow(s).");
    Ok(())
}
