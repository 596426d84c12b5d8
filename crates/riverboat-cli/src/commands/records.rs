//! `riverboat records` -- inspect and maintain the durable store.
//!
//! Records live as JSON payloads under the configured storage root with a
//! metadata sidecar per direction; listing is newest first. `purge` and
//! `stats` are surfaced as top-level subcommands but implemented here with
//! the rest of the store operations.
//!
//! # Examples
//!
//! ```text
//! riverboat records list --direction outgoing --limit 10
//! riverboat records show 20250114_101530_123456_a1b2c3d4
//! riverboat purge --days 7
//! riverboat stats
//! ```

use comfy_table::{Table, presets::UTF8_FULL};

use riverboat_types::record::Direction;

use super::{build_pipeline, format_size, format_timestamp};

/// Parse a direction filter name.
fn parse_direction(raw: &str) -> anyhow::Result<Direction> {
    match raw {
        "incoming" => Ok(Direction::Incoming),
        "outgoing" => Ok(Direction::Outgoing),
        "processing" => Ok(Direction::Processing),
        other => anyhow::bail!(
            "unknown direction '{other}' (expected incoming, outgoing, or processing)"
        ),
    }
}

/// List stored records, newest first.
pub async fn records_list(
    direction: Option<&str>,
    limit: usize,
    offset: usize,
    config: Option<&str>,
) -> anyhow::Result<()> {
    let direction = direction.map(parse_direction).transpose()?;
    let boat = build_pipeline(config).await?;
    let records = boat.list_records(direction, limit, offset).await?;

    if records.is_empty() {
        println!("No records found.");
        println!("  Dir: {}", boat.config().storage.root.display());
        return Ok(());
    }

    let mut table = Table::new();
    table.load_preset(UTF8_FULL);
    table.set_header(["ID", "DIRECTION", "CLAIM", "TASK", "SIZE", "TIMESTAMP"]);
    for meta in &records {
        let direction = meta.direction.to_string();
        let size = format_size(meta.size_bytes);
        let timestamp = format_timestamp(&meta.timestamp);
        table.add_row([
            meta.id.as_str(),
            &direction,
            &meta.claim_type,
            &meta.task_summary,
            &size,
            &timestamp,
        ]);
    }
    println!("{table}");
    println!("  {} record(s)", records.len());
    Ok(())
}

/// Show one record's metadata and payload.
pub async fn records_show(id: &str, config: Option<&str>) -> anyhow::Result<()> {
    let boat = build_pipeline(config).await?;
    let Some(record) = boat.get_record(id).await? else {
        anyhow::bail!("record not found: {id}");
    };

    let meta = &record.metadata;
    println!("Record: {}", meta.id);
    println!("  Direction:   {}", meta.direction);
    println!("  Timestamp:   {}", format_timestamp(&meta.timestamp));
    println!("  Claim:       {}", meta.claim_type);
    println!("  Task:        {}", meta.task_summary);
    println!("  Workspace:   {}", meta.workspace_root);
    println!("  Size:        {}", format_size(meta.size_bytes));
    println!("  Attachments: {}", meta.attachment_count);
    println!("  Checksum:    {}", meta.checksum);
    println!();
    println!("{}", serde_json::to_string_pretty(&record.payload)?);
    Ok(())
}

/// Show the derived status of a record.
pub async fn records_status(id: &str, config: Option<&str>) -> anyhow::Result<()> {
    let boat = build_pipeline(config).await?;
    let Some(status) = boat.get_status(id).await? else {
        anyhow::bail!("record not found: {id}");
    };

    println!("Record: {}", status.id);
    println!("  Status:      {}", status.status);
    println!("  Direction:   {}", status.direction);
    println!("  Claim:       {}", status.claim_type);
    println!("  Task:        {}", status.task_summary);
    println!("  Timestamp:   {}", format_timestamp(&status.timestamp));
    println!("  Attachments: {}", status.attachment_count);
    Ok(())
}

/// Delete one record across all directions.
pub async fn records_delete(id: &str, config: Option<&str>) -> anyhow::Result<()> {
    let boat = build_pipeline(config).await?;
    if boat.delete_record(id).await? {
        println!("Record '{id}' deleted.");
    } else {
        anyhow::bail!("record not found: {id}");
    }
    Ok(())
}

/// Delete records older than the retention age.
pub async fn records_purge(days: Option<u32>, config: Option<&str>) -> anyhow::Result<()> {
    let boat = build_pipeline(config).await?;
    let removed = boat.purge(days).await?;
    let days = days.unwrap_or(boat.config().pipeline.retention_days);
    println!("Purged {removed} record(s) older than {days} day(s).");
    Ok(())
}

/// Print aggregate storage statistics.
pub async fn records_stats(config: Option<&str>) -> anyhow::Result<()> {
    let boat = build_pipeline(config).await?;
    let stats = boat.stats().await?;

    println!("Storage: {}", boat.config().storage.root.display());
    println!("  Records:     {}", stats.total_records);
    println!("    incoming:   {}", stats.incoming);
    println!("    outgoing:   {}", stats.outgoing);
    println!("    processing: {}", stats.processing);
    println!("  Size:        {}", format_size(stats.total_size_bytes));
    println!("  Attachments: {}", stats.total_attachments);
    if let Some(oldest) = &stats.oldest {
        println!("  Oldest:      {}", format_timestamp(oldest));
    }
    if let Some(newest) = &stats.newest {
        println!("  Newest:      {}", format_timestamp(newest));
    }
    Ok(())
}
