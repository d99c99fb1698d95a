//! Partitions command - inspect and clear cache partitions

use super::open_store;
use crate::cli::args::{OutputFormat, PartitionsAction, PartitionsArgs};
use crate::error::{ShelterError, ShelterResult};
use crate::http::{RequestKey, StoredResponse};
use crate::store::{format_bytes, CacheStore};
use crate::ui::{self, UiContext};
use crate::worker::PartitionName;
use console::style;
use serde::Serialize;
use tracing::debug;

/// Execute the partitions command
pub async fn execute(args: PartitionsArgs) -> ShelterResult<()> {
    let store = open_store();

    match args.action {
        PartitionsAction::List { format } => list_partitions(&*store, format).await,
        PartitionsAction::Show { name, format } => show_partition(&*store, &name, format).await,
        PartitionsAction::Clear { yes } => clear_partitions(&*store, yes).await,
    }
}

#[derive(Debug, Serialize)]
struct PartitionSummary {
    name: String,
    kind: Option<String>,
    version: Option<String>,
    entries: usize,
    bytes: u64,
}

async fn summarize(store: &dyn CacheStore) -> ShelterResult<Vec<PartitionSummary>> {
    let mut summaries = Vec::new();
    for name in store.keys().await? {
        let entries = store.entries(&name).await?;
        let parsed = PartitionName::parse(&name);
        summaries.push(PartitionSummary {
            kind: parsed.kind().map(|k| k.to_string()),
            version: parsed.version().map(str::to_string),
            entries: entries.len(),
            bytes: entries.iter().map(|(_, r)| r.body.len() as u64).sum(),
            name,
        });
    }
    Ok(summaries)
}

/// List all partitions
async fn list_partitions(store: &dyn CacheStore, format: OutputFormat) -> ShelterResult<()> {
    let summaries = summarize(store).await?;

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&summaries)?),
        OutputFormat::Plain => {
            for summary in &summaries {
                println!("{}", summary.name);
            }
        }
        OutputFormat::Table => {
            if summaries.is_empty() {
                println!("No cache partitions found.");
                return Ok(());
            }
            print_partition_table(&summaries);
        }
    }

    Ok(())
}

fn print_partition_table(summaries: &[PartitionSummary]) {
    println!(
        "{:<32} {:<8} {:<10} {:>8} {:>10}",
        "PARTITION", "KIND", "VERSION", "ENTRIES", "SIZE"
    );
    println!("{}", "-".repeat(72));

    for summary in summaries {
        let kind = match summary.kind.as_deref() {
            Some(kind) => kind.to_string(),
            None => style("foreign").dim().to_string(),
        };
        println!(
            "{:<32} {:<8} {:<10} {:>8} {:>10}",
            summary.name,
            kind,
            summary.version.as_deref().unwrap_or("-"),
            summary.entries,
            format_bytes(summary.bytes)
        );
    }

    println!();
    println!("Total: {} partition(s)", summaries.len());
}

#[derive(Debug, Serialize)]
struct EntrySummary {
    method: String,
    url: String,
    status: u16,
    bytes: usize,
    stored_at: String,
}

impl EntrySummary {
    fn new(key: &RequestKey, response: &StoredResponse) -> Self {
        Self {
            method: key.method.to_string(),
            url: key.url.clone(),
            status: response.status,
            bytes: response.body.len(),
            stored_at: response.stored_at.to_rfc3339(),
        }
    }
}

/// List the entries of one partition
async fn show_partition(
    store: &dyn CacheStore,
    name: &str,
    format: OutputFormat,
) -> ShelterResult<()> {
    if !store.has(name).await? {
        return Err(ShelterError::PartitionNotFound(name.to_string()));
    }

    let entries: Vec<EntrySummary> = store
        .entries(name)
        .await?
        .iter()
        .map(|(key, response)| EntrySummary::new(key, response))
        .collect();

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&entries)?),
        OutputFormat::Plain => {
            for entry in &entries {
                println!("{}", entry.url);
            }
        }
        OutputFormat::Table => {
            println!("{:<7} {:<40} {:>6} {:>10}", "METHOD", "URL", "STATUS", "SIZE");
            println!("{}", "-".repeat(66));
            for entry in &entries {
                println!(
                    "{:<7} {:<40} {:>6} {:>10}",
                    entry.method,
                    entry.url,
                    entry.status,
                    format_bytes(entry.bytes as u64)
                );
            }
            println!();
            println!("Total: {} entr(ies) in {}", entries.len(), name);
        }
    }

    Ok(())
}

/// Delete every partition
async fn clear_partitions(store: &dyn CacheStore, yes: bool) -> ShelterResult<()> {
    let ctx = UiContext::detect().with_auto_yes(yes);
    let names = store.keys().await?;

    if names.is_empty() {
        println!("No cache partitions to clear.");
        return Ok(());
    }

    println!("This will remove {} partition(s):", names.len());
    for name in &names {
        println!("  {} {}", style("•").red(), name);
    }
    println!();

    if !ui::confirm(&ctx, "Clear all partitions?", false).await? {
        println!("Aborted.");
        return Ok(());
    }

    let mut removed = 0;
    for name in names {
        debug!("Removing partition: {}", name);
        if store.delete(&name).await? {
            removed += 1;
        }
    }

    ui::step_ok(&ctx, &format!("Cleared {} partition(s)", removed));
    ui::remark(&ctx, "Run: shelter install to precache again");
    Ok(())
}
