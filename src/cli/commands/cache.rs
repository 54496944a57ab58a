//! Cache command - inspect and prune the layer cache

use crate::cache::{CacheEntry, CacheIndex};
use crate::cli::args::{CacheAction, CacheArgs, OutputFormat};
use crate::cli::commands::open_index;
use crate::config::{Config, ConfigManager};
use crate::error::StrataResult;
use chrono::Utc;
use console::style;
use std::io::{self, Write};
use tracing::debug;

/// Execute the cache command
pub async fn execute(args: CacheArgs, config: &Config) -> StrataResult<()> {
    if let CacheAction::Path = args.action {
        println!("{}", ConfigManager::cache_dir(config).display());
        return Ok(());
    }

    let index = open_index(config)?;

    match args.action {
        CacheAction::List { format } => list_entries(&index, format),
        CacheAction::Gc { days, dry_run } => {
            gc_entries(&index, days.unwrap_or(config.cache.gc_days), dry_run)
        }
        CacheAction::Clear { yes } => clear_entries(&index, yes),
        CacheAction::Path => Ok(()),
    }
}

/// Entries sorted oldest first
fn sorted_entries(index: &dyn CacheIndex) -> StrataResult<Vec<CacheEntry>> {
    let mut entries = index.entries()?;
    entries.sort_by(|a, b| {
        a.created_at
            .cmp(&b.created_at)
            .then_with(|| a.key.digest().cmp(&b.key.digest()))
    });
    Ok(entries)
}

/// List all cached layers
fn list_entries(index: &dyn CacheIndex, format: OutputFormat) -> StrataResult<()> {
    let entries = sorted_entries(index)?;

    if entries.is_empty() && !matches!(format, OutputFormat::Json) {
        println!("No cached layers found.");
        return Ok(());
    }

    match format {
        OutputFormat::Table => print_entry_table(index, &entries),
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&entries)?),
        OutputFormat::Plain => {
            for entry in &entries {
                println!("{}", entry.key.digest());
            }
        }
    }

    Ok(())
}

fn print_entry_table(index: &dyn CacheIndex, entries: &[CacheEntry]) {
    println!("{:<14} {:<20} {}", "KEY", "CREATED", "CONTENT");
    println!("{}", "-".repeat(80));

    for entry in entries {
        println!(
            "{:<14} {:<20} {}",
            entry.key.digest().short(),
            entry.created_at.format("%Y-%m-%d %H:%M"),
            entry.content
        );
    }

    println!();
    println!(
        "Total: {} layer(s) in {} index",
        entries.len(),
        index.backend_name()
    );
}

/// Remove entries older than `gc_days`
fn gc_entries(index: &dyn CacheIndex, gc_days: u32, dry_run: bool) -> StrataResult<()> {
    if gc_days == 0 {
        println!("Cache GC is disabled (gc_days = 0)");
        return Ok(());
    }

    let stale: Vec<CacheEntry> = sorted_entries(index)?
        .into_iter()
        .filter(|e| e.is_older_than_days(gc_days))
        .collect();

    if stale.is_empty() {
        println!("No cached layers older than {} days.", gc_days);
    } else {
        println!(
            "Found {} cached layer(s) older than {} days:",
            stale.len(),
            gc_days
        );
        for entry in &stale {
            let age_days = (Utc::now() - entry.created_at).num_days();
            println!(
                "  {} {} ({} days old)",
                style("•").red(),
                entry.key.digest().short(),
                age_days
            );
        }
    }

    if dry_run {
        if !stale.is_empty() {
            println!();
            println!("Dry run - no layers removed.");
        }
        return Ok(());
    }

    // Also sweeps corrupt records and abandoned writes
    let removed = index.evict(&|e| e.is_older_than_days(gc_days))?;
    debug!("GC evicted {} file(s)", removed);
    if removed > 0 {
        println!();
        println!("{} removed {} cache file(s)", style("✓").green(), removed);
    }

    Ok(())
}

/// Remove every cached layer
fn clear_entries(index: &dyn CacheIndex, skip_confirm: bool) -> StrataResult<()> {
    let count = index.entries()?.len();

    if count == 0 {
        // Nothing readable, but corrupt records or abandoned writes may remain
        let swept = index.clear()?;
        debug!("Swept {} unreadable cache file(s)", swept);
        println!("No cached layers to clear.");
        return Ok(());
    }

    println!("This will remove {} cached layer(s).", count);

    if !skip_confirm {
        print!("Are you sure? [y/N] ");
        let _ = io::stdout().flush();

        let mut input = String::new();
        if io::stdin().read_line(&mut input).is_err() {
            println!("Failed to read input, aborting.");
            return Ok(());
        }

        if !input.trim().eq_ignore_ascii_case("y") {
            println!("Aborted.");
            return Ok(());
        }
    }

    let removed = index.clear()?;
    println!("{} cleared {} cache file(s)", style("✓").green(), removed);

    Ok(())
}
