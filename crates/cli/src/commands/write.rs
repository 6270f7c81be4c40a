//! Write value command.

use super::{display_target, parse_target};
use crate::config::{open_store, Workspace};
use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;
use slotscope_schema::parse_value;
use slotscope_storage::WriteBatch;
use std::path::PathBuf;
use tracing::debug;

#[derive(Args)]
pub struct WriteArgs {
    /// State variable name
    variable: String,

    /// Path segments: .field, [index] or {key}
    segments: Vec<String>,

    /// Data directory
    #[arg(short, long, default_value = "./data")]
    data_dir: PathBuf,

    /// Value literal; arrays and structs are given as JSON
    #[arg(long, required_unless_present = "clear", conflicts_with = "clear")]
    value: Option<String>,

    /// Reset the target to its zero state
    #[arg(long)]
    clear: bool,
}

pub fn run(args: WriteArgs) -> Result<()> {
    let workspace = Workspace::load(&args.data_dir)?;
    let store = open_store(&args.data_dir)?;
    let (path, ty) = parse_target(&workspace.declaration, &args.variable, &args.segments)?;
    let target = display_target(&args.variable, &path);

    // Stage every word first so a failed write leaves the store untouched
    let batch = WriteBatch::new(&store);
    match &args.value {
        Some(text) => {
            let value = parse_value(ty, text)
                .with_context(|| format!("Invalid value for {} ({})", target, ty))?;
            workspace
                .layout
                .write_value(&batch, &args.variable, &path, &value)?;
        }
        None => {
            workspace
                .layout
                .clear_value(&batch, &args.variable, &path)?;
        }
    }

    let writes = batch.into_writes()?;
    let count = writes.len();
    debug!(words = count, "committing write batch");
    store.apply_batch(writes)?;
    store.flush()?;

    let action = if args.clear { "Cleared" } else { "Wrote" };
    println!(
        "{}  {} {} ({} words touched)",
        "✓".green().bold(),
        action,
        target.bold(),
        count.to_string().bright_cyan()
    );

    Ok(())
}
