//! Raw storage dump command.

use super::slot_hex;
use crate::config::{open_store, Workspace};
use anyhow::Result;
use clap::Args;
use colored::Colorize;
use slotscope_core::{Slot, TypeDescriptor};
use std::collections::BTreeMap;
use std::path::PathBuf;

#[derive(Args)]
pub struct DumpArgs {
    /// Data directory
    #[arg(short, long, default_value = "./data")]
    data_dir: PathBuf,

    /// Output as JSON
    #[arg(long)]
    json: bool,
}

pub fn run(args: DumpArgs) -> Result<()> {
    let workspace = Workspace::load(&args.data_dir)?;
    let store = open_store(&args.data_dir)?;
    let words = store.words()?;

    // Static slots get the paths placed in them; derived slots stay unlabelled
    let mut labels: BTreeMap<Slot, Vec<String>> = BTreeMap::new();
    for entry in workspace.layout.assignment().entries() {
        if !matches!(
            entry.ty,
            TypeDescriptor::Struct(_) | TypeDescriptor::Mapping { .. }
        ) {
            labels.entry(entry.slot).or_default().push(entry.path);
        }
    }

    if args.json {
        let rows: Vec<_> = words
            .iter()
            .map(|(slot, word)| {
                serde_json::json!({
                    "slot": slot_hex(slot),
                    "word": word.to_hex(),
                    "labels": labels.get(slot).cloned().unwrap_or_default(),
                })
            })
            .collect();
        println!("{}", serde_json::to_string_pretty(&rows)?);
        return Ok(());
    }

    println!(
        "{} ({} words, hash {})",
        "Storage Dump".bold().cyan(),
        words.len().to_string().bright_cyan(),
        workspace.config.hash.to_string().bright_yellow()
    );
    println!("{}", "═".repeat(72).bright_black());

    for (slot, word) in &words {
        let label = labels
            .get(slot)
            .map(|paths| paths.join(", "))
            .unwrap_or_else(|| "(derived)".to_string());
        println!("{} {}", slot_hex(slot).bright_yellow(), label.bright_black());
        println!("  {}", word.to_hex());
    }

    Ok(())
}
