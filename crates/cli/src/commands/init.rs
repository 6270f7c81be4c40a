//! Initialize data directory command.

use crate::config::{load_declaration, open_store, ToolConfig};
use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;
use slotscope_core::HashKind;
use slotscope_layout::allocate;
use std::fs;
use std::path::PathBuf;

#[derive(Args)]
pub struct InitArgs {
    /// Directory to store configuration and words
    #[arg(short, long, default_value = "./data")]
    data_dir: PathBuf,

    /// Declaration file (declaration language or JSON)
    #[arg(short, long)]
    schema: PathBuf,

    /// Hash function for derived slots (keccak256 or blake3)
    #[arg(long, default_value = "keccak256")]
    hash: HashKind,
}

pub fn run(args: InitArgs) -> Result<()> {
    println!("{}", "Initializing slotscope...".bold().cyan());
    println!();

    // Validate the schema before touching the data directory
    let declaration = load_declaration(&args.schema)?;
    let assignment = allocate(&declaration).with_context(|| "Failed to allocate storage layout")?;
    let schema = args
        .schema
        .canonicalize()
        .with_context(|| format!("Failed to resolve schema path: {:?}", args.schema))?;

    println!(
        "{}  Parsed schema: {} variables in {} static slots",
        "✓".green().bold(),
        declaration.len().to_string().bright_cyan(),
        assignment.slot_count().to_string().bright_cyan()
    );

    fs::create_dir_all(&args.data_dir)
        .with_context(|| format!("Failed to create data directory: {:?}", args.data_dir))?;

    let config = ToolConfig {
        schema,
        hash: args.hash,
    };
    config.save(&args.data_dir)?;
    println!(
        "{}  Saved config to: {}",
        "✓".green().bold(),
        args.data_dir.join("config.json").display().to_string().bright_black()
    );

    let store = open_store(&args.data_dir)?;
    store.flush()?;
    println!(
        "{}  Opened word store ({} words, hash {})",
        "✓".green().bold(),
        store.len(),
        config.hash.to_string().bright_yellow()
    );

    println!();
    println!("{}", "Next steps:".bold());
    println!(
        "  {}",
        format!("slotscope layout --data-dir {}", args.data_dir.display()).bright_black()
    );
    println!(
        "  {}",
        format!("slotscope read <VAR> --data-dir {}", args.data_dir.display()).bright_black()
    );

    Ok(())
}
