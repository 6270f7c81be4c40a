//! Static layout command.

use crate::config::{load_declaration, ToolConfig};
use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;
use slotscope_layout::{allocate, LayoutEntry};
use std::path::PathBuf;

#[derive(Args)]
pub struct LayoutArgs {
    /// Data directory
    #[arg(short, long, default_value = "./data")]
    data_dir: PathBuf,

    /// Print the layout of this declaration file instead of the configured one
    #[arg(short, long)]
    schema: Option<PathBuf>,

    /// Output as JSON
    #[arg(long)]
    json: bool,
}

pub fn run(args: LayoutArgs) -> Result<()> {
    let schema = match args.schema {
        Some(path) => path,
        None => ToolConfig::load(&args.data_dir)?.schema,
    };
    let declaration = load_declaration(&schema)?;
    let assignment = allocate(&declaration).with_context(|| "Failed to allocate storage layout")?;
    let entries = assignment.entries();

    if args.json {
        println!("{}", serde_json::to_string_pretty(&entries)?);
        return Ok(());
    }

    println!("{}", "Storage Layout".bold().cyan());
    println!("{}", "═".repeat(72).bright_black());
    println!(
        "{:<6} {:<7} {:<6} {:<28} {}",
        "Slot".bold(),
        "Offset".bold(),
        "Width".bold(),
        "Path".bold(),
        "Type".bold()
    );

    for entry in &entries {
        print_entry(entry);
    }

    println!("{}", "═".repeat(72).bright_black());
    println!(
        "{} variables, {} static slots",
        declaration.len().to_string().bright_cyan(),
        assignment.slot_count().to_string().bright_cyan()
    );

    Ok(())
}

fn print_entry(entry: &LayoutEntry) {
    let depth = entry.path.matches('.').count();
    let name = format!("{}{}", "  ".repeat(depth), entry.path);
    println!(
        "{:<6} {:<7} {:<6} {:<28} {}",
        entry.slot.to_string().bright_yellow(),
        entry.offset,
        entry.width,
        name,
        entry.ty.to_string().bright_black()
    );
}
