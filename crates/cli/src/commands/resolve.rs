//! Path resolution command.

use super::{display_target, parse_target, slot_hex};
use crate::config::Workspace;
use anyhow::Result;
use clap::Args;
use colored::Colorize;
use std::path::PathBuf;

#[derive(Args)]
pub struct ResolveArgs {
    /// State variable name
    variable: String,

    /// Path segments: .field, [index] or {key}
    segments: Vec<String>,

    /// Data directory
    #[arg(short, long, default_value = "./data")]
    data_dir: PathBuf,

    /// Output as JSON
    #[arg(long)]
    json: bool,
}

pub fn run(args: ResolveArgs) -> Result<()> {
    let workspace = Workspace::load(&args.data_dir)?;
    let (path, ty) = parse_target(&workspace.declaration, &args.variable, &args.segments)?;
    let location = workspace.layout.resolve(&args.variable, &path)?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&location)?);
        return Ok(());
    }

    println!(
        "{} {}",
        display_target(&args.variable, &path).bold(),
        format!("({})", ty).bright_black()
    );
    println!("  Slot:   {}", slot_hex(&location.slot).bright_yellow());
    println!("  Offset: {}", location.offset.to_string().bright_cyan());
    println!("  Width:  {}", location.width.to_string().bright_cyan());

    Ok(())
}
