//! Read value command.

use super::{display_target, parse_target};
use crate::config::{open_store, Workspace};
use anyhow::Result;
use clap::Args;
use colored::Colorize;
use std::path::PathBuf;

#[derive(Args)]
pub struct ReadArgs {
    /// State variable name
    variable: String,

    /// Path segments: .field, [index] or {key}
    segments: Vec<String>,

    /// Data directory
    #[arg(short, long, default_value = "./data")]
    data_dir: PathBuf,

    /// Print the array length (or byte length) instead of the value
    #[arg(long)]
    length: bool,

    /// Output as JSON
    #[arg(long)]
    json: bool,
}

pub fn run(args: ReadArgs) -> Result<()> {
    let workspace = Workspace::load(&args.data_dir)?;
    let store = open_store(&args.data_dir)?;
    let (path, ty) = parse_target(&workspace.declaration, &args.variable, &args.segments)?;
    let target = display_target(&args.variable, &path);

    if args.length {
        let length = workspace
            .layout
            .array_length(&store, &args.variable, &path)?;
        if args.json {
            println!("{}", serde_json::json!({ "length": length }));
        } else {
            println!("{} {}", format!("{}.length", target).bold(), length.to_string().bright_cyan());
        }
        return Ok(());
    }

    let value = workspace.layout.read_value(&store, &args.variable, &path)?;
    if args.json {
        println!("{}", serde_json::to_string_pretty(&value)?);
    } else {
        println!(
            "{} {} {}",
            target.bold(),
            format!("({})", ty).bright_black(),
            value.to_string().bright_yellow()
        );
    }

    Ok(())
}
