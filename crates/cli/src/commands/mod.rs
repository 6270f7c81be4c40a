//! CLI commands module.

use anyhow::{anyhow, Result};
use clap::Subcommand;
use slotscope_core::{AccessPath, Declaration, Slot, TypeDescriptor, Word};
use slotscope_schema::parse_typed_path;

mod dump;
mod init;
mod layout;
mod read;
mod resolve;
mod write;

#[derive(Subcommand)]
pub enum Commands {
    /// Initialize a data directory for a schema
    Init(init::InitArgs),
    /// Print the static slot layout
    Layout(layout::LayoutArgs),
    /// Resolve a path to its slot, offset and width
    Resolve(resolve::ResolveArgs),
    /// Read a value from storage
    Read(read::ReadArgs),
    /// Write or clear a value in storage
    Write(write::WriteArgs),
    /// List every non-zero word in storage
    Dump(dump::DumpArgs),
}

pub fn run(cmd: Commands) -> Result<()> {
    match cmd {
        Commands::Init(args) => init::run(args),
        Commands::Layout(args) => layout::run(args),
        Commands::Resolve(args) => resolve::run(args),
        Commands::Read(args) => read::run(args),
        Commands::Write(args) => write::run(args),
        Commands::Dump(args) => dump::run(args),
    }
}

/// Parse `VAR` followed by path segments such as `.owner`, `[3]` or `{0xab..}`.
///
/// Segments may be passed as one argument or several; they are joined
/// before parsing.
pub(crate) fn parse_target<'a>(
    declaration: &'a Declaration,
    variable: &str,
    segments: &[String],
) -> Result<(AccessPath, &'a TypeDescriptor)> {
    let root = declaration
        .get(variable)
        .ok_or_else(|| anyhow!("Unknown variable: {}", variable))?;
    let text = segments.concat();
    Ok(parse_typed_path(root, &text)?)
}

/// Render `VAR` + path for display.
pub(crate) fn display_target(variable: &str, path: &AccessPath) -> String {
    format!("{}{}", variable, path)
}

/// Full 32-byte hex form of a slot number.
pub(crate) fn slot_hex(slot: &Slot) -> String {
    format!("0x{}", Word::from_u256(*slot).to_hex())
}
