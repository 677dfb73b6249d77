//! CLI argument parsing for snapshot creation and restore.
use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Root CLI entrypoint.
#[derive(Parser, Debug)]
#[command(
    name = "devsnap",
    version,
    about = "Portable, self-describing snapshots of development projects",
    after_help = "Examples:\n  devsnap create\n  devsnap create ./my-api --out /tmp/my-api.devsnap\n  devsnap inspect my-api.devsnap --json\n  devsnap start my-api.devsnap --manual",
    subcommand_required = true,
    arg_required_else_help = true
)]
pub struct RootArgs {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    Create(CreateArgs),
    Start(StartArgs),
    Inspect(InspectArgs),
}

/// Create command inputs.
#[derive(Parser, Debug)]
#[command(about = "Detect the project's environments and pack it into a snapshot")]
pub struct CreateArgs {
    /// Project directory to snapshot (defaults to the current directory)
    #[arg(value_name = "DIR")]
    pub dir: Option<PathBuf>,

    /// Output path (defaults to <name>.devsnap in the current directory)
    #[arg(long, value_name = "PATH")]
    pub out: Option<PathBuf>,
}

#[derive(Parser, Debug)]
#[command(about = "Unpack a snapshot into the sandbox and bring its environments up")]
pub struct StartArgs {
    /// Snapshot file to restore
    #[arg(value_name = "FILE")]
    pub snapshot: PathBuf,

    /// Confirm every setup step before running it
    #[arg(short, long)]
    pub manual: bool,

    /// Answer yes to every confirmation (non-interactive)
    #[arg(short, long)]
    pub yes: bool,
}

#[derive(Parser, Debug)]
#[command(about = "Print a snapshot's metadata without extracting it")]
pub struct InspectArgs {
    /// Snapshot file to read
    #[arg(value_name = "FILE")]
    pub snapshot: PathBuf,

    /// Emit machine-readable JSON output
    #[arg(long)]
    pub json: bool,
}
