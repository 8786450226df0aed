use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(
    name = "rxproof",
    about = "Fingerprint prescription files and record or verify them in a presence registry",
    version
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Verbose logging. Repeat for more (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Path to a TOML configuration file.
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[arg(long, global = true, value_enum, default_value = "text")]
    pub format: OutputFormat,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Generate a signing identity
    Keygen(KeygenArgs),
    /// Print a file's digest without touching the registry
    Hash(FileArgs),
    /// Record a file's digest
    Record(FileArgs),
    /// Check whether a file's digest has been recorded
    Verify(FileArgs),
    /// Print the notification log
    Log(LogArgs),
}

#[derive(Args, Debug)]
pub struct KeygenArgs {
    /// Where to write the seed. Defaults to the configured key file.
    #[arg(long)]
    pub out: Option<PathBuf>,

    /// Replace an existing key file.
    #[arg(long)]
    pub force: bool,
}

#[derive(Args, Debug)]
pub struct FileArgs {
    pub file: PathBuf,
}

#[derive(Args, Debug)]
pub struct LogArgs {
    /// Only notifications with a sequence number above this.
    #[arg(long, default_value_t = 0)]
    pub after: u64,

    #[arg(long, default_value_t = 100)]
    pub limit: usize,
}
