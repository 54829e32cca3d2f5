use std::path::PathBuf;

use blox_types::{BlockFormat, TextBase};
use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(name = "blox", about = "Blox content-addressed block node", version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Repository directory
    #[arg(long, global = true, default_value = ".blox")]
    pub repo: PathBuf,

    /// Log at debug level
    #[arg(long, global = true)]
    pub verbose: bool,

    #[arg(long, global = true, default_value = "text")]
    pub format: OutputFormat,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
pub enum Command {
    /// Initialize a new repository
    Init,
    /// Add, inspect and remove raw blocks
    #[command(subcommand)]
    Block(BlockCommand),
    /// Manage pins
    #[command(subcommand)]
    Pin(PinCommand),
    /// List blocks under a key
    Ls(LsArgs),
}

#[derive(Subcommand)]
pub enum BlockCommand {
    /// Store a file as a block
    Put(PutArgs),
    /// Remove blocks
    Rm(RmArgs),
    /// Show a block's size
    Stat(StatArgs),
}

#[derive(Args)]
pub struct PutArgs {
    pub file: PathBuf,
    #[arg(long = "block-format", default_value = "raw")]
    pub block_format: BlockFormat,
}

#[derive(Args)]
pub struct RmArgs {
    #[arg(required = true)]
    pub ids: Vec<String>,
    /// Ignore nonexistent and pinned blocks
    #[arg(short, long)]
    pub force: bool,
    /// Write no output
    #[arg(short, long)]
    pub quiet: bool,
}

#[derive(Args)]
pub struct StatArgs {
    pub id: String,
}

#[derive(Subcommand)]
pub enum PinCommand {
    /// Pin a block
    Add(PinAddArgs),
    /// Remove a direct or recursive pin
    Rm(PinRmArgs),
    /// List pins
    Ls(PinLsArgs),
}

#[derive(Args)]
pub struct PinAddArgs {
    pub id: String,
    /// Protect the block and the listed descendants
    #[arg(short, long)]
    pub recursive: bool,
    /// Descendants protected by a recursive pin
    #[arg(long = "child", requires = "recursive")]
    pub children: Vec<String>,
}

#[derive(Args)]
pub struct PinRmArgs {
    pub id: String,
}

#[derive(Args)]
pub struct PinLsArgs {
    /// all, direct, recursive, indirect or internal
    #[arg(long = "type", default_value = "all")]
    pub kind: String,
}

#[derive(Args)]
pub struct LsArgs {
    pub key: String,
    /// Print table headers (Hash, Size, Name)
    #[arg(short = 'v', long)]
    pub headers: bool,
    /// List subdirectories recursively
    #[arg(short, long)]
    pub recursive: bool,
    /// Identifier encoding: base16 or base32
    #[arg(long = "cid-base", default_value = "base16")]
    pub cid_base: TextBase,
}
