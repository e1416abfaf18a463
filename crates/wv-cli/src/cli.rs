use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "wv",
    about = "Work Verifier: record student work on-chain and have mentors approve it",
    version
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// TOML config file; `WV_*` environment variables override it
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[arg(short, long, global = true)]
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
    /// Authorize the signing wallet and switch it to the expected network
    Connect,
    /// Upload a file and record it as a new submission
    Submit(SubmitArgs),
    /// Approve a submission as mentor
    Approve(IdArgs),
    /// Show a submission by id
    Show(IdArgs),
    /// Number of submissions on the ledger
    Count,
    /// List every submission
    List,
    /// Upload a file without recording it
    Upload(UploadArgs),
    /// Print gateway and explorer links
    Links(LinksArgs),
}

#[derive(Args)]
pub struct SubmitArgs {
    #[arg(short, long)]
    pub title: String,
    #[arg(short, long)]
    pub file: PathBuf,
}

#[derive(Args)]
pub struct IdArgs {
    pub id: u64,
}

#[derive(Args)]
pub struct UploadArgs {
    pub file: PathBuf,
}

#[derive(Args)]
pub struct LinksArgs {
    #[arg(long)]
    pub cid: Option<String>,
    #[arg(long)]
    pub tx: Option<String>,
}
