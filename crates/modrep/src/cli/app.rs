use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use super::commands::{
    errors::ErrorsArgs, inspect::InspectArgs, reincidence::ReincidenceArgs, summary::SummaryArgs,
};

#[derive(Debug, Parser)]
#[command(name = "modrep", version, about = "Delivery modulation reporting")]
pub struct Cli {
    #[command(flatten)]
    pub runtime: RuntimeArgs,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Clone, Args)]
pub struct RuntimeArgs {
    #[arg(long, global = true, value_name = "PATH")]
    pub home_dir: Option<PathBuf>,

    #[arg(long, global = true, value_name = "PATH")]
    pub cwd: Option<PathBuf>,

    #[arg(long, global = true, value_name = "PATH")]
    pub out_dir: Option<PathBuf>,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    Summary(SummaryArgs),
    Reincidence(ReincidenceArgs),
    Errors(ErrorsArgs),
    Inspect(InspectArgs),
}
