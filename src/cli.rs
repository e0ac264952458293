// src/cli.rs

use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Seed for random file modifications
    #[arg(short, long)]
    pub seed: Option<u64>,

    /// Commands to run, separated by ';' (skips the REPL)
    #[arg(short, long)]
    pub execute: Option<String>,

    /// Script file with one command per line (skips the REPL)
    #[arg(long, conflicts_with = "execute")]
    pub script: Option<PathBuf>,

    /// Print the final state as JSON
    #[arg(long)]
    pub json: bool,

    /// Print the working directory and staging area after every change
    #[arg(long)]
    pub show_status: bool,

    /// Upper bound of inserted lines per random modification
    #[arg(long, default_value_t = 10)]
    pub max_insertions: u32,

    /// Upper bound of deleted lines per random modification
    #[arg(long, default_value_t = 5)]
    pub max_deletions: u32,

    /// Enable debug logging
    #[arg(short, long)]
    pub verbose: bool,
}
