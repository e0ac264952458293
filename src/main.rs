//! stagecraft - a working directory / staging area / commit playground
//!
//! This is the main entry point for the stagecraft command-line interface.

mod cli;

use std::io;
use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use cli::Args;
use stagecraft::session::{Repl, ReplConfig, ReplResult, Session, SessionConfig};

fn main() -> ExitCode {
    let args = Args::parse();
    init_logging(args.verbose);

    let mut config = SessionConfig::new()
        .modification_limits(args.max_insertions, args.max_deletions)
        .verbose(args.verbose);
    if let Some(seed) = args.seed {
        config = config.seed(seed);
    }

    let session = match Session::with_config(config) {
        Ok(session) => session,
        Err(e) => {
            eprintln!("Error: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let repl_config = ReplConfig {
        show_status_after_command: args.show_status,
        ..ReplConfig::default()
    };
    let mut repl = Repl::with_config(session, repl_config);

    match run(&mut repl, &args) {
        Ok(_) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

fn run(repl: &mut Repl, args: &Args) -> ReplResult<()> {
    let mut stdout = io::stdout();

    if let Some(commands) = &args.execute {
        repl.run_commands(commands.split(';'), &mut stdout)?;
    } else if let Some(path) = &args.script {
        repl.run_script(path, &mut stdout)?;
    } else if !args.json {
        repl.run()?;
        return Ok(());
    }

    if args.json {
        let snapshot = repl.session().snapshot()?;
        let json = serde_json::to_string_pretty(&snapshot)
            .map_err(|e| io::Error::new(io::ErrorKind::Other, e))?;
        println!("{}", json);
    }
    Ok(())
}
