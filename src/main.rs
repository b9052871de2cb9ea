use std::{env, io, process};

use smallsh::Interpreter;
use smallsh::config::{Args, ShellConfig};
use smallsh::process::SignalPolicy;
use tracing::{debug, error, warn};

/// Exit code of the interpreter once its loop ends.
const SHELL_EXIT_CODE: i32 = 1;

fn main() {
    let args: Args = argh::from_env();

    let env_filter = env::var("RUST_LOG").unwrap_or_else(|_| args.log_level.clone());
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::new(env_filter))
        .with_writer(io::stderr)
        .with_target(false)
        .compact()
        .init();

    let config = match ShellConfig::try_from(&args) {
        Ok(config) => config,
        Err(e) => {
            error!("{e:#}");
            eprintln!("smallsh: {e:#}");
            process::exit(2);
        }
    };
    debug!(?config, pid = process::id(), "starting");

    if let Err(e) = SignalPolicy::SHELL.apply() {
        warn!(error = %e, "could not ignore SIGINT/SIGTSTP");
    }

    let mut shell = Interpreter::new(config);
    if let Err(e) = shell.repl(io::stdin().lock(), io::stdout().lock()) {
        error!(error = %e, "writing to stdout failed");
    }

    process::exit(SHELL_EXIT_CODE);
}
