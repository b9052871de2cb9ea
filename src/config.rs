//! Command-line configuration of the interpreter.

use anyhow::{Result, bail};
use argh::FromArgs;

use crate::jobs::DEFAULT_MAX_JOBS;
use crate::lexer::DEFAULT_MAX_ARGS;

/// Prompt printed before each line is read.
pub const DEFAULT_PROMPT: &str = ": ";

/// Default `tracing` filter when `RUST_LOG` is unset.
pub const DEFAULT_LOG_LEVEL: &str = "warn";

#[derive(FromArgs, Debug)]
/// A small interactive shell with background jobs and simple redirection.
pub struct Args {
    #[argh(option, default = "String::from(DEFAULT_PROMPT)")]
    /// text printed before reading each command.
    pub prompt: String,

    #[argh(option, default = "DEFAULT_MAX_ARGS")]
    /// maximum number of words taken from one line.
    pub max_args: usize,

    #[argh(option, default = "DEFAULT_MAX_JOBS")]
    /// maximum number of background jobs tracked at once.
    pub max_jobs: usize,

    #[argh(option, default = "String::from(DEFAULT_LOG_LEVEL)")]
    /// log filter used when RUST_LOG is not set, e.g. "debug".
    pub log_level: String,
}

/// Settings the read loop runs with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShellConfig {
    pub prompt: String,
    pub max_args: usize,
    pub max_jobs: usize,
}

impl Default for ShellConfig {
    fn default() -> Self {
        Self {
            prompt: DEFAULT_PROMPT.to_string(),
            max_args: DEFAULT_MAX_ARGS,
            max_jobs: DEFAULT_MAX_JOBS,
        }
    }
}

impl TryFrom<&Args> for ShellConfig {
    type Error = anyhow::Error;

    fn try_from(args: &Args) -> Result<Self> {
        if args.max_args == 0 {
            bail!("--max-args must be at least 1");
        }
        Ok(Self {
            prompt: args.prompt.clone(),
            max_args: args.max_args,
            max_jobs: args.max_jobs,
        })
    }
}
