//! Error types raised while turning a line into a running process.

use std::io;
use std::path::PathBuf;

use nix::errno::Errno;
use thiserror::Error;

/// Result alias for interpreter operations.
pub type Result<T> = std::result::Result<T, ShellError>;

/// Malformed use of the redirection and background symbols.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    /// A `<` or `>` was the last word, or was directly followed by another symbol.
    #[error("missing file name after `{0}`")]
    MissingRedirectTarget(&'static str),
    /// The same redirection symbol appeared more than once.
    #[error("`{0}` given more than once")]
    DuplicateRedirect(&'static str),
    /// Only symbols and file names were given.
    #[error("missing command")]
    MissingCommand,
}

/// Which standard stream a redirection applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Input,
    Output,
}

impl std::fmt::Display for Direction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Direction::Input => f.write_str("input"),
            Direction::Output => f.write_str("output"),
        }
    }
}

/// Failures of the interpreter's own context. None of them end the read loop.
#[derive(Debug, Error)]
pub enum ShellError {
    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error("cannot open {path} for {direction}: {source}")]
    Redirect {
        path: PathBuf,
        direction: Direction,
        #[source]
        source: io::Error,
    },

    #[error("{program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: io::Error,
    },

    #[error("too many background jobs (limit is {0})")]
    JobTableFull(usize),

    #[error("waiting for child failed: {0}")]
    Wait(#[source] Errno),

    #[error("sending signal failed: {0}")]
    Signal(#[source] Errno),
}
