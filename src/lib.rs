//! A tiny interactive command interpreter.
//!
//! The interpreter reads one line at a time, replaces every `$$` with its own
//! process id, splits the line into words and resolves the `<`, `>` and
//! trailing `&` symbols. The built-ins `exit`, `status` and `cd` (and `#`
//! comments) run in-process; anything else is spawned as an external program,
//! either in the foreground or as a background job that is reaped before the
//! next prompt.
//!
//! The main entry point is [`Interpreter`]. The public modules [`command`],
//! [`env`], [`jobs`] and [`process`] expose the building blocks so they can be
//! driven and tested independently of the read loop.

mod builtin;
pub mod command;
pub mod config;
pub mod env;
pub mod error;
mod external;
mod interpreter;
pub mod jobs;
pub mod lexer;
pub mod parser;
pub mod process;

/// Just a convenient re-export of the interactive command runner.
///
/// See [`Interpreter`] for the high-level API.
pub use interpreter::Interpreter;
