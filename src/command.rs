use crate::env::Environment;
use anyhow::Result;
use std::io::Write;
use std::path::PathBuf;

/// A single command line after its redirection and background symbols have
/// been resolved.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Command {
    /// Program name followed by its arguments. Never contains `<`/`>` pairs
    /// or the trailing `&`, and is never empty once produced by
    /// [`crate::parser::resolve`].
    pub argv: Vec<String>,
    /// File bound to standard input, from `< path`.
    pub input: Option<PathBuf>,
    /// File bound to standard output, from `> path`.
    pub output: Option<PathBuf>,
    /// Set by a trailing `&`.
    pub background: bool,
}

impl Command {
    /// The program to run; empty when `argv` is.
    pub fn program(&self) -> &str {
        self.argv.first().map_or("", String::as_str)
    }

    pub fn args(&self) -> &[String] {
        self.argv.get(1..).unwrap_or_default()
    }
}

/// Object-safe trait for anything the interpreter can run for a command line.
///
/// This is implemented by built-ins via a blanket impl and by external commands.
pub trait ExecutableCommand {
    /// Executes the command, writing user-facing messages to `out`.
    fn execute(self: Box<Self>, out: &mut dyn Write, env: &mut Environment) -> Result<()>;
}

/// Factory that tries to create a command from a name and its arguments.
///
/// Returns `None` when the factory doesn't recognize the `name`.
pub trait CommandFactory {
    /// Attempt to create a command instance for the provided name and arguments.
    fn try_create(&self, name: &str, args: &[&str]) -> Option<Box<dyn ExecutableCommand>>;
}
