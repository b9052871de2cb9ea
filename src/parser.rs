//! Resolution of the `<`, `>` and trailing `&` symbols of a tokenized line.

use crate::command::Command;
use crate::error::ParseError;
use std::path::PathBuf;

/// Input redirection symbol.
pub const REDIRECT_IN: &str = "<";
/// Output redirection symbol.
pub const REDIRECT_OUT: &str = ">";
/// Background symbol, only meaningful as the last word.
pub const BACKGROUND: &str = "&";

fn is_redirect(token: &str) -> bool {
    token == REDIRECT_IN || token == REDIRECT_OUT
}

struct Resolver {
    tokens: std::vec::IntoIter<String>,
    command: Command,
}

impl Resolver {
    fn new(mut tokens: Vec<String>) -> Self {
        let background = tokens.last().is_some_and(|t| t == BACKGROUND);
        if background {
            tokens.pop();
        }
        Resolver {
            tokens: tokens.into_iter(),
            command: Command {
                background,
                ..Command::default()
            },
        }
    }

    fn run(mut self) -> Result<Command, ParseError> {
        while let Some(token) = self.tokens.next() {
            match token.as_str() {
                REDIRECT_IN => {
                    let target = self.target(REDIRECT_IN)?;
                    Self::set_once(&mut self.command.input, target, REDIRECT_IN)?;
                }
                REDIRECT_OUT => {
                    let target = self.target(REDIRECT_OUT)?;
                    Self::set_once(&mut self.command.output, target, REDIRECT_OUT)?;
                }
                _ => self.command.argv.push(token),
            }
        }

        if self.command.argv.is_empty() {
            return Err(ParseError::MissingCommand);
        }
        Ok(self.command)
    }

    /// Consume the file name following a redirection symbol.
    fn target(&mut self, symbol: &'static str) -> Result<PathBuf, ParseError> {
        match self.tokens.next() {
            Some(name) if !is_redirect(&name) => Ok(PathBuf::from(name)),
            _ => Err(ParseError::MissingRedirectTarget(symbol)),
        }
    }

    fn set_once(
        slot: &mut Option<PathBuf>,
        target: PathBuf,
        symbol: &'static str,
    ) -> Result<(), ParseError> {
        if slot.is_some() {
            return Err(ParseError::DuplicateRedirect(symbol));
        }
        *slot = Some(target);
        Ok(())
    }
}

/// Turn the words of a line into a [`Command`].
///
/// Every `< file` and `> file` pair is removed from the argument list,
/// wherever it appears, and a final `&` marks the command as a background
/// job. A redirection symbol without a file name, or one given twice, is
/// rejected rather than guessed at. An `&` anywhere but last is kept as an
/// ordinary argument.
///
/// # Arguments
/// * `tokens` - Non-empty words produced by [`crate::lexer::split_into_tokens`].
pub fn resolve(tokens: Vec<String>) -> Result<Command, ParseError> {
    Resolver::new(tokens).run()
}
