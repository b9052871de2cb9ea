use crate::builtin::COMMENT;
use crate::command::{Command, CommandFactory, ExecutableCommand};
use crate::config::ShellConfig;
use crate::env::Environment;
use crate::external::ExternalCommand;
use crate::{lexer, parser};
use std::io::{self, BufRead, Write};
use tracing::{debug, info, warn};

/// Factory allows creating instances of ExecutableCommand.
///
/// Only supports commands defined in this crate — see [`crate::builtin`].
pub(crate) struct Factory<T> {
    _phantom: std::marker::PhantomData<T>,
}

impl<T> Default for Factory<T> {
    fn default() -> Self {
        Self {
            _phantom: std::marker::PhantomData,
        }
    }
}

/// The interactive command interpreter.
///
/// Each line is expanded (`$$` → pid), split into words, checked for a
/// comment, resolved into a [`Command`], and then handed to the first
/// built-in factory that recognizes its name or, failing that, launched as an
/// external program.
///
/// Example
/// ```no_run
/// use smallsh::Interpreter;
/// use smallsh::config::ShellConfig;
/// let mut sh = Interpreter::new(ShellConfig::default());
/// sh.repl(std::io::stdin().lock(), std::io::stdout()).unwrap();
/// ```
pub struct Interpreter {
    config: ShellConfig,
    env: Environment,
    builtins: Vec<Box<dyn CommandFactory>>,
}

impl Interpreter {
    /// Create an interpreter that manages real child processes.
    pub fn new(config: ShellConfig) -> Self {
        let env = Environment::new(config.max_jobs);
        Self::with_environment(config, env)
    }

    /// Create an interpreter around an existing [`Environment`].
    ///
    /// Comes with the built-ins `exit`, `status` and `cd`.
    pub fn with_environment(config: ShellConfig, env: Environment) -> Self {
        use crate::builtin::*;
        Self {
            config,
            env,
            builtins: vec![
                Box::new(Factory::<Exit>::default()),
                Box::new(Factory::<Status>::default()),
                Box::new(Factory::<Cd>::default()),
            ],
        }
    }

    pub fn env(&self) -> &Environment {
        &self.env
    }

    pub fn env_mut(&mut self) -> &mut Environment {
        &mut self.env
    }

    /// Read, expand and dispatch lines from `input` until `exit` runs or the
    /// input ends. Finished background jobs are reported before every prompt.
    ///
    /// Only failures to write to `out` are returned; everything else is
    /// reported to the user and the loop carries on.
    pub fn repl<R: BufRead, W: Write>(&mut self, mut input: R, mut out: W) -> io::Result<()> {
        let mut buf = Vec::new();
        while !self.env.should_exit {
            self.env.reap_jobs(&mut out)?;

            write!(out, "{}", self.config.prompt)?;
            out.flush()?;

            buf.clear();
            match input.read_until(b'\n', &mut buf) {
                Ok(0) => {
                    info!("end of input");
                    writeln!(out)?;
                    self.env.kill_jobs();
                    break;
                }
                Ok(_) => {
                    let line = String::from_utf8_lossy(&buf);
                    self.run_line(&line, &mut out)?;
                }
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => {
                    warn!(error = %e, "reading input failed");
                    writeln!(out, "smallsh: {e}")?;
                    self.env.kill_jobs();
                    break;
                }
            }
        }
        out.flush()
    }

    /// Expand, parse and execute a single line.
    pub fn run_line(&mut self, line: &str, out: &mut dyn Write) -> io::Result<()> {
        let expanded = lexer::expand_pid(line, &self.env.pid);
        let tokens = lexer::split_into_tokens(&expanded, self.config.max_args);

        match tokens.first() {
            None => return Ok(()),
            Some(first) if first.starts_with(COMMENT) => return Ok(()),
            Some(_) => {}
        }

        let command = match parser::resolve(tokens) {
            Ok(command) => command,
            Err(e) => {
                debug!(error = %e, "rejected line");
                writeln!(out, "smallsh: {e}")?;
                return out.flush();
            }
        };
        debug!(?command, "dispatching");

        if let Err(e) = self.create(command).execute(out, &mut self.env) {
            writeln!(out, "smallsh: {e}")?;
        }
        out.flush()
    }

    fn create(&self, command: Command) -> Box<dyn ExecutableCommand> {
        let builtin = {
            let args: Vec<&str> = command.args().iter().map(String::as_str).collect();
            self.builtins
                .iter()
                .find_map(|factory| factory.try_create(command.program(), &args))
        };
        builtin.unwrap_or_else(|| Box::new(ExternalCommand::new(command)))
    }
}

impl Default for Interpreter {
    fn default() -> Self {
        Self::new(ShellConfig::default())
    }
}
