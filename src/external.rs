use crate::command::{Command, ExecutableCommand};
use crate::env::Environment;
use crate::error::{Direction, ShellError};
use crate::process::{Pid, SignalPolicy, Termination};
use anyhow::Result;
use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::os::unix::fs::OpenOptionsExt;
use std::os::unix::process::CommandExt;
use std::path::Path;
use std::process::{Child, Stdio};
use tracing::debug;

/// Permission bits for files created by `> path`.
const OUTPUT_MODE: u32 = 0o644;

/// Command that is not a builtin.
pub struct ExternalCommand {
    command: Command,
}

impl ExternalCommand {
    pub fn new(command: Command) -> Self {
        Self { command }
    }

    fn stdin(&self) -> Result<Stdio, ShellError> {
        match &self.command.input {
            Some(path) => File::open(path)
                .map(Stdio::from)
                .map_err(|source| redirect_error(path, Direction::Input, source)),
            None if self.command.background => Ok(Stdio::null()),
            None => Ok(Stdio::inherit()),
        }
    }

    fn stdout(&self) -> Result<Stdio, ShellError> {
        match &self.command.output {
            Some(path) => OpenOptions::new()
                .write(true)
                .create(true)
                .truncate(true)
                .mode(OUTPUT_MODE)
                .open(path)
                .map(Stdio::from)
                .map_err(|source| redirect_error(path, Direction::Output, source)),
            None if self.command.background => Ok(Stdio::null()),
            None => Ok(Stdio::inherit()),
        }
    }

    /// Start the program with its streams bound and signal dispositions set.
    fn spawn(&self) -> Result<Child, ShellError> {
        let stdin = self.stdin()?;
        let stdout = self.stdout()?;
        let policy = SignalPolicy::for_job(self.command.background);

        let mut process = std::process::Command::new(self.command.program());
        process.args(self.command.args()).stdin(stdin).stdout(stdout);
        // SAFETY: the hook only calls sigaction, which is async-signal-safe.
        unsafe {
            process.pre_exec(move || policy.apply().map_err(io::Error::from));
        }

        process.spawn().map_err(|source| ShellError::Spawn {
            program: self.command.program().to_owned(),
            source,
        })
    }

    fn launch(&self, out: &mut dyn Write, env: &mut Environment) -> Result<()> {
        if self.command.background {
            env.jobs.ensure_room()?;
        }
        out.flush()?;

        let child = self.spawn()?;
        let pid = Pid::from_raw(child.id() as i32);
        debug!(program = self.command.program(), %pid, background = self.command.background, "spawned");

        if self.command.background {
            env.jobs.push(pid)?;
            writeln!(out, "background pid is {pid}")?;
            return Ok(());
        }

        let termination = env.processes().wait_for(pid)?;
        debug!(%pid, %termination, "foreground command finished");
        env.last_status = termination;
        if let Termination::Signaled(_) = termination {
            writeln!(out, "{termination}")?;
        }
        Ok(())
    }
}

fn redirect_error(path: &Path, direction: Direction, source: io::Error) -> ShellError {
    ShellError::Redirect {
        path: path.to_owned(),
        direction,
        source,
    }
}

impl ExecutableCommand for ExternalCommand {
    fn execute(self: Box<Self>, out: &mut dyn Write, env: &mut Environment) -> Result<()> {
        self.launch(out, env).inspect_err(|_| {
            env.last_status = Termination::FAILED;
        })
    }
}
