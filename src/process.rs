//! Child process handles: how a child ended, which signals it may receive,
//! and the two ways the interpreter waits for children.

use std::fmt;

use nix::errno::Errno;
use nix::sys::signal::{self, SaFlags, SigAction, SigHandler, SigSet, Signal};
use nix::sys::wait::{WaitPidFlag, WaitStatus, waitpid};
pub use nix::unistd::Pid;
use tracing::trace;

use crate::error::{Result, ShellError};

/// How a child process ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Termination {
    /// Normal exit with the given code.
    Exited(i32),
    /// Killed by the given signal number.
    Signaled(i32),
}

impl Termination {
    /// Exit status used when a command could not even be started.
    pub const FAILED: Termination = Termination::Exited(1);

    fn from_wait_status(status: WaitStatus) -> Option<(Pid, Termination)> {
        match status {
            WaitStatus::Exited(pid, code) => Some((pid, Termination::Exited(code))),
            WaitStatus::Signaled(pid, sig, _) => Some((pid, Termination::Signaled(sig as i32))),
            _ => None,
        }
    }
}

impl Default for Termination {
    fn default() -> Self {
        Termination::Exited(0)
    }
}

impl fmt::Display for Termination {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Termination::Exited(code) => write!(f, "exit value {code}"),
            Termination::Signaled(sig) => write!(f, "terminated by signal {sig}"),
        }
    }
}

/// What happens when a signal arrives.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Disposition {
    Default,
    Ignore,
}

impl Disposition {
    fn handler(self) -> SigHandler {
        match self {
            Disposition::Default => SigHandler::SigDfl,
            Disposition::Ignore => SigHandler::SigIgn,
        }
    }
}

/// Dispositions for the interrupt (SIGINT) and terminal-stop (SIGTSTP) signals.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SignalPolicy {
    pub interrupt: Disposition,
    pub stop: Disposition,
}

impl SignalPolicy {
    /// The interpreter itself survives both ^C and ^Z.
    pub const SHELL: SignalPolicy = SignalPolicy {
        interrupt: Disposition::Ignore,
        stop: Disposition::Ignore,
    };

    /// A foreground child can be interrupted but not stopped.
    pub const FOREGROUND: SignalPolicy = SignalPolicy {
        interrupt: Disposition::Default,
        stop: Disposition::Ignore,
    };

    /// A background child ignores both.
    pub const BACKGROUND: SignalPolicy = SignalPolicy {
        interrupt: Disposition::Ignore,
        stop: Disposition::Ignore,
    };

    pub fn for_job(background: bool) -> SignalPolicy {
        if background {
            SignalPolicy::BACKGROUND
        } else {
            SignalPolicy::FOREGROUND
        }
    }

    /// Install both dispositions in the calling process.
    ///
    /// Only calls `sigaction`, so it is safe to run between `fork` and `exec`.
    pub fn apply(&self) -> nix::Result<()> {
        for (sig, disposition) in [
            (Signal::SIGINT, self.interrupt),
            (Signal::SIGTSTP, self.stop),
        ] {
            let action = SigAction::new(disposition.handler(), SaFlags::SA_RESTART, SigSet::empty());
            // SAFETY: SIG_DFL and SIG_IGN are not Rust handlers, so no
            // async-signal-safety requirements are introduced.
            unsafe { signal::sigaction(sig, &action) }?;
        }
        Ok(())
    }
}

/// Waiting on and signalling children of the interpreter.
pub trait ProcessControl {
    /// Block until `pid` terminates.
    fn wait_for(&self, pid: Pid) -> Result<Termination>;

    /// Collect one finished child without blocking, if any.
    fn poll_any(&self) -> Result<Option<(Pid, Termination)>>;

    /// Forcefully terminate `pid`.
    fn kill(&self, pid: Pid) -> Result<()>;
}

/// [`ProcessControl`] backed by the operating system's process table.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemProcesses;

impl ProcessControl for SystemProcesses {
    fn wait_for(&self, pid: Pid) -> Result<Termination> {
        loop {
            match waitpid(pid, None) {
                Ok(status) => {
                    if let Some((_, termination)) = Termination::from_wait_status(status) {
                        return Ok(termination);
                    }
                    trace!(?status, "ignoring non-terminal wait status");
                }
                Err(Errno::EINTR) => continue,
                Err(e) => return Err(ShellError::Wait(e)),
            }
        }
    }

    fn poll_any(&self) -> Result<Option<(Pid, Termination)>> {
        loop {
            match waitpid(None::<Pid>, Some(WaitPidFlag::WNOHANG)) {
                Ok(WaitStatus::StillAlive) => return Ok(None),
                Ok(status) => {
                    if let Some(done) = Termination::from_wait_status(status) {
                        return Ok(Some(done));
                    }
                }
                Err(Errno::ECHILD) => return Ok(None),
                Err(Errno::EINTR) => continue,
                Err(e) => return Err(ShellError::Wait(e)),
            }
        }
    }

    fn kill(&self, pid: Pid) -> Result<()> {
        match signal::kill(pid, Signal::SIGKILL) {
            Ok(()) | Err(Errno::ESRCH) => Ok(()),
            Err(e) => Err(ShellError::Signal(e)),
        }
    }
}
