use std::collections::HashMap;
use std::env as stdenv;
use std::io::{self, Write};

use crate::jobs::{self, JobTable};
use crate::process::{ProcessControl, SystemProcesses, Termination};

/// Mutable state the interpreter carries from one prompt to the next.
///
/// The environment contains:
/// - `vars`: variables consulted by built-ins (e.g. `HOME` for `cd`).
/// - `pid`: the interpreter's own process id, substituted for `$$`.
/// - `last_status`: how the most recent foreground command ended.
/// - `jobs`: background children that have not been reaped yet.
/// - `should_exit`: a flag the read loop checks to know when to terminate.
///
/// The working directory is deliberately absent; it belongs to the OS.
pub struct Environment {
    /// Key-value store of variables, seeded from the process environment.
    pub vars: HashMap<String, String>,
    /// Decimal process id of the interpreter, computed once.
    pub pid: String,
    /// Status reported by the `status` built-in.
    pub last_status: Termination,
    /// Live background jobs.
    pub jobs: JobTable,
    /// When set to true, indicates that the read loop should exit.
    pub should_exit: bool,
    processes: Box<dyn ProcessControl>,
}

impl Environment {
    /// Capture the current process state, waiting on real child processes.
    pub fn new(max_jobs: usize) -> Self {
        Self::with_processes(max_jobs, Box::new(SystemProcesses))
    }

    /// Like [`Environment::new`] but with a custom process table.
    pub fn with_processes(max_jobs: usize, processes: Box<dyn ProcessControl>) -> Self {
        Self {
            vars: stdenv::vars().collect(),
            pid: std::process::id().to_string(),
            last_status: Termination::default(),
            jobs: JobTable::new(max_jobs),
            should_exit: false,
            processes,
        }
    }

    pub fn processes(&self) -> &dyn ProcessControl {
        self.processes.as_ref()
    }

    /// Get the value of a variable.
    ///
    /// Looks up the key in `self.vars` first, falling back to `std::env::var`.
    pub fn get_var(&self, key: &str) -> Option<String> {
        self.vars
            .get(key)
            .cloned()
            .or_else(|| stdenv::var(key).ok())
    }

    /// Set or override a variable in `self.vars`.
    pub fn set_var(&mut self, key: impl Into<String>, val: impl Into<String>) {
        self.vars.insert(key.into(), val.into());
    }

    /// Report and drop every finished background job.
    pub fn reap_jobs(&mut self, out: &mut dyn Write) -> io::Result<usize> {
        jobs::reap(&mut self.jobs, self.processes.as_ref(), out)
    }

    /// Kill every background job still being tracked.
    pub fn kill_jobs(&mut self) {
        jobs::kill_all(&mut self.jobs, self.processes.as_ref());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::jobs::fake::FakeProcesses;

    fn env() -> Environment {
        Environment::with_processes(4, Box::new(FakeProcesses::default()))
    }

    #[test]
    fn test_env_set_and_get_var() {
        let mut env = env();
        env.vars.clear();

        // initially absent
        assert_eq!(env.get_var("SOME_RANDOM_ENV_VAR_12345"), None);

        env.set_var("KEY", "VALUE");

        assert_eq!(env.get_var("KEY"), Some("VALUE".to_string()));
    }

    #[test]
    fn test_env_reads_from_process_env() {
        let env = env();
        assert!(env.get_var("PATH").is_some());
    }

    #[test]
    fn test_pid_is_own_process_id() {
        let env = env();
        assert_eq!(env.pid, std::process::id().to_string());
        assert_eq!(env.last_status, Termination::Exited(0));
    }
}
