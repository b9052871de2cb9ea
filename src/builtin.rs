use crate::command::{CommandFactory, ExecutableCommand};
use crate::env::Environment;
use crate::interpreter::Factory;
use anyhow::{Context, Result};
use argh::{EarlyExit, FromArgs};
use std::env;
use std::io::Write;
use std::path::PathBuf;
use tracing::debug;

/// Prefix that turns a whole line into a comment.
pub(crate) const COMMENT: char = '#';

/// Built-in commands known to the shell at compile time.
///
/// Builtins are parsed using the [`argh`] crate (`FromArgs`) and executed directly
/// in-process without spawning a child process. They ignore redirection and
/// the background flag, and never touch the recorded foreground status.
pub(crate) trait BuiltinCommand: Sized + FromArgs {
    /// Canonical name of the command, e.g. "cd".
    fn name() -> &'static str;

    /// Executes the command, writing any output to `out`.
    fn execute(self, out: &mut dyn Write, env: &mut Environment) -> Result<()>;
}

impl<T: BuiltinCommand> ExecutableCommand for T {
    fn execute(self: Box<Self>, out: &mut dyn Write, env: &mut Environment) -> Result<()> {
        if let Err(e) = T::execute(*self, out, env) {
            writeln!(out, "{e:#}")?;
        }
        Ok(())
    }
}

struct InvalidArgs {
    output: String,
}

impl ExecutableCommand for InvalidArgs {
    fn execute(self: Box<Self>, out: &mut dyn Write, _env: &mut Environment) -> Result<()> {
        writeln!(out, "{}", self.output.trim_end())?;
        Ok(())
    }
}

impl<T: BuiltinCommand + 'static> CommandFactory for Factory<T> {
    fn try_create(&self, name: &str, args: &[&str]) -> Option<Box<dyn ExecutableCommand>> {
        if name == T::name() {
            Some(match T::from_args(&[name], args) {
                Ok(cmd) => Box::new(cmd),
                Err(EarlyExit { output, .. }) => Box::new(InvalidArgs { output }),
            })
        } else {
            None
        }
    }
}

/// Kill every background job and leave the shell.
///
/// Takes no options: every word after `exit`, flag-like or not, is ignored.
pub struct Exit;

impl FromArgs for Exit {
    fn from_args(_command_name: &[&str], _args: &[&str]) -> Result<Self, EarlyExit> {
        Ok(Exit)
    }
}

impl BuiltinCommand for Exit {
    fn name() -> &'static str {
        "exit"
    }

    fn execute(self, _out: &mut dyn Write, env: &mut Environment) -> Result<()> {
        debug!(jobs = env.jobs.len(), "exit requested");
        env.kill_jobs();
        env.should_exit = true;
        Ok(())
    }
}

/// Print the exit value or terminating signal of the last foreground command.
///
/// Like [`Exit`], ignores whatever follows it on the line.
pub struct Status;

impl FromArgs for Status {
    fn from_args(_command_name: &[&str], _args: &[&str]) -> Result<Self, EarlyExit> {
        Ok(Status)
    }
}

impl BuiltinCommand for Status {
    fn name() -> &'static str {
        "status"
    }

    fn execute(self, out: &mut dyn Write, env: &mut Environment) -> Result<()> {
        writeln!(out, "{}", env.last_status)?;
        Ok(())
    }
}

#[derive(FromArgs)]
/// Change the current working directory.
/// If no target is provided, changes to the directory specified by the HOME environment variable.
pub struct Cd {
    #[argh(positional, greedy)]
    /// directory to switch to; absolute or relative to the current directory. Defaults to $HOME when omitted. Further words are ignored.
    pub args: Vec<String>,
}

impl BuiltinCommand for Cd {
    fn name() -> &'static str {
        "cd"
    }

    fn execute(self, _out: &mut dyn Write, env: &mut Environment) -> Result<()> {
        let target = match self.args.into_iter().next() {
            Some(t) if !t.is_empty() => PathBuf::from(t),
            _ => match env.get_var("HOME") {
                Some(home) => PathBuf::from(home),
                None => return Err(anyhow::anyhow!("cd: no target and HOME not set")),
            },
        };

        env::set_current_dir(&target).with_context(|| format!("cd: {}", target.display()))?;
        debug!(dir = %target.display(), "changed directory");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::jobs::fake::FakeProcesses;
    use crate::process::{Pid, Termination};
    use std::env as stdenv;
    use std::fs;
    use std::sync::{Mutex, MutexGuard, OnceLock};

    fn lock_current_dir() -> MutexGuard<'static, ()> {
        static MUTEX: OnceLock<Mutex<()>> = OnceLock::new();
        MUTEX
            .get_or_init(|| Mutex::new(()))
            .lock()
            .unwrap_or_else(|e| e.into_inner())
    }

    fn env() -> Environment {
        Environment::with_processes(8, Box::new(FakeProcesses::default()))
    }

    fn run(env: &mut Environment, name: &str, args: &[&str]) -> String {
        let factories: Vec<Box<dyn CommandFactory>> = vec![
            Box::new(Factory::<Exit>::default()),
            Box::new(Factory::<Status>::default()),
            Box::new(Factory::<Cd>::default()),
        ];
        let cmd = factories
            .iter()
            .find_map(|f| f.try_create(name, args))
            .expect("builtin");
        let mut out = Vec::new();
        cmd.execute(&mut out, env).unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn test_factory_ignores_other_names() {
        assert!(Factory::<Cd>::default().try_create("ls", &[]).is_none());
        assert!(Factory::<Exit>::default().try_create("exit", &["now"]).is_some());
    }

    #[test]
    fn test_exit_and_status_ignore_flag_like_words() {
        let mut env = env();
        env.last_status = Termination::Exited(2);
        assert_eq!(run(&mut env, "status", &["-v"]), "exit value 2\n");
        assert_eq!(run(&mut env, "status", &["--help"]), "exit value 2\n");

        assert_eq!(run(&mut env, "exit", &["--help"]), "");
        assert!(env.should_exit);
    }

    #[test]
    fn test_status_reports_exit_value_and_signal() {
        let mut env = env();
        assert_eq!(run(&mut env, "status", &[]), "exit value 0\n");

        env.last_status = Termination::Exited(3);
        assert_eq!(run(&mut env, "status", &[]), "exit value 3\n");

        env.last_status = Termination::Signaled(9);
        assert_eq!(run(&mut env, "status", &["ignored"]), "terminated by signal 9\n");
    }

    #[test]
    fn test_exit_kills_jobs_and_sets_flag() {
        let procs = FakeProcesses::default();
        let killed = procs.killed.clone();
        let mut env = Environment::with_processes(8, Box::new(procs));
        env.jobs.push(Pid::from_raw(300)).unwrap();
        env.jobs.push(Pid::from_raw(301)).unwrap();

        run(&mut env, "exit", &["extra", "args"]);

        assert!(env.should_exit);
        assert!(env.jobs.is_empty());
        assert_eq!(killed.borrow().len(), 2);
    }

    #[test]
    fn test_cd_to_absolute_path() {
        let _lock = lock_current_dir();
        let temp = tempfile::tempdir().expect("failed to create temp dir");
        let canonical_temp = fs::canonicalize(temp.path()).expect("canonicalize failed");
        let orig = stdenv::current_dir().unwrap();

        let mut env = env();
        let target = canonical_temp.to_string_lossy().to_string();
        let out = run(&mut env, "cd", &[&target]);

        assert!(out.is_empty());
        let new_cwd = fs::canonicalize(stdenv::current_dir().unwrap()).unwrap();
        assert_eq!(new_cwd, canonical_temp);

        stdenv::set_current_dir(orig).expect("failed to restore cwd");
    }

    #[test]
    fn test_cd_ignores_extra_words() {
        let _lock = lock_current_dir();
        let temp = tempfile::tempdir().expect("failed to create temp dir");
        let canonical_temp = fs::canonicalize(temp.path()).expect("canonicalize failed");
        let orig = stdenv::current_dir().unwrap();

        let mut env = env();
        let target = canonical_temp.to_string_lossy().to_string();
        let out = run(&mut env, "cd", &[&target, "extra", "-x"]);

        assert!(out.is_empty(), "got {out:?}");
        let new_cwd = fs::canonicalize(stdenv::current_dir().unwrap()).unwrap();
        assert_eq!(new_cwd, canonical_temp);

        stdenv::set_current_dir(orig).expect("failed to restore cwd");
    }

    #[test]
    fn test_cd_to_home_when_none() {
        let _lock = lock_current_dir();
        let temp = tempfile::tempdir().expect("failed to create temp dir");
        let canonical_temp = fs::canonicalize(temp.path()).expect("canonicalize failed");
        let orig = stdenv::current_dir().unwrap();

        let mut env = env();
        env.set_var("HOME", canonical_temp.to_string_lossy().to_string());
        run(&mut env, "cd", &[]);

        let new_cwd = fs::canonicalize(stdenv::current_dir().unwrap()).unwrap();
        assert_eq!(new_cwd, canonical_temp);

        stdenv::set_current_dir(orig).expect("failed to restore cwd");
    }

    #[test]
    fn test_cd_nonexistent_path_reports_error() {
        let _lock = lock_current_dir();
        let orig = stdenv::current_dir().unwrap();

        let mut env = env();
        env.last_status = Termination::Exited(4);
        let name = format!("/nonexistent_dir_for_cd_test_{}", std::process::id());
        let out = run(&mut env, "cd", &[&name]);

        assert!(out.starts_with(&format!("cd: {name}")), "got {out:?}");
        assert_eq!(stdenv::current_dir().unwrap(), orig);
        assert_eq!(env.last_status, Termination::Exited(4));
    }
}
