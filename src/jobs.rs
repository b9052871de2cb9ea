//! Bookkeeping for background children and the reaper that reports them.

use std::io::{self, Write};

use tracing::{debug, warn};

use crate::error::{Result, ShellError};
use crate::process::{Pid, ProcessControl};

/// Default number of background jobs tracked at once.
pub const DEFAULT_MAX_JOBS: usize = 256;

/// Unordered set of live background process ids with a fixed upper bound.
#[derive(Debug, Clone)]
pub struct JobTable {
    pids: Vec<Pid>,
    capacity: usize,
}

impl JobTable {
    pub fn new(capacity: usize) -> Self {
        Self {
            pids: Vec::new(),
            capacity,
        }
    }

    pub fn len(&self) -> usize {
        self.pids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pids.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn contains(&self, pid: Pid) -> bool {
        self.pids.contains(&pid)
    }

    pub fn pids(&self) -> &[Pid] {
        &self.pids
    }

    /// Fails when another job would exceed the capacity. Checked before
    /// spawning so a full table never leaves an untracked child behind.
    pub fn ensure_room(&self) -> Result<()> {
        if self.pids.len() >= self.capacity {
            return Err(ShellError::JobTableFull(self.capacity));
        }
        Ok(())
    }

    /// Start tracking `pid`.
    pub fn push(&mut self, pid: Pid) -> Result<()> {
        self.ensure_room()?;
        if self.contains(pid) {
            warn!(%pid, "pid already tracked");
            return Ok(());
        }
        self.pids.push(pid);
        Ok(())
    }

    /// Stop tracking `pid`, filling its slot with the last entry.
    pub fn remove(&mut self, pid: Pid) -> bool {
        match self.pids.iter().position(|&p| p == pid) {
            Some(idx) => {
                self.pids.swap_remove(idx);
                true
            }
            None => false,
        }
    }

    /// Forget every job, returning the pids that were tracked.
    pub fn drain(&mut self) -> Vec<Pid> {
        std::mem::take(&mut self.pids)
    }
}

/// Report and forget every background child that has finished.
///
/// Polls without blocking until no more children are ready, so a job that
/// is still running is left in the table untouched.
///
/// # Returns
/// The number of children collected.
pub fn reap(
    jobs: &mut JobTable,
    processes: &dyn ProcessControl,
    out: &mut dyn Write,
) -> io::Result<usize> {
    let mut reaped = 0;
    loop {
        let (pid, termination) = match processes.poll_any() {
            Ok(Some(done)) => done,
            Ok(None) => break,
            Err(e) => {
                warn!(error = %e, "polling for finished jobs failed");
                break;
            }
        };
        if !jobs.remove(pid) {
            debug!(%pid, "collected a child that was not a tracked job");
        }
        debug!(%pid, %termination, remaining = jobs.len(), "background job finished");
        writeln!(out, "background pid {pid} is done: {termination}")?;
        reaped += 1;
    }
    out.flush()?;
    Ok(reaped)
}

/// Forcefully terminate every tracked job and empty the table.
pub fn kill_all(jobs: &mut JobTable, processes: &dyn ProcessControl) {
    for pid in jobs.drain() {
        debug!(%pid, "killing background job");
        if let Err(e) = processes.kill(pid) {
            warn!(%pid, error = %e, "failed to kill background job");
        }
    }
}


#[cfg(test)]
mod tests {
    use super::fake::FakeProcesses;
    use super::*;
    use crate::process::Termination;

    fn pid(n: i32) -> Pid {
        Pid::from_raw(n)
    }

    #[test]
    fn test_push_and_swap_remove() {
        let mut jobs = JobTable::new(8);
        for n in [10, 11, 12, 13] {
            jobs.push(pid(n)).unwrap();
        }
        assert!(jobs.remove(pid(11)));
        assert_eq!(jobs.pids(), &[pid(10), pid(13), pid(12)]);
        assert!(!jobs.remove(pid(11)));
        assert_eq!(jobs.len(), 3);
    }

    #[test]
    fn test_capacity_is_enforced() {
        let mut jobs = JobTable::new(2);
        jobs.push(pid(1)).unwrap();
        jobs.push(pid(2)).unwrap();
        assert!(matches!(jobs.ensure_room(), Err(ShellError::JobTableFull(2))));
        assert!(matches!(jobs.push(pid(3)), Err(ShellError::JobTableFull(2))));
        assert_eq!(jobs.len(), 2);
    }

    #[test]
    fn test_duplicate_pid_is_tracked_once() {
        let mut jobs = JobTable::new(4);
        jobs.push(pid(5)).unwrap();
        jobs.push(pid(5)).unwrap();
        assert_eq!(jobs.len(), 1);
    }

    #[test]
    fn test_reap_reports_and_removes_finished_jobs() {
        let mut jobs = JobTable::new(8);
        for n in [100, 101, 102] {
            jobs.push(pid(n)).unwrap();
        }
        let procs = FakeProcesses::default();
        procs.finish(100, Termination::Exited(0));
        procs.finish(102, Termination::Signaled(15));

        let mut out = Vec::new();
        let reaped = reap(&mut jobs, &procs, &mut out).unwrap();

        assert_eq!(reaped, 2);
        assert_eq!(jobs.pids(), &[pid(101)]);
        let text = String::from_utf8(out).unwrap();
        assert_eq!(
            text,
            "background pid 100 is done: exit value 0\n\
             background pid 102 is done: terminated by signal 15\n"
        );
    }

    #[test]
    fn test_reap_with_nothing_finished_keeps_running_jobs() {
        let mut jobs = JobTable::new(8);
        jobs.push(pid(7)).unwrap();
        let procs = FakeProcesses::default();

        let mut out = Vec::new();
        assert_eq!(reap(&mut jobs, &procs, &mut out).unwrap(), 0);
        assert!(jobs.contains(pid(7)));
        assert!(out.is_empty());
    }

    #[test]
    fn test_kill_all_signals_every_job() {
        let mut jobs = JobTable::new(8);
        jobs.push(pid(20)).unwrap();
        jobs.push(pid(21)).unwrap();
        let procs = FakeProcesses::default();

        kill_all(&mut jobs, &procs);

        assert!(jobs.is_empty());
        assert_eq!(*procs.killed.borrow(), vec![pid(20), pid(21)]);
    }
}
