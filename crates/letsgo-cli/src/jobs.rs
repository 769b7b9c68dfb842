//! # Background Jobs
//!
//! `/bg` starts a shell command on its own task and returns at once. Output
//! collects in the job table until `/jobs` drains it; a finished job is
//! reported once and then forgotten.

use crate::shell::{exit_status, run_shell, ShellOutcome};
use parking_lot::Mutex;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

/// Wall-clock limit for a background job
pub const JOB_TIMEOUT: Duration = Duration::from_secs(300);

struct Job {
    command: String,
    pending: Vec<String>,
    outcome: Option<ShellOutcome>,
}

/// Something that happened in a job since the last poll
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobEvent {
    Output { id: u32, line: String },
    Finished { id: u32, outcome: ShellOutcome },
}

impl fmt::Display for JobEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            JobEvent::Output { id, line } => write!(f, "[{}] {}", id, line),
            JobEvent::Finished { id, outcome } => match outcome {
                outcome if outcome.is_success() => write!(f, "[{}] done", id),
                // Output was already reported line by line
                ShellOutcome::Failed { code, .. } => write!(f, "[{}] {}", id, exit_status(*code)),
                other => write!(f, "[{}] {}", id, other.describe()),
            },
        }
    }
}

/// Running and unreported background jobs, keyed by id
#[derive(Default)]
pub struct JobTable {
    last_id: AtomicU32,
    jobs: Mutex<BTreeMap<u32, Job>>,
}

impl JobTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start `command` in the background and return its job id
    pub fn spawn(self: &Arc<Self>, command: &str, limit: Duration) -> u32 {
        let id = self.last_id.fetch_add(1, Ordering::Relaxed) + 1;
        self.jobs.lock().insert(
            id,
            Job {
                command: command.to_string(),
                pending: Vec::new(),
                outcome: None,
            },
        );

        let table = Arc::clone(self);
        let command = command.to_string();
        tokio::spawn(async move {
            let sink = Arc::clone(&table);
            let mut collect = move |line: &str| sink.push_line(id, line);
            let outcome = run_shell(&command, limit, Some(&mut collect)).await;
            debug!("Job {} finished: {:?}", id, outcome);
            table.finish(id, outcome);
        });
        id
    }

    fn push_line(&self, id: u32, line: &str) {
        if let Some(job) = self.jobs.lock().get_mut(&id) {
            job.pending.push(line.to_string());
        }
    }

    fn finish(&self, id: u32, outcome: ShellOutcome) {
        if let Some(job) = self.jobs.lock().get_mut(&id) {
            job.outcome = Some(outcome);
        }
    }

    /// Drain new output in job order. Finished jobs are removed.
    pub fn poll(&self) -> Vec<JobEvent> {
        let mut jobs = self.jobs.lock();
        let mut events = Vec::new();
        let mut finished = Vec::new();

        for (&id, job) in jobs.iter_mut() {
            events.extend(
                job.pending
                    .drain(..)
                    .map(|line| JobEvent::Output { id, line }),
            );
            if let Some(outcome) = job.outcome.take() {
                events.push(JobEvent::Finished { id, outcome });
                finished.push(id);
            }
        }
        for id in finished {
            jobs.remove(&id);
        }
        events
    }

    /// Commands still running, with their ids
    pub fn running(&self) -> Vec<(u32, String)> {
        self.jobs
            .lock()
            .iter()
            .filter(|(_, job)| job.outcome.is_none())
            .map(|(&id, job)| (id, job.command.clone()))
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.jobs.lock().is_empty()
    }
}
