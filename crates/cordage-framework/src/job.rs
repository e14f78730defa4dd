//! Named background jobs.
//!
//! A job is an async closure run on a [`JobSchedule`]. Each job owns a child
//! [`CancellationToken`] of the scheduler's root token, so a single job can be
//! cancelled by key and every job at once on shutdown.
//!
//! ```rust,ignore
//! client.jobs().schedule("presence", JobSchedule::Interval(Duration::from_secs(300)), || async {
//!     refresh_presence().await
//! })?;
//! ```

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use chrono::{DateTime, Utc};
use futures::FutureExt;
use futures::future::BoxFuture;
use parking_lot::Mutex;
use tokio::task::JoinHandle;
use tokio::time::{self, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{Instrument, debug, debug_span, error, info};

use crate::error::JobError;
use crate::handler::HandlerResult;

/// When a job runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobSchedule {
    /// Every period, first run one period after scheduling.
    Interval(Duration),
    /// Once, at the given time. A time in the past runs immediately.
    At(DateTime<Utc>),
}

type JobFn = Arc<dyn Fn() -> BoxFuture<'static, HandlerResult> + Send + Sync>;

struct JobHandle {
    id: u64,
    schedule: JobSchedule,
    token: CancellationToken,
    task: JoinHandle<()>,
}

type JobMap = Arc<Mutex<HashMap<String, JobHandle>>>;

/// Keyed job registry.
pub struct JobScheduler {
    jobs: JobMap,
    root: CancellationToken,
    next_id: AtomicU64,
}

impl JobScheduler {
    pub fn new() -> Self {
        Self {
            jobs: Arc::new(Mutex::new(HashMap::new())),
            root: CancellationToken::new(),
            next_id: AtomicU64::new(0),
        }
    }

    /// Schedules `job` under `key`, cancelling any job already there.
    ///
    /// Must be called from within a tokio runtime.
    pub fn schedule<F, Fut>(&self, key: impl Into<String>, schedule: JobSchedule, job: F) -> Result<(), JobError>
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = HandlerResult> + Send + 'static,
    {
        let key = key.into();
        if schedule == JobSchedule::Interval(Duration::ZERO) {
            return Err(JobError::ZeroInterval(key));
        }

        let job: JobFn = Arc::new(move || job().boxed());
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let token = self.root.child_token();
        let span = debug_span!("job", key = %key);
        let task = match schedule {
            JobSchedule::Interval(period) => {
                tokio::spawn(run_interval(period, job, token.clone()).instrument(span))
            }
            JobSchedule::At(at) => tokio::spawn(
                run_once(at, job, token.clone(), self.jobs.clone(), key.clone(), id).instrument(span),
            ),
        };

        let handle = JobHandle {
            id,
            schedule,
            token,
            task,
        };
        if let Some(previous) = self.jobs.lock().insert(key.clone(), handle) {
            previous.token.cancel();
            debug!(key = %key, "Replaced existing job");
        }
        info!(key = %key, schedule = ?schedule, "Job scheduled");
        Ok(())
    }

    /// Cancels the job under `key`.
    pub fn cancel(&self, key: &str) -> bool {
        match self.jobs.lock().remove(key) {
            Some(handle) => {
                handle.token.cancel();
                debug!(key, "Job cancelled");
                true
            }
            None => false,
        }
    }

    /// The schedule of a pending job.
    pub fn get(&self, key: &str) -> Option<JobSchedule> {
        self.jobs.lock().get(key).map(|handle| handle.schedule)
    }

    pub fn keys(&self) -> Vec<String> {
        self.jobs.lock().keys().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.jobs.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.jobs.lock().is_empty()
    }

    /// Cancels every job. The scheduler stays usable for new jobs.
    pub fn cancel_all(&self) {
        let drained: Vec<_> = self.jobs.lock().drain().collect();
        for (_, handle) in &drained {
            handle.token.cancel();
        }
        if !drained.is_empty() {
            info!(count = drained.len(), "All jobs cancelled");
        }
    }
}

impl Default for JobScheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for JobScheduler {
    fn drop(&mut self) {
        self.root.cancel();
        for handle in self.jobs.lock().values() {
            handle.task.abort();
        }
    }
}

async fn run_interval(period: Duration, job: JobFn, token: CancellationToken) {
    let mut ticker = time::interval_at(Instant::now() + period, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    loop {
        tokio::select! {
            () = token.cancelled() => break,
            _ = ticker.tick() => {
                if let Err(e) = job().await {
                    error!(error = %e, "Job failed");
                }
            }
        }
    }
}

async fn run_once(
    at: DateTime<Utc>,
    job: JobFn,
    token: CancellationToken,
    jobs: JobMap,
    key: String,
    id: u64,
) {
    let delay = (at - Utc::now()).to_std().unwrap_or(Duration::ZERO);
    tokio::select! {
        () = token.cancelled() => return,
        () = time::sleep(delay) => {}
    }
    if let Err(e) = job().await {
        error!(error = %e, "Job failed");
    }

    let mut jobs = jobs.lock();
    if jobs.get(&key).is_some_and(|handle| handle.id == id) {
        jobs.remove(&key);
    }
}
