//! Drives a submission and its polling run against the shared state slot.

mod polling;
mod slot;
mod submission;

pub use polling::{PollSummary, PollingEngine};
pub use slot::{RunToken, SlotError, Snapshot, StateSlot};
pub use submission::SubmissionController;

use std::sync::{Arc, Mutex, MutexGuard};

use chrono::{DateTime, Utc};
use tokio::sync::{broadcast, watch};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use crate::api::JobService;
use crate::error::SubmissionError;
use crate::state_machine::{
    Failure, JobId, OrchestrationState, PollSchedule, RunOutcome, RunReport, RunStart, Transition,
};

/// Owns the orchestration state and at most one active run.
///
/// A new `submit`, `watch` or `reset` supersedes the previous run: its
/// scheduled checks are aborted and anything it still tries to write is
/// discarded by the run token check.
pub struct Orchestrator<S> {
    controller: SubmissionController<S>,
    engine: Arc<PollingEngine<S>>,
    slot: Arc<StateSlot>,
    active: Mutex<Option<(RunToken, JoinHandle<()>)>>,
    last_report: Arc<Mutex<Option<RunReport>>>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

impl<S: JobService + 'static> Orchestrator<S> {
    pub fn new(service: S, schedule: PollSchedule) -> Self {
        Self::from_shared(Arc::new(service), schedule)
    }

    /// Build around a service the caller keeps a handle to.
    pub fn from_shared(service: Arc<S>, schedule: PollSchedule) -> Self {
        Self {
            controller: SubmissionController::new(Arc::clone(&service)),
            engine: Arc::new(PollingEngine::new(service, schedule)),
            slot: Arc::new(StateSlot::new()),
            active: Mutex::new(None),
            last_report: Arc::new(Mutex::new(None)),
        }
    }

    /// Submit raw multi-line input as one job and start polling it.
    ///
    /// Blank input fails with `EmptyInput` without touching the current
    /// state or any run in progress.
    pub async fn submit(&self, raw: &str) -> Result<JobId, SubmissionError> {
        let links = SubmissionController::<S>::prepare(raw)?;
        let started_at = Utc::now();
        let run = self.slot.begin(RunStart::Submit);
        self.cancel_active();
        info!(run = %run, references = links.len(), "submitting job");

        let job_id = match self.controller.create(&links).await {
            Ok(job_id) => job_id,
            Err(err) => {
                warn!(run = %run, error = %err, "submission failed");
                let failure = Failure::Submission(err.clone());
                let outcome = RunOutcome::from(&failure);
                if let Err(slot_err) = self.slot.apply(run, Transition::Fail(failure)) {
                    debug!(run = %run, error = %slot_err, "submission failure not recorded");
                } else {
                    self.record(RunReport::new(
                        None,
                        Some(links.len()),
                        0,
                        outcome,
                        started_at,
                    ));
                }
                return Err(err);
            }
        };

        if let Err(err) = self.slot.apply(run, Transition::Accepted(job_id.clone())) {
            warn!(run = %run, job_id = %job_id, error = %err, "accepted job belongs to a superseded run, not polling");
            return Ok(job_id);
        }
        info!(run = %run, job_id = %job_id, "job submitted");
        self.spawn_polling(run, job_id.clone(), Some(links.len()), started_at);
        Ok(job_id)
    }

    /// Resume polling a job submitted earlier, e.g. after it timed out as
    /// still pending.
    pub fn watch(&self, job_id: JobId) -> RunToken {
        let run = self.slot.begin(RunStart::Resume(job_id.clone()));
        self.cancel_active();
        info!(run = %run, job_id = %job_id, "watching job");
        self.spawn_polling(run, job_id, None, Utc::now());
        run
    }

    /// Drop any run in progress and go back to idle.
    pub fn reset(&self) {
        let run = self.slot.begin(RunStart::Reset);
        self.cancel_active();
        debug!(run = %run, "orchestration reset");
    }

    pub fn state(&self) -> OrchestrationState {
        self.slot.snapshot().state
    }

    pub fn snapshot(&self) -> Snapshot {
        self.slot.snapshot()
    }

    /// Latest-value view of the state.
    pub fn subscribe(&self) -> watch::Receiver<Snapshot> {
        self.slot.subscribe()
    }

    /// Every state transition from now on, in order.
    pub fn transitions(&self) -> broadcast::Receiver<Snapshot> {
        self.slot.transitions()
    }

    /// Wait until the current run stops writing: a terminal state, or idle.
    /// Once this returns, `report` reflects the settled run.
    pub async fn settled(&self) -> Snapshot {
        let mut rx = self.slot.subscribe();
        let snapshot = match rx.wait_for(|snapshot| !snapshot.state.is_active()).await {
            Ok(snapshot) => snapshot.clone(),
            Err(_) => self.slot.snapshot(),
        };

        let finished = {
            let mut active = lock(&self.active);
            let owned_by_run = matches!(active.as_ref(), Some((run, _)) if *run == snapshot.run);
            if owned_by_run { active.take() } else { None }
        };
        if let Some((run, handle)) = finished {
            if let Err(err) = handle.await {
                debug!(run = %run, error = %err, "polling task ended abnormally");
            }
        }
        snapshot
    }

    /// Summary of the most recently finished run.
    pub fn report(&self) -> Option<RunReport> {
        lock(&self.last_report).clone()
    }

    fn record(&self, report: RunReport) {
        *lock(&self.last_report) = Some(report);
    }

    fn cancel_active(&self) {
        if let Some((_, handle)) = lock(&self.active).take() {
            handle.abort();
        }
    }

    fn spawn_polling(
        &self,
        run: RunToken,
        job_id: JobId,
        reference_count: Option<usize>,
        started_at: DateTime<Utc>,
    ) {
        let engine = Arc::clone(&self.engine);
        let slot = Arc::clone(&self.slot);
        let reports = Arc::clone(&self.last_report);

        let handle = tokio::spawn(async move {
            match engine.run(job_id.clone(), run, &slot).await {
                Ok(summary) => {
                    let outcome = summary
                        .state
                        .outcome()
                        .unwrap_or_else(|| RunOutcome::Failed(summary.state.to_string()));
                    *lock(&reports) = Some(RunReport::new(
                        Some(job_id),
                        reference_count,
                        summary.attempts,
                        outcome,
                        started_at,
                    ));
                }
                Err(SlotError::Stale(_)) => debug!(run = %run, "polling run superseded"),
                Err(SlotError::Invalid(err)) => error!(run = %run, error = %err, "polling run rejected"),
            }
        });

        let mut active = lock(&self.active);
        if self.slot.is_current(run) {
            if let Some((_, previous)) = active.replace((run, handle)) {
                previous.abort();
            }
        } else {
            handle.abort();
        }
    }
}

impl<S> Drop for Orchestrator<S> {
    fn drop(&mut self) {
        if let Some((_, handle)) = lock(&self.active).take() {
            handle.abort();
        }
    }
}
