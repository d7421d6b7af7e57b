use std::sync::Arc;

use serde_json::Value;
use tokio::time::sleep;
use tracing::{debug, info, warn};

use super::slot::{RunToken, SlotError, StateSlot};
use crate::api::{ApiError, JobService, ServiceReply, StatusRequest};
use crate::error::PollingError;
use crate::state_machine::{Failure, JobId, OrchestrationState, PollSchedule, Transition};

/// How a single status reply moves the run along.
#[derive(Debug, Clone, PartialEq)]
enum Verdict {
    Pending,
    Done(Value),
    Failed(PollingError),
}

/// Terminal state reached by a polling run and how many checks it took.
#[derive(Debug, Clone, PartialEq)]
pub struct PollSummary {
    pub state: OrchestrationState,
    pub attempts: u32,
}

/// Checks a job's status on the capped two-tier schedule until the service
/// answers with a result, a failure, or the attempt budget runs out.
pub struct PollingEngine<S> {
    service: Arc<S>,
    schedule: PollSchedule,
}

impl<S: JobService> PollingEngine<S> {
    pub fn new(service: Arc<S>, schedule: PollSchedule) -> Self {
        Self { service, schedule }
    }

    pub fn schedule(&self) -> &PollSchedule {
        &self.schedule
    }

    /// Poll `job_id` on behalf of `run`, writing every step into `slot`.
    ///
    /// Returns `SlotError::Stale` as soon as another run has claimed the
    /// slot; no request is issued and no state is written after that.
    pub async fn run(
        &self,
        job_id: JobId,
        run: RunToken,
        slot: &StateSlot,
    ) -> Result<PollSummary, SlotError> {
        let request = StatusRequest::from(&job_id);
        let mut ordinal = 0;

        let terminal = loop {
            let Some(attempt) = self.schedule.attempt(ordinal) else {
                info!(job_id = %job_id, attempts = ordinal, "giving up, job still pending");
                break Transition::Fail(Failure::Polling(PollingError::StillPending));
            };

            if !attempt.delay.is_zero() {
                sleep(attempt.delay).await;
            }
            slot.apply(run, Transition::Poll(attempt))?;

            debug!(job_id = %job_id, attempt = attempt.ordinal, "checking job status");
            let reply = self.service.job_status(&request).await;
            if !slot.is_current(run) {
                warn!(job_id = %job_id, "discarding status reply from superseded run");
                return Err(SlotError::Stale(run));
            }

            match classify_status(reply) {
                Verdict::Pending => ordinal += 1,
                Verdict::Done(payload) => {
                    info!(job_id = %job_id, attempts = ordinal + 1, "job completed");
                    break Transition::Complete(payload);
                }
                Verdict::Failed(err) => {
                    warn!(job_id = %job_id, error = %err, "polling failed");
                    break Transition::Fail(Failure::Polling(err));
                }
            }
        };

        let attempts = match &terminal {
            Transition::Fail(Failure::Polling(PollingError::StillPending)) => ordinal,
            _ => ordinal + 1,
        };
        let state = slot.apply(run, terminal)?;
        Ok(PollSummary { state, attempts })
    }
}

fn classify_status(reply: Result<ServiceReply, ApiError>) -> Verdict {
    let reply = match reply {
        Ok(reply) => reply,
        Err(err) => return Verdict::Failed(err.into()),
    };

    match reply.status {
        200 if reply.body.trim().is_empty() => Verdict::Done(Value::Null),
        200 => match reply.json::<Value>() {
            Ok(payload) => Verdict::Done(payload),
            Err(err) => Verdict::Failed(err.into()),
        },
        202 => Verdict::Pending,
        code => Verdict::Failed(PollingError::Status {
            code,
            reason: reply.reason,
        }),
    }
}
