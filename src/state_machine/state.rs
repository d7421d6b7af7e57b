use std::fmt;

use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

use super::job::{JobId, PollAttempt};
use crate::error::{PollingError, SubmissionError};

/// Why a run ended without a result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Failure {
    Submission(SubmissionError),
    Polling(PollingError),
}

impl fmt::Display for Failure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Failure::Submission(err) => write!(f, "{err}"),
            Failure::Polling(err) => write!(f, "{err}"),
        }
    }
}

impl Failure {
    /// A soft timeout: the job may still finish on the service side.
    pub fn is_still_pending(&self) -> bool {
        matches!(self, Failure::Polling(err) if !err.is_hard_failure())
    }
}

/// How a finished run ended, as recorded in its report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RunOutcome {
    Completed,
    StillPending,
    Failed(String),
}

impl From<&Failure> for RunOutcome {
    fn from(failure: &Failure) -> Self {
        if failure.is_still_pending() {
            RunOutcome::StillPending
        } else {
            RunOutcome::Failed(failure.to_string())
        }
    }
}

/// The single orchestration state observed by the front end.
///
/// A run flows through: SUBMITTING → SUBMITTED → POLLING(0..n) → COMPLETED | FAILED
#[derive(Debug, Clone, PartialEq)]
pub enum OrchestrationState {
    Idle,
    Submitting,
    Submitted(JobId),
    Polling { job_id: JobId, attempt: PollAttempt },
    Completed { job_id: JobId, payload: Value },
    Failed(Failure),
}

impl OrchestrationState {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            OrchestrationState::Completed { .. } | OrchestrationState::Failed(_)
        )
    }

    /// `true` while a run may still write to the state.
    pub fn is_active(&self) -> bool {
        matches!(
            self,
            OrchestrationState::Submitting
                | OrchestrationState::Submitted(_)
                | OrchestrationState::Polling { .. }
        )
    }

    /// The outcome a terminal state records; `None` while idle or active.
    pub fn outcome(&self) -> Option<RunOutcome> {
        match self {
            OrchestrationState::Completed { .. } => Some(RunOutcome::Completed),
            OrchestrationState::Failed(failure) => Some(RunOutcome::from(failure)),
            _ => None,
        }
    }

    pub fn job_id(&self) -> Option<&JobId> {
        match self {
            OrchestrationState::Submitted(job_id)
            | OrchestrationState::Polling { job_id, .. }
            | OrchestrationState::Completed { job_id, .. } => Some(job_id),
            _ => None,
        }
    }
}

impl fmt::Display for OrchestrationState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OrchestrationState::Idle => write!(f, "IDLE"),
            OrchestrationState::Submitting => write!(f, "SUBMITTING"),
            OrchestrationState::Submitted(job_id) => write!(f, "SUBMITTED({job_id})"),
            OrchestrationState::Polling { job_id, attempt } => {
                write!(f, "POLLING({job_id}, attempt {})", attempt.ordinal)
            }
            OrchestrationState::Completed { job_id, .. } => write!(f, "COMPLETED({job_id})"),
            OrchestrationState::Failed(failure) => write!(f, "FAILED({failure})"),
        }
    }
}

/// Events that begin a new run, superseding whatever run came before.
/// Legal from any state.
#[derive(Debug, Clone, PartialEq)]
pub enum RunStart {
    Submit,
    /// Resume polling a known job without re-submitting.
    Resume(JobId),
    Reset,
}

/// Events that move the orchestration state within a run.
#[derive(Debug, Clone, PartialEq)]
pub enum Transition {
    /// The service accepted the submission.
    Accepted(JobId),
    /// A status check is about to be issued.
    Poll(PollAttempt),
    /// The service returned the job's result.
    Complete(Value),
    Fail(Failure),
}

#[derive(Debug, Clone, PartialEq, Error)]
#[error("illegal transition {event} from {from}")]
pub struct InvalidTransition {
    pub from: String,
    pub event: String,
}

/// Computes the state that follows an event, rejecting moves the
/// orchestration never makes.
pub struct StateMachine;

impl StateMachine {
    pub fn start(start: RunStart) -> OrchestrationState {
        match start {
            RunStart::Submit => OrchestrationState::Submitting,
            RunStart::Resume(job_id) => OrchestrationState::Submitted(job_id),
            RunStart::Reset => OrchestrationState::Idle,
        }
    }

    pub fn next(
        state: &OrchestrationState,
        event: Transition,
    ) -> Result<OrchestrationState, InvalidTransition> {
        use OrchestrationState as S;

        let next = match (state, event) {
            (S::Submitting, Transition::Accepted(job_id)) => S::Submitted(job_id),
            (S::Submitting, Transition::Fail(failure @ Failure::Submission(_))) => {
                S::Failed(failure)
            }

            (S::Submitted(job_id), Transition::Poll(attempt)) if attempt.ordinal == 0 => {
                S::Polling {
                    job_id: job_id.clone(),
                    attempt,
                }
            }
            (S::Polling { job_id, attempt: prev }, Transition::Poll(attempt))
                if attempt.ordinal == prev.ordinal + 1 =>
            {
                S::Polling {
                    job_id: job_id.clone(),
                    attempt,
                }
            }
            (S::Polling { job_id, .. }, Transition::Complete(payload)) => S::Completed {
                job_id: job_id.clone(),
                payload,
            },
            (S::Polling { .. }, Transition::Fail(failure @ Failure::Polling(_))) => {
                S::Failed(failure)
            }

            (from, event) => {
                return Err(InvalidTransition {
                    from: from.to_string(),
                    event: format!("{event:?}"),
                });
            }
        };

        Ok(next)
    }
}
