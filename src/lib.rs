//! Submit a batch of document references to a processing service as one job
//! and poll the job until it completes, fails, or stays pending past the
//! attempt budget.

pub mod api;
pub mod cli;
pub mod config;
pub mod error;
pub mod orchestrator;
pub mod state_machine;
pub mod ui;

pub use api::{JobApiClient, JobService};
pub use config::DocjobConfig;
pub use error::{DocjobError, PollingError, SubmissionError};
pub use orchestrator::{Orchestrator, Snapshot};
pub use state_machine::{
    Failure, JobId, OrchestrationState, PollSchedule, ReferenceList, RunOutcome, RunReport,
};
