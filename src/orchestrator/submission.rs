use std::sync::Arc;

use tracing::{debug, warn};

use crate::api::{ApiError, CreateJobRequest, CreateJobResponse, JobService, ServiceReply};
use crate::error::SubmissionError;
use crate::state_machine::{JobId, ReferenceList};

/// Turns the user's raw input into exactly one job creation request.
pub struct SubmissionController<S> {
    service: Arc<S>,
}

impl<S: JobService> SubmissionController<S> {
    pub fn new(service: Arc<S>) -> Self {
        Self { service }
    }

    /// Normalize raw multi-line input. Fails with `EmptyInput` before any
    /// request is made.
    pub fn prepare(raw: &str) -> Result<ReferenceList, SubmissionError> {
        ReferenceList::parse(raw)
    }

    /// Issue the creation request for an already normalized list.
    pub async fn create(&self, links: &ReferenceList) -> Result<JobId, SubmissionError> {
        debug!(references = links.len(), "sending creation request");
        let reply = self.service.create_job(&CreateJobRequest::from(links)).await?;
        classify_creation(&reply)
    }

    /// Normalize and submit in one step.
    pub async fn submit(&self, raw: &str) -> Result<JobId, SubmissionError> {
        let links = Self::prepare(raw)?;
        self.create(&links).await
    }
}

/// Only an exact 200 carrying a non-blank `job_id` counts as an accepted
/// submission.
fn classify_creation(reply: &ServiceReply) -> Result<JobId, SubmissionError> {
    if reply.status != 200 {
        warn!(status = reply.status, reason = %reply.reason, "submission rejected");
        return Err(SubmissionError::Status {
            code: reply.status,
            reason: reply.reason.clone(),
        });
    }
    let body: CreateJobResponse = reply.json()?;
    if body.job_id.trim().is_empty() {
        warn!("creation reply carried a blank job_id");
        return Err(ApiError::Malformed("blank `job_id`".into()).into());
    }
    Ok(JobId::new(body.job_id))
}
