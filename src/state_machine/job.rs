use std::fmt;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::state::RunOutcome;
use crate::error::SubmissionError;

/// Server-assigned identifier of a submitted job.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JobId(String);

impl JobId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for JobId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

/// Ordered, non-empty list of document references submitted as one job.
///
/// Duplicates are kept and order is preserved; the service may process
/// references in the order they are sent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ReferenceList(Vec<String>);

impl ReferenceList {
    /// Split raw multi-line input into trimmed, non-empty references.
    pub fn parse(raw: &str) -> Result<Self, SubmissionError> {
        let links: Vec<String> = raw
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(str::to_string)
            .collect();

        if links.is_empty() {
            return Err(SubmissionError::EmptyInput);
        }
        Ok(Self(links))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_slice(&self) -> &[String] {
        &self.0
    }
}

/// One status check within a job's run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollAttempt {
    /// 0-based ordinal within the run.
    pub ordinal: u32,
    /// Time waited before this attempt was issued.
    pub delay: Duration,
}

/// Fixed two-tier polling schedule.
///
/// Attempt 0 fires immediately, attempt 1 waits `first_retry_delay`, every
/// later attempt waits `retry_delay`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PollSchedule {
    pub max_attempts: u32,
    pub first_retry_delay: Duration,
    pub retry_delay: Duration,
}

impl Default for PollSchedule {
    fn default() -> Self {
        Self {
            max_attempts: 6,
            first_retry_delay: Duration::from_secs(6),
            retry_delay: Duration::from_secs(15),
        }
    }
}

impl PollSchedule {
    /// Delay preceding the given attempt ordinal.
    pub fn delay_before(&self, ordinal: u32) -> Duration {
        match ordinal {
            0 => Duration::ZERO,
            1 => self.first_retry_delay,
            _ => self.retry_delay,
        }
    }

    /// The attempt with this ordinal, or `None` once the budget is spent.
    pub fn attempt(&self, ordinal: u32) -> Option<PollAttempt> {
        (ordinal < self.max_attempts).then(|| PollAttempt {
            ordinal,
            delay: self.delay_before(ordinal),
        })
    }
}

/// Summary of one finished run, rendered by the front end on request.
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub job_id: Option<JobId>,
    pub reference_count: Option<usize>,
    pub poll_attempts: u32,
    pub outcome: RunOutcome,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub duration_ms: i64,
}

impl RunReport {
    pub fn new(
        job_id: Option<JobId>,
        reference_count: Option<usize>,
        poll_attempts: u32,
        outcome: RunOutcome,
        started_at: DateTime<Utc>,
    ) -> Self {
        let finished_at = Utc::now();
        Self {
            job_id,
            reference_count,
            poll_attempts,
            outcome,
            started_at,
            finished_at,
            duration_ms: (finished_at - started_at).num_milliseconds(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_trims_and_drops_blank_lines() {
        let list = ReferenceList::parse("  s3://a/1.pdf \n\n\t\ns3://a/2.pdf\r\n").unwrap();
        assert_eq!(list.as_slice(), ["s3://a/1.pdf", "s3://a/2.pdf"]);
    }

    #[test]
    fn parse_keeps_duplicates_in_order() {
        let list = ReferenceList::parse("b\na\nb").unwrap();
        assert_eq!(list.as_slice(), ["b", "a", "b"]);
        assert_eq!(list.len(), 3);
    }

    #[test]
    fn parse_rejects_whitespace_only_input() {
        assert_eq!(
            ReferenceList::parse("   \n\t\n\r\n"),
            Err(SubmissionError::EmptyInput)
        );
        assert_eq!(ReferenceList::parse(""), Err(SubmissionError::EmptyInput));
    }

    #[test]
    fn reference_list_serializes_as_array() {
        let list = ReferenceList::parse("x\ny").unwrap();
        assert_eq!(serde_json::to_string(&list).unwrap(), r#"["x","y"]"#);
    }

    #[test]
    fn schedule_is_two_tier() {
        let schedule = PollSchedule::default();
        assert_eq!(schedule.delay_before(0), Duration::ZERO);
        assert_eq!(schedule.delay_before(1), Duration::from_secs(6));
        for ordinal in 2..6 {
            assert_eq!(schedule.delay_before(ordinal), Duration::from_secs(15));
        }
    }

    #[test]
    fn schedule_caps_attempts() {
        let schedule = PollSchedule::default();
        assert_eq!(schedule.max_attempts, 6);
        assert!(schedule.attempt(5).is_some());
        assert!(schedule.attempt(6).is_none());
        assert_eq!(
            schedule.attempt(1),
            Some(PollAttempt {
                ordinal: 1,
                delay: Duration::from_secs(6)
            })
        );
    }

    #[test]
    fn job_id_serializes_transparently() {
        let id = JobId::from("J1");
        assert_eq!(serde_json::to_string(&id).unwrap(), r#""J1""#);
        assert_eq!(id.to_string(), "J1");
    }

    #[test]
    fn run_report_measures_duration() {
        let started = Utc::now() - chrono::Duration::milliseconds(250);
        let report = RunReport::new(Some("J1".into()), Some(2), 3, RunOutcome::Completed, started);
        assert!(report.duration_ms >= 250);
        assert_eq!(report.poll_attempts, 3);

        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["outcome"], "completed");
    }
}
