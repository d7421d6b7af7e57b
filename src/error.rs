use thiserror::Error;

use crate::api::ApiError;

#[derive(Debug, Error)]
pub enum DocjobError {
    #[error("Config error: {0}")]
    Config(String),

    #[error("HTTP client error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
}

/// Failure to create a job from the user's references.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SubmissionError {
    /// No references left after trimming; nothing was sent.
    #[error("Please enter at least one reference.")]
    EmptyInput,

    #[error("Error: {0}")]
    Transport(String),

    #[error("Submission failed: {reason}")]
    Status { code: u16, reason: String },
}

impl From<ApiError> for SubmissionError {
    fn from(err: ApiError) -> Self {
        SubmissionError::Transport(err.to_string())
    }
}

/// Terminal failure of a polling run.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PollingError {
    #[error("Polling error: {0}")]
    Transport(String),

    #[error("Status check failed: {reason}")]
    Status { code: u16, reason: String },

    /// The attempt budget ran out while the service still reported 202.
    /// The job may finish later; only the client stopped watching.
    #[error("Job still in progress. Please check again later.")]
    StillPending,
}

impl PollingError {
    /// `true` for transport and status failures, `false` for the soft timeout.
    pub fn is_hard_failure(&self) -> bool {
        !matches!(self, PollingError::StillPending)
    }
}

impl From<ApiError> for PollingError {
    fn from(err: ApiError) -> Self {
        PollingError::Transport(err.to_string())
    }
}
