pub mod client;
pub mod error;
pub mod types;

pub use client::{JobApiClient, JobService};
pub use error::ApiError;
pub use types::{CreateJobRequest, CreateJobResponse, ServiceReply, StatusRequest};
