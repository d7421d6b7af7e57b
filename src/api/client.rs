use std::future::Future;
use std::time::Duration;

use reqwest::{Client, Response};

use super::error::ApiError;
use super::types::{CreateJobRequest, ServiceReply, StatusRequest};

const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// The two calls the orchestrator makes against the processing service.
///
/// Implementations report the raw status and body; deciding what a status
/// means is left to the caller.
pub trait JobService: Send + Sync {
    fn create_job(
        &self,
        req: &CreateJobRequest,
    ) -> impl Future<Output = Result<ServiceReply, ApiError>> + Send;

    fn job_status(
        &self,
        req: &StatusRequest,
    ) -> impl Future<Output = Result<ServiceReply, ApiError>> + Send;
}

pub struct JobApiClient {
    client: Client,
    submit_url: String,
    status_url: String,
}

impl JobApiClient {
    pub fn new(submit_url: String, status_url: String) -> reqwest::Result<Self> {
        Self::with_timeouts(submit_url, status_url, DEFAULT_CONNECT_TIMEOUT, None)
    }

    /// Build a client with explicit transport timeouts. `request_timeout` of
    /// `None` leaves reqwest's default (no overall deadline).
    pub fn with_timeouts(
        submit_url: String,
        status_url: String,
        connect_timeout: Duration,
        request_timeout: Option<Duration>,
    ) -> reqwest::Result<Self> {
        let mut builder = Client::builder().connect_timeout(connect_timeout);
        if let Some(timeout) = request_timeout {
            builder = builder.timeout(timeout);
        }
        Ok(Self {
            client: builder.build()?,
            submit_url,
            status_url,
        })
    }

    async fn read_reply(response: Response) -> Result<ServiceReply, ApiError> {
        let status = response.status();
        let reason = status.canonical_reason().unwrap_or("Unknown Status");
        let body = response.text().await?;
        Ok(ServiceReply::new(status.as_u16(), reason, body))
    }
}

impl JobService for JobApiClient {
    async fn create_job(&self, req: &CreateJobRequest) -> Result<ServiceReply, ApiError> {
        let response = self
            .client
            .post(&self.submit_url)
            .header("content-type", "application/json")
            .json(req)
            .send()
            .await?;
        Self::read_reply(response).await
    }

    async fn job_status(&self, req: &StatusRequest) -> Result<ServiceReply, ApiError> {
        let response = self
            .client
            .post(&self.status_url)
            .header("content-type", "application/json")
            .json(req)
            .send()
            .await?;
        Self::read_reply(response).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    async fn client_for(server: &MockServer) -> JobApiClient {
        JobApiClient::new(
            format!("{}/submit", server.uri()),
            format!("{}/status", server.uri()),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn create_job_posts_links_as_json() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/submit"))
            .and(header("content-type", "application/json"))
            .and(body_json(serde_json::json!({"links": ["a", "b"]})))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"job_id": "J1"})))
            .expect(1)
            .mount(&server)
            .await;

        let client = client_for(&server).await;
        let reply = client
            .create_job(&CreateJobRequest {
                links: vec!["a".into(), "b".into()],
            })
            .await
            .unwrap();

        assert_eq!(reply.status, 200);
        assert_eq!(reply.reason, "OK");
        assert_eq!(reply.json::<serde_json::Value>().unwrap()["job_id"], "J1");
    }

    #[tokio::test]
    async fn job_status_reports_status_and_reason() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/status"))
            .and(body_json(serde_json::json!({"job_id": "J1"})))
            .respond_with(ResponseTemplate::new(202))
            .mount(&server)
            .await;

        let client = client_for(&server).await;
        let reply = client
            .job_status(&StatusRequest {
                job_id: "J1".into(),
            })
            .await
            .unwrap();

        assert_eq!(reply.status, 202);
        assert_eq!(reply.reason, "Accepted");
        assert!(reply.body.is_empty());
    }

    #[tokio::test]
    async fn server_errors_are_replies_not_errors() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
            .mount(&server)
            .await;

        let client = client_for(&server).await;
        let reply = client
            .job_status(&StatusRequest {
                job_id: "J1".into(),
            })
            .await
            .unwrap();

        assert_eq!(reply.status, 500);
        assert_eq!(reply.reason, "Internal Server Error");
        assert_eq!(reply.body, "boom");
    }

    #[tokio::test]
    async fn unreachable_service_is_network_error() {
        // Port 9 (discard) on localhost is not expected to accept connections.
        let client = JobApiClient::new(
            "http://127.0.0.1:9/submit".into(),
            "http://127.0.0.1:9/status".into(),
        )
        .unwrap();
        let err = client
            .create_job(&CreateJobRequest {
                links: vec!["a".into()],
            })
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::Network(_)));
    }
}
