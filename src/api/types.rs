//! Tipos de dados para as requisições e respostas do serviço de processamento.
//!
//! O contrato tem duas fases: criação do job (`{"links": [...]}` → `{"job_id": ...}`)
//! e consulta de status (`{"job_id": ...}` → 200 com o resultado, 202 enquanto processa).

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use super::error::ApiError;
use crate::state_machine::{JobId, ReferenceList};

/// Corpo da requisição de criação de job.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateJobRequest {
    /// Referências dos documentos, na ordem digitada pelo usuário.
    pub links: Vec<String>,
}

impl From<&ReferenceList> for CreateJobRequest {
    fn from(list: &ReferenceList) -> Self {
        Self {
            links: list.as_slice().to_vec(),
        }
    }
}

/// Resposta de sucesso (HTTP 200) do endpoint de criação.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateJobResponse {
    /// Identificador opaco atribuído pelo serviço.
    pub job_id: String,
}

/// Corpo da requisição de consulta de status.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusRequest {
    pub job_id: String,
}

impl From<&JobId> for StatusRequest {
    fn from(id: &JobId) -> Self {
        Self {
            job_id: id.as_str().to_string(),
        }
    }
}

/// Resposta HTTP bruta: status, texto do status e corpo ainda não interpretado.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceReply {
    pub status: u16,
    /// Texto canônico do status (ex.: "Accepted", "Internal Server Error").
    pub reason: String,
    pub body: String,
}

impl ServiceReply {
    pub fn new(status: u16, reason: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            status,
            reason: reason.into(),
            body: body.into(),
        }
    }

    /// Interpreta o corpo como JSON.
    pub fn json<T: DeserializeOwned>(&self) -> Result<T, ApiError> {
        Ok(serde_json::from_str(&self.body)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_request_uses_links_field() {
        let list = ReferenceList::parse("s3://b/1.pdf\ns3://b/2.pdf").unwrap();
        let json = serde_json::to_value(CreateJobRequest::from(&list)).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"links": ["s3://b/1.pdf", "s3://b/2.pdf"]})
        );
    }

    #[test]
    fn status_request_uses_job_id_field() {
        let json = serde_json::to_string(&StatusRequest::from(&JobId::from("J1"))).unwrap();
        assert_eq!(json, r#"{"job_id":"J1"}"#);
    }

    #[test]
    fn create_response_ignores_extra_fields() {
        let reply = ServiceReply::new(200, "OK", r#"{"job_id":"J9","queued":true}"#);
        let parsed: CreateJobResponse = reply.json().unwrap();
        assert_eq!(parsed.job_id, "J9");
    }

    #[test]
    fn create_response_without_job_id_is_malformed() {
        let reply = ServiceReply::new(200, "OK", r#"{"id":"J9"}"#);
        let err = reply.json::<CreateJobResponse>().unwrap_err();
        assert!(matches!(err, ApiError::Malformed(msg) if msg.contains("job_id")));
    }
}
