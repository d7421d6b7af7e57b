//! Tipos de erro para o cliente HTTP do serviço de processamento.
//!
//! Define [`ApiError`] para falhas de transporte e respostas malformadas.
//! Códigos de status HTTP não são erros aqui: a classificação de status
//! pertence ao orquestrador.

use thiserror::Error;

/// Erros que podem ocorrer ao falar com o serviço de processamento.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Falha de rede subjacente (DNS, conexão recusada, timeout, corpo ilegível).
    /// Encapsula o erro original do `reqwest` via `#[from]`.
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    /// O corpo da resposta não tem o formato esperado.
    #[error("malformed response: {0}")]
    Malformed(String),
}

impl From<serde_json::Error> for ApiError {
    fn from(err: serde_json::Error) -> Self {
        ApiError::Malformed(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn malformed_display() {
        let err = ApiError::Malformed("expected value at line 1 column 1".into());
        assert_eq!(
            err.to_string(),
            "malformed response: expected value at line 1 column 1"
        );
    }

    #[test]
    fn json_error_becomes_malformed() {
        let json_err = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        assert!(matches!(ApiError::from(json_err), ApiError::Malformed(_)));
    }

    #[test]
    fn error_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<ApiError>();
    }
}
