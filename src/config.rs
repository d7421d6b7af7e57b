//! Configuração do docjob carregada a partir de `docjob.toml`.
//!
//! A struct [`DocjobConfig`] contém os endpoints do serviço e o cronograma de
//! consultas. Valores não presentes no arquivo usam defaults sensíveis.
//! As variáveis de ambiente `DOCJOB_SUBMIT_URL` e `DOCJOB_STATUS_URL` têm
//! precedência sobre o arquivo.

use std::path::Path;
use std::time::Duration;

use serde::Deserialize;

use crate::api::JobApiClient;
use crate::error::DocjobError;
use crate::state_machine::PollSchedule;

pub const DEFAULT_CONFIG_FILE: &str = "docjob.toml";
pub const SUBMIT_URL_ENV: &str = "DOCJOB_SUBMIT_URL";
pub const STATUS_URL_ENV: &str = "DOCJOB_STATUS_URL";

/// Configuração de nível superior carregada de `docjob.toml`.
#[derive(Debug, Clone, Deserialize)]
pub struct DocjobConfig {
    /// Endpoint que cria o job a partir da lista de referências.
    #[serde(default)]
    pub submit_url: String,

    /// Endpoint consultado para saber o status do job.
    #[serde(default)]
    pub status_url: String,

    /// Tempo máximo para estabelecer a conexão, em segundos.
    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,

    /// Tempo máximo de cada requisição, em segundos. Ausente: sem limite.
    #[serde(default)]
    pub request_timeout_secs: Option<u64>,

    /// Cronograma de consultas de status.
    #[serde(default)]
    pub poll: PollConfig,
}

/// Tabela `[poll]`: limite de tentativas e os dois intervalos de espera.
#[derive(Debug, Clone, Deserialize)]
pub struct PollConfig {
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Espera antes da segunda consulta.
    #[serde(default = "default_first_retry_delay_secs")]
    pub first_retry_delay_secs: u64,

    /// Espera antes de cada consulta seguinte.
    #[serde(default = "default_retry_delay_secs")]
    pub retry_delay_secs: u64,
}

// Valor padrão do timeout de conexão: 10s.
fn default_connect_timeout_secs() -> u64 {
    10
}

// Valor padrão de tentativas: 6.
fn default_max_attempts() -> u32 {
    6
}

fn default_first_retry_delay_secs() -> u64 {
    6
}

fn default_retry_delay_secs() -> u64 {
    15
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            first_retry_delay_secs: default_first_retry_delay_secs(),
            retry_delay_secs: default_retry_delay_secs(),
        }
    }
}

impl From<&PollConfig> for PollSchedule {
    fn from(poll: &PollConfig) -> Self {
        Self {
            max_attempts: poll.max_attempts,
            first_retry_delay: Duration::from_secs(poll.first_retry_delay_secs),
            retry_delay: Duration::from_secs(poll.retry_delay_secs),
        }
    }
}

impl Default for DocjobConfig {
    fn default() -> Self {
        Self {
            submit_url: String::new(),
            status_url: String::new(),
            connect_timeout_secs: default_connect_timeout_secs(),
            request_timeout_secs: None,
            poll: PollConfig::default(),
        }
    }
}

impl DocjobConfig {
    /// Carrega a configuração de `docjob.toml` no diretório atual.
    pub fn load() -> Result<Self, DocjobError> {
        Self::load_from(Path::new(DEFAULT_CONFIG_FILE))
    }

    /// Carrega a configuração do caminho indicado.
    /// Usa valores padrão se o arquivo não existir. Falhas de leitura e de
    /// TOML inválido chegam como [`DocjobError::Io`] e [`DocjobError::Toml`].
    pub fn load_from(path: &Path) -> Result<Self, DocjobError> {
        let mut config = if path.exists() {
            let contents = std::fs::read_to_string(path)?;
            toml::from_str::<DocjobConfig>(&contents)?
        } else {
            Self::default()
        };

        // Variáveis de ambiente têm precedência sobre o arquivo de configuração.
        config.apply_env(
            std::env::var(SUBMIT_URL_ENV).ok(),
            std::env::var(STATUS_URL_ENV).ok(),
        );
        config.validate()?;
        Ok(config)
    }

    fn apply_env(&mut self, submit_url: Option<String>, status_url: Option<String>) {
        if let Some(url) = submit_url.filter(|url| !url.trim().is_empty()) {
            self.submit_url = url;
        }
        if let Some(url) = status_url.filter(|url| !url.trim().is_empty()) {
            self.status_url = url;
        }
    }

    /// Endpoints ausentes e um limite de zero tentativas são erros de configuração.
    pub fn validate(&self) -> Result<(), DocjobError> {
        if self.submit_url.trim().is_empty() {
            return Err(DocjobError::Config(format!(
                "submit_url is not set (use {DEFAULT_CONFIG_FILE} or {SUBMIT_URL_ENV})"
            )));
        }
        if self.status_url.trim().is_empty() {
            return Err(DocjobError::Config(format!(
                "status_url is not set (use {DEFAULT_CONFIG_FILE} or {STATUS_URL_ENV})"
            )));
        }
        if self.poll.max_attempts == 0 {
            return Err(DocjobError::Config("poll.max_attempts must be at least 1".into()));
        }
        Ok(())
    }

    pub fn schedule(&self) -> PollSchedule {
        PollSchedule::from(&self.poll)
    }

    /// Constrói o cliente HTTP com os endpoints e timeouts configurados.
    pub fn client(&self) -> Result<JobApiClient, DocjobError> {
        let client = JobApiClient::with_timeouts(
            self.submit_url.clone(),
            self.status_url.clone(),
            Duration::from_secs(self.connect_timeout_secs),
            self.request_timeout_secs.map(Duration::from_secs),
        )?;
        Ok(client)
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    fn configured() -> DocjobConfig {
        DocjobConfig {
            submit_url: "http://localhost/submit".into(),
            status_url: "http://localhost/status".into(),
            ..Default::default()
        }
    }

    #[test]
    fn default_config_values() {
        let config = DocjobConfig::default();
        assert!(config.submit_url.is_empty());
        assert!(config.status_url.is_empty());
        assert_eq!(config.connect_timeout_secs, 10);
        assert_eq!(config.request_timeout_secs, None);
        assert_eq!(config.schedule(), PollSchedule::default());
    }

    #[test]
    fn deserialize_partial_toml() {
        let toml_str = r#"
            submit_url = "https://api.example.com/submit"
            status_url = "https://api.example.com/status"

            [poll]
            retry_delay_secs = 30
        "#;
        let config: DocjobConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.submit_url, "https://api.example.com/submit");
        assert_eq!(config.poll.retry_delay_secs, 30);
        assert_eq!(config.poll.first_retry_delay_secs, 6);
        assert_eq!(config.poll.max_attempts, 6);
        assert_eq!(config.schedule().retry_delay, Duration::from_secs(30));
    }

    #[test]
    fn env_overrides_file_values() {
        let mut config = configured();
        config.apply_env(Some("http://env/submit".into()), Some("  ".into()));
        assert_eq!(config.submit_url, "http://env/submit");
        assert_eq!(config.status_url, "http://localhost/status");
    }

    #[test]
    fn missing_endpoints_are_rejected() {
        let mut config = configured();
        config.status_url.clear();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("status_url"));

        assert!(DocjobConfig::default().validate().is_err());
    }

    #[test]
    fn zero_attempts_are_rejected() {
        let mut config = configured();
        config.poll.max_attempts = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn load_from_file() {
        // The env vars are not expected to be set in the test environment.
        if std::env::var(SUBMIT_URL_ENV).is_ok() || std::env::var(STATUS_URL_ENV).is_ok() {
            return;
        }
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "submit_url = \"http://files/submit\"\nstatus_url = \"http://files/status\"\nrequest_timeout_secs = 30"
        )
        .unwrap();

        let config = DocjobConfig::load_from(file.path()).unwrap();
        assert_eq!(config.submit_url, "http://files/submit");
        assert_eq!(config.request_timeout_secs, Some(30));
        assert!(config.client().is_ok());
    }

    #[test]
    fn load_without_file_needs_endpoints() {
        if std::env::var(SUBMIT_URL_ENV).is_ok() || std::env::var(STATUS_URL_ENV).is_ok() {
            return;
        }
        let dir = tempfile::tempdir().unwrap();
        let result = DocjobConfig::load_from(&dir.path().join("missing.toml"));
        assert!(matches!(result, Err(DocjobError::Config(_))));
    }

    #[test]
    fn invalid_toml_is_a_toml_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "submit_url = \"http://files/submit\"\n[poll\nmax_attempts = 3").unwrap();

        let err = DocjobConfig::load_from(file.path()).unwrap_err();
        assert!(matches!(err, DocjobError::Toml(_)));
        assert!(err.to_string().starts_with("TOML parse error"));
    }

    #[test]
    fn unreadable_config_is_an_io_error() {
        // The path exists but is a directory, so reading it fails.
        let dir = tempfile::tempdir().unwrap();
        let err = DocjobConfig::load_from(dir.path()).unwrap_err();
        assert!(matches!(err, DocjobError::Io(_)));
    }
}
