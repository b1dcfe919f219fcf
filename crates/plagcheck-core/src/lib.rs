use std::time::Duration;

use serde::Serialize;

pub mod backend;
pub mod config_file;
pub mod dispatch;
pub mod llm;
pub mod orchestrator;
pub mod remote;
pub mod rephrase;
pub mod summary;

// Re-export for convenience
pub use backend::{BackendError, PdfBackend};
pub use config_file::{ConfigError, ConfigFile, load_config};
pub use dispatch::dispatch;
pub use llm::{ChatModel, ChatRequest, LlmError, LlmSettings, OpenAiChat};
pub use orchestrator::{
    CheckError, CheckInput, CheckReport, Orchestrator, RephraseReport, UploadedFile,
};
pub use remote::{CallError, HttpCaller, Payload, ServiceCaller};
pub use rephrase::{RephraseOutcome, rephrase};
pub use summary::{fallback_summary, summarize};

/// Endpoint value that routes a rephrasing service through the language model
/// instead of an outbound HTTP call.
pub const INTERNAL_LLM_ENDPOINT: &str = "internal-llm";

/// Older configs spell the internal-LLM endpoint as `"openai"`.
const LEGACY_LLM_ENDPOINT: &str = "openai";

/// Per-call timeout applied to every remote service.
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// The category a remote service belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ServiceType {
    Plagiarism,
    AiDetection,
    Rephrasing,
}

impl ServiceType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ServiceType::Plagiarism => "plagiarism",
            ServiceType::AiDetection => "ai_detection",
            ServiceType::Rephrasing => "rephrasing",
        }
    }
}

impl std::fmt::Display for ServiceType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One configured external service.
#[derive(Clone, PartialEq, Eq)]
pub struct ServiceConfig {
    pub name: String,
    pub service_type: ServiceType,
    /// HTTP endpoint, or [`INTERNAL_LLM_ENDPOINT`].
    pub endpoint: String,
    pub credential: String,
    pub enabled: bool,
}

impl ServiceConfig {
    /// Create an enabled service.
    pub fn new(
        name: impl Into<String>,
        service_type: ServiceType,
        endpoint: impl Into<String>,
        credential: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            service_type,
            endpoint: endpoint.into(),
            credential: credential.into(),
            enabled: true,
        }
    }

    /// Whether this service is answered by the language model rather than HTTP.
    pub fn is_internal_llm(&self) -> bool {
        self.endpoint == INTERNAL_LLM_ENDPOINT || self.endpoint == LEGACY_LLM_ENDPOINT
    }
}

impl std::fmt::Debug for ServiceConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServiceConfig")
            .field("name", &self.name)
            .field("service_type", &self.service_type)
            .field("endpoint", &self.endpoint)
            .field(
                "credential",
                &if self.credential.is_empty() { "" } else { "***" },
            )
            .field("enabled", &self.enabled)
            .finish()
    }
}

/// Outcome of a single remote-service invocation.
///
/// Built only through [`ServiceResult::succeeded`] and [`ServiceResult::failed`]:
/// a success never carries an error, and a failure always carries a non-empty
/// error and an empty payload.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ServiceResult {
    service_name: String,
    service_type: ServiceType,
    success: bool,
    #[serde(rename = "result")]
    payload: Payload,
    error: Option<String>,
}

impl ServiceResult {
    pub fn succeeded(
        service_name: impl Into<String>,
        service_type: ServiceType,
        payload: Payload,
    ) -> Self {
        Self {
            service_name: service_name.into(),
            service_type,
            success: true,
            payload,
            error: None,
        }
    }

    pub fn failed(
        service_name: impl Into<String>,
        service_type: ServiceType,
        error: impl Into<String>,
    ) -> Self {
        let mut error = error.into();
        if error.trim().is_empty() {
            error = "unknown error".to_string();
        }
        Self {
            service_name: service_name.into(),
            service_type,
            success: false,
            payload: Payload::new(),
            error: Some(error),
        }
    }

    pub fn service_name(&self) -> &str {
        &self.service_name
    }

    pub fn service_type(&self) -> ServiceType {
        self.service_type
    }

    pub fn is_success(&self) -> bool {
        self.success
    }

    pub fn payload(&self) -> &Payload {
        &self.payload
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }
}

/// Immutable per-request view of the configuration.
///
/// Service lists hold enabled entries only, in configuration order.
#[derive(Debug, Clone)]
pub struct Settings {
    pub plagiarism: Vec<ServiceConfig>,
    pub ai_detection: Vec<ServiceConfig>,
    pub rephrasing: Vec<ServiceConfig>,
    pub llm: LlmSettings,
    pub request_timeout: Duration,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            plagiarism: vec![],
            ai_detection: vec![],
            rephrasing: vec![],
            llm: LlmSettings::default(),
            request_timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }
}
