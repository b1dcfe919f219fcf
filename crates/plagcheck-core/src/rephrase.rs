//! Ordered fallback across rephrasing providers.

use std::panic::AssertUnwindSafe;
use std::time::{Duration, Instant};

use futures_util::FutureExt;
use serde_json::Value;

use crate::dispatch::{PANICKED, call_service};
use crate::llm::{ChatModel, ChatRequest, LlmError, LlmSettings};
use crate::remote::{CallError, Payload, ServiceCaller};
use crate::{ServiceConfig, ServiceResult, ServiceType};

pub const NO_REPHRASERS: &str = "no rephrasing services enabled";

const REPHRASE_SYSTEM_PROMPT: &str = "You are a professional editor. Rephrase the following text \
to make it more original while preserving its meaning. Make it sound natural and human-written. \
Do not add any explanations, just provide the rephrased text.";
const REPHRASE_TEMPERATURE: f64 = 0.7;

/// Result of running the rephrasing fallback chain.
#[derive(Debug, Clone)]
pub struct RephraseOutcome {
    /// Rephrased text; empty when every provider failed.
    pub text: String,
    /// Result of the provider that succeeded, or of the last one attempted.
    pub result: ServiceResult,
    /// Every attempt in the order it was made.
    pub attempts: Vec<ServiceResult>,
}

impl RephraseOutcome {
    pub fn succeeded(&self) -> bool {
        self.result.is_success()
    }
}

/// Try each rephrasing service in configuration order until one succeeds.
///
/// Services after the first success are never invoked. Each attempt is bounded
/// by `timeout` and a panicking provider counts as a failed attempt. When all
/// fail, the outcome carries the last failure.
pub async fn rephrase(
    text: &str,
    services: &[ServiceConfig],
    caller: &dyn ServiceCaller,
    llm: &dyn ChatModel,
    llm_settings: &LlmSettings,
    timeout: Duration,
) -> RephraseOutcome {
    let mut attempts: Vec<ServiceResult> = Vec::with_capacity(services.len());

    for service in services {
        let attempt = async {
            if service.is_internal_llm() {
                rephrase_with_llm(text, service, llm, llm_settings, timeout).await
            } else {
                rephrase_with_service(text, service, caller, timeout).await
            }
        };
        let (rephrased, result) = AssertUnwindSafe(attempt)
            .catch_unwind()
            .await
            .unwrap_or_else(|_| {
                tracing::error!(service = %service.name, "rephrasing provider panicked");
                (
                    String::new(),
                    ServiceResult::failed(&service.name, service.service_type, PANICKED),
                )
            });

        if result.is_success() {
            tracing::info!(
                service = %service.name,
                attempt = attempts.len() + 1,
                "rephrasing succeeded"
            );
            attempts.push(result.clone());
            return RephraseOutcome {
                text: rephrased,
                result,
                attempts,
            };
        }

        tracing::warn!(
            service = %service.name,
            error = result.error().unwrap_or_default(),
            "rephrasing provider failed, trying next"
        );
        attempts.push(result);
    }

    let result = attempts.last().cloned().unwrap_or_else(|| {
        ServiceResult::failed("None", ServiceType::Rephrasing, NO_REPHRASERS)
    });
    RephraseOutcome {
        text: String::new(),
        result,
        attempts,
    }
}

async fn rephrase_with_service(
    text: &str,
    service: &ServiceConfig,
    caller: &dyn ServiceCaller,
    timeout: Duration,
) -> (String, ServiceResult) {
    let result = call_service(service, text, caller, timeout).await;
    let rephrased = if result.is_success() {
        extract_rephrased(result.payload())
    } else {
        String::new()
    };
    (rephrased, result)
}

async fn rephrase_with_llm(
    text: &str,
    service: &ServiceConfig,
    llm: &dyn ChatModel,
    llm_settings: &LlmSettings,
    timeout: Duration,
) -> (String, ServiceResult) {
    let api_key = if service.credential.is_empty() {
        llm_settings.api_key.as_str()
    } else {
        service.credential.as_str()
    };

    let request = ChatRequest {
        base_url: &llm_settings.base_url,
        api_key,
        model: &llm_settings.model,
        system: REPHRASE_SYSTEM_PROMPT,
        user: text,
        temperature: REPHRASE_TEMPERATURE,
    };

    let start = Instant::now();
    let completion = tokio::time::timeout(timeout, llm.complete(request)).await;
    let elapsed_ms = start.elapsed().as_millis() as u64;

    // A completion without content counts as an empty rephrase, not a failure.
    let error = match completion {
        Ok(Ok(rephrased)) => {
            tracing::debug!(service = %service.name, elapsed_ms, "LLM rephrase succeeded");
            return (rephrased.clone(), llm_result(service, rephrased));
        }
        Ok(Err(LlmError::EmptyResponse)) => {
            tracing::debug!(service = %service.name, elapsed_ms, "LLM rephrase was empty");
            return (String::new(), llm_result(service, String::new()));
        }
        Ok(Err(e)) => e.to_string(),
        Err(_) => CallError::Timeout.to_string(),
    };

    tracing::warn!(
        service = %service.name,
        elapsed_ms,
        error = %error,
        "LLM rephrase failed"
    );
    (
        String::new(),
        ServiceResult::failed(&service.name, service.service_type, error),
    )
}

fn llm_result(service: &ServiceConfig, rephrased: String) -> ServiceResult {
    let mut payload = Payload::new();
    payload.insert("rephrased_text".to_string(), Value::String(rephrased));
    ServiceResult::succeeded(&service.name, service.service_type, payload)
}

/// Pull the rephrased text out of a provider payload: `rephrased_text`, then
/// `text`, else empty.
pub fn extract_rephrased(payload: &Payload) -> String {
    payload
        .get("rephrased_text")
        .or_else(|| payload.get("text"))
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string()
}
