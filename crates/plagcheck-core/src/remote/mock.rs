//! Mock service caller for testing.

use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::Mutex;
use std::time::Duration;

use serde_json::Value;

use super::{CallError, Payload, ServiceCaller};
use crate::ServiceConfig;

/// A configurable mock response for [`MockCaller`].
#[derive(Clone, Debug)]
pub enum MockResponse {
    /// Answer with this JSON object.
    Payload(Payload),
    /// Simulate a non-2xx status.
    Status(u16),
    /// Simulate a network/parse failure.
    Error(String),
    /// Never answer; only the dispatcher's timeout ends the call.
    Hang,
}

/// A hand-rolled mock implementing [`ServiceCaller`] for tests.
///
/// Responses are keyed by service name with a fallback for unknown names.
/// Every call is recorded as `(service name, text)` in invocation order.
pub struct MockCaller {
    responses: HashMap<String, MockResponse>,
    fallback: MockResponse,
    delay: Option<Duration>,
    calls: Mutex<Vec<(String, String)>>,
}

impl MockCaller {
    /// Create a mock that answers every service with `fallback`.
    pub fn new(fallback: MockResponse) -> Self {
        Self {
            responses: HashMap::new(),
            fallback,
            delay: None,
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Override the response for one service name.
    pub fn with_response(mut self, name: &str, response: MockResponse) -> Self {
        self.responses.insert(name.to_string(), response);
        self
    }

    /// Set simulated network latency per call.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// All recorded calls, in invocation order.
    pub fn calls(&self) -> Vec<(String, String)> {
        self.calls.lock().unwrap().clone()
    }

    /// How many times the named service was called.
    pub fn call_count(&self, name: &str) -> usize {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|(n, _)| n == name)
            .count()
    }

    pub fn total_calls(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

/// Build a [`Payload`] from a `json!` object literal.
pub fn payload(value: Value) -> Payload {
    match value {
        Value::Object(map) => map,
        _ => Payload::new(),
    }
}

impl ServiceCaller for MockCaller {
    fn call<'a>(
        &'a self,
        service: &'a ServiceConfig,
        text: &'a str,
        _timeout: Duration,
    ) -> Pin<Box<dyn Future<Output = Result<Payload, CallError>> + Send + 'a>> {
        self.calls
            .lock()
            .unwrap()
            .push((service.name.clone(), text.to_string()));
        let response = self
            .responses
            .get(&service.name)
            .cloned()
            .unwrap_or_else(|| self.fallback.clone());
        let delay = self.delay;

        Box::pin(async move {
            if let Some(d) = delay {
                tokio::time::sleep(d).await;
            }

            match response {
                MockResponse::Payload(p) => Ok(p),
                MockResponse::Status(code) => Err(CallError::Status(code)),
                MockResponse::Error(msg) => Err(CallError::Other(msg)),
                MockResponse::Hang => std::future::pending().await,
            }
        })
    }
}
