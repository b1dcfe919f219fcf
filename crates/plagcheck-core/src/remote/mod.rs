//! Remote service trait and the HTTP implementation used in production.

#[cfg(test)]
pub mod mock;

use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

use serde_json::Value;
use thiserror::Error;

use crate::ServiceConfig;

/// Opaque JSON object returned by a provider. Each provider shapes it
/// differently; nothing in the engine interprets it beyond key lookups.
pub type Payload = serde_json::Map<String, Value>;

/// Why a single remote call failed.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CallError {
    #[error("Request timed out")]
    Timeout,
    /// The remote answered with a non-2xx status.
    #[error("HTTP error: {0}")]
    Status(u16),
    /// Network failure, malformed body, or anything else unexpected.
    #[error("{0}")]
    Other(String),
}

impl From<reqwest::Error> for CallError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            CallError::Timeout
        } else if let Some(status) = e.status() {
            CallError::Status(status.as_u16())
        } else {
            CallError::Other(e.to_string())
        }
    }
}

/// Something that can deliver a text payload to a configured service.
pub trait ServiceCaller: Send + Sync {
    /// Send `text` to `service` and return its response object.
    fn call<'a>(
        &'a self,
        service: &'a ServiceConfig,
        text: &'a str,
        timeout: Duration,
    ) -> Pin<Box<dyn Future<Output = Result<Payload, CallError>> + Send + 'a>>;
}

/// Calls services over HTTP: `POST {"text": ...}` with a bearer credential.
#[derive(Clone)]
pub struct HttpCaller {
    client: reqwest::Client,
}

impl HttpCaller {
    pub fn new(client: reqwest::Client) -> Self {
        Self { client }
    }

    pub fn client(&self) -> &reqwest::Client {
        &self.client
    }
}

impl Default for HttpCaller {
    fn default() -> Self {
        let client = reqwest::Client::builder()
            .pool_idle_timeout(Duration::from_secs(30))
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());
        Self::new(client)
    }
}

impl ServiceCaller for HttpCaller {
    fn call<'a>(
        &'a self,
        service: &'a ServiceConfig,
        text: &'a str,
        timeout: Duration,
    ) -> Pin<Box<dyn Future<Output = Result<Payload, CallError>> + Send + 'a>> {
        Box::pin(async move {
            let resp = self
                .client
                .post(&service.endpoint)
                .bearer_auth(&service.credential)
                .json(&serde_json::json!({ "text": text }))
                .timeout(timeout)
                .send()
                .await?;

            let status = resp.status();
            if !status.is_success() {
                return Err(CallError::Status(status.as_u16()));
            }

            match resp.json::<Value>().await? {
                Value::Object(map) => Ok(map),
                _ => Err(CallError::Other(
                    "response body is not a JSON object".to_string(),
                )),
            }
        })
    }
}
