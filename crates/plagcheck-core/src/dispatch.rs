//! Category dispatch: one call per configured service, one result per call.

use std::panic::AssertUnwindSafe;
use std::time::{Duration, Instant};

use futures_util::FutureExt;
use futures_util::future::join_all;

use crate::remote::{CallError, ServiceCaller};
use crate::{ServiceConfig, ServiceResult};

/// Error recorded for a service whose call panicked.
pub(crate) const PANICKED: &str = "internal error while calling service";

/// Send `text` to every service concurrently and collect one result per service.
///
/// The returned vector is indexed like `services`, whatever order the calls
/// finish in. Failures (including a panicking caller) are captured in the
/// corresponding [`ServiceResult`]; nothing propagates to the caller. An empty
/// service list yields an empty vector.
pub async fn dispatch(
    text: &str,
    services: &[ServiceConfig],
    caller: &dyn ServiceCaller,
    timeout: Duration,
) -> Vec<ServiceResult> {
    if services.is_empty() {
        return vec![];
    }

    let calls = services.iter().map(|service| async move {
        AssertUnwindSafe(call_service(service, text, caller, timeout))
            .catch_unwind()
            .await
            .unwrap_or_else(|_| {
                tracing::error!(service = %service.name, "service call panicked");
                ServiceResult::failed(&service.name, service.service_type, PANICKED)
            })
    });

    join_all(calls).await
}

/// Call a single service under `timeout` and normalize the outcome.
pub(crate) async fn call_service(
    service: &ServiceConfig,
    text: &str,
    caller: &dyn ServiceCaller,
    timeout: Duration,
) -> ServiceResult {
    let start = Instant::now();
    let outcome = match tokio::time::timeout(timeout, caller.call(service, text, timeout)).await {
        Ok(outcome) => outcome,
        Err(_) => Err(CallError::Timeout),
    };
    let elapsed_ms = start.elapsed().as_millis() as u64;

    match outcome {
        Ok(payload) => {
            tracing::debug!(
                service = %service.name,
                category = %service.service_type,
                elapsed_ms,
                "service call succeeded"
            );
            ServiceResult::succeeded(&service.name, service.service_type, payload)
        }
        Err(e) => {
            tracing::warn!(
                service = %service.name,
                category = %service.service_type,
                elapsed_ms,
                error = %e,
                "service call failed"
            );
            ServiceResult::failed(&service.name, service.service_type, e.to_string())
        }
    }
}
