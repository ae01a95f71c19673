use std::time::Instant;

use puntaiq_core::{retry, Endpoint, Origin, PredictionClient, RetryConfig, ServiceStatus};
use serde_json::Value;

use crate::error::CliError;
use crate::output::EnvelopeError;

use super::CommandResult;

pub async fn run(
    client: &PredictionClient,
    endpoint: &Endpoint,
    retries: u32,
) -> Result<CommandResult, CliError> {
    let started = Instant::now();
    let config = RetryConfig::exponential(retries);
    let outcome = retry(&config, || client.fetch(endpoint)).await;
    let latency_ms = started.elapsed().as_millis() as u64;

    match outcome {
        Ok(fetched) => {
            let mut result = CommandResult::ok(endpoint.name(), fetched.data)
                .with_origin(fetched.origin)
                .with_latency(latency_ms);

            if fetched.origin == Origin::StaleCache {
                result = result.with_warning(format!(
                    "serving stale cached data for {endpoint}: the live call was refused or failed"
                ));
            }
            if matches!(endpoint, Endpoint::Status) {
                let warnings = status_warnings(&result.data);
                result = result.with_warnings(warnings);
            }
            Ok(result)
        }
        Err(error) => {
            tracing::warn!(%endpoint, kind = %error.kind(), "request failed");
            Ok(CommandResult::ok(endpoint.name(), Value::Null)
                .with_error(EnvelopeError::from(&error))
                .with_latency(latency_ms))
        }
    }
}

fn status_warnings(data: &Value) -> Vec<String> {
    let Ok(status) = serde_json::from_value::<ServiceStatus>(data.clone()) else {
        return vec![String::from("status payload did not match the expected shape")];
    };

    let mut warnings = Vec::new();
    if !status.is_ok() {
        warnings.push(format!(
            "prediction service reports overall status {:?}",
            status.overall
        ));
    }
    for name in status.unhealthy_services() {
        warnings.push(format!("integration '{name}' is not healthy"));
    }
    warnings
}
