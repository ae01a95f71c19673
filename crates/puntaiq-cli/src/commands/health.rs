use std::time::Instant;

use puntaiq_core::{HealthState, PredictionClient};
use serde::Serialize;

use crate::error::CliError;
use crate::output::EnvelopeError;

use super::CommandResult;

#[derive(Debug, Serialize)]
struct HealthResponseData {
    client: puntaiq_core::HealthStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    service: Option<puntaiq_core::ServiceStatus>,
}

/// Probes `/api/status` and reports it next to the breaker-derived health.
pub async fn run(client: &PredictionClient) -> Result<CommandResult, CliError> {
    let started = Instant::now();
    let probe = client.get_status().await;
    let latency_ms = started.elapsed().as_millis() as u64;
    let health = client.health();

    let mut warnings = Vec::new();
    if health.state != HealthState::Healthy {
        warnings.push(format!(
            "circuit is {} after {} consecutive failures",
            health.circuit.as_str(),
            health.consecutive_failures
        ));
    }

    let (service, error) = match probe {
        Ok(status) => {
            if !status.is_ok() {
                warnings.push(format!(
                    "prediction service reports overall status {:?}",
                    status.overall
                ));
            }
            (Some(status), None)
        }
        Err(error) => (None, Some(EnvelopeError::from(&error))),
    };

    let data = serde_json::to_value(HealthResponseData {
        client: health,
        service,
    })?;

    let mut result = CommandResult::ok("health", data)
        .with_warnings(warnings)
        .with_latency(latency_ms);
    if let Some(error) = error {
        result = result.with_error(error);
    }
    Ok(result)
}
