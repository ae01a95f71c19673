use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::circuit_breaker::CircuitState;

/// Overall verdict reported by `/api/status`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OverallStatus {
    Ok,
    Error,
    Degraded,
}

/// Per-integration entry of the status report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComponentStatus {
    pub status: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub requests_remaining: Option<u64>,
}

/// Body of `GET /api/status`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceStatus {
    pub overall: OverallStatus,
    #[serde(default)]
    pub services: BTreeMap<String, ComponentStatus>,
    pub timestamp: String,
}

impl ServiceStatus {
    pub fn is_ok(&self) -> bool {
        self.overall == OverallStatus::Ok
    }

    /// Names of integrations not reporting `ok` or `online`.
    pub fn unhealthy_services(&self) -> Vec<&str> {
        self.services
            .iter()
            .filter(|(_, component)| !matches!(component.status.as_str(), "ok" | "online"))
            .map(|(name, _)| name.as_str())
            .collect()
    }
}

/// Client-side health derived from the circuit breaker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HealthState {
    Healthy,
    Degraded,
    Unhealthy,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct HealthStatus {
    pub state: HealthState,
    pub circuit: CircuitState,
    pub consecutive_failures: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub retry_in_ms: Option<u64>,
}

impl HealthStatus {
    pub fn from_circuit(
        circuit: CircuitState,
        consecutive_failures: u32,
        retry_in_ms: Option<u64>,
    ) -> Self {
        let state = match circuit {
            CircuitState::Closed if consecutive_failures == 0 => HealthState::Healthy,
            CircuitState::Closed | CircuitState::HalfOpen => HealthState::Degraded,
            CircuitState::Open => HealthState::Unhealthy,
        };

        Self {
            state,
            circuit,
            consecutive_failures,
            retry_in_ms,
        }
    }
}
