//! Domain types for prediction service requests and responses.
//!
//! Most payloads are passed through untouched as JSON. Only path parameters
//! and the status report are typed.

pub mod sport;
pub mod status;

pub use sport::{LeagueId, SportKey};
pub use status::{ComponentStatus, HealthState, HealthStatus, OverallStatus, ServiceStatus};
