use std::io::Write;

use puntaiq_core::{Origin, ServiceError};
use serde::Serialize;
use serde_json::Value;
use time::format_description::well_known::Rfc3339;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::error::CliError;

/// JSON document written to stdout for every command.
#[derive(Debug, Serialize)]
pub struct Envelope {
    pub meta: Meta,
    pub data: Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<EnvelopeError>,
}

#[derive(Debug, Serialize)]
pub struct Meta {
    pub request_id: Uuid,
    pub generated_at: String,
    pub endpoint: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub origin: Option<Origin>,
    pub latency_ms: u64,
    pub warnings: Vec<String>,
}

impl Meta {
    pub fn new(
        endpoint: &'static str,
        origin: Option<Origin>,
        latency_ms: u64,
    ) -> Result<Self, CliError> {
        Ok(Self {
            request_id: Uuid::new_v4(),
            generated_at: OffsetDateTime::now_utc().format(&Rfc3339)?,
            endpoint,
            origin,
            latency_ms,
            warnings: Vec::new(),
        })
    }

    pub fn push_warning(&mut self, warning: impl Into<String>) {
        self.warnings.push(warning.into());
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct EnvelopeError {
    pub code: &'static str,
    pub kind: &'static str,
    pub message: String,
    pub retryable: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<u16>,
}

impl From<&ServiceError> for EnvelopeError {
    fn from(error: &ServiceError) -> Self {
        Self {
            code: error.code(),
            kind: error.kind().as_str(),
            message: error.message().to_owned(),
            retryable: error.retryable(),
            status: error.status(),
        }
    }
}

pub fn render(envelope: &Envelope, pretty: bool) -> Result<(), CliError> {
    let rendered = if pretty {
        serde_json::to_string_pretty(envelope)?
    } else {
        serde_json::to_string(envelope)?
    };

    let mut stdout = std::io::stdout().lock();
    writeln!(stdout, "{rendered}")?;
    stdout.flush()?;
    Ok(())
}
