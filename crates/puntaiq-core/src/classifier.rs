//! Maps raw call failures onto the [`ServiceErrorKind`] taxonomy.
//!
//! | Raw failure | Kind |
//! |-------------|------|
//! | connection refused / unreachable | `ServiceUnavailable` |
//! | 401, 403 | `AuthenticationFailed` |
//! | 429 | `RateLimited` |
//! | deadline elapsed | `Timeout` |
//! | any other non-2xx | `UpstreamError` |
//! | anything else | `Unknown` |
//!
//! [`ServiceErrorKind`]: crate::error::ServiceErrorKind

use std::time::Duration;

use crate::error::ServiceError;
use crate::http_client::{HttpError, HttpErrorKind};

/// A failed call as observed by dispatch, before classification.
#[derive(Debug)]
pub enum RawFailure {
    /// The transport reported an error. `timeout` is the deadline the request carried.
    Transport { error: HttpError, timeout: Duration },
    /// The client-side deadline fired before the transport returned.
    Elapsed(Duration),
    /// The service answered with a non-2xx status.
    Status(u16),
    /// A 2xx body that is not the JSON we expected.
    Decode(serde_json::Error),
}

pub fn classify(failure: RawFailure) -> ServiceError {
    match failure {
        RawFailure::Transport { error, timeout } => match error.kind() {
            HttpErrorKind::Connect => ServiceError::service_unavailable().with_cause(error),
            HttpErrorKind::Timeout => ServiceError::timeout(timeout).with_cause(error),
            HttpErrorKind::Body | HttpErrorKind::Other => {
                ServiceError::unknown(error.message()).with_cause(error)
            }
        },
        RawFailure::Elapsed(timeout) => ServiceError::timeout(timeout),
        RawFailure::Status(status) => classify_status(status),
        RawFailure::Decode(error) => {
            ServiceError::unknown(format!("invalid response body: {error}")).with_cause(error)
        }
    }
}

fn classify_status(status: u16) -> ServiceError {
    match status {
        401 | 403 => ServiceError::authentication_failed(status),
        429 => ServiceError::rate_limited().with_status(status),
        _ => ServiceError::upstream(status),
    }
}
