//! Protocol constants shared by the registration and polling stages.

use std::time::Duration;

/// Overall per-operation wall-clock budget, unless overridden by
/// [`crate::config::ProvisioningConfig`].
pub const DEFAULT_TIMEOUT_INTERVAL: Duration = Duration::from_secs(30);

/// Interval between status polls / retries when the server does not
/// specify its own `retry-after`.
pub const DEFAULT_POLLING_INTERVAL: Duration = Duration::from_secs(2);

/// The root resource both register and query requests are sent to.
pub const ROOT_RESOURCE: &str = "/";

/// Tag identifying a request type, used for logging and error messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RequestType {
    /// `PUT /` — initial device registration.
    Register,
    /// `GET /` — operation status query.
    Query,
}

impl std::fmt::Display for RequestType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Register => write!(f, "register"),
            Self::Query => write!(f, "query"),
        }
    }
}

/// HTTP method used for a [`crate::transport::TransportRequest`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Put,
    Get,
}

impl std::fmt::Display for Method {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Put => write!(f, "PUT"),
            Self::Get => write!(f, "GET"),
        }
    }
}
