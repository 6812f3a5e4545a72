//! Error taxonomy for the provisioning pipeline.
//!
//! Mirrors the kinds (not necessarily the exact types) described for the
//! Python original: transport errors pass through unchanged, service
//! errors and malformed responses are synthesized, and timeouts/
//! cancellation/already-in-progress are first-class variants rather than
//! ad-hoc strings.

use crate::constant::RequestType;
use snafu::Snafu;

/// Opaque error returned by a [`crate::transport::Transport`] implementation.
pub type TransportError = Box<dyn std::error::Error + Send + Sync + 'static>;

#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum ProvisioningError {
    /// The transport itself failed (connection refused, DNS failure, etc).
    /// Propagated unchanged, per spec: "raised upstream; propagated
    /// unchanged to the user callback."
    #[snafu(display("{} request failed at the transport layer: {}", request_type, source))]
    Transport {
        request_type: RequestType,
        source: TransportError,
    },

    /// HTTP status in `[300, 429)` — a terminal, non-retryable service
    /// error.
    #[snafu(display(
        "{} request returned a service error status code {}",
        request_type,
        status_code
    ))]
    Service {
        request_type: RequestType,
        status_code: u16,
    },

    /// Registration status was present but was neither a recognized
    /// terminal status nor "assigning".
    #[snafu(display(
        "{} operation encountered an invalid registration status {:?} with a status code of {}",
        request_type,
        status,
        status_code
    ))]
    InvalidStatus {
        request_type: RequestType,
        status: Option<String>,
        status_code: u16,
    },

    /// The service reported a terminal `failed` registration status.
    #[snafu(display(
        "{} operation returned a failed registration status with a status code of {}",
        request_type,
        status_code
    ))]
    RegistrationFailed {
        request_type: RequestType,
        status_code: u16,
    },

    /// The per-operation timeout timer fired before a terminal response
    /// arrived.
    #[snafu(display(
        "operation timed out before the provisioning service could respond for {} operation",
        request_type
    ))]
    Timeout { request_type: RequestType },

    /// The response body was not valid JSON.
    #[snafu(display("failed to decode response body as JSON: {}", source))]
    MalformedResponse { source: serde_json::Error },

    /// The response body was valid JSON but not an object at the top
    /// level.
    #[snafu(display("response body must be a JSON object at the top level"))]
    NotAnObject,

    /// A field expected to be a string (or absent) was present with a
    /// different JSON type.
    #[snafu(display("field `{}` was present but was not a string", key))]
    MalformedField { key: &'static str },

    /// A `Register` call was made while another registration was already
    /// in flight (spec: "a new RegisterOperation cannot be issued while
    /// one is in flight").
    #[snafu(display("a registration is already in progress"))]
    AlreadyInProgress,

    /// The pipeline was cancelled before the in-flight registration
    /// reached a terminal state. Resolves spec.md §9's Open Question in
    /// the direction it recommends: surface an explicit cancellation
    /// error rather than leaving the caller hanging.
    #[snafu(display("registration was cancelled"))]
    Cancelled,
}

pub type Result<T, E = ProvisioningError> = std::result::Result<T, E>;
