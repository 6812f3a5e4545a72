//! The transport seam (spec.md §1, §6): "how the request-and-response
//! operation actually reaches the server" is an external collaborator and
//! out of scope for this crate's core. This module defines only the trait
//! boundary the pipeline drives, plus the request/response value types.
//!
//! Unlike the Python original's `RequestAndResponseOperation` (a single
//! mutable struct populated in place by the transport), this splits an
//! immutable `TransportRequest` from a `Result<TransportResponse, _>` —
//! returning a value rather than mutating shared state in place is the
//! idiomatic Rust shape here (see DESIGN.md).

use crate::constant::{Method, RequestType};
use crate::error::TransportError;
use async_trait::async_trait;
use std::collections::BTreeMap;

/// What goes down to the transport (spec.md §3's `RequestAndResponseOperation`
/// input fields).
#[derive(Debug, Clone)]
pub struct TransportRequest {
    pub request_type: RequestType,
    pub method: Method,
    pub resource_location: String,
    pub query_params: Option<BTreeMap<String, String>>,
    pub request_body: Vec<u8>,
}

/// What comes back (spec.md §3's `RequestAndResponseOperation` output
/// fields, minus the error slot — a transport failure is the `Err` side
/// of the `Result` instead).
#[derive(Debug, Clone)]
pub struct TransportResponse {
    pub status_code: u16,
    /// Base-10 decimal seconds, as a string, exactly as the header
    /// arrives — parsing is the caller's responsibility (spec.md §4.4).
    pub retry_after: Option<String>,
    pub response_body: Vec<u8>,
}

/// The downstream operation contract named in spec.md §6: "how the
/// request-and-response operation actually reaches the server." Left as a
/// trait; no concrete HTTP/MQTT implementation belongs in this crate.
#[async_trait]
pub trait Transport: Send + Sync + 'static {
    async fn send(&self, request: TransportRequest) -> Result<TransportResponse, TransportError>;
}
