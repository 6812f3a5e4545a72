//! The thin async user-facing wrapper spec.md names as an external
//! collaborator ("a synchronous wrapper around the pipeline"). This
//! crate's native surface is async rather than synchronous, but the
//! shape is the same: one call in, one `Result` out, with the whole
//! pipeline's timers, retries and worker operations hidden behind it.

use crate::config::ProvisioningConfig;
use crate::error::ProvisioningError;
use crate::model::RegistrationResult;
use crate::pipeline::{self, PipelineHandle};
use crate::transport::Transport;
use serde_json::Value;
use std::sync::Arc;
use tokio::sync::oneshot;

/// A running registration pipeline bound to one transport and one
/// configuration. Cheap to clone; every clone talks to the same
/// executor task.
#[derive(Clone)]
pub struct ProvisioningClient {
    handle: PipelineHandle,
}

impl ProvisioningClient {
    /// Start the pipeline's executor task. Returns immediately; the
    /// executor keeps running until every clone of this client is
    /// dropped.
    pub fn new(transport: Arc<dyn Transport>, config: ProvisioningConfig) -> Self {
        Self {
            handle: pipeline::spawn(transport, config),
        }
    }

    /// Register `registration_id`, optionally attaching a custom
    /// `payload`, and wait for a terminal result. At most one
    /// registration may be in flight on a given client at a time; a
    /// second call while one is outstanding fails with
    /// [`ProvisioningError::AlreadyInProgress`].
    pub async fn register(
        &self,
        registration_id: impl Into<String>,
        payload: Option<Value>,
    ) -> Result<RegistrationResult, ProvisioningError> {
        let (respond_to, recv) = oneshot::channel();
        self.handle.post(pipeline::Event::Register {
            registration_id: registration_id.into(),
            payload,
            respond_to,
        });
        recv.await.unwrap_or(Err(ProvisioningError::Cancelled))
    }

    /// Cancel whatever registration is currently in flight. A no-op if
    /// none is. The in-flight `register()` call, if any, resolves with
    /// [`ProvisioningError::Cancelled`].
    pub fn cancel(&self) {
        self.handle.post(pipeline::Event::Cancel);
    }
}

// TODO: the Python original carries a `handle_result` hook whose callers
// are never defined anywhere in that codebase. Nothing is built here
// beyond returning the `Result` to the caller directly — see DESIGN.md.
