//! The pipeline executor: the literal Rust realization of "the pipeline
//! thread" from spec.md §5. A single task owns every in-flight operation
//! (an arena rather than a web of weak back-references) and drains an
//! event queue one event at a time, so nothing here ever needs a lock —
//! the arena IS the serialization point, matching
//! `control-plane/agents/core/src/core/reconciler/nexus/mod.rs`'s
//! single-task-owns-the-registry shape.

use crate::config::ProvisioningConfig;
use crate::error::ProvisioningError;
use crate::model::RegistrationResult;
use crate::operations::{OperationId, PollStatusOperation, RegisterOperation};
use crate::transport::{Transport, TransportResponse};
use crate::{stages, error::TransportError};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot};

/// Everything that can happen to the pipeline: a user call, a transport
/// reply, or a timer firing. Every timer/transport-originated variant
/// carries the `id`/`generation` it was issued under so the executor can
/// drop events superseded by a retry or a completion (spec.md §5, §9).
pub(crate) enum Event {
    Register {
        registration_id: String,
        payload: Option<Value>,
        respond_to: oneshot::Sender<Result<RegistrationResult, ProvisioningError>>,
    },
    Cancel,
    RegisterTimeout {
        id: OperationId,
        generation: u64,
    },
    RegisterResponse {
        id: OperationId,
        generation: u64,
        response: Result<TransportResponse, TransportError>,
    },
    RegisterRetryFired {
        id: OperationId,
        generation: u64,
    },
    RegisterPollingFired {
        id: OperationId,
        generation: u64,
        operation_id: String,
    },
    PollTimeout {
        id: OperationId,
        generation: u64,
    },
    PollResponse {
        id: OperationId,
        generation: u64,
        response: Result<TransportResponse, TransportError>,
    },
    PollRetryFired {
        id: OperationId,
        generation: u64,
    },
}

/// A cheap, cloneable sender into the executor's event queue. Timer and
/// transport-call tasks hold one of these; they never touch operation
/// state directly, only ever post an `Event`.
#[derive(Clone)]
pub(crate) struct PipelineHandle {
    tx: mpsc::UnboundedSender<Event>,
}

impl PipelineHandle {
    pub(crate) fn post(&self, event: Event) {
        // The executor task outliving every sender is the only case this
        // can fail in; dropping the event is correct in that case.
        let _ = self.tx.send(event);
    }
}

/// Spawn a transport call on its own task; it posts `make_event(result)`
/// back onto the executor once the call completes.
pub(crate) fn spawn_transport_call(
    transport: Arc<dyn Transport>,
    handle: PipelineHandle,
    request: crate::transport::TransportRequest,
    make_event: impl FnOnce(Result<TransportResponse, TransportError>) -> Event + Send + 'static,
) {
    tokio::spawn(async move {
        let response = transport.send(request).await;
        handle.post(make_event(response));
    });
}

/// Arm `timer` to post `event` onto `handle` after `interval`, cancelling
/// whatever that timer previously held.
pub(crate) fn arm_timer(
    timer: &mut crate::timer::TimerHandle,
    handle: PipelineHandle,
    interval: std::time::Duration,
    event: Event,
) {
    timer.arm(interval, async move {
        handle.post(event);
    });
}

/// The arena itself: all state the stage functions in [`crate::stages`]
/// read and mutate.
pub(crate) struct Executor {
    pub(crate) transport: Arc<dyn Transport>,
    pub(crate) config: ProvisioningConfig,
    pub(crate) handle: PipelineHandle,
    /// At most one registration in flight at a time (spec.md §3 invariant).
    pub(crate) register: Option<RegisterOperation>,
    pub(crate) polls: HashMap<OperationId, PollStatusOperation>,
}

/// Spawn the executor task and return a handle for posting events to it.
/// `transport` and `config` live for the lifetime of the pipeline.
pub(crate) fn spawn(transport: Arc<dyn Transport>, config: ProvisioningConfig) -> PipelineHandle {
    let (tx, rx) = mpsc::unbounded_channel();
    let handle = PipelineHandle { tx };
    let executor = Executor {
        transport,
        config,
        handle: handle.clone(),
        register: None,
        polls: HashMap::new(),
    };
    tokio::spawn(run(executor, rx));
    handle
}

async fn run(mut executor: Executor, mut rx: mpsc::UnboundedReceiver<Event>) {
    while let Some(event) = rx.recv().await {
        match event {
            Event::Register {
                registration_id,
                payload,
                respond_to,
            } => stages::registration::enter(&mut executor, registration_id, payload, respond_to),
            Event::Cancel => stages::registration::cancel(&mut executor),
            Event::RegisterTimeout { id, generation } => {
                stages::registration::on_timeout(&mut executor, id, generation)
            }
            Event::RegisterResponse {
                id,
                generation,
                response,
            } => stages::registration::on_response(&mut executor, id, generation, response),
            Event::RegisterRetryFired { id, generation } => {
                stages::registration::on_retry_fired(&mut executor, id, generation)
            }
            Event::RegisterPollingFired {
                id,
                generation,
                operation_id,
            } => stages::registration::on_polling_fired(&mut executor, id, generation, operation_id),
            Event::PollTimeout { id, generation } => {
                stages::polling::on_timeout(&mut executor, id, generation)
            }
            Event::PollResponse {
                id,
                generation,
                response,
            } => stages::polling::on_response(&mut executor, id, generation, response),
            Event::PollRetryFired { id, generation } => {
                stages::polling::on_retry_fired(&mut executor, id, generation)
            }
        }
    }
}
