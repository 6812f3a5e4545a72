//! Registration Stage (C6): PUT the registration request, then react to
//! throttling, a terminal status, or an "assigning" handoff into the
//! Polling Status Stage.

use crate::classify::classify;
use crate::constant::{Method, RequestType, ROOT_RESOURCE};
use crate::error::{ProvisioningError, TransportError};
use crate::model::{form_complete_result, DeviceRegistrationPayload, RegistrationResult, RegistrationStatus};
use crate::operations::{OperationId, PollStatusOperation, RegisterOperation};
use crate::pipeline::{Event, Executor};
use crate::transport::{TransportRequest, TransportResponse};
use serde_json::Value;
use tokio::sync::oneshot;

fn is_current(register: Option<&RegisterOperation>, id: OperationId, generation: u64) -> bool {
    matches!(register, Some(op) if op.id == id && op.generation == generation && !op.completed)
}

/// Arm the timeout timer and send the PUT for whatever attempt
/// `executor.register` is currently on (its own `generation`). Used both
/// for the very first attempt and for every retry-after resend.
fn begin_attempt(executor: &mut Executor) {
    let transport = executor.transport.clone();
    let handle = executor.handle.clone();
    let timeout_interval = executor.config.timeout_interval;

    let op = match executor.register.as_mut() {
        Some(op) => op,
        None => return,
    };
    let id = op.id;
    let generation = op.generation;

    crate::pipeline::arm_timer(
        &mut op.timers.timeout,
        handle.clone(),
        timeout_interval,
        Event::RegisterTimeout { id, generation },
    );

    let payload = DeviceRegistrationPayload::new(op.registration_id.clone(), op.request_payload.clone());
    let request = TransportRequest {
        request_type: RequestType::Register,
        method: Method::Put,
        resource_location: ROOT_RESOURCE.to_string(),
        query_params: None,
        request_body: payload.to_json_bytes(),
    };

    tracing::debug!(id = %id, generation, "sending registration request");
    crate::pipeline::spawn_transport_call(transport, handle, request, move |response| Event::RegisterResponse {
        id,
        generation,
        response,
    });
}

/// Resolve and clear `executor.register`, releasing any poll worker it
/// still owns. The single place that actually finishes a registration.
pub(crate) fn complete(executor: &mut Executor, error: Option<ProvisioningError>) {
    let poll_worker = executor.register.as_ref().and_then(|op| op.poll_worker);
    if let Some(op) = executor.register.as_mut() {
        op.complete(error);
    }
    executor.register = None;
    if let Some(poll_id) = poll_worker {
        executor.polls.remove(&poll_id);
    }
}

pub(crate) fn enter(
    executor: &mut Executor,
    registration_id: String,
    payload: Option<Value>,
    respond_to: oneshot::Sender<Result<RegistrationResult, ProvisioningError>>,
) {
    if executor.register.is_some() {
        let _ = respond_to.send(Err(ProvisioningError::AlreadyInProgress));
        return;
    }
    let op = RegisterOperation::new(registration_id, payload, respond_to);
    tracing::info!(id = %op.id, "starting registration");
    executor.register = Some(op);
    begin_attempt(executor);
}

pub(crate) fn cancel(executor: &mut Executor) {
    if executor.register.is_some() {
        tracing::info!("registration cancelled");
    }
    complete(executor, Some(ProvisioningError::Cancelled));
    executor.polls.clear();
}

pub(crate) fn on_timeout(executor: &mut Executor, id: OperationId, generation: u64) {
    if !is_current(executor.register.as_ref(), id, generation) {
        return;
    }
    tracing::warn!(id = %id, "registration timed out");
    complete(
        executor,
        Some(ProvisioningError::Timeout {
            request_type: RequestType::Register,
        }),
    );
}

pub(crate) fn on_retry_fired(executor: &mut Executor, id: OperationId, generation: u64) {
    if !is_current(executor.register.as_ref(), id, generation) {
        return;
    }
    if let Some(op) = executor.register.as_mut() {
        op.generation += 1;
        tracing::debug!(id = %id, generation = op.generation, "retrying registration after throttle");
    }
    begin_attempt(executor);
}

pub(crate) fn on_polling_fired(executor: &mut Executor, id: OperationId, generation: u64, operation_id: String) {
    if !is_current(executor.register.as_ref(), id, generation) {
        return;
    }
    let poll = PollStatusOperation::new(id, operation_id);
    let poll_id = poll.id;
    if let Some(op) = executor.register.as_mut() {
        op.poll_worker = Some(poll_id);
    }
    executor.polls.insert(poll_id, poll);
    tracing::info!(parent = %id, poll_id = %poll_id, "spawning poll worker");
    crate::stages::polling::enter(executor, poll_id);
}

pub(crate) fn on_response(
    executor: &mut Executor,
    id: OperationId,
    generation: u64,
    response: Result<TransportResponse, TransportError>,
) {
    if !is_current(executor.register.as_ref(), id, generation) {
        return;
    }
    if let Some(op) = executor.register.as_mut() {
        op.timers.timeout.cancel();
    }

    let (status_code, retry_after, body, transport_err) = match response {
        Ok(resp) => (resp.status_code, resp.retry_after, resp.response_body, None),
        Err(err) => (0, None, Vec::new(), Some(err)),
    };

    if let Some(classified) = classify(RequestType::Register, status_code, transport_err) {
        complete(executor, Some(classified));
        return;
    }

    // status_code >= 429: a throttle signal, not an error. Retry after the
    // server's advertised interval (or the default if it can't be parsed).
    if status_code >= 429 {
        let interval = crate::retry::interval_or_default(retry_after.as_deref(), executor.config.polling_interval);
        if let Some(op) = executor.register.as_mut() {
            tracing::debug!(id = %id, ?interval, "registration throttled, scheduling retry");
            crate::pipeline::arm_timer(
                &mut op.timers.retry_after,
                executor.handle.clone(),
                interval,
                Event::RegisterRetryFired { id, generation },
            );
        }
        return;
    }

    let decoded = match crate::json::decode(&body) {
        Ok(v) => v,
        Err(e) => {
            complete(executor, Some(e));
            return;
        }
    };
    let operation_id = match crate::json::operation_id(&decoded) {
        Ok(v) => v,
        Err(e) => {
            complete(executor, Some(e));
            return;
        }
    };
    let status = match crate::json::registration_status(&decoded) {
        Ok(v) => v,
        Err(e) => {
            complete(executor, Some(e));
            return;
        }
    };

    if status.as_deref() == Some("assigning") {
        match operation_id {
            Some(op_id) => {
                // Intentionally DEFAULT_POLLING_INTERVAL/config default
                // here, not the PUT response's own retry-after — the
                // polling cadence is governed by the Polling Status
                // Stage's interval, not the registration attempt's
                // (spec.md §9's documented asymmetry).
                let interval = executor.config.polling_interval;
                if let Some(op) = executor.register.as_mut() {
                    crate::pipeline::arm_timer(
                        &mut op.timers.polling,
                        executor.handle.clone(),
                        interval,
                        Event::RegisterPollingFired {
                            id,
                            generation,
                            operation_id: op_id,
                        },
                    );
                }
            }
            None => complete(
                executor,
                Some(ProvisioningError::InvalidStatus {
                    request_type: RequestType::Register,
                    status,
                    status_code,
                }),
            ),
        }
        return;
    }

    match status.as_deref().and_then(RegistrationStatus::parse) {
        Some(parsed) => match form_complete_result(operation_id, &decoded, parsed) {
            Ok(result) => {
                let failed = matches!(parsed, RegistrationStatus::Failed);
                if let Some(op) = executor.register.as_mut() {
                    op.registration_result = Some(result);
                }
                if failed {
                    complete(
                        executor,
                        Some(ProvisioningError::RegistrationFailed {
                            request_type: RequestType::Register,
                            status_code,
                        }),
                    );
                } else {
                    complete(executor, None);
                }
            }
            Err(e) => complete(executor, Some(e)),
        },
        None => complete(
            executor,
            Some(ProvisioningError::InvalidStatus {
                request_type: RequestType::Register,
                status,
                status_code,
            }),
        ),
    }
}
