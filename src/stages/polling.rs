//! Polling Status Stage (C5): GET the operation status until it reaches
//! a terminal state, propagating the result back to the parent
//! registration through the executor's arena.

use crate::classify::classify;
use crate::constant::{Method, RequestType, ROOT_RESOURCE};
use crate::error::{ProvisioningError, TransportError};
use crate::model::{form_complete_result, RegistrationStatus};
use crate::operations::OperationId;
use crate::pipeline::{Event, Executor};
use crate::transport::{TransportRequest, TransportResponse};
use std::collections::BTreeMap;

fn is_current(executor: &Executor, id: OperationId, generation: u64) -> bool {
    matches!(executor.polls.get(&id), Some(op) if op.generation == generation)
}

/// Arm the timeout timer and send the GET for whatever attempt the poll
/// operation `id` is currently on. Used both for the first query and
/// every subsequent re-poll.
fn begin_attempt(executor: &mut Executor, id: OperationId) {
    let transport = executor.transport.clone();
    let handle = executor.handle.clone();
    let timeout_interval = executor.config.timeout_interval;

    let poll = match executor.polls.get_mut(&id) {
        Some(poll) => poll,
        None => return,
    };
    let generation = poll.generation;

    crate::pipeline::arm_timer(
        &mut poll.timers.timeout,
        handle.clone(),
        timeout_interval,
        Event::PollTimeout { id, generation },
    );

    let mut query_params = BTreeMap::new();
    query_params.insert("operationId".to_string(), poll.operation_id.clone());
    let request = TransportRequest {
        request_type: RequestType::Query,
        method: Method::Get,
        resource_location: ROOT_RESOURCE.to_string(),
        query_params: Some(query_params),
        request_body: Vec::new(),
    };

    tracing::debug!(id = %id, generation, "sending status query");
    crate::pipeline::spawn_transport_call(transport, handle, request, move |response| Event::PollResponse {
        id,
        generation,
        response,
    });
}

/// Remove and resolve the poll operation `id`, propagating its result
/// into the parent `RegisterOperation` (the Rust realization of the
/// Python original's "copy callback" closure — see spec.md §3, §5).
fn complete(executor: &mut Executor, id: OperationId, error: Option<ProvisioningError>) {
    let poll = match executor.polls.remove(&id) {
        Some(poll) => poll,
        None => return,
    };
    tracing::info!(parent = %poll.parent, poll_id = %id, "poll worker finished");

    let parent_is_waiting =
        matches!(executor.register.as_ref(), Some(op) if op.id == poll.parent && !op.completed);
    if !parent_is_waiting {
        return;
    }
    if let Some(op) = executor.register.as_mut() {
        op.registration_result = poll.registration_result;
    }
    crate::stages::registration::complete(executor, error);
}

pub(crate) fn enter(executor: &mut Executor, id: OperationId) {
    begin_attempt(executor, id);
}

pub(crate) fn on_timeout(executor: &mut Executor, id: OperationId, generation: u64) {
    if !is_current(executor, id, generation) {
        return;
    }
    tracing::warn!(id = %id, "status query timed out");
    complete(
        executor,
        id,
        Some(ProvisioningError::Timeout {
            request_type: RequestType::Query,
        }),
    );
}

pub(crate) fn on_retry_fired(executor: &mut Executor, id: OperationId, generation: u64) {
    if !is_current(executor, id, generation) {
        return;
    }
    if let Some(poll) = executor.polls.get_mut(&id) {
        poll.generation += 1;
        tracing::debug!(id = %id, generation = poll.generation, "polling again");
    }
    begin_attempt(executor, id);
}

pub(crate) fn on_response(
    executor: &mut Executor,
    id: OperationId,
    generation: u64,
    response: Result<TransportResponse, TransportError>,
) {
    if !is_current(executor, id, generation) {
        return;
    }
    if let Some(poll) = executor.polls.get_mut(&id) {
        poll.timers.timeout.cancel();
    }

    let (status_code, retry_after, body, transport_err) = match response {
        Ok(resp) => (resp.status_code, resp.retry_after, resp.response_body, None),
        Err(err) => (0, None, Vec::new(), Some(err)),
    };

    if let Some(classified) = classify(RequestType::Query, status_code, transport_err) {
        complete(executor, id, Some(classified));
        return;
    }

    let decoded = match crate::json::decode(&body) {
        Ok(v) => v,
        Err(e) => {
            complete(executor, id, Some(e));
            return;
        }
    };
    let operation_id = match crate::json::operation_id(&decoded) {
        Ok(v) => v,
        Err(e) => {
            complete(executor, id, Some(e));
            return;
        }
    };
    let status = match crate::json::registration_status(&decoded) {
        Ok(v) => v,
        Err(e) => {
            complete(executor, id, Some(e));
            return;
        }
    };

    let still_assigning = status_code >= 429 || status.as_deref() == Some("assigning");
    if still_assigning {
        let interval = crate::retry::interval_or_default(retry_after.as_deref(), executor.config.polling_interval);
        if let Some(poll) = executor.polls.get_mut(&id) {
            tracing::debug!(id = %id, ?interval, "still assigning, scheduling next poll");
            crate::pipeline::arm_timer(
                &mut poll.timers.polling,
                executor.handle.clone(),
                interval,
                Event::PollRetryFired { id, generation },
            );
        }
        return;
    }

    match status.as_deref().and_then(RegistrationStatus::parse) {
        Some(parsed) => match form_complete_result(operation_id, &decoded, parsed) {
            Ok(result) => {
                let failed = matches!(parsed, RegistrationStatus::Failed);
                if let Some(poll) = executor.polls.get_mut(&id) {
                    poll.registration_result = Some(result);
                }
                if failed {
                    complete(
                        executor,
                        id,
                        Some(ProvisioningError::RegistrationFailed {
                            request_type: RequestType::Query,
                            status_code,
                        }),
                    );
                } else {
                    complete(executor, id, None);
                }
            }
            Err(e) => complete(executor, id, Some(e)),
        },
        None => complete(
            executor,
            id,
            Some(ProvisioningError::InvalidStatus {
                request_type: RequestType::Query,
                status,
                status_code,
            }),
        ),
    }
}
