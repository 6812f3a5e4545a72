//! The operation data model (spec.md §3), realized as arena entries owned
//! exclusively by [`crate::pipeline`]'s executor task rather than as
//! free-standing objects passed around with weak back-references.

use crate::model::RegistrationResult;
use crate::error::ProvisioningError;
use crate::timer::TimerHandle;
use serde_json::Value;
use tokio::sync::oneshot;
use uuid::Uuid;

/// A locally- or service-assigned operation identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct OperationId(Uuid);

impl OperationId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for OperationId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for OperationId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The three independent one-shot timers an operation may own at once
/// (spec.md §3: "Owns its timers; they are released on any terminal
/// transition"). Invariant: `retry_after` and `polling` are mutually
/// exclusive for a given operation — the stages never arm both.
#[derive(Debug, Default)]
pub struct TimerBag {
    pub timeout: TimerHandle,
    pub retry_after: TimerHandle,
    pub polling: TimerHandle,
}

impl TimerBag {
    /// Cancel and release every timer. Called on any terminal transition.
    pub fn cancel_all(&mut self) {
        self.timeout.cancel();
        self.retry_after.cancel();
        self.polling.cancel();
    }
}

/// The root user-visible operation (spec.md §3).
pub struct RegisterOperation {
    pub id: OperationId,
    pub registration_id: String,
    pub request_payload: Option<Value>,
    pub registration_result: Option<RegistrationResult>,
    pub error: Option<ProvisioningError>,
    pub timers: TimerBag,
    /// Bumped on every re-entry (retry-after fire, re-run). Timer-fired
    /// events carry the generation they were armed with; the executor
    /// drops events whose generation no longer matches.
    pub generation: u64,
    /// Monotonic completion flag, checked at the top of every handler in
    /// addition to the generation check (spec.md §5).
    pub completed: bool,
    /// The in-flight worker op spawned for the "assigning" handoff, if
    /// any. `None` once the poll operation is no longer needed.
    pub poll_worker: Option<OperationId>,
    /// Resolved exactly once, when this operation reaches a terminal
    /// state.
    pub completion: Option<oneshot::Sender<Result<RegistrationResult, ProvisioningError>>>,
}

impl RegisterOperation {
    pub fn new(
        registration_id: String,
        request_payload: Option<Value>,
        completion: oneshot::Sender<Result<RegistrationResult, ProvisioningError>>,
    ) -> Self {
        Self {
            id: OperationId::new(),
            registration_id,
            request_payload,
            registration_result: None,
            error: None,
            timers: TimerBag::default(),
            generation: 0,
            completed: false,
            poll_worker: None,
            completion: Some(completion),
        }
    }

    /// Mark terminal: cancel every timer, record the error (if any), and
    /// resolve the caller's completion channel exactly once.
    pub fn complete(&mut self, error: Option<ProvisioningError>) {
        if self.completed {
            return;
        }
        self.completed = true;
        self.timers.cancel_all();
        self.error = error;
        if let Some(sender) = self.completion.take() {
            let outcome = match self.error.take() {
                Some(err) => Err(err),
                None => self
                    .registration_result
                    .clone()
                    .ok_or(ProvisioningError::Cancelled),
            };
            let _ = sender.send(outcome);
        }
    }
}

/// A worker operation spawned by the Registration Stage on "assigning"
/// (spec.md §3). Its completion propagates `registration_result` and the
/// terminal error (if any) back to `parent` via the executor (the arena
/// performs the "copy callback" the Python original implements with a
/// closure) — see `stages::polling::complete`.
pub struct PollStatusOperation {
    pub id: OperationId,
    pub parent: OperationId,
    /// The service-assigned operation id to poll, distinct from `id`
    /// (spec.md §3: "operation_id (assigned by the service)").
    pub operation_id: String,
    pub registration_result: Option<RegistrationResult>,
    pub timers: TimerBag,
    /// Unlike [`RegisterOperation`], this has no separate `completed`
    /// flag: a poll operation is removed from the executor's arena the
    /// moment it reaches a terminal state, so map membership itself is
    /// the completion signal (see `stages::polling::is_current`).
    pub generation: u64,
}

impl PollStatusOperation {
    pub fn new(parent: OperationId, operation_id: String) -> Self {
        Self {
            id: OperationId::new(),
            parent,
            operation_id,
            registration_result: None,
            timers: TimerBag::default(),
            generation: 0,
        }
    }
}
