//! A scripted [`Transport`] double for end-to-end pipeline tests
//! (spec.md §8's scenario list), in the teacher's style of exercising a
//! trait boundary with a hand-rolled fake rather than a mocking crate.

use async_trait::async_trait;
use dps_provisioning::transport::{Transport, TransportRequest, TransportResponse};
use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::Duration;

pub enum Step {
    Response(TransportResponse),
    /// Sleep for `Duration`, then return `TransportResponse`. Used to
    /// simulate a slow/hanging server for timeout and cancellation
    /// tests.
    Hang(Duration, TransportResponse),
}

pub fn response(status_code: u16, body: &str) -> TransportResponse {
    TransportResponse {
        status_code,
        retry_after: None,
        response_body: body.as_bytes().to_vec(),
    }
}

pub fn throttled(status_code: u16, retry_after: &str, body: &str) -> TransportResponse {
    TransportResponse {
        status_code,
        retry_after: Some(retry_after.to_string()),
        response_body: body.as_bytes().to_vec(),
    }
}

/// Replays `Step`s in order, one per `send` call, regardless of which
/// request (register or query) triggered it — every scenario in this
/// test suite only ever has one request in flight at a time.
pub struct ScriptedTransport {
    steps: Mutex<VecDeque<Step>>,
}

impl ScriptedTransport {
    pub fn new(steps: Vec<Step>) -> Self {
        Self {
            steps: Mutex::new(steps.into()),
        }
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn send(
        &self,
        _request: TransportRequest,
    ) -> Result<TransportResponse, Box<dyn std::error::Error + Send + Sync + 'static>> {
        let step = self.steps.lock().unwrap().pop_front();
        match step {
            Some(Step::Response(resp)) => Ok(resp),
            Some(Step::Hang(delay, resp)) => {
                tokio::time::sleep(delay).await;
                Ok(resp)
            }
            None => Err("scripted transport ran out of steps".into()),
        }
    }
}

/// A transport whose every call fails at the transport layer.
pub struct FailingTransport;

#[async_trait]
impl Transport for FailingTransport {
    async fn send(
        &self,
        _request: TransportRequest,
    ) -> Result<TransportResponse, Box<dyn std::error::Error + Send + Sync + 'static>> {
        Err("connection refused".into())
    }
}
