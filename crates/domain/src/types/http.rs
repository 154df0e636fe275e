//! Transport-neutral request/response types and flush reporting

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::conflict::ClassifiedConflict;
use super::mutation::{HttpMethod, MutationRequest};
use crate::constants::{CONTENT_TYPE_JSON, HEADER_CONTENT_TYPE};

/// A single HTTP call as handed to a transport.
#[derive(Debug, Clone, PartialEq)]
pub struct OutboundRequest {
    pub method: HttpMethod,
    pub target: String,
    pub headers: Vec<(String, String)>,
    pub body: Option<Value>,
}

impl OutboundRequest {
    /// JSON request with only the `Content-Type` header set.
    pub fn json(method: HttpMethod, target: impl Into<String>, body: Option<Value>) -> Self {
        Self {
            method,
            target: target.into(),
            headers: vec![(HEADER_CONTENT_TYPE.to_owned(), CONTENT_TYPE_JSON.to_owned())],
            body,
        }
    }

    /// Case-insensitive header lookup; the last value set wins.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .rev()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    #[must_use]
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }
}

impl From<&MutationRequest> for OutboundRequest {
    /// Immediate execution keeps the caller's headers on top of the JSON
    /// content type.
    fn from(request: &MutationRequest) -> Self {
        let mut outbound = Self::json(request.method, request.target.clone(), request.body.clone());
        outbound.headers.extend(request.headers.iter().cloned());
        outbound
    }
}

/// How a status code is handled by the gate and the replay engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusClass {
    /// 2xx
    Success,
    /// 409 or 412
    Conflict,
    /// 502, 503 or 504
    GatewayTransient,
    /// Any other 4xx
    ClientRejection,
    /// Everything else, including 500 and stray 1xx/3xx codes
    Retryable,
}

impl StatusClass {
    pub const fn of(status: u16) -> Self {
        match status {
            200..=299 => Self::Success,
            409 | 412 => Self::Conflict,
            502..=504 => Self::GatewayTransient,
            400..=499 => Self::ClientRejection,
            _ => Self::Retryable,
        }
    }
}

/// Status and raw body of a completed HTTP exchange.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct HttpResponse {
    pub status: u16,
    pub body: Vec<u8>,
}

impl HttpResponse {
    pub const fn new(status: u16) -> Self {
        Self { status, body: Vec::new() }
    }

    #[must_use]
    pub fn with_body(mut self, body: impl Into<Vec<u8>>) -> Self {
        self.body = body.into();
        self
    }

    pub const fn class(&self) -> StatusClass {
        StatusClass::of(self.status)
    }

    pub const fn is_success(&self) -> bool {
        matches!(self.class(), StatusClass::Success)
    }

    pub const fn is_conflict(&self) -> bool {
        matches!(self.class(), StatusClass::Conflict)
    }

    pub fn body_text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

/// Result of routing a write through the enqueue gate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnqueueOutcome {
    /// True when the write was deferred into the durable queue.
    pub queued: bool,
    /// The server's answer, when one was received.
    pub response: Option<HttpResponse>,
}

impl EnqueueOutcome {
    /// Deferred without a server answer (offline or transport failure).
    pub const fn deferred() -> Self {
        Self { queued: true, response: None }
    }

    /// Deferred after a transient gateway answer.
    pub const fn deferred_with(response: HttpResponse) -> Self {
        Self { queued: true, response: Some(response) }
    }

    /// Delivered (or definitively rejected) and not queued.
    pub const fn completed(response: HttpResponse) -> Self {
        Self { queued: false, response: Some(response) }
    }
}

/// Per-pass replay statistics.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FlushSummary {
    /// Items for which a send was started.
    pub processed: usize,
    pub succeeded: usize,
    /// Items dropped after a non-conflict 4xx.
    pub failed: usize,
    /// 409/412 answers seen, one per item regardless of the retry outcome.
    pub conflicts: usize,
    /// Items dropped after reaching the attempt ceiling.
    pub abandoned: usize,
    /// Queue length after the pass.
    pub remaining: usize,
    /// Per-item conflicts reported inside successful batch sync responses.
    #[serde(default)]
    pub reported_conflicts: Vec<ClassifiedConflict>,
}

impl FlushSummary {
    /// Summary of a pass that sent nothing.
    pub fn idle(remaining: usize) -> Self {
        Self { remaining, ..Self::default() }
    }
}
