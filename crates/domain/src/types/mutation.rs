//! Queued mutation records and the caller-facing request shape

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

/// HTTP verb of a write request. Reads are never queued.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HttpMethod {
    #[default]
    Post,
    Put,
    Patch,
    Delete,
}

impl HttpMethod {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Post => "POST",
            Self::Put => "PUT",
            Self::Patch => "PATCH",
            Self::Delete => "DELETE",
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for HttpMethod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "POST" => Ok(Self::Post),
            "PUT" => Ok(Self::Put),
            "PATCH" => Ok(Self::Patch),
            "DELETE" => Ok(Self::Delete),
            _ => Err(format!("Invalid HttpMethod: {s}")),
        }
    }
}

/// Opaque identifier of a queued mutation, unique among all queued items.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MutationId(String);

impl MutationId {
    /// Generate a fresh, time-ordered identifier.
    pub fn new() -> Self {
        Self(Uuid::now_v7().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for MutationId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for MutationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for MutationId {
    fn from(value: &str) -> Self {
        Self(value.to_owned())
    }
}

impl From<String> for MutationId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// A deferred write awaiting replay.
///
/// Only the target, method and body are retained from the caller's request;
/// caller-supplied headers are never persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueuedMutation {
    pub id: MutationId,
    pub target: String,
    #[serde(default)]
    pub method: HttpMethod,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<Value>,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub attempts: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_error: Option<String>,
}

impl QueuedMutation {
    /// Build a fresh queue record (new id, `attempts = 0`) from a request.
    pub fn from_request(request: &MutationRequest) -> Self {
        Self {
            id: MutationId::new(),
            target: request.target.clone(),
            method: request.method,
            body: request.body.clone(),
            created_at: Utc::now(),
            attempts: 0,
            last_error: None,
        }
    }

    /// Count one more failed replay and remember why.
    pub fn record_failure(&mut self, reason: impl Into<String>) {
        self.attempts = self.attempts.saturating_add(1);
        self.last_error = Some(reason.into());
    }

    pub const fn has_exhausted(&self, max_attempts: u32) -> bool {
        self.attempts >= max_attempts
    }
}

/// A write as issued by application code.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct MutationRequest {
    pub target: String,
    pub method: HttpMethod,
    pub body: Option<Value>,
    pub headers: Vec<(String, String)>,
}

impl MutationRequest {
    /// A `POST` to `target` with no body.
    pub fn new(target: impl Into<String>) -> Self {
        Self { target: target.into(), ..Self::default() }
    }

    #[must_use]
    pub const fn with_method(mut self, method: HttpMethod) -> Self {
        self.method = method;
        self
    }

    #[must_use]
    pub fn with_body(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }

    #[must_use]
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }
}
