//! The wire unit exchanged between the two sides, plus the per-session
//! message id generator.
//!
//! Serialized shape, field for field:
//!
//! ```text
//! {
//!   id: string,
//!   type: "request" | "response" | "notification" | "ack" | "error",
//!   command: string,
//!   data?: any,
//!   timestamp: number,
//!   requestId?: string,      // response, ack
//!   success?: boolean,       // response
//!   error?: string,          // response (on failure), error
//!   expectResponse?: boolean,// request
//!   timeout?: number         // request
//! }
//! ```

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::command::Command;

#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Kind {
    Request,
    Response,
    Notification,
    Ack,
    Error,
}

impl Kind {
    fn parse(s: &str) -> Option<Self> {
        match s {
            "request" => Some(Self::Request),
            "response" => Some(Self::Response),
            "notification" => Some(Self::Notification),
            "ack" => Some(Self::Ack),
            "error" => Some(Self::Error),
            _ => None,
        }
    }
}

/// Why an inbound value was dropped before dispatch.
#[derive(Debug, Eq, PartialEq)]
pub enum InvalidEnvelope {
    NotAnObject,
    MissingField(&'static str),
    UnknownKind(String),
}

impl fmt::Display for InvalidEnvelope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotAnObject => write!(f, "not an object"),
            Self::MissingField(field) => write!(f, "missing required field: {field}"),
            Self::UnknownKind(kind) => write!(f, "unknown message type: {kind}"),
        }
    }
}

/// One protocol message. Immutable; lives for a single send or dispatch.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct Envelope {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: Kind,
    pub command: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
    pub timestamp: u64,
    #[serde(rename = "requestId", skip_serializing_if = "Option::is_none")]
    pub request_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub success: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(rename = "expectResponse", skip_serializing_if = "Option::is_none")]
    pub expect_response: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeout: Option<u64>,
}

impl Envelope {
    fn bare(id: String, kind: Kind, command: String) -> Self {
        Self {
            id,
            kind,
            command,
            data: None,
            timestamp: now_ms(),
            request_id: None,
            success: None,
            error: None,
            expect_response: None,
            timeout: None,
        }
    }

    pub fn request(id: String, command: Command, data: Option<Value>, timeout_ms: u64) -> Self {
        Self {
            data,
            expect_response: Some(true),
            timeout: Some(timeout_ms),
            ..Self::bare(id, Kind::Request, command.as_str().to_owned())
        }
    }

    pub fn notification(id: String, command: Command, data: Option<Value>) -> Self {
        Self {
            data,
            ..Self::bare(id, Kind::Notification, command.as_str().to_owned())
        }
    }

    /// Successful response correlated to a previously received request.
    pub fn response_ok(id: String, request: &Envelope, data: Option<Value>) -> Self {
        Self {
            data,
            request_id: Some(request.id.clone()),
            success: Some(true),
            ..Self::bare(id, Kind::Response, request.command.clone())
        }
    }

    pub fn response_err(id: String, request: &Envelope, error: String) -> Self {
        Self {
            request_id: Some(request.id.clone()),
            success: Some(false),
            error: Some(error),
            ..Self::bare(id, Kind::Response, request.command.clone())
        }
    }

    /// Best-effort echo that refreshes the sender's liveness view.
    pub fn ack(id: String, request: &Envelope) -> Self {
        Self {
            request_id: Some(request.id.clone()),
            ..Self::bare(id, Kind::Ack, request.command.clone())
        }
    }

    /// Strict inbound validation. A value that is not an object, or an object
    /// missing `id`/`type`/`command`/`timestamp`, or one carrying an unknown
    /// `type`, must be dropped without side effects.
    pub fn from_value(value: &Value) -> Result<Self, InvalidEnvelope> {
        let obj = value.as_object().ok_or(InvalidEnvelope::NotAnObject)?;

        let id = obj
            .get("id")
            .and_then(Value::as_str)
            .ok_or(InvalidEnvelope::MissingField("id"))?
            .to_owned();
        let kind_str = obj
            .get("type")
            .and_then(Value::as_str)
            .ok_or(InvalidEnvelope::MissingField("type"))?;
        let command = obj
            .get("command")
            .and_then(Value::as_str)
            .ok_or(InvalidEnvelope::MissingField("command"))?
            .to_owned();
        let timestamp = obj
            .get("timestamp")
            .and_then(Value::as_u64)
            .ok_or(InvalidEnvelope::MissingField("timestamp"))?;

        let kind = Kind::parse(kind_str)
            .ok_or_else(|| InvalidEnvelope::UnknownKind(kind_str.to_owned()))?;

        Ok(Self {
            id,
            kind,
            command,
            data: obj.get("data").cloned(),
            timestamp,
            request_id: obj
                .get("requestId")
                .and_then(Value::as_str)
                .map(str::to_owned),
            success: obj.get("success").and_then(Value::as_bool),
            error: obj.get("error").and_then(Value::as_str).map(str::to_owned),
            expect_response: obj.get("expectResponse").and_then(Value::as_bool),
            timeout: obj.get("timeout").and_then(Value::as_u64),
        })
    }
}

/// Generates ids unique within one sender session: a monotonic counter
/// combined with a random session suffix. The zero-padded counter comes
/// first so lexicographic order equals creation order.
pub struct MessageIdGen {
    counter: AtomicU64,
    session: u32,
}

impl MessageIdGen {
    pub fn new() -> Self {
        Self {
            counter: AtomicU64::new(0),
            session: rand::random(),
        }
    }

    pub fn next(&self) -> String {
        let n = self.counter.fetch_add(1, Ordering::Relaxed) + 1;
        format!("{n:012x}-{:08x}", self.session)
    }
}

impl Default for MessageIdGen {
    fn default() -> Self {
        Self::new()
    }
}

pub fn now_ms() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}
