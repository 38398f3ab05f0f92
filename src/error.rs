use std::fmt;

/// Errors produced by bridge operations.
///
/// Everything that happens inside inbound dispatch is contained (logged or
/// turned into a structured response envelope) and never surfaces here; the
/// variants below are what outbound call sites and settled requests observe.
#[derive(Debug)]
pub enum BridgeError {
    /// No response arrived within the request's timeout window.
    Timeout { command: String },
    /// The bridge was disposed while the request was still pending, or an
    /// operation was attempted on an already-disposed bridge.
    Disposed,
    /// The channel's send primitive failed. Deliberately not absorbed so the
    /// caller can detect a dead channel immediately instead of waiting for a
    /// timeout.
    Channel(String),
    /// The other side answered with `success: false`.
    Remote(String),
    InvalidConfig(String),
    Serialization(serde_json::Error),
}

impl fmt::Display for BridgeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Timeout { command } => write!(f, "Request timeout: {command}"),
            Self::Disposed => write!(f, "bridge disposed"),
            Self::Channel(msg) => write!(f, "channel unavailable: {msg}"),
            Self::Remote(msg) => write!(f, "request failed: {msg}"),
            Self::InvalidConfig(msg) => write!(f, "invalid config: {msg}"),
            Self::Serialization(err) => write!(f, "serialization error: {err}"),
        }
    }
}

impl std::error::Error for BridgeError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Serialization(err) => Some(err),
            _ => None,
        }
    }
}

impl From<serde_json::Error> for BridgeError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err)
    }
}
