//! The channel contract required from the hosting environment: a synchronous
//! send primitive for serializable values. The inbound half is a plain
//! `mpsc::UnboundedReceiver` handed to the bridge constructor, which owns the
//! single inbound listener and drops it on dispose.

use serde_json::Value;
use tokio::sync::mpsc;

use crate::error::BridgeError;

/// Hands one serializable value to the other side. No assumptions about
/// reliability, latency, or ordering beyond "eventually delivered if at all".
/// A failure here is the one error category the bridge never absorbs.
pub trait MessagePort: Send + Sync + 'static {
    fn post(&self, value: Value) -> Result<(), BridgeError>;
}

impl<F> MessagePort for F
where
    F: Fn(Value) -> Result<(), BridgeError> + Send + Sync + 'static,
{
    fn post(&self, value: Value) -> Result<(), BridgeError> {
        self(value)
    }
}

/// In-process port backed by an unbounded channel. `post` fails once the far
/// receiver is gone, which is how a torn-down peer surfaces synchronously.
pub struct ValuePort {
    tx: mpsc::UnboundedSender<Value>,
}

impl ValuePort {
    pub fn new(tx: mpsc::UnboundedSender<Value>) -> Self {
        Self { tx }
    }
}

impl MessagePort for ValuePort {
    fn post(&self, value: Value) -> Result<(), BridgeError> {
        self.tx
            .send(value)
            .map_err(|_| BridgeError::Channel("receiver closed".into()))
    }
}

/// One side of an in-process duplex: the port posting toward the peer and
/// the receiver carrying the peer's traffic back.
pub type PortHalf = (ValuePort, mpsc::UnboundedReceiver<Value>);

/// Builds two linked halves for wiring a host and a surface in one process.
pub fn pair() -> (PortHalf, PortHalf) {
    let (to_surface, from_host) = mpsc::unbounded_channel();
    let (to_host, from_surface) = mpsc::unbounded_channel();
    (
        (ValuePort::new(to_surface), from_surface),
        (ValuePort::new(to_host), from_host),
    )
}
