//! Bidirectional command bridge between a privileged host process and a
//! sandboxed UI surface.
//!
//! Both sides speak the same envelope protocol over a caller-supplied
//! [`MessagePort`]: requests carry a correlation id and settle with the
//! matching response or a timeout, notifications are fire-and-forget, and
//! periodic heartbeats let each side derive connectivity from traffic
//! recency instead of stored state. Handlers run in their own tasks, so one
//! failing handler never takes down dispatch or its sibling handlers.
//!
//! [`HostBridge`] and [`SurfaceBridge`] are thin role facades over the same
//! core; wire them to real channel endpoints in production or to
//! [`pair`] for in-process tests.

mod bridge;
mod command;
mod config;
mod envelope;
mod error;
mod liveness;
mod pending;
mod port;
mod registry;

pub mod host;
pub mod surface;

pub use bridge::{Bridge, Role};
pub use command::Command;
pub use config::BridgeConfig;
pub use envelope::{Envelope, InvalidEnvelope, Kind, MessageIdGen};
pub use error::BridgeError;
pub use host::HostBridge;
pub use port::{pair, MessagePort, PortHalf, ValuePort};
pub use registry::{handler, Handler, HandlerFuture, HandlerResult};
pub use surface::SurfaceBridge;
