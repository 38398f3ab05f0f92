//! The manager core shared by both sides of the bridge: outbound send paths,
//! the single inbound dispatcher, periodic keep-alive/sync tasks, and
//! teardown. `HostBridge` and `SurfaceBridge` are thin facades over this.

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use serde_json::Value;
use tokio::sync::{mpsc, oneshot};
use tokio_util::sync::CancellationToken;

use crate::command::Command;
use crate::config::BridgeConfig;
use crate::envelope::{Envelope, Kind, MessageIdGen};
use crate::error::BridgeError;
use crate::liveness::Liveness;
use crate::pending::{PendingRequest, PendingTable};
use crate::port::MessagePort;
use crate::registry::{Handler, HandlerRegistry};

/// Which side of the channel this manager drives. Determines log fields and
/// which periodic tasks run (the host additionally emits sync cues).
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Role {
    Host,
    Surface,
}

impl Role {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Host => "host",
            Self::Surface => "surface",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Everything the inbound dispatcher and its spawned handler tasks need.
/// All fields are instance-scoped; nothing is shared across bridges.
#[derive(Clone)]
struct DispatchCtx {
    role: Role,
    port: Arc<dyn MessagePort>,
    ids: Arc<MessageIdGen>,
    pending: Arc<PendingTable>,
    registry: Arc<HandlerRegistry>,
    liveness: Arc<Liveness>,
}

pub struct Bridge {
    role: Role,
    config: BridgeConfig,
    port: Arc<dyn MessagePort>,
    ids: Arc<MessageIdGen>,
    pending: Arc<PendingTable>,
    registry: Arc<HandlerRegistry>,
    liveness: Arc<Liveness>,
    shutdown: CancellationToken,
    disposed: AtomicBool,
}

impl Bridge {
    /// Wraps the environment's channel primitives: `port` is the send half,
    /// `inbound` carries the other side's traffic. Spawns the dispatcher and
    /// the periodic tasks; everything stops when [`Bridge::dispose`] runs.
    pub fn new(
        role: Role,
        port: impl MessagePort,
        inbound: mpsc::UnboundedReceiver<Value>,
        config: BridgeConfig,
    ) -> Result<Self, BridgeError> {
        config.validate()?;

        let port: Arc<dyn MessagePort> = Arc::new(port);
        let ids = Arc::new(MessageIdGen::new());
        let pending = Arc::new(PendingTable::new());
        let registry = Arc::new(HandlerRegistry::new());
        let liveness = Arc::new(Liveness::new(config.heartbeat_interval()));
        let shutdown = CancellationToken::new();

        let ctx = DispatchCtx {
            role,
            port: Arc::clone(&port),
            ids: Arc::clone(&ids),
            pending: Arc::clone(&pending),
            registry: Arc::clone(&registry),
            liveness: Arc::clone(&liveness),
        };
        spawn_dispatch(ctx, inbound, shutdown.clone());

        spawn_periodic_notification(
            role,
            Command::Heartbeat,
            config.heartbeat_interval(),
            Arc::clone(&port),
            Arc::clone(&ids),
            shutdown.clone(),
        );
        if role == Role::Host {
            spawn_periodic_notification(
                role,
                Command::Sync,
                config.sync_interval(),
                Arc::clone(&port),
                Arc::clone(&ids),
                shutdown.clone(),
            );
        }

        tracing::info!(role = %role, "bridge initialized");

        Ok(Self {
            role,
            config,
            port,
            ids,
            pending,
            registry,
            liveness,
            shutdown,
            disposed: AtomicBool::new(false),
        })
    }

    pub fn role(&self) -> Role {
        self.role
    }

    /// Fire-and-forget. A port failure propagates straight back so the
    /// caller can detect a broken channel without waiting on a timeout.
    pub fn send_notification(
        &self,
        command: Command,
        data: Option<Value>,
    ) -> Result<(), BridgeError> {
        if self.disposed.load(Ordering::SeqCst) {
            return Err(BridgeError::Disposed);
        }
        let envelope = Envelope::notification(self.ids.next(), command, data);
        self.port.post(serde_json::to_value(&envelope)?)
    }

    /// Sends a request expecting a response and suspends until a matching
    /// response arrives, the timeout fires, or the bridge is disposed.
    /// `timeout` falls back to the configured default.
    pub async fn send_request(
        &self,
        command: Command,
        data: Option<Value>,
        timeout: Option<Duration>,
    ) -> Result<Option<Value>, BridgeError> {
        if self.disposed.load(Ordering::SeqCst) {
            return Err(BridgeError::Disposed);
        }

        let timeout = timeout.unwrap_or_else(|| self.config.default_timeout());
        let id = self.ids.next();
        let envelope = Envelope::request(id.clone(), command, data, timeout.as_millis() as u64);
        let value = serde_json::to_value(&envelope)?;

        let (tx, rx) = oneshot::channel();
        let timer = {
            let pending = Arc::clone(&self.pending);
            let role = self.role;
            let id = id.clone();
            tokio::spawn(async move {
                tokio::time::sleep(timeout).await;
                if let Some(entry) = pending.take(&id) {
                    let command = entry.command.as_str().to_owned();
                    tracing::warn!(role = %role, %command, id = %id, "request timed out");
                    entry.settle(Err(BridgeError::Timeout { command }));
                }
            })
        };
        self.pending
            .insert(id.clone(), PendingRequest::new(command, tx, timer));

        if let Err(e) = self.port.post(value) {
            // channel failure goes straight to the caller, never a settle
            if let Some(entry) = self.pending.take(&id) {
                entry.cancel();
            }
            return Err(e);
        }

        match rx.await {
            Ok(outcome) => outcome,
            // settle handle dropped without firing; only dispose can race us here
            Err(_) => Err(BridgeError::Disposed),
        }
    }

    pub fn register_request_handler(&self, command: Command, handler: Handler) {
        self.registry.register_request(command, handler);
    }

    pub fn register_notification_handler(&self, command: Command, handler: Handler) {
        self.registry.register_notification(command, handler);
    }

    /// Removes both handler slots for the command.
    pub fn unregister_handler(&self, command: Command) {
        self.registry.unregister(command);
    }

    /// Derived from inbound-traffic recency, never stored: true iff a valid
    /// envelope arrived within twice the heartbeat interval.
    pub fn is_connected(&self) -> bool {
        !self.disposed.load(Ordering::SeqCst) && self.liveness.is_connected()
    }

    /// Idempotent teardown: stops the dispatcher and periodic tasks, rejects
    /// every still-pending request with [`BridgeError::Disposed`] (aborting
    /// its timer), and resets liveness. A second call does nothing.
    pub fn dispose(&self) {
        if self.disposed.swap(true, Ordering::SeqCst) {
            return;
        }
        self.shutdown.cancel();

        let drained = self.pending.drain();
        if !drained.is_empty() {
            tracing::debug!(
                role = %self.role,
                count = drained.len(),
                "rejecting pending requests on dispose"
            );
        }
        for (_, entry) in drained {
            entry.settle(Err(BridgeError::Disposed));
        }

        self.liveness.reset();
        tracing::info!(role = %self.role, "bridge disposed");
    }
}

impl Drop for Bridge {
    fn drop(&mut self) {
        self.dispose();
    }
}

/// The single inbound listener. Exits (dropping the receiver) when the
/// bridge is disposed or the channel closes.
fn spawn_dispatch(
    ctx: DispatchCtx,
    mut inbound: mpsc::UnboundedReceiver<Value>,
    shutdown: CancellationToken,
) {
    tokio::spawn(async move {
        loop {
            tokio::select! {
                _ = shutdown.cancelled() => break,
                value = inbound.recv() => {
                    let Some(value) = value else { break };
                    dispatch(&ctx, value);
                }
            }
        }
    });
}

/// Classifies one inbound value. Contained by construction: every failure
/// path ends in a log line, never an escape out of the dispatch loop.
fn dispatch(ctx: &DispatchCtx, value: Value) {
    let envelope = match Envelope::from_value(&value) {
        Ok(envelope) => envelope,
        Err(reason) => {
            tracing::warn!(role = %ctx.role, %reason, "dropping invalid inbound message");
            return;
        }
    };

    // any valid inbound envelope is liveness evidence
    ctx.liveness.touch();

    match envelope.kind {
        Kind::Request => handle_request(ctx, envelope),
        Kind::Response => handle_response(ctx, envelope),
        Kind::Notification => handle_notification(ctx, envelope),
        Kind::Ack => {
            tracing::debug!(role = %ctx.role, id = %envelope.id, "ack received");
        }
        Kind::Error => {
            tracing::warn!(
                role = %ctx.role,
                command = %envelope.command,
                error = envelope.error.as_deref().unwrap_or(""),
                "peer reported an error"
            );
        }
    }
}

/// Acks immediately, then runs the request handler in its own task so a slow
/// handler never blocks dispatch. A response is only posted when the request
/// asked for one.
fn handle_request(ctx: &DispatchCtx, envelope: Envelope) {
    let ack = Envelope::ack(ctx.ids.next(), &envelope);
    match serde_json::to_value(&ack) {
        Ok(value) => {
            if let Err(e) = ctx.port.post(value) {
                tracing::debug!(role = %ctx.role, error = %e, "ack send failed");
            }
        }
        Err(e) => tracing::warn!(role = %ctx.role, error = %e, "ack serialization failed"),
    }

    let handler = Command::parse(&envelope.command).and_then(|c| ctx.registry.request_handler(c));
    let expects_response = envelope.expect_response.unwrap_or(false);
    let ctx = ctx.clone();

    tokio::spawn(async move {
        let outcome = match handler {
            Some(h) => h(envelope.data.clone()).await,
            None => Err(format!("No handler for command: {}", envelope.command)),
        };

        if !expects_response {
            if let Err(error) = outcome {
                tracing::warn!(
                    role = %ctx.role,
                    command = %envelope.command,
                    %error,
                    "request handler failed (no response expected)"
                );
            }
            return;
        }

        let response = match outcome {
            Ok(data) => Envelope::response_ok(ctx.ids.next(), &envelope, data),
            Err(error) => {
                tracing::warn!(
                    role = %ctx.role,
                    command = %envelope.command,
                    %error,
                    "request handler failed"
                );
                Envelope::response_err(ctx.ids.next(), &envelope, error)
            }
        };
        match serde_json::to_value(&response) {
            Ok(value) => {
                if let Err(e) = ctx.port.post(value) {
                    tracing::warn!(role = %ctx.role, command = %envelope.command, error = %e, "response send failed");
                }
            }
            Err(e) => {
                tracing::warn!(role = %ctx.role, error = %e, "response serialization failed");
            }
        }
    });
}

fn handle_response(ctx: &DispatchCtx, envelope: Envelope) {
    let Some(request_id) = envelope.request_id.as_deref() else {
        tracing::warn!(role = %ctx.role, id = %envelope.id, "response missing requestId");
        return;
    };

    let Some(entry) = ctx.pending.take(request_id) else {
        // duplicate delivery or a response that raced its own timeout
        tracing::warn!(role = %ctx.role, id = %request_id, "response for unknown request");
        return;
    };

    let outcome = if envelope.success.unwrap_or(false) {
        Ok(envelope.data)
    } else {
        Err(BridgeError::Remote(
            envelope.error.unwrap_or_else(|| "Request failed".to_owned()),
        ))
    };
    entry.settle(outcome);
}

/// A notification is observed by both the notification handler and the
/// request handler for its command, independently: one failing (or missing)
/// never affects the other, and neither ever produces a response.
fn handle_notification(ctx: &DispatchCtx, envelope: Envelope) {
    let Some(command) = Command::parse(&envelope.command) else {
        tracing::warn!(role = %ctx.role, command = %envelope.command, "notification for unknown command");
        return;
    };

    let slots = [
        ("notification", ctx.registry.notification_handler(command)),
        ("request", ctx.registry.request_handler(command)),
    ];
    for (slot, handler) in slots {
        let Some(handler) = handler else { continue };
        let role = ctx.role;
        let data = envelope.data.clone();
        tokio::spawn(async move {
            if let Err(error) = handler(data).await {
                tracing::warn!(role = %role, command = %command, slot, %error, "notification handler failed");
            }
        });
    }
}

/// Periodic keep-alive (and, host-side, sync) emitter. Send failures are
/// expected while the other side is down and only logged.
fn spawn_periodic_notification(
    role: Role,
    command: Command,
    period: Duration,
    port: Arc<dyn MessagePort>,
    ids: Arc<MessageIdGen>,
    shutdown: CancellationToken,
) {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(period);
        loop {
            tokio::select! {
                _ = shutdown.cancelled() => break,
                _ = interval.tick() => {
                    let envelope = Envelope::notification(ids.next(), command, None);
                    match serde_json::to_value(&envelope) {
                        Ok(value) => {
                            if let Err(e) = port.post(value) {
                                tracing::debug!(role = %role, command = %command, error = %e, "periodic notification failed");
                            }
                        }
                        Err(e) => {
                            tracing::warn!(role = %role, command = %command, error = %e, "periodic notification serialization failed");
                        }
                    }
                }
            }
        }
    });
}
