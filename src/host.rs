//! Privileged-side facade. Owns a [`Bridge`] in the [`Role::Host`] role and
//! exposes the host's half of the command vocabulary as typed methods.

use std::time::Duration;

use serde_json::Value;
use tokio::sync::mpsc;

use crate::bridge::{Bridge, Role};
use crate::command::Command;
use crate::config::BridgeConfig;
use crate::error::BridgeError;
use crate::port::MessagePort;
use crate::registry::Handler;

pub struct HostBridge {
    core: Bridge,
}

impl HostBridge {
    pub fn new(
        port: impl MessagePort,
        inbound: mpsc::UnboundedReceiver<Value>,
        config: BridgeConfig,
    ) -> Result<Self, BridgeError> {
        Ok(Self {
            core: Bridge::new(Role::Host, port, inbound, config)?,
        })
    }

    /// Pushes a full table snapshot to the surface without waiting for it.
    pub fn push_table(&self, table: Value) -> Result<(), BridgeError> {
        self.core.send_notification(Command::UpdateTable, Some(table))
    }

    /// Pushes the current theme so the surface can restyle itself.
    pub fn push_theme(&self, theme: Value) -> Result<(), BridgeError> {
        self.core.send_notification(Command::UpdateTheme, Some(theme))
    }

    pub fn send_notification(
        &self,
        command: Command,
        data: Option<Value>,
    ) -> Result<(), BridgeError> {
        self.core.send_notification(command, data)
    }

    pub async fn send_request(
        &self,
        command: Command,
        data: Option<Value>,
        timeout: Option<Duration>,
    ) -> Result<Option<Value>, BridgeError> {
        self.core.send_request(command, data, timeout).await
    }

    pub fn register_request_handler(&self, command: Command, handler: Handler) {
        self.core.register_request_handler(command, handler);
    }

    pub fn register_notification_handler(&self, command: Command, handler: Handler) {
        self.core.register_notification_handler(command, handler);
    }

    pub fn unregister_handler(&self, command: Command) {
        self.core.unregister_handler(command);
    }

    pub fn is_connected(&self) -> bool {
        self.core.is_connected()
    }

    pub fn dispose(&self) {
        self.core.dispose();
    }
}
