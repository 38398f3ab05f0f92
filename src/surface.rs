//! Sandboxed-side facade. Owns a [`Bridge`] in the [`Role::Surface`] role:
//! announces readiness, pulls state from the host, and submits edits.

use std::time::Duration;

use serde_json::Value;
use tokio::sync::mpsc;

use crate::bridge::{Bridge, Role};
use crate::command::Command;
use crate::config::BridgeConfig;
use crate::error::BridgeError;
use crate::port::MessagePort;
use crate::registry::Handler;

pub struct SurfaceBridge {
    core: Bridge,
}

impl SurfaceBridge {
    pub fn new(
        port: impl MessagePort,
        inbound: mpsc::UnboundedReceiver<Value>,
        config: BridgeConfig,
    ) -> Result<Self, BridgeError> {
        Ok(Self {
            core: Bridge::new(Role::Surface, port, inbound, config)?,
        })
    }

    /// Tells the host the surface finished loading and can accept pushes.
    pub fn notify_ready(&self) -> Result<(), BridgeError> {
        self.core.send_notification(Command::Ready, None)
    }

    /// Asks the host for the current table state.
    pub async fn request_table(&self) -> Result<Option<Value>, BridgeError> {
        self.core
            .send_request(Command::RequestTable, None, None)
            .await
    }

    /// Submits an edit and waits for the host to accept or reject it.
    pub async fn apply_edit(&self, edit: Value) -> Result<Option<Value>, BridgeError> {
        self.core
            .send_request(Command::ApplyEdit, Some(edit), None)
            .await
    }

    pub async fn fetch_theme(&self) -> Result<Option<Value>, BridgeError> {
        self.core.send_request(Command::GetTheme, None, None).await
    }

    /// Hands the host a rendered table for export. Export can be slow, so
    /// callers usually pass an explicit timeout.
    pub async fn export_table(
        &self,
        payload: Value,
        timeout: Option<Duration>,
    ) -> Result<Option<Value>, BridgeError> {
        self.core
            .send_request(Command::ExportTable, Some(payload), timeout)
            .await
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
