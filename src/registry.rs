//! Per-side handler registry: at most one asynchronous request handler and
//! one notification handler per command. Re-registering replaces the
//! previous entry; unregistering removes both.

use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use parking_lot::Mutex;
use serde_json::Value;

use crate::command::Command;

/// Handler outcome: an optional payload (becomes the response `data` for
/// request handlers, discarded for notification handlers), or an error
/// message already normalized to a string.
pub type HandlerResult = Result<Option<Value>, String>;

pub type HandlerFuture = Pin<Box<dyn Future<Output = HandlerResult> + Send>>;

/// Type-erased asynchronous handler, invoked with the envelope's `data`.
pub type Handler = Arc<dyn Fn(Option<Value>) -> HandlerFuture + Send + Sync>;

/// Wraps an async closure into the type-erased [`Handler`] shape.
pub fn handler<F, Fut>(f: F) -> Handler
where
    F: Fn(Option<Value>) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = HandlerResult> + Send + 'static,
{
    Arc::new(move |data| Box::pin(f(data)))
}

#[derive(Default)]
pub struct HandlerRegistry {
    request: Mutex<HashMap<Command, Handler>>,
    notification: Mutex<HashMap<Command, Handler>>,
}

impl HandlerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register_request(&self, command: Command, handler: Handler) {
        self.request.lock().insert(command, handler);
    }

    pub fn register_notification(&self, command: Command, handler: Handler) {
        self.notification.lock().insert(command, handler);
    }

    /// Removes both the request-handler and notification-handler entries.
    pub fn unregister(&self, command: Command) {
        self.request.lock().remove(&command);
        self.notification.lock().remove(&command);
    }

    pub fn request_handler(&self, command: Command) -> Option<Handler> {
        self.request.lock().get(&command).cloned()
    }

    pub fn notification_handler(&self, command: Command) -> Option<Handler> {
        self.notification.lock().get(&command).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_register_and_invoke() {
        let registry = HandlerRegistry::new();
        registry.register_request(
            Command::ApplyEdit,
            handler(|data| async move { Ok(data) }),
        );

        let h = registry.request_handler(Command::ApplyEdit).unwrap();
        let out = h(Some(json!({"cell": "A1"}))).await.unwrap();
        assert_eq!(out, Some(json!({"cell": "A1"})));

        assert!(registry.request_handler(Command::GetTheme).is_none());
    }

    #[tokio::test]
    async fn test_reregister_replaces() {
        let registry = HandlerRegistry::new();
        registry.register_request(Command::GetTheme, handler(|_| async { Ok(Some(json!(1))) }));
        registry.register_request(Command::GetTheme, handler(|_| async { Ok(Some(json!(2))) }));

        let h = registry.request_handler(Command::GetTheme).unwrap();
        assert_eq!(h(None).await.unwrap(), Some(json!(2)));
    }

    #[test]
    fn test_request_and_notification_slots_coexist() {
        let registry = HandlerRegistry::new();
        registry.register_request(Command::UpdateTable, handler(|_| async { Ok(None) }));
        registry.register_notification(Command::UpdateTable, handler(|_| async { Ok(None) }));

        assert!(registry.request_handler(Command::UpdateTable).is_some());
        assert!(registry.notification_handler(Command::UpdateTable).is_some());
    }

    #[test]
    fn test_unregister_clears_both_slots() {
        let registry = HandlerRegistry::new();
        registry.register_request(Command::Ready, handler(|_| async { Ok(None) }));
        registry.register_notification(Command::Ready, handler(|_| async { Ok(None) }));

        registry.unregister(Command::Ready);
        assert!(registry.request_handler(Command::Ready).is_none());
        assert!(registry.notification_handler(Command::Ready).is_none());
    }

    #[tokio::test]
    async fn test_handler_error_is_a_string() {
        let registry = HandlerRegistry::new();
        registry.register_request(
            Command::ExportTable,
            handler(|_| async { Err("unsupported format".to_string()) }),
        );

        let h = registry.request_handler(Command::ExportTable).unwrap();
        assert_eq!(h(None).await.unwrap_err(), "unsupported format");
    }
}
