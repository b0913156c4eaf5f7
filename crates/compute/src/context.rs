//! Background execution contexts.
//!
//! A context receives [`TaskMessage`]s and reports [`ContextEvent`]s through a
//! [`ContextPort`]. Communication is message passing only.

use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::thread;

use tokio::sync::mpsc;

use crate::DispatchError;
use crate::protocol::{TaskMessage, TaskResponse};
use crate::registry::TaskRegistry;

/// What a context reports back to its dispatcher.
#[derive(Debug, Clone, PartialEq)]
pub enum ContextEvent {
    /// Reply to one task.
    Response(TaskResponse),
    /// The context died; no further responses will arrive.
    Fatal(String),
}

/// The context's ends of the two channels.
#[derive(Debug)]
pub struct ContextPort {
    pub requests: mpsc::UnboundedReceiver<TaskMessage>,
    pub events: mpsc::UnboundedSender<ContextEvent>,
}

/// Creates the background context for a dispatcher.
///
/// The context must stop once the request channel closes.
pub trait ContextSpawner: Send + Sync {
    fn spawn(&self, name: &str, port: ContextPort) -> Result<(), DispatchError>;
}

/// Runs a [`TaskRegistry`] on a dedicated OS thread named after the locator.
#[derive(Clone, Default)]
pub struct ThreadSpawner {
    registry: Arc<TaskRegistry>,
}

impl ThreadSpawner {
    pub fn new(registry: TaskRegistry) -> Self {
        Self { registry: Arc::new(registry) }
    }
}

impl ContextSpawner for ThreadSpawner {
    fn spawn(&self, name: &str, port: ContextPort) -> Result<(), DispatchError> {
        let registry = Arc::clone(&self.registry);
        thread::Builder::new()
            .name(name.to_string())
            .spawn(move || run_context(&registry, port))
            .map_err(|e| DispatchError::Unavailable(format!("failed to start {name}: {e}")))?;

        tracing::debug!("started background context {}", name);
        Ok(())
    }
}

fn run_context(registry: &TaskRegistry, mut port: ContextPort) {
    while let Some(message) = port.requests.blocking_recv() {
        let id = message.id.clone();
        let event = match panic::catch_unwind(AssertUnwindSafe(|| registry.handle(message))) {
            Ok(response) => ContextEvent::Response(response),
            Err(_) => ContextEvent::Fatal(format!("background context crashed while running {id}")),
        };

        let fatal = matches!(event, ContextEvent::Fatal(_));
        if port.events.send(event).is_err() || fatal {
            break;
        }
    }
}

/// A platform without background execution. Spawning always fails.
#[derive(Debug, Clone, Copy, Default)]
pub struct Unsupported;

impl ContextSpawner for Unsupported {
    fn spawn(&self, _name: &str, _port: ContextPort) -> Result<(), DispatchError> {
        Err(DispatchError::Unavailable("background execution is not supported".into()))
    }
}
