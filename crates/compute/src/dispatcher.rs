//! Request/response bridge to a background context.
//!
//! ### Settlement
//! Every call registers a oneshot sender in the pending map under a fresh id.
//! Removing that entry is the only way to settle a call, so whichever of
//! response, timeout, context error or teardown removes it first wins and the
//! others find nothing. A call whose caller goes away removes its own entry.
//!
//! Entries are registered while the context state is locked, so teardown
//! either drains a new entry or refuses it.
//!
//! ### Context lifecycle
//! The context is spawned on the first call. A failed spawn is terminal, as is
//! a fatal context error; there is no reconnect.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use serde_json::Value;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;

use crate::DispatchError;
use crate::context::{ContextEvent, ContextPort, ContextSpawner};
use crate::protocol::{TaskMessage, TaskName};

/// Per-call deadline when none is configured.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

type Settle = oneshot::Sender<Result<Value, DispatchError>>;

#[derive(Default)]
struct PendingTasks {
    tasks: Mutex<HashMap<String, Settle>>,
}

impl PendingTasks {
    fn lock(&self) -> MutexGuard<'_, HashMap<String, Settle>> {
        self.tasks.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn insert(&self, id: String, settle: Settle) {
        self.lock().insert(id, settle);
    }

    fn take(&self, id: &str) -> Option<Settle> {
        self.lock().remove(id)
    }

    fn len(&self) -> usize {
        self.lock().len()
    }

    /// Settle every pending task with `error`.
    fn reject_all(&self, error: &DispatchError) -> usize {
        let drained: Vec<Settle> = self.lock().drain().map(|(_, settle)| settle).collect();
        let count = drained.len();
        for settle in drained {
            let _ = settle.send(Err(error.clone()));
        }
        count
    }
}

/// Removes a call's pending entry when the call future is dropped, settled or not.
struct Registration<'a> {
    pending: &'a PendingTasks,
    id: String,
}

impl Drop for Registration<'_> {
    fn drop(&mut self) {
        self.pending.take(&self.id);
    }
}

enum ContextState {
    /// Not spawned yet.
    Idle,
    Ready { requests: mpsc::UnboundedSender<TaskMessage>, listener: JoinHandle<()> },
    /// Spawning failed.
    Unavailable(String),
    /// The context died.
    Failed(String),
    Terminated,
}

/// Dispatches catalog tasks to a lazily spawned background context.
pub struct Dispatcher {
    locator: String,
    spawner: Arc<dyn ContextSpawner>,
    timeout: Duration,
    counter: AtomicU64,
    pending: Arc<PendingTasks>,
    state: Arc<Mutex<ContextState>>,
}

impl Dispatcher {
    /// Create a dispatcher; nothing is spawned until the first [`call`](Self::call).
    ///
    /// `locator` names the background program and its thread.
    pub fn new(locator: impl Into<String>, spawner: Arc<dyn ContextSpawner>, timeout: Duration) -> Self {
        Self {
            locator: locator.into(),
            spawner,
            timeout,
            counter: AtomicU64::new(0),
            pending: Arc::default(),
            state: Arc::new(Mutex::new(ContextState::Idle)),
        }
    }

    pub fn locator(&self) -> &str {
        &self.locator
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    fn lock_state(&self) -> MutexGuard<'_, ContextState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn next_id(&self) -> String {
        let n = self.counter.fetch_add(1, Ordering::Relaxed) + 1;
        format!("task-{}-{}", n, chrono::Utc::now().timestamp_millis())
    }

    /// False once spawning the context has failed.
    pub fn is_supported(&self) -> bool {
        !matches!(*self.lock_state(), ContextState::Unavailable(_))
    }

    /// True while the context is spawned and alive.
    pub fn is_ready(&self) -> bool {
        matches!(*self.lock_state(), ContextState::Ready { .. })
    }

    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    /// Run `task` in the background context and wait for its result.
    ///
    /// # Errors
    /// - [`DispatchError::Unavailable`] if the context could not be spawned
    /// - [`DispatchError::Timeout`] if no reply arrives within the timeout
    /// - [`DispatchError::ContextError`] if the context died
    /// - [`DispatchError::Terminated`] after [`terminate`](Self::terminate)
    /// - [`DispatchError::Task`] if the task reported an error
    pub async fn call(&self, task: TaskName, data: Value) -> Result<Value, DispatchError> {
        let id = self.next_id();
        let (settle, mut settled) = oneshot::channel();
        let requests = self.register(&id, settle)?;
        let _registration = Registration { pending: &self.pending, id: id.clone() };

        if requests.send(TaskMessage { id: id.clone(), task, data }).is_err() {
            return Err(self.closed_error());
        }
        tracing::debug!(task = %task, id = %id, "dispatched task");

        match tokio::time::timeout(self.timeout, &mut settled).await {
            Ok(Ok(result)) => result,
            Ok(Err(_)) => Err(DispatchError::ContextError(format!("task {id} was dropped"))),
            Err(_) => {
                if self.pending.take(&id).is_some() {
                    tracing::warn!(task = %task, id = %id, "task timed out after {:?}", self.timeout);
                    return Err(DispatchError::Timeout { id, millis: self.timeout.as_millis() as u64 });
                }
                // Settled between the deadline and the removal.
                settled
                    .try_recv()
                    .unwrap_or_else(|_| Err(DispatchError::ContextError(format!("task {id} was dropped"))))
            }
        }
    }

    /// Add `settle` to the pending map under `id` and return the request sender,
    /// spawning the context on first use.
    fn register(&self, id: &str, settle: Settle) -> Result<mpsc::UnboundedSender<TaskMessage>, DispatchError> {
        let mut state = self.lock_state();
        match &*state {
            ContextState::Ready { requests, .. } => {
                self.pending.insert(id.to_string(), settle);
                return Ok(requests.clone());
            }
            ContextState::Unavailable(reason) => return Err(DispatchError::Unavailable(reason.clone())),
            ContextState::Failed(reason) => return Err(DispatchError::ContextError(reason.clone())),
            ContextState::Terminated => return Err(DispatchError::Terminated),
            ContextState::Idle => {}
        }

        let (request_tx, request_rx) = mpsc::unbounded_channel();
        let (event_tx, event_rx) = mpsc::unbounded_channel();

        if let Err(e) = self.spawner.spawn(&self.locator, ContextPort { requests: request_rx, events: event_tx }) {
            let reason = match e {
                DispatchError::Unavailable(reason) => reason,
                other => other.to_string(),
            };
            tracing::warn!("background context {} unavailable: {}", self.locator, reason);
            *state = ContextState::Unavailable(reason.clone());
            return Err(DispatchError::Unavailable(reason));
        }

        let listener = tokio::spawn(listen(event_rx, Arc::clone(&self.pending), Arc::clone(&self.state)));
        *state = ContextState::Ready { requests: request_tx.clone(), listener };
        self.pending.insert(id.to_string(), settle);
        tracing::info!("background context {} ready", self.locator);
        Ok(request_tx)
    }

    fn closed_error(&self) -> DispatchError {
        match &*self.lock_state() {
            ContextState::Terminated => DispatchError::Terminated,
            ContextState::Failed(reason) => DispatchError::ContextError(reason.clone()),
            _ => DispatchError::ContextError("background context closed".into()),
        }
    }

    /// Shut down the context and reject every pending task with [`DispatchError::Terminated`].
    ///
    /// Later calls fail with `Terminated`. Safe to call more than once.
    pub fn terminate(&self) {
        let previous = std::mem::replace(&mut *self.lock_state(), ContextState::Terminated);
        if let ContextState::Ready { listener, .. } = previous {
            listener.abort();
            tracing::info!("background context {} terminated", self.locator);
        }

        let rejected = self.pending.reject_all(&DispatchError::Terminated);
        if rejected > 0 {
            tracing::debug!("rejected {} pending tasks on terminate", rejected);
        }
    }
}

impl Drop for Dispatcher {
    fn drop(&mut self) {
        self.terminate();
    }
}

/// Drain context events until the context goes away.
async fn listen(
    mut events: mpsc::UnboundedReceiver<ContextEvent>, pending: Arc<PendingTasks>, state: Arc<Mutex<ContextState>>,
) {
    let reason = loop {
        match events.recv().await {
            Some(ContextEvent::Response(response)) => match pending.take(&response.id) {
                Some(settle) => {
                    let _ = settle.send(response.into_result());
                }
                None => tracing::debug!("dropping response for unknown task {}", response.id),
            },
            Some(ContextEvent::Fatal(reason)) => break reason,
            None => break "background context exited".to_string(),
        }
    };

    {
        let mut state = state.lock().unwrap_or_else(PoisonError::into_inner);
        if matches!(*state, ContextState::Terminated) {
            return;
        }
        *state = ContextState::Failed(reason.clone());
    }

    let rejected = pending.reject_all(&DispatchError::ContextError(reason.clone()));
    tracing::warn!("background context failed: {}; rejected {} pending tasks", reason, rejected);
}
