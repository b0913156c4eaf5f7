//! Task registry run inside the background context.

use std::collections::HashMap;

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::protocol::{TaskMessage, TaskName, TaskResponse};
use crate::tasks;

type Handler = Box<dyn Fn(Value) -> Result<Value, String> + Send + Sync>;

/// Maps task names to handlers taking and returning JSON.
pub struct TaskRegistry {
    handlers: HashMap<TaskName, Handler>,
}

impl TaskRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        Self { handlers: HashMap::new() }
    }

    /// A registry with the full task catalog.
    pub fn with_catalog() -> Self {
        let mut registry = Self::new();
        registry.register(TaskName::CompareVehicles, tasks::compare_vehicles);
        registry.register(TaskName::OptimizeImages, tasks::optimize_images);
        registry.register(TaskName::RecommendVehicles, tasks::recommend_vehicles);
        registry.register(TaskName::AggregateAnalytics, tasks::aggregate_analytics);
        registry
    }

    /// Register a typed handler; input and output cross the boundary as JSON.
    pub fn register<I, O, F>(&mut self, name: TaskName, task: F)
    where
        I: DeserializeOwned,
        O: Serialize,
        F: Fn(I) -> O + Send + Sync + 'static,
    {
        let handler: Handler = Box::new(move |data| {
            let input = serde_json::from_value(data).map_err(|e| format!("invalid {name} payload: {e}"))?;
            serde_json::to_value(task(input)).map_err(|e| format!("failed to encode {name} result: {e}"))
        });
        self.handlers.insert(name, handler);
    }

    pub fn contains(&self, name: TaskName) -> bool {
        self.handlers.contains_key(&name)
    }

    /// Run one message and build its response.
    pub fn handle(&self, message: TaskMessage) -> TaskResponse {
        let TaskMessage { id, task, data } = message;
        match self.handlers.get(&task) {
            Some(handler) => match handler(data) {
                Ok(result) => TaskResponse::ok(id, result),
                Err(error) => TaskResponse::err(id, error),
            },
            None => TaskResponse::err(id, format!("unknown task type: {task}")),
        }
    }
}

impl Default for TaskRegistry {
    fn default() -> Self {
        Self::with_catalog()
    }
}
