//! Messages exchanged with the background context.
//!
//! Request `{ id, type, data }`, response `{ id, result?, error? }`.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::DispatchError;

/// Catalog entry a message asks the context to run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskName {
    CompareVehicles,
    OptimizeImages,
    RecommendVehicles,
    AggregateAnalytics,
}

impl TaskName {
    pub const ALL: [TaskName; 4] =
        [TaskName::CompareVehicles, TaskName::OptimizeImages, TaskName::RecommendVehicles, TaskName::AggregateAnalytics];

    pub fn as_str(self) -> &'static str {
        match self {
            TaskName::CompareVehicles => "compare_vehicles",
            TaskName::OptimizeImages => "optimize_images",
            TaskName::RecommendVehicles => "recommend_vehicles",
            TaskName::AggregateAnalytics => "aggregate_analytics",
        }
    }
}

impl fmt::Display for TaskName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskMessage {
    pub id: String,
    #[serde(rename = "type")]
    pub task: TaskName,
    pub data: Value,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskResponse {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl TaskResponse {
    pub fn ok(id: impl Into<String>, result: Value) -> Self {
        Self { id: id.into(), result: Some(result), error: None }
    }

    pub fn err(id: impl Into<String>, error: impl Into<String>) -> Self {
        Self { id: id.into(), result: None, error: Some(error.into()) }
    }

    /// Settle the response: an error wins over a result, and neither means `null`.
    pub fn into_result(self) -> Result<Value, DispatchError> {
        match (self.result, self.error) {
            (_, Some(error)) => Err(DispatchError::Task(error)),
            (Some(result), None) => Ok(result),
            (None, None) => Ok(Value::Null),
        }
    }
}
