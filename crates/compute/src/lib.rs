//! Background compute for showroom.
//!
//! This crate provides:
//! - A message protocol and [`Dispatcher`] bridging async callers to a background context
//! - Context spawners (a dedicated OS thread, or none at all)
//! - The task catalog: comparison scoring, image optimization, recommendations, analytics
//! - The [`Compute`] facade that falls back to inline execution

pub mod context;
pub mod dispatcher;
pub mod error;
pub mod facade;
pub mod protocol;
pub mod registry;
pub mod tasks;

pub use context::{ContextEvent, ContextPort, ContextSpawner, ThreadSpawner, Unsupported};
pub use dispatcher::{DEFAULT_TIMEOUT, Dispatcher};
pub use error::DispatchError;
pub use facade::{COMPUTE_LOCATOR, Capability, Compute, Computed, ExecutedOn};
pub use protocol::{TaskMessage, TaskName, TaskResponse};
pub use registry::TaskRegistry;
