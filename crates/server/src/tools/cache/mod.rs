//! Cache controller MCP tools.
//!
//! This module provides tools for driving the offline cache controller.

pub mod activate;
pub mod fetch;
pub mod status;

pub use activate::activate_impl;
pub use fetch::{CacheFetchParams, fetch_impl};
pub use status::status_impl;
