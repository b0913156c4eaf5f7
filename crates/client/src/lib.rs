//! Client side of showroom.
//!
//! This crate provides the HTTP fetch layer and the offline cache controller
//! that sits between pages and the network.

pub mod controller;
pub mod fetch;

pub use controller::{
    CacheController, CacheKind, ControllerConfig, ControllerMessage, Lifecycle, ResourceClass, Strategy, SyncOutcome,
};

pub use fetch::{FetchClient, FetchConfig, Network, Request, Response, ServedFrom};
