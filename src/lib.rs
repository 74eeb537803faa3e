//! espmonitor dashboard host library.
//!
//! the binary in `main.rs` wires these together; they are exposed here so
//! the integration tests can drive the client and the server directly.

pub mod api;
pub mod config;
pub mod controller;
pub mod domain;
pub mod error;
pub mod page;
pub mod poller;
pub mod server;
pub mod view;
