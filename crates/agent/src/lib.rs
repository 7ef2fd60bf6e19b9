//! `snowcheck-agent` library crate.
//!
//! Re-exports internal modules for integration testing. The binary
//! entrypoint lives in `main.rs`.

pub mod artifacts;
pub mod camera;
pub mod config;
pub mod engine;
pub mod error;
pub mod hub;
pub mod scheduler;
