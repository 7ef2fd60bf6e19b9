//! `snowcheck-core` -- pixel-level snow detection.
//!
//! Everything in this crate is pure and synchronous: it takes decoded
//! rasters plus configuration and produces counts and decisions. Network
//! access, scheduling and debug-image persistence live in
//! `snowcheck-agent`.

pub mod classify;
pub mod codec;
pub mod detection;
pub mod error;
pub mod geometry;
pub mod mask;
