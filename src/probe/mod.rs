//! Probe subsystem for gamepad latency measurement
//!
//! Thin I/O shim around the correlation engine:
//!
//! 1. [`worker`] - gilrs-backed worker acting as both producers
//! 2. [`handle`] - Unified API and lifecycle management
//!
//! # Architecture
//!
//! ```text
//! Gamepad ──► ProbeWorker ──► CorrelatorSession ──► LatencyReport channel
//!             (poll tick + event drain, one loop)
//! ```
//!
//! Both producers run from the same loop on one task, so the session is
//! mutated without locking; the only interleaving left is arrival order,
//! which the correlator handles symmetrically.

pub mod handle;
pub mod worker;

pub use handle::{ProbeHandle, ProbeSettings};
pub use worker::{matches_any_phrase, ProbeError};
