//! Correlation engine for poll-vs-event latency measurement
//!
//! Two producers observe the same physical input change and race each other:
//!
//! ```text
//! Gamepad ──► Poll Sampler  ──┐
//!         │                   ├──► CorrelatorSession ──► LatencyReport
//!         └─► Event Listener ─┘
//! ```
//!
//! Each producer records an [`Observation`] into its own [`PendingTable`].
//! When both tables hold an entry for the same key with the same
//! device-reported timestamp, the session emits exactly one
//! [`LatencyReport`] and destroys both entries. Everything in this module is
//! synchronous and single-owner; the I/O shim in [`crate::probe`] drives it
//! from one loop.

pub mod detector;
pub mod observation;
pub mod pending;
pub mod session;

pub use detector::{CategoryRule, DetectorConfig, DeviceSnapshot, DeviceSnapshotState, EdgeRule};
pub use observation::{FasterBy, InputCategory, InputKey, LatencyReport, Observation};
pub use pending::PendingTable;
pub use session::{ChangeNotice, CorrelatorSession};
