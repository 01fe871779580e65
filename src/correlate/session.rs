use crate::correlate::detector::{DetectorConfig, DeviceSnapshot, DeviceSnapshotState};
use crate::correlate::observation::{InputCategory, InputKey, LatencyReport, Observation};
use crate::correlate::pending::PendingTable;
use tracing::{debug, trace, warn};

/// One asynchronous change notification from the device driver.
///
/// Button releases are carried for logging but produce no observation; the
/// latency-relevant button change is the press, matching the rising-only
/// rule on the polling side.
#[derive(Debug, Clone, Default)]
pub struct ChangeNotice {
    pub buttons_pressed: Vec<u16>,
    pub buttons_released: Vec<u16>,
    pub axes_changed: Vec<u16>,
    pub touches_changed: Vec<u16>,
    pub device_timestamp: u64,
}

impl ChangeNotice {
    /// True when the notice lists no changed input in any category.
    pub fn is_empty(&self) -> bool {
        self.buttons_pressed.is_empty()
            && self.buttons_released.is_empty()
            && self.axes_changed.is_empty()
            && self.touches_changed.is_empty()
    }
}

/// Owns everything the correlation engine mutates: both pending tables and
/// the poll-side snapshot state. One session tracks one device; disconnect
/// maps to [`reset`](Self::reset).
#[derive(Debug, Default)]
pub struct CorrelatorSession {
    detector: DetectorConfig,
    snapshot_state: DeviceSnapshotState,
    poll_pending: PendingTable,
    event_pending: PendingTable,
}

impl CorrelatorSession {
    pub fn new(detector: DetectorConfig) -> Self {
        Self {
            detector,
            snapshot_state: DeviceSnapshotState::new(),
            poll_pending: PendingTable::new(),
            event_pending: PendingTable::new(),
        }
    }

    /// Poll Sampler entry point: diffs `snapshot` against the previous tick,
    /// records a poll observation per changed key and reconciles each one.
    /// Returns the reports produced by this sample.
    ///
    /// Each observation is stamped with the changed slot's own timestamp, not
    /// the frame-global one, so an unrelated input updating later than the
    /// change cannot spoil the match against the event side.
    pub fn sample_poll(&mut self, snapshot: &DeviceSnapshot, local_ms: f64) -> Vec<LatencyReport> {
        let changed = self.snapshot_state.diff(&self.detector, snapshot);

        let mut reports = Vec::new();
        for key in changed {
            let observation = Observation::new(snapshot.slot_timestamp(key), local_ms);
            self.observe_poll(key, observation);
            if let Some(report) = self.reconcile(key) {
                reports.push(report);
            }
        }
        reports
    }

    /// Event Listener entry point: records an event observation per changed
    /// key in the notice and reconciles each one.
    pub fn apply_notice(&mut self, notice: &ChangeNotice, local_ms: f64) -> Vec<LatencyReport> {
        let observation = Observation::new(notice.device_timestamp, local_ms);

        if !notice.buttons_released.is_empty() {
            trace!(released = ?notice.buttons_released, "button releases carry no observation");
        }

        let keys = notice
            .buttons_pressed
            .iter()
            .map(|&i| InputKey::new(InputCategory::Buttons, i))
            .chain(
                notice
                    .axes_changed
                    .iter()
                    .map(|&i| InputKey::new(InputCategory::Axes, i)),
            )
            .chain(
                notice
                    .touches_changed
                    .iter()
                    .map(|&i| InputKey::new(InputCategory::Touches, i)),
            );

        let mut reports = Vec::new();
        for key in keys {
            self.observe_event(key, observation);
            if let Some(report) = self.reconcile(key) {
                reports.push(report);
            }
        }
        reports
    }

    fn observe_poll(&mut self, key: InputKey, observation: Observation) {
        if let Some(stale) = self.poll_pending.insert(key, observation) {
            warn!(%key, dropped_timestamp = stale.device_timestamp,
                "poll observation overwritten before the event side caught up");
        }
    }

    fn observe_event(&mut self, key: InputKey, observation: Observation) {
        if let Some(stale) = self.event_pending.insert(key, observation) {
            warn!(%key, dropped_timestamp = stale.device_timestamp,
                "event observation overwritten before the poll side caught up");
        }
    }

    /// Checks whether both producers have seen the change for `key` and, if
    /// their device timestamps agree, consumes both pending entries and
    /// returns the report.
    ///
    /// Symmetric in arrival order. A timestamp mismatch leaves both entries
    /// pending for a later observation that agrees; a missing counterpart is
    /// simply not yet correlated. Neither is an error.
    pub fn reconcile(&mut self, key: InputKey) -> Option<LatencyReport> {
        let poll = self.poll_pending.peek(&key)?;
        let event = self.event_pending.peek(&key)?;

        if poll.device_timestamp != event.device_timestamp {
            debug!(%key, poll_ts = poll.device_timestamp, event_ts = event.device_timestamp,
                "device timestamps disagree, awaiting a matching observation");
            return None;
        }

        // Matched: both entries leave their tables for good, which is what
        // prevents the same physical change from reporting twice.
        let poll = self.poll_pending.take(&key)?;
        let event = self.event_pending.take(&key)?;
        let report = LatencyReport::from_match(key, poll, event);
        debug!(%key, delta_ms = report.delta_ms, "matched poll/event pair");
        Some(report)
    }

    /// Device disconnected: drop every pending observation and the snapshot
    /// state so nothing stale can match a reconnected device reusing the
    /// same indices.
    pub fn reset(&mut self) {
        let dropped = self.poll_pending.len() + self.event_pending.len();
        if dropped > 0 {
            debug!(dropped, "clearing pending observations on disconnect");
        }
        self.poll_pending.clear();
        self.event_pending.clear();
        self.snapshot_state.reset();
    }

    /// Number of unmatched observations across both tables.
    pub fn pending_len(&self) -> usize {
        self.poll_pending.len() + self.event_pending.len()
    }
}
