//! Probe Handle - Unified API for the latency probe subsystem
//!
//! Provides a high-level interface for spawning the gilrs worker that feeds
//! the correlation engine, and owns the settings shared by both producers.

use tokio::sync::mpsc;
use tracing::{debug, error, info};

use crate::correlate::{DetectorConfig, LatencyReport};
use crate::probe::worker::{ProbeError, ProbeWorker};

/// Configuration settings for the probe subsystem
///
/// # Examples
///
/// ```rust
/// use padprobe::probe::ProbeSettings;
///
/// let settings = ProbeSettings {
///     poll_interval_ms: 8,
///     axis_threshold: 0.03,
///     name_filters: vec!["Xbox".into()],
/// };
/// ```
#[derive(Clone, Debug)]
pub struct ProbeSettings {
    /// Poll tick interval in milliseconds
    ///
    /// One full-state sample is taken per tick, conceptually once per display
    /// refresh. 16 ms approximates a 60 Hz frame.
    pub poll_interval_ms: u64,

    /// Axis noise threshold in normalized units (0.0-1.0)
    ///
    /// Movements smaller than this against the previous sample are treated as
    /// jitter and produce no observation. Typical values are 0.01-0.05.
    pub axis_threshold: f32,

    /// Name phrases selecting the tracked gamepad, matched case-insensitively
    pub name_filters: Vec<String>,
}

impl Default for ProbeSettings {
    fn default() -> Self {
        Self {
            poll_interval_ms: 16,
            axis_threshold: 0.05,
            name_filters: vec!["Xbox".to_string(), "Wireless".to_string()],
        }
    }
}

impl ProbeSettings {
    /// Change-detection rules derived from these settings.
    pub fn detector_config(&self) -> DetectorConfig {
        DetectorConfig::with_axis_threshold(self.axis_threshold)
    }
}

/// Handle for managing the probe worker lifecycle
///
/// Spawns one tokio task that owns the gilrs context, the correlator session
/// and both producer roles. The task is fire-and-forget; it runs until the
/// application terminates.
pub struct ProbeHandle {}

impl ProbeHandle {
    /// Spawns the probe worker and starts measuring.
    ///
    /// Reports flow out over `report_sender`; the receiving side is expected
    /// to be the console sink.
    pub fn spawn(
        settings: Option<ProbeSettings>,
        report_sender: mpsc::Sender<LatencyReport>,
    ) -> Result<Self, ProbeError> {
        let settings = settings.unwrap_or_default();
        info!("Initializing probe with settings: {:?}", settings);

        let worker = ProbeWorker::create(settings, report_sender)?;
        debug!("Probe worker created successfully");

        let task_handle = tokio::spawn(async move {
            match worker.initialize() {
                Ok(mut tracking) => {
                    info!("Probe initialization successful, starting probe loop");
                    if let Err(e) = tracking.run_probe_loop() {
                        error!("Probe task terminated with error: {}", e);
                    }
                }
                Err(e) => {
                    error!("Failed to initialize probe: {}", e);
                }
            }
        });

        debug!("Tokio task spawned with handle: {:?}", task_handle);
        info!("Probe successfully started");

        Ok(Self {})
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::correlate::EdgeRule;

    #[test]
    fn default_settings_match_documented_values() {
        let settings = ProbeSettings::default();
        assert_eq!(settings.poll_interval_ms, 16);
        assert!((settings.axis_threshold - 0.05).abs() < f32::EPSILON);
        assert_eq!(settings.name_filters, vec!["Xbox", "Wireless"]);
    }

    #[test]
    fn detector_config_carries_axis_threshold() {
        let settings = ProbeSettings {
            axis_threshold: 0.02,
            ..Default::default()
        };
        let config = settings.detector_config();
        assert_eq!(config.axes.threshold, Some(0.02));
        assert_eq!(config.buttons.edge, EdgeRule::RisingOnly);
        assert!(config.buttons.threshold.is_none());
    }
}
