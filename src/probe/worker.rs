use chrono::Local;
use gilrs::{Axis, Button, Event, EventType, Gamepad, GamepadId, Gilrs};
use statum::{machine, state};
use std::time::Instant;
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

use crate::correlate::{ChangeNotice, CorrelatorSession, DeviceSnapshot, LatencyReport};
use crate::probe::handle::ProbeSettings;

// Buttons sampled per poll tick; array position doubles as the input index.
const BUTTONS: [Button; 17] = [
    Button::South,
    Button::East,
    Button::North,
    Button::West,
    Button::LeftTrigger,
    Button::LeftTrigger2,
    Button::RightTrigger,
    Button::RightTrigger2,
    Button::Select,
    Button::Start,
    Button::Mode,
    Button::LeftThumb,
    Button::RightThumb,
    Button::DPadUp,
    Button::DPadDown,
    Button::DPadLeft,
    Button::DPadRight,
];

// Axes sampled per poll tick; array position doubles as the input index.
const AXES: [Axis; 8] = [
    Axis::LeftStickX,
    Axis::LeftStickY,
    Axis::LeftZ,
    Axis::RightStickX,
    Axis::RightStickY,
    Axis::RightZ,
    Axis::DPadX,
    Axis::DPadY,
];

// Probe errors
#[derive(Debug, thiserror::Error)]
pub enum ProbeError {
    #[error("Failed to initialize probe: {0}")]
    InitializationError(String),

    #[error("Failed to send report: {0}")]
    ReportSendError(String),
}

/// Case-insensitive check whether `text` contains any of `phrases`.
/// Used to pick the tracked gamepad by name.
pub fn matches_any_phrase(text: &str, phrases: &[String]) -> bool {
    let lower = text.to_lowercase();
    phrases
        .iter()
        .any(|phrase| lower.contains(&phrase.to_lowercase()))
}

// Define probe states using statum's state macro
#[state]
#[derive(Debug, Clone)]
pub enum ProbeState {
    Initializing,
    Tracking,
}

#[machine]
#[derive(Debug)]
pub struct ProbeWorker<S: ProbeState> {
    // Gilrs context
    gilrs: Gilrs,

    // Currently tracked gamepad, if any
    tracked: Option<GamepadId>,

    // Probe settings
    settings: ProbeSettings,

    // Correlation engine fed by both producers
    session: CorrelatorSession,

    // Channel for sending reports to the sink
    report_sender: mpsc::Sender<LatencyReport>,

    // Anchor for the monotonic local clock, in fractional milliseconds
    started_at: Instant,
}

impl<S: ProbeState> ProbeWorker<S> {
    fn local_ms(&self) -> f64 {
        self.started_at.elapsed().as_secs_f64() * 1000.0
    }
}

// Implementation for Initializing state
impl ProbeWorker<Initializing> {
    pub fn create(
        settings: ProbeSettings,
        report_sender: mpsc::Sender<LatencyReport>,
    ) -> Result<Self, ProbeError> {
        debug!("Creating probe worker with settings: {:?}", settings);

        info!("Initializing gilrs controller interface");
        let gilrs = match Gilrs::new() {
            Ok(g) => {
                info!("Successfully initialized gilrs");
                g
            }
            Err(e) => {
                error!("Failed to initialize gilrs: {}", e);
                return Err(ProbeError::InitializationError(e.to_string()));
            }
        };

        let session = CorrelatorSession::new(settings.detector_config());

        Ok(Self::new(
            gilrs,
            None,
            settings,
            session,
            report_sender,
            Instant::now(),
        ))
    }

    // Select a gamepad matching the name filter and transition to Tracking
    pub fn initialize(mut self) -> Result<ProbeWorker<Tracking>, ProbeError> {
        let gamepads: Vec<(GamepadId, Gamepad<'_>)> = self.gilrs.gamepads().collect();

        if gamepads.is_empty() {
            warn!("No gamepad connected, waiting for a connection event");
        } else {
            info!("Found {} gamepads:", gamepads.len());
            for (idx, (id, gamepad)) in gamepads.iter().enumerate() {
                info!("  [{}] ID: {}, Name: {}", idx, id, gamepad.name());
            }
            let selected = gamepads
                .iter()
                .find(|(_, gamepad)| {
                    matches_any_phrase(gamepad.name(), &self.settings.name_filters)
                })
                .map(|(id, gamepad)| (*id, gamepad.name().to_string()));
            match selected {
                Some((id, name)) => {
                    self.tracked = Some(id);
                    info!("Tracking gamepad: {} ({})", name, id);
                }
                None => warn!(
                    "No gamepad name matched filters {:?}, waiting for one",
                    self.settings.name_filters
                ),
            }
        }

        info!("Probe worker initialized, transitioning to Tracking state");
        Ok(self.transition())
    }
}

// Implementation for the Tracking state
impl ProbeWorker<Tracking> {
    /// Drains the gilrs event queue into one [`ChangeNotice`] per batch and
    /// feeds it to the correlator. Connect/disconnect events update the
    /// tracked device and reset the session. Returns the number of reports
    /// produced.
    pub fn drain_events(&mut self) -> Result<usize, ProbeError> {
        let mut produced = 0;
        let mut notice = ChangeNotice {
            device_timestamp: self.gilrs.counter(),
            ..Default::default()
        };

        while let Some(Event { id, event, .. }) = self.gilrs.next_event() {
            match event {
                EventType::Connected => {
                    self.on_connected(id);
                    continue;
                }
                EventType::Disconnected => {
                    // Changes the device sent while still alive go through
                    // before the reset; nothing drained so far may outlive
                    // the disconnect.
                    produced += self.flush_notice(&mut notice)?;
                    self.on_disconnected(id);
                    continue;
                }
                _ => {}
            }

            match self.tracked {
                Some(tracked) if tracked == id => {}
                _ => {
                    debug!("Skipping event from non-tracked gamepad: {:?}", id);
                    continue;
                }
            }

            match event {
                EventType::ButtonPressed(button, _) => {
                    if let Some(index) = button_index(button) {
                        debug!("Button pressed: {:?} (index {})", button, index);
                        notice.buttons_pressed.push(index);
                    }
                }
                EventType::ButtonReleased(button, _) => {
                    if let Some(index) = button_index(button) {
                        notice.buttons_released.push(index);
                    }
                }
                EventType::AxisChanged(axis, value, _) => {
                    if let Some(index) = axis_index(axis) {
                        debug!("Axis changed: {:?} = {:.4} (index {})", axis, value, index);
                        notice.axes_changed.push(index);
                    }
                }
                EventType::ButtonRepeated(button, _) => {
                    debug!("Button repeat ignored: {:?}", button);
                }
                _ => {
                    debug!("Unhandled event type: {:?}", event);
                }
            }
        }

        produced += self.flush_notice(&mut notice)?;
        Ok(produced)
    }

    /// Applies the accumulated notice to the session and rearms it for the
    /// next batch. Returns the number of reports produced.
    fn flush_notice(&mut self, notice: &mut ChangeNotice) -> Result<usize, ProbeError> {
        if notice.is_empty() {
            notice.device_timestamp = self.gilrs.counter();
            return Ok(0);
        }

        let batch = std::mem::take(notice);
        notice.device_timestamp = self.gilrs.counter();

        debug!("Change notice: {:?}", batch);
        let local_ms = self.local_ms();
        let reports = self.session.apply_notice(&batch, local_ms);
        let produced = reports.len();
        for report in reports {
            self.send_report(report)?;
        }
        Ok(produced)
    }

    /// Runs one poll tick: reads the full state of the tracked gamepad and
    /// feeds the sample to the correlator. Returns the number of reports
    /// produced.
    pub fn poll_tick(&mut self) -> Result<usize, ProbeError> {
        let Some(id) = self.tracked else {
            return Ok(0);
        };

        let snapshot = read_snapshot(&self.gilrs.gamepad(id));
        let local_ms = self.local_ms();
        let reports = self.session.sample_poll(&snapshot, local_ms);
        let produced = reports.len();
        for report in reports {
            self.send_report(report)?;
        }
        Ok(produced)
    }

    fn send_report(&self, report: LatencyReport) -> Result<(), ProbeError> {
        info!("{}", report);
        self.report_sender
            .try_send(report)
            .map_err(|e| ProbeError::ReportSendError(e.to_string()))
    }

    fn on_connected(&mut self, id: GamepadId) {
        let name = self.gilrs.gamepad(id).name().to_string();
        if self.tracked.is_some() {
            debug!("Ignoring additional gamepad: {} ({})", name, id);
            return;
        }
        if matches_any_phrase(&name, &self.settings.name_filters) {
            info!("Gamepad connected, now tracking: {} ({})", name, id);
            self.tracked = Some(id);
            self.session.reset();
        } else {
            debug!("Gamepad {} does not match name filters, ignoring", name);
        }
    }

    fn on_disconnected(&mut self, id: GamepadId) {
        if self.tracked == Some(id) {
            warn!("Tracked gamepad disconnected ({})", id);
            self.tracked = None;
            // Stale observations must never match a reconnected device
            // reusing the same indices.
            self.session.reset();
        } else {
            debug!("Non-tracked gamepad disconnected: {:?}", id);
        }
    }

    // Run the probe in a loop: drain events, poll on the tick interval
    pub fn run_probe_loop(&mut self) -> Result<(), ProbeError> {
        info!(
            "Starting probe loop with {} ms poll interval",
            self.settings.poll_interval_ms
        );

        let poll_interval =
            std::time::Duration::from_millis(self.settings.poll_interval_ms.max(1));
        let mut last_poll = Instant::now();

        // For performance monitoring
        let mut report_count = 0usize;
        let mut last_log_time = Local::now();
        let log_interval = chrono::Duration::seconds(10);

        loop {
            match self.drain_events() {
                Ok(produced) => report_count += produced,
                Err(e) => error!("Error draining events: {}", e),
            }

            if last_poll.elapsed() >= poll_interval {
                last_poll = Instant::now();
                match self.poll_tick() {
                    Ok(produced) => report_count += produced,
                    Err(e) => error!("Error on poll tick: {}", e),
                }
            }

            // Advance the gilrs frame counter shared by both mechanisms
            self.gilrs.inc();

            let now = Local::now();
            if now - last_log_time > log_interval {
                info!(
                    "Probe stats: {} reports in last {} seconds, {} observations pending",
                    report_count,
                    log_interval.num_seconds(),
                    self.session.pending_len()
                );
                report_count = 0;
                last_log_time = now;
            }

            // Small sleep to prevent 100% CPU usage
            std::thread::sleep(std::time::Duration::from_micros(500));
        }
    }
}

// Reads the full current state of a gamepad. Every slot carries its own
// gilrs counter, so a changed input is stamped with the frame of its own
// update, never with a newer update to an unrelated input; the frame-global
// timestamp is kept as the newest of them.
fn read_snapshot(gamepad: &Gamepad<'_>) -> DeviceSnapshot {
    let mut device_timestamp = 0u64;

    let mut buttons = Vec::with_capacity(BUTTONS.len());
    let mut button_timestamps = Vec::with_capacity(BUTTONS.len());
    for button in BUTTONS {
        buttons.push(gamepad.is_pressed(button));
        let counter = gamepad
            .button_data(button)
            .map(|data| data.counter())
            .unwrap_or(0);
        button_timestamps.push(counter);
        device_timestamp = device_timestamp.max(counter);
    }

    let mut axes = Vec::with_capacity(AXES.len());
    let mut axis_timestamps = Vec::with_capacity(AXES.len());
    for axis in AXES {
        axes.push(gamepad.value(axis));
        let counter = gamepad
            .axis_data(axis)
            .map(|data| data.counter())
            .unwrap_or(0);
        axis_timestamps.push(counter);
        device_timestamp = device_timestamp.max(counter);
    }

    DeviceSnapshot {
        buttons,
        axes,
        // gilrs exposes no touch pads; the category stays core-only
        touches: Vec::new(),
        button_timestamps,
        axis_timestamps,
        touch_timestamps: Vec::new(),
        device_timestamp,
    }
}

fn button_index(button: Button) -> Option<u16> {
    BUTTONS.iter().position(|&b| b == button).map(|i| i as u16)
}

fn axis_index(axis: Axis) -> Option<u16> {
    AXES.iter().position(|&a| a == axis).map(|i| i as u16)
}
