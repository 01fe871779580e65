use serde::{Deserialize, Serialize};
use std::fmt;

// Input category; decides which change-detection rule applies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum InputCategory {
    Buttons,
    Axes,
    Touches,
}

impl fmt::Display for InputCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            InputCategory::Buttons => "buttons",
            InputCategory::Axes => "axes",
            InputCategory::Touches => "touches",
        };
        write!(f, "{}", name)
    }
}

/// One input slot on the tracked device. Indices are unique within a
/// category, not across categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct InputKey {
    pub category: InputCategory,
    pub index: u16,
}

impl InputKey {
    pub fn new(category: InputCategory, index: u16) -> Self {
        Self { category, index }
    }
}

impl fmt::Display for InputKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.category, self.index)
    }
}

/// A single sighting of an input change by one producer.
///
/// `device_timestamp` is the device-reported frame stamp shared by both
/// mechanisms when they refer to the same physical change;
/// `local_ms` is the monotonic local clock at the moment the producer saw it.
/// Immutable once created.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Observation {
    pub device_timestamp: u64,
    pub local_ms: f64,
}

impl Observation {
    pub fn new(device_timestamp: u64, local_ms: f64) -> Self {
        Self {
            device_timestamp,
            local_ms,
        }
    }
}

// Which mechanism saw the change first.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FasterBy {
    Event,
    Polling,
    Tie,
}

impl fmt::Display for FasterBy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            FasterBy::Event => "event",
            FasterBy::Polling => "polling",
            FasterBy::Tie => "tie",
        };
        write!(f, "{}", name)
    }
}

/// Outcome of one matched poll/event pair. Positive `delta_ms` means the
/// event mechanism observed the change first. Emitted at most once per
/// matched device timestamp and never retained by the core.
#[derive(Debug, Clone, PartialEq)]
pub struct LatencyReport {
    pub key: InputKey,
    pub device_timestamp: u64,
    pub delta_ms: f64,
    pub faster: FasterBy,
}

impl LatencyReport {
    /// Builds a report from a matched pair of observations.
    pub fn from_match(key: InputKey, poll: Observation, event: Observation) -> Self {
        let delta_ms = poll.local_ms - event.local_ms;
        let faster = if delta_ms > 0.0 {
            FasterBy::Event
        } else if delta_ms < 0.0 {
            FasterBy::Polling
        } else {
            FasterBy::Tie
        };
        Self {
            key,
            device_timestamp: poll.device_timestamp,
            delta_ms,
            faster,
        }
    }
}

impl fmt::Display for LatencyReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.faster {
            FasterBy::Tie => write!(f, "[{}] tie at {}", self.key, self.device_timestamp),
            _ => write!(
                f,
                "[{}] {} was faster by {:.2} ms",
                self.key,
                self.faster,
                self.delta_ms.abs()
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key() -> InputKey {
        InputKey::new(InputCategory::Buttons, 2)
    }

    #[test]
    fn event_first_yields_positive_delta() {
        let report = LatencyReport::from_match(
            key(),
            Observation::new(1000, 50.0),
            Observation::new(1000, 47.5),
        );
        assert_eq!(report.faster, FasterBy::Event);
        assert!((report.delta_ms - 2.5).abs() < 1e-9);
    }

    #[test]
    fn polling_first_yields_negative_delta() {
        let report = LatencyReport::from_match(
            key(),
            Observation::new(1000, 40.0),
            Observation::new(1000, 44.0),
        );
        assert_eq!(report.faster, FasterBy::Polling);
        assert!((report.delta_ms + 4.0).abs() < 1e-9);
    }

    #[test]
    fn exact_tie_is_labeled_tie() {
        let report = LatencyReport::from_match(
            key(),
            Observation::new(7, 12.0),
            Observation::new(7, 12.0),
        );
        assert_eq!(report.faster, FasterBy::Tie);
        assert_eq!(report.delta_ms, 0.0);
    }

    #[test]
    fn report_line_format() {
        let report = LatencyReport::from_match(
            key(),
            Observation::new(1000, 50.0),
            Observation::new(1000, 47.5),
        );
        assert_eq!(report.to_string(), "[buttons 2] event was faster by 2.50 ms");
    }

    #[test]
    fn tie_line_format() {
        let report = LatencyReport::from_match(
            InputKey::new(InputCategory::Axes, 1),
            Observation::new(33, 5.0),
            Observation::new(33, 5.0),
        );
        assert_eq!(report.to_string(), "[axes 1] tie at 33");
    }
}
