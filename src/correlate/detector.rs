use crate::correlate::observation::{InputCategory, InputKey};

/// Which value transitions count as a change for a boolean input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EdgeRule {
    /// Only released → pressed counts (button presses).
    RisingOnly,
    /// Both transitions count (touch contact down and up).
    BothEdges,
}

/// Change rule for one input category.
#[derive(Debug, Clone, Copy)]
pub struct CategoryRule {
    pub edge: EdgeRule,
    /// Noise threshold for analog inputs; `None` for boolean categories.
    pub threshold: Option<f32>,
}

/// Per-category change rules. One parameterized detector replaces separate
/// code paths per category.
#[derive(Debug, Clone, Copy)]
pub struct DetectorConfig {
    pub buttons: CategoryRule,
    pub axes: CategoryRule,
    pub touches: CategoryRule,
}

impl DetectorConfig {
    /// Default rules with a caller-supplied axis noise threshold.
    pub fn with_axis_threshold(threshold: f32) -> Self {
        Self {
            buttons: CategoryRule {
                edge: EdgeRule::RisingOnly,
                threshold: None,
            },
            axes: CategoryRule {
                edge: EdgeRule::BothEdges,
                threshold: Some(threshold),
            },
            touches: CategoryRule {
                edge: EdgeRule::BothEdges,
                threshold: None,
            },
        }
    }
}

impl Default for DetectorConfig {
    fn default() -> Self {
        // 5% of the normalized axis range; filters stick jitter without
        // swallowing deliberate movement.
        Self::with_axis_threshold(0.05)
    }
}

/// Raw device state for one sampled frame.
///
/// `device_timestamp` is the frame-global stamp (the newest update on the
/// device). The optional per-slot vectors carry the stamp of each slot's own
/// last update; when present they take precedence, so a change on one input
/// is never stamped with a newer update to an unrelated input.
#[derive(Debug, Clone, Default)]
pub struct DeviceSnapshot {
    pub buttons: Vec<bool>,
    pub axes: Vec<f32>,
    pub touches: Vec<bool>,
    pub button_timestamps: Vec<u64>,
    pub axis_timestamps: Vec<u64>,
    pub touch_timestamps: Vec<u64>,
    pub device_timestamp: u64,
}

impl DeviceSnapshot {
    /// Device-reported timestamp for one slot: the slot's own stamp when the
    /// source provides it, otherwise the frame-global one.
    pub fn slot_timestamp(&self, key: InputKey) -> u64 {
        let per_slot = match key.category {
            InputCategory::Buttons => self.button_timestamps.get(key.index as usize),
            InputCategory::Axes => self.axis_timestamps.get(key.index as usize),
            InputCategory::Touches => self.touch_timestamps.get(key.index as usize),
        };
        per_slot.copied().unwrap_or(self.device_timestamp)
    }
}

/// Last-known per-input values, owned by the sampling path and used only to
/// diff against the newest snapshot. Slots the device has not reported yet
/// compare against released / 0.0 / no contact.
#[derive(Debug, Clone, Default)]
pub struct DeviceSnapshotState {
    buttons: Vec<bool>,
    axes: Vec<f32>,
    touches: Vec<bool>,
}

impl DeviceSnapshotState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Diffs `current` against the stored state and returns the keys whose
    /// value changed under `config`'s rules. The stored state is overwritten
    /// with `current` regardless of what changed, so the next call always
    /// compares against the immediately preceding sample.
    pub fn diff(&mut self, config: &DetectorConfig, current: &DeviceSnapshot) -> Vec<InputKey> {
        let mut changed = Vec::new();

        for (i, &pressed) in current.buttons.iter().enumerate() {
            let previous = self.buttons.get(i).copied().unwrap_or(false);
            if edge_changed(config.buttons.edge, previous, pressed) {
                changed.push(InputKey::new(InputCategory::Buttons, i as u16));
            }
        }

        let threshold = config.axes.threshold.unwrap_or(0.0);
        for (i, &value) in current.axes.iter().enumerate() {
            let previous = self.axes.get(i).copied().unwrap_or(0.0);
            if (value - previous).abs() > threshold {
                changed.push(InputKey::new(InputCategory::Axes, i as u16));
            }
        }

        for (i, &contact) in current.touches.iter().enumerate() {
            let previous = self.touches.get(i).copied().unwrap_or(false);
            if edge_changed(config.touches.edge, previous, contact) {
                changed.push(InputKey::new(InputCategory::Touches, i as u16));
            }
        }

        self.buttons.clone_from(&current.buttons);
        self.axes.clone_from(&current.axes);
        self.touches.clone_from(&current.touches);

        changed
    }

    /// Forgets all last-known values, as if no sample had been taken yet.
    pub fn reset(&mut self) {
        self.buttons.clear();
        self.axes.clear();
        self.touches.clear();
    }
}

fn edge_changed(rule: EdgeRule, previous: bool, current: bool) -> bool {
    match rule {
        EdgeRule::RisingOnly => current && !previous,
        EdgeRule::BothEdges => current != previous,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snapshot(buttons: Vec<bool>, axes: Vec<f32>, touches: Vec<bool>) -> DeviceSnapshot {
        DeviceSnapshot {
            buttons,
            axes,
            touches,
            ..Default::default()
        }
    }

    #[test]
    fn button_press_is_a_change_release_is_not() {
        let config = DetectorConfig::default();
        let mut state = DeviceSnapshotState::new();

        let changed = state.diff(&config, &snapshot(vec![true], vec![], vec![]));
        assert_eq!(changed, vec![InputKey::new(InputCategory::Buttons, 0)]);

        // Release: rising-only rule reports nothing.
        let changed = state.diff(&config, &snapshot(vec![false], vec![], vec![]));
        assert!(changed.is_empty());

        // Press again after the release is a fresh change.
        let changed = state.diff(&config, &snapshot(vec![true], vec![], vec![]));
        assert_eq!(changed.len(), 1);
    }

    #[test]
    fn held_button_does_not_repeat() {
        let config = DetectorConfig::default();
        let mut state = DeviceSnapshotState::new();
        state.diff(&config, &snapshot(vec![true], vec![], vec![]));
        let changed = state.diff(&config, &snapshot(vec![true], vec![], vec![]));
        assert!(changed.is_empty());
    }

    #[test]
    fn axis_below_threshold_is_noise() {
        let config = DetectorConfig::with_axis_threshold(0.05);
        let mut state = DeviceSnapshotState::new();
        state.diff(&config, &snapshot(vec![], vec![0.0, 0.0], vec![]));

        let changed = state.diff(&config, &snapshot(vec![], vec![0.02, 0.0], vec![]));
        assert!(changed.is_empty());
    }

    #[test]
    fn axis_past_threshold_is_a_change() {
        let config = DetectorConfig::with_axis_threshold(0.05);
        let mut state = DeviceSnapshotState::new();
        state.diff(&config, &snapshot(vec![], vec![0.0], vec![]));

        let changed = state.diff(&config, &snapshot(vec![], vec![0.12], vec![]));
        assert_eq!(changed, vec![InputKey::new(InputCategory::Axes, 0)]);
    }

    #[test]
    fn axis_state_updates_even_for_noise() {
        // Sub-threshold drift still replaces the stored value, so a slow
        // creep never accumulates into a phantom change.
        let config = DetectorConfig::with_axis_threshold(0.05);
        let mut state = DeviceSnapshotState::new();
        state.diff(&config, &snapshot(vec![], vec![0.0], vec![]));
        state.diff(&config, &snapshot(vec![], vec![0.04], vec![]));
        let changed = state.diff(&config, &snapshot(vec![], vec![0.08], vec![]));
        assert!(changed.is_empty());
    }

    #[test]
    fn touch_reports_both_edges() {
        let config = DetectorConfig::default();
        let mut state = DeviceSnapshotState::new();

        let down = state.diff(&config, &snapshot(vec![], vec![], vec![true]));
        assert_eq!(down, vec![InputKey::new(InputCategory::Touches, 0)]);

        let up = state.diff(&config, &snapshot(vec![], vec![], vec![false]));
        assert_eq!(up, vec![InputKey::new(InputCategory::Touches, 0)]);
    }

    #[test]
    fn multiple_categories_in_one_sample() {
        let config = DetectorConfig::default();
        let mut state = DeviceSnapshotState::new();
        let changed = state.diff(
            &config,
            &snapshot(vec![false, true], vec![0.0, 0.5], vec![true]),
        );
        assert_eq!(
            changed,
            vec![
                InputKey::new(InputCategory::Buttons, 1),
                InputKey::new(InputCategory::Axes, 1),
                InputKey::new(InputCategory::Touches, 0),
            ]
        );
    }

    #[test]
    fn slot_timestamp_prefers_the_slots_own_stamp() {
        let snap = DeviceSnapshot {
            buttons: vec![true],
            button_timestamps: vec![7],
            device_timestamp: 42,
            ..Default::default()
        };
        assert_eq!(snap.slot_timestamp(InputKey::new(InputCategory::Buttons, 0)), 7);
    }

    #[test]
    fn slot_timestamp_falls_back_to_the_frame_stamp() {
        let snap = DeviceSnapshot {
            buttons: vec![true],
            device_timestamp: 42,
            ..Default::default()
        };
        assert_eq!(snap.slot_timestamp(InputKey::new(InputCategory::Buttons, 0)), 42);
        assert_eq!(snap.slot_timestamp(InputKey::new(InputCategory::Axes, 3)), 42);
    }

    #[test]
    fn reset_forgets_previous_values() {
        let config = DetectorConfig::default();
        let mut state = DeviceSnapshotState::new();
        state.diff(&config, &snapshot(vec![true], vec![], vec![]));
        state.reset();
        // Still-held button reads as a fresh press after reset.
        let changed = state.diff(&config, &snapshot(vec![true], vec![], vec![]));
        assert_eq!(changed.len(), 1);
    }
}
