//! Report sink: renders the latency report stream to the console.
//!
//! The core never retains reports; everything downstream of the correlator
//! lives here. An optional [`ReportHook`] observes each report as it passes
//! through, which is where the running statistics live when enabled.

use chrono::Local;
use tokio::sync::mpsc;
use tracing::{debug, info};

use crate::correlate::{InputCategory, LatencyReport};

/// Observes each report as the sink consumes it.
pub trait ReportHook: Send {
    fn on_report(&mut self, report: &LatencyReport);
}

/// Running per-category delta statistics (mean and standard deviation).
///
/// Deltas keep their sign: positive means the event mechanism was faster, so
/// a mean near zero says the mechanisms are evenly matched.
#[derive(Debug, Default)]
pub struct LatencyStats {
    buttons: Vec<f64>,
    axes: Vec<f64>,
    touches: Vec<f64>,
}

impl LatencyStats {
    pub fn new() -> Self {
        Self::default()
    }

    fn deltas(&self, category: InputCategory) -> &[f64] {
        match category {
            InputCategory::Buttons => &self.buttons,
            InputCategory::Axes => &self.axes,
            InputCategory::Touches => &self.touches,
        }
    }

    pub fn push(&mut self, category: InputCategory, delta_ms: f64) {
        let deltas = match category {
            InputCategory::Buttons => &mut self.buttons,
            InputCategory::Axes => &mut self.axes,
            InputCategory::Touches => &mut self.touches,
        };
        deltas.push(delta_ms);
    }

    pub fn count(&self, category: InputCategory) -> usize {
        self.deltas(category).len()
    }

    pub fn mean(&self, category: InputCategory) -> Option<f64> {
        let deltas = self.deltas(category);
        if deltas.is_empty() {
            return None;
        }
        Some(deltas.iter().sum::<f64>() / deltas.len() as f64)
    }

    pub fn stddev(&self, category: InputCategory) -> Option<f64> {
        let deltas = self.deltas(category);
        let mean = self.mean(category)?;
        let variance =
            deltas.iter().map(|d| (d - mean).powi(2)).sum::<f64>() / deltas.len() as f64;
        Some(variance.sqrt())
    }
}

impl ReportHook for LatencyStats {
    fn on_report(&mut self, report: &LatencyReport) {
        self.push(report.key.category, report.delta_ms);
        if let (Some(mean), Some(stddev)) = (
            self.mean(report.key.category),
            self.stddev(report.key.category),
        ) {
            info!(
                "{} stats: avg {:+.2} ms, stddev {:.2} ms over {} samples",
                report.key.category,
                mean,
                stddev,
                self.count(report.key.category)
            );
        }
    }
}

/// Consumes the report channel until the probe side closes it, printing one
/// line per report and feeding the hook when present.
pub async fn run_report_sink(
    mut reports: mpsc::Receiver<LatencyReport>,
    mut hook: Option<Box<dyn ReportHook>>,
) {
    println!(
        "Latency comparison started at {}",
        Local::now().format("%H:%M:%S%.3f")
    );

    while let Some(report) = reports.recv().await {
        println!("{}", report);
        if let Some(hook) = hook.as_mut() {
            hook.on_report(&report);
        }
    }

    debug!("Report channel closed, sink shutting down");
}
