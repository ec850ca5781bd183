//! Metric algorithms and the batch runner.
//!
//! One independent algorithm per metric: activity patterns, code volume,
//! ownership concentration, co-change coupling, and delivery flow. Each
//! algorithm consumes parsed records and returns an explicit
//! `Result<Computation, CadenceError>`; the [`runner::Runner`] converts
//! failures into failed result envelopes without aborting sibling metrics.

pub mod activity;
pub mod churn;
pub mod coupling;
pub mod delivery;
pub mod ownership;
pub mod release;
pub mod runner;
pub mod stats;

use cadence_core::{Attributes, MetricValue};

/// The raw outcome of one metric algorithm, before the runner wraps it in
/// a result envelope with timing and repository context.
#[derive(Debug, Clone)]
pub struct Computation {
    /// The computed value, shaped per metric.
    pub value: MetricValue,
    /// How many records the value was derived from.
    pub data_points: usize,
    /// What one data point counts.
    pub data_points_label: &'static str,
    /// Metric-specific summary keys for the result metadata.
    pub summary: Attributes,
}

impl Computation {
    /// The defined empty-input outcome: the metric's empty value shape with
    /// zero data points and no summary.
    pub fn empty(value: MetricValue, data_points_label: &'static str) -> Self {
        Self {
            value,
            data_points: 0,
            data_points_label,
            summary: Attributes::new(),
        }
    }
}
