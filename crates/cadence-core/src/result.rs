use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::types::TimeWindow;
use crate::value::{Attributes, MetricValue};

/// Metadata attached to every metric result.
///
/// `category`, `data_points`, `data_points_label` and `execution_time` are
/// always present regardless of success or failure; metric-specific summary
/// keys are flattened alongside them.
///
/// # Examples
///
/// ```
/// use cadence_core::Metadata;
///
/// let meta = Metadata::new("activity", 0, "commits");
/// assert_eq!(meta.data_points, 0);
/// assert!(meta.error_class.is_none());
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Metadata {
    /// Metric family: activity, volume, ownership, coupling, delivery.
    pub category: String,
    /// How many records the metric was computed over.
    pub data_points: usize,
    /// What one data point counts (commits, files, deployments...).
    pub data_points_label: String,
    /// When the computation finished.
    pub computed_at: DateTime<Utc>,
    /// Wall-clock duration of the computation, in seconds.
    pub execution_time: f64,
    /// The pre-resolved options the computation ran with.
    #[serde(default, skip_serializing_if = "Attributes::is_empty")]
    pub options_used: Attributes,
    /// Error class tag, present only on failed results.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_class: Option<String>,
    /// Metric-specific summary keys.
    #[serde(flatten)]
    pub summary: Attributes,
}

impl Metadata {
    /// Metadata with zero timing and no summary, to be filled in by the
    /// runner.
    pub fn new(category: &str, data_points: usize, data_points_label: &str) -> Self {
        Self {
            category: category.to_string(),
            data_points,
            data_points_label: data_points_label.to_string(),
            computed_at: Utc::now(),
            execution_time: 0.0,
            options_used: Attributes::new(),
            error_class: None,
            summary: Attributes::new(),
        }
    }
}

/// The uniform envelope every metric computation produces.
///
/// Success and failure are mutually exclusive: a present `error` means
/// `value` is absent, and vice versa.
///
/// # Examples
///
/// ```
/// use cadence_core::{Metadata, MetricResult, MetricValue, TimeWindow};
/// use chrono::{TimeZone, Utc};
///
/// let window = TimeWindow::new(
///     Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap(),
///     Utc.with_ymd_and_hms(2025, 2, 1, 0, 0, 0).unwrap(),
/// ).unwrap();
///
/// let result = MetricResult {
///     name: "commit_frequency".into(),
///     repository: "cadence".into(),
///     window,
///     value: Some(MetricValue::Scalar(4.2)),
///     metadata: Metadata::new("activity", 10, "commits"),
///     error: None,
/// };
/// assert!(result.is_success());
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricResult {
    /// Metric name, e.g. `commit_frequency`.
    pub name: String,
    /// Repository label the metric was computed for.
    pub repository: String,
    /// The time window the input records were bounded by.
    pub window: TimeWindow,
    /// The computed value; absent on failure.
    pub value: Option<MetricValue>,
    /// Timing, counts and metric-specific summary keys.
    pub metadata: Metadata,
    /// Human-readable failure message; absent on success.
    pub error: Option<String>,
}

impl MetricResult {
    /// Whether the computation produced a value.
    pub fn is_success(&self) -> bool {
        self.error.is_none() && self.value.is_some()
    }
}
