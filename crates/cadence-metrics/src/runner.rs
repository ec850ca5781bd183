//! Batch execution: one envelope per requested metric, failures isolated.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;
use std::time::Instant;

use chrono::Utc;
use regex::{Regex, RegexBuilder};
use serde_json::json;

use cadence_core::{
    CadenceError, Commit, HistoryRecords, Metadata, MetricOptions, MetricResult, TimeWindow,
};

use crate::release::ProductionTagMatcher;
use crate::{activity, churn, coupling, delivery, ownership, Computation};

static BOT_AUTHOR_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    RegexBuilder::new(r"\[bot\]|[-_ ]bot$|dependabot|renovate")
        .case_insensitive(true)
        .build()
        .expect("invalid regex")
});

/// Every metric the runner knows how to compute.
///
/// # Examples
///
/// ```
/// use cadence_metrics::runner::Metric;
///
/// assert_eq!(Metric::ALL.len(), 9);
/// assert_eq!(Metric::LeadTime.name(), "lead_time");
/// assert_eq!(Metric::LeadTime.category(), "delivery");
/// assert_eq!("file_churn".parse::<Metric>().unwrap(), Metric::FileChurn);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Metric {
    CommitFrequency,
    CommitSize,
    CommitsPerDeveloper,
    FileChurn,
    AuthorsPerFile,
    FileOwnership,
    CoChangeCoupling,
    LeadTime,
    DeploymentFrequency,
}

impl Metric {
    /// All nine metrics, in presentation order.
    pub const ALL: [Metric; 9] = [
        Metric::CommitFrequency,
        Metric::CommitSize,
        Metric::CommitsPerDeveloper,
        Metric::FileChurn,
        Metric::AuthorsPerFile,
        Metric::FileOwnership,
        Metric::CoChangeCoupling,
        Metric::LeadTime,
        Metric::DeploymentFrequency,
    ];

    /// The wire name, used as the key in batch output.
    pub fn name(&self) -> &'static str {
        match self {
            Metric::CommitFrequency => "commit_frequency",
            Metric::CommitSize => "commit_size",
            Metric::CommitsPerDeveloper => "commits_per_developer",
            Metric::FileChurn => "file_churn",
            Metric::AuthorsPerFile => "authors_per_file",
            Metric::FileOwnership => "file_ownership",
            Metric::CoChangeCoupling => "co_change_coupling",
            Metric::LeadTime => "lead_time",
            Metric::DeploymentFrequency => "deployment_frequency",
        }
    }

    /// The metric family reported in result metadata.
    pub fn category(&self) -> &'static str {
        match self {
            Metric::CommitFrequency | Metric::CommitsPerDeveloper => "activity",
            Metric::CommitSize | Metric::FileChurn => "volume",
            Metric::AuthorsPerFile | Metric::FileOwnership => "ownership",
            Metric::CoChangeCoupling => "coupling",
            Metric::LeadTime | Metric::DeploymentFrequency => "delivery",
        }
    }

    /// The per-record count label used when a metric fails before producing
    /// a computation.
    fn data_points_label(&self) -> &'static str {
        match self {
            Metric::CommitFrequency | Metric::CommitSize | Metric::CommitsPerDeveloper => {
                "commits"
            }
            Metric::FileChurn | Metric::AuthorsPerFile | Metric::FileOwnership => "files",
            Metric::CoChangeCoupling => "file pairs",
            Metric::LeadTime => "measured commits",
            Metric::DeploymentFrequency => "deployments",
        }
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Metric {
    type Err = CadenceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Metric::ALL
            .into_iter()
            .find(|metric| metric.name() == s)
            .ok_or_else(|| CadenceError::Validation(format!("unknown metric: {s}")))
    }
}

/// Executes metrics over one parsed record set and wraps every outcome,
/// success or failure, in a [`MetricResult`] envelope.
///
/// # Examples
///
/// ```
/// use cadence_core::{HistoryRecords, MetricOptions, TimeWindow};
/// use cadence_metrics::runner::{Metric, Runner};
/// use chrono::{TimeZone, Utc};
///
/// let window = TimeWindow::new(
///     Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap(),
///     Utc.with_ymd_and_hms(2025, 7, 1, 0, 0, 0).unwrap(),
/// ).unwrap();
/// let runner = Runner::new("acme/api", window, MetricOptions::default()).unwrap();
///
/// let results = runner.run_all(&Metric::ALL, &HistoryRecords::default());
/// assert_eq!(results.len(), 9);
/// ```
pub struct Runner {
    repository: String,
    window: TimeWindow,
    options: MetricOptions,
    matcher: ProductionTagMatcher,
}

impl Runner {
    /// Create a runner for one repository and window.
    ///
    /// # Errors
    ///
    /// Returns [`CadenceError::Validation`] when the repository label is
    /// empty. This is a caller bug, not a per-metric failure, so it is not
    /// converted into a failed envelope.
    pub fn new(
        repository: &str,
        window: TimeWindow,
        options: MetricOptions,
    ) -> Result<Self, CadenceError> {
        if repository.trim().is_empty() {
            return Err(CadenceError::Validation(
                "repository label must not be empty".to_string(),
            ));
        }
        Ok(Self {
            repository: repository.to_string(),
            window,
            options,
            matcher: ProductionTagMatcher::default(),
        })
    }

    /// Compute one metric, converting any computation error into a failed
    /// result envelope.
    pub fn run(&self, metric: Metric, records: &HistoryRecords) -> MetricResult {
        let started = Instant::now();
        // Merge commits always count for deployment frequency; excluding
        // them there would erase the very events being measured.
        let keep_merges =
            self.options.include_merges || metric == Metric::DeploymentFrequency;
        let commits = self.filtered_commits(&records.commits, keep_merges);

        let outcome = match metric {
            Metric::CommitFrequency => activity::commit_frequency(&commits),
            Metric::CommitSize => activity::commit_size(&commits),
            Metric::CommitsPerDeveloper => activity::commits_per_developer(&commits),
            Metric::FileChurn => churn::file_churn(&commits),
            Metric::AuthorsPerFile => ownership::authors_per_file(&commits),
            Metric::FileOwnership => ownership::file_ownership(&commits),
            Metric::CoChangeCoupling => coupling::co_change_coupling(&commits),
            Metric::LeadTime => delivery::lead_time(&commits, &records.tags, &self.matcher),
            Metric::DeploymentFrequency => delivery::deployment_frequency(
                &commits,
                &records.tags,
                &records.branches,
                &self.matcher,
            ),
        };
        let elapsed = started.elapsed().as_secs_f64();

        match outcome {
            Ok(computation) => self.success(metric, computation, elapsed),
            Err(error) => self.failure(metric, error, elapsed),
        }
    }

    /// Compute every requested metric sequentially, in caller order.
    ///
    /// A failed metric never aborts its siblings: N requested metrics
    /// always produce N results.
    pub fn run_all(
        &self,
        metrics: &[Metric],
        records: &HistoryRecords,
    ) -> BTreeMap<String, MetricResult> {
        let mut results = BTreeMap::new();
        for &metric in metrics {
            results.insert(metric.name().to_string(), self.run(metric, records));
        }

        let succeeded = results.values().filter(|r| r.is_success()).count();
        log::info!(
            "computed {} metrics for {}: {} succeeded, {} failed",
            results.len(),
            self.repository,
            succeeded,
            results.len() - succeeded,
        );
        results
    }

    fn filtered_commits(&self, commits: &[Commit], keep_merges: bool) -> Vec<Commit> {
        commits
            .iter()
            .filter(|commit| {
                if let Some(authors) = &self.options.authors {
                    let matched = authors.iter().any(|wanted| {
                        commit.author == *wanted
                            || commit.email.as_deref() == Some(wanted.as_str())
                            || commit.author_key() == *wanted
                    });
                    if !matched {
                        return false;
                    }
                }
                if self.options.exclude_bots && is_bot(commit) {
                    return false;
                }
                if !keep_merges && delivery::is_merge_subject(&commit.subject) {
                    return false;
                }
                true
            })
            .cloned()
            .collect()
    }

    fn success(&self, metric: Metric, computation: Computation, elapsed: f64) -> MetricResult {
        let mut metadata = Metadata::new(
            metric.category(),
            computation.data_points,
            computation.data_points_label,
        );
        metadata.computed_at = Utc::now();
        metadata.execution_time = elapsed;
        metadata.options_used = self.options_used();
        metadata.summary = computation.summary;

        MetricResult {
            name: metric.name().to_string(),
            repository: self.repository.clone(),
            window: self.window,
            value: Some(computation.value),
            metadata,
            error: None,
        }
    }

    fn failure(&self, metric: Metric, error: CadenceError, elapsed: f64) -> MetricResult {
        log::warn!("metric {metric} failed for {}: {error}", self.repository);

        let mut metadata = Metadata::new(metric.category(), 0, metric.data_points_label());
        metadata.computed_at = Utc::now();
        metadata.execution_time = elapsed;
        metadata.options_used = self.options_used();
        metadata.error_class = Some(error.class().to_string());

        MetricResult {
            name: metric.name().to_string(),
            repository: self.repository.clone(),
            window: self.window,
            value: None,
            metadata,
            error: Some(error.to_string()),
        }
    }

    fn options_used(&self) -> cadence_core::Attributes {
        let mut used = cadence_core::Attributes::new();
        if let Some(authors) = &self.options.authors {
            used.insert("authors".into(), json!(authors));
        }
        used.insert("excludeBots".into(), json!(self.options.exclude_bots));
        used.insert("includeMerges".into(), json!(self.options.include_merges));
        used
    }
}

fn is_bot(commit: &Commit) -> bool {
    BOT_AUTHOR_REGEX.is_match(&commit.author)
        || commit
            .email
            .as_deref()
            .map_or(false, |email| BOT_AUTHOR_REGEX.is_match(email))
}
