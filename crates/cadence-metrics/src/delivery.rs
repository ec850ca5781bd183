//! Delivery flow: lead time and deployment cadence.

use std::collections::BTreeMap;
use std::sync::LazyLock;

use regex::{Regex, RegexBuilder};
use serde_json::json;

use cadence_core::{
    Attributes, CadenceError, Commit, Deployment, DeploymentKind, MetricValue, Tag,
};

use crate::release::ProductionTagMatcher;
use crate::stats;
use crate::Computation;

/// One week, the flow-efficiency threshold.
const WEEK_HOURS: f64 = 168.0;

static MERGE_SUBJECT_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    RegexBuilder::new(r"^(merge pull request|merge branch|merge remote-tracking branch|merged in)")
        .case_insensitive(true)
        .build()
        .expect("invalid regex")
});

/// Whether a commit subject is a merge into another branch.
///
/// # Examples
///
/// ```
/// use cadence_metrics::delivery::is_merge_subject;
///
/// assert!(is_merge_subject("Merge pull request #42 from org/feature"));
/// assert!(is_merge_subject("merge branch 'hotfix'"));
/// assert!(!is_merge_subject("fix: merge sorted runs faster"));
/// ```
pub fn is_merge_subject(subject: &str) -> bool {
    MERGE_SUBJECT_REGEX.is_match(subject.trim())
}

/// Measure lead time from each commit to the next production release.
///
/// Production releases are sorted ascending; the target for a commit is the
/// earliest release strictly after it, and commits with no qualifying
/// release are excluded. The headline value is the median lead time in
/// hours; percentiles use the nearest-rank rule, outliers the IQR rule, and
/// flow efficiency is the fraction of lead times within one week.
///
/// # Errors
///
/// Returns [`CadenceError`] on serialization failure (none in practice).
pub fn lead_time(
    commits: &[Commit],
    tags: &[Tag],
    matcher: &ProductionTagMatcher,
) -> Result<Computation, CadenceError> {
    let releases = matcher.production_releases(tags);

    let mut lead_hours: Vec<f64> = commits
        .iter()
        .filter_map(|commit| {
            releases
                .iter()
                .find(|release| release.timestamp > commit.timestamp)
                .map(|release| {
                    (release.timestamp - commit.timestamp).num_seconds() as f64 / 3600.0
                })
        })
        .collect();
    lead_hours.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));

    if lead_hours.is_empty() {
        let mut computation =
            Computation::empty(MetricValue::Scalar(0.0), "measured commits");
        computation
            .summary
            .insert("productionReleases".into(), json!(releases.len()));
        return Ok(computation);
    }

    let median = stats::median(&lead_hours);
    let within_week = lead_hours.iter().filter(|&&h| h <= WEEK_HOURS).count();

    let mut summary = Attributes::new();
    summary.insert("averageHours".into(), json!(stats::mean(&lead_hours)));
    summary.insert("medianHours".into(), json!(median));
    summary.insert("p25Hours".into(), json!(stats::percentile(&lead_hours, 25.0)));
    summary.insert("p75Hours".into(), json!(stats::percentile(&lead_hours, 75.0)));
    summary.insert("p95Hours".into(), json!(stats::percentile(&lead_hours, 95.0)));
    summary.insert("outliers".into(), json!(stats::count_outliers(&lead_hours)));
    summary.insert(
        "flowEfficiency".into(),
        json!(within_week as f64 / lead_hours.len() as f64),
    );
    summary.insert("productionReleases".into(), json!(releases.len()));

    Ok(Computation {
        value: MetricValue::Scalar(median),
        data_points: lead_hours.len(),
        data_points_label: "measured commits",
        summary,
    })
}

/// Count deployments per day from production tags and merge commits.
///
/// A deployment is a production tag or, when a main-like branch is present
/// (an empty branch list means the caller already scoped the query), a
/// merge commit. Deployments are deduplicated per calendar day: a tag wins
/// over any merge, otherwise the latest merge of the day survives. The
/// headline value is deployments per day over the span between first and
/// last deployment (floored at one day). Stability is
/// `max(0, 1 − CoV(inter-deployment intervals))`; fewer than two
/// deployments make the cadence trivially regular.
///
/// # Errors
///
/// Returns [`CadenceError`] on serialization failure (none in practice).
pub fn deployment_frequency(
    commits: &[Commit],
    tags: &[Tag],
    branches: &[String],
    matcher: &ProductionTagMatcher,
) -> Result<Computation, CadenceError> {
    let mut by_day: BTreeMap<String, Vec<Deployment>> = BTreeMap::new();

    for release in matcher.production_releases(tags) {
        let deployment = Deployment {
            kind: DeploymentKind::ProductionRelease,
            identifier: release.name.clone(),
            timestamp: release.timestamp,
            source: release
                .commit_hash
                .clone()
                .unwrap_or_else(|| release.name.clone()),
        };
        by_day
            .entry(release.timestamp.format("%Y-%m-%d").to_string())
            .or_default()
            .push(deployment);
    }

    if has_main_like_branch(branches) {
        for commit in commits {
            if !is_merge_subject(&commit.subject) {
                continue;
            }
            let deployment = Deployment {
                kind: DeploymentKind::MergeDeployment,
                identifier: commit.hash.clone(),
                timestamp: commit.timestamp,
                source: commit.hash.clone(),
            };
            by_day
                .entry(commit.timestamp.format("%Y-%m-%d").to_string())
                .or_default()
                .push(deployment);
        }
    }

    // One deployment per calendar day: tags beat merges, latest wins
    // within a kind.
    let deployments: Vec<Deployment> = by_day
        .into_values()
        .filter_map(|candidates| {
            let pick_latest = |kind: DeploymentKind| {
                candidates
                    .iter()
                    .filter(|d| d.kind == kind)
                    .max_by_key(|d| d.timestamp)
                    .cloned()
            };
            pick_latest(DeploymentKind::ProductionRelease)
                .or_else(|| pick_latest(DeploymentKind::MergeDeployment))
        })
        .collect();

    if deployments.is_empty() {
        return Ok(Computation::empty(MetricValue::Scalar(0.0), "deployments"));
    }

    let first = deployments[0].timestamp;
    let last = deployments[deployments.len() - 1].timestamp;
    let span_days = (last - first).num_days().max(1);
    let per_day = deployments.len() as f64 / span_days as f64;

    let intervals: Vec<f64> = deployments
        .windows(2)
        .map(|pair| (pair[1].timestamp - pair[0].timestamp).num_seconds() as f64 / 86_400.0)
        .collect();
    let stability = if intervals.is_empty() {
        1.0
    } else {
        (1.0 - stats::coefficient_of_variation(&intervals)).max(0.0)
    };

    let releases = deployments
        .iter()
        .filter(|d| d.kind == DeploymentKind::ProductionRelease)
        .count();
    let merges = deployments.len() - releases;

    let mut summary = Attributes::new();
    summary.insert("totalDeployments".into(), json!(deployments.len()));
    summary.insert("productionReleases".into(), json!(releases));
    summary.insert("mergeDeployments".into(), json!(merges));
    summary.insert("spanDays".into(), json!(span_days));
    summary.insert("perWeek".into(), json!(per_day * 7.0));
    summary.insert("stability".into(), json!(stability));
    summary.insert("cadence".into(), json!(classify_stability(stability)));

    Ok(Computation {
        value: MetricValue::Scalar(per_day),
        data_points: deployments.len(),
        data_points_label: "deployments",
        summary,
    })
}

fn has_main_like_branch(branches: &[String]) -> bool {
    const MAIN_LIKE: [&str; 4] = ["main", "master", "trunk", "production"];
    if branches.is_empty() {
        return true;
    }
    branches.iter().any(|branch| {
        let name = branch.strip_prefix("origin/").unwrap_or(branch);
        MAIN_LIKE.contains(&name)
    })
}

fn classify_stability(stability: f64) -> &'static str {
    if stability >= 0.8 {
        "highly_predictable"
    } else if stability >= 0.6 {
        "predictable"
    } else if stability >= 0.4 {
        "somewhat_predictable"
    } else {
        "unpredictable"
    }
}
