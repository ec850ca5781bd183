//! Activity patterns: when work happens and who does it.

use std::collections::{BTreeMap, HashMap};

use chrono::Timelike;
use serde::{Deserialize, Serialize};
use serde_json::json;

use cadence_core::{Attributes, CadenceError, Commit, MetricValue};

use crate::stats;
use crate::Computation;

/// One row of the commits-per-developer table.
///
/// # Examples
///
/// ```
/// use cadence_metrics::activity::DeveloperActivity;
///
/// let row = DeveloperActivity {
///     author: "alice <alice@example.com>".into(),
///     commits: 12,
///     share: 60.0,
/// };
/// assert_eq!(row.commits, 12);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeveloperActivity {
    /// Contributor identity key (name, or `name <email>`).
    pub author: String,
    /// Commits attributed to this contributor.
    pub commits: u64,
    /// Percentage of all commits.
    pub share: f64,
}

/// Bucket commits by calendar date, hour of day, and weekday.
///
/// The value is a keyed table with three bucket maps (`byDate`, `byHour`,
/// `byWeekday`); all 24 hour buckets are present even when zero. The
/// consistency score is `max(0, 100 − CoV(daily counts) × 50)`, and 100
/// when the history spans a single day. Busiest day and hour break ties by
/// first bucket encountered in iteration order (chronological dates, hours
/// 00→23).
///
/// # Errors
///
/// Returns [`CadenceError`] if the bucket maps fail to serialize.
pub fn commit_frequency(commits: &[Commit]) -> Result<Computation, CadenceError> {
    if commits.is_empty() {
        return Ok(Computation::empty(
            MetricValue::KeyedTable(BTreeMap::new()),
            "commits",
        ));
    }

    let mut by_date: BTreeMap<String, u64> = BTreeMap::new();
    let mut by_hour: BTreeMap<String, u64> =
        (0..24).map(|hour| (format!("{hour:02}"), 0)).collect();
    let mut by_weekday: BTreeMap<String, u64> = BTreeMap::new();

    for commit in commits {
        let date = commit.timestamp.format("%Y-%m-%d").to_string();
        *by_date.entry(date).or_default() += 1;
        *by_hour
            .entry(format!("{:02}", commit.timestamp.hour()))
            .or_default() += 1;
        let weekday = commit.timestamp.format("%A").to_string();
        *by_weekday.entry(weekday).or_default() += 1;
    }

    let daily: Vec<f64> = by_date.values().map(|&count| count as f64).collect();
    let consistency = if by_date.len() <= 1 {
        100.0
    } else {
        (100.0 - stats::coefficient_of_variation(&daily) * 50.0).max(0.0)
    };

    let busiest_day = busiest_bucket(&by_date);
    let busiest_hour = busiest_bucket(&by_hour);

    let mut value = BTreeMap::new();
    value.insert("byDate".to_string(), counts_to_attributes(&by_date));
    value.insert("byHour".to_string(), counts_to_attributes(&by_hour));
    value.insert("byWeekday".to_string(), counts_to_attributes(&by_weekday));

    let mut summary = Attributes::new();
    summary.insert("consistencyScore".into(), json!(consistency));
    summary.insert("busiestDay".into(), json!(busiest_day));
    summary.insert("busiestHour".into(), json!(busiest_hour));
    summary.insert("activeDays".into(), json!(by_date.len()));

    Ok(Computation {
        value: MetricValue::KeyedTable(value),
        data_points: commits.len(),
        data_points_label: "commits",
        summary,
    })
}

/// Bucket per-commit sizes (additions + deletions) into a distribution:
/// `small` ≤10, `medium` 11–100, `large` 101–500, `huge` >500.
///
/// # Errors
///
/// Returns [`CadenceError`] on serialization failure (none in practice).
pub fn commit_size(commits: &[Commit]) -> Result<Computation, CadenceError> {
    if commits.is_empty() {
        return Ok(Computation::empty(
            MetricValue::Distribution(BTreeMap::new()),
            "commits",
        ));
    }

    let mut buckets: BTreeMap<String, u64> = ["small", "medium", "large", "huge"]
        .into_iter()
        .map(|bucket| (bucket.to_string(), 0))
        .collect();
    let mut largest: Option<(&Commit, u64)> = None;

    let mut sizes: Vec<f64> = Vec::with_capacity(commits.len());
    for commit in commits {
        let size = commit.churn();
        sizes.push(size as f64);

        let bucket = match size {
            0..=10 => "small",
            11..=100 => "medium",
            101..=500 => "large",
            _ => "huge",
        };
        *buckets.entry(bucket.to_string()).or_default() += 1;

        if largest.map_or(true, |(_, max)| size > max) {
            largest = Some((commit, size));
        }
    }

    sizes.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    let total: f64 = sizes.iter().sum();

    let mut summary = Attributes::new();
    summary.insert("averageSize".into(), json!(stats::mean(&sizes)));
    summary.insert("medianSize".into(), json!(stats::median(&sizes)));
    summary.insert("totalLinesChanged".into(), json!(total as u64));
    if let Some((commit, size)) = largest {
        summary.insert("largestCommit".into(), json!(commit.hash));
        summary.insert("largestCommitSize".into(), json!(size));
    }

    Ok(Computation {
        value: MetricValue::Distribution(buckets),
        data_points: commits.len(),
        data_points_label: "commits",
        summary,
    })
}

/// Group commits by contributor identity and rank by commit count.
///
/// Rows are sorted descending by commit count, ties broken by author key
/// ascending; the top contributor is the first row.
///
/// # Errors
///
/// Returns [`CadenceError`] if the rows fail to serialize.
pub fn commits_per_developer(commits: &[Commit]) -> Result<Computation, CadenceError> {
    if commits.is_empty() {
        return Ok(Computation::empty(MetricValue::Table(Vec::new()), "commits"));
    }

    let mut counts: HashMap<String, u64> = HashMap::new();
    for commit in commits {
        *counts.entry(commit.author_key()).or_default() += 1;
    }

    let total = commits.len() as f64;
    let mut rows: Vec<DeveloperActivity> = counts
        .into_iter()
        .map(|(author, count)| DeveloperActivity {
            author,
            commits: count,
            share: count as f64 / total * 100.0,
        })
        .collect();
    rows.sort_by(|a, b| b.commits.cmp(&a.commits).then(a.author.cmp(&b.author)));

    let mut summary = Attributes::new();
    summary.insert("developerCount".into(), json!(rows.len()));
    summary.insert("topContributor".into(), json!(rows[0].author));
    summary.insert("topContributorCommits".into(), json!(rows[0].commits));

    Ok(Computation {
        value: MetricValue::table(&rows)?,
        data_points: commits.len(),
        data_points_label: "commits",
        summary,
    })
}

/// First bucket holding the maximum count, in map iteration order.
fn busiest_bucket(counts: &BTreeMap<String, u64>) -> String {
    let mut best: Option<(&String, u64)> = None;
    for (bucket, &count) in counts {
        if best.map_or(true, |(_, max)| count > max) {
            best = Some((bucket, count));
        }
    }
    best.map(|(bucket, _)| bucket.clone()).unwrap_or_default()
}

fn counts_to_attributes(counts: &BTreeMap<String, u64>) -> Attributes {
    counts
        .iter()
        .map(|(bucket, &count)| (bucket.clone(), json!(count)))
        .collect()
}
