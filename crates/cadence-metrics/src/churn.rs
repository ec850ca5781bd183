//! Per-file churn: where the lines move.

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};
use serde_json::json;

use cadence_core::{Attributes, CadenceError, Commit, MetricValue};

use crate::Computation;

/// Churn totals for a single file.
///
/// # Examples
///
/// ```
/// use cadence_metrics::churn::FileChurn;
///
/// let churn = FileChurn {
///     file: "src/main.rs".into(),
///     additions: 120,
///     deletions: 80,
///     total_churn: 200,
///     churn_ratio: 40.0,
///     commits: 12,
///     authors: 3,
/// };
/// assert_eq!(churn.total_churn, 200);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileChurn {
    /// File path relative to repo root.
    pub file: String,
    /// Lines added across all commits.
    pub additions: u64,
    /// Lines deleted across all commits.
    pub deletions: u64,
    /// Additions plus deletions.
    pub total_churn: u64,
    /// Deletions as a percentage of total churn (0 when total is 0).
    pub churn_ratio: f64,
    /// Commits touching this file.
    pub commits: u64,
    /// Distinct contributors touching this file.
    pub authors: u64,
}

/// Accumulate per-file churn across all commits.
///
/// Rows are sorted non-increasing by `total_churn`, ties broken by file
/// path ascending.
///
/// # Errors
///
/// Returns [`CadenceError`] if the rows fail to serialize.
pub fn file_churn(commits: &[Commit]) -> Result<Computation, CadenceError> {
    if commits.is_empty() {
        return Ok(Computation::empty(MetricValue::Table(Vec::new()), "files"));
    }

    struct Acc {
        additions: u64,
        deletions: u64,
        commits: u64,
        authors: HashSet<String>,
    }

    let mut per_file: HashMap<String, Acc> = HashMap::new();
    for commit in commits {
        let author = commit.author_key();
        for change in &commit.file_changes {
            let acc = per_file.entry(change.filename.clone()).or_insert(Acc {
                additions: 0,
                deletions: 0,
                commits: 0,
                authors: HashSet::new(),
            });
            acc.additions += change.additions;
            acc.deletions += change.deletions;
            acc.commits += 1;
            acc.authors.insert(author.clone());
        }
    }

    let mut rows: Vec<FileChurn> = per_file
        .into_iter()
        .map(|(file, acc)| {
            let total = acc.additions + acc.deletions;
            let ratio = if total == 0 {
                0.0
            } else {
                acc.deletions as f64 / total as f64 * 100.0
            };
            FileChurn {
                file,
                additions: acc.additions,
                deletions: acc.deletions,
                total_churn: total,
                churn_ratio: ratio,
                commits: acc.commits,
                authors: acc.authors.len() as u64,
            }
        })
        .collect();
    rows.sort_by(|a, b| b.total_churn.cmp(&a.total_churn).then(a.file.cmp(&b.file)));

    let mut summary = Attributes::new();
    summary.insert(
        "totalChurn".into(),
        json!(rows.iter().map(|r| r.total_churn).sum::<u64>()),
    );
    if let Some(top) = rows.first() {
        summary.insert("mostChurnedFile".into(), json!(top.file));
    }

    let data_points = rows.len();
    Ok(Computation {
        value: MetricValue::table(&rows)?,
        data_points,
        data_points_label: "files",
        summary,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use cadence_core::FileChange;
    use chrono::{TimeZone, Utc};

    fn make_commit(author: &str, files: Vec<(&str, u64, u64)>) -> Commit {
        Commit {
            hash: "abc".into(),
            author: author.into(),
            email: None,
            timestamp: Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap(),
            subject: "change".into(),
            additions: files.iter().map(|(_, a, _)| a).sum(),
            deletions: files.iter().map(|(_, _, d)| d).sum(),
            file_changes: files
                .into_iter()
                .map(|(filename, additions, deletions)| FileChange {
                    filename: filename.into(),
                    additions,
                    deletions,
                })
                .collect(),
        }
    }

    #[test]
    fn accumulates_per_file_totals() {
        let commits = vec![
            make_commit("alice", vec![("a.rs", 10, 5), ("b.rs", 1, 0)]),
            make_commit("bob", vec![("a.rs", 20, 15)]),
        ];
        let result = file_churn(&commits).unwrap();
        let MetricValue::Table(rows) = &result.value else {
            panic!("expected table");
        };
        assert_eq!(rows[0]["file"], "a.rs");
        assert_eq!(rows[0]["additions"], 30);
        assert_eq!(rows[0]["deletions"], 20);
        assert_eq!(rows[0]["totalChurn"], 50);
        assert_eq!(rows[0]["commits"], 2);
        assert_eq!(rows[0]["authors"], 2);
        assert_eq!(result.summary["mostChurnedFile"], "a.rs");
    }

    #[test]
    fn rows_sorted_non_increasing_by_total_churn() {
        let commits = vec![make_commit(
            "alice",
            vec![("small.rs", 1, 0), ("big.rs", 50, 50), ("mid.rs", 10, 5)],
        )];
        let result = file_churn(&commits).unwrap();
        let MetricValue::Table(rows) = &result.value else {
            panic!("expected table");
        };
        let churns: Vec<u64> = rows
            .iter()
            .map(|r| r["totalChurn"].as_u64().unwrap())
            .collect();
        assert!(churns.windows(2).all(|w| w[0] >= w[1]));
    }

    #[test]
    fn churn_ratio_is_deletion_percentage() {
        let commits = vec![make_commit("alice", vec![("a.rs", 60, 40)])];
        let result = file_churn(&commits).unwrap();
        let MetricValue::Table(rows) = &result.value else {
            panic!("expected table");
        };
        assert_eq!(rows[0]["churnRatio"], 40.0);
    }

    #[test]
    fn zero_churn_file_has_zero_ratio() {
        // Binary-only change: numstat dashes became zeros.
        let commits = vec![make_commit("alice", vec![("logo.png", 0, 0)])];
        let result = file_churn(&commits).unwrap();
        let MetricValue::Table(rows) = &result.value else {
            panic!("expected table");
        };
        assert_eq!(rows[0]["churnRatio"], 0.0);
    }

    #[test]
    fn ties_break_by_file_name() {
        let commits = vec![make_commit("alice", vec![("z.rs", 5, 0), ("a.rs", 5, 0)])];
        let result = file_churn(&commits).unwrap();
        let MetricValue::Table(rows) = &result.value else {
            panic!("expected table");
        };
        assert_eq!(rows[0]["file"], "a.rs");
        assert_eq!(rows[1]["file"], "z.rs");
    }

    #[test]
    fn empty_input_returns_empty_table() {
        let result = file_churn(&[]).unwrap();
        assert_eq!(result.data_points, 0);
        assert!(result.value.is_empty());
    }
}
