//! Co-change coupling: files that move together.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use serde::{Deserialize, Serialize};
use serde_json::json;

use cadence_core::{Attributes, CadenceError, Commit, MetricValue};

use crate::Computation;

/// A pair of files that change together.
///
/// # Examples
///
/// ```
/// use cadence_metrics::coupling::CoChangePair;
///
/// let pair = CoChangePair {
///     file_a: "src/auth.rs".into(),
///     file_b: "src/session.rs".into(),
///     co_changes: 3,
///     changes_a: 5,
///     changes_b: 4,
///     strength: 0.5,
///     category: "MEDIUM".into(),
/// };
/// assert_eq!(pair.co_changes, 3);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CoChangePair {
    /// First file of the pair (lexicographically smaller).
    pub file_a: String,
    /// Second file of the pair.
    pub file_b: String,
    /// Commits touching both files.
    pub co_changes: u64,
    /// Commits touching `file_a` anywhere in the window.
    pub changes_a: u64,
    /// Commits touching `file_b` anywhere in the window.
    pub changes_b: u64,
    /// Jaccard similarity `co / (a + b − co)`.
    pub strength: f64,
    /// HIGH (>0.5), MEDIUM (≥0.2), LOW (≥0.1) or MINIMAL.
    pub category: String,
}

/// Detect co-change coupling between files.
///
/// Each commit contributes every 2-combination of its sorted unique
/// filename set as one observation. Coupling strength is the Jaccard
/// similarity of the two files' commit-touch sets, which is symmetric in
/// the pair by construction. Rows are sorted descending by strength, ties
/// broken by the normalized pair key. A file appearing in at least three
/// pairs stronger than 0.3 is flagged as an architectural hotspot.
///
/// # Errors
///
/// Returns [`CadenceError`] if the rows fail to serialize.
pub fn co_change_coupling(commits: &[Commit]) -> Result<Computation, CadenceError> {
    if commits.is_empty() {
        return Ok(Computation::empty(
            MetricValue::Table(Vec::new()),
            "file pairs",
        ));
    }

    let mut file_totals: HashMap<String, u64> = HashMap::new();
    // Normalized pair keys iterate in ascending order, which fixes the
    // tie-break for equal strengths below.
    let mut pair_counts: BTreeMap<(String, String), u64> = BTreeMap::new();

    for commit in commits {
        let files: BTreeSet<&str> = commit
            .file_changes
            .iter()
            .map(|change| change.filename.as_str())
            .collect();

        for file in &files {
            *file_totals.entry((*file).to_string()).or_default() += 1;
        }

        let unique: Vec<&str> = files.into_iter().collect();
        for i in 0..unique.len() {
            for j in (i + 1)..unique.len() {
                let key = (unique[i].to_string(), unique[j].to_string());
                *pair_counts.entry(key).or_default() += 1;
            }
        }
    }

    let mut rows: Vec<CoChangePair> = Vec::with_capacity(pair_counts.len());
    for ((file_a, file_b), co_changes) in pair_counts {
        let changes_a = file_totals.get(&file_a).copied().unwrap_or(0);
        let changes_b = file_totals.get(&file_b).copied().unwrap_or(0);
        let union = changes_a + changes_b - co_changes;
        let strength = if changes_a == 0 || changes_b == 0 || union == 0 {
            0.0
        } else {
            co_changes as f64 / union as f64
        };

        rows.push(CoChangePair {
            file_a,
            file_b,
            co_changes,
            changes_a,
            changes_b,
            strength,
            category: categorize(strength).to_string(),
        });
    }
    // Stable sort keeps the ascending pair-key order for equal strengths.
    rows.sort_by(|a, b| {
        b.strength
            .partial_cmp(&a.strength)
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    let mut hotspot_counts: BTreeMap<&str, u64> = BTreeMap::new();
    for row in &rows {
        if row.strength > 0.3 {
            *hotspot_counts.entry(&row.file_a).or_default() += 1;
            *hotspot_counts.entry(&row.file_b).or_default() += 1;
        }
    }
    let hotspots: Vec<&str> = hotspot_counts
        .iter()
        .filter(|(_, &count)| count >= 3)
        .map(|(&file, _)| file)
        .collect();

    let mut summary = Attributes::new();
    summary.insert("architecturalHotspots".into(), json!(hotspots));
    if let Some(top) = rows.first() {
        summary.insert(
            "strongestPair".into(),
            json!(format!("{} <-> {}", top.file_a, top.file_b)),
        );
        summary.insert("strongestCoupling".into(), json!(top.strength));
    }

    let data_points = rows.len();
    Ok(Computation {
        value: MetricValue::table(&rows)?,
        data_points,
        data_points_label: "file pairs",
        summary,
    })
}

fn categorize(strength: f64) -> &'static str {
    if strength > 0.5 {
        "HIGH"
    } else if strength >= 0.2 {
        "MEDIUM"
    } else if strength >= 0.1 {
        "LOW"
    } else {
        "MINIMAL"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cadence_core::FileChange;
    use chrono::{TimeZone, Utc};

    fn make_commit(hash: &str, files: Vec<&str>) -> Commit {
        Commit {
            hash: hash.into(),
            author: "alice".into(),
            email: None,
            timestamp: Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap(),
            subject: "change".into(),
            additions: 0,
            deletions: 0,
            file_changes: files
                .into_iter()
                .map(|filename| FileChange {
                    filename: filename.into(),
                    additions: 1,
                    deletions: 0,
                })
                .collect(),
        }
    }

    fn pair<'a>(rows: &'a [Attributes], a: &str, b: &str) -> &'a Attributes {
        rows.iter()
            .find(|row| row["fileA"] == a && row["fileB"] == b)
            .expect("pair not found")
    }

    #[test]
    fn jaccard_strength_matches_hand_computation() {
        // Commits touch {a,b}, {a}, {b,c}:
        // a<->b: co=1, a total=2, b total=2 -> 1/(2+2-1) = 1/3
        let commits = vec![
            make_commit("c1", vec!["a", "b"]),
            make_commit("c2", vec!["a"]),
            make_commit("c3", vec!["b", "c"]),
        ];
        let result = co_change_coupling(&commits).unwrap();
        let MetricValue::Table(rows) = &result.value else {
            panic!("expected table");
        };
        let ab = pair(rows, "a", "b");
        assert_eq!(ab["coChanges"], 1);
        assert_eq!(ab["changesA"], 2);
        assert_eq!(ab["changesB"], 2);
        let strength = ab["strength"].as_f64().unwrap();
        assert!((strength - 1.0 / 3.0).abs() < 1e-12);
    }

    #[test]
    fn pair_keys_are_symmetric() {
        // Same pair seen in both orders collapses to one normalized row.
        let commits = vec![
            make_commit("c1", vec!["z.rs", "a.rs"]),
            make_commit("c2", vec!["a.rs", "z.rs"]),
        ];
        let result = co_change_coupling(&commits).unwrap();
        let MetricValue::Table(rows) = &result.value else {
            panic!("expected table");
        };
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0]["fileA"], "a.rs");
        assert_eq!(rows[0]["fileB"], "z.rs");
        assert_eq!(rows[0]["coChanges"], 2);
        assert_eq!(rows[0]["strength"], 1.0);
        assert_eq!(rows[0]["category"], "HIGH");
    }

    #[test]
    fn duplicate_filenames_in_one_commit_count_once() {
        let commits = vec![make_commit("c1", vec!["a.rs", "a.rs", "b.rs"])];
        let result = co_change_coupling(&commits).unwrap();
        let MetricValue::Table(rows) = &result.value else {
            panic!("expected table");
        };
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0]["coChanges"], 1);
        assert_eq!(rows[0]["changesA"], 1);
    }

    #[test]
    fn categories_follow_thresholds() {
        assert_eq!(categorize(0.51), "HIGH");
        assert_eq!(categorize(0.5), "MEDIUM");
        assert_eq!(categorize(0.2), "MEDIUM");
        assert_eq!(categorize(0.19), "LOW");
        assert_eq!(categorize(0.1), "LOW");
        assert_eq!(categorize(0.09), "MINIMAL");
    }

    #[test]
    fn rows_sorted_descending_by_strength() {
        let commits = vec![
            make_commit("c1", vec!["a", "b"]),
            make_commit("c2", vec!["a", "b"]),
            make_commit("c3", vec!["a", "c"]),
            make_commit("c4", vec!["c"]),
        ];
        let result = co_change_coupling(&commits).unwrap();
        let MetricValue::Table(rows) = &result.value else {
            panic!("expected table");
        };
        let strengths: Vec<f64> = rows
            .iter()
            .map(|row| row["strength"].as_f64().unwrap())
            .collect();
        assert!(strengths.windows(2).all(|w| w[0] >= w[1]));
    }

    #[test]
    fn hotspot_needs_three_strong_pairs() {
        // hub couples strongly with three spokes.
        let commits = vec![
            make_commit("c1", vec!["hub", "s1"]),
            make_commit("c2", vec!["hub", "s1"]),
            make_commit("c3", vec!["hub", "s2"]),
            make_commit("c4", vec!["hub", "s2"]),
            make_commit("c5", vec!["hub", "s3"]),
            make_commit("c6", vec!["hub", "s3"]),
        ];
        let result = co_change_coupling(&commits).unwrap();
        let hotspots = result.summary["architecturalHotspots"]
            .as_array()
            .unwrap();
        assert_eq!(hotspots.len(), 1);
        assert_eq!(hotspots[0], "hub");
    }

    #[test]
    fn single_file_commits_produce_no_pairs() {
        let commits = vec![make_commit("c1", vec!["a"]), make_commit("c2", vec!["b"])];
        let result = co_change_coupling(&commits).unwrap();
        assert!(result.value.is_empty());
        assert_eq!(result.data_points, 0);
    }

    #[test]
    fn empty_input_returns_empty_table() {
        let result = co_change_coupling(&[]).unwrap();
        assert_eq!(result.data_points, 0);
        assert!(result.value.is_empty());
    }
}
