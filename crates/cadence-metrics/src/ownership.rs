//! Ownership concentration: who knows each file.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use serde::{Deserialize, Serialize};
use serde_json::json;

use cadence_core::{Attributes, CadenceError, Commit, MetricValue};

use crate::Computation;

/// Author-count entry for one file.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileAuthors {
    /// Distinct contributors who touched the file.
    pub authors: usize,
    /// Their identity keys, sorted.
    pub author_names: Vec<String>,
    /// Bus-factor risk: HIGH (1 author), MEDIUM (2–3), LOW (>3).
    pub risk_level: String,
    /// SINGLE_OWNER, SHARED, COLLABORATIVE or HIGHLY_COLLABORATIVE.
    pub ownership_type: String,
}

/// Changed-lines ownership entry for one file.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileOwnership {
    /// Author with the largest share of changed lines.
    pub primary_owner: String,
    /// That share, as a percentage.
    pub primary_share: f64,
    /// Herfindahl-Hirschman concentration index over author shares, 0–100.
    pub concentration: f64,
    /// SINGLE_OWNER, DOMINANT_OWNER, PRIMARY_OWNER, SHARED_OWNERSHIP or
    /// DISTRIBUTED_OWNERSHIP.
    pub ownership_type: String,
    /// Distinct contributors.
    pub contributors: usize,
}

/// Count distinct authors per file and classify bus-factor risk.
///
/// The collaboration score rewards shared and collaborative files and
/// penalizes single-owner ones:
/// `(shared×50 + collaborative×100 − single×10) / files`, clamped to
/// [0, 100]. Highly collaborative files count toward the collaborative
/// term.
///
/// # Errors
///
/// Returns [`CadenceError`] if the entries fail to serialize.
pub fn authors_per_file(commits: &[Commit]) -> Result<Computation, CadenceError> {
    if commits.is_empty() {
        return Ok(Computation::empty(
            MetricValue::KeyedTable(BTreeMap::new()),
            "files",
        ));
    }

    let mut per_file: BTreeMap<String, BTreeSet<String>> = BTreeMap::new();
    for commit in commits {
        let author = commit.author_key();
        for change in &commit.file_changes {
            per_file
                .entry(change.filename.clone())
                .or_default()
                .insert(author.clone());
        }
    }

    let mut entries: BTreeMap<String, FileAuthors> = BTreeMap::new();
    let mut single = 0usize;
    let mut shared = 0usize;
    let mut collaborative = 0usize;
    let mut high_risk = 0usize;

    for (file, authors) in per_file {
        let count = authors.len();
        let risk_level = match count {
            1 => "HIGH",
            2..=3 => "MEDIUM",
            _ => "LOW",
        };
        let ownership_type = match count {
            1 => "SINGLE_OWNER",
            2..=3 => "SHARED",
            4..=10 => "COLLABORATIVE",
            _ => "HIGHLY_COLLABORATIVE",
        };
        match ownership_type {
            "SINGLE_OWNER" => single += 1,
            "SHARED" => shared += 1,
            _ => collaborative += 1,
        }
        if risk_level == "HIGH" {
            high_risk += 1;
        }

        entries.insert(
            file,
            FileAuthors {
                authors: count,
                author_names: authors.into_iter().collect(),
                risk_level: risk_level.to_string(),
                ownership_type: ownership_type.to_string(),
            },
        );
    }

    let total_files = entries.len();
    let score = ((shared as f64 * 50.0 + collaborative as f64 * 100.0 - single as f64 * 10.0)
        / total_files as f64)
        .clamp(0.0, 100.0);

    let mut summary = Attributes::new();
    summary.insert("collaborationScore".into(), json!(score));
    summary.insert("highRiskFiles".into(), json!(high_risk));
    summary.insert("singleOwnerFiles".into(), json!(single));

    Ok(Computation {
        value: MetricValue::keyed_table(&entries)?,
        data_points: total_files,
        data_points_label: "files",
        summary,
    })
}

/// Attribute changed lines to authors per file and measure concentration.
///
/// Concentration is the Herfindahl-Hirschman Index over ownership
/// percentages, `Σ (pct/100)² × 100`, bounded to [0, 100]; a
/// single-contributor file is always 100 and SINGLE_OWNER. Otherwise the
/// primary owner's share classifies the file: ≥80 DOMINANT_OWNER, ≥60
/// PRIMARY_OWNER, ≥40 SHARED_OWNERSHIP, else DISTRIBUTED_OWNERSHIP.
///
/// # Errors
///
/// Returns [`CadenceError`] if the entries fail to serialize.
pub fn file_ownership(commits: &[Commit]) -> Result<Computation, CadenceError> {
    if commits.is_empty() {
        return Ok(Computation::empty(
            MetricValue::KeyedTable(BTreeMap::new()),
            "files",
        ));
    }

    let mut per_file: BTreeMap<String, HashMap<String, u64>> = BTreeMap::new();
    for commit in commits {
        let author = commit.author_key();
        for change in &commit.file_changes {
            *per_file
                .entry(change.filename.clone())
                .or_default()
                .entry(author.clone())
                .or_default() += change.churn();
        }
    }

    let mut entries: BTreeMap<String, FileOwnership> = BTreeMap::new();
    let mut single_owner_files = 0usize;
    let mut concentration_sum = 0.0;
    let mut most_concentrated: Option<(String, f64)> = None;

    for (file, authors) in per_file {
        let total: u64 = authors.values().sum();
        let contributors = authors.len();

        // Deterministic primary owner: most changed lines, then author key.
        let mut ranked: Vec<(String, u64)> = authors.into_iter().collect();
        ranked.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(&b.0)));
        let (primary_owner, primary_changes) = ranked[0].clone();

        let entry = if contributors == 1 {
            single_owner_files += 1;
            FileOwnership {
                primary_owner,
                primary_share: 100.0,
                concentration: 100.0,
                ownership_type: "SINGLE_OWNER".to_string(),
                contributors,
            }
        } else {
            let share_of = |changes: u64| {
                if total == 0 {
                    0.0
                } else {
                    changes as f64 / total as f64 * 100.0
                }
            };
            let primary_share = share_of(primary_changes);
            let concentration: f64 = ranked
                .iter()
                .map(|(_, changes)| (share_of(*changes) / 100.0).powi(2))
                .sum::<f64>()
                * 100.0;
            let ownership_type = if primary_share >= 80.0 {
                "DOMINANT_OWNER"
            } else if primary_share >= 60.0 {
                "PRIMARY_OWNER"
            } else if primary_share >= 40.0 {
                "SHARED_OWNERSHIP"
            } else {
                "DISTRIBUTED_OWNERSHIP"
            };
            FileOwnership {
                primary_owner,
                primary_share,
                concentration,
                ownership_type: ownership_type.to_string(),
                contributors,
            }
        };

        concentration_sum += entry.concentration;
        if most_concentrated
            .as_ref()
            .map_or(true, |(_, max)| entry.concentration > *max)
        {
            most_concentrated = Some((file.clone(), entry.concentration));
        }
        entries.insert(file, entry);
    }

    let total_files = entries.len();
    let mut summary = Attributes::new();
    summary.insert(
        "averageConcentration".into(),
        json!(concentration_sum / total_files as f64),
    );
    summary.insert("singleOwnerFiles".into(), json!(single_owner_files));
    if let Some((file, _)) = most_concentrated {
        summary.insert("mostConcentratedFile".into(), json!(file));
    }

    Ok(Computation {
        value: MetricValue::keyed_table(&entries)?,
        data_points: total_files,
        data_points_label: "files",
        summary,
    })
}
