use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::CadenceError;

/// A single file change within a commit.
///
/// Binary files show up as `-` in numstat output; those map to 0 added
/// and 0 deleted lines rather than being omitted.
///
/// # Examples
///
/// ```
/// use cadence_core::FileChange;
///
/// let change = FileChange {
///     filename: "src/main.rs".into(),
///     additions: 10,
///     deletions: 3,
/// };
/// assert_eq!(change.churn(), 13);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileChange {
    /// File path relative to repo root.
    pub filename: String,
    /// Lines added in this commit.
    pub additions: u64,
    /// Lines deleted in this commit.
    pub deletions: u64,
}

impl FileChange {
    /// Added plus deleted lines for this file.
    pub fn churn(&self) -> u64 {
        self.additions + self.deletions
    }
}

/// One commit parsed from raw log text.
///
/// Order in the source text is not guaranteed chronological; callers must
/// sort explicitly when order matters.
///
/// # Examples
///
/// ```
/// use cadence_core::Commit;
/// use chrono::{TimeZone, Utc};
///
/// let commit = Commit {
///     hash: "abc123".into(),
///     author: "alice".into(),
///     email: Some("alice@example.com".into()),
///     timestamp: Utc.with_ymd_and_hms(2025, 3, 1, 12, 0, 0).unwrap(),
///     subject: "fix: auth bug".into(),
///     additions: 0,
///     deletions: 0,
///     file_changes: vec![],
/// };
/// assert_eq!(commit.author_key(), "alice <alice@example.com>");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Commit {
    /// Full or abbreviated commit hash.
    pub hash: String,
    /// Author name.
    pub author: String,
    /// Author email, if the log format carried one.
    pub email: Option<String>,
    /// Commit timestamp.
    pub timestamp: DateTime<Utc>,
    /// First line of the commit message.
    pub subject: String,
    /// Total lines added across all file changes.
    pub additions: u64,
    /// Total lines deleted across all file changes.
    pub deletions: u64,
    /// Per-file diffs, when the source format carried numstat lines.
    pub file_changes: Vec<FileChange>,
}

impl Commit {
    /// Grouping key for contributor identity: the name alone, or
    /// `name <email>` when an email is present. No cross-record identity
    /// merging happens beyond this key.
    pub fn author_key(&self) -> String {
        match &self.email {
            Some(email) => format!("{} <{}>", self.author, email),
            None => self.author.clone(),
        }
    }

    /// Total lines added plus deleted in this commit.
    pub fn churn(&self) -> u64 {
        self.additions + self.deletions
    }
}

/// A contributor line from shortlog-style output.
///
/// # Examples
///
/// ```
/// use cadence_core::Contributor;
///
/// let c = Contributor {
///     name: "alice".into(),
///     email: Some("alice@example.com".into()),
///     commits: 42,
/// };
/// assert_eq!(c.commits, 42);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Contributor {
    /// Contributor name.
    pub name: String,
    /// Email, when the shortlog line carried one.
    pub email: Option<String>,
    /// Commit count reported for this contributor.
    pub commits: u64,
}

/// A tag from the tag-list format, independent of any [`Commit`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Tag {
    /// Tag name as written in the repository.
    pub name: String,
    /// Tag creation timestamp.
    pub timestamp: DateTime<Utc>,
    /// Commit the tag points at, when known.
    pub commit_hash: Option<String>,
}

/// How a deployment was identified.
///
/// # Examples
///
/// ```
/// use cadence_core::DeploymentKind;
///
/// assert_eq!(DeploymentKind::ProductionRelease.to_string(), "production_release");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeploymentKind {
    /// A tag matching the production release patterns.
    ProductionRelease,
    /// A merge commit into a main-like branch.
    MergeDeployment,
}

impl fmt::Display for DeploymentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DeploymentKind::ProductionRelease => write!(f, "production_release"),
            DeploymentKind::MergeDeployment => write!(f, "merge_deployment"),
        }
    }
}

/// A release event derived from a tag or merge commit. Never persisted;
/// rebuilt on every computation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Deployment {
    /// Tag-based or merge-based.
    pub kind: DeploymentKind,
    /// Tag name or commit hash.
    pub identifier: String,
    /// When the deployment happened.
    pub timestamp: DateTime<Utc>,
    /// Source commit hash or tag name the event was derived from.
    pub source: String,
}

/// Immutable start/end timestamp pair bounding a metric query.
///
/// Construction fails unless `start < end` strictly.
///
/// # Examples
///
/// ```
/// use cadence_core::TimeWindow;
/// use chrono::{TimeZone, Utc};
///
/// let start = Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap();
/// let end = Utc.with_ymd_and_hms(2025, 2, 1, 0, 0, 0).unwrap();
/// let window = TimeWindow::new(start, end).unwrap();
/// assert_eq!(window.days(), 31);
/// assert!(TimeWindow::new(end, start).is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimeWindow {
    start: DateTime<Utc>,
    end: DateTime<Utc>,
}

impl TimeWindow {
    /// Create a window from two bounds.
    ///
    /// # Errors
    ///
    /// Returns [`CadenceError::Validation`] unless `start < end`.
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Result<Self, CadenceError> {
        if start >= end {
            return Err(CadenceError::Validation(format!(
                "time window start {start} must precede end {end}"
            )));
        }
        Ok(Self { start, end })
    }

    /// Inclusive lower bound.
    pub fn start(&self) -> DateTime<Utc> {
        self.start
    }

    /// Exclusive upper bound.
    pub fn end(&self) -> DateTime<Utc> {
        self.end
    }

    /// Whether `ts` falls inside the window (`start <= ts < end`).
    pub fn contains(&self, ts: DateTime<Utc>) -> bool {
        ts >= self.start && ts < self.end
    }

    /// Window length in whole days, floored at 1.
    pub fn days(&self) -> i64 {
        (self.end - self.start).num_days().max(1)
    }
}

/// Pre-resolved computation options, supplied by the calling layer.
///
/// The core never parses flags or config files; it receives the outcome of
/// that resolution here.
///
/// # Examples
///
/// ```
/// use cadence_core::MetricOptions;
///
/// let opts = MetricOptions::default();
/// assert!(opts.authors.is_none());
/// assert!(!opts.exclude_bots);
/// assert!(opts.include_merges);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricOptions {
    /// Restrict analysis to these contributor names or emails.
    pub authors: Option<Vec<String>>,
    /// Drop commits from bot accounts.
    pub exclude_bots: bool,
    /// Keep merge commits in the analyzed set.
    pub include_merges: bool,
}

impl Default for MetricOptions {
    fn default() -> Self {
        Self {
            authors: None,
            exclude_bots: false,
            include_merges: true,
        }
    }
}

/// The read-only parsed record set a batch of metrics computes over.
///
/// Built once per run from parser output; individual metrics never mutate
/// it.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryRecords {
    /// Parsed commits, possibly with file-level stats.
    pub commits: Vec<Commit>,
    /// Parsed tags.
    pub tags: Vec<Tag>,
    /// Branch names known to the repository.
    pub branches: Vec<String>,
}
