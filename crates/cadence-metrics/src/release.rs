//! Production release identification.
//!
//! Classifies tag names as production releases against a pattern table.
//! The table is plain data injected at construction so alternate release
//! conventions can be tested and configured without touching the matcher.

use std::sync::LazyLock;

use regex::{Regex, RegexBuilder};

use cadence_core::{CadenceError, Tag};

/// The default production-tag pattern table.
///
/// Covers semver (`v1.2.3`), pre-releases (`v1.2.3-rc1`), release/prod/
/// deploy naming conventions, date versions (`v2025.10.02`, `v20250630`,
/// `v20241024_1`) and bare counters (`v31`). All patterns match
/// case-insensitively.
pub const DEFAULT_TAG_PATTERNS: [&str; 15] = [
    r"^v?\d+\.\d+\.\d+$",
    r"^v?\d+\.\d+\.\d+[-_](alpha|beta|rc\d*)",
    r"^release[-_]v?\d+\.\d+",
    r"^prod[-_]",
    r"^production[-_]",
    r"[-_]prod$",
    r"[-_]release$",
    r"^deploy[-_]",
    r"[-_]deploy$",
    r"^v\d{4}\.\d{2}\.\d{2}(\.\d+)?$",
    r"^v\d{4}\.\d{2}\.\d{2}(\.\d+)?[-_](alpha|beta|rc\d*)",
    r"^v\d{8}(\.\d+)?$",
    r"^v\d{8}(\.\d+)?[-_](alpha|beta|rc\d*)",
    r"^v\d{8}[-_]\d+$",
    r"^v\d+$",
];

static DEFAULT_REGEXES: LazyLock<Vec<Regex>> =
    LazyLock::new(|| compile(&DEFAULT_TAG_PATTERNS).expect("invalid regex"));

/// Classifies tag names as production releases.
///
/// # Examples
///
/// ```
/// use cadence_metrics::release::ProductionTagMatcher;
///
/// let matcher = ProductionTagMatcher::default();
/// assert!(matcher.is_production("v1.2.3"));
/// assert!(matcher.is_production("release-v2.0"));
/// assert!(matcher.is_production("v20241024_1"));
/// assert!(!matcher.is_production("nightly"));
/// assert!(!matcher.is_production("v1.2"));
/// ```
#[derive(Debug, Clone)]
pub struct ProductionTagMatcher {
    patterns: Vec<Regex>,
}

impl Default for ProductionTagMatcher {
    fn default() -> Self {
        Self {
            patterns: DEFAULT_REGEXES.clone(),
        }
    }
}

impl ProductionTagMatcher {
    /// Build a matcher from an alternate pattern table. Patterns are
    /// compiled case-insensitively.
    ///
    /// # Errors
    ///
    /// Returns [`CadenceError::Validation`] if a pattern does not compile.
    ///
    /// # Examples
    ///
    /// ```
    /// use cadence_metrics::release::ProductionTagMatcher;
    ///
    /// let matcher = ProductionTagMatcher::with_patterns(&[r"^live[-_]"]).unwrap();
    /// assert!(matcher.is_production("live-2025-01-01"));
    /// assert!(!matcher.is_production("v1.2.3"));
    /// ```
    pub fn with_patterns(patterns: &[&str]) -> Result<Self, CadenceError> {
        Ok(Self {
            patterns: compile(patterns)?,
        })
    }

    /// Whether `name` matches any production release pattern.
    pub fn is_production(&self, name: &str) -> bool {
        let name = name.trim();
        self.patterns.iter().any(|re| re.is_match(name))
    }

    /// The production releases among `tags`, sorted ascending by timestamp.
    pub fn production_releases<'a>(&self, tags: &'a [Tag]) -> Vec<&'a Tag> {
        let mut releases: Vec<&Tag> = tags
            .iter()
            .filter(|tag| self.is_production(&tag.name))
            .collect();
        releases.sort_by_key(|tag| tag.timestamp);
        releases
    }
}

fn compile(patterns: &[&str]) -> Result<Vec<Regex>, CadenceError> {
    patterns
        .iter()
        .map(|pattern| {
            RegexBuilder::new(pattern)
                .case_insensitive(true)
                .build()
                .map_err(|e| {
                    CadenceError::Validation(format!("invalid tag pattern {pattern:?}: {e}"))
                })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn matcher() -> ProductionTagMatcher {
        ProductionTagMatcher::default()
    }

    #[test]
    fn semver_tags_match() {
        assert!(matcher().is_production("1.2.3"));
        assert!(matcher().is_production("v1.2.3"));
        assert!(matcher().is_production("V10.20.30"));
    }

    #[test]
    fn prerelease_semver_matches() {
        assert!(matcher().is_production("v1.2.3-alpha"));
        assert!(matcher().is_production("v1.2.3_beta"));
        assert!(matcher().is_production("v1.2.3-rc1"));
        assert!(matcher().is_production("v1.2.3-rc"));
    }

    #[test]
    fn release_and_prod_conventions_match() {
        assert!(matcher().is_production("release-v1.2"));
        assert!(matcher().is_production("release_2.0"));
        assert!(matcher().is_production("prod-2025-06-01"));
        assert!(matcher().is_production("production_hotfix"));
        assert!(matcher().is_production("api-prod"));
        assert!(matcher().is_production("summer_release"));
        assert!(matcher().is_production("deploy-42"));
        assert!(matcher().is_production("web_deploy"));
    }

    #[test]
    fn date_version_tags_match() {
        assert!(matcher().is_production("v2025.10.02"));
        assert!(matcher().is_production("v2025.10.02.3"));
        assert!(matcher().is_production("v2025.10.02-rc2"));
        assert!(matcher().is_production("v20250630"));
        assert!(matcher().is_production("v20250630.1"));
        assert!(matcher().is_production("v20250630-beta"));
        assert!(matcher().is_production("v20241024_1"));
        assert!(matcher().is_production("v31"));
    }

    #[test]
    fn non_release_tags_do_not_match() {
        assert!(!matcher().is_production("nightly"));
        assert!(!matcher().is_production("v1.2"));
        assert!(!matcher().is_production("1.2.3.4.5"));
        assert!(!matcher().is_production("feature/login"));
        assert!(!matcher().is_production("wip-prod-test"));
        assert!(!matcher().is_production(""));
    }

    #[test]
    fn injected_pattern_set_replaces_defaults() {
        let custom = ProductionTagMatcher::with_patterns(&[r"^ship[-_]\d+$"]).unwrap();
        assert!(custom.is_production("ship-7"));
        assert!(!custom.is_production("v1.2.3"));
    }

    #[test]
    fn invalid_injected_pattern_is_rejected() {
        assert!(ProductionTagMatcher::with_patterns(&[r"(unclosed"]).is_err());
    }

    #[test]
    fn production_releases_sorted_ascending() {
        let ts = |d| Utc.with_ymd_and_hms(2025, 1, d, 0, 0, 0).unwrap();
        let tags = vec![
            Tag {
                name: "v2.0.0".into(),
                timestamp: ts(20),
                commit_hash: None,
            },
            Tag {
                name: "nightly".into(),
                timestamp: ts(15),
                commit_hash: None,
            },
            Tag {
                name: "v1.0.0".into(),
                timestamp: ts(10),
                commit_hash: None,
            },
        ];
        let releases = matcher().production_releases(&tags);
        assert_eq!(releases.len(), 2);
        assert_eq!(releases[0].name, "v1.0.0");
        assert_eq!(releases[1].name, "v2.0.0");
    }
}
