//! Line-oriented parsers for the raw text formats produced by the
//! version-control command layer.
//!
//! Malformed individual lines are skipped and parsing continues; an
//! unparseable timestamp is fatal to that parse call and yields the empty
//! container, never a partial list.

use std::collections::BTreeMap;
use std::sync::LazyLock;

use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};
use regex::Regex;

use cadence_core::{Commit, Contributor, FileChange, Tag};

static NUMSTAT_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\d+|-)\s+(\d+|-)\s+(.+)$").expect("invalid regex"));

static COMMIT_HASH_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[0-9a-f]{40}$").expect("invalid regex"));

static SHORTLOG_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*(\d+)\s+(.+)$").expect("invalid regex"));

static NAME_EMAIL_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(.+)\s+<(.+)>$").expect("invalid regex"));

/// Parse a commit list: one `hash|author|email|date|subject` line per
/// commit.
///
/// The subject may itself contain `|`, so each line is split into at most
/// five fields. Lines with fewer than five fields are skipped. A date field
/// that fails to parse aborts the whole call and returns an empty list:
/// downstream consumers must never see a partially ingested history.
///
/// # Examples
///
/// ```
/// use cadence_ingest::parse_commits;
///
/// let text = "abc123|alice|alice@example.com|2025-03-01 10:00:00 +0000|fix: a | b issue\n\
///             \n\
///             short|line\n";
/// let commits = parse_commits(text);
/// assert_eq!(commits.len(), 1);
/// assert_eq!(commits[0].subject, "fix: a | b issue");
/// ```
pub fn parse_commits(text: &str) -> Vec<Commit> {
    let mut commits = Vec::new();

    for line in text.lines() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let Some(commit) = parse_commit_line(line) else {
            continue;
        };
        match commit {
            Ok(commit) => commits.push(commit),
            Err(raw_date) => {
                log::warn!("unparseable commit date {raw_date:?}, discarding parse output");
                return Vec::new();
            }
        }
    }

    commits
}

/// Parse a commit-stats blob: header lines in the five-field pipe format,
/// each optionally followed by numstat lines (`additions deletions file`,
/// with `-` for binary files).
///
/// Numstat lines attach to the most recently seen header and accumulate
/// running addition/deletion totals on it; a numstat line before any header
/// is ignored. An unparseable header date aborts the whole call.
///
/// # Examples
///
/// ```
/// use cadence_ingest::parse_commit_stats;
///
/// let text = "abc123|alice|a@e.com|2025-03-01 10:00:00 +0000|refactor\n\
///             10\t2\tsrc/lib.rs\n\
///             -\t-\tassets/logo.png\n";
/// let commits = parse_commit_stats(text);
/// assert_eq!(commits[0].additions, 10);
/// assert_eq!(commits[0].file_changes.len(), 2);
/// assert_eq!(commits[0].file_changes[1].additions, 0);
/// ```
pub fn parse_commit_stats(text: &str) -> Vec<Commit> {
    let mut commits: Vec<Commit> = Vec::new();

    for line in text.lines() {
        let line = line.trim_end();
        if line.trim().is_empty() {
            continue;
        }

        // Header lines carry at least four pipes; numstat lines carry none.
        if line.matches('|').count() >= 4 {
            let Some(commit) = parse_commit_line(line.trim()) else {
                continue;
            };
            match commit {
                Ok(commit) => commits.push(commit),
                Err(raw_date) => {
                    log::warn!(
                        "unparseable commit date {raw_date:?} in stats blob, discarding parse output"
                    );
                    return Vec::new();
                }
            }
            continue;
        }

        let Some(caps) = NUMSTAT_REGEX.captures(line.trim()) else {
            log::debug!("skipping unrecognized stats line: {line}");
            continue;
        };
        let Some(current) = commits.last_mut() else {
            continue;
        };

        let additions = parse_numstat_field(&caps[1]);
        let deletions = parse_numstat_field(&caps[2]);
        current.additions += additions;
        current.deletions += deletions;
        current.file_changes.push(FileChange {
            filename: caps[3].to_string(),
            additions,
            deletions,
        });
    }

    commits
}

/// Parse a file-change listing: alternating 40-hex commit-hash lines and
/// filename lines.
///
/// Returns a mapping from filename to the hashes of the commits that
/// touched it. Filenames appearing before any hash line are ignored.
///
/// # Examples
///
/// ```
/// use cadence_ingest::parse_file_changes;
///
/// let hash = "a".repeat(40);
/// let text = format!("{hash}\nsrc/main.rs\nsrc/lib.rs\n");
/// let touched = parse_file_changes(&text);
/// assert_eq!(touched["src/main.rs"], vec![hash]);
/// ```
pub fn parse_file_changes(text: &str) -> BTreeMap<String, Vec<String>> {
    let mut touched: BTreeMap<String, Vec<String>> = BTreeMap::new();
    let mut current: Option<String> = None;

    for line in text.lines() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        if COMMIT_HASH_REGEX.is_match(line) {
            current = Some(line.to_string());
        } else if let Some(hash) = &current {
            touched
                .entry(line.to_string())
                .or_default()
                .push(hash.clone());
        }
    }

    touched
}

/// Parse shortlog output: `  <count>\t<name> <<email>>` or
/// `  <count>\t<name>` per line.
///
/// # Examples
///
/// ```
/// use cadence_ingest::parse_contributors;
///
/// let text = "   42\talice <alice@example.com>\n    7\tbuild server\n";
/// let contributors = parse_contributors(text);
/// assert_eq!(contributors[0].commits, 42);
/// assert_eq!(contributors[1].name, "build server");
/// assert!(contributors[1].email.is_none());
/// ```
pub fn parse_contributors(text: &str) -> Vec<Contributor> {
    let mut contributors = Vec::new();

    for line in text.lines() {
        if line.trim().is_empty() {
            continue;
        }
        let Some(caps) = SHORTLOG_REGEX.captures(line) else {
            log::debug!("skipping unrecognized shortlog line: {line}");
            continue;
        };
        let Ok(commits) = caps[1].parse::<u64>() else {
            continue;
        };
        let rest = caps[2].trim();

        let (name, email) = match NAME_EMAIL_REGEX.captures(rest) {
            Some(parts) => (parts[1].trim().to_string(), Some(parts[2].to_string())),
            None => (rest.to_string(), None),
        };

        contributors.push(Contributor {
            name,
            email,
            commits,
        });
    }

    contributors
}

/// Parse a tag list: `name|date` or `name|date|commit_hash` per line.
///
/// Tags without a parseable creation date are skipped; every consumer
/// orders releases by timestamp.
///
/// # Examples
///
/// ```
/// use cadence_ingest::parse_tags;
///
/// let text = "v1.2.0|2025-02-01 09:00:00 +0000\nv1.2.1|not-a-date\n";
/// let tags = parse_tags(text);
/// assert_eq!(tags.len(), 1);
/// assert_eq!(tags[0].name, "v1.2.0");
/// ```
pub fn parse_tags(text: &str) -> Vec<Tag> {
    let mut tags = Vec::new();

    for line in text.lines() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let mut fields = line.splitn(3, '|');
        let name = fields.next().unwrap_or("").trim();
        if name.is_empty() {
            continue;
        }
        let Some(timestamp) = fields.next().and_then(parse_timestamp) else {
            log::debug!("skipping tag without a creation date: {line}");
            continue;
        };
        let commit_hash = fields
            .next()
            .map(str::trim)
            .filter(|h| !h.is_empty())
            .map(String::from);

        tags.push(Tag {
            name: name.to_string(),
            timestamp,
            commit_hash,
        });
    }

    tags
}

/// Parse a branch list: one name per line, with the `* ` current-branch
/// marker stripped and symref arrows (`HEAD -> main`) skipped.
///
/// # Examples
///
/// ```
/// use cadence_ingest::parse_branches;
///
/// let branches = parse_branches("* main\n  feature/auth\n  HEAD -> main\n");
/// assert_eq!(branches, vec!["main", "feature/auth"]);
/// ```
pub fn parse_branches(text: &str) -> Vec<String> {
    text.lines()
        .map(|line| line.trim().trim_start_matches("* ").trim())
        .filter(|line| !line.is_empty() && !line.contains("->"))
        .map(String::from)
        .collect()
}

/// Parse one five-field commit line.
///
/// Returns `None` when the line has fewer than five fields (skip), and
/// `Some(Err(date))` when the date field does not parse (fatal to the
/// enclosing blob).
fn parse_commit_line(line: &str) -> Option<Result<Commit, String>> {
    let fields: Vec<&str> = line.splitn(5, '|').collect();
    if fields.len() < 5 {
        log::debug!("skipping malformed commit line: {line}");
        return None;
    }

    let Some(timestamp) = parse_timestamp(fields[3]) else {
        return Some(Err(fields[3].to_string()));
    };

    let email = fields[2].trim();
    Some(Ok(Commit {
        hash: fields[0].trim().to_string(),
        author: fields[1].trim().to_string(),
        email: if email.is_empty() {
            None
        } else {
            Some(email.to_string())
        },
        timestamp,
        subject: fields[4].to_string(),
        additions: 0,
        deletions: 0,
        file_changes: Vec::new(),
    }))
}

fn parse_numstat_field(field: &str) -> u64 {
    // "-" marks a binary file and counts as zero lines.
    field.parse().unwrap_or(0)
}

fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();

    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Some(ts.with_timezone(&Utc));
    }
    if let Ok(ts) = DateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S %z") {
        return Some(ts.with_timezone(&Utc));
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S") {
        return Some(Utc.from_utc_datetime(&naive));
    }
    if raw.chars().all(|c| c.is_ascii_digit()) && !raw.is_empty() {
        if let Ok(secs) = raw.parse::<i64>() {
            return Utc.timestamp_opt(secs, 0).single();
        }
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;

    const COMMIT_LIST: &str = "\
abc123|alice|alice@example.com|2025-03-01 10:00:00 +0000|fix: auth bug
def456|bob||2025-03-02 11:30:00 +0000|feat: pipes | in | subject

ghi789|carol|carol@example.com|2025-03-03T08:15:00+00:00|docs: readme
";

    #[test]
    fn parses_well_formed_commit_list() {
        let commits = parse_commits(COMMIT_LIST);
        assert_eq!(commits.len(), 3);
        assert_eq!(commits[0].hash, "abc123");
        assert_eq!(commits[0].email.as_deref(), Some("alice@example.com"));
        assert_eq!(commits[1].subject, "feat: pipes | in | subject");
        assert!(commits[1].email.is_none());
    }

    #[test]
    fn short_lines_are_skipped_not_fatal() {
        let text = "only|four|fields|here\nabc|alice|a@e.com|2025-01-01 00:00:00 +0000|ok\n";
        let commits = parse_commits(text);
        assert_eq!(commits.len(), 1);
        assert_eq!(commits[0].hash, "abc");
    }

    #[test]
    fn bad_date_discards_entire_commit_list() {
        let text = "abc|alice|a@e.com|2025-01-01 00:00:00 +0000|ok\n\
                    def|bob|b@e.com|yesterday-ish|broken\n";
        assert!(parse_commits(text).is_empty());
    }

    #[test]
    fn parsing_is_idempotent() {
        let first = parse_commits(COMMIT_LIST);
        let second = parse_commits(COMMIT_LIST);
        assert_eq!(first, second);
    }

    #[test]
    fn epoch_second_dates_parse() {
        let text = "abc|alice|a@e.com|1700000000|epoch-dated\n";
        let commits = parse_commits(text);
        assert_eq!(commits.len(), 1);
        assert_eq!(commits[0].timestamp.timestamp(), 1_700_000_000);
    }

    #[test]
    fn stats_attach_numstat_to_latest_header() {
        let text = "\
abc|alice|a@e.com|2025-01-01 00:00:00 +0000|first
5\t2\tsrc/a.rs
3\t1\tsrc/b.rs
def|bob|b@e.com|2025-01-02 00:00:00 +0000|second
7\t0\tsrc/a.rs
";
        let commits = parse_commit_stats(text);
        assert_eq!(commits.len(), 2);
        assert_eq!(commits[0].additions, 8);
        assert_eq!(commits[0].deletions, 3);
        assert_eq!(commits[0].file_changes.len(), 2);
        assert_eq!(commits[1].file_changes[0].filename, "src/a.rs");
        assert_eq!(commits[1].additions, 7);
    }

    #[test]
    fn binary_dash_counts_as_zero() {
        let text = "abc|alice|a@e.com|2025-01-01 00:00:00 +0000|binary\n-\t-\tlogo.png\n";
        let commits = parse_commit_stats(text);
        let change = &commits[0].file_changes[0];
        assert_eq!(change.additions, 0);
        assert_eq!(change.deletions, 0);
        assert_eq!(change.filename, "logo.png");
    }

    #[test]
    fn numstat_before_any_header_is_ignored() {
        let text = "5\t2\torphan.rs\nabc|alice|a@e.com|2025-01-01 00:00:00 +0000|ok\n";
        let commits = parse_commit_stats(text);
        assert_eq!(commits.len(), 1);
        assert!(commits[0].file_changes.is_empty());
    }

    #[test]
    fn bad_header_date_discards_entire_stats_blob() {
        let text = "\
abc|alice|a@e.com|2025-01-01 00:00:00 +0000|fine
5\t2\tsrc/a.rs
def|bob|b@e.com|someday|broken
1\t1\tsrc/b.rs
";
        assert!(parse_commit_stats(text).is_empty());
    }

    #[test]
    fn file_changes_map_filenames_to_hashes() {
        let first = "a".repeat(40);
        let second = "b".repeat(40);
        let text = format!("{first}\nsrc/main.rs\nsrc/lib.rs\n{second}\nsrc/main.rs\n");
        let touched = parse_file_changes(&text);
        assert_eq!(touched["src/main.rs"], vec![first.clone(), second]);
        assert_eq!(touched["src/lib.rs"], vec![first]);
    }

    #[test]
    fn filenames_before_any_hash_are_ignored() {
        let hash = "c".repeat(40);
        let text = format!("stray.rs\n{hash}\nsrc/a.rs\n");
        let touched = parse_file_changes(&text);
        assert!(!touched.contains_key("stray.rs"));
        assert_eq!(touched.len(), 1);
    }

    #[test]
    fn short_hex_line_is_treated_as_filename() {
        let hash = "d".repeat(40);
        let text = format!("{hash}\nabcdef\n");
        let touched = parse_file_changes(&text);
        assert_eq!(touched["abcdef"], vec![hash]);
    }

    #[test]
    fn contributors_split_name_and_email() {
        let text = "   42\talice smith <alice@example.com>\n    7\tbuild server\n";
        let contributors = parse_contributors(text);
        assert_eq!(contributors.len(), 2);
        assert_eq!(contributors[0].name, "alice smith");
        assert_eq!(contributors[0].email.as_deref(), Some("alice@example.com"));
        assert_eq!(contributors[0].commits, 42);
        assert_eq!(contributors[1].name, "build server");
        assert!(contributors[1].email.is_none());
    }

    #[test]
    fn malformed_contributor_lines_are_skipped() {
        let text = "not a count line\n   5\talice\n";
        let contributors = parse_contributors(text);
        assert_eq!(contributors.len(), 1);
        assert_eq!(contributors[0].name, "alice");
    }

    #[test]
    fn tags_parse_with_optional_hash() {
        let text = "\
v1.2.0|2025-02-01 09:00:00 +0000|abc123
v1.2.1|2025-02-15 09:00:00 +0000
nightly
";
        let tags = parse_tags(text);
        assert_eq!(tags.len(), 2);
        assert_eq!(tags[0].commit_hash.as_deref(), Some("abc123"));
        assert!(tags[1].commit_hash.is_none());
    }

    #[test]
    fn branches_strip_current_marker_and_symrefs() {
        let text = "* main\n  develop\n  HEAD -> main\n\n  release/1.2\n";
        let branches = parse_branches(text);
        assert_eq!(branches, vec!["main", "develop", "release/1.2"]);
    }

    #[test]
    fn empty_input_yields_empty_containers() {
        assert!(parse_commits("").is_empty());
        assert!(parse_commit_stats("\n\n").is_empty());
        assert!(parse_file_changes("").is_empty());
        assert!(parse_contributors("").is_empty());
        assert!(parse_tags("").is_empty());
        assert!(parse_branches("").is_empty());
    }
}
