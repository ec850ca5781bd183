//! History ingestion: raw git log text into typed records.
//!
//! Converts the textual output of version-control queries (commit lists,
//! numstat blobs, file-change listings, shortlogs, tag and branch lists)
//! into the typed records the metric algorithms consume. Parsers tolerate
//! malformed individual lines and fail closed on blob-level problems,
//! returning the empty container rather than partial output.

pub mod parser;

pub use parser::{
    parse_branches, parse_commit_stats, parse_commits, parse_contributors, parse_file_changes,
    parse_tags,
};
