//! Append-only JSON-lines log of evaluations.

use std::fs::OpenOptions;
use std::io::Write;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use specloop_core::{ScoreResult, Specification};
use time::{format_description::well_known::Rfc3339, OffsetDateTime};

/// Used when the clock cannot be formatted.
const FALLBACK_TIMESTAMP: &str = "1970-01-01T00:00:00Z";

/// Issues report identifiers `<unix-nanos>-<n>`, `n` counting from 1.
///
/// The prefix is fixed when the sequence starts, so ids from one run share
/// it and ids from separate runs differ.
#[derive(Debug, Clone)]
pub struct ReportIds {
    prefix: i128,
    next: usize,
}

impl ReportIds {
    pub fn starting_now() -> Self {
        Self {
            prefix: OffsetDateTime::now_utc().unix_timestamp_nanos(),
            next: 1,
        }
    }
}

impl Iterator for ReportIds {
    type Item = String;

    fn next(&mut self) -> Option<String> {
        let id = format!("{}-{}", self.prefix, self.next);
        self.next += 1;
        Some(id)
    }
}

/// One persisted evaluation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportEntry {
    pub report_id: String,
    pub ts: String,
    pub spec: Specification,
    pub evaluation: ScoreResult,
    pub score: u8,
}

impl ReportEntry {
    pub fn new(report_id: String, spec: Specification, evaluation: ScoreResult) -> Self {
        Self {
            report_id,
            ts: iso8601_now(),
            score: evaluation.spec_score,
            spec,
            evaluation,
        }
    }
}

/// Appends entries to `path`, creating parent directories as needed.
/// Returns the number of lines written.
pub fn append(path: &Path, entries: &[ReportEntry]) -> Result<usize> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }
    let mut file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("Failed to open report log {}", path.display()))?;
    for entry in entries {
        let line = serde_json::to_string(entry)?;
        writeln!(file, "{line}").context("Failed to write report log")?;
    }
    Ok(entries.len())
}

fn iso8601_now() -> String {
    OffsetDateTime::now_utc()
        .format(&Rfc3339)
        .unwrap_or_else(|_| FALLBACK_TIMESTAMP.to_string())
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used)]
mod tests {
    use super::*;
    use specloop_core::Scorer;

    #[test]
    fn entries_are_appended_as_json_lines() {
        let path = std::env::temp_dir().join(format!(
            "specloop_report_test_{}/reports.jsonl",
            std::process::id()
        ));
        let _ = std::fs::remove_file(&path);
        let spec = Specification::unknown();
        let evaluation = Scorer::default().score(&spec);
        let mut ids = ReportIds::starting_now();
        let first = ReportEntry::new(ids.next().unwrap(), spec.clone(), evaluation.clone());
        let second = ReportEntry::new(ids.next().unwrap(), spec, evaluation);
        append(&path, &[first]).unwrap();
        append(&path, &[second]).unwrap();

        let raw = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<_> = raw.lines().collect();
        assert_eq!(lines.len(), 2);
        let parsed: ReportEntry = serde_json::from_str(lines[0]).unwrap();
        assert_eq!(parsed.score, parsed.evaluation.spec_score);
        assert!(OffsetDateTime::parse(&parsed.ts, &Rfc3339).is_ok());
        assert!(parsed.report_id.ends_with("-1"));
        let second: ReportEntry = serde_json::from_str(lines[1]).unwrap();
        assert_ne!(parsed.report_id, second.report_id);
    }

    #[test]
    fn report_ids_share_a_prefix_and_count_up() {
        let ids: Vec<String> = ReportIds::starting_now().take(3).collect();
        let prefixes: Vec<&str> = ids.iter().filter_map(|id| id.split('-').next()).collect();
        assert!(prefixes.windows(2).all(|w| w[0] == w[1]));
        let counters: Vec<&str> = ids.iter().filter_map(|id| id.rsplit('-').next()).collect();
        assert_eq!(counters, ["1", "2", "3"]);
    }
}
