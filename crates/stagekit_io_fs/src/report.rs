//! Sync report models and mutable report builder.

use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;

use crate::spec::SpecSyncError;

/// Aggregate counters and diagnostics for one sync run.
#[derive(Debug, Default, Clone)]
pub struct ReportSync {
    /// Total source files visited.
    pub cnt_scanned: u64,
    /// Files whose bytes were written to the destination.
    pub cnt_copied: u64,
    /// Files mirrored as symbolic links.
    pub cnt_linked: u64,
    /// Files left alone because their signature already matched.
    pub cnt_unchanged: u64,
    /// Files dropped by the exclusion policy.
    pub cnt_excluded: u64,
    /// Files that could not be synchronized (locked, permission denied).
    pub cnt_failed: u64,
    /// Non-fatal warnings collected during traversal/copy.
    pub warnings: Vec<String>,
    /// Per-entry failures.
    pub errors: Vec<SpecSyncError>,
}

impl ReportSync {
    /// Number of collected per-entry errors.
    pub fn error_count(&self) -> usize {
        self.errors.len()
    }

    /// Number of collected warnings.
    pub fn warning_count(&self) -> usize {
        self.warnings.len()
    }

    /// Machine-readable counters.
    pub fn to_dict(&self) -> BTreeMap<String, u64> {
        let mut dict_counts = BTreeMap::new();
        dict_counts.insert("cnt_scanned".to_string(), self.cnt_scanned);
        dict_counts.insert("cnt_copied".to_string(), self.cnt_copied);
        dict_counts.insert("cnt_linked".to_string(), self.cnt_linked);
        dict_counts.insert("cnt_unchanged".to_string(), self.cnt_unchanged);
        dict_counts.insert("cnt_excluded".to_string(), self.cnt_excluded);
        dict_counts.insert("cnt_failed".to_string(), self.cnt_failed);
        dict_counts.insert("cnt_errors".to_string(), self.error_count() as u64);
        dict_counts.insert("cnt_warnings".to_string(), self.warning_count() as u64);
        dict_counts
    }

    /// Human-readable one-line summary.
    pub fn format(&self, prefix: &str) -> String {
        let dict_counts = self.to_dict();
        format!(
            "{prefix} scanned={} copied={} linked={} unchanged={} excluded={} failed={} warnings={}",
            dict_counts["cnt_scanned"],
            dict_counts["cnt_copied"],
            dict_counts["cnt_linked"],
            dict_counts["cnt_unchanged"],
            dict_counts["cnt_excluded"],
            dict_counts["cnt_failed"],
            dict_counts["cnt_warnings"]
        )
    }
}

impl fmt::Display for ReportSync {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.format("[SYNC]"))
    }
}

/// Mutable accumulator for sync statistics.
#[derive(Debug, Default, Clone)]
pub struct ReportSyncBuilder {
    report: ReportSync,
}

impl ReportSyncBuilder {
    /// Increment scanned count by one.
    pub fn add_scanned(&mut self) {
        self.report.cnt_scanned += 1;
    }

    /// Increment copied count by one.
    pub fn add_copied(&mut self) {
        self.report.cnt_copied += 1;
    }

    /// Increment linked count by one.
    pub fn add_linked(&mut self) {
        self.report.cnt_linked += 1;
    }

    /// Increment unchanged count by one.
    pub fn add_unchanged(&mut self) {
        self.report.cnt_unchanged += 1;
    }

    /// Increment excluded count by one.
    pub fn add_excluded(&mut self) {
        self.report.cnt_excluded += 1;
    }

    /// Count one failed file and keep its error text.
    pub fn add_failed(&mut self, path: PathBuf, exception: String) {
        self.report.cnt_failed += 1;
        self.add_error(path, exception);
    }

    /// Add warning message.
    pub fn add_warning(&mut self, warning: String) {
        self.report.warnings.push(warning);
    }

    /// Add one path-scoped error without touching counters.
    pub fn add_error(&mut self, path: PathBuf, exception: String) {
        self.report.errors.push(SpecSyncError { path, exception });
    }

    /// Finalize builder into immutable report.
    pub fn build(self) -> ReportSync {
        self.report
    }
}

#[cfg(test)]
mod tests {
    use super::{ReportSync, ReportSyncBuilder};

    #[test]
    fn report_sync_to_dict_and_format() {
        let report = ReportSync {
            cnt_scanned: 9,
            cnt_copied: 3,
            cnt_linked: 0,
            cnt_unchanged: 4,
            cnt_excluded: 1,
            cnt_failed: 1,
            warnings: vec!["w".to_string()],
            errors: vec![],
        };

        let dict_counts = report.to_dict();
        assert_eq!(dict_counts["cnt_unchanged"], 4);
        assert_eq!(dict_counts["cnt_errors"], 0);
        assert_eq!(dict_counts["cnt_warnings"], 1);

        let txt = report.format("[SYNC]");
        assert_eq!(
            txt,
            "[SYNC] scanned=9 copied=3 linked=0 unchanged=4 excluded=1 failed=1 warnings=1"
        );
        assert_eq!(report.to_string(), txt);
    }

    #[test]
    fn builder_failed_records_error() {
        let mut builder = ReportSyncBuilder::default();
        builder.add_failed("locked.dll".into(), "Permission denied".to_string());
        builder.add_copied();

        let report = builder.build();
        assert_eq!(report.cnt_failed, 1);
        assert_eq!(report.cnt_copied, 1);
        assert_eq!(report.error_count(), 1);
        assert_eq!(report.errors[0].exception, "Permission denied");
    }
}
