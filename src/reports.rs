use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use log::info;

use crate::error::Result;

/// The reports output directory and its fixed artifact layout.
///
/// Every artifact has a fixed relative name and is overwritten on each run;
/// nothing is ever appended to. The quality gate's markdown report is the
/// one exception to fixed naming: it is timestamped per run, with a stable
/// `quality_gate_latest.json` alongside it for tooling.
#[derive(Debug, Clone)]
pub struct ReportsDir {
    root: PathBuf,
}

/// Fixed artifact names, one per tool per run.
pub const HADOLINT_TXT: &str = "hadolint.txt";
pub const RUFF_TXT: &str = "ruff.txt";
pub const SHELLCHECK_TXT: &str = "shellcheck.txt";
pub const JUNIT_XML: &str = "junit.xml";
pub const COVERAGE_DIR: &str = "coverage";
pub const COVERAGE_XML: &str = "coverage.xml";
pub const VULNERABILITIES_JSON: &str = "vulnerabilities.json";
pub const SBOM_JSON: &str = "sbom.json";
pub const GATE_LATEST_JSON: &str = "quality_gate_latest.json";

/// State of one known artifact, for the `status` command.
#[derive(Debug)]
pub struct ArtifactStatus {
    pub name: &'static str,
    pub present: bool,
    pub size: u64,
    pub modified: Option<DateTime<Utc>>,
}

impl ReportsDir {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn path(&self, artifact: &str) -> PathBuf {
        self.root.join(artifact)
    }

    /// Path of the timestamped quality-gate markdown report for `now`.
    pub fn gate_markdown(&self, now: DateTime<Utc>) -> PathBuf {
        self.root
            .join(format!("quality_gate_{}.md", now.format("%Y%m%d_%H%M%S")))
    }

    /// Create the directory if absent. Succeeds whether or not it exists.
    pub fn ensure(&self) -> Result<()> {
        std::fs::create_dir_all(&self.root)?;
        Ok(())
    }

    /// Empty the directory, keeping the directory itself.
    ///
    /// Safe to run when the directory is already empty or missing.
    pub fn clean(&self) -> Result<()> {
        if !self.root.exists() {
            info!("Reports directory {} does not exist", self.root.display());
            return Ok(());
        }

        for entry in std::fs::read_dir(&self.root)? {
            let entry = entry?;
            let path = entry.path();
            if entry.file_type()?.is_dir() {
                std::fs::remove_dir_all(&path)?;
            } else {
                std::fs::remove_file(&path)?;
            }
        }

        info!("Emptied reports directory {}", self.root.display());
        Ok(())
    }

    /// Snapshot of every known artifact's presence, size, and mtime.
    pub fn status(&self) -> Vec<ArtifactStatus> {
        const KNOWN: [&str; 9] = [
            HADOLINT_TXT,
            RUFF_TXT,
            SHELLCHECK_TXT,
            JUNIT_XML,
            COVERAGE_DIR,
            COVERAGE_XML,
            VULNERABILITIES_JSON,
            SBOM_JSON,
            GATE_LATEST_JSON,
        ];

        KNOWN
            .iter()
            .map(|name| {
                let path = self.path(name);
                match std::fs::metadata(&path) {
                    Ok(meta) => ArtifactStatus {
                        name,
                        present: true,
                        size: meta.len(),
                        modified: meta.modified().ok().map(DateTime::from),
                    },
                    Err(_) => ArtifactStatus {
                        name,
                        present: false,
                        size: 0,
                        modified: None,
                    },
                }
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_ensure_is_idempotent() {
        let dir = tempdir().unwrap();
        let reports = ReportsDir::new(dir.path().join("reports"));

        reports.ensure().unwrap();
        assert!(reports.root().is_dir());
        reports.ensure().unwrap();
        assert!(reports.root().is_dir());
    }

    #[test]
    fn test_clean_twice_is_a_noop() {
        let dir = tempdir().unwrap();
        let reports = ReportsDir::new(dir.path().join("reports"));
        reports.ensure().unwrap();

        std::fs::write(reports.path(JUNIT_XML), "<testsuite/>").unwrap();
        std::fs::create_dir(reports.path(COVERAGE_DIR)).unwrap();
        std::fs::write(reports.path(COVERAGE_DIR).join("index.html"), "ok").unwrap();

        reports.clean().unwrap();
        assert!(std::fs::read_dir(reports.root()).unwrap().next().is_none());

        // Second run on an already-empty directory
        reports.clean().unwrap();
        assert!(std::fs::read_dir(reports.root()).unwrap().next().is_none());
    }

    #[test]
    fn test_clean_missing_directory_is_ok() {
        let dir = tempdir().unwrap();
        let reports = ReportsDir::new(dir.path().join("never-created"));
        reports.clean().unwrap();
    }

    #[test]
    fn test_status_reports_presence() {
        let dir = tempdir().unwrap();
        let reports = ReportsDir::new(dir.path());
        std::fs::write(reports.path(JUNIT_XML), "<testsuite/>").unwrap();

        let status = reports.status();
        let junit = status.iter().find(|s| s.name == JUNIT_XML).unwrap();
        assert!(junit.present);
        assert!(junit.size > 0);

        let sbom = status.iter().find(|s| s.name == SBOM_JSON).unwrap();
        assert!(!sbom.present);
    }

    #[test]
    fn test_gate_markdown_is_timestamped() {
        let reports = ReportsDir::new("reports");
        let now = chrono::DateTime::parse_from_rfc3339("2026-08-30T12:34:56Z")
            .unwrap()
            .with_timezone(&Utc);
        assert_eq!(
            reports.gate_markdown(now),
            PathBuf::from("reports/quality_gate_20260830_123456.md")
        );
    }
}
