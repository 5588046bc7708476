use log::{info, warn};
use serde_json::Value;

use crate::config::PipelineConfig;
use crate::error::{PipelineError, Result};
use crate::output::{self, StepProgress};
use crate::reports::{self, ReportsDir};
use crate::runner::{ToolInvocation, ToolRunner};

/// One vulnerability finding extracted from the scanner's JSON output.
#[derive(Debug, PartialEq, Eq)]
pub struct Finding {
    pub id: String,
    pub severity: String,
}

impl Finding {
    fn is_blocking(&self) -> bool {
        matches!(
            self.severity.to_ascii_lowercase().as_str(),
            "high" | "critical"
        )
    }
}

/// Scan stage: CVE scan with a high/critical severity gate, then SBOM
/// generation.
///
/// The severity gate inspects the scanner's JSON output: the stage fails
/// on any high or critical finding even when the scanner itself exited 0.
/// SBOM generation is a softer failure domain — a failure there is logged
/// but does not fail the stage.
pub async fn run(config: &PipelineConfig, reports: &ReportsDir) -> Result<()> {
    let image = config.image_ref()?;
    let runner = ToolRunner::new(config);
    let vuln_path = reports.path(reports::VULNERABILITIES_JSON);

    let progress = StepProgress::start(format!("scout: scanning {}", image.reference()));
    let scan = ToolInvocation::new("docker")
        .args(["scout", "cves"])
        .arg(image.reference())
        .args(["--format", "sarif"])
        .arg("--output")
        .arg(vuln_path.display().to_string());

    if let Err(err) = runner.run_checked(&scan).await {
        progress.finish_fail("scout scan failed");
        return Err(err);
    }

    let report: Value = serde_json::from_str(&std::fs::read_to_string(&vuln_path)?)?;
    let blocking: Vec<Finding> = collect_findings(&report)
        .into_iter()
        .filter(Finding::is_blocking)
        .collect();

    if blocking.is_empty() {
        progress.finish_ok("scout: no high/critical vulnerabilities");
    } else {
        progress.finish_fail(format!(
            "scout: {} high/critical vulnerabilities",
            blocking.len()
        ));
        for finding in &blocking {
            output::error(format!("  {} ({})", finding.id, finding.severity));
        }
        return Err(PipelineError::Threshold(format!(
            "{} high/critical vulnerabilities in {}: {}",
            blocking.len(),
            image.reference(),
            blocking
                .iter()
                .map(|f| f.id.as_str())
                .collect::<Vec<_>>()
                .join(", ")
        )));
    }

    generate_sbom(&runner, config, reports).await;
    output::success("Scan stage passed");
    Ok(())
}

/// SBOM generation for the scanned image. Failure here is non-fatal.
async fn generate_sbom(runner: &ToolRunner, config: &PipelineConfig, reports: &ReportsDir) {
    let image = match config.image_ref() {
        Ok(image) => image,
        Err(_) => return,
    };
    let sbom_path = reports.path(reports::SBOM_JSON);

    let invocation = ToolInvocation::new("docker")
        .arg("sbom")
        .arg(image.reference())
        .args(["--format", "syft-json"])
        .arg("--output")
        .arg(sbom_path.display().to_string());

    match runner.run(&invocation).await {
        Ok(result) if result.success() => {
            info!("SBOM written to {}", sbom_path.display());
        }
        Ok(result) => {
            warn!("SBOM generation exited with code {}", result.code);
            output::warn("SBOM generation failed (non-fatal)");
        }
        Err(err) => {
            warn!("SBOM generation could not run: {err}");
            output::warn("SBOM generation failed (non-fatal)");
        }
    }
}

/// Walk arbitrary scanner JSON and pull out every object carrying a
/// `severity` string, keeping whichever identifier field it exposes.
fn collect_findings(value: &Value) -> Vec<Finding> {
    let mut findings = Vec::new();
    walk(value, &mut findings);
    findings
}

fn walk(value: &Value, findings: &mut Vec<Finding>) {
    match value {
        Value::Object(map) => {
            if let Some(severity) = map.get("severity").and_then(Value::as_str) {
                let id = ["id", "cve", "cve_id", "name", "ruleId"]
                    .iter()
                    .find_map(|key| map.get(*key).and_then(Value::as_str))
                    .unwrap_or("unknown");
                findings.push(Finding {
                    id: id.to_string(),
                    severity: severity.to_string(),
                });
            }
            for child in map.values() {
                walk(child, findings);
            }
        }
        Value::Array(items) => {
            for item in items {
                walk(item, findings);
            }
        }
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{stub_tool, tool_config};
    use tempfile::tempdir;

    const CLEAN_REPORT: &str = r#"{"vulnerabilities": [{"id": "CVE-2020-0001", "severity": "low"}]}"#;
    const CRITICAL_REPORT: &str =
        r#"{"vulnerabilities": [{"id": "CVE-2024-12345", "severity": "critical"}]}"#;

    fn scan_config(
        tools: &std::path::Path,
        reports_dir: &std::path::Path,
    ) -> PipelineConfig {
        let mut config = tool_config(tools);
        config.reports_dir = reports_dir.to_path_buf();
        config.registry = Some("ghcr.io".to_string());
        config.image = Some("acme/app".to_string());
        config.tag = Some("v2".to_string());
        config
    }

    fn stub_docker(tools: &std::path::Path, reports_dir: &std::path::Path, report: &str) {
        let vuln = reports_dir.join(crate::reports::VULNERABILITIES_JSON);
        stub_tool(
            tools,
            "docker",
            &format!(
                "case \"$1\" in\n\
                 scout) printf '%s' '{report}' > {vuln}; exit 0;;\n\
                 sbom) exit 0;;\n\
                 esac\nexit 0",
                vuln = vuln.display()
            ),
        );
    }

    #[test]
    fn test_collect_findings_from_nested_json() {
        let value: Value = serde_json::from_str(
            r#"{"runs": [{"results": [{"ruleId": "CVE-1", "severity": "HIGH"},
                                      {"ruleId": "CVE-2", "severity": "medium"}]}]}"#,
        )
        .unwrap();
        let findings = collect_findings(&value);
        assert_eq!(findings.len(), 2);
        assert!(findings[0].is_blocking());
        assert!(!findings[1].is_blocking());
    }

    #[tokio::test]
    async fn test_scan_passes_without_blocking_findings() {
        let dir = tempdir().unwrap();
        let tools = tempdir().unwrap();
        let reports = ReportsDir::new(dir.path());
        stub_docker(tools.path(), dir.path(), CLEAN_REPORT);

        let config = scan_config(tools.path(), dir.path());
        run(&config, &reports).await.unwrap();
        assert!(reports.path(crate::reports::VULNERABILITIES_JSON).exists());
    }

    #[tokio::test]
    async fn test_scan_fails_on_critical_despite_zero_exit() {
        let dir = tempdir().unwrap();
        let tools = tempdir().unwrap();
        let reports = ReportsDir::new(dir.path());
        stub_docker(tools.path(), dir.path(), CRITICAL_REPORT);

        let config = scan_config(tools.path(), dir.path());
        let err = run(&config, &reports).await.unwrap_err();
        match err {
            PipelineError::Threshold(detail) => {
                assert!(detail.contains("CVE-2024-12345"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn test_sbom_failure_does_not_fail_stage() {
        let dir = tempdir().unwrap();
        let tools = tempdir().unwrap();
        let reports = ReportsDir::new(dir.path());
        let vuln = dir.path().join(crate::reports::VULNERABILITIES_JSON);
        stub_tool(
            tools.path(),
            "docker",
            &format!(
                "case \"$1\" in\n\
                 scout) printf '%s' '{CLEAN_REPORT}' > {vuln}; exit 0;;\n\
                 sbom) exit 7;;\n\
                 esac\nexit 0",
                vuln = vuln.display()
            ),
        );

        let config = scan_config(tools.path(), dir.path());
        run(&config, &reports).await.unwrap();
    }
}
