use log::info;
use regex::Regex;

use crate::config::PipelineConfig;
use crate::error::{PipelineError, Result};
use crate::output::{self, StepProgress};
use crate::reports::{self, ReportsDir};
use crate::runner::{ToolInvocation, ToolRunner};

/// Test stage: pytest with JUnit XML and coverage artifacts, plus a
/// coverage floor enforced by the dispatcher itself.
///
/// The floor applies even when every individual test passed: pytest
/// exiting 0 with coverage below `COVERAGE_THRESHOLD` still fails the
/// stage.
pub async fn run(config: &PipelineConfig, reports: &ReportsDir) -> Result<()> {
    let runner = ToolRunner::new(config);
    let out = reports.root().canonicalize()?;

    let invocation = ToolInvocation::new("pytest")
        .arg("-q")
        .arg(format!("--junitxml={}", out.join(reports::JUNIT_XML).display()))
        .arg("--cov=.")
        .arg(format!(
            "--cov-report=html:{}",
            out.join(reports::COVERAGE_DIR).display()
        ))
        .arg(format!(
            "--cov-report=xml:{}",
            out.join(reports::COVERAGE_XML).display()
        ))
        .current_dir(&config.project_dir);

    let progress = StepProgress::start("pytest: running test suite");
    match runner.run_checked(&invocation).await {
        Ok(_) => progress.finish_ok("pytest passed"),
        Err(err) => {
            progress.finish_fail("pytest failed");
            return Err(err);
        }
    }

    let coverage = parse_coverage_percent(&std::fs::read_to_string(
        out.join(reports::COVERAGE_XML),
    )?)?;
    info!("Total coverage: {coverage:.1}%");

    if coverage < f64::from(config.coverage_threshold) {
        output::error(format!(
            "Coverage {coverage:.1}% is below the {}% floor",
            config.coverage_threshold
        ));
        return Err(PipelineError::Threshold(format!(
            "coverage {coverage:.1}% below required {}%",
            config.coverage_threshold
        )));
    }

    output::success(format!(
        "Test stage passed ({coverage:.1}% coverage, floor {}%)",
        config.coverage_threshold
    ));
    Ok(())
}

/// Extract the total coverage percentage from a Cobertura XML report.
///
/// The root element carries `line-rate` as a 0..1 fraction; the first
/// occurrence in the document is the overall rate.
fn parse_coverage_percent(xml: &str) -> Result<f64> {
    let re = Regex::new(r#"line-rate="([0-9.]+)""#).expect("valid regex");
    let rate = re
        .captures(xml)
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse::<f64>().ok())
        .ok_or_else(|| {
            PipelineError::Config("coverage.xml has no parsable line-rate attribute".to_string())
        })?;
    Ok(rate * 100.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{stub_tool, tool_config};
    use tempfile::tempdir;

    const COVERAGE_85: &str = r#"<?xml version="1.0" ?>
<coverage version="7.6" line-rate="0.85" branch-rate="0.7" lines-valid="200" lines-covered="170">
  <packages/>
</coverage>"#;

    const COVERAGE_60: &str = r#"<?xml version="1.0" ?>
<coverage version="7.6" line-rate="0.60" branch-rate="0.5" lines-valid="200" lines-covered="120">
  <packages/>
</coverage>"#;

    fn stub_pytest(tools: &std::path::Path, reports: &std::path::Path, coverage_xml: &str) {
        // The stub mimics pytest writing its artifacts, using only shell
        // builtins (the injected PATH has no coreutils).
        let junit = reports.join(crate::reports::JUNIT_XML);
        let cov_dir = reports.join(crate::reports::COVERAGE_DIR);
        let cov_xml = reports.join(crate::reports::COVERAGE_XML);
        let body = format!(
            "echo '<testsuite tests=\"3\" failures=\"0\"/>' > {junit}\n\
             mkdir -p {cov_dir} 2>/dev/null || true\n\
             echo ok > {cov_dir}/index.html\n\
             printf '%s' '{coverage}' > {cov_xml}\n\
             exit 0",
            junit = junit.display(),
            cov_dir = cov_dir.display(),
            cov_xml = cov_xml.display(),
            coverage = coverage_xml.replace('\n', " "),
        );
        stub_tool(tools, "pytest", &body);
    }

    #[test]
    fn test_parse_coverage_percent() {
        assert!((parse_coverage_percent(COVERAGE_85).unwrap() - 85.0).abs() < 0.01);
        assert!((parse_coverage_percent(COVERAGE_60).unwrap() - 60.0).abs() < 0.01);
        assert!(parse_coverage_percent("<coverage/>").is_err());
    }

    #[tokio::test]
    async fn test_stage_passes_above_floor_with_artifacts() {
        let project = tempdir().unwrap();
        let tools = tempdir().unwrap();
        let mut config = tool_config(tools.path());
        config.project_dir = project.path().to_path_buf();
        config.reports_dir = project.path().join("reports");
        let reports = ReportsDir::new(&config.reports_dir);
        reports.ensure().unwrap();

        // mkdir is not a builtin everywhere; pre-create the html dir
        std::fs::create_dir_all(reports.path(crate::reports::COVERAGE_DIR)).unwrap();
        stub_pytest(
            tools.path(),
            &config.reports_dir.canonicalize().unwrap(),
            COVERAGE_85,
        );

        run(&config, &reports).await.unwrap();

        let junit = std::fs::read_to_string(reports.path(crate::reports::JUNIT_XML)).unwrap();
        assert!(junit.contains("testsuite"));
        assert!(reports
            .path(crate::reports::COVERAGE_DIR)
            .join("index.html")
            .exists());
    }

    #[tokio::test]
    async fn test_stage_fails_below_floor_despite_green_tests() {
        let project = tempdir().unwrap();
        let tools = tempdir().unwrap();
        let mut config = tool_config(tools.path());
        config.project_dir = project.path().to_path_buf();
        config.reports_dir = project.path().join("reports");
        config.coverage_threshold = 80;
        let reports = ReportsDir::new(&config.reports_dir);
        reports.ensure().unwrap();

        std::fs::create_dir_all(reports.path(crate::reports::COVERAGE_DIR)).unwrap();
        stub_pytest(
            tools.path(),
            &config.reports_dir.canonicalize().unwrap(),
            COVERAGE_60,
        );

        let err = run(&config, &reports).await.unwrap_err();
        match err {
            PipelineError::Threshold(detail) => {
                assert!(detail.contains("60.0%"));
                assert!(detail.contains("80%"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn test_stage_propagates_pytest_failure() {
        let project = tempdir().unwrap();
        let tools = tempdir().unwrap();
        stub_tool(tools.path(), "pytest", "exit 2");

        let mut config = tool_config(tools.path());
        config.project_dir = project.path().to_path_buf();
        config.reports_dir = project.path().join("reports");
        let reports = ReportsDir::new(&config.reports_dir);
        reports.ensure().unwrap();

        let err = run(&config, &reports).await.unwrap_err();
        assert!(matches!(
            err,
            PipelineError::ToolFailure { code: 2, .. }
        ));
    }
}
