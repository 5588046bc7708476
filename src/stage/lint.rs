use log::info;

use crate::config::PipelineConfig;
use crate::error::Result;
use crate::output::{self, StepProgress};
use crate::reports::{self, ReportsDir};
use crate::runner::{ToolInvocation, ToolRunner};

/// Lint stage: hadolint over Dockerfiles, ruff over Python sources,
/// shellcheck over shell scripts, strictly in that order.
///
/// A linter with no matching files is skipped with a warning. A nonzero
/// exit from any linter aborts the stage with that exit code; later
/// linters are not invoked.
pub async fn run(config: &PipelineConfig, reports: &ReportsDir) -> Result<()> {
    let runner = ToolRunner::new(config);

    lint_files(
        config,
        reports,
        &runner,
        "hadolint",
        reports::HADOLINT_TXT,
        &[],
        |name| name.starts_with("Dockerfile"),
        "Dockerfiles",
    )
    .await?;

    lint_files(
        config,
        reports,
        &runner,
        "ruff",
        reports::RUFF_TXT,
        &["check"],
        |name| name.ends_with(".py"),
        "Python files",
    )
    .await?;

    lint_files(
        config,
        reports,
        &runner,
        "shellcheck",
        reports::SHELLCHECK_TXT,
        &[],
        |name| name.ends_with(".sh"),
        "shell scripts",
    )
    .await?;

    output::success("Lint stage passed");
    Ok(())
}

#[allow(clippy::too_many_arguments)]
async fn lint_files<F>(
    config: &PipelineConfig,
    reports: &ReportsDir,
    runner: &ToolRunner,
    tool: &str,
    report_name: &str,
    base_args: &[&str],
    matches: F,
    description: &str,
) -> Result<()>
where
    F: Fn(&str) -> bool,
{
    let files = super::find_files(&config.project_dir, reports.root(), matches);
    if files.is_empty() {
        output::warn(format!("No {description} found, skipping {tool}"));
        return Ok(());
    }

    info!("{tool}: checking {} {description}", files.len());
    let progress = StepProgress::start(format!("{tool}: {} {description}", files.len()));

    let invocation = ToolInvocation::new(tool)
        .args(base_args.iter().copied())
        .args(files.iter().map(|f| f.display().to_string()))
        .capture_to(reports.path(report_name));

    match runner.run_checked(&invocation).await {
        Ok(_) => {
            progress.finish_ok(format!("{tool} passed"));
            Ok(())
        }
        Err(err) => {
            progress.finish_fail(format!("{tool} failed"));
            Err(err)
        }
    }
}
