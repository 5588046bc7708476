mod checks;
mod report;

use chrono::{DateTime, Utc};
use log::{info, warn};
use serde::Serialize;

use crate::config::{PipelineConfig, ThresholdPreset, Thresholds};
use crate::error::Result;
use crate::output::{self, StepProgress};
use crate::reports::ReportsDir;
use crate::runner::{ToolInvocation, ToolRunner};

pub use checks::{battery, CheckSpec};

/// Outcome of one quality check.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckStatus {
    Passed,
    Failed { detail: String },
    Skipped,
}

#[derive(Debug, Clone, Serialize)]
pub struct CheckResult {
    pub name: &'static str,
    pub weight: u32,
    pub tool: &'static str,
    pub status: CheckStatus,
}

/// Letter grade for the aggregate score. The scale deliberately has no D
/// band: anything below 70 is an F.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Grade {
    A,
    B,
    C,
    F,
}

impl Grade {
    pub fn from_score(score: u32) -> Self {
        match score {
            90.. => Grade::A,
            80..=89 => Grade::B,
            70..=79 => Grade::C,
            _ => Grade::F,
        }
    }

    pub fn symbol(self) -> &'static str {
        match self {
            Grade::A => "A",
            Grade::B => "B",
            Grade::C => "C",
            Grade::F => "F",
        }
    }
}

impl std::fmt::Display for Grade {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.symbol())
    }
}

/// Aggregate result of one gate run. Immutable once written; each run
/// produces a fresh timestamped markdown report.
#[derive(Debug, Serialize)]
pub struct GateReport {
    pub generated_at: DateTime<Utc>,
    pub preset: ThresholdPreset,
    pub thresholds: Thresholds,
    pub results: Vec<CheckResult>,
    pub attempted: usize,
    pub passed: usize,
    pub failed: usize,
    pub skipped: usize,
    pub attempted_weight: u32,
    pub passed_weight: u32,
    pub score: u32,
    pub grade: Grade,
}

impl GateReport {
    /// The authoritative pass/fail signal: any failed check fails the
    /// gate, regardless of the numeric score. The letter grade is
    /// informational only.
    pub fn is_passing(&self) -> bool {
        self.failed == 0
    }
}

/// Fold check results into a report.
///
/// Skipped checks contribute to neither the numerator nor the
/// denominator, so the percentage is relative to the tools actually
/// present on this machine.
pub fn aggregate(
    results: Vec<CheckResult>,
    preset: ThresholdPreset,
    thresholds: Thresholds,
    generated_at: DateTime<Utc>,
) -> GateReport {
    let mut attempted = 0;
    let mut passed = 0;
    let mut failed = 0;
    let mut skipped = 0;
    let mut attempted_weight = 0;
    let mut passed_weight = 0;

    for result in &results {
        match &result.status {
            CheckStatus::Passed => {
                attempted += 1;
                passed += 1;
                attempted_weight += result.weight;
                passed_weight += result.weight;
            }
            CheckStatus::Failed { .. } => {
                attempted += 1;
                failed += 1;
                attempted_weight += result.weight;
            }
            CheckStatus::Skipped => skipped += 1,
        }
    }

    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let score = if attempted_weight == 0 {
        100
    } else {
        (100.0 * f64::from(passed_weight) / f64::from(attempted_weight)).round() as u32
    };

    GateReport {
        generated_at,
        preset,
        thresholds,
        results,
        attempted,
        passed,
        failed,
        skipped,
        attempted_weight,
        passed_weight,
        score,
        grade: Grade::from_score(score),
    }
}

/// Run the full battery, write the markdown and JSON reports, and return
/// the aggregate.
///
/// Checks never short-circuit each other: a failure in one check does not
/// prevent later checks from running.
pub async fn run(config: &PipelineConfig, preset: ThresholdPreset) -> Result<GateReport> {
    let reports = ReportsDir::new(&config.reports_dir);
    reports.ensure()?;

    let runner = ToolRunner::new(config);
    let thresholds = config.thresholds;
    info!("Quality gate using preset '{preset}'");

    let mut results = Vec::new();
    for spec in battery() {
        results.push(run_check(&spec, config, &runner, &reports, &thresholds).await?);
    }

    let gate = aggregate(results, preset, thresholds, Utc::now());
    output::print_gate_summary(&gate);

    let markdown_path = reports.gate_markdown(gate.generated_at);
    report::write_markdown(&gate, &markdown_path)?;
    report::write_json(&gate, &reports.path(crate::reports::GATE_LATEST_JSON))?;
    output::info(format!("Gate report written to {}", markdown_path.display()));

    Ok(gate)
}

async fn run_check(
    spec: &CheckSpec,
    config: &PipelineConfig,
    runner: &ToolRunner,
    reports: &ReportsDir,
    thresholds: &Thresholds,
) -> Result<CheckResult> {
    if !runner.is_available(spec.tool) {
        warn!("{}: tool '{}' not found, skipping", spec.name, spec.tool);
        let progress = StepProgress::start(format!("{}: {}", spec.name, spec.tool));
        progress.finish_skipped(format!("{}: {} not installed", spec.name, spec.tool));
        return Ok(CheckResult {
            name: spec.name,
            weight: spec.weight,
            tool: spec.tool,
            status: CheckStatus::Skipped,
        });
    }

    let progress = StepProgress::start(format!("{}: {}", spec.name, spec.tool));
    let invocation = ToolInvocation::new(spec.tool)
        .args(spec.args(thresholds))
        .current_dir(&config.project_dir)
        .capture_to(reports.path(&format!("gate_{}.txt", spec.name)));

    let tool_output = runner.run(&invocation).await?;
    let status = match spec.judge(&tool_output, thresholds) {
        None => {
            progress.finish_ok(format!("{} passed", spec.name));
            CheckStatus::Passed
        }
        Some(detail) => {
            progress.finish_fail(format!("{}: {detail}", spec.name));
            CheckStatus::Failed { detail }
        }
    };

    Ok(CheckResult {
        name: spec.name,
        weight: spec.weight,
        tool: spec.tool,
        status,
    })
}
