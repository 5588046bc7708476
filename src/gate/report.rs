use std::path::Path;

use crate::error::Result;

use super::{CheckStatus, GateReport};

/// Render and write the timestamped markdown report for one gate run.
pub fn write_markdown(gate: &GateReport, path: &Path) -> Result<()> {
    std::fs::write(path, render_markdown(gate))?;
    Ok(())
}

/// Write the machine-readable summary for tooling integration.
pub fn write_json(gate: &GateReport, path: &Path) -> Result<()> {
    std::fs::write(path, serde_json::to_string_pretty(gate)?)?;
    Ok(())
}

fn render_markdown(gate: &GateReport) -> String {
    let mut out = String::new();
    out.push_str("# Quality Gate Report\n\n");
    out.push_str(&format!(
        "Generated: {}\n\n",
        gate.generated_at.format("%Y-%m-%d %H:%M:%S UTC")
    ));

    out.push_str("## Thresholds\n");
    out.push_str(&format!("- preset: {}\n", gate.preset));
    out.push_str(&format!(
        "- minimum coverage: {}%\n",
        gate.thresholds.min_coverage
    ));
    out.push_str(&format!(
        "- maximum complexity: {}\n",
        gate.thresholds.max_complexity
    ));
    out.push_str(&format!(
        "- maximum line length: {}\n",
        gate.thresholds.max_line_length
    ));
    out.push_str(&format!(
        "- maximum duplication: {}%\n\n",
        gate.thresholds.max_duplication
    ));

    out.push_str("## Checks\n");
    out.push_str("| Check | Tool | Weight | Result |\n| --- | --- | --- | --- |\n");
    for result in &gate.results {
        let verdict = match &result.status {
            CheckStatus::Passed => "✅ passed".to_string(),
            CheckStatus::Failed { detail } => format!("❌ failed — {detail}"),
            CheckStatus::Skipped => "⏭ skipped (tool not installed)".to_string(),
        };
        out.push_str(&format!(
            "| {} | {} | {} | {} |\n",
            result.name, result.tool, result.weight, verdict
        ));
    }
    out.push('\n');

    out.push_str("## Score\n");
    out.push_str(&format!(
        "- checks attempted: {} (passed {}, failed {}, skipped {})\n",
        gate.attempted, gate.passed, gate.failed, gate.skipped
    ));
    out.push_str(&format!(
        "- weighted: {}/{} points\n",
        gate.passed_weight, gate.attempted_weight
    ));
    out.push_str(&format!("- score: {}%\n", gate.score));
    out.push_str(&format!("- grade: {}\n\n", gate.grade));

    if gate.is_passing() {
        out.push_str("All attempted checks passed.\n");
    } else {
        out.push_str("## Remediation\n");
        for result in &gate.results {
            if let CheckStatus::Failed { detail } = &result.status {
                out.push_str(&format!("- [ ] {}: {detail}\n", result.name));
            }
        }
        out.push('\n');
        out.push_str("General steps:\n");
        out.push_str("- Re-run the failing tool locally with the thresholds above\n");
        out.push_str("- Review the raw output under the reports directory (gate_*.txt)\n");
        out.push_str("- Fix findings or adjust the preset, then re-run `cigate gate`\n");
    }

    out
}
