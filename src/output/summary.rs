use comfy_table::{Cell, Color as TableColor};

use crate::gate::{CheckStatus, GateReport};
use crate::reports::ArtifactStatus;

use super::styling::{bright, bright_green, bright_red, dim};
use super::tables::{check_status_cell, color_coded_score_cell, create_table, presence_cell};

/// Prints a human-readable summary of a quality-gate run to stdout.
///
/// Shows one row per check (status color-coded green/red/grey) followed
/// by the weighted score, letter grade, and pass/fail verdict. The
/// verdict follows the failed-check count, not the grade.
pub fn print_gate_summary(gate: &GateReport) {
    println!(
        "\n{}  {}",
        bright("🚦"),
        bright("Quality Gate").underlined()
    );

    let mut table = create_table();
    table.set_header(create_cyan_header(&["Check", "Tool", "Weight", "Status", "Detail"]));
    for result in &gate.results {
        let detail = match &result.status {
            CheckStatus::Failed { detail } => detail.clone(),
            _ => String::new(),
        };
        table.add_row(vec![
            Cell::new(result.name),
            Cell::new(result.tool),
            Cell::new(result.weight),
            check_status_cell(&result.status),
            Cell::new(detail),
        ]);
    }
    println!("{table}");

    let mut totals = create_table();
    totals.set_header(create_cyan_header(&["Attempted", "Passed", "Failed", "Skipped", "Score", "Grade"]));
    totals.add_row(vec![
        Cell::new(gate.attempted),
        Cell::new(gate.passed),
        Cell::new(gate.failed),
        Cell::new(gate.skipped),
        color_coded_score_cell(gate.score),
        Cell::new(gate.grade.symbol()),
    ]);
    println!("{totals}");

    if gate.is_passing() {
        println!("{}", bright_green("Quality gate passed"));
    } else {
        println!(
            "{}",
            bright_red(format!("Quality gate failed ({} check(s))", gate.failed))
        );
    }
}

/// Prints the reports-directory artifact table for the `status` command.
pub fn print_status(artifacts: &[ArtifactStatus]) {
    println!("\n{}  {}", bright("📄"), bright("Report Artifacts").underlined());

    let mut table = create_table();
    table.set_header(create_cyan_header(&["Artifact", "State", "Size", "Modified"]));
    for artifact in artifacts {
        let modified = artifact
            .modified
            .map(|t| t.format("%Y-%m-%d %H:%M:%S UTC").to_string())
            .unwrap_or_else(|| dim("-").to_string());
        let size = if artifact.present {
            format_size(artifact.size)
        } else {
            "-".to_string()
        };
        table.add_row(vec![
            Cell::new(artifact.name),
            presence_cell(artifact.present),
            Cell::new(size),
            Cell::new(modified),
        ]);
    }
    println!("{table}");
}

// Helper functions

fn create_cyan_header(labels: &[&str]) -> Vec<Cell> {
    labels
        .iter()
        .map(|label| Cell::new(*label).fg(TableColor::Cyan))
        .collect()
}

fn format_size(bytes: u64) -> String {
    if bytes >= 1024 * 1024 {
        format!("{:.1} MiB", bytes as f64 / (1024.0 * 1024.0))
    } else if bytes >= 1024 {
        format!("{:.1} KiB", bytes as f64 / 1024.0)
    } else {
        format!("{bytes} B")
    }
}
