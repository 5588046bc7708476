use comfy_table::modifiers::UTF8_ROUND_CORNERS;
use comfy_table::presets::UTF8_FULL;
use comfy_table::{Cell, Color as TableColor, ContentArrangement, Table};

use crate::gate::CheckStatus;

/// Table and cell creation helpers
pub fn create_table() -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_content_arrangement(ContentArrangement::Dynamic);
    table
}

pub fn check_status_cell(status: &CheckStatus) -> Cell {
    match status {
        CheckStatus::Passed => Cell::new("passed").fg(TableColor::Green),
        CheckStatus::Failed { .. } => Cell::new("failed").fg(TableColor::Red),
        CheckStatus::Skipped => Cell::new("skipped").fg(TableColor::DarkGrey),
    }
}

pub fn color_coded_score_cell(score: u32) -> Cell {
    let text = format!("{score}%");
    if score >= 90 {
        Cell::new(text).fg(TableColor::Green)
    } else if score >= 70 {
        Cell::new(text).fg(TableColor::Yellow)
    } else {
        Cell::new(text).fg(TableColor::Red)
    }
}

pub fn presence_cell(present: bool) -> Cell {
    if present {
        Cell::new("present").fg(TableColor::Green)
    } else {
        Cell::new("missing").fg(TableColor::DarkGrey)
    }
}
