mod progress;
mod styling;
mod summary;
mod tables;

pub use progress::StepProgress;
pub use summary::{print_gate_summary, print_status};

use styling::{bright_green, bright_red, bright_yellow, cyan, dim, magenta_bold};

/// Prints the `cigate` banner to stderr.
///
/// Displays the tool name, version, and description at the start of execution.
pub fn print_banner() {
    eprintln!(
        r"
{} {}
  {}
",
        magenta_bold("🚦 cigate"),
        dim(env!("CARGO_PKG_VERSION")),
        dim("CI Stage Runner & Quality Gate")
    );
}

/// Leveled console messages accompanying state transitions.
pub fn info(message: impl std::fmt::Display) {
    eprintln!("{} {}", cyan("ℹ"), message);
}

pub fn warn(message: impl std::fmt::Display) {
    eprintln!("{} {}", bright_yellow("⚠"), message);
}

pub fn error(message: impl std::fmt::Display) {
    eprintln!("{} {}", bright_red("✗"), message);
}

pub fn success(message: impl std::fmt::Display) {
    eprintln!("{} {}", bright_green("✓"), message);
}
