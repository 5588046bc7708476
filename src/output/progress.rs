use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};

use super::styling::{bright_green, bright_red, bright_yellow};

/// Spinner for one pipeline step (a tool invocation or a gate check).
pub struct StepProgress {
    pb: ProgressBar,
}

impl StepProgress {
    pub fn start(message: impl Into<String>) -> Self {
        let pb = create_spinner(bright_yellow(message.into()).to_string());
        Self { pb }
    }

    pub fn finish_ok(self, message: impl Into<String>) {
        self.pb
            .finish_with_message(bright_green(format!("{} ✓", message.into())).to_string());
    }

    pub fn finish_fail(self, message: impl Into<String>) {
        self.pb
            .finish_with_message(bright_red(format!("{} ✗", message.into())).to_string());
    }

    pub fn finish_skipped(self, message: impl Into<String>) {
        self.pb.finish_with_message(
            super::styling::dim(format!("{} (skipped)", message.into())).to_string(),
        );
    }
}

fn create_spinner(message: String) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_draw_target(ProgressDrawTarget::stderr());
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("  {msg} {spinner}")
            .unwrap(),
    );
    pb.set_message(message);
    pb.enable_steady_tick(std::time::Duration::from_millis(100));
    pb
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_step_progress_lifecycle() {
        StepProgress::start("working").finish_ok("done");
        StepProgress::start("working").finish_fail("failed");
        StepProgress::start("working").finish_skipped("tool missing");
    }
}
