mod build;
mod lint;
mod scan;
mod test;

use std::path::{Path, PathBuf};

use log::info;

use crate::config::{PipelineConfig, Stage};
use crate::error::Result;
use crate::reports::ReportsDir;

/// Run one CI stage to completion.
///
/// Stage-specific configuration is validated before any side effect: the
/// reports directory is only created once the request is known to be
/// runnable. Tool failures abort the stage immediately and propagate the
/// tool's exit code; there are no retries.
pub async fn run(stage: Stage, config: &PipelineConfig) -> Result<()> {
    // build and scan need a complete image reference up front
    if matches!(stage, Stage::Build | Stage::Scan) {
        config.image_ref()?;
    }

    let reports = ReportsDir::new(&config.reports_dir);
    reports.ensure()?;

    info!("Running stage: {stage}");
    crate::output::info(format!("Stage: {stage}"));

    match stage {
        Stage::Lint => lint::run(config, &reports).await,
        Stage::Test => test::run(config, &reports).await,
        Stage::Build => build::run(config).await,
        Stage::Scan => scan::run(config, &reports).await,
    }
}

/// Recursively collect files under `root` whose file name satisfies
/// `matches`, skipping hidden directories and the reports directory.
pub(crate) fn find_files<F>(root: &Path, reports_dir: &Path, matches: F) -> Vec<PathBuf>
where
    F: Fn(&str) -> bool,
{
    let skip = reports_dir.canonicalize().ok();
    let mut found = Vec::new();
    let mut pending = vec![root.to_path_buf()];

    while let Some(dir) = pending.pop() {
        let Ok(entries) = std::fs::read_dir(&dir) else {
            continue;
        };
        for entry in entries.flatten() {
            let path = entry.path();
            let name = entry.file_name();
            let name = name.to_string_lossy();

            if path.is_dir() {
                if name.starts_with('.') {
                    continue;
                }
                if skip.as_deref().is_some_and(|s| {
                    path.canonicalize().map(|p| p == s).unwrap_or(false)
                }) {
                    continue;
                }
                pending.push(path);
            } else if matches(&name) {
                found.push(path);
            }
        }
    }

    found.sort();
    found
}
