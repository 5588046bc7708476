use log::info;

use crate::config::PipelineConfig;
use crate::error::Result;
use crate::output::{self, StepProgress};
use crate::runner::{ToolInvocation, ToolRunner};

const BUILDER_NAME: &str = "cigate-builder";
const PLATFORMS: &str = "linux/amd64,linux/arm64,linux/arm/v7";

/// Build stage: one atomic multi-arch build and push.
///
/// The image is built for all target platforms in a single buildx
/// invocation, tagged with both the explicit tag and `latest`, and pushed.
/// A failure on any platform fails the whole step.
pub async fn run(config: &PipelineConfig) -> Result<()> {
    let image = config.image_ref()?;
    let runner = ToolRunner::new(config);

    ensure_builder(&runner).await?;

    let progress = StepProgress::start(format!("buildx: building {}", image.reference()));
    let invocation = ToolInvocation::new("docker")
        .args(["buildx", "build"])
        .arg(format!("--platform={PLATFORMS}"))
        .arg("--tag")
        .arg(image.reference())
        .arg("--tag")
        .arg(image.latest())
        .arg("--push")
        .arg(config.project_dir.display().to_string());

    match runner.run_checked(&invocation).await {
        Ok(_) => {
            progress.finish_ok(format!("buildx: pushed {}", image.reference()));
            output::success("Build stage passed");
            Ok(())
        }
        Err(err) => {
            progress.finish_fail("buildx build failed");
            Err(err)
        }
    }
}

/// Create the multi-platform builder on first use, reuse it afterwards.
async fn ensure_builder(runner: &ToolRunner) -> Result<()> {
    let inspect = ToolInvocation::new("docker").args(["buildx", "inspect", BUILDER_NAME]);
    if runner.run(&inspect).await?.success() {
        info!("Reusing buildx builder {BUILDER_NAME}");
        return Ok(());
    }

    info!("Creating buildx builder {BUILDER_NAME}");
    runner
        .run_checked(
            &ToolInvocation::new("docker")
                .args(["buildx", "create", "--name", BUILDER_NAME, "--use"]),
        )
        .await?;
    Ok(())
}
