use std::path::{Path, PathBuf};

use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use log::info;

use crate::config::{FileConfig, PipelineConfig, Stage, ThresholdPreset};
use crate::output;
use crate::reports::ReportsDir;
use crate::{gate, serve, stage};

#[derive(Parser)]
#[command(name = "cigate")]
#[command(author, version, about = "CI Stage Runner & Quality Gate", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Config file (defaults to ./cigate.{toml,json,yaml,yml})
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Reports output directory
    #[arg(short, long, global = true, env = "REPORTS_DIR")]
    reports_dir: Option<PathBuf>,

    /// Directory the stages and gate operate on
    #[arg(long, global = true, default_value = ".")]
    project_dir: PathBuf,

    /// Write the quality-gate JSON summary here instead of the reports dir only
    #[arg(short, long, global = true)]
    output: Option<PathBuf>,

    #[arg(short, long, global = true, default_value_t = false)]
    pretty: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Run all four stages in order, aborting on the first failure
    Ci(StageArgs),

    /// Run the stage named by --stage or the CI_STAGE environment variable
    Run {
        #[arg(short, long, env = "CI_STAGE")]
        stage: String,

        #[command(flatten)]
        args: StageArgs,
    },

    /// Lint Dockerfiles, Python sources, and shell scripts
    Lint(StageArgs),

    /// Run the test suite with coverage gating
    Test(StageArgs),

    /// Multi-arch image build and push
    Build(StageArgs),

    /// Vulnerability scan with severity gating, plus SBOM
    Scan(StageArgs),

    /// Run the weighted quality-check battery
    Gate {
        /// Threshold preset: strict, standard, or relaxed
        #[arg(short = 'P', long, env = "QUALITY_PRESET")]
        preset: Option<String>,

        #[command(flatten)]
        args: StageArgs,
    },

    /// Serve the reports directory over HTTP
    Reports {
        #[arg(long, env = "REPORTS_PORT", default_value_t = 8080)]
        port: u16,
    },

    /// Empty the reports directory
    Clean,

    /// Check that the local environment file exists
    Validate(EnvArgs),

    /// Validate and create the reports directory
    Setup(EnvArgs),

    /// Show report artifact status
    Status,
}

#[derive(Args, Default)]
struct StageArgs {
    /// Container registry host (required by build/scan)
    #[arg(long, env = "REGISTRY")]
    registry: Option<String>,

    /// Image name under the registry (required by build/scan)
    #[arg(long, env = "IMAGE")]
    image: Option<String>,

    /// Image tag (required by build/scan)
    #[arg(long, env = "TAG")]
    tag: Option<String>,

    /// Coverage floor for the test stage, percent
    #[arg(long, env = "COVERAGE_THRESHOLD")]
    coverage_threshold: Option<u8>,
}

#[derive(Args)]
struct EnvArgs {
    /// Local environment file required before running the pipeline
    #[arg(long, env = "ENV_FILE", default_value = ".env")]
    env_file: PathBuf,
}

impl Cli {
    pub async fn execute(&self) -> Result<()> {
        let file = FileConfig::load(self.config.as_deref())?;

        match &self.command {
            Commands::Ci(args) => {
                let config = self.pipeline_config(&file, args, None)?;
                for stage in Stage::ALL {
                    stage::run(stage, &config).await?;
                }
                output::success("All stages passed");
                Ok(())
            }
            Commands::Run { stage, args } => {
                let stage: Stage = stage.parse()?;
                let config = self.pipeline_config(&file, args, None)?;
                stage::run(stage, &config).await?;
                Ok(())
            }
            Commands::Lint(args) => self.run_stage(Stage::Lint, &file, args).await,
            Commands::Test(args) => self.run_stage(Stage::Test, &file, args).await,
            Commands::Build(args) => self.run_stage(Stage::Build, &file, args).await,
            Commands::Scan(args) => self.run_stage(Stage::Scan, &file, args).await,
            Commands::Gate { preset, args } => self.execute_gate(&file, preset.as_deref(), args).await,
            Commands::Reports { port } => {
                let reports = ReportsDir::new(self.reports_root(&file));
                serve::serve(&reports, *port).await?;
                Ok(())
            }
            Commands::Clean => {
                ReportsDir::new(self.reports_root(&file)).clean()?;
                output::success("Reports directory cleaned");
                Ok(())
            }
            Commands::Validate(env) => validate_env_file(&env.env_file),
            Commands::Setup(env) => {
                validate_env_file(&env.env_file)?;
                let reports = ReportsDir::new(self.reports_root(&file));
                reports.ensure()?;
                output::success(format!("Ready ({} exists)", reports.root().display()));
                Ok(())
            }
            Commands::Status => {
                let reports = ReportsDir::new(self.reports_root(&file));
                output::print_status(&reports.status());
                Ok(())
            }
        }
    }

    async fn run_stage(&self, stage: Stage, file: &FileConfig, args: &StageArgs) -> Result<()> {
        let config = self.pipeline_config(file, args, None)?;
        stage::run(stage, &config).await?;
        Ok(())
    }

    async fn execute_gate(
        &self,
        file: &FileConfig,
        preset: Option<&str>,
        args: &StageArgs,
    ) -> Result<()> {
        // CLI wins, then the config file, then the standard preset
        let preset: ThresholdPreset = match preset.or(file.gate.preset.as_deref()) {
            Some(name) => name.parse()?,
            None => ThresholdPreset::default(),
        };

        let config = self.pipeline_config(file, args, Some(preset))?;
        info!("Running quality gate for {}", config.project_dir.display());
        let gate = gate::run(&config, preset).await?;

        if let Some(output_path) = &self.output {
            let json = if self.pretty {
                serde_json::to_string_pretty(&gate)?
            } else {
                serde_json::to_string(&gate)?
            };
            std::fs::write(output_path, json)?;
            info!("Gate summary written to: {}", output_path.display());
        }

        if gate.is_passing() {
            Ok(())
        } else {
            Err(crate::error::PipelineError::Threshold(format!(
                "{} quality check(s) failed",
                gate.failed
            ))
            .into())
        }
    }

    fn reports_root(&self, file: &FileConfig) -> PathBuf {
        self.reports_dir
            .clone()
            .or_else(|| file.pipeline.reports_dir.clone())
            .unwrap_or_else(|| PathBuf::from("reports"))
    }

    fn pipeline_config(
        &self,
        file: &FileConfig,
        args: &StageArgs,
        preset: Option<ThresholdPreset>,
    ) -> Result<PipelineConfig> {
        let defaults = PipelineConfig::default();
        Ok(PipelineConfig {
            project_dir: self.project_dir.clone(),
            reports_dir: self.reports_root(file),
            registry: args.registry.clone().or_else(|| file.pipeline.registry.clone()),
            image: args.image.clone().or_else(|| file.pipeline.image.clone()),
            tag: args.tag.clone().or_else(|| file.pipeline.tag.clone()),
            coverage_threshold: args
                .coverage_threshold
                .or(file.pipeline.coverage_threshold)
                .unwrap_or(defaults.coverage_threshold),
            thresholds: preset.unwrap_or_default().thresholds(),
            tool_path: None,
        })
    }
}

fn validate_env_file(env_file: &Path) -> Result<()> {
    if env_file.exists() {
        output::success(format!("{} present", env_file.display()));
        Ok(())
    } else {
        anyhow::bail!(
            "Environment file {} not found. Copy {}.example to {} and fill in your values.",
            env_file.display(),
            env_file.display(),
            env_file.display()
        )
    }
}
