use std::ffi::OsString;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use anyhow::Context;
use serde::{Deserialize, Serialize};

use crate::error::{PipelineError, Result};

/// One of the four CI stages the dispatcher can run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Stage {
    Lint,
    Test,
    Build,
    Scan,
}

impl Stage {
    /// All stages in pipeline order. `ci` runs them in exactly this order.
    pub const ALL: [Stage; 4] = [Stage::Lint, Stage::Test, Stage::Build, Stage::Scan];

    pub fn name(self) -> &'static str {
        match self {
            Stage::Lint => "lint",
            Stage::Test => "test",
            Stage::Build => "build",
            Stage::Scan => "scan",
        }
    }
}

impl FromStr for Stage {
    type Err = PipelineError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "lint" => Ok(Stage::Lint),
            "test" => Ok(Stage::Test),
            "build" => Ok(Stage::Build),
            "scan" => Ok(Stage::Scan),
            other => Err(PipelineError::UnknownStage(other.to_string())),
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Named threshold presets for the quality gate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ThresholdPreset {
    Strict,
    #[default]
    Standard,
    Relaxed,
}

impl ThresholdPreset {
    pub fn name(self) -> &'static str {
        match self {
            ThresholdPreset::Strict => "strict",
            ThresholdPreset::Standard => "standard",
            ThresholdPreset::Relaxed => "relaxed",
        }
    }

    /// Fixed numeric thresholds for this preset.
    pub fn thresholds(self) -> Thresholds {
        match self {
            ThresholdPreset::Strict => Thresholds {
                min_coverage: 90,
                max_complexity: 8,
                max_line_length: 120,
                max_duplication: 2.0,
            },
            ThresholdPreset::Standard => Thresholds {
                min_coverage: 80,
                max_complexity: 10,
                max_line_length: 120,
                max_duplication: 3.0,
            },
            ThresholdPreset::Relaxed => Thresholds {
                min_coverage: 70,
                max_complexity: 12,
                max_line_length: 120,
                max_duplication: 5.0,
            },
        }
    }
}

impl FromStr for ThresholdPreset {
    type Err = PipelineError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "strict" => Ok(ThresholdPreset::Strict),
            "standard" => Ok(ThresholdPreset::Standard),
            "relaxed" => Ok(ThresholdPreset::Relaxed),
            other => Err(PipelineError::UnknownPreset(other.to_string())),
        }
    }
}

impl fmt::Display for ThresholdPreset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Numeric thresholds the quality gate checks enforce.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Thresholds {
    pub min_coverage: u8,
    pub max_complexity: u32,
    pub max_line_length: u32,
    pub max_duplication: f64,
}

impl Default for Thresholds {
    fn default() -> Self {
        ThresholdPreset::Standard.thresholds()
    }
}

/// A fully-qualified container image reference for build/scan stages.
#[derive(Debug, Clone)]
pub struct ImageRef {
    pub registry: String,
    pub image: String,
    pub tag: String,
}

impl ImageRef {
    /// `registry/image` without a tag.
    pub fn repository(&self) -> String {
        format!("{}/{}", self.registry, self.image)
    }

    /// `registry/image:tag`.
    pub fn reference(&self) -> String {
        format!("{}:{}", self.repository(), self.tag)
    }

    pub fn latest(&self) -> String {
        format!("{}:latest", self.repository())
    }
}

/// Resolved, immutable run configuration.
///
/// Built once at entry from CLI arguments, environment variables, and the
/// optional config file, then passed by reference to every component. No
/// component reads the process environment after this point.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Directory whose sources the stages and gate operate on.
    pub project_dir: PathBuf,

    /// Directory report artifacts are written to.
    pub reports_dir: PathBuf,

    /// Container registry host, required by build/scan.
    pub registry: Option<String>,

    /// Image name under the registry, required by build/scan.
    pub image: Option<String>,

    /// Image tag, required by build/scan.
    pub tag: Option<String>,

    /// Coverage floor for the test stage, percent.
    pub coverage_threshold: u8,

    /// Quality-gate thresholds, derived from the preset.
    pub thresholds: Thresholds,

    /// Override for the executable lookup path. When set, tools are
    /// resolved and spawned with this PATH instead of the ambient one.
    pub tool_path: Option<OsString>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            project_dir: PathBuf::from("."),
            reports_dir: PathBuf::from("reports"),
            registry: None,
            image: None,
            tag: None,
            coverage_threshold: default_coverage_threshold(),
            thresholds: Thresholds::default(),
            tool_path: None,
        }
    }
}

impl PipelineConfig {
    /// Validate the image variables required by the build and scan stages.
    ///
    /// # Errors
    ///
    /// Returns `MissingVar` naming the first unset variable, in the fixed
    /// order `REGISTRY`, `IMAGE`, `TAG`.
    pub fn image_ref(&self) -> Result<ImageRef> {
        let registry = non_empty(self.registry.as_deref())
            .ok_or(PipelineError::MissingVar("REGISTRY"))?;
        let image =
            non_empty(self.image.as_deref()).ok_or(PipelineError::MissingVar("IMAGE"))?;
        let tag = non_empty(self.tag.as_deref()).ok_or(PipelineError::MissingVar("TAG"))?;

        Ok(ImageRef {
            registry: registry.to_string(),
            image: image.to_string(),
            tag: tag.to_string(),
        })
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.is_empty())
}

/// Configuration file structure for cigate.
///
/// Allows users to save common pipeline settings and reuse them across runs.
/// Every field is optional; CLI arguments and environment variables take
/// precedence over file values.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct FileConfig {
    /// Stage runner defaults
    #[serde(default)]
    pub pipeline: PipelineFileConfig,

    /// Quality gate defaults
    #[serde(default)]
    pub gate: GateFileConfig,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct PipelineFileConfig {
    /// Container registry host
    pub registry: Option<String>,

    /// Image name under the registry
    pub image: Option<String>,

    /// Image tag
    pub tag: Option<String>,

    /// Reports output directory
    pub reports_dir: Option<PathBuf>,

    /// Coverage floor for the test stage, percent
    pub coverage_threshold: Option<u8>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct GateFileConfig {
    /// Threshold preset: strict, standard, or relaxed
    pub preset: Option<String>,
}

fn default_coverage_threshold() -> u8 {
    80
}

impl FileConfig {
    /// Load configuration from a file.
    ///
    /// Searches for configuration files in this order:
    /// 1. Specified path
    /// 2. ./cigate.toml
    /// 3. ./cigate.json
    /// 4. ./cigate.yaml
    /// 5. ./cigate.yml
    ///
    /// Returns default configuration if no file is found.
    pub fn load(path: Option<&Path>) -> anyhow::Result<Self> {
        if let Some(path) = path {
            return Self::load_from_path(path);
        }

        let candidates = ["cigate.toml", "cigate.json", "cigate.yaml", "cigate.yml"];

        for candidate in &candidates {
            let path = Path::new(candidate);
            if path.exists() {
                return Self::load_from_path(path);
            }
        }

        Ok(Self::default())
    }

    /// Load configuration from a specific file path.
    fn load_from_path(path: &Path) -> anyhow::Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let extension = path.extension().and_then(|ext| ext.to_str()).unwrap_or("");

        match extension {
            "toml" => toml::from_str(&contents)
                .with_context(|| format!("Failed to parse TOML config: {}", path.display())),
            "json" => serde_json::from_str(&contents)
                .with_context(|| format!("Failed to parse JSON config: {}", path.display())),
            "yaml" | "yml" => serde_yaml::from_str(&contents)
                .with_context(|| format!("Failed to parse YAML config: {}", path.display())),
            _ => {
                // Try TOML first, then JSON, then YAML
                toml::from_str(&contents)
                    .or_else(|_| serde_json::from_str(&contents))
                    .or_else(|_| serde_yaml::from_str(&contents))
                    .with_context(|| format!("Failed to parse config file: {}", path.display()))
            }
        }
    }
}
