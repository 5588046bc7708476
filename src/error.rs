use thiserror::Error;

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Missing required environment variable: {0}")]
    MissingVar(&'static str),

    #[error("Unknown CI stage: '{0}' (expected lint|test|build|scan)")]
    UnknownStage(String),

    #[error("Unknown quality preset: '{0}' (expected strict|standard|relaxed)")]
    UnknownPreset(String),

    #[error("{tool} failed with exit code {code}")]
    ToolFailure { tool: String, code: i32 },

    #[error("Threshold violation: {0}")]
    Threshold(String),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl PipelineError {
    /// Exit code this error should terminate the process with.
    ///
    /// Tool failures propagate the tool's own exit code; everything else
    /// maps to 1.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::ToolFailure { code, .. } if *code > 0 => *code,
            _ => 1,
        }
    }
}

pub type Result<T> = std::result::Result<T, PipelineError>;
