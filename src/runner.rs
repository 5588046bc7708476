use std::ffi::OsString;
use std::path::{Path, PathBuf};

use log::{debug, info};
use tokio::process::Command;

use crate::config::PipelineConfig;
use crate::error::{PipelineError, Result};

/// One external tool run: command line, working directory, and an optional
/// file the combined output is captured to.
#[derive(Debug, Clone)]
pub struct ToolInvocation {
    pub program: String,
    pub args: Vec<String>,
    pub current_dir: Option<PathBuf>,
    pub capture_to: Option<PathBuf>,
}

impl ToolInvocation {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            current_dir: None,
            capture_to: None,
        }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    pub fn current_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.current_dir = Some(dir.into());
        self
    }

    pub fn capture_to(mut self, path: impl Into<PathBuf>) -> Self {
        self.capture_to = Some(path.into());
        self
    }
}

/// Captured result of a finished tool process.
#[derive(Debug)]
pub struct ToolOutput {
    pub code: i32,
    pub stdout: String,
    pub stderr: String,
}

impl ToolOutput {
    pub fn success(&self) -> bool {
        self.code == 0
    }
}

/// Spawns external tools sequentially and captures their output.
///
/// The lookup path is taken from the config's `tool_path` override when set,
/// falling back to the ambient `PATH`. Tests inject a scratch directory of
/// stub executables through the override.
pub struct ToolRunner {
    tool_path: Option<OsString>,
}

impl ToolRunner {
    pub fn new(config: &PipelineConfig) -> Self {
        Self {
            tool_path: config.tool_path.clone(),
        }
    }

    fn lookup_path(&self) -> OsString {
        self.tool_path
            .clone()
            .or_else(|| std::env::var_os("PATH"))
            .unwrap_or_default()
    }

    /// Whether `binary` resolves to an executable on the lookup path.
    pub fn is_available(&self, binary: &str) -> bool {
        std::env::split_paths(&self.lookup_path()).any(|dir| is_executable(&dir.join(binary)))
    }

    /// Run a tool to completion, blocking until it exits.
    ///
    /// Combined stdout/stderr is written to the invocation's capture file
    /// when one is set. The exit code is returned regardless of success;
    /// callers decide whether nonzero is fatal.
    ///
    /// # Errors
    ///
    /// Returns an IO error if the process cannot be spawned (e.g. the
    /// binary is absent) or the capture file cannot be written.
    pub async fn run(&self, invocation: &ToolInvocation) -> Result<ToolOutput> {
        debug!(
            "Running: {} {}",
            invocation.program,
            invocation.args.join(" ")
        );

        let mut command = Command::new(&invocation.program);
        command.args(&invocation.args);
        command.env("PATH", self.lookup_path());
        if let Some(dir) = &invocation.current_dir {
            command.current_dir(dir);
        }

        let output = command.output().await?;
        let stdout = String::from_utf8_lossy(&output.stdout).into_owned();
        let stderr = String::from_utf8_lossy(&output.stderr).into_owned();
        let code = output.status.code().unwrap_or(-1);

        if let Some(path) = &invocation.capture_to {
            let mut contents = stdout.clone();
            contents.push_str(&stderr);
            std::fs::write(path, contents)?;
            info!("{} output captured to {}", invocation.program, path.display());
        }

        Ok(ToolOutput {
            code,
            stdout,
            stderr,
        })
    }

    /// Run a tool and treat any nonzero exit as a hard failure.
    pub async fn run_checked(&self, invocation: &ToolInvocation) -> Result<ToolOutput> {
        let output = self.run(invocation).await?;
        if !output.success() {
            return Err(PipelineError::ToolFailure {
                tool: invocation.program.clone(),
                code: output.code,
            });
        }
        Ok(output)
    }
}

#[cfg(unix)]
fn is_executable(path: &Path) -> bool {
    use std::os::unix::fs::PermissionsExt;

    path.is_file()
        && std::fs::metadata(path)
            .map(|m| m.permissions().mode() & 0o111 != 0)
            .unwrap_or(false)
}

#[cfg(not(unix))]
fn is_executable(path: &Path) -> bool {
    path.is_file()
}
