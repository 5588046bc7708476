//! Test helpers: stub external tools as shell scripts on an injected
//! lookup path.
//!
//! The runner spawns tools with PATH set to the override alone, so stub
//! bodies must stick to shell builtins (`echo`, `printf`, `:`, `exit`,
//! redirections).

use std::path::Path;

use crate::config::PipelineConfig;

/// Write an executable `#!/bin/sh` stub named `name` into `dir`.
pub fn stub_tool(dir: &Path, name: &str, body: &str) {
    let path = dir.join(name);
    std::fs::write(&path, format!("#!/bin/sh\n{body}\n")).unwrap();

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
    }
}

/// A default config whose tool lookup path is `tools` alone.
pub fn tool_config(tools: &Path) -> PipelineConfig {
    PipelineConfig {
        tool_path: Some(tools.as_os_str().to_os_string()),
        ..PipelineConfig::default()
    }
}
