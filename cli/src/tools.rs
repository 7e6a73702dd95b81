//! Runtime tool path resolution
//!
//! For each tool (e.g., `ssh`), we:
//! 1. Check for an environment variable `{TOOL}_BIN` (e.g., `SSH_BIN`)
//! 2. Fall back to PATH-based invocation if the envvar is not set
//!
//! This lets Nix (or a test harness) pin exact binaries while keeping
//! plain PATH lookup for everyday use.

use std::env;

use crate::error::ExecutionError;

/// Get the path to an external tool
///
/// Checks `{TOOL}_BIN` (uppercase tool name + "_BIN") and falls back to the
/// tool name itself, which relies on PATH.
pub fn get_tool_path(tool: &str) -> String {
    let env_var = format!("{}_BIN", tool.to_uppercase());
    env::var(&env_var).unwrap_or_else(|_| tool.to_string())
}

/// Resolve a tool and make sure it can actually be executed
pub fn require_tool(tool: &str) -> Result<String, ExecutionError> {
    let path = get_tool_path(tool);
    which::which(&path)
        .map(|resolved| resolved.display().to_string())
        .map_err(|e| ExecutionError::Spawn {
            tool: path,
            message: e.to_string(),
        })
}

/// Common tool names
pub mod tools {
    pub const SSH: &str = "ssh";
    pub const SCP: &str = "scp";
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;

    #[test]
    fn test_get_tool_path_from_env() {
        env::set_var("TEST_TOOL_BIN", "/custom/path/to/test-tool");
        assert_eq!(get_tool_path("test-tool"), "/custom/path/to/test-tool");
        env::remove_var("TEST_TOOL_BIN");
    }

    #[test]
    fn test_get_tool_path_fallback() {
        env::remove_var("MISSING_TOOL_BIN");
        assert_eq!(get_tool_path("missing-tool"), "missing-tool");
    }

    #[test]
    fn test_require_missing_tool() {
        env::remove_var("DEFINITELY-NOT-INSTALLED-TOOL_BIN");
        let err = require_tool("definitely-not-installed-tool").unwrap_err();
        assert!(matches!(err, ExecutionError::Spawn { .. }));
    }
}
