//! Helpers for the external command-line tools the service drives.

use std::path::Path;

/// Check if a tool is runnable.
///
/// Bare names are looked up in PATH; anything with a directory component
/// must point at an existing file.
pub fn check_binary(command: &Path) -> bool {
    if command.components().count() > 1 {
        command.is_file()
    } else {
        which::which(command).is_ok()
    }
}

/// Human-readable name of a tool command for error messages.
pub fn tool_name(command: &Path) -> String {
    command
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| command.display().to_string())
}

/// Trimmed stderr of a failed tool, or its exit status when stderr is empty.
pub fn failure_message(output: &std::process::Output) -> String {
    let stderr = String::from_utf8_lossy(&output.stderr);
    let stderr = stderr.trim();
    if stderr.is_empty() {
        format!("exited with {}", output.status)
    } else {
        stderr.to_string()
    }
}
