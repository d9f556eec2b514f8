//! Running AppleScript through `osascript` and classifying its failures.

use crate::AutomationError;
use std::process::Command;
use tracing::debug;

#[cfg_attr(not(target_os = "macos"), allow(dead_code))]
pub(crate) fn run_system_events(statement: &str) -> Result<String, AutomationError> {
    run_osascript(&format!(
        "tell application \"System Events\" to {statement}"
    ))
}

#[cfg_attr(not(target_os = "macos"), allow(dead_code))]
pub(crate) fn run_osascript(script: &str) -> Result<String, AutomationError> {
    debug!(script, "osascript");
    let output = Command::new("osascript")
        .arg("-e")
        .arg(script)
        .output()
        .map_err(|e| AutomationError::PlatformError(format!("Failed to run osascript: {e}")))?;

    if output.status.success() {
        Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
    } else {
        let stderr = String::from_utf8_lossy(&output.stderr);
        Err(classify_osascript_error(stderr.trim()))
    }
}

/// Map an `osascript` error message onto the automation error kinds.
pub fn classify_osascript_error(stderr: &str) -> AutomationError {
    let message = stderr.to_string();
    // -25211: assistive access not granted, -1743: Apple Events not authorized
    if ["-25211", "-1743", "assistive access", "not allowed"]
        .iter()
        .any(|code| stderr.contains(code))
    {
        AutomationError::PermissionDenied(message)
    } else if ["-1728", "-1719", "-10814", "-600", "Can’t get", "Can't get"]
        .iter()
        .any(|code| stderr.contains(code))
    {
        AutomationError::ElementNotFound(message)
    } else {
        AutomationError::PlatformError(message)
    }
}
