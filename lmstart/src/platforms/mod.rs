use crate::{AutomationError, Selector, UIElement};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::trace;

pub mod ax_path;
#[cfg(target_os = "macos")]
pub mod macos;
pub mod osascript;
#[cfg(test)]
pub(crate) mod scripted;

/// Pause between lookups while an engine waits for an element to appear.
pub const LOOKUP_INTERVAL: Duration = Duration::from_millis(200);

/// The common trait that all platform-specific engines must implement
pub trait AccessibilityEngine: Send + Sync {
    /// Bring an application to the foreground, launching it if needed
    fn activate_application(&self, app_name: &str) -> Result<(), AutomationError>;

    /// Find an element using a selector.
    ///
    /// With a timeout the lookup is repeated until it succeeds or the time is
    /// up; without one a single lookup is made. Selectors without a root must
    /// start with an application.
    fn find_element(
        &self,
        selector: &Selector,
        root: Option<&UIElement>,
        timeout: Option<Duration>,
    ) -> Result<UIElement, AutomationError>;
}

/// Repeat `lookup` until it succeeds, fails for good, or `timeout` elapses.
///
/// Only retryable errors (element not found) are retried; the last of them
/// is returned once the deadline passes.
pub fn poll_lookup<T>(
    timeout: Option<Duration>,
    interval: Duration,
    mut lookup: impl FnMut() -> Result<T, AutomationError>,
) -> Result<T, AutomationError> {
    let Some(timeout) = timeout else {
        return lookup();
    };
    let deadline = Instant::now() + timeout;
    let mut attempts = 0u32;
    loop {
        attempts += 1;
        match lookup() {
            Ok(found) => return Ok(found),
            Err(e) if e.is_retryable() && Instant::now() < deadline => {
                trace!(attempts, "lookup failed, retrying: {e}");
                let remaining = deadline.saturating_duration_since(Instant::now());
                std::thread::sleep(interval.min(remaining));
            }
            Err(e) => return Err(e),
        }
    }
}

/// Create the appropriate engine for the current platform
pub fn create_engine() -> Result<Arc<dyn AccessibilityEngine>, AutomationError> {
    #[cfg(target_os = "macos")]
    {
        Ok(Arc::new(macos::MacOSEngine::new()))
    }
    #[cfg(not(target_os = "macos"))]
    {
        Err(AutomationError::UnsupportedPlatform(format!(
            "GUI automation needs the macOS accessibility API, current platform is {}",
            std::env::consts::OS
        )))
    }
}
