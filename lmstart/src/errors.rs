use thiserror::Error;

#[derive(Error, Debug)]
pub enum AutomationError {
    #[error("Element not found: {0}")]
    ElementNotFound(String),

    #[error("Operation timed out: {0}")]
    Timeout(String),

    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    #[error("Platform-specific error: {0}")]
    PlatformError(String),

    #[error("Unsupported platform: {0}")]
    UnsupportedPlatform(String),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Invalid selector: {0}")]
    InvalidSelector(String),

    #[error("Element is not enabled: {0}")]
    ElementNotEnabled(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

impl AutomationError {
    /// Whether a lookup that failed with this error may succeed if repeated.
    pub fn is_retryable(&self) -> bool {
        matches!(self, AutomationError::ElementNotFound(_))
    }
}
