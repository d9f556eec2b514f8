use crate::errors::AutomationError;
use crate::platforms::ax_path::AxPath;
use std::fmt::Debug;
use tracing::{debug, instrument};

/// Information about how a click was carried out
#[derive(Debug, Clone)]
pub struct ClickResult {
    pub method: String,
    pub details: String,
}

/// Interface for platform-specific element implementations
pub trait UIElementImpl: Send + Sync + Debug {
    /// Path of this element from its application's process.
    fn path(&self) -> &AxPath;
    fn role(&self) -> String;
    fn name(&self) -> Option<String>;
    /// Read the element's current value from the live UI.
    fn value(&self) -> Result<Option<String>, AutomationError>;
    fn is_enabled(&self) -> Result<bool, AutomationError>;
    fn click(&self) -> Result<ClickResult, AutomationError>;
    fn clone_box(&self) -> Box<dyn UIElementImpl>;
}

/// Represents a UI element in a desktop application
#[derive(Debug)]
pub struct UIElement {
    inner: Box<dyn UIElementImpl>,
}

impl UIElement {
    pub fn new(inner: Box<dyn UIElementImpl>) -> Self {
        Self { inner }
    }

    pub fn path(&self) -> &AxPath {
        self.inner.path()
    }

    pub fn role(&self) -> String {
        self.inner.role()
    }

    pub fn name(&self) -> Option<String> {
        self.inner.name()
    }

    pub fn value(&self) -> Result<Option<String>, AutomationError> {
        self.inner.value()
    }

    /// Trimmed value of the element; `None` when it has none or it is blank.
    ///
    /// Never falls back to the name: a control found by its name would
    /// otherwise always read as that name.
    pub fn shown_value(&self) -> Result<Option<String>, AutomationError> {
        Ok(self
            .inner
            .value()?
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty()))
    }

    pub fn is_enabled(&self) -> Result<bool, AutomationError> {
        self.inner.is_enabled()
    }

    /// Click the element, refusing when it is disabled.
    #[instrument(level = "debug", skip(self), fields(path = %self.path()))]
    pub fn click(&self) -> Result<ClickResult, AutomationError> {
        if !self.inner.is_enabled()? {
            return Err(AutomationError::ElementNotEnabled(self.path().to_string()));
        }
        let result = self.inner.click()?;
        debug!(method = %result.method, "clicked");
        Ok(result)
    }
}

impl Clone for UIElement {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone_box(),
        }
    }
}

impl PartialEq for UIElement {
    fn eq(&self, other: &Self) -> bool {
        self.path() == other.path()
    }
}
