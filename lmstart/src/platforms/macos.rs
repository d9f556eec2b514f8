//! macOS engine driving the accessibility tree through System Events.
//!
//! Every operation is a short AppleScript run with `osascript`, so the
//! process needs the Accessibility permission (System Settings → Privacy &
//! Security → Accessibility) for the terminal or binary running it.

use super::ax_path::{quote, AxPath, SegmentKey};
use super::osascript::{run_osascript, run_system_events};
use super::{poll_lookup, AccessibilityEngine, LOOKUP_INTERVAL};
use crate::element::{ClickResult, UIElement, UIElementImpl};
use crate::{AutomationError, Selector};
use std::time::Duration;
use tracing::{debug, instrument, warn};

pub struct MacOSEngine;

impl MacOSEngine {
    pub fn new() -> Self {
        Self
    }
}

impl Default for MacOSEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl AccessibilityEngine for MacOSEngine {
    #[instrument(skip(self))]
    fn activate_application(&self, app_name: &str) -> Result<(), AutomationError> {
        run_osascript(&format!("tell application {} to activate", quote(app_name)))?;
        debug!("activated {app_name}");
        Ok(())
    }

    #[instrument(level = "debug", skip(self, root))]
    fn find_element(
        &self,
        selector: &Selector,
        root: Option<&UIElement>,
        timeout: Option<Duration>,
    ) -> Result<UIElement, AutomationError> {
        let base = root.map(|r| r.path().clone()).unwrap_or_default();
        let path = base.join(selector)?;
        if path.process_name().is_none() {
            return Err(AutomationError::InvalidSelector(format!(
                "{selector} must start from an application"
            )));
        }
        let reference = path.to_applescript();

        poll_lookup(timeout, LOOKUP_INTERVAL, || {
            let exists = run_system_events(&format!("exists {reference}"))?;
            if exists == "true" {
                Ok(UIElement::new(Box::new(MacOSUIElement { path: path.clone() })))
            } else {
                Err(AutomationError::ElementNotFound(reference.clone()))
            }
        })
    }
}

#[derive(Debug, Clone)]
pub struct MacOSUIElement {
    path: AxPath,
}

impl MacOSUIElement {
    fn reference(&self) -> String {
        self.path.to_applescript()
    }

    fn attribute(&self, attribute: &str) -> Result<Option<String>, AutomationError> {
        let out = run_system_events(&format!("get {attribute} of {}", self.reference()))?;
        Ok(match out.as_str() {
            "" | "missing value" => None,
            _ => Some(out),
        })
    }
}

impl UIElementImpl for MacOSUIElement {
    fn path(&self) -> &AxPath {
        &self.path
    }

    fn role(&self) -> String {
        self.path
            .last()
            .map(|s| s.role.clone())
            .unwrap_or_default()
    }

    fn name(&self) -> Option<String> {
        match self.path.last().map(|s| &s.key) {
            Some(SegmentKey::Name(name)) => Some(name.clone()),
            _ => self.attribute("name").ok().flatten(),
        }
    }

    fn value(&self) -> Result<Option<String>, AutomationError> {
        self.attribute("value")
    }

    fn is_enabled(&self) -> Result<bool, AutomationError> {
        match self.attribute("enabled") {
            Ok(enabled) => Ok(enabled.as_deref() != Some("false")),
            // Windows and some groups have no enabled attribute
            Err(AutomationError::PlatformError(e)) => {
                warn!("could not read enabled state, assuming enabled: {e}");
                Ok(true)
            }
            Err(e) => Err(e),
        }
    }

    fn click(&self) -> Result<ClickResult, AutomationError> {
        let reference = self.reference();
        run_system_events(&format!("click {reference}"))?;
        Ok(ClickResult {
            method: "AXPress".to_string(),
            details: reference,
        })
    }

    fn clone_box(&self) -> Box<dyn UIElementImpl> {
        Box::new(self.clone())
    }
}
