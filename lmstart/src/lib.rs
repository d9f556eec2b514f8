//! Start the LM Studio local API server by driving its GUI
//!
//! The app is activated, its "Local Server" tab opened and "Start Server"
//! clicked through the accessibility tree, then the server is confirmed up
//! through its status field or its HTTP API. Every wait is bounded.

use std::sync::Arc;
use tracing::instrument;

pub mod element;
pub mod errors;
pub mod health;
pub mod locator;
pub mod platforms;
pub mod report;
pub mod selector;
pub mod sequence;

pub use element::{ClickResult, UIElement, UIElementImpl};
pub use errors::AutomationError;
pub use health::{ApiProbe, HealthCheckResult, HealthStatus, ServerHealthCheck};
pub use locator::Locator;
pub use report::Reporter;
pub use selector::Selector;
pub use sequence::{ServerStarter, StartOutcome, Step, StepFailure, Timings, Verification};

/// The main entry point for UI automation
#[derive(Clone)]
pub struct Desktop {
    engine: Arc<dyn platforms::AccessibilityEngine>,
}

impl Desktop {
    /// Desktop backed by the engine for the current platform.
    pub fn new() -> Result<Self, AutomationError> {
        let engine = platforms::create_engine()?;
        Ok(Self { engine })
    }

    /// Desktop backed by a given engine.
    pub fn with_engine(engine: Arc<dyn platforms::AccessibilityEngine>) -> Self {
        Self { engine }
    }

    #[instrument(skip(self, selector))]
    pub fn locator(&self, selector: impl Into<Selector>) -> Locator {
        let selector = selector.into();
        Locator::new(self.engine.clone(), selector)
    }

    #[instrument(skip(self))]
    pub fn activate_application(&self, app_name: &str) -> Result<(), AutomationError> {
        self.engine.activate_application(app_name)
    }
}
