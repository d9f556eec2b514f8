use crate::element::UIElement;
use crate::errors::AutomationError;
use crate::platforms::AccessibilityEngine;
use crate::selector::Selector;
use std::sync::Arc;
use std::time::Duration;
use tokio::task;
use tracing::{debug, instrument};

/// Used by `wait(None)` unless `set_default_timeout` says otherwise.
const DEFAULT_LOCATOR_TIMEOUT: Duration = Duration::from_secs(30);

/// Lazily resolved handle to a control.
///
/// Nothing is looked up until `wait` or `exists` is called, so a locator can
/// be built before its control is on screen. Name the control
/// (`"button|Start Server"`) rather than giving a bare role.
#[derive(Clone)]
pub struct Locator {
    engine: Arc<dyn AccessibilityEngine>,
    selector: Selector,
    timeout: Duration,
    root: Option<UIElement>,
}

impl Locator {
    pub(crate) fn new(engine: Arc<dyn AccessibilityEngine>, selector: Selector) -> Self {
        Self {
            engine,
            selector,
            timeout: DEFAULT_LOCATOR_TIMEOUT,
            root: None,
        }
    }

    pub fn set_default_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Resolve the selector relative to `element` instead of from an application.
    pub fn within(mut self, element: UIElement) -> Self {
        self.root = Some(element);
        self
    }

    /// Poll until the control shows up or `timeout` elapses.
    ///
    /// Running out of time yields `Timeout`, carrying the last lookup error.
    #[instrument(level = "debug", skip(self, timeout), fields(selector = %self.selector))]
    pub async fn wait(&self, timeout: Option<Duration>) -> Result<UIElement, AutomationError> {
        let limit = timeout.unwrap_or(self.timeout);
        debug!("waiting up to {limit:?}");

        match self.lookup(Some(limit)).await {
            Err(AutomationError::ElementNotFound(last)) => Err(AutomationError::Timeout(format!(
                "no {} after {limit:?} (last lookup: {last})",
                self.selector
            ))),
            other => other,
        }
    }

    /// One lookup, no polling. A missing control is `Ok(None)`.
    pub async fn exists(&self) -> Result<Option<UIElement>, AutomationError> {
        match self.lookup(None).await {
            Ok(element) => Ok(Some(element)),
            Err(AutomationError::ElementNotFound(_)) => Ok(None),
            Err(e) => Err(e),
        }
    }

    // Engines block while polling.
    async fn lookup(&self, timeout: Option<Duration>) -> Result<UIElement, AutomationError> {
        let Locator {
            engine,
            selector,
            root,
            ..
        } = self.clone();

        task::spawn_blocking(move || engine.find_element(&selector, root.as_ref(), timeout))
            .await
            .map_err(|e| AutomationError::PlatformError(format!("lookup task failed: {e}")))?
    }

    /// Narrow this locator with another step; chains are flattened.
    pub fn locator(&self, selector: impl Into<Selector>) -> Locator {
        let next = selector.into();
        let steps = self
            .selector
            .steps()
            .into_iter()
            .chain(next.steps())
            .cloned()
            .collect();

        Locator {
            selector: Selector::Chain(steps),
            ..self.clone()
        }
    }
}
