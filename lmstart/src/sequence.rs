//! The start sequence: activate the app, open the "Local Server" tab, click
//! "Start Server" and confirm the server is up.
//!
//! Every wait is a bounded poll on something observable, and every step
//! fails on its own with the error that stopped it.

use crate::health::ServerHealthCheck;
use crate::report::Reporter;
use crate::{AutomationError, Desktop, Selector, UIElement};
use std::fmt;
use std::io::Write;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info, instrument, warn};

/// Application driven when none is given
pub const DEFAULT_APP_NAME: &str = "LM Studio";

/// What the status field shows once the server is up
pub const RUNNING_STATUS: &str = "Running";

const MAIN_WINDOW: &str = "window >> nth:0";
const SERVER_TAB: &str = "role:tab group >> nth:0 >> button|Local Server";
const START_BUTTON: &str = "button|Start Server";
const STATUS_FIELD: &str = "role:text field|Running";

/// Bounds for the waits of one run
#[derive(Debug, Clone, Copy)]
pub struct Timings {
    /// How long the main window may take to appear after activation
    pub window_timeout: Duration,
    /// How long a tab or button may take to appear
    pub control_timeout: Duration,
    /// How long the server may take to report it is running
    pub ready_timeout: Duration,
    /// Pause between readiness checks
    pub poll_interval: Duration,
}

impl Default for Timings {
    fn default() -> Self {
        Self {
            window_timeout: Duration::from_secs(30),
            control_timeout: Duration::from_secs(5),
            ready_timeout: Duration::from_secs(30),
            poll_interval: Duration::from_secs(1),
        }
    }
}

/// The steps of the sequence that can fail
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    Activate,
    WaitForWindow,
    OpenServerTab,
    ClickStartServer,
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Step::Activate => "activating the application",
            Step::WaitForWindow => "waiting for the main window",
            Step::OpenServerTab => "opening the \"Local Server\" tab",
            Step::ClickStartServer => "clicking \"Start Server\"",
        })
    }
}

#[derive(Debug)]
pub struct StepFailure {
    pub step: Step,
    pub error: AutomationError,
}

impl StepFailure {
    fn new(step: Step, error: AutomationError) -> Self {
        Self { step, error }
    }
}

impl fmt::Display for StepFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} failed: {}", self.step, self.error)
    }
}

/// What showed that the server is running
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusSource {
    StatusField,
    ApiProbe,
}

impl fmt::Display for StatusSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            StatusSource::StatusField => "status field",
            StatusSource::ApiProbe => "API probe",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verification {
    Running {
        source: StatusSource,
        /// Models listed by the API, when it answered
        models: Option<Vec<String>>,
    },
    Unconfirmed {
        /// Last text the status field showed, if it was found at all
        last_status: Option<String>,
    },
}

#[derive(Debug)]
pub enum StartOutcome {
    /// The server was up before anything was clicked
    AlreadyRunning {
        source: StatusSource,
        models: Option<Vec<String>>,
    },
    /// "Start Server" was clicked
    Started(Verification),
    Failed(StepFailure),
}

impl StartOutcome {
    /// Whether the server is known to be running at the end of the run.
    pub fn is_running(&self) -> bool {
        matches!(
            self,
            StartOutcome::AlreadyRunning { .. }
                | StartOutcome::Started(Verification::Running { .. })
        )
    }
}

fn shows_running(text: &str) -> bool {
    text.trim().eq_ignore_ascii_case(RUNNING_STATUS)
}

/// Drives the target application through the start sequence
pub struct ServerStarter {
    desktop: Desktop,
    health: Arc<dyn ServerHealthCheck>,
    app_name: String,
    timings: Timings,
}

impl ServerStarter {
    pub fn new(
        desktop: Desktop,
        health: Arc<dyn ServerHealthCheck>,
        app_name: impl Into<String>,
    ) -> Self {
        Self {
            desktop,
            health,
            app_name: app_name.into(),
            timings: Timings::default(),
        }
    }

    pub fn with_timings(mut self, timings: Timings) -> Self {
        self.timings = timings;
        self
    }

    pub fn app_name(&self) -> &str {
        &self.app_name
    }

    /// Run the sequence once, reporting to `reporter` as it goes.
    #[instrument(skip_all, fields(app = %self.app_name))]
    pub async fn run<W: Write + Send>(&self, reporter: &mut Reporter<W>) -> StartOutcome {
        let outcome = match self.execute(reporter).await {
            Ok(outcome) => outcome,
            Err(failure) => StartOutcome::Failed(failure),
        };

        match &outcome {
            StartOutcome::AlreadyRunning { source, models } => {
                reporter.already_running(*source, models.as_deref())
            }
            StartOutcome::Started(verification) => reporter.verification(verification),
            StartOutcome::Failed(failure) => {
                warn!(step = ?failure.step, "start sequence failed: {}", failure.error);
                reporter.failure(failure)
            }
        }
        outcome
    }

    async fn execute<W: Write + Send>(
        &self,
        reporter: &mut Reporter<W>,
    ) -> Result<StartOutcome, StepFailure> {
        let before = self.health.check_health().await;
        if before.is_healthy() {
            info!("API server already answers at {}", before.endpoint);
            return Ok(StartOutcome::AlreadyRunning {
                source: StatusSource::ApiProbe,
                models: Some(before.models),
            });
        }
        debug!(status = ?before.status, "API server not answering yet");

        let window = self.open_main_window().await?;

        self.click(&window, SERVER_TAB, Step::OpenServerTab).await?;

        if let Some(status) = self.read_status(&window).await {
            if shows_running(&status) {
                info!("status field already shows {status:?}, not clicking \"Start Server\"");
                return Ok(StartOutcome::AlreadyRunning {
                    source: StatusSource::StatusField,
                    models: None,
                });
            }
        }

        self.click(&window, START_BUTTON, Step::ClickStartServer).await?;
        reporter.start_clicked();

        Ok(StartOutcome::Started(self.wait_until_running(&window).await))
    }

    async fn open_main_window(&self) -> Result<UIElement, StepFailure> {
        info!("🚀 Activating {}", self.app_name);
        self.desktop
            .activate_application(&self.app_name)
            .map_err(|e| StepFailure::new(Step::Activate, e))?;

        info!("⏳ Waiting for the main window");
        self.desktop
            .locator(Selector::application(&self.app_name))
            .locator(MAIN_WINDOW)
            .wait(Some(self.timings.window_timeout))
            .await
            .map_err(|e| StepFailure::new(Step::WaitForWindow, e))
    }

    async fn click(
        &self,
        window: &UIElement,
        selector: &str,
        step: Step,
    ) -> Result<(), StepFailure> {
        let element = self
            .desktop
            .locator(selector)
            .within(window.clone())
            .wait(Some(self.timings.control_timeout))
            .await
            .map_err(|e| StepFailure::new(step, e))?;
        element.click().map_err(|e| StepFailure::new(step, e))?;
        info!("🖱️ Clicked {selector}");
        Ok(())
    }

    /// Value of the status field, if it exists and shows one right now.
    async fn read_status(&self, window: &UIElement) -> Option<String> {
        let field = match self
            .desktop
            .locator(STATUS_FIELD)
            .within(window.clone())
            .exists()
            .await
        {
            Ok(Some(field)) => field,
            Ok(None) => return None,
            Err(e) => {
                debug!("status field lookup failed: {e}");
                return None;
            }
        };
        match field.shown_value() {
            Ok(text) => text,
            Err(e) => {
                debug!("status field unreadable: {e}");
                None
            }
        }
    }

    async fn wait_until_running(&self, window: &UIElement) -> Verification {
        info!("⏳ Waiting for the server to come up");
        let deadline = Instant::now() + self.timings.ready_timeout;
        let mut last_status = None;

        loop {
            if let Some(status) = self.read_status(window).await {
                if shows_running(&status) {
                    let health = self.health.check_health().await;
                    return Verification::Running {
                        source: StatusSource::StatusField,
                        models: health.is_healthy().then_some(health.models),
                    };
                }
                last_status = Some(status);
            }

            let health = self.health.check_health().await;
            if health.is_healthy() {
                return Verification::Running {
                    source: StatusSource::ApiProbe,
                    models: Some(health.models),
                };
            }

            if Instant::now() >= deadline {
                warn!(
                    ?last_status,
                    "server not confirmed within {:?}", self.timings.ready_timeout
                );
                return Verification::Unconfirmed { last_status };
            }
            tokio::time::sleep(self.timings.poll_interval).await;
        }
    }
}
