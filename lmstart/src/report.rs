//! Human-readable status lines for the user.
//!
//! Diagnostics go through `tracing`; these lines are the tool's output.

use crate::health::{HealthCheckResult, HealthStatus};
use crate::sequence::{StatusSource, StepFailure, Verification};
use colored::Colorize;
use std::io::Write;
use tracing::warn;

/// Writes status lines to an output stream
pub struct Reporter<W: Write> {
    out: W,
    color: bool,
    app_name: String,
}

impl<W: Write> Reporter<W> {
    pub fn new(out: W, app_name: impl Into<String>) -> Self {
        Self {
            out,
            color: false,
            app_name: app_name.into(),
        }
    }

    pub fn with_color(mut self, color: bool) -> Self {
        self.color = color;
        self
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    pub fn start_clicked(&mut self) {
        let head = self.paint("✅ Clicked \"Start Server\"", Tone::Good);
        self.line(&format!("{head} in {}", self.app_name));
    }

    pub fn verification(&mut self, verification: &Verification) {
        match verification {
            Verification::Running { source, models } => {
                let head = self.paint("✅ Server status: Running", Tone::Good);
                self.line(&format!("{head} (confirmed by {source})"));
                if let Some(models) = models {
                    self.models(models);
                }
            }
            Verification::Unconfirmed { last_status } => {
                let head = self.paint(
                    "⚠️ Could not confirm that the server is running",
                    Tone::Warn,
                );
                match last_status {
                    Some(status) => self.line(&format!("{head} (status shows {status:?})")),
                    None => self.line(&head),
                }
            }
        }
    }

    pub fn already_running(&mut self, source: StatusSource, models: Option<&[String]>) {
        let head = self.paint("✅ Server is already running", Tone::Good);
        self.line(&format!("{head} (confirmed by {source})"));
        if let Some(models) = models {
            self.models(models);
        }
    }

    /// The error, then what to do by hand.
    pub fn failure(&mut self, failure: &StepFailure) {
        let head = self.paint("❌ Error:", Tone::Bad);
        self.line(&format!("{head} {failure}"));
        self.line(&format!(
            "📋 1. Open {} and select the \"Local Server\" tab",
            self.app_name
        ));
        self.line("📋 2. Click \"Start Server\"");
    }

    /// Result of a standalone status check.
    pub fn health(&mut self, result: &HealthCheckResult) {
        match result.status {
            HealthStatus::Healthy => {
                let head = self.paint("✅ API server is running", Tone::Good);
                self.line(&format!("{head} at {}", result.endpoint));
                self.models(&result.models);
            }
            HealthStatus::Degraded | HealthStatus::Unhealthy => {
                let head = self.paint("❌ API server is not running", Tone::Bad);
                let reason = result.error_message.as_deref().unwrap_or("no answer");
                self.line(&format!("{head} at {} ({reason})", result.endpoint));
            }
        }
    }

    fn models(&mut self, models: &[String]) {
        if models.is_empty() {
            let line = self.paint("⚠️ No models are loaded", Tone::Warn);
            self.line(&line);
            return;
        }
        self.line("📋 Available models:");
        for model in models {
            self.line(&format!("  - {model}"));
        }
    }

    fn paint(&self, text: &str, tone: Tone) -> String {
        if !self.color {
            return text.to_string();
        }
        match tone {
            Tone::Good => text.green().bold().to_string(),
            Tone::Warn => text.yellow().bold().to_string(),
            Tone::Bad => text.red().bold().to_string(),
        }
    }

    fn line(&mut self, line: &str) {
        if let Err(e) = writeln!(self.out, "{line}").and_then(|_| self.out.flush()) {
            warn!("could not write report line: {e}");
        }
    }
}

#[derive(Clone, Copy)]
enum Tone {
    Good,
    Warn,
    Bad,
}
