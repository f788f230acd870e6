//! Test step reporting.
//!
//! Page objects report through the [`Reporter`] capability rather than a
//! global logger, so a test can capture what was reported
//! ([`MemoryReporter`]) or forward it to `tracing` ([`TracingReporter`]).

use std::borrow::Cow;
use std::cell::RefCell;
use std::sync::OnceLock;

use chrono::{DateTime, Utc};
use regex::Regex;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use crate::result::{SyncError, SyncResult};

/// Remove HTML markup from a message
#[must_use]
pub fn strip_html(message: &str) -> Cow<'_, str> {
    static TAG: OnceLock<Option<Regex>> = OnceLock::new();
    match TAG.get_or_init(|| Regex::new("<[^>]*>").ok()) {
        Some(tag) => tag.replace_all(message, ""),
        None => Cow::Borrowed(message),
    }
}

/// Install a `tracing` fmt subscriber.
///
/// `filter` falls back to `RUST_LOG`, then to `info`. Fails if a global
/// subscriber is already set.
pub fn init_tracing(filter: Option<&str>) -> SyncResult<()> {
    let filter = match filter {
        Some(directives) => EnvFilter::try_new(directives)
            .map_err(|e| SyncError::config(format!("invalid log filter [{directives}]: {e}")))?,
        None => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init()
        .map_err(|e| SyncError::config(format!("tracing subscriber already installed: {e}")))
}

/// Sink for test steps and failures
pub trait Reporter {
    /// Record a step
    fn log(&self, message: &str);

    /// Record a failure
    fn log_failure(&self, message: &str);

    /// Record the start of a scenario
    fn log_scenario(&self, scenario: &str) {
        self.log(&format!("Scenario: {scenario}"));
    }

    /// Fail with [`SyncError::AssertionFailed`] unless `condition` holds
    fn assert_true(&self, condition: bool, description: &str) -> SyncResult<()> {
        if condition {
            self.log(&format!("Assert True Passed - {description}"));
            Ok(())
        } else {
            self.log_failure(&format!("Assert True Failed - {description}"));
            Err(SyncError::assertion(strip_html(description)))
        }
    }

    /// Fail with [`SyncError::AssertionFailed`] if `condition` holds
    fn assert_false(&self, condition: bool, description: &str) -> SyncResult<()> {
        if condition {
            self.log_failure(&format!("Assert False Failed - {description}"));
            Err(SyncError::assertion(strip_html(description)))
        } else {
            self.log(&format!("Assert False Passed - {description}"));
            Ok(())
        }
    }
}

impl<T: Reporter + ?Sized> Reporter for &T {
    fn log(&self, message: &str) {
        (**self).log(message);
    }

    fn log_failure(&self, message: &str) {
        (**self).log_failure(message);
    }
}

// =============================================================================
// TRACING
// =============================================================================

/// Forwards reports to `tracing`, markup stripped
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingReporter;

impl TracingReporter {
    /// Create a new reporter
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl Reporter for TracingReporter {
    fn log(&self, message: &str) {
        info!("{}", strip_html(message.trim()));
    }

    fn log_failure(&self, message: &str) {
        error!("{}", strip_html(message.trim()));
    }
}

// =============================================================================
// MEMORY
// =============================================================================

/// Severity of a recorded entry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportLevel {
    /// Ordinary step
    Step,
    /// Failure
    Failure,
}

/// One recorded report
#[derive(Debug, Clone)]
pub struct ReportEntry {
    /// When it was reported
    pub timestamp: DateTime<Utc>,
    /// Severity
    pub level: ReportLevel,
    /// Message, markup stripped
    pub message: String,
}

/// Records every report for later assertions
#[derive(Debug, Default)]
pub struct MemoryReporter {
    entries: RefCell<Vec<ReportEntry>>,
    echo: bool,
}

impl MemoryReporter {
    /// Create an empty reporter
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Also forward every entry to [`TracingReporter`]
    #[must_use]
    pub const fn with_echo(mut self, echo: bool) -> Self {
        self.echo = echo;
        self
    }

    fn record(&self, level: ReportLevel, message: &str) {
        self.entries.borrow_mut().push(ReportEntry {
            timestamp: Utc::now(),
            level,
            message: strip_html(message.trim()).into_owned(),
        });
    }

    /// Snapshot of every entry
    #[must_use]
    pub fn entries(&self) -> Vec<ReportEntry> {
        self.entries.borrow().clone()
    }

    /// Messages, in order
    #[must_use]
    pub fn messages(&self) -> Vec<String> {
        self.entries
            .borrow()
            .iter()
            .map(|e| e.message.clone())
            .collect()
    }

    /// Failure messages, in order
    #[must_use]
    pub fn failures(&self) -> Vec<String> {
        self.entries
            .borrow()
            .iter()
            .filter(|e| e.level == ReportLevel::Failure)
            .map(|e| e.message.clone())
            .collect()
    }

    /// Any message contains `fragment`
    #[must_use]
    pub fn contains(&self, fragment: &str) -> bool {
        self.entries
            .borrow()
            .iter()
            .any(|e| e.message.contains(fragment))
    }

    /// Drop every entry
    pub fn clear(&self) {
        self.entries.borrow_mut().clear();
    }
}

impl Reporter for MemoryReporter {
    fn log(&self, message: &str) {
        if self.echo {
            TracingReporter.log(message);
        }
        self.record(ReportLevel::Step, message);
    }

    fn log_failure(&self, message: &str) {
        if self.echo {
            TracingReporter.log_failure(message);
        }
        self.record(ReportLevel::Failure, message);
    }
}
