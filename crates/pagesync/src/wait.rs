//! Sync Waiter
//!
//! Polls an [`ElementProbe`](crate::probe) until the condition holds or a
//! wall-clock deadline passes.
//!
//! ## Loop
//!
//! ```text
//!   ┌──────────┐  cancelled   ┌───────────┐
//!   │ Polling  │─────────────►│ Cancelled │
//!   │          │  met         ┌───────────┐
//!   │  probe   │─────────────►│ Satisfied │
//!   │  sleep   │  deadline    ┌───────────┐
//!   │          │─────────────►│ TimedOut  │
//!   └──────────┘              └───────────┘
//! ```
//!
//! The probe runs at least once, even with a zero timeout. Sleeps are
//! `min(poll_interval, remaining)`, so a wait never overshoots its deadline
//! by more than one probe.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use tracing::{debug, warn};

use crate::config::{SyncConfig, DEFAULT_IMPLICIT_WAIT_SECONDS, DEFAULT_POLL_INTERVAL_MS};
use crate::driver::{Driver, DriverError};
use crate::locator::Locator;
use crate::probe::{self, ProbeOutcome, WaitCondition};
use crate::reporter::Reporter;
use crate::result::{SyncError, SyncResult};

// =============================================================================
// TIMEOUT POLICY
// =============================================================================

/// How long to wait and what to do when time runs out
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeoutPolicy {
    /// Deadline, measured from the first probe
    pub timeout: Duration,
    /// Delay between probes
    pub poll_interval: Duration,
    /// Expired wait becomes an error instead of an unsatisfied outcome
    pub fail_on_timeout: bool,
}

impl Default for TimeoutPolicy {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(DEFAULT_IMPLICIT_WAIT_SECONDS),
            poll_interval: Duration::from_millis(DEFAULT_POLL_INTERVAL_MS),
            fail_on_timeout: true,
        }
    }
}

impl TimeoutPolicy {
    /// Policy with the given timeout and default polling
    #[must_use]
    pub fn new(timeout: Duration) -> Self {
        Self {
            timeout,
            ..Self::default()
        }
    }

    /// Policy with a whole-second timeout
    #[must_use]
    pub fn from_secs(seconds: u64) -> Self {
        Self::new(Duration::from_secs(seconds))
    }

    /// Element waits as configured
    #[must_use]
    pub fn from_config(config: &SyncConfig) -> Self {
        Self {
            timeout: config.implicit_wait(),
            poll_interval: config.poll_interval(),
            fail_on_timeout: config.fail_on_timeout,
        }
    }

    /// Page ready-state waits as configured
    #[must_use]
    pub fn page_load(config: &SyncConfig) -> Self {
        Self {
            timeout: config.page_timeout(),
            ..Self::from_config(config)
        }
    }

    /// Set the timeout
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set the poll interval (at least 1ms)
    #[must_use]
    pub fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval.max(Duration::from_millis(1));
        self
    }

    /// Set whether an expired wait is an error
    #[must_use]
    pub const fn with_fail_on_timeout(mut self, fail: bool) -> Self {
        self.fail_on_timeout = fail;
        self
    }

    /// Same policy, expired waits reported as unsatisfied outcomes
    #[must_use]
    pub const fn lenient(self) -> Self {
        self.with_fail_on_timeout(false)
    }
}

// =============================================================================
// CANCELLATION
// =============================================================================

/// Shared flag checked between polls
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    flag: Arc<AtomicBool>,
}

impl CancellationToken {
    /// Fresh, uncancelled token
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation; every clone observes it
    pub fn cancel(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    /// Cancellation was requested
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }
}

// =============================================================================
// WAIT OUTCOME
// =============================================================================

/// Wait lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WaitState {
    /// Probing
    Polling,
    /// Condition held
    Satisfied,
    /// Deadline passed
    TimedOut,
    /// Token cancelled
    Cancelled,
}

impl WaitState {
    /// No further probes will run
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        !matches!(self, Self::Polling)
    }
}

/// Result of a finished wait
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WaitOutcome {
    /// Condition held before the deadline
    pub satisfied: bool,
    /// Time from the first probe to the end of the wait
    pub elapsed: Duration,
}

impl WaitOutcome {
    /// Elapsed time in milliseconds
    #[must_use]
    pub fn elapsed_millis(&self) -> u128 {
        self.elapsed.as_millis()
    }

    /// Terminal state this outcome represents
    #[must_use]
    pub const fn state(&self) -> WaitState {
        if self.satisfied {
            WaitState::Satisfied
        } else {
            WaitState::TimedOut
        }
    }
}

/// Internal loop result
struct PollReport {
    state: WaitState,
    elapsed: Duration,
    polls: u32,
    last_error: Option<DriverError>,
}

// =============================================================================
// SYNC WAITER
// =============================================================================

/// Blocks until an element reaches a state.
///
/// Borrows the driver and the reporter; the default policy applies to
/// [`SyncWaiter::wait`] and the `sync_*` helpers.
#[derive(Debug)]
pub struct SyncWaiter<'a, D: Driver + ?Sized, R: Reporter + ?Sized> {
    driver: &'a D,
    reporter: &'a R,
    policy: TimeoutPolicy,
    cancel: Option<CancellationToken>,
}

impl<'a, D: Driver + ?Sized, R: Reporter + ?Sized> SyncWaiter<'a, D, R> {
    /// Waiter with the default policy
    pub fn new(driver: &'a D, reporter: &'a R) -> Self {
        Self {
            driver,
            reporter,
            policy: TimeoutPolicy::default(),
            cancel: None,
        }
    }

    /// Replace the default policy
    #[must_use]
    pub fn with_policy(mut self, policy: TimeoutPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Observe `token` between polls
    #[must_use]
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = Some(token);
        self
    }

    /// Default policy
    pub const fn policy(&self) -> &TimeoutPolicy {
        &self.policy
    }

    /// Evaluate `condition` once, without waiting
    pub fn probe(&self, locator: &Locator, condition: &WaitCondition) -> bool {
        probe::check(self.driver, locator, condition).is_met()
    }

    /// Wait for `condition` under the default policy
    pub fn wait(&self, locator: &Locator, condition: &WaitCondition) -> SyncResult<WaitOutcome> {
        self.wait_for(locator, condition, &self.policy)
    }

    /// Wait for `condition` under `policy`.
    ///
    /// # Errors
    ///
    /// [`SyncError::ElementWaitTimeout`] when the deadline passes and the
    /// policy fails on timeout, [`SyncError::Cancelled`] when the token fires.
    pub fn wait_for(
        &self,
        locator: &Locator,
        condition: &WaitCondition,
        policy: &TimeoutPolicy,
    ) -> SyncResult<WaitOutcome> {
        let phrase = condition.description();
        self.reporter.log(&format!(
            "Syncing to element [ {locator} ] to be {phrase} within [ {} ] seconds",
            format_secs(policy.timeout)
        ));

        let report = self.poll(policy, || probe::check(self.driver, locator, condition));
        match report.state {
            WaitState::Satisfied => Ok(WaitOutcome {
                satisfied: true,
                elapsed: report.elapsed,
            }),
            WaitState::Cancelled => Err(SyncError::Cancelled {
                description: format!("[ {locator} ] to be {phrase}"),
                elapsed: report.elapsed,
            }),
            _ if policy.fail_on_timeout => {
                let err = SyncError::ElementWaitTimeout {
                    locator: locator.clone(),
                    condition: phrase,
                    elapsed: report.elapsed,
                    last_error: report.last_error.map(|e| e.to_string()),
                };
                self.reporter.log_failure(&err.to_string());
                Err(err)
            }
            _ => {
                warn!(%locator, condition = %phrase, polls = report.polls, "wait expired");
                Ok(WaitOutcome {
                    satisfied: false,
                    elapsed: report.elapsed,
                })
            }
        }
    }

    /// Wait for a condition that is not tied to one element
    pub fn wait_until(
        &self,
        description: &str,
        policy: &TimeoutPolicy,
        mut check: impl FnMut() -> ProbeOutcome,
    ) -> SyncResult<WaitOutcome> {
        let report = self.poll(policy, &mut check);
        match report.state {
            WaitState::Satisfied => Ok(WaitOutcome {
                satisfied: true,
                elapsed: report.elapsed,
            }),
            WaitState::Cancelled => Err(SyncError::Cancelled {
                description: description.to_string(),
                elapsed: report.elapsed,
            }),
            _ if policy.fail_on_timeout => {
                let err = SyncError::Timeout {
                    description: description.to_string(),
                    elapsed: report.elapsed,
                };
                self.reporter.log_failure(&err.to_string());
                Err(err)
            }
            _ => Ok(WaitOutcome {
                satisfied: false,
                elapsed: report.elapsed,
            }),
        }
    }

    /// Wait until attached
    pub fn sync_present(&self, locator: &Locator) -> SyncResult<WaitOutcome> {
        self.wait(locator, &WaitCondition::Present)
    }

    /// Wait until rendered
    pub fn sync_visible(&self, locator: &Locator) -> SyncResult<WaitOutcome> {
        self.wait(locator, &WaitCondition::Visible)
    }

    /// Wait until gone or not rendered
    pub fn sync_hidden(&self, locator: &Locator) -> SyncResult<WaitOutcome> {
        self.wait(locator, &WaitCondition::Hidden)
    }

    /// Wait until clickable
    pub fn sync_enabled(&self, locator: &Locator) -> SyncResult<WaitOutcome> {
        self.wait(locator, &WaitCondition::Enabled)
    }

    /// Wait until present and not clickable
    pub fn sync_disabled(&self, locator: &Locator) -> SyncResult<WaitOutcome> {
        self.wait(locator, &WaitCondition::Disabled)
    }

    /// Wait until the text or value contains `text`
    pub fn sync_text(&self, locator: &Locator, text: &str) -> SyncResult<WaitOutcome> {
        self.wait(locator, &WaitCondition::contains_text(text))
    }

    fn is_cancelled(&self) -> bool {
        self.cancel
            .as_ref()
            .is_some_and(CancellationToken::is_cancelled)
    }

    fn poll(&self, policy: &TimeoutPolicy, mut check: impl FnMut() -> ProbeOutcome) -> PollReport {
        let start = Instant::now();
        // `None` when the timeout runs past what `Instant` can represent
        let deadline = start.checked_add(policy.timeout);
        let mut state = WaitState::Polling;
        let mut polls = 0_u32;
        let mut last_error = None;

        while !state.is_terminal() {
            if self.is_cancelled() {
                state = WaitState::Cancelled;
                continue;
            }
            polls += 1;
            match check() {
                ProbeOutcome::Met => {
                    state = WaitState::Satisfied;
                    continue;
                }
                ProbeOutcome::NotMet => {}
                ProbeOutcome::Retry(err) => {
                    debug!(poll = polls, error = %err, "probe could not be evaluated");
                    last_error = Some(err);
                }
            }
            match deadline {
                Some(deadline) => {
                    let now = Instant::now();
                    if now >= deadline {
                        state = WaitState::TimedOut;
                    } else {
                        thread::sleep(policy.poll_interval.min(deadline - now));
                    }
                }
                None => thread::sleep(policy.poll_interval),
            }
        }

        let elapsed = start.elapsed();
        debug!(?state, polls, elapsed_ms = elapsed.as_millis() as u64, "wait finished");
        PollReport {
            state,
            elapsed,
            polls,
            last_error,
        }
    }
}

fn format_secs(duration: Duration) -> String {
    if duration.subsec_nanos() == 0 {
        duration.as_secs().to_string()
    } else {
        format!("{:.1}", duration.as_secs_f64())
    }
}
