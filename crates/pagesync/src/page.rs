//! Page objects.
//!
//! A [`TestContext`] owns everything one test needs (driver, reporter,
//! configuration, run id) and hands out waiters, elements and accessors that
//! borrow from it. Page objects hold named locators in an
//! [`ElementRegistry`] and implement [`PageObject`].

use std::collections::BTreeMap;
use std::time::Duration;

use tracing::{info, info_span, Span};
use uuid::Uuid;

use crate::config::SyncConfig;
use crate::driver::Driver;
use crate::element::Element;
use crate::locator::Locator;
use crate::probe::ProbeOutcome;
use crate::radio::RadioGroup;
use crate::reporter::{MemoryReporter, Reporter};
use crate::result::{SyncError, SyncResult};
use crate::select::SelectList;
use crate::table::TableReader;
use crate::wait::{SyncWaiter, TimeoutPolicy, WaitOutcome};

/// Script returning `document.readyState`
pub const READY_STATE_SCRIPT: &str = "return document.readyState;";

// =============================================================================
// PAGE OBJECT
// =============================================================================

/// A screen of the application under test
pub trait PageObject {
    /// Name used in reports
    fn name(&self) -> &str;

    /// Navigate to, or wait for, the page
    fn launch(&mut self) -> SyncResult<()>;
}

// =============================================================================
// ELEMENT REGISTRY
// =============================================================================

/// Named locators of one page
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ElementRegistry {
    page: String,
    elements: BTreeMap<String, Locator>,
}

impl ElementRegistry {
    /// Empty registry for `page`
    #[must_use]
    pub fn new(page: impl Into<String>) -> Self {
        Self {
            page: page.into(),
            elements: BTreeMap::new(),
        }
    }

    /// Parse `name -> "strategy=value"` entries.
    ///
    /// # Errors
    ///
    /// [`SyncError::Config`] naming the first entry that does not parse.
    pub fn from_map<I, K, V>(page: impl Into<String>, entries: I) -> SyncResult<Self>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: AsRef<str>,
    {
        let mut registry = Self::new(page);
        for (name, raw) in entries {
            let name = name.into();
            let locator = raw.as_ref().parse::<Locator>().map_err(|e| {
                SyncError::config(format!("element [{name}] on page [{}]: {e}", registry.page))
            })?;
            registry.elements.insert(name, locator);
        }
        Ok(registry)
    }

    /// Register `locator` under `name`, replacing any previous entry
    pub fn add(&mut self, name: impl Into<String>, locator: Locator) -> &mut Self {
        self.elements.insert(name.into(), locator);
        self
    }

    /// Builder form of [`Self::add`]
    #[must_use]
    pub fn with(mut self, name: impl Into<String>, locator: Locator) -> Self {
        self.add(name, locator);
        self
    }

    /// Locator registered as `name`
    pub fn get(&self, name: &str) -> SyncResult<&Locator> {
        self.elements
            .get(name)
            .ok_or_else(|| SyncError::UnknownElement {
                page: self.page.clone(),
                name: name.to_string(),
            })
    }

    /// Page name
    #[must_use]
    pub fn page(&self) -> &str {
        &self.page
    }

    /// Registered names, sorted
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.elements.keys().map(String::as_str)
    }

    /// Number of entries
    #[must_use]
    pub fn len(&self) -> usize {
        self.elements.len()
    }

    /// No entries
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }
}

// =============================================================================
// TEST CONTEXT
// =============================================================================

/// Per-test state: driver, reporter, configuration and run id
#[derive(Debug)]
pub struct TestContext<D: Driver, R: Reporter> {
    driver: D,
    reporter: R,
    config: SyncConfig,
    run_id: Uuid,
    span: Span,
}

impl<D: Driver> TestContext<D, MemoryReporter> {
    /// Context recording every report in memory, echoed to `tracing` when
    /// `console_output` is set
    pub fn recording(driver: D, config: SyncConfig) -> SyncResult<Self> {
        let reporter = MemoryReporter::new().with_echo(config.console_output);
        Self::new(driver, reporter, config)
    }
}

impl<D: Driver, R: Reporter> TestContext<D, R> {
    /// Take ownership of a session.
    ///
    /// The driver's implicit wait is turned off: every wait in this crate is
    /// an explicit poll.
    pub fn new(driver: D, reporter: R, config: SyncConfig) -> SyncResult<Self> {
        driver
            .set_implicit_wait(Duration::ZERO)
            .map_err(|e| SyncError::config(format!("unable to disable implicit wait: {e}")))?;
        let run_id = Uuid::new_v4();
        let span = info_span!("test_run", %run_id);
        span.in_scope(|| {
            info!(
                implicit_wait = config.implicit_wait_seconds,
                poll_ms = config.poll_interval_ms,
                "test context ready"
            );
        });
        Ok(Self {
            driver,
            reporter,
            config,
            run_id,
            span,
        })
    }

    /// Driver
    pub const fn driver(&self) -> &D {
        &self.driver
    }

    /// Reporter
    pub const fn reporter(&self) -> &R {
        &self.reporter
    }

    /// Configuration
    pub const fn config(&self) -> &SyncConfig {
        &self.config
    }

    /// Unique id of this run
    pub const fn run_id(&self) -> Uuid {
        self.run_id
    }

    /// Span carrying the run id
    pub const fn span(&self) -> &Span {
        &self.span
    }

    /// Element wait policy from the configuration
    #[must_use]
    pub fn policy(&self) -> TimeoutPolicy {
        TimeoutPolicy::from_config(&self.config)
    }

    /// Ready-state wait policy from the configuration
    #[must_use]
    pub fn page_policy(&self) -> TimeoutPolicy {
        TimeoutPolicy::page_load(&self.config)
    }

    /// Waiter using the configured element policy
    pub fn waiter(&self) -> SyncWaiter<'_, D, R> {
        SyncWaiter::new(&self.driver, &self.reporter).with_policy(self.policy())
    }

    /// Element bound to this context
    pub fn element(&self, locator: Locator) -> Element<'_, D, R> {
        Element::new(locator, &self.driver, &self.reporter)
    }

    /// Table accessor
    pub fn table(&self, locator: Locator) -> TableReader<'_, D> {
        TableReader::new(locator, &self.driver)
    }

    /// Radio group accessor
    pub fn radio(&self, locator: Locator) -> SyncResult<RadioGroup<'_, D, R>> {
        RadioGroup::with_reporter(locator, &self.driver, &self.reporter)
    }

    /// Select list accessor
    pub fn select(&self, locator: Locator) -> SyncResult<SelectList<'_, D, R>> {
        SelectList::with_reporter(locator, &self.driver, &self.reporter)
    }

    /// Release the driver and the reporter
    pub fn into_parts(self) -> (D, R) {
        (self.driver, self.reporter)
    }
}

// =============================================================================
// READY STATE
// =============================================================================

fn wait_for_ready_state<D: Driver, R: Reporter>(
    ctx: &TestContext<D, R>,
    policy: &TimeoutPolicy,
    accepted: &[&str],
    description: &str,
) -> SyncResult<WaitOutcome> {
    let _entered = ctx.span().enter();
    ctx.reporter().log(&format!(
        "Syncing to DOM to be {description} within [ {} ] seconds",
        policy.timeout.as_secs()
    ));
    ctx.waiter()
        .wait_until(&format!("DOM to be {description}"), policy, || {
            match ctx.driver().execute_script(READY_STATE_SCRIPT, &[]) {
                Ok(state) => state
                    .as_str()
                    .is_some_and(|s| accepted.contains(&s))
                    .into(),
                Err(err) => ProbeOutcome::Retry(err),
            }
        })
}

/// Wait until `document.readyState` is `interactive` or `complete`
pub fn wait_for_dom_interactive<D: Driver, R: Reporter>(
    ctx: &TestContext<D, R>,
    policy: &TimeoutPolicy,
) -> SyncResult<WaitOutcome> {
    wait_for_ready_state(ctx, policy, &["interactive", "complete"], "INTERACTIVE")
}

/// Wait until `document.readyState` is `complete`
pub fn wait_for_dom_complete<D: Driver, R: Reporter>(
    ctx: &TestContext<D, R>,
    policy: &TimeoutPolicy,
) -> SyncResult<WaitOutcome> {
    wait_for_ready_state(ctx, policy, &["complete"], "COMPLETE")
}
