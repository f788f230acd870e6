//! Pagesync: DOM synchronization for browser UI tests
//!
//! Pagesync waits for a remote browser's DOM to reach a state (present,
//! visible, hidden, enabled, disabled, containing text) and builds table,
//! radio group, select list and page-object helpers on top of that wait.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                    PAGESYNC Architecture                         │
//! ├─────────────────────────────────────────────────────────────────┤
//! │   ┌────────────┐    ┌────────────┐    ┌────────────┐            │
//! │   │ Page       │    │ SyncWaiter │    │ Driver     │            │
//! │   │ Object     │───►│ + Probes   │───►│ (trait)    │            │
//! │   │            │    │            │    │            │            │
//! │   └────────────┘    └────────────┘    └────────────┘            │
//! │         │                                   ▲                   │
//! │         ▼                                   │                   │
//! │   ┌────────────────────────────────┐        │                   │
//! │   │ Element / Table / Radio /      │────────┘                   │
//! │   │ Select accessors               │                            │
//! │   └────────────────────────────────┘                            │
//! └─────────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Example
//!
//! ```
//! use pagesync::prelude::*;
//! use std::time::Duration;
//!
//! let driver = MockDriver::new(
//!     MockNode::new("body").child(MockNode::new("div").id("banner").hidden()),
//! );
//! driver.schedule(Duration::from_millis(20), |dom| {
//!     let banner = dom.by_id("banner").unwrap();
//!     dom.set_displayed(banner, true);
//! });
//!
//! let reporter = MemoryReporter::new();
//! let waiter = SyncWaiter::new(&driver, &reporter)
//!     .with_policy(TimeoutPolicy::from_secs(2).with_poll_interval(Duration::from_millis(5)));
//! let outcome = waiter.sync_visible(&Locator::id("banner")).unwrap();
//! assert!(outcome.satisfied);
//! ```

#![warn(missing_docs)]
// Lints are configured in workspace Cargo.toml [workspace.lints.clippy]

#[allow(clippy::missing_errors_doc, clippy::must_use_candidate)]
mod config;
#[allow(clippy::missing_errors_doc, clippy::must_use_candidate)]
mod driver;
#[allow(
    clippy::missing_errors_doc,
    clippy::must_use_candidate,
    clippy::missing_const_for_fn
)]
mod element;
#[allow(clippy::missing_errors_doc, clippy::must_use_candidate)]
mod locator;
#[allow(
    clippy::missing_errors_doc,
    clippy::must_use_candidate,
    clippy::missing_const_for_fn
)]
mod page;
mod probe;
#[allow(
    clippy::missing_errors_doc,
    clippy::must_use_candidate,
    clippy::missing_const_for_fn
)]
mod radio;
mod reporter;
mod result;
#[allow(
    clippy::missing_errors_doc,
    clippy::must_use_candidate,
    clippy::missing_const_for_fn
)]
mod select;
#[allow(
    clippy::missing_errors_doc,
    clippy::must_use_candidate,
    clippy::missing_const_for_fn
)]
mod table;

/// In-memory DOM and driver for tests
///
/// Drive page objects without a browser, including DOM changes that land
/// while a wait is polling.
#[allow(
    clippy::missing_errors_doc,
    clippy::must_use_candidate,
    clippy::missing_const_for_fn,
    clippy::doc_markdown
)]
pub mod mock;

/// Wait Mechanisms
#[allow(
    clippy::missing_errors_doc,
    clippy::must_use_candidate,
    clippy::missing_const_for_fn,
    clippy::doc_markdown
)]
pub mod wait;

pub use config::{
    Properties, SyncConfig, DEFAULT_IMPLICIT_WAIT_SECONDS, DEFAULT_PAGE_TIMEOUT_SECONDS,
    DEFAULT_POLL_INTERVAL_MS, ENV_FAIL_ON_TIMEOUT, ENV_IMPLICIT_WAIT, ENV_POLL_INTERVAL_MS,
};
pub use driver::{BoundingBox, Driver, DriverError, DriverResult, ElementHandle, ScriptArg};
pub use element::{
    Checkable, Clickable, Element, TextSettable, Waitable, HIGHLIGHT_SCRIPT, JS_CLICK_SCRIPT,
    SCROLL_INTO_VIEW_SCRIPT,
};
pub use locator::{Locator, Strategy};
pub use page::{
    wait_for_dom_complete, wait_for_dom_interactive, ElementRegistry, PageObject, TestContext,
    READY_STATE_SCRIPT,
};
pub use probe::{
    contains_text, is_disabled, is_enabled, is_hidden, is_present, is_visible, ProbeOutcome,
    WaitCondition,
};
pub use radio::RadioGroup;
pub use reporter::{
    init_tracing, strip_html, MemoryReporter, ReportEntry, ReportLevel, Reporter,
    TracingReporter,
};
pub use result::{SyncError, SyncResult};
pub use select::SelectList;
pub use table::{TableCoordinate, TableReader};
pub use wait::{CancellationToken, SyncWaiter, TimeoutPolicy, WaitOutcome, WaitState};

/// Prelude for convenient imports
pub mod prelude {
    pub use super::config::*;
    pub use super::driver::*;
    pub use super::element::*;
    pub use super::locator::*;
    pub use super::mock::{MockDom, MockDriver, MockNode, NodeId};
    pub use super::page::*;
    pub use super::probe::{ProbeOutcome, WaitCondition};
    pub use super::radio::*;
    pub use super::reporter::*;
    pub use super::result::*;
    pub use super::select::*;
    pub use super::table::*;
    pub use super::wait::*;
}
