//! Mock Browser Module for Synchronization Testing
//!
//! An in-memory DOM behind the [`Driver`](crate::driver::Driver) trait, so
//! waits, accessors and page objects can be tested without a browser.
//!
//! ## Timing
//!
//! DOM mutations can be scheduled relative to "now". They are applied lazily
//! at the start of every driver call, which is exactly how a poll loop
//! observes a real page changing underneath it.
//!
//! ## Example
//!
//! ```rust
//! use pagesync::mock::{MockDriver, MockNode};
//! use std::time::Duration;
//!
//! let driver = MockDriver::new(
//!     MockNode::new("body").child(MockNode::new("div").id("spinner")),
//! );
//! driver.schedule(Duration::from_millis(50), |dom| {
//!     if let Some(node) = dom.by_id("spinner") {
//!         dom.set_displayed(node, false);
//!     }
//! });
//! ```

mod dom;
mod driver;
mod selector;

pub use dom::{MockDom, MockNode, NodeId};
pub use driver::MockDriver;
