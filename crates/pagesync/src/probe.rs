//! Element Probes
//!
//! Point-in-time checks of one element's state. A probe never blocks and
//! never returns an error: a driver failure becomes
//! [`ProbeOutcome::Retry`], which the poll loop in
//! [`SyncWaiter`](crate::wait::SyncWaiter) treats as "not yet".

use std::fmt;

use tracing::trace;

use crate::driver::{Driver, DriverError};
use crate::locator::Locator;

// =============================================================================
// WAIT CONDITION
// =============================================================================

/// State an element is expected to reach
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum WaitCondition {
    /// Attached to the DOM
    Present,
    /// Attached and rendered
    Visible,
    /// Absent, or attached but not rendered
    Hidden,
    /// Attached and clickable
    Enabled,
    /// Attached and not clickable
    Disabled,
    /// Rendered text or `value` attribute contains the string
    ContainsText(String),
}

impl WaitCondition {
    /// Build a [`WaitCondition::ContainsText`]
    #[must_use]
    pub fn contains_text(text: impl Into<String>) -> Self {
        Self::ContainsText(text.into())
    }

    /// Phrase used in logs and failure messages
    #[must_use]
    pub fn description(&self) -> String {
        match self {
            Self::Present => "PRESENT".to_string(),
            Self::Visible => "VISIBLE".to_string(),
            Self::Hidden => "HIDDEN".to_string(),
            Self::Enabled => "ENABLED".to_string(),
            Self::Disabled => "DISABLED".to_string(),
            Self::ContainsText(text) => format!("contain the text [{text}]"),
        }
    }
}

impl fmt::Display for WaitCondition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.description())
    }
}

// =============================================================================
// PROBE OUTCOME
// =============================================================================

/// Result of one evaluation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProbeOutcome {
    /// Condition holds
    Met,
    /// Condition was evaluated and does not hold
    NotMet,
    /// Condition could not be evaluated; poll again
    Retry(DriverError),
}

impl ProbeOutcome {
    /// Collapse to a boolean; `Retry` counts as not met
    #[must_use]
    pub const fn is_met(&self) -> bool {
        matches!(self, Self::Met)
    }

    /// Driver error behind a `Retry`
    #[must_use]
    pub const fn retry_error(&self) -> Option<&DriverError> {
        match self {
            Self::Retry(err) => Some(err),
            _ => None,
        }
    }

    /// Logical negation; `Retry` stays `Retry`
    #[must_use]
    pub fn negate(self) -> Self {
        match self {
            Self::Met => Self::NotMet,
            Self::NotMet => Self::Met,
            retry @ Self::Retry(_) => retry,
        }
    }
}

impl From<bool> for ProbeOutcome {
    fn from(met: bool) -> Self {
        if met {
            Self::Met
        } else {
            Self::NotMet
        }
    }
}

// =============================================================================
// PROBES
// =============================================================================

/// The locator resolves to an element
pub fn is_present<D: Driver + ?Sized>(driver: &D, locator: &Locator) -> ProbeOutcome {
    match driver.find_element(locator) {
        Ok(_) => ProbeOutcome::Met,
        Err(err) if err.is_absence() => ProbeOutcome::NotMet,
        Err(err) => ProbeOutcome::Retry(err),
    }
}

/// Non-empty area, or any positive offset.
///
/// A missing element is `Retry`, not `NotMet`: visibility is undefined
/// until the element exists.
pub fn is_visible<D: Driver + ?Sized>(driver: &D, locator: &Locator) -> ProbeOutcome {
    let outcome = driver
        .find_element(locator)
        .and_then(|el| driver.bounding_box(&el))
        .map(|bbox| bbox.looks_visible());
    settle(outcome)
}

/// The driver reports the element clickable
pub fn is_enabled<D: Driver + ?Sized>(driver: &D, locator: &Locator) -> ProbeOutcome {
    let outcome = driver
        .find_element(locator)
        .and_then(|el| driver.is_clickable(&el));
    settle(outcome)
}

/// Rendered text contains `text`, else the `value` attribute does
pub fn contains_text<D: Driver + ?Sized>(
    driver: &D,
    locator: &Locator,
    text: &str,
) -> ProbeOutcome {
    let element = match driver.find_element(locator) {
        Ok(el) => el,
        Err(err) => return ProbeOutcome::Retry(err),
    };
    let rendered = driver.text(&element);
    if let Ok(rendered) = &rendered {
        if rendered.contains(text) {
            return ProbeOutcome::Met;
        }
    }
    match driver.attribute(&element, "value") {
        Ok(value) => value.is_some_and(|v| v.contains(text)).into(),
        // Value unreadable: only the rendered text decides
        Err(err) => match rendered {
            Ok(_) => ProbeOutcome::NotMet,
            Err(_) => ProbeOutcome::Retry(err),
        },
    }
}

/// Absent, or present and not visible
pub fn is_hidden<D: Driver + ?Sized>(driver: &D, locator: &Locator) -> ProbeOutcome {
    match driver.find_element(locator) {
        Err(err) if err.is_absence() => ProbeOutcome::Met,
        Err(err) => ProbeOutcome::Retry(err),
        Ok(el) => match driver.bounding_box(&el) {
            Ok(bbox) => (!bbox.looks_visible()).into(),
            // Detached between lookup and measure
            Err(err) if err.is_absence() => ProbeOutcome::Met,
            Err(err) => ProbeOutcome::Retry(err),
        },
    }
}

/// Present and not clickable
pub fn is_disabled<D: Driver + ?Sized>(driver: &D, locator: &Locator) -> ProbeOutcome {
    is_enabled(driver, locator).negate()
}

/// Evaluate `condition` once
pub fn check<D: Driver + ?Sized>(
    driver: &D,
    locator: &Locator,
    condition: &WaitCondition,
) -> ProbeOutcome {
    let outcome = match condition {
        WaitCondition::Present => is_present(driver, locator),
        WaitCondition::Visible => is_visible(driver, locator),
        WaitCondition::Hidden => is_hidden(driver, locator),
        WaitCondition::Enabled => is_enabled(driver, locator),
        WaitCondition::Disabled => is_disabled(driver, locator),
        WaitCondition::ContainsText(text) => contains_text(driver, locator, text),
    };
    trace!(%locator, %condition, ?outcome, "probe");
    outcome
}

fn settle(outcome: Result<bool, DriverError>) -> ProbeOutcome {
    match outcome {
        Ok(met) => met.into(),
        Err(err) => ProbeOutcome::Retry(err),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::driver::BoundingBox;
    use crate::mock::{MockDriver, MockNode};
    use proptest::prelude::*;

    fn page() -> MockDriver {
        MockDriver::new(
            MockNode::new("body")
                .child(MockNode::new("h1").id("title").text("Welcome, Company Admin"))
                .child(MockNode::input("text").id("search").attr("value", "Ada Lovelace"))
                .child(MockNode::new("button").id("save").disabled())
                .child(MockNode::new("div").id("spinner").hidden()),
        )
    }

    mod condition_tests {
        use super::*;

        #[test]
        fn test_descriptions() {
            assert_eq!(WaitCondition::Present.description(), "PRESENT");
            assert_eq!(WaitCondition::Visible.to_string(), "VISIBLE");
            assert_eq!(WaitCondition::Hidden.description(), "HIDDEN");
            assert_eq!(WaitCondition::Enabled.description(), "ENABLED");
            assert_eq!(WaitCondition::Disabled.description(), "DISABLED");
            assert_eq!(
                WaitCondition::contains_text("Hi").description(),
                "contain the text [Hi]"
            );
        }

        #[test]
        fn test_outcome_helpers() {
            assert!(ProbeOutcome::Met.is_met());
            assert!(!ProbeOutcome::NotMet.is_met());
            let retry = ProbeOutcome::Retry(DriverError::stale("x"));
            assert!(!retry.is_met());
            assert!(retry.retry_error().is_some());
            assert_eq!(retry.clone().negate(), retry);
            assert_eq!(ProbeOutcome::Met.negate(), ProbeOutcome::NotMet);
        }
    }

    mod presence_tests {
        use super::*;

        #[test]
        fn test_present_and_absent() {
            let driver = page();
            assert_eq!(is_present(&driver, &Locator::id("title")), ProbeOutcome::Met);
            assert_eq!(is_present(&driver, &Locator::id("nope")), ProbeOutcome::NotMet);
        }

        #[test]
        fn test_hidden_element_is_still_present() {
            let driver = page();
            assert!(is_present(&driver, &Locator::id("spinner")).is_met());
        }
    }

    mod visibility_tests {
        use super::*;

        #[test]
        fn test_visible_and_hidden() {
            let driver = page();
            assert!(is_visible(&driver, &Locator::id("title")).is_met());
            assert_eq!(is_visible(&driver, &Locator::id("spinner")), ProbeOutcome::NotMet);
        }

        #[test]
        fn test_missing_element_is_retry() {
            let driver = page();
            let outcome = is_visible(&driver, &Locator::id("nope"));
            assert!(matches!(outcome, ProbeOutcome::Retry(DriverError::NoSuchElement { .. })));
        }

        #[test]
        fn test_zero_area_with_offset_is_visible() {
            let driver = MockDriver::new(
                MockNode::new("body").child(
                    MockNode::new("span")
                        .id("dot")
                        .bounds(BoundingBox::new(5.0, 5.0, 0.0, 0.0)),
                ),
            );
            assert!(is_visible(&driver, &Locator::id("dot")).is_met());
        }

        #[test]
        fn test_hidden_counts_absence() {
            let driver = page();
            assert!(is_hidden(&driver, &Locator::id("nope")).is_met());
            assert!(is_hidden(&driver, &Locator::id("spinner")).is_met());
            assert!(!is_hidden(&driver, &Locator::id("title")).is_met());
        }
    }

    mod enabled_tests {
        use super::*;

        #[test]
        fn test_enabled_and_disabled() {
            let driver = page();
            assert!(is_enabled(&driver, &Locator::id("search")).is_met());
            assert!(!is_enabled(&driver, &Locator::id("save")).is_met());
            assert!(is_disabled(&driver, &Locator::id("save")).is_met());
        }

        #[test]
        fn test_disabled_requires_presence() {
            let driver = page();
            let outcome = is_disabled(&driver, &Locator::id("nope"));
            assert!(matches!(outcome, ProbeOutcome::Retry(_)));
        }

        #[test]
        fn test_driver_failure_is_retry() {
            let driver = page();
            driver.fail_next("is_clickable", DriverError::other("session lost"));
            let outcome = is_enabled(&driver, &Locator::id("search"));
            assert_eq!(outcome, ProbeOutcome::Retry(DriverError::other("session lost")));
        }
    }

    mod text_tests {
        use super::*;

        #[test]
        fn test_rendered_text() {
            let driver = page();
            assert!(contains_text(&driver, &Locator::id("title"), "Company Admin").is_met());
            assert!(!contains_text(&driver, &Locator::id("title"), "Guest").is_met());
        }

        #[test]
        fn test_value_attribute_fallback() {
            let driver = page();
            assert!(contains_text(&driver, &Locator::id("search"), "Lovelace").is_met());
        }

        #[test]
        fn test_text_failure_falls_back_to_value() {
            let driver = page();
            driver.fail_next("text", DriverError::stale("re-rendered"));
            assert!(contains_text(&driver, &Locator::id("search"), "Ada").is_met());
        }

        #[test]
        fn test_both_reads_failing_is_retry() {
            let driver = page();
            driver.fail_next("text", DriverError::stale("re-rendered"));
            driver.fail_next("attribute", DriverError::stale("re-rendered"));
            let outcome = contains_text(&driver, &Locator::id("search"), "Ada");
            assert!(matches!(outcome, ProbeOutcome::Retry(_)));
        }

        #[test]
        fn test_check_dispatches() {
            let driver = page();
            let loc = Locator::id("title");
            assert!(check(&driver, &loc, &WaitCondition::Visible).is_met());
            assert!(check(&driver, &loc, &WaitCondition::contains_text("Welcome")).is_met());
            assert!(!check(&driver, &loc, &WaitCondition::Hidden).is_met());
        }
    }

    mod property_tests {
        use super::*;

        fn condition() -> impl Strategy<Value = WaitCondition> {
            prop_oneof![
                Just(WaitCondition::Present),
                Just(WaitCondition::Visible),
                Just(WaitCondition::Hidden),
                Just(WaitCondition::Enabled),
                Just(WaitCondition::Disabled),
                "[a-zA-Z ]{0,8}".prop_map(WaitCondition::ContainsText),
            ]
        }

        proptest! {
            #[test]
            fn prop_probe_is_idempotent_without_mutation(
                cond in condition(),
                id in prop::sample::select(vec!["title", "search", "save", "spinner", "nope"]),
            ) {
                let driver = page();
                let loc = Locator::id(id);
                let first = check(&driver, &loc, &cond);
                let second = check(&driver, &loc, &cond);
                prop_assert_eq!(first, second);
            }

            #[test]
            fn prop_visibility_heuristic(
                x in -50.0_f64..50.0,
                y in -50.0_f64..50.0,
                w in 0.0_f64..50.0,
                h in 0.0_f64..50.0,
            ) {
                let driver = MockDriver::new(
                    MockNode::new("body")
                        .child(MockNode::new("div").id("box").bounds(BoundingBox::new(x, y, w, h))),
                );
                let expected = (w > 0.0 && h > 0.0) || (x > 0.0 && y > 0.0);
                prop_assert_eq!(is_visible(&driver, &Locator::id("box")).is_met(), expected);
            }

            #[test]
            fn prop_hidden_is_not_visible_when_present(
                w in 0.0_f64..5.0,
                h in 0.0_f64..5.0,
            ) {
                let driver = MockDriver::new(
                    MockNode::new("body")
                        .child(MockNode::new("div").id("box").bounds(BoundingBox::new(0.0, 0.0, w, h))),
                );
                let loc = Locator::id("box");
                prop_assert_ne!(is_visible(&driver, &loc).is_met(), is_hidden(&driver, &loc).is_met());
            }
        }
    }
}
