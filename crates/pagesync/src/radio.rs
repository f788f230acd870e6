//! Radio group accessor.
//!
//! The group's buttons (descendant `input` elements of type `radio`) and
//! label texts (descendant `label` elements) are enumerated once, when the
//! group is built. The checked state is always read live.

use std::thread;
use std::time::Duration;

use tracing::{debug, info};

use crate::driver::{Driver, DriverError, ElementHandle};
use crate::locator::Locator;
use crate::reporter::{Reporter, TracingReporter};
use crate::result::{SyncError, SyncResult};

static DEFAULT_REPORTER: TracingReporter = TracingReporter;

/// Group of radio buttons under one container element
#[derive(Debug)]
pub struct RadioGroup<'a, D: Driver + ?Sized, R: Reporter + ?Sized = TracingReporter> {
    locator: Locator,
    driver: &'a D,
    reporter: &'a R,
    buttons: Vec<ElementHandle>,
    labels: Vec<String>,
}

impl<'a, D: Driver + ?Sized> RadioGroup<'a, D> {
    /// Enumerate the group found by `locator`, reporting through `tracing`
    pub fn new(locator: Locator, driver: &'a D) -> SyncResult<Self> {
        RadioGroup::with_reporter(locator, driver, &DEFAULT_REPORTER)
    }
}

impl<'a, D: Driver + ?Sized, R: Reporter + ?Sized> RadioGroup<'a, D, R> {
    /// Enumerate the group found by `locator`, reporting through `reporter`
    pub fn with_reporter(locator: Locator, driver: &'a D, reporter: &'a R) -> SyncResult<Self> {
        let group = locator.resolve(driver)?;
        let translate = |e: DriverError| locator.translate(e);

        let mut buttons = Vec::new();
        for input in driver
            .find_child_elements(&group, &Locator::tag_name("input"))
            .map_err(translate)?
        {
            let kind = driver.attribute(&input, "type").map_err(translate)?;
            if kind.is_some_and(|k| k.eq_ignore_ascii_case("radio")) {
                buttons.push(input);
            }
        }

        let labels = driver
            .find_child_elements(&group, &Locator::tag_name("label"))
            .map_err(translate)?
            .iter()
            .map(|label| driver.text(label).map(|t| t.trim().to_string()))
            .collect::<Result<Vec<_>, _>>()
            .map_err(translate)?;

        debug!(%locator, buttons = buttons.len(), labels = labels.len(), "radio group");
        Ok(Self {
            locator,
            driver,
            reporter,
            buttons,
            labels,
        })
    }

    /// Group locator
    pub const fn locator(&self) -> &Locator {
        &self.locator
    }

    /// Button handles, in document order
    pub fn buttons(&self) -> &[ElementHandle] {
        &self.buttons
    }

    /// Number of buttons
    pub fn len(&self) -> usize {
        self.buttons.len()
    }

    /// No buttons at all
    pub fn is_empty(&self) -> bool {
        self.buttons.is_empty()
    }

    /// Label texts, in document order
    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    /// Index of the first button whose `checked` attribute is `true`
    pub fn current_index(&self) -> SyncResult<Option<usize>> {
        for (i, button) in self.buttons.iter().enumerate() {
            let checked = self
                .driver
                .attribute(button, "checked")
                .map_err(|e| self.locator.translate(e))?;
            if checked.is_some_and(|c| c.eq_ignore_ascii_case("true")) {
                return Ok(Some(i));
            }
        }
        Ok(None)
    }

    /// Label of the checked button, if it has one
    pub fn selected_label(&self) -> SyncResult<Option<&str>> {
        Ok(self
            .current_index()?
            .and_then(|i| self.labels.get(i))
            .map(String::as_str))
    }

    /// Click the button at `index` (0-based)
    pub fn select_by_index(&self, index: usize) -> SyncResult<()> {
        let button = self
            .buttons
            .get(index)
            .ok_or(SyncError::RadioIndexOutOfRange {
                locator: self.locator.clone(),
                index,
                count: self.buttons.len(),
            })?;
        info!(locator = %self.locator, index, "select radio");
        match self.driver.click(button) {
            Ok(()) => Ok(()),
            Err(err) if err.is_swallowable() => {
                self.reporter.log_failure(&format!(
                    "Select Label [ <b>{index}</b> ] from the radio group [ <b>{}</b> ]: {err}",
                    self.locator
                ));
                Ok(())
            }
            Err(err) => Err(self.locator.translate(err)),
        }
    }

    /// Click the button whose label text is `label`
    pub fn select_by_label(&self, label: &str) -> SyncResult<()> {
        let index = self
            .labels
            .iter()
            .position(|l| l == label.trim())
            .ok_or_else(|| SyncError::RadioLabelNotFound {
                locator: self.locator.clone(),
                label: label.to_string(),
                available: self.labels.clone(),
            })?;
        self.select_by_index(index)
    }

    /// Click every button in order, pausing `pause` after each
    pub fn cycle_all(&self, pause: Duration) -> SyncResult<()> {
        for index in 0..self.buttons.len() {
            self.select_by_index(index)?;
            thread::sleep(pause);
        }
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::mock::{MockDriver, MockNode};
    use crate::reporter::MemoryReporter;

    fn shipping() -> MockDriver {
        MockDriver::new(
            MockNode::new("body").child(
                MockNode::new("fieldset")
                    .id("shipping")
                    .child(MockNode::radio("ship", "ground").id("ground"))
                    .child(MockNode::new("label").attr("for", "ground").text("Ground"))
                    .child(MockNode::radio("ship", "air").id("air"))
                    .child(MockNode::new("label").attr("for", "air").text(" Air "))
                    .child(MockNode::input("RADIO").attr("name", "ship").id("sea"))
                    .child(MockNode::new("label").attr("for", "sea").text("Sea"))
                    .child(MockNode::input("checkbox").id("gift")),
            ),
        )
    }

    mod enumeration_tests {
        use super::*;

        #[test]
        fn test_buttons_and_labels() {
            let driver = shipping();
            let group = RadioGroup::new(Locator::id("shipping"), &driver).unwrap();
            assert_eq!(group.len(), 3);
            assert!(!group.is_empty());
            assert_eq!(group.labels(), ["Ground", "Air", "Sea"]);
        }

        #[test]
        fn test_nothing_checked() {
            let driver = shipping();
            let group = RadioGroup::new(Locator::id("shipping"), &driver).unwrap();
            assert_eq!(group.current_index().unwrap(), None);
            assert_eq!(group.selected_label().unwrap(), None);
        }

        #[test]
        fn test_initially_checked() {
            let driver = shipping();
            driver.mutate(|dom| {
                let air = dom.by_id("air").unwrap();
                dom.set_attr(air, "checked", "TRUE");
            });
            let group = RadioGroup::new(Locator::id("shipping"), &driver).unwrap();
            assert_eq!(group.current_index().unwrap(), Some(1));
        }

        #[test]
        fn test_missing_group() {
            let driver = shipping();
            let err = RadioGroup::new(Locator::id("billing"), &driver).unwrap_err();
            assert!(matches!(err, SyncError::ElementNotFound { .. }));
        }
    }

    mod selection_tests {
        use super::*;

        #[test]
        fn test_select_by_index() {
            let driver = shipping();
            let group = RadioGroup::new(Locator::id("shipping"), &driver).unwrap();
            group.select_by_index(2).unwrap();
            assert_eq!(group.current_index().unwrap(), Some(2));
            group.select_by_index(0).unwrap();
            assert_eq!(group.current_index().unwrap(), Some(0));
            assert_eq!(group.selected_label().unwrap(), Some("Ground"));
        }

        #[test]
        fn test_index_out_of_range() {
            let driver = shipping();
            let group = RadioGroup::new(Locator::id("shipping"), &driver).unwrap();
            let err = group.select_by_index(3).unwrap_err();
            assert!(matches!(
                err,
                SyncError::RadioIndexOutOfRange { index: 3, count: 3, .. }
            ));
        }

        #[test]
        fn test_select_by_label() {
            let driver = shipping();
            let group = RadioGroup::new(Locator::id("shipping"), &driver).unwrap();
            group.select_by_label("Air").unwrap();
            assert_eq!(group.current_index().unwrap(), Some(1));
        }

        #[test]
        fn test_unknown_label_fails_loudly() {
            let driver = shipping();
            let group = RadioGroup::new(Locator::id("shipping"), &driver).unwrap();
            let err = group.select_by_label("Rail").unwrap_err();
            match err {
                SyncError::RadioLabelNotFound { label, available, .. } => {
                    assert_eq!(label, "Rail");
                    assert_eq!(available, ["Ground", "Air", "Sea"]);
                }
                other => panic!("unexpected error: {other}"),
            }
            assert_eq!(group.current_index().unwrap(), None);
        }

        #[test]
        fn test_stale_click_is_reported_and_swallowed() {
            let driver = shipping();
            let reporter = MemoryReporter::new();
            let group =
                RadioGroup::with_reporter(Locator::id("shipping"), &driver, &reporter).unwrap();
            driver.fail_next("click", DriverError::stale("re-rendered"));
            group.select_by_index(1).unwrap();
            assert_eq!(reporter.failures().len(), 1);
            assert!(reporter.failures()[0].contains("Select Label [ 1 ]"));
        }

        #[test]
        fn test_other_click_errors_propagate() {
            let driver = shipping();
            let group = RadioGroup::new(Locator::id("shipping"), &driver).unwrap();
            driver.fail_next("click", DriverError::other("session closed"));
            assert!(matches!(
                group.select_by_index(0).unwrap_err(),
                SyncError::Driver { .. }
            ));
        }

        #[test]
        fn test_cycle_all_ends_on_last() {
            let driver = shipping();
            let group = RadioGroup::new(Locator::id("shipping"), &driver).unwrap();
            group.cycle_all(Duration::ZERO).unwrap();
            assert_eq!(driver.call_count("click:"), 3);
            assert_eq!(group.current_index().unwrap(), Some(2));
        }
    }
}
