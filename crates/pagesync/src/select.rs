//! Select list accessor.
//!
//! Options are re-enumerated on every call. Selection happens by clicking an
//! option, which is also how a browser reaches the page's change handlers.

use tracing::info;

use crate::driver::{Driver, DriverError, ElementHandle};
use crate::locator::Locator;
use crate::reporter::{Reporter, TracingReporter};
use crate::result::{SyncError, SyncResult};

static DEFAULT_REPORTER: TracingReporter = TracingReporter;

/// `<select>` element
#[derive(Debug)]
pub struct SelectList<'a, D: Driver + ?Sized, R: Reporter + ?Sized = TracingReporter> {
    locator: Locator,
    driver: &'a D,
    reporter: &'a R,
}

impl<'a, D: Driver + ?Sized> SelectList<'a, D> {
    /// Bind `locator`, reporting through `tracing`.
    ///
    /// # Errors
    ///
    /// [`SyncError::NotASelect`] when the element is not a `select`.
    pub fn new(locator: Locator, driver: &'a D) -> SyncResult<Self> {
        SelectList::with_reporter(locator, driver, &DEFAULT_REPORTER)
    }
}

impl<'a, D: Driver + ?Sized, R: Reporter + ?Sized> SelectList<'a, D, R> {
    /// Bind `locator`, reporting through `reporter`
    pub fn with_reporter(locator: Locator, driver: &'a D, reporter: &'a R) -> SyncResult<Self> {
        let element = locator.resolve(driver)?;
        let tag = driver
            .tag_name(&element)
            .map_err(|e| locator.translate(e))?;
        if !tag.eq_ignore_ascii_case("select") {
            return Err(SyncError::NotASelect { locator, tag });
        }
        Ok(Self {
            locator,
            driver,
            reporter,
        })
    }

    /// Select locator
    pub const fn locator(&self) -> &Locator {
        &self.locator
    }

    fn translate(&self, err: DriverError) -> SyncError {
        self.locator.translate(err)
    }

    /// Option elements, in document order
    pub fn option_elements(&self) -> SyncResult<Vec<ElementHandle>> {
        let select = self.locator.resolve(self.driver)?;
        self.driver
            .find_child_elements(&select, &Locator::tag_name("option"))
            .map_err(|e| self.translate(e))
    }

    fn option_text(&self, option: &ElementHandle) -> SyncResult<String> {
        self.driver
            .text(option)
            .map(|t| t.trim().to_string())
            .map_err(|e| self.translate(e))
    }

    fn is_option_selected(&self, option: &ElementHandle) -> SyncResult<bool> {
        self.driver
            .is_selected(option)
            .map_err(|e| self.translate(e))
    }

    fn click_option(&self, option: &ElementHandle) -> SyncResult<()> {
        self.driver.click(option).map_err(|e| self.translate(e))
    }

    /// Option texts, in document order
    pub fn options(&self) -> SyncResult<Vec<String>> {
        self.option_elements()?
            .iter()
            .map(|option| self.option_text(option))
            .collect()
    }

    /// Option whose text is `text`, plus every option text
    fn find_option(&self, text: &str) -> SyncResult<(Option<ElementHandle>, Vec<String>)> {
        let elements = self.option_elements()?;
        let mut texts = Vec::with_capacity(elements.len());
        let mut found = None;
        for option in elements {
            let option_text = self.option_text(&option)?;
            if found.is_none() && option_text == text {
                found = Some(option);
            }
            texts.push(option_text);
        }
        Ok((found, texts))
    }

    fn not_found(&self, requested: &str, available: Vec<String>) -> SyncError {
        let err = SyncError::OptionNotFound {
            locator: self.locator.clone(),
            requested: requested.to_string(),
            available,
        };
        self.reporter.log_failure(&err.to_string());
        err
    }

    /// Select the option whose text is `text`. An empty `text` is skipped.
    ///
    /// # Errors
    ///
    /// [`SyncError::OptionNotFound`], listing every option, when no option
    /// has that text. The selection is left untouched.
    pub fn select(&self, text: &str) -> SyncResult<()> {
        if text.is_empty() {
            self.reporter.log(&format!(
                "Skipping input to Listbox [ <b>{}</b> ]",
                self.locator
            ));
            return Ok(());
        }
        let (found, texts) = self.find_option(text)?;
        let option = found.ok_or_else(|| self.not_found(text, texts))?;
        self.reporter.log(&format!(
            "Selecting [ <b>{text}</b> ] from Listbox [ <b>{}</b> ]",
            self.locator
        ));
        info!(locator = %self.locator, option = text, "select option");
        if !self.is_option_selected(&option)? {
            self.click_option(&option)?;
        }
        Ok(())
    }

    /// Select the option at `index` (0-based)
    pub fn select_by_index(&self, index: usize) -> SyncResult<()> {
        let mut elements = self.option_elements()?;
        if index >= elements.len() {
            let texts = elements
                .iter()
                .map(|option| self.option_text(option))
                .collect::<SyncResult<Vec<_>>>()?;
            return Err(self.not_found(&format!("index {index}"), texts));
        }
        let option = elements.swap_remove(index);
        info!(locator = %self.locator, index, "select option");
        if !self.is_option_selected(&option)? {
            self.click_option(&option)?;
        }
        Ok(())
    }

    /// Texts of every selected option
    pub fn selected_options(&self) -> SyncResult<Vec<String>> {
        let mut selected = Vec::new();
        for option in self.option_elements()? {
            if self.is_option_selected(&option)? {
                selected.push(self.option_text(&option)?);
            }
        }
        Ok(selected)
    }

    /// Text of the first selected option
    pub fn first_selected_option(&self) -> SyncResult<Option<String>> {
        for option in self.option_elements()? {
            if self.is_option_selected(&option)? {
                return self.option_text(&option).map(Some);
            }
        }
        Ok(None)
    }

    /// Carries a `multiple` attribute other than `false`
    pub fn is_multiple(&self) -> SyncResult<bool> {
        let select = self.locator.resolve(self.driver)?;
        let multiple = self
            .driver
            .attribute(&select, "multiple")
            .map_err(|e| self.translate(e))?;
        Ok(multiple.is_some_and(|m| !m.eq_ignore_ascii_case("false")))
    }

    fn require_multiple(&self) -> SyncResult<()> {
        if self.is_multiple()? {
            Ok(())
        } else {
            Err(SyncError::NotMultiSelect {
                locator: self.locator.clone(),
            })
        }
    }

    /// Clear every selected option of a multi-select
    pub fn deselect_all(&self) -> SyncResult<()> {
        self.require_multiple()?;
        self.reporter.log(&format!(
            "Deselecting all options of Listbox [ <b>{}</b> ]",
            self.locator
        ));
        for option in self.option_elements()? {
            if self.is_option_selected(&option)? {
                self.click_option(&option)?;
            }
        }
        Ok(())
    }

    /// Clear the option whose text is `text` in a multi-select
    pub fn deselect_by_text(&self, text: &str) -> SyncResult<()> {
        self.require_multiple()?;
        let (found, texts) = self.find_option(text)?;
        let option = found.ok_or_else(|| self.not_found(text, texts))?;
        if self.is_option_selected(&option)? {
            self.click_option(&option)?;
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

    fn form() -> MockDriver {
        MockDriver::new(
            MockNode::new("body")
                .child(
                    MockNode::new("select")
                        .id("state")
                        .child(MockNode::option("Alabama"))
                        .child(MockNode::option(" Georgia "))
                        .child(MockNode::option("Texas").selected()),
                )
                .child(
                    MockNode::new("select")
                        .id("toppings")
                        .attr("multiple", "multiple")
                        .child(MockNode::option("Cheese").selected())
                        .child(MockNode::option("Olives"))
                        .child(MockNode::option("Peppers").selected()),
                )
                .child(MockNode::input("text").id("city")),
        )
    }

    mod construction_tests {
        use super::*;

        #[test]
        fn test_rejects_non_select() {
            let driver = form();
            let err = SelectList::new(Locator::id("city"), &driver).unwrap_err();
            assert!(matches!(err, SyncError::NotASelect { ref tag, .. } if tag == "input"));
        }

        #[test]
        fn test_options_in_order() {
            let driver = form();
            let list = SelectList::new(Locator::id("state"), &driver).unwrap();
            assert_eq!(list.options().unwrap(), ["Alabama", "Georgia", "Texas"]);
            assert!(!list.is_multiple().unwrap());
        }
    }

    mod single_select_tests {
        use super::*;

        #[test]
        fn test_select_first_option() {
            let driver = form();
            let list = SelectList::new(Locator::id("state"), &driver).unwrap();
            list.select("Alabama").unwrap();
            assert_eq!(list.selected_options().unwrap(), ["Alabama"]);
            assert_eq!(list.first_selected_option().unwrap().as_deref(), Some("Alabama"));
        }

        #[test]
        fn test_unknown_option_lists_every_option() {
            let driver = form();
            let reporter = MemoryReporter::new();
            let list =
                SelectList::with_reporter(Locator::id("state"), &driver, &reporter).unwrap();
            let err = list.select("Ohio").unwrap_err();
            match &err {
                SyncError::OptionNotFound { requested, available, .. } => {
                    assert_eq!(requested, "Ohio");
                    assert_eq!(available, &["Alabama", "Georgia", "Texas"]);
                }
                other => panic!("unexpected error: {other}"),
            }
            assert_eq!(
                err.to_string(),
                "The value of [ Ohio ] was not found in Listbox [ id = state ]. \
                 Acceptable values are [ Alabama | Georgia | Texas ]"
            );
            assert_eq!(list.selected_options().unwrap(), ["Texas"]);
            assert_eq!(reporter.failures().len(), 1);
        }

        #[test]
        fn test_empty_text_is_skipped() {
            let driver = form();
            let reporter = MemoryReporter::new();
            let list =
                SelectList::with_reporter(Locator::id("state"), &driver, &reporter).unwrap();
            list.select("").unwrap();
            assert!(!driver.was_called("click:"));
            assert!(reporter.contains("Skipping input to Listbox [ id = state ]"));
        }

        #[test]
        fn test_select_by_index() {
            let driver = form();
            let list = SelectList::new(Locator::id("state"), &driver).unwrap();
            list.select_by_index(1).unwrap();
            assert_eq!(list.first_selected_option().unwrap().as_deref(), Some("Georgia"));
            assert!(matches!(
                list.select_by_index(3).unwrap_err(),
                SyncError::OptionNotFound { .. }
            ));
        }

        #[test]
        fn test_deselect_requires_multiple() {
            let driver = form();
            let list = SelectList::new(Locator::id("state"), &driver).unwrap();
            assert!(matches!(
                list.deselect_all().unwrap_err(),
                SyncError::NotMultiSelect { .. }
            ));
            assert!(matches!(
                list.deselect_by_text("Texas").unwrap_err(),
                SyncError::NotMultiSelect { .. }
            ));
        }
    }

    mod multi_select_tests {
        use super::*;

        #[test]
        fn test_select_adds_to_selection() {
            let driver = form();
            let list = SelectList::new(Locator::id("toppings"), &driver).unwrap();
            assert!(list.is_multiple().unwrap());
            list.select("Olives").unwrap();
            list.select("Olives").unwrap();
            assert_eq!(
                list.selected_options().unwrap(),
                ["Cheese", "Olives", "Peppers"]
            );
        }

        #[test]
        fn test_deselect_by_text() {
            let driver = form();
            let list = SelectList::new(Locator::id("toppings"), &driver).unwrap();
            list.deselect_by_text("Cheese").unwrap();
            list.deselect_by_text("Olives").unwrap();
            assert_eq!(list.selected_options().unwrap(), ["Peppers"]);
        }

        #[test]
        fn test_deselect_all() {
            let driver = form();
            let list = SelectList::new(Locator::id("toppings"), &driver).unwrap();
            list.deselect_all().unwrap();
            assert!(list.selected_options().unwrap().is_empty());
            assert_eq!(list.first_selected_option().unwrap(), None);
        }
    }
}
