//! Element actions.
//!
//! An [`Element`] pairs a [`Locator`] with the driver and reporter of the
//! current test. Actions are grouped into capability traits so page objects
//! can accept "anything clickable" or "anything checkable" without caring
//! how the element was built.
//!
//! Every action re-resolves the locator; no handle outlives a call.

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use tracing::{info, warn};

use crate::driver::{Driver, DriverError, ElementHandle, ScriptArg};
use crate::locator::Locator;
use crate::probe::WaitCondition;
use crate::reporter::Reporter;
use crate::result::{SyncError, SyncResult};
use crate::wait::{SyncWaiter, TimeoutPolicy, WaitOutcome};

/// Outlines an element in red
pub const HIGHLIGHT_SCRIPT: &str = "arguments[0].style.border='3px solid red';";

/// Scrolls an element to the top of the viewport
pub const SCROLL_INTO_VIEW_SCRIPT: &str = "arguments[0].scrollIntoView(true);";

/// Scrolls, then dispatches a DOM click
pub const JS_CLICK_SCRIPT: &str = "arguments[0].scrollIntoView(true);arguments[0].click();";

// =============================================================================
// CAPABILITIES
// =============================================================================

/// Can be clicked
pub trait Clickable {
    /// Native click. Stale or non-interactable targets are reported, not raised.
    fn click(&self) -> SyncResult<()>;

    /// Scroll into view and click through script
    fn js_click(&self) -> SyncResult<()>;
}

/// Accepts typed text
pub trait TextSettable {
    /// Type `value`
    fn set_text(&self, value: &str) -> SyncResult<()>;

    /// Empty the field
    fn clear(&self) -> SyncResult<()>;

    /// Type a base64-encoded secret. The decoded value is never reported.
    fn set_secure(&self, encoded: &str) -> SyncResult<()>;

    /// Type `value`, then assert the field holds exactly `value`
    fn set_validated(&self, value: &str) -> SyncResult<()>;
}

/// Can be waited on
pub trait Waitable {
    /// Block until `condition` holds or `policy` expires
    fn wait_for(&self, condition: &WaitCondition, policy: &TimeoutPolicy)
        -> SyncResult<WaitOutcome>;
}

/// Checkbox-like toggle
pub trait Checkable {
    /// Current checked state
    fn is_checked(&self) -> SyncResult<bool>;

    /// Click unless already checked
    fn check(&self) -> SyncResult<()>;

    /// Click if checked
    fn uncheck(&self) -> SyncResult<()>;

    /// [`Checkable::check`], then assert the element is checked
    fn check_validated(&self) -> SyncResult<()>;

    /// [`Checkable::uncheck`], then assert the element is unchecked
    fn uncheck_validated(&self) -> SyncResult<()>;
}

// =============================================================================
// ELEMENT
// =============================================================================

/// Locator bound to a driver and a reporter
#[derive(Debug)]
pub struct Element<'a, D: Driver + ?Sized, R: Reporter + ?Sized> {
    locator: Locator,
    driver: &'a D,
    reporter: &'a R,
}

impl<'a, D: Driver + ?Sized, R: Reporter + ?Sized> Element<'a, D, R> {
    /// Bind `locator`
    pub fn new(locator: Locator, driver: &'a D, reporter: &'a R) -> Self {
        Self {
            locator,
            driver,
            reporter,
        }
    }

    /// Locator
    pub const fn locator(&self) -> &Locator {
        &self.locator
    }

    /// Resolve to a fresh handle
    pub fn handle(&self) -> SyncResult<ElementHandle> {
        self.locator.resolve(self.driver)
    }

    /// Rendered text
    pub fn text(&self) -> SyncResult<String> {
        let handle = self.handle()?;
        self.driver
            .text(&handle)
            .map_err(|e| self.locator.translate(e))
    }

    /// Attribute value, `None` when absent
    pub fn attribute(&self, name: &str) -> SyncResult<Option<String>> {
        let handle = self.handle()?;
        self.driver
            .attribute(&handle, name)
            .map_err(|e| self.locator.translate(e))
    }

    /// Outline the element in red
    pub fn highlight(&self) -> SyncResult<()> {
        self.run_script(HIGHLIGHT_SCRIPT)
    }

    /// Scroll the element into view
    pub fn scroll_into_view(&self) -> SyncResult<()> {
        self.run_script(SCROLL_INTO_VIEW_SCRIPT)
    }

    fn run_script(&self, source: &str) -> SyncResult<()> {
        let handle = self.handle()?;
        self.driver
            .execute_script(source, &[ScriptArg::Element(handle)])
            .map(drop)
            .map_err(|e| self.locator.translate(e))
    }

    /// Swallow stale and non-interactable failures, reporting them
    fn tolerate(&self, action: &str, result: Result<(), DriverError>) -> SyncResult<()> {
        match result {
            Err(err) if err.is_swallowable() => {
                warn!(locator = %self.locator, action, error = %err, "ignored");
                self.reporter
                    .log_failure(&format!("Unable to {action} [ {} ]: {err}", self.locator));
                Ok(())
            }
            other => other.map_err(|e| self.locator.translate(e)),
        }
    }

    /// Current value of a form field, else its text
    fn field_value(&self) -> SyncResult<String> {
        match self.attribute("value")? {
            Some(value) => Ok(value),
            None => self.text(),
        }
    }

    fn type_keys(&self, keys: &str) -> SyncResult<()> {
        let handle = self.handle()?;
        self.tolerate("type into", self.driver.send_keys(&handle, keys))
    }
}

impl<D: Driver + ?Sized, R: Reporter + ?Sized> Clickable for Element<'_, D, R> {
    fn click(&self) -> SyncResult<()> {
        let handle = self.handle()?;
        let outline = self
            .driver
            .execute_script(HIGHLIGHT_SCRIPT, &[ScriptArg::Element(handle.clone())])
            .map(drop);
        self.tolerate("highlight", outline)?;
        info!(locator = %self.locator, "click");
        self.reporter
            .log(&format!("Clicked [ <b>{}</b> ]", self.locator));
        self.tolerate("click", self.driver.click(&handle))
    }

    fn js_click(&self) -> SyncResult<()> {
        self.reporter
            .log(&format!("Clicked [ <b>{}</b> ] through script", self.locator));
        self.run_script(JS_CLICK_SCRIPT)
    }
}

impl<D: Driver + ?Sized, R: Reporter + ?Sized> TextSettable for Element<'_, D, R> {
    fn set_text(&self, value: &str) -> SyncResult<()> {
        self.reporter.log(&format!(
            "<i>Setting the text of [ <b>{}</b> ] to [ {value} ].",
            self.locator
        ));
        self.type_keys(value)
    }

    fn clear(&self) -> SyncResult<()> {
        self.reporter.log(&format!(
            "<i>Clearing the contents of [ <b>{}</b> ]",
            self.locator
        ));
        let handle = self.handle()?;
        self.tolerate("clear", self.driver.clear(&handle))
    }

    fn set_secure(&self, encoded: &str) -> SyncResult<()> {
        self.reporter.log(&format!(
            "<i>Secure setting the text of [ <b>{}</b> ]",
            self.locator
        ));
        let bytes = STANDARD.decode(encoded.trim())?;
        let value = String::from_utf8(bytes).map_err(|_| {
            SyncError::config(format!("secure value for [ {} ] is not UTF-8", self.locator))
        })?;
        self.type_keys(&value)
    }

    fn set_validated(&self, value: &str) -> SyncResult<()> {
        self.set_text(value)?;
        let actual = self.field_value()?;
        self.reporter.assert_true(
            actual == value,
            &format!(
                "<i>Validating the text of [ <b>{}</b> ] to [ {value} ].",
                self.locator
            ),
        )
    }
}

impl<D: Driver + ?Sized, R: Reporter + ?Sized> Waitable for Element<'_, D, R> {
    fn wait_for(
        &self,
        condition: &WaitCondition,
        policy: &TimeoutPolicy,
    ) -> SyncResult<WaitOutcome> {
        SyncWaiter::new(self.driver, self.reporter).wait_for(&self.locator, condition, policy)
    }
}

impl<D: Driver + ?Sized, R: Reporter + ?Sized> Checkable for Element<'_, D, R> {
    fn is_checked(&self) -> SyncResult<bool> {
        let handle = self.handle()?;
        self.driver
            .is_selected(&handle)
            .map_err(|e| self.locator.translate(e))
    }

    fn check(&self) -> SyncResult<()> {
        if !self.is_checked()? {
            self.reporter
                .log(&format!("Checking the Checkbox [ <b>{}</b> ]", self.locator));
            let handle = self.handle()?;
            self.tolerate("check", self.driver.click(&handle))?;
        }
        Ok(())
    }

    fn uncheck(&self) -> SyncResult<()> {
        if self.is_checked()? {
            self.reporter
                .log(&format!("Unchecking the Checkbox [ <b>{}</b> ]", self.locator));
            let handle = self.handle()?;
            self.tolerate("uncheck", self.driver.click(&handle))?;
        }
        Ok(())
    }

    fn check_validated(&self) -> SyncResult<()> {
        self.check()?;
        self.reporter.assert_true(
            self.is_checked()?,
            &format!("Validating the Checkbox [ <b>{}</b> ] is checked", self.locator),
        )
    }

    fn uncheck_validated(&self) -> SyncResult<()> {
        self.uncheck()?;
        self.reporter.assert_false(
            self.is_checked()?,
            &format!("Validating the Checkbox [ <b>{}</b> ] is unchecked", self.locator),
        )
    }
}
