//! Driver - Abstract Browser Automation Trait
//!
//! The synchronization layer never talks to a browser directly. It consumes
//! the narrow, blocking [`Driver`] trait below, so a WebDriver client, a CDP
//! client or the in-memory [`MockDriver`](crate::mock::MockDriver) can sit
//! behind it.
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │  SyncWaiter / TableReader / RadioGroup / SelectList / Element │
//! ├──────────────────────────────────────────────────────────────┤
//! │  Driver (trait)                                               │
//! │    find_element · bounding_box · is_clickable · text · click  │
//! ├───────────────────────────┬──────────────────────────────────┤
//! │  WebDriver adapter        │  MockDriver (in-memory DOM)       │
//! └───────────────────────────┴──────────────────────────────────┘
//! ```
//!
//! Lookups must be zero-wait: blocking is the job of
//! [`SyncWaiter`](crate::wait::SyncWaiter), and an adapter with a non-zero
//! implicit wait would multiply every poll.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;
use thiserror::Error;

use crate::locator::Locator;

/// Opaque element id issued by the driver.
///
/// A handle may go stale as soon as the DOM changes; callers re-resolve the
/// [`Locator`] instead of holding handles across waits.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ElementHandle(String);

impl ElementHandle {
    /// Wrap a driver-issued id
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Raw id
    #[must_use]
    pub fn id(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ElementHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Rendered element geometry in CSS pixels
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct BoundingBox {
    /// X coordinate
    pub x: f64,
    /// Y coordinate
    pub y: f64,
    /// Width
    pub width: f64,
    /// Height
    pub height: f64,
}

impl BoundingBox {
    /// Create a new bounding box
    #[must_use]
    pub const fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Zero-sized box at the origin, i.e. not rendered
    #[must_use]
    pub const fn collapsed() -> Self {
        Self::new(0.0, 0.0, 0.0, 0.0)
    }

    /// Visibility heuristic: a non-empty area, or any positive offset.
    ///
    /// The offset clause treats a zero-area element placed away from the
    /// origin as visible. Callers that need pixel-accurate visibility must
    /// check `width`/`height` themselves.
    #[must_use]
    pub fn looks_visible(&self) -> bool {
        (self.width > 0.0 && self.height > 0.0) || (self.x > 0.0 && self.y > 0.0)
    }
}

/// Argument passed to [`Driver::execute_script`]
#[derive(Debug, Clone, PartialEq)]
pub enum ScriptArg {
    /// Element, available to the script as `arguments[n]`
    Element(ElementHandle),
    /// Plain JSON value
    Value(serde_json::Value),
}

impl From<ElementHandle> for ScriptArg {
    fn from(handle: ElementHandle) -> Self {
        Self::Element(handle)
    }
}

impl From<serde_json::Value> for ScriptArg {
    fn from(value: serde_json::Value) -> Self {
        Self::Value(value)
    }
}

/// Errors raised by a driver implementation
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DriverError {
    /// Lookup returned nothing
    #[error("no such element: {message}")]
    NoSuchElement {
        /// Driver message
        message: String,
    },

    /// Handle no longer attached to the DOM
    #[error("stale element reference: {message}")]
    StaleElement {
        /// Driver message
        message: String,
    },

    /// Driver-side timeout
    #[error("driver timeout: {message}")]
    Timeout {
        /// Driver message
        message: String,
    },

    /// Element cannot receive the interaction
    #[error("element not interactable: {message}")]
    NotInteractable {
        /// Driver message
        message: String,
    },

    /// Script raised or returned garbage
    #[error("javascript error: {message}")]
    Script {
        /// Driver message
        message: String,
    },

    /// Anything else (session lost, protocol error)
    #[error("{message}")]
    Other {
        /// Driver message
        message: String,
    },
}

impl DriverError {
    /// Create a [`DriverError::NoSuchElement`]
    #[must_use]
    pub fn no_such_element(message: impl Into<String>) -> Self {
        Self::NoSuchElement {
            message: message.into(),
        }
    }

    /// Create a [`DriverError::StaleElement`]
    #[must_use]
    pub fn stale(message: impl Into<String>) -> Self {
        Self::StaleElement {
            message: message.into(),
        }
    }

    /// Create a [`DriverError::Timeout`]
    #[must_use]
    pub fn timeout(message: impl Into<String>) -> Self {
        Self::Timeout {
            message: message.into(),
        }
    }

    /// Create a [`DriverError::NotInteractable`]
    #[must_use]
    pub fn not_interactable(message: impl Into<String>) -> Self {
        Self::NotInteractable {
            message: message.into(),
        }
    }

    /// Create a [`DriverError::Script`]
    #[must_use]
    pub fn script(message: impl Into<String>) -> Self {
        Self::Script {
            message: message.into(),
        }
    }

    /// Create a [`DriverError::Other`]
    #[must_use]
    pub fn other(message: impl Into<String>) -> Self {
        Self::Other {
            message: message.into(),
        }
    }

    /// The element is missing, detached or could not be found in time.
    ///
    /// These are the errors a poll loop treats as "not yet".
    #[must_use]
    pub const fn is_absence(&self) -> bool {
        matches!(
            self,
            Self::NoSuchElement { .. } | Self::StaleElement { .. } | Self::Timeout { .. }
        )
    }

    /// A click or keystroke that a toggle-style caller may drop
    #[must_use]
    pub const fn is_swallowable(&self) -> bool {
        matches!(
            self,
            Self::StaleElement { .. } | Self::NotInteractable { .. }
        )
    }
}

/// Result type for driver calls
pub type DriverResult<T> = Result<T, DriverError>;

/// Blocking browser facade.
///
/// Every method takes `&self`; implementations use interior mutability for
/// session state. One driver serves one test on one thread.
pub trait Driver {
    /// Resolve a locator to its first match
    fn find_element(&self, locator: &Locator) -> DriverResult<ElementHandle>;

    /// Resolve a locator to every match, in document order
    fn find_elements(&self, locator: &Locator) -> DriverResult<Vec<ElementHandle>>;

    /// Resolve a locator relative to `parent`
    fn find_child_elements(
        &self,
        parent: &ElementHandle,
        locator: &Locator,
    ) -> DriverResult<Vec<ElementHandle>>;

    /// Run a script in the page; element args are exposed as `arguments[n]`
    fn execute_script(&self, source: &str, args: &[ScriptArg]) -> DriverResult<serde_json::Value>;

    /// Rendered geometry
    fn bounding_box(&self, element: &ElementHandle) -> DriverResult<BoundingBox>;

    /// Visible and enabled
    fn is_clickable(&self, element: &ElementHandle) -> DriverResult<bool>;

    /// Selected state of an option, checkbox or radio
    fn is_selected(&self, element: &ElementHandle) -> DriverResult<bool>;

    /// Rendered text
    fn text(&self, element: &ElementHandle) -> DriverResult<String>;

    /// Attribute or property value, `None` when unset
    fn attribute(&self, element: &ElementHandle, name: &str) -> DriverResult<Option<String>>;

    /// Lower-case tag name
    fn tag_name(&self, element: &ElementHandle) -> DriverResult<String>;

    /// Click
    fn click(&self, element: &ElementHandle) -> DriverResult<()>;

    /// Type into the element
    fn send_keys(&self, element: &ElementHandle, keys: &str) -> DriverResult<()>;

    /// Clear an input's value
    fn clear(&self, element: &ElementHandle) -> DriverResult<()>;

    /// Set the driver's own implicit wait; pagesync keeps it at zero
    fn set_implicit_wait(&self, wait: Duration) -> DriverResult<()>;
}

impl<T: Driver + ?Sized> Driver for &T {
    fn find_element(&self, locator: &Locator) -> DriverResult<ElementHandle> {
        (**self).find_element(locator)
    }

    fn find_elements(&self, locator: &Locator) -> DriverResult<Vec<ElementHandle>> {
        (**self).find_elements(locator)
    }

    fn find_child_elements(
        &self,
        parent: &ElementHandle,
        locator: &Locator,
    ) -> DriverResult<Vec<ElementHandle>> {
        (**self).find_child_elements(parent, locator)
    }

    fn execute_script(&self, source: &str, args: &[ScriptArg]) -> DriverResult<serde_json::Value> {
        (**self).execute_script(source, args)
    }

    fn bounding_box(&self, element: &ElementHandle) -> DriverResult<BoundingBox> {
        (**self).bounding_box(element)
    }

    fn is_clickable(&self, element: &ElementHandle) -> DriverResult<bool> {
        (**self).is_clickable(element)
    }

    fn is_selected(&self, element: &ElementHandle) -> DriverResult<bool> {
        (**self).is_selected(element)
    }

    fn text(&self, element: &ElementHandle) -> DriverResult<String> {
        (**self).text(element)
    }

    fn attribute(&self, element: &ElementHandle, name: &str) -> DriverResult<Option<String>> {
        (**self).attribute(element, name)
    }

    fn tag_name(&self, element: &ElementHandle) -> DriverResult<String> {
        (**self).tag_name(element)
    }

    fn click(&self, element: &ElementHandle) -> DriverResult<()> {
        (**self).click(element)
    }

    fn send_keys(&self, element: &ElementHandle, keys: &str) -> DriverResult<()> {
        (**self).send_keys(element, keys)
    }

    fn clear(&self, element: &ElementHandle) -> DriverResult<()> {
        (**self).clear(element)
    }

    fn set_implicit_wait(&self, wait: Duration) -> DriverResult<()> {
        (**self).set_implicit_wait(wait)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    mod element_handle_tests {
        use super::*;

        #[test]
        fn test_handle_roundtrips_id() {
            let handle = ElementHandle::new("node-7");
            assert_eq!(handle.id(), "node-7");
            assert_eq!(handle.to_string(), "node-7");
            assert_eq!(handle.clone(), handle);
        }

        #[test]
        fn test_handle_into_script_arg() {
            let arg: ScriptArg = ElementHandle::new("node-1").into();
            assert!(matches!(arg, ScriptArg::Element(ref h) if h.id() == "node-1"));
        }
    }

    mod bounding_box_tests {
        use super::*;

        #[test]
        fn test_area_is_visible() {
            assert!(BoundingBox::new(0.0, 0.0, 10.0, 5.0).looks_visible());
        }

        #[test]
        fn test_collapsed_is_hidden() {
            assert!(!BoundingBox::collapsed().looks_visible());
            assert!(!BoundingBox::new(0.0, 0.0, 10.0, 0.0).looks_visible());
        }

        #[test]
        fn test_positive_offset_counts_as_visible() {
            assert!(BoundingBox::new(3.0, 4.0, 0.0, 0.0).looks_visible());
            assert!(!BoundingBox::new(3.0, 0.0, 0.0, 0.0).looks_visible());
        }
    }

    mod driver_error_tests {
        use super::*;

        #[test]
        fn test_absence_family() {
            assert!(DriverError::no_such_element("x").is_absence());
            assert!(DriverError::stale("x").is_absence());
            assert!(DriverError::timeout("x").is_absence());
            assert!(!DriverError::not_interactable("x").is_absence());
            assert!(!DriverError::script("x").is_absence());
            assert!(!DriverError::other("x").is_absence());
        }

        #[test]
        fn test_swallowable_family() {
            assert!(DriverError::stale("x").is_swallowable());
            assert!(DriverError::not_interactable("x").is_swallowable());
            assert!(!DriverError::no_such_element("x").is_swallowable());
        }

        #[test]
        fn test_display() {
            assert_eq!(
                DriverError::stale("node-3").to_string(),
                "stale element reference: node-3"
            );
            assert_eq!(DriverError::other("session gone").to_string(), "session gone");
        }
    }
}
