//! Locator abstraction for element selection.
//!
//! A [`Locator`] is an immutable `(strategy, value)` pair. It is built once,
//! when a page object is constructed, and resolved against the live DOM on
//! every use. Resolution never retries; polling belongs to
//! [`SyncWaiter`](crate::wait::SyncWaiter).

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::driver::{Driver, DriverError, ElementHandle};
use crate::result::{SyncError, SyncResult};

/// Strategy used by the driver to find an element
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Strategy {
    /// `id` attribute
    Id,
    /// CSS selector (e.g., "button.primary")
    Css,
    /// XPath expression
    XPath,
    /// `name` attribute
    Name,
    /// Exact anchor text
    LinkText,
    /// Substring of anchor text
    PartialLinkText,
    /// Tag name
    TagName,
    /// Single class name
    ClassName,
}

impl Strategy {
    /// All strategies, in declaration order
    pub const ALL: [Self; 8] = [
        Self::Id,
        Self::Css,
        Self::XPath,
        Self::Name,
        Self::LinkText,
        Self::PartialLinkText,
        Self::TagName,
        Self::ClassName,
    ];

    /// Name used in log lines and locator strings
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Id => "id",
            Self::Css => "css",
            Self::XPath => "xpath",
            Self::Name => "name",
            Self::LinkText => "link_text",
            Self::PartialLinkText => "partial_link_text",
            Self::TagName => "tag_name",
            Self::ClassName => "class_name",
        }
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Strategy {
    type Err = SyncError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase().replace(['-', ' '], "_");
        match normalized.as_str() {
            "id" => Ok(Self::Id),
            "css" | "css_selector" => Ok(Self::Css),
            "xpath" => Ok(Self::XPath),
            "name" => Ok(Self::Name),
            "link_text" | "linktext" => Ok(Self::LinkText),
            "partial_link_text" | "partiallinktext" => Ok(Self::PartialLinkText),
            "tag_name" | "tagname" | "tag" => Ok(Self::TagName),
            "class_name" | "classname" | "class" => Ok(Self::ClassName),
            other => Err(SyncError::config(format!(
                "unknown locator strategy [{other}]"
            ))),
        }
    }
}

/// Identifies a DOM element by strategy and value.
///
/// Equality is structural; locators are never mutated after construction.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Locator {
    strategy: Strategy,
    value: String,
}

impl Locator {
    /// Create a locator from a strategy and value
    #[must_use]
    pub fn new(strategy: Strategy, value: impl Into<String>) -> Self {
        Self {
            strategy,
            value: value.into(),
        }
    }

    /// Locate by `id`
    #[must_use]
    pub fn id(value: impl Into<String>) -> Self {
        Self::new(Strategy::Id, value)
    }

    /// Locate by CSS selector
    #[must_use]
    pub fn css(value: impl Into<String>) -> Self {
        Self::new(Strategy::Css, value)
    }

    /// Locate by XPath
    #[must_use]
    pub fn xpath(value: impl Into<String>) -> Self {
        Self::new(Strategy::XPath, value)
    }

    /// Locate by `name`
    #[must_use]
    pub fn name(value: impl Into<String>) -> Self {
        Self::new(Strategy::Name, value)
    }

    /// Locate an anchor by its exact text
    #[must_use]
    pub fn link_text(value: impl Into<String>) -> Self {
        Self::new(Strategy::LinkText, value)
    }

    /// Locate an anchor by part of its text
    #[must_use]
    pub fn partial_link_text(value: impl Into<String>) -> Self {
        Self::new(Strategy::PartialLinkText, value)
    }

    /// Locate by tag name
    #[must_use]
    pub fn tag_name(value: impl Into<String>) -> Self {
        Self::new(Strategy::TagName, value)
    }

    /// Locate by class name
    #[must_use]
    pub fn class_name(value: impl Into<String>) -> Self {
        Self::new(Strategy::ClassName, value)
    }

    /// Get the strategy
    #[must_use]
    pub const fn strategy(&self) -> Strategy {
        self.strategy
    }

    /// Get the raw value
    #[must_use]
    pub fn value(&self) -> &str {
        &self.value
    }

    /// Resolve against the live DOM.
    ///
    /// # Errors
    ///
    /// [`SyncError::ElementNotFound`] when the lookup comes back empty or
    /// times out, [`SyncError::StaleElementReference`] for a stale handle,
    /// [`SyncError::Script`] for a script failure and [`SyncError::Driver`]
    /// for anything else.
    pub fn resolve<D: Driver + ?Sized>(&self, driver: &D) -> SyncResult<ElementHandle> {
        driver
            .find_element(self)
            .map_err(|err| self.translate(err))
    }

    /// Resolve every match, in document order. An empty result is not an error.
    pub fn resolve_all<D: Driver + ?Sized>(&self, driver: &D) -> SyncResult<Vec<ElementHandle>> {
        driver
            .find_elements(self)
            .map_err(|err| self.translate(err))
    }

    /// Attach this locator to a driver error
    #[must_use]
    pub fn translate(&self, err: DriverError) -> SyncError {
        match err {
            DriverError::StaleElement { .. } => SyncError::StaleElementReference {
                locator: self.clone(),
            },
            e if e.is_absence() => SyncError::ElementNotFound {
                locator: self.clone(),
            },
            DriverError::Script { message } => SyncError::Script {
                locator: self.clone(),
                message,
            },
            other => SyncError::Driver {
                locator: self.clone(),
                message: other.to_string(),
            },
        }
    }
}

impl fmt::Display for Locator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} = {}", self.strategy, self.value)
    }
}

/// Parses `strategy=value`, e.g. `id=employee_username` or
/// `xpath=//*[@id="content"]/h1`. Only the first `=` splits.
impl FromStr for Locator {
    type Err = SyncError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (strategy, value) = s
            .split_once('=')
            .ok_or_else(|| SyncError::config(format!("locator [{s}] is not strategy=value")))?;
        let value = value.trim();
        if value.is_empty() {
            return Err(SyncError::config(format!("locator [{s}] has an empty value")));
        }
        Ok(Self::new(strategy.parse()?, value))
    }
}
