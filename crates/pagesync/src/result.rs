//! Result and error types for Pagesync.

use std::time::Duration;
use thiserror::Error;

use crate::locator::Locator;

/// Result type for Pagesync operations
pub type SyncResult<T> = Result<T, SyncError>;

/// Errors surfaced to page objects and tests.
///
/// Raw driver errors never escape: they are translated into one of these
/// variants with the locator attached.
#[derive(Debug, Error)]
pub enum SyncError {
    /// Locator resolved to zero elements
    #[error("Element [ {locator} ] was not found on the page")]
    ElementNotFound {
        /// Locator that was resolved
        locator: Locator,
    },

    /// Element handle was invalidated by a DOM mutation
    #[error("Element [ {locator} ] refers to a stale element")]
    StaleElementReference {
        /// Locator the handle came from
        locator: Locator,
    },

    /// A wait deadline elapsed before the condition was met
    #[error(
        "Element [ {locator} ] is not {condition} on the page after [ {:.1} ] seconds{}",
        .elapsed.as_secs_f64(),
        last_error_suffix(.last_error)
    )]
    ElementWaitTimeout {
        /// Locator that was polled
        locator: Locator,
        /// Condition phrase, e.g. `VISIBLE`
        condition: String,
        /// Time spent polling
        elapsed: Duration,
        /// Last driver error seen while probing, if any
        last_error: Option<String>,
    },

    /// A non-element wait (ready state, custom predicate) timed out
    #[error("Timed out after [ {:.1} ] seconds waiting for {description}", .elapsed.as_secs_f64())]
    Timeout {
        /// What was waited for
        description: String,
        /// Time spent polling
        elapsed: Duration,
    },

    /// Wait was cancelled between polls
    #[error("Wait for {description} was cancelled after {}ms", .elapsed.as_millis())]
    Cancelled {
        /// What was waited for
        description: String,
        /// Time spent before cancellation
        elapsed: Duration,
    },

    /// Table row does not exist
    #[error("The expected row [{row}] was not found. The number of rows found for webtable [ {table} ] is [{row_count}]")]
    RowNotFound {
        /// Table locator
        table: Locator,
        /// Requested row (1-based)
        row: usize,
        /// Rows actually present
        row_count: usize,
    },

    /// Table column does not exist in a row
    #[error("No cell was found for row [{row}] and column [{column}]. The column count for row [{row}] is [{column_count}]")]
    ColumnNotFound {
        /// Requested row (1-based)
        row: usize,
        /// Requested column (1-based)
        column: usize,
        /// Cells actually present in the row
        column_count: usize,
    },

    /// A row has neither `th` nor `td` children
    #[error("No child element with the HTML tag \"th\" or \"td\" was found in row [{row}] of webtable [ {table} ]")]
    NoColumnTag {
        /// Table locator
        table: Locator,
        /// Row that was inspected (1-based)
        row: usize,
    },

    /// No cell in the searched scope has the text
    #[error("No cell {scope} was found to have the text [{text}]")]
    CellTextNotFound {
        /// Text searched for
        text: String,
        /// Human description of the scope, e.g. `in column [2]`
        scope: String,
    },

    /// Start row beyond the table
    #[error("The start row [{start_row}] is greater than the total number of rows in the web table [{row_count}]")]
    StartRowOutOfRange {
        /// Requested start row
        start_row: usize,
        /// Rows actually present
        row_count: usize,
    },

    /// Option text is not offered by a select list
    #[error("The value of [ {requested} ] was not found in Listbox [ {locator} ]. Acceptable values are [ {} ]", .available.join(" | "))]
    OptionNotFound {
        /// Select locator
        locator: Locator,
        /// Requested option text
        requested: String,
        /// Every option the list offers
        available: Vec<String>,
    },

    /// Element is not a `select`
    #[error("The element defined by [ {locator} ] is not a select-type element (tag [{tag}])")]
    NotASelect {
        /// Offending locator
        locator: Locator,
        /// Tag actually found
        tag: String,
    },

    /// Deselection on a single-choice select
    #[error("You may only deselect options of a multi-select [ {locator} ]")]
    NotMultiSelect {
        /// Select locator
        locator: Locator,
    },

    /// Radio index past the end of the group
    #[error("Radio index [{index}] is out of range for radio group [ {locator} ] with [{count}] buttons")]
    RadioIndexOutOfRange {
        /// Group locator
        locator: Locator,
        /// Requested index (0-based)
        index: usize,
        /// Buttons in the group
        count: usize,
    },

    /// Radio label not present in the group
    #[error("Label [{label}] was not found in radio group [ {locator} ]. Available labels are [ {} ]", .available.join(" | "))]
    RadioLabelNotFound {
        /// Group locator
        locator: Locator,
        /// Requested label
        label: String,
        /// Labels the group offers
        available: Vec<String>,
    },

    /// Element name missing from a page registry
    #[error("No element named [{name}] is registered on page [{page}]")]
    UnknownElement {
        /// Page name
        page: String,
        /// Requested element name
        name: String,
    },

    /// Assertion failed
    #[error("Assertion failed: {message}")]
    AssertionFailed {
        /// Error message
        message: String,
    },

    /// Script execution failed
    #[error("Script execution failed on [ {locator} ]: {message}")]
    Script {
        /// Locator whose element the script ran against
        locator: Locator,
        /// Error message
        message: String,
    },

    /// Any other driver failure, with locator context
    #[error("Driver error on [ {locator} ]: {message}")]
    Driver {
        /// Locator being acted on
        locator: Locator,
        /// Error message
        message: String,
    },

    /// Invalid configuration value or locator string
    #[error("Configuration error: {message}")]
    Config {
        /// Error message
        message: String,
    },

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// YAML error
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml_ng::Error),

    /// Base64 decoding error
    #[error("Base64 decode error: {0}")]
    Base64(#[from] base64::DecodeError),
}

fn last_error_suffix(last_error: &Option<String>) -> String {
    last_error
        .as_ref()
        .map(|e| format!(" (last driver error: {e})"))
        .unwrap_or_default()
}

impl SyncError {
    /// Create an assertion failure
    #[must_use]
    pub fn assertion(message: impl Into<String>) -> Self {
        Self::AssertionFailed {
            message: message.into(),
        }
    }

    /// Create a configuration error
    #[must_use]
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// True for the timeout family
    #[must_use]
    pub const fn is_timeout(&self) -> bool {
        matches!(self, Self::ElementWaitTimeout { .. } | Self::Timeout { .. })
    }
}
