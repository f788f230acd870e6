//! Web table accessor.
//!
//! Rows are the table's `tr` children, or its `tbody/tr` grandchildren when
//! there are none. Cells of a row are its `th` children, or its `td`
//! children when there are none. Rows and columns are 1-based.
//!
//! Nothing is cached: every call re-resolves the table locator and rescans
//! the live DOM.

use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::driver::{Driver, ElementHandle, ScriptArg};
use crate::element::HIGHLIGHT_SCRIPT;
use crate::locator::Locator;
use crate::result::{SyncError, SyncResult};

/// 1-based cell position
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TableCoordinate {
    /// Row, 1-based
    pub row: usize,
    /// Column, 1-based
    pub column: usize,
}

impl TableCoordinate {
    /// Create a coordinate
    #[must_use]
    pub const fn new(row: usize, column: usize) -> Self {
        Self { row, column }
    }
}

impl fmt::Display for TableCoordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "row [{}] column [{}]", self.row, self.column)
    }
}

/// Where a text search looks
#[derive(Debug, Clone, Copy, Default)]
struct Scope {
    first_row: usize,
    row: Option<usize>,
    column: Option<usize>,
}

/// Reads and clicks cells of an HTML table
#[derive(Debug)]
pub struct TableReader<'a, D: Driver + ?Sized> {
    locator: Locator,
    driver: &'a D,
}

impl<'a, D: Driver + ?Sized> TableReader<'a, D> {
    /// Bind a table locator to a driver
    pub fn new(locator: Locator, driver: &'a D) -> Self {
        Self { locator, driver }
    }

    /// Table locator
    pub const fn locator(&self) -> &Locator {
        &self.locator
    }

    // =========================================================================
    // Structure
    // =========================================================================

    fn children(&self, parent: &ElementHandle, xpath: &str) -> SyncResult<Vec<ElementHandle>> {
        self.driver
            .find_child_elements(parent, &Locator::xpath(xpath))
            .map_err(|e| self.locator.translate(e))
    }

    fn rows(&self) -> SyncResult<Vec<ElementHandle>> {
        let table = self.locator.resolve(self.driver)?;
        let rows = self.children(&table, "tr")?;
        if rows.is_empty() {
            self.children(&table, "tbody/tr")
        } else {
            Ok(rows)
        }
    }

    /// `th` cells, else `td` cells, else empty
    fn cells_or_empty(&self, row: &ElementHandle) -> SyncResult<Vec<ElementHandle>> {
        let headers = self.children(row, "th")?;
        if headers.is_empty() {
            self.children(row, "td")
        } else {
            Ok(headers)
        }
    }

    fn cells(&self, row_element: &ElementHandle, row: usize) -> SyncResult<Vec<ElementHandle>> {
        let cells = self.cells_or_empty(row_element)?;
        if cells.is_empty() {
            return Err(SyncError::NoColumnTag {
                table: self.locator.clone(),
                row,
            });
        }
        Ok(cells)
    }

    fn row_element(&self, row: usize) -> SyncResult<ElementHandle> {
        let rows = self.rows()?;
        let row_count = rows.len();
        row.checked_sub(1)
            .and_then(|i| rows.into_iter().nth(i))
            .ok_or_else(|| SyncError::RowNotFound {
                table: self.locator.clone(),
                row,
                row_count,
            })
    }

    fn text_of(&self, element: &ElementHandle) -> SyncResult<String> {
        self.driver
            .text(element)
            .map_err(|e| self.locator.translate(e))
    }

    /// Number of rows
    pub fn row_count(&self) -> SyncResult<usize> {
        Ok(self.rows()?.len())
    }

    /// Number of cells in `row`
    pub fn column_count(&self, row: usize) -> SyncResult<usize> {
        let row_element = self.row_element(row)?;
        Ok(self.cells(&row_element, row)?.len())
    }

    /// Cell element at (`row`, `column`)
    pub fn cell(&self, row: usize, column: usize) -> SyncResult<ElementHandle> {
        let row_element = self.row_element(row)?;
        let cells = self.cells(&row_element, row)?;
        let column_count = cells.len();
        column
            .checked_sub(1)
            .and_then(|i| cells.into_iter().nth(i))
            .ok_or(SyncError::ColumnNotFound {
                row,
                column,
                column_count,
            })
    }

    /// Cell element at `coordinate`
    pub fn cell_at(&self, coordinate: TableCoordinate) -> SyncResult<ElementHandle> {
        self.cell(coordinate.row, coordinate.column)
    }

    /// Rendered text of a cell
    pub fn cell_text(&self, row: usize, column: usize) -> SyncResult<String> {
        let cell = self.cell(row, column)?;
        self.text_of(&cell)
    }

    /// Click a cell
    pub fn click_cell(&self, row: usize, column: usize) -> SyncResult<()> {
        let cell = self.cell(row, column)?;
        info!(table = %self.locator, row, column, "click cell");
        self.driver
            .click(&cell)
            .map_err(|e| self.locator.translate(e))
    }

    /// Outline every cell, row by row
    pub fn highlight_each_cell(&self) -> SyncResult<()> {
        for (i, row_element) in self.rows()?.iter().enumerate() {
            for cell in self.cells(row_element, i + 1)? {
                self.driver
                    .execute_script(HIGHLIGHT_SCRIPT, &[ScriptArg::Element(cell)])
                    .map_err(|e| self.locator.translate(e))?;
            }
        }
        Ok(())
    }

    // =========================================================================
    // Text search
    // =========================================================================

    /// Earliest row, then earliest column, whose trimmed text satisfies `matches`
    fn scan(
        &self,
        scope: Scope,
        matches: impl Fn(&str) -> bool,
    ) -> SyncResult<Option<TableCoordinate>> {
        let rows = self.rows()?;
        for (i, row_element) in rows.iter().enumerate() {
            let row = i + 1;
            if row < scope.first_row || scope.row.is_some_and(|r| r != row) {
                continue;
            }
            for (j, cell) in self.cells_or_empty(row_element)?.iter().enumerate() {
                let column = j + 1;
                if scope.column.is_some_and(|c| c != column) {
                    continue;
                }
                if matches(self.text_of(cell)?.trim()) {
                    debug!(table = %self.locator, row, column, "cell matched");
                    return Ok(Some(TableCoordinate::new(row, column)));
                }
            }
        }
        Ok(None)
    }

    fn find_exact(&self, text: &str, scope: Scope, describe: String) -> SyncResult<TableCoordinate> {
        self.scan(scope, |cell| cell == text)?
            .ok_or_else(|| SyncError::CellTextNotFound {
                text: text.to_string(),
                scope: describe,
            })
    }

    /// First cell whose trimmed text equals `text`
    pub fn find_cell_with_text(&self, text: &str) -> SyncResult<TableCoordinate> {
        self.find_exact(text, Scope::default(), "in the table".to_string())
    }

    /// Row of the first cell whose trimmed text equals `text`
    pub fn row_with_cell_text(&self, text: &str) -> SyncResult<usize> {
        Ok(self.find_cell_with_text(text)?.row)
    }

    /// First row whose cell in `column` equals `text`
    pub fn row_with_cell_text_in_column(&self, text: &str, column: usize) -> SyncResult<usize> {
        let scope = Scope {
            column: Some(column),
            ..Scope::default()
        };
        Ok(self
            .find_exact(text, scope, format!("in column [{column}]"))?
            .row)
    }

    /// Like [`Self::row_with_cell_text_in_column`], skipping rows before `start_row`
    pub fn row_with_cell_text_from(
        &self,
        text: &str,
        column: usize,
        start_row: usize,
    ) -> SyncResult<usize> {
        let row_count = self.row_count()?;
        if start_row > row_count {
            return Err(SyncError::StartRowOutOfRange {
                start_row,
                row_count,
            });
        }
        let scope = Scope {
            first_row: start_row,
            column: Some(column),
            ..Scope::default()
        };
        Ok(self
            .find_exact(text, scope, format!("in column [{column}]"))?
            .row)
    }

    /// Column of the first cell whose trimmed text equals `text`
    pub fn column_with_cell_text(&self, text: &str) -> SyncResult<usize> {
        Ok(self
            .find_exact(text, Scope::default(), "in any column".to_string())?
            .column)
    }

    /// Column, within `row` only, whose trimmed text equals `text`
    pub fn column_with_cell_text_in_row(&self, text: &str, row: usize) -> SyncResult<usize> {
        self.row_element(row)?;
        let scope = Scope {
            row: Some(row),
            ..Scope::default()
        };
        Ok(self.find_exact(text, scope, format!("in row [{row}]"))?.column)
    }

    /// First row whose cell in `column` contains `text`; `None` if none does
    pub fn row_containing_cell_text(&self, text: &str, column: usize) -> SyncResult<Option<usize>> {
        let scope = Scope {
            column: Some(column),
            ..Scope::default()
        };
        Ok(self.scan(scope, |cell| cell.contains(text))?.map(|c| c.row))
    }
}
