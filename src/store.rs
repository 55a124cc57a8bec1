use log::{debug, info};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::paste::{Row, Table};
use crate::range::{CellRef, SheetRange};

/// Last column wiped before a paste is written (column U).
pub const CLEAR_LAST_COLUMN: u32 = 21;

/// Extra rows below a paste that are wiped along with it.
pub const CLEAR_EXTRA_ROWS: u32 = 10;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("sheet not found: {0}")]
    SheetNotFound(String),
    #[error("invalid range: {0}")]
    InvalidRange(String),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("workbook encoding error: {0}")]
    Codec(#[from] bincode::Error),
}

/// Read/write access to rectangular ranges of a spreadsheet.
///
/// The parser's [`Table`] is exactly what goes into `write`; padding ragged
/// rows is the store's job.
pub trait SheetStore {
    /// Worksheet names in workbook order.
    fn sheet_names(&self) -> Vec<String>;

    /// Values inside `range`, padded to a rectangle, trailing empty rows removed.
    fn read(&self, range: &SheetRange) -> Result<Table, StoreError>;

    /// Write `table` with its first cell at the start of `range`.
    fn write(&mut self, range: &SheetRange, table: &Table) -> Result<(), StoreError>;

    /// Empty every cell inside `range`.
    fn clear(&mut self, range: &SheetRange) -> Result<(), StoreError>;

    /// Clear `cleared`, then write `table` at the start of `range`.
    ///
    /// Stores that persist changes save both steps together, so a failure
    /// leaves neither applied.
    fn replace(
        &mut self,
        cleared: &SheetRange,
        range: &SheetRange,
        table: &Table,
    ) -> Result<(), StoreError> {
        self.clear(cleared)?;
        self.write(range, table)
    }
}

/// Reject ranges that name row 0 or column 0.
pub fn check_range(range: &SheetRange) -> Result<(), StoreError> {
    let zero = |cell: &CellRef| cell.row == 0 || cell.col == 0;
    if range.start.iter().chain(range.end.iter()).any(zero) {
        return Err(StoreError::InvalidRange(format!(
            "{} addresses row or column 0",
            range.sheet
        )));
    }
    Ok(())
}

/// One named grid of string cells. Missing cells read as empty.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Worksheet {
    pub name: String,
    cells: Vec<Row>,
}

impl Worksheet {
    pub fn new(name: impl Into<String>) -> Self {
        Worksheet {
            name: name.into(),
            cells: Vec::new(),
        }
    }

    /// Cell value, empty for missing cells and for row or column 0.
    pub fn get(&self, row: u32, col: u32) -> &str {
        let (Some(r), Some(c)) = ((row as usize).checked_sub(1), (col as usize).checked_sub(1))
        else {
            return "";
        };
        self.cells
            .get(r)
            .and_then(|line| line.get(c))
            .map(String::as_str)
            .unwrap_or("")
    }

    // callers check for row and column 0 first
    fn set(&mut self, row: u32, col: u32, value: impl Into<String>) {
        let (r, c) = (row as usize - 1, col as usize - 1);
        if self.cells.len() <= r {
            self.cells.resize_with(r + 1, Vec::new);
        }
        let line = &mut self.cells[r];
        if line.len() <= c {
            line.resize(c + 1, String::new());
        }
        line[c] = value.into();
    }

    /// Number of rows up to the last one holding a non-empty cell.
    pub fn used_rows(&self) -> u32 {
        self.cells
            .iter()
            .rposition(|row| row.iter().any(|cell| !cell.is_empty()))
            .map_or(0, |idx| idx as u32 + 1)
    }

    /// Number of columns up to the right-most non-empty cell in any row.
    pub fn used_cols(&self) -> u32 {
        self.cells
            .iter()
            .filter_map(|row| row.iter().rposition(|cell| !cell.is_empty()))
            .max()
            .map_or(0, |idx| idx as u32 + 1)
    }

    fn compact(&mut self) {
        for row in &mut self.cells {
            let keep = row.iter().rposition(|cell| !cell.is_empty()).map_or(0, |i| i + 1);
            row.truncate(keep);
        }
        self.cells.truncate(self.used_rows() as usize);
    }

    /// Inclusive bounds of `range` on this sheet, `None` when it covers nothing.
    fn bounds(&self, range: &SheetRange) -> Option<(CellRef, CellRef)> {
        let start = range.origin();
        let end = range
            .end
            .unwrap_or(CellRef::new(self.used_rows(), self.used_cols()));
        if end.row < start.row || end.col < start.col {
            return None;
        }
        Some((start, end))
    }
}

/// In-memory workbook: an ordered list of worksheets.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Workbook {
    sheets: Vec<Worksheet>,
}

impl Workbook {
    pub fn with_sheets<S: AsRef<str>>(names: &[S]) -> Self {
        let mut workbook = Workbook::default();
        for name in names {
            workbook.ensure_sheet(name.as_ref());
        }
        workbook
    }

    /// Add an empty worksheet unless one with this name exists.
    ///
    /// Returns true when a sheet was added.
    pub fn ensure_sheet(&mut self, name: &str) -> bool {
        if self.sheet(name).is_some() {
            return false;
        }
        self.sheets.push(Worksheet::new(name));
        true
    }

    pub fn sheet(&self, name: &str) -> Option<&Worksheet> {
        self.sheets.iter().find(|s| s.name == name)
    }

    fn sheet_mut(&mut self, name: &str) -> Result<&mut Worksheet, StoreError> {
        self.sheets
            .iter_mut()
            .find(|s| s.name == name)
            .ok_or_else(|| StoreError::SheetNotFound(name.to_string()))
    }
}

impl SheetStore for Workbook {
    fn sheet_names(&self) -> Vec<String> {
        self.sheets.iter().map(|s| s.name.clone()).collect()
    }

    fn read(&self, range: &SheetRange) -> Result<Table, StoreError> {
        check_range(range)?;
        let sheet = self
            .sheet(&range.sheet)
            .ok_or_else(|| StoreError::SheetNotFound(range.sheet.clone()))?;

        let Some((start, end)) = sheet.bounds(range) else {
            return Ok(Table::new());
        };

        let mut rows: Vec<Row> = (start.row..=end.row)
            .map(|r| {
                (start.col..=end.col)
                    .map(|c| sheet.get(r, c).to_string())
                    .collect()
            })
            .collect();

        while rows
            .last()
            .is_some_and(|row| row.iter().all(String::is_empty))
        {
            rows.pop();
        }

        Ok(Table::from(rows))
    }

    fn write(&mut self, range: &SheetRange, table: &Table) -> Result<(), StoreError> {
        check_range(range)?;
        if table.is_empty() {
            return Ok(());
        }

        let start = range.origin();
        let width = table.width() as u32;
        let height = table.len() as u32;

        let too_big = || {
            StoreError::InvalidRange(format!(
                "{} cannot hold {} rows x {} columns",
                range, height, width
            ))
        };
        let last_row = start.row.checked_add(height - 1).ok_or_else(too_big)?;
        let last_col = start.col.checked_add(width.saturating_sub(1)).ok_or_else(too_big)?;
        if let Some(end) = range.end {
            if last_row > end.row || last_col > end.col {
                return Err(too_big());
            }
        }

        let sheet = self.sheet_mut(&range.sheet)?;
        for (i, row) in table.padded(width as usize).into_iter().enumerate() {
            for (j, value) in row.into_iter().enumerate() {
                sheet.set(start.row + i as u32, start.col + j as u32, value);
            }
        }
        sheet.compact();

        debug!("Wrote {} rows x {} columns to {}", height, width, range);
        Ok(())
    }

    fn clear(&mut self, range: &SheetRange) -> Result<(), StoreError> {
        check_range(range)?;
        let sheet = self.sheet_mut(&range.sheet)?;
        let Some((start, end)) = sheet.bounds(range) else {
            return Ok(());
        };

        let last_row = end.row.min(sheet.cells.len() as u32);
        for r in start.row..=last_row {
            let line = &mut sheet.cells[r as usize - 1];
            let last_col = end.col.min(line.len() as u32);
            for c in start.col..=last_col {
                line[c as usize - 1].clear();
            }
        }
        sheet.compact();

        debug!("Cleared {}", range);
        Ok(())
    }

    fn replace(
        &mut self,
        cleared: &SheetRange,
        range: &SheetRange,
        table: &Table,
    ) -> Result<(), StoreError> {
        check_range(range)?;
        self.sheet_mut(&range.sheet)?;
        self.clear(cleared)?;
        self.write(range, table)
    }
}

/// Replace a month's intake block with a freshly pasted table.
///
/// Wipes `A{start_row}:U{start_row + n + 10}` first so rows left over from a
/// longer earlier paste do not survive, then writes the table at
/// `A{start_row}`. An empty table leaves the sheet untouched.
///
/// # Returns
/// * `Result<usize, StoreError>` - Number of rows written
pub fn save_paste(
    store: &mut dyn SheetStore,
    sheet: &str,
    start_row: u32,
    table: &Table,
) -> Result<usize, StoreError> {
    if start_row == 0 {
        return Err(StoreError::InvalidRange(format!("{} start row 0", sheet)));
    }
    if table.is_empty() {
        return Ok(0);
    }

    let rows = table.len() as u32;
    let clear_end = start_row.saturating_add(rows).saturating_add(CLEAR_EXTRA_ROWS);
    let clear_range = SheetRange::block(
        sheet,
        CellRef::new(start_row, 1),
        CellRef::new(clear_end, CLEAR_LAST_COLUMN),
    );
    let anchor = SheetRange::anchored(sheet, CellRef::new(start_row, 1));
    store.replace(&clear_range, &anchor, table)?;

    info!("Saved {} pasted rows to {} from row {}", rows, sheet, start_row);
    Ok(table.len())
}
