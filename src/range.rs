use std::fmt;

use crate::store::StoreError;

/// 1-based cell address, `A1` is `{ row: 1, col: 1 }`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub struct CellRef {
    pub row: u32,
    pub col: u32,
}

impl CellRef {
    pub fn new(row: u32, col: u32) -> Self {
        CellRef { row, col }
    }

    /// Parse an A1-style name such as `A7` or `ab12`
    ///
    /// Letters must come before digits; row 0 and empty parts are rejected.
    ///
    /// # Examples
    /// ```
    /// use intake::range::CellRef;
    ///
    /// assert_eq!(CellRef::parse("U80"), Some(CellRef::new(80, 21)));
    /// assert_eq!(CellRef::parse("7A"), None);
    /// ```
    pub fn parse(name: &str) -> Option<Self> {
        let mut letters = String::new();
        let mut digits = String::new();
        let mut found_digit = false;

        for c in name.trim().chars() {
            if c.is_ascii_alphabetic() {
                if found_digit {
                    return None;
                }
                letters.push(c.to_ascii_uppercase());
            } else if c.is_ascii_digit() {
                found_digit = true;
                digits.push(c);
            } else {
                return None;
            }
        }

        if letters.is_empty() || digits.is_empty() {
            return None;
        }

        let col = letter_to_col(&letters)?;
        let row = digits.parse::<u32>().ok()?;
        if row == 0 {
            return None;
        }
        Some(CellRef { row, col })
    }
}

impl fmt::Display for CellRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", col_to_letter(self.col), self.row)
    }
}

/// Convert a 1-based column number to letters (1 = A, 27 = AA).
pub fn col_to_letter(col: u32) -> String {
    let mut col = col;
    let mut result = String::new();
    while col > 0 {
        col -= 1;
        result.push(((col % 26) as u8 + b'A') as char);
        col /= 26;
    }
    result.chars().rev().collect()
}

/// Convert uppercase column letters back to a 1-based number.
///
/// Returns `None` for empty input, non-letters or overflow.
pub fn letter_to_col(letters: &str) -> Option<u32> {
    if letters.is_empty() {
        return None;
    }
    letters.chars().try_fold(0u32, |acc, c| {
        if !c.is_ascii_uppercase() {
            return None;
        }
        acc.checked_mul(26)?.checked_add(c as u32 - 'A' as u32 + 1)
    })
}

/// Range descriptor handed to a [`SheetStore`](crate::store::SheetStore).
///
/// Written as `Sheet`, `Sheet!A7` or `Sheet!A7:U80`. A missing start means
/// the whole sheet, a missing end means "as far as the sheet is used".
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SheetRange {
    pub sheet: String,
    pub start: Option<CellRef>,
    pub end: Option<CellRef>,
}

impl SheetRange {
    pub fn sheet(name: impl Into<String>) -> Self {
        SheetRange {
            sheet: name.into(),
            start: None,
            end: None,
        }
    }

    pub fn anchored(name: impl Into<String>, start: CellRef) -> Self {
        SheetRange {
            sheet: name.into(),
            start: Some(start),
            end: None,
        }
    }

    pub fn block(name: impl Into<String>, start: CellRef, end: CellRef) -> Self {
        SheetRange {
            sheet: name.into(),
            start: Some(start),
            end: Some(end),
        }
    }

    /// Parse a descriptor like `T1!A7:U80`
    ///
    /// # Errors
    /// * `StoreError::InvalidRange` when the sheet name is empty, a cell
    ///   name is malformed, or the end lies above/left of the start
    pub fn parse(text: &str) -> Result<Self, StoreError> {
        let invalid = || StoreError::InvalidRange(text.to_string());

        let (sheet, cells) = match text.rsplit_once('!') {
            Some((sheet, cells)) => (sheet, Some(cells)),
            None => (text, None),
        };
        let sheet = sheet.trim();
        if sheet.is_empty() {
            return Err(invalid());
        }

        let Some(cells) = cells else {
            return Ok(SheetRange::sheet(sheet));
        };

        match cells.split_once(':') {
            Some((first, last)) => {
                let start = CellRef::parse(first).ok_or_else(invalid)?;
                let end = CellRef::parse(last).ok_or_else(invalid)?;
                if end.row < start.row || end.col < start.col {
                    return Err(invalid());
                }
                Ok(SheetRange::block(sheet, start, end))
            }
            None => {
                let start = CellRef::parse(cells).ok_or_else(invalid)?;
                Ok(SheetRange::anchored(sheet, start))
            }
        }
    }

    /// First cell of the range, `A1` when the whole sheet is meant.
    pub fn origin(&self) -> CellRef {
        self.start.unwrap_or(CellRef::new(1, 1))
    }
}

impl fmt::Display for SheetRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.sheet)?;
        if let Some(start) = self.start {
            write!(f, "!{}", start)?;
            if let Some(end) = self.end {
                write!(f, ":{}", end)?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn column_letters_convert_both_ways() {
        assert_eq!(col_to_letter(1), "A");
        assert_eq!(col_to_letter(21), "U");
        assert_eq!(col_to_letter(26), "Z");
        assert_eq!(col_to_letter(27), "AA");
        assert_eq!(col_to_letter(52), "AZ");
        assert_eq!(letter_to_col("A"), Some(1));
        assert_eq!(letter_to_col("AZ"), Some(52));
        assert_eq!(letter_to_col(""), None);
        assert_eq!(letter_to_col("a"), None);
    }

    #[test]
    fn parses_cell_names() {
        assert_eq!(CellRef::parse("A1"), Some(CellRef::new(1, 1)));
        assert_eq!(CellRef::parse("ab12"), Some(CellRef::new(12, 28)));
        assert_eq!(CellRef::parse("A0"), None);
        assert_eq!(CellRef::parse("A"), None);
        assert_eq!(CellRef::parse("12"), None);
        assert_eq!(CellRef::parse("A1B"), None);
    }

    #[test]
    fn range_descriptor_round_trips() {
        for text in ["T1", "T1!A7", "T1!A7:U80", "Tháng 1!B2:C3"] {
            let range = SheetRange::parse(text).expect("valid range");
            assert_eq!(range.to_string(), text);
        }

        let range = SheetRange::parse("T3!A7:U80").unwrap();
        assert_eq!(range.sheet, "T3");
        assert_eq!(range.start, Some(CellRef::new(7, 1)));
        assert_eq!(range.end, Some(CellRef::new(80, 21)));
    }

    #[test]
    fn rejects_bad_descriptors() {
        for text in ["", "!A1", "T1!", "T1!A1:", "T1!B2:A1", "T1!A5:B4", "T1!1A"] {
            assert!(
                matches!(SheetRange::parse(text), Err(StoreError::InvalidRange(_))),
                "{text:?} should be rejected"
            );
        }
    }
}
