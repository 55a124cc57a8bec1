use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};

lazy_static! {
    static ref SPACE_RUN_REGEX: Regex = Regex::new(r" {2,}").unwrap();
}

/// A single parsed line: ordered string cells.
pub type Row = Vec<String>;

/// Ordered rows produced by one [`parse`] call.
///
/// Rows keep whatever length their line produced. Padding is left to the
/// consumers that need a rectangle (preview rendering, sheet writes).
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Table {
    rows: Vec<Row>,
}

impl Table {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, row: Row) {
        self.rows.push(row);
    }

    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    pub fn into_rows(self) -> Vec<Row> {
        self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Length of the longest row, 0 for an empty table.
    pub fn width(&self) -> usize {
        self.rows.iter().map(Vec::len).max().unwrap_or(0)
    }

    /// Copy of the rows, each right-padded with empty cells to `width`.
    ///
    /// Rows longer than `width` are returned unchanged.
    pub fn padded(&self, width: usize) -> Vec<Row> {
        self.rows
            .iter()
            .map(|row| {
                let mut out = row.clone();
                if out.len() < width {
                    out.resize(width, String::new());
                }
                out
            })
            .collect()
    }
}

impl From<Vec<Row>> for Table {
    fn from(rows: Vec<Row>) -> Self {
        Table { rows }
    }
}

/// How a single pasted line is split into cells.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Delimiter {
    /// Spreadsheet copy/paste: cells separated by tab characters
    Tab,
    /// Two or more consecutive spaces (aligned text exports)
    SpaceRun,
    /// Comma separated, only when the line carries at least three commas
    Comma,
    /// Pipe separated
    Pipe,
    /// No delimiter recognised; the whole line is one cell
    None,
}

/// Pick the delimiter for one already-trimmed line.
///
/// The checks run in a fixed order and the first match wins:
/// tab, run of two or more spaces, comma (three or more), pipe, none.
/// A single space inside a value such as `Thức ăn A` never triggers a split,
/// and a line with only one or two commas is kept whole so free-text causes
/// are not cut apart.
///
/// # Examples
/// ```
/// use intake::paste::{detect_delimiter, Delimiter};
///
/// assert_eq!(detect_delimiter("a\tb"), Delimiter::Tab);
/// assert_eq!(detect_delimiter("a  b"), Delimiter::SpaceRun);
/// assert_eq!(detect_delimiter("a,b,c,d"), Delimiter::Comma);
/// assert_eq!(detect_delimiter("a,b"), Delimiter::None);
/// assert_eq!(detect_delimiter("a|b"), Delimiter::Pipe);
/// ```
pub fn detect_delimiter(line: &str) -> Delimiter {
    if line.contains('\t') {
        Delimiter::Tab
    } else if line.contains("  ") {
        Delimiter::SpaceRun
    } else if line.matches(',').count() >= 3 {
        Delimiter::Comma
    } else if line.contains('|') {
        Delimiter::Pipe
    } else {
        Delimiter::None
    }
}

/// Split one trimmed, non-empty line into cleaned cells.
pub fn split_line(line: &str) -> Row {
    let cells: Vec<&str> = match detect_delimiter(line) {
        Delimiter::Tab => line.split('\t').collect(),
        Delimiter::SpaceRun => SPACE_RUN_REGEX.split(line).collect(),
        Delimiter::Comma => line.split(',').collect(),
        Delimiter::Pipe => line.split('|').collect(),
        Delimiter::None => vec![line],
    };

    cells.into_iter().map(clean_cell).collect()
}

/// Trim a cell, then drop one surrounding pair of `"` and then one
/// surrounding pair of `'`.
///
/// Each quote style is stripped at most once: `""a""` becomes `"a"`.
pub fn clean_cell(cell: &str) -> String {
    let cell = cell.trim();
    let cell = strip_pair(cell, '"');
    let cell = strip_pair(cell, '\'');
    cell.to_string()
}

fn strip_pair(cell: &str, quote: char) -> &str {
    cell.strip_prefix(quote)
        .and_then(|rest| rest.strip_suffix(quote))
        .unwrap_or(cell)
}

/// Convert pasted spreadsheet text into a [`Table`]
///
/// Every non-blank line becomes one row. The delimiter is inferred per line
/// (see [`detect_delimiter`]), so a paste mixing formats yields rows of
/// different lengths. Cells are never converted to numbers or dates.
///
/// This function cannot fail: the worst case for unrecognised input is one
/// cell per line, and empty input gives an empty table.
///
/// # Arguments
/// * `raw_text` - Text exactly as pasted by the operator
///
/// # Returns
/// * `Table` - Rows in the order they appeared
///
/// # Examples
/// ```
/// use intake::paste::parse;
///
/// let table = parse("2025-01-23\t86C04510\tThức ăn A\n\n2025-01-24\t86C04511");
/// assert_eq!(table.len(), 2);
/// assert_eq!(table.rows()[0], vec!["2025-01-23", "86C04510", "Thức ăn A"]);
/// assert_eq!(table.rows()[1].len(), 2);
/// ```
pub fn parse(raw_text: &str) -> Table {
    let mut table = Table::new();

    if raw_text.trim().is_empty() {
        return table;
    }

    for line in raw_text.lines() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        table.push(split_line(line));
    }

    table
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rows(text: &str) -> Vec<Row> {
        parse(text).into_rows()
    }

    #[test]
    fn empty_and_blank_input_give_empty_table() {
        assert!(parse("").is_empty());
        assert!(parse("   \n  \n").is_empty());
        assert!(parse("\r\n\t\r\n").is_empty());
    }

    #[test]
    fn splits_on_tabs() {
        assert_eq!(rows("a\tb\tc"), vec![vec!["a", "b", "c"]]);
    }

    #[test]
    fn splits_on_space_runs_but_not_single_spaces() {
        assert_eq!(rows("a  b   c"), vec![vec!["a", "b", "c"]]);
        assert_eq!(rows("Thức ăn A"), vec![vec!["Thức ăn A"]]);
        assert_eq!(
            rows("86C04510 L1   Thức ăn Bổ Sung  16:42:00"),
            vec![vec!["86C04510 L1", "Thức ăn Bổ Sung", "16:42:00"]]
        );
    }

    #[test]
    fn comma_split_needs_three_commas() {
        assert_eq!(rows("a,b,c,d"), vec![vec!["a", "b", "c", "d"]]);
        assert_eq!(rows("a,b"), vec![vec!["a,b"]]);
        assert_eq!(rows("a,b,c"), vec![vec!["a,b,c"]]);
    }

    #[test]
    fn pipe_is_used_when_commas_are_too_few() {
        assert_eq!(rows("a, b|c"), vec![vec!["a, b", "c"]]);
        assert_eq!(rows("x | y | z"), vec![vec!["x", "y", "z"]]);
    }

    #[test]
    fn precedence_prefers_tab_over_everything() {
        assert_eq!(
            rows("a,b,c,d\tx  y|z"),
            vec![vec!["a,b,c,d", "x  y|z"]]
        );
        assert_eq!(rows("a,b,c,d  e"), vec![vec!["a,b,c,d", "e"]]);
    }

    #[test]
    fn strips_quotes_after_split() {
        assert_eq!(rows("\"a\"\t'b'\tc"), vec![vec!["a", "b", "c"]]);
        assert_eq!(rows("  'x'  "), vec![vec!["x"]]);
        // the inner double space wins over the quotes
        assert_eq!(rows("\"a  b\""), vec![vec!["\"a", "b\""]]);
    }

    #[test]
    fn quote_stripping_is_not_recursive() {
        assert_eq!(clean_cell("\"\"a\"\""), "\"a\"");
        assert_eq!(clean_cell("''a''"), "'a'");
        assert_eq!(clean_cell("\"'a'\""), "a");
        assert_eq!(clean_cell("'\"a\"'"), "\"a\"");
        assert_eq!(clean_cell("\""), "\"");
        assert_eq!(clean_cell("\"open"), "\"open");
    }

    #[test]
    fn keeps_empty_interior_cells() {
        assert_eq!(rows("a\t\tb"), vec![vec!["a", "", "b"]]);
    }

    #[test]
    fn delimiter_only_line_gives_empty_cells() {
        assert_eq!(rows(",,,"), vec![vec!["", "", "", ""]]);
        assert_eq!(rows("|"), vec![vec!["", ""]]);
    }

    #[test]
    fn lone_tab_line_is_whitespace_and_dropped() {
        assert_eq!(rows("a\n\t\nb"), vec![vec!["a"], vec!["b"]]);
    }

    #[test]
    fn blank_lines_are_dropped_and_order_kept() {
        assert_eq!(rows("row1\n\nrow2"), vec![vec!["row1"], vec!["row2"]]);
        assert_eq!(rows("row1\r\n   \r\nrow2\r\n"), vec![vec!["row1"], vec!["row2"]]);
    }

    #[test]
    fn ragged_rows_are_preserved() {
        let table = parse("a\tb\nx\ty\tz");
        let lengths: Vec<usize> = table.rows().iter().map(Vec::len).collect();
        assert_eq!(lengths, vec![2, 3]);
        assert_eq!(table.width(), 3);
    }

    #[test]
    fn mixed_delimiters_resolve_per_line() {
        let table = parse("a\tb\nc,d,e,f\ng|h\nplain text");
        assert_eq!(
            table.into_rows(),
            vec![
                vec!["a", "b"],
                vec!["c", "d", "e", "f"],
                vec!["g", "h"],
                vec!["plain text"],
            ]
        );
    }

    #[test]
    fn parse_is_deterministic() {
        let text = "2025-01-01\t86C04510\t\"Thức ăn A\"\n\n1,2,3,4\n";
        assert_eq!(parse(text), parse(text));
    }

    #[test]
    fn padded_fills_short_rows_only() {
        let table = parse("a\tb\nx\ty\tz");
        assert_eq!(
            table.padded(3),
            vec![vec!["a", "b", ""], vec!["x", "y", "z"]]
        );
        // parser output itself stays ragged
        assert_eq!(table.rows()[0].len(), 2);
    }
}
