use serde::Serialize;

use crate::paste::{Row, Table};

/// Rows shown to the operator before a paste is saved.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Preview {
    /// First rows of the paste, padded to `width`
    pub rows: Vec<Row>,
    /// Widest row in the whole paste
    pub width: usize,
    /// Number of rows in the whole paste, not just the shown ones
    pub total_rows: usize,
    /// Cell count of the first row
    pub column_count: usize,
}

impl Preview {
    /// Build a preview of at most `limit` rows.
    ///
    /// Padding happens here rather than in the parser, so the table handed on
    /// to the store keeps its original shape.
    pub fn build(table: &Table, limit: usize) -> Self {
        let width = table.width();
        let rows = table.padded(width).into_iter().take(limit).collect();

        Preview {
            rows,
            width,
            total_rows: table.len(),
            column_count: table.rows().first().map(Vec::len).unwrap_or(0),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.total_rows == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::paste::parse;

    #[test]
    fn pads_and_limits_rows() {
        let table = parse("a\tb\nx\ty\tz\n1\n2\n3");
        let preview = Preview::build(&table, 2);

        assert_eq!(preview.total_rows, 5);
        assert_eq!(preview.column_count, 2);
        assert_eq!(preview.width, 3);
        assert_eq!(
            preview.rows,
            vec![vec!["a", "b", ""], vec!["x", "y", "z"]]
        );
    }

    #[test]
    fn empty_table_gives_empty_preview() {
        let preview = Preview::build(&parse("  \n"), 20);
        assert!(preview.is_empty());
        assert_eq!(preview.column_count, 0);
        assert!(preview.rows.is_empty());
    }
}
