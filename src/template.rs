use log::info;

use crate::paste::{Row, Table};
use crate::range::{CellRef, SheetRange};
use crate::store::{SheetStore, StoreError, save_paste};

/// Header row of a monthly intake sheet, in column order.
pub const HEADERS: [&str; 11] = [
    "Ngày/tháng",
    "Số Xe",
    "Tên nguyên liệu",
    "Xe cân VÀO",
    "Xe cân RA",
    "Tổng thời gian",
    "Số lượng",
    "Bag.",
    "Net.Wgh. (kg)",
    "Nguyên nhân",
    "Lí do chi tiết",
];

const DEMO_ROWS: [[&str; 11]; 4] = [
    ["2025-01-01", "86C04510", "Thức ăn A", "08:00:00", "08:45:00", "00:45:00", "5.0", "", "4000", "Đúng giờ", ""],
    ["2025-01-02", "86C04511", "Thức ăn B", "09:30:00", "10:15:00", "00:45:00", "6.0", "", "4500", "Xếp hàng", ""],
    ["2025-01-03", "86C04512", "Thức ăn C", "10:15:00", "11:00:00", "00:45:00", "4.5", "", "3500", "Thời tiết", ""],
    ["2025-01-23", "86C04510 L1", "Thức ăn Bổ Sung", "16:42:00", "17:04:00", "00:22:00", "5.0", "", "4000.0", "Xếp hàng", "Chờ cân"],
];

/// Sample intake rows used to populate a brand-new store.
pub fn demo_table() -> Table {
    let rows: Vec<Row> = DEMO_ROWS
        .iter()
        .map(|row| row.iter().map(|cell| cell.to_string()).collect())
        .collect();
    Table::from(rows)
}

/// Put the header row directly above `start_row` on every sheet.
///
/// Sheets whose data starts on row 1 have no room for a header and are left
/// alone.
pub fn write_headers(store: &mut dyn SheetStore, start_row: u32) -> Result<(), StoreError> {
    if start_row < 2 {
        return Ok(());
    }

    let header = Table::from(vec![HEADERS.iter().map(|h| h.to_string()).collect()]);
    for sheet in store.sheet_names() {
        store.write(
            &SheetRange::anchored(sheet, CellRef::new(start_row - 1, 1)),
            &header,
        )?;
    }
    Ok(())
}

/// Lay out a freshly created store: headers everywhere, and the demo rows in
/// `demo_sheet` when given.
pub fn initialise(
    store: &mut dyn SheetStore,
    start_row: u32,
    demo_sheet: Option<&str>,
) -> Result<(), StoreError> {
    write_headers(store, start_row)?;
    if let Some(sheet) = demo_sheet {
        let rows = save_paste(store, sheet, start_row, &demo_table())?;
        info!("Seeded {} demo rows into {}", rows, sheet);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::Workbook;

    #[test]
    fn initialise_writes_headers_and_demo_rows() {
        let mut book = Workbook::with_sheets(&["T1", "T2"]);
        initialise(&mut book, 7, Some("T1")).unwrap();

        let t1 = book.read(&SheetRange::parse("T1!A6").unwrap()).unwrap();
        assert_eq!(t1.len(), 5);
        assert_eq!(t1.rows()[0][0], "Ngày/tháng");
        assert_eq!(t1.rows()[1][1], "86C04510");

        let t2 = book.read(&SheetRange::parse("T2!A6").unwrap()).unwrap();
        assert_eq!(t2.len(), 1);
        assert_eq!(t2.rows()[0].len(), HEADERS.len());
    }

    #[test]
    fn no_header_room_on_first_row() {
        let mut book = Workbook::with_sheets(&["T1"]);
        write_headers(&mut book, 1).unwrap();
        assert!(book.read(&SheetRange::sheet("T1")).unwrap().is_empty());
    }
}
