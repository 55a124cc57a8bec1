/*!
# Warehouse Intake Dashboard

Tracks truck intake at a raw-material warehouse: operators paste rows copied
from the monthly Excel report, the rows are stored in a spreadsheet-style
workbook (one worksheet per month, `T1` to `T12`), and reports summarise how
many trucks arrived, how many weighed out after 17:00, which ones took longer
than two hours, and why.

## Architecture

### Ingestion
- **paste**: turns pasted text into rows. The delimiter is guessed per line
  (tab, runs of spaces, comma, pipe) and cells are trimmed and unquoted.
  Parsing never fails and never pads rows.
- **preview**: pads and truncates a parsed table for display.

### Storage
- **range**: A1-style cell and range descriptors (`T1!A7:U80`)
- **store**: the `SheetStore` read/write/clear boundary and the in-memory
  `Workbook`
- **saving**: `FileStore`, a workbook persisted as gzip-compressed bincode
- **template**: sheet header row and demo data for a new workbook

### Reporting
- **report**: header detection, known columns, late/slow counts, weight
  totals and the cause-of-delay breakdown

### Web layer (`web` feature)
- **app**: axum routes for preview, save and report, plus the dashboard page

## REST API Endpoints

- `GET /api/months` - Month labels and their worksheets
- `POST /api/preview` - Parse pasted text and return a padded preview
- `POST /api/save` - Parse pasted text and store it in the month's sheet
- `GET /api/report?month=...` - Stored rows and summary for a month
- `GET /api/status` - Application name, version and worksheets
*/

#[cfg(feature = "web")]
pub mod app;
pub mod config;
pub mod paste;
pub mod preview;
pub mod range;
pub mod report;
pub mod saving;
pub mod store;
pub mod template;

pub use config::{AppConfig, ConfigError};
pub use paste::{Row, Table, parse};
pub use preview::Preview;
pub use range::{CellRef, SheetRange};
pub use report::{Frame, ReportRules, Summary};
pub use saving::FileStore;
pub use store::{SheetStore, StoreError, Workbook, save_paste};
