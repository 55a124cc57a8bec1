use bincode::{deserialize_from, serialize_into};
use flate2::Compression;
use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use log::{info, warn};
use std::fs::{self, File};
use std::io::{BufReader, BufWriter, ErrorKind, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

use crate::paste::Table;
use crate::range::SheetRange;
use crate::store::{SheetStore, StoreError, Workbook};

/// Write a workbook as gzip-compressed bincode.
///
/// The data goes to a temporary file next to `path` that is renamed over the
/// target once complete, so a crash never leaves a half-written workbook.
pub fn save_workbook(workbook: &Workbook, path: &Path) -> Result<(), StoreError> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    fs::create_dir_all(dir)?;

    let mut tmp = NamedTempFile::new_in(dir)?;
    {
        let writer = BufWriter::new(tmp.as_file_mut());
        let mut encoder = GzEncoder::new(writer, Compression::default());
        serialize_into(&mut encoder, workbook)?;
        encoder.finish()?.flush()?;
    }
    tmp.persist(path).map_err(|e| e.error)?;

    Ok(())
}

pub fn load_workbook(path: &Path) -> Result<Workbook, StoreError> {
    let file = File::open(path)?;
    let decoder = GzDecoder::new(file);
    let mut reader = BufReader::new(decoder);

    let workbook: Workbook = deserialize_from(&mut reader)?;
    Ok(workbook)
}

/// Workbook kept on disk; every change is saved before the call returns.
#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    workbook: Workbook,
    fresh: bool,
}

impl FileStore {
    /// Open the workbook at `path`, creating it when the file does not exist.
    ///
    /// Any of `sheets` missing from the stored workbook are added, so a
    /// config listing more months than an older file still works.
    ///
    /// # Arguments
    /// * `path` - Location of the `.bin.gz` workbook
    /// * `sheets` - Worksheet names that must exist
    ///
    /// # Returns
    /// * `Result<FileStore, StoreError>` - The opened store or an I/O/decoding error
    pub fn open<S: AsRef<str>>(path: impl Into<PathBuf>, sheets: &[S]) -> Result<Self, StoreError> {
        let path = path.into();

        let (mut workbook, fresh) = match load_workbook(&path) {
            Ok(workbook) => {
                info!("Loaded workbook from {:?}", path);
                (workbook, false)
            }
            Err(StoreError::Io(e)) if e.kind() == ErrorKind::NotFound => {
                info!("No workbook at {:?}, creating a new one", path);
                (Workbook::default(), true)
            }
            Err(e) => return Err(e),
        };

        let mut added = false;
        for name in sheets {
            if workbook.ensure_sheet(name.as_ref()) {
                added = true;
                if !fresh {
                    warn!("Workbook {:?} had no sheet {}, added it", path, name.as_ref());
                }
            }
        }

        let store = FileStore {
            path,
            workbook,
            fresh,
        };
        if added {
            save_workbook(&store.workbook, &store.path)?;
        }
        Ok(store)
    }

    /// True when `open` had to create the workbook file.
    pub fn is_fresh(&self) -> bool {
        self.fresh
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    // apply to a copy and keep it only once it is on disk
    fn commit<F>(&mut self, change: F) -> Result<(), StoreError>
    where
        F: FnOnce(&mut Workbook) -> Result<(), StoreError>,
    {
        let mut next = self.workbook.clone();
        change(&mut next)?;
        save_workbook(&next, &self.path)?;
        self.workbook = next;
        Ok(())
    }
}

impl SheetStore for FileStore {
    fn sheet_names(&self) -> Vec<String> {
        self.workbook.sheet_names()
    }

    fn read(&self, range: &SheetRange) -> Result<Table, StoreError> {
        self.workbook.read(range)
    }

    fn write(&mut self, range: &SheetRange, table: &Table) -> Result<(), StoreError> {
        self.commit(|book| book.write(range, table))
    }

    fn clear(&mut self, range: &SheetRange) -> Result<(), StoreError> {
        self.commit(|book| book.clear(range))
    }

    fn replace(
        &mut self,
        cleared: &SheetRange,
        range: &SheetRange,
        table: &Table,
    ) -> Result<(), StoreError> {
        self.commit(|book| book.replace(cleared, range, table))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::paste::parse;
    use crate::store::save_paste;

    #[test]
    fn creates_missing_file_with_sheets() {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = dir.path().join("nested").join("intake.bin.gz");

        let store = FileStore::open(&path, &["T1", "T2"]).expect("open store");
        assert!(store.is_fresh());
        assert!(path.exists());
        assert_eq!(store.sheet_names(), vec!["T1", "T2"]);
    }

    #[test]
    fn changes_survive_reopen() {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = dir.path().join("intake.bin.gz");

        let mut store = FileStore::open(&path, &["T1"]).unwrap();
        let range = SheetRange::parse("T1!A7").unwrap();
        store.write(&range, &parse("2025-01-01\t86C04510\nx")).unwrap();

        let reopened = FileStore::open(&path, &["T1", "T2"]).unwrap();
        assert!(!reopened.is_fresh());
        assert_eq!(reopened.sheet_names(), vec!["T1", "T2"]);
        assert_eq!(
            reopened.read(&range).unwrap().into_rows(),
            vec![vec!["2025-01-01", "86C04510"], vec!["x", ""]]
        );
    }

    #[test]
    fn corrupt_file_is_an_error() {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = dir.path().join("broken.bin.gz");
        fs::write(&path, b"not a workbook").unwrap();

        assert!(FileStore::open(&path, &["T1"]).is_err());
    }

    #[test]
    fn failed_save_leaves_store_unchanged() {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = dir.path().join("intake.bin.gz");
        let mut store = FileStore::open(&path, &["T1"]).unwrap();
        save_paste(&mut store, "T1", 7, &parse("1\tA\n2\tB")).unwrap();

        // a regular file where the workbook's directory should be
        let blocker = dir.path().join("blocker");
        fs::write(&blocker, b"file").unwrap();
        store.path = blocker.join("intake.bin.gz");

        let range = SheetRange::parse("T1!A7").unwrap();
        assert!(save_paste(&mut store, "T1", 7, &parse("9\tZ")).is_err());
        assert!(store.clear(&range).is_err());
        assert!(store.write(&range, &parse("x")).is_err());

        let expected = vec![vec!["1", "A"], vec!["2", "B"]];
        assert_eq!(store.read(&range).unwrap().into_rows(), expected);
        let on_disk = FileStore::open(&path, &["T1"]).unwrap();
        assert_eq!(on_disk.read(&range).unwrap().into_rows(), expected);
    }
}
