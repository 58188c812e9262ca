//! Workbook discovery.
//!
//! A project file is either a single CSV export or a directory standing in
//! for a multi-sheet workbook, one CSV file per sheet.

use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{IngestError, Result};

/// A source file and the CSV sheets it contributes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Workbook {
    pub path: PathBuf,
    /// Sheet files, sorted by name. A plain CSV file is its own only sheet.
    pub sheets: Vec<PathBuf>,
}

impl Workbook {
    /// Opens `path` as a workbook.
    pub fn open(path: &Path) -> Result<Self> {
        let sheets = if path.is_dir() {
            list_csv_files(path)?
        } else {
            vec![path.to_path_buf()]
        };
        Ok(Self {
            path: path.to_path_buf(),
            sheets,
        })
    }

    pub fn is_multi_sheet(&self) -> bool {
        self.path.is_dir()
    }

    /// Sheet names: file stems of the sheet files.
    pub fn sheet_names(&self) -> impl Iterator<Item = &str> {
        self.sheets
            .iter()
            .filter_map(|sheet| sheet.file_stem().and_then(|s| s.to_str()))
    }
}

fn is_csv(path: &Path) -> bool {
    path.is_file()
        && path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case("csv"))
}

/// CSV files directly inside `dir`, sorted by path.
pub fn list_csv_files(dir: &Path) -> Result<Vec<PathBuf>> {
    if !dir.is_dir() {
        return Err(IngestError::DirectoryNotFound {
            path: dir.to_path_buf(),
        });
    }
    let read_error = |source| IngestError::DirectoryRead {
        path: dir.to_path_buf(),
        source,
    };
    let mut files = fs::read_dir(dir)
        .map_err(read_error)?
        .map(|entry| entry.map(|e| e.path()).map_err(read_error))
        .filter(|path| path.as_ref().map_or(true, |p| is_csv(p)))
        .collect::<Result<Vec<_>>>()?;
    files.sort();
    Ok(files)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn directory_sheets_are_sorted_csv_files() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["b.csv", "A.CSV", "notes.txt"] {
            fs::write(dir.path().join(name), "Id\n").unwrap();
        }
        fs::create_dir(dir.path().join("nested.csv")).unwrap();

        let workbook = Workbook::open(dir.path()).unwrap();
        assert!(workbook.is_multi_sheet());
        let names: Vec<_> = workbook.sheet_names().collect();
        assert_eq!(names, ["A", "b"]);
    }

    #[test]
    fn missing_directory_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("missing");
        assert!(matches!(
            list_csv_files(&missing),
            Err(IngestError::DirectoryNotFound { .. })
        ));
    }
}
