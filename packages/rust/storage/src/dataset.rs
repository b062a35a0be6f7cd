//! The persisted, append-only dataset and its CSV store.

use std::fs;
use std::ops::Range;
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use cardtrack_shared::{BASE_COLUMNS, CardtrackError, Record, Result};

// ---------------------------------------------------------------------------
// Dataset
// ---------------------------------------------------------------------------

/// An ordered table of string cells with a fixed header.
///
/// Rows are only ever appended; a row's position is its index and is never
/// reassigned. Every row has exactly `header.len()` cells.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dataset {
    header: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl Dataset {
    /// An empty dataset with the base record columns.
    pub fn new() -> Self {
        Self::with_columns(&BASE_COLUMNS)
    }

    /// An empty dataset with the given header.
    pub fn with_columns(columns: &[&str]) -> Self {
        Self {
            header: columns.iter().map(|c| c.to_string()).collect(),
            rows: Vec::new(),
        }
    }

    /// Build a dataset from a header and rows, rejecting rows wider than the
    /// header and padding narrower ones with empty cells.
    pub fn from_parts(header: Vec<String>, rows: Vec<Vec<String>>) -> Result<Self> {
        let width = header.len();
        let mut aligned = Vec::with_capacity(rows.len());
        for (i, mut row) in rows.into_iter().enumerate() {
            if row.len() > width {
                return Err(CardtrackError::validation(format!(
                    "row {i} has {} cells but the header has {width} columns",
                    row.len()
                )));
            }
            row.resize(width, String::new());
            aligned.push(row);
        }
        Ok(Self {
            header,
            rows: aligned,
        })
    }

    pub fn header(&self) -> &[String] {
        &self.header
    }

    pub fn rows(&self) -> &[Vec<String>] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Position of `column` in the header.
    pub fn column_index(&self, column: &str) -> Option<usize> {
        self.header.iter().position(|h| h == column)
    }

    /// Cell at (`index`, `column`), if both exist.
    pub fn get(&self, index: usize, column: &str) -> Option<&str> {
        let col = self.column_index(column)?;
        self.rows.get(index).map(|row| row[col].as_str())
    }

    /// Indices of rows whose `column` cell is non-empty.
    pub fn filled_indices(&self, column: &str) -> Vec<usize> {
        let Some(col) = self.column_index(column) else {
            return Vec::new();
        };
        self.rows
            .iter()
            .enumerate()
            .filter(|(_, row)| !row[col].trim().is_empty())
            .map(|(i, _)| i)
            .collect()
    }

    /// Append records after the existing rows and return the indices they received.
    ///
    /// The header must already contain every base record column. Columns the
    /// records do not carry (enrichment columns) are left empty.
    pub fn append(&mut self, records: &[Record]) -> Result<Range<usize>> {
        let missing: Vec<&str> = BASE_COLUMNS
            .iter()
            .copied()
            .filter(|c| self.column_index(c).is_none())
            .collect();
        if !missing.is_empty() {
            return Err(CardtrackError::validation(format!(
                "dataset header is missing record columns: {}",
                missing.join(", ")
            )));
        }

        let start = self.rows.len();
        self.rows
            .extend(records.iter().map(|r| r.to_row(&self.header)));
        Ok(start..self.rows.len())
    }

    /// Add a column filled with `default`. Does nothing if it already exists.
    pub fn add_column(&mut self, name: &str, default: &str) {
        if self.column_index(name).is_some() {
            return;
        }
        self.header.push(name.to_string());
        for row in &mut self.rows {
            row.push(default.to_string());
        }
    }

    /// Overwrite the given cells of row `index`, adding unknown columns first.
    ///
    /// The row is left untouched if `index` is out of range.
    pub fn patch(&mut self, index: usize, fields: &[(&str, String)]) -> Result<()> {
        if index >= self.rows.len() {
            return Err(CardtrackError::validation(format!(
                "index {index} is out of range for a dataset of {} rows",
                self.rows.len()
            )));
        }
        for (column, _) in fields {
            self.add_column(column, "");
        }
        for (column, value) in fields {
            if let Some(col) = self.column_index(column) {
                self.rows[index][col] = value.clone();
            }
        }
        Ok(())
    }

    /// A copy restricted to `columns`, in that order.
    pub fn select_columns(&self, columns: &[&str]) -> Result<Self> {
        let positions = columns
            .iter()
            .map(|c| {
                self.column_index(c)
                    .ok_or_else(|| CardtrackError::validation(format!("unknown column '{c}'")))
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            header: columns.iter().map(|c| c.to_string()).collect(),
            rows: self
                .rows
                .iter()
                .map(|row| positions.iter().map(|&p| row[p].clone()).collect())
                .collect(),
        })
    }
}

impl Default for Dataset {
    fn default() -> Self {
        Self::new()
    }
}

// ---------------------------------------------------------------------------
// DatasetStore
// ---------------------------------------------------------------------------

/// File-backed persistence for a [`Dataset`].
///
/// `save` always rewrites the whole file. It writes a sibling temporary file
/// and renames it into place, so an interrupted save leaves the previous
/// version on disk.
#[derive(Debug, Clone)]
pub struct DatasetStore {
    path: PathBuf,
}

impl DatasetStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the dataset. A missing or empty file loads as an empty base dataset.
    pub fn load(&self) -> Result<Dataset> {
        if !self.path.exists() {
            debug!(path = ?self.path, "dataset file not found, starting empty");
            return Ok(Dataset::new());
        }

        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .from_path(&self.path)
            .map_err(|e| self.storage_error(e))?;

        let header: Vec<String> = reader
            .headers()
            .map_err(|e| self.storage_error(e))?
            .iter()
            .map(String::from)
            .collect();

        if header.iter().all(|h| h.is_empty()) {
            debug!(path = ?self.path, "dataset file is empty, starting empty");
            return Ok(Dataset::new());
        }

        let mut rows = Vec::new();
        for record in reader.records() {
            let record = record.map_err(|e| self.storage_error(e))?;
            rows.push(record.iter().map(String::from).collect());
        }

        let dataset = Dataset::from_parts(header, rows)?;
        debug!(path = ?self.path, rows = dataset.len(), "dataset loaded");
        Ok(dataset)
    }

    /// Overwrite the persisted file with `dataset`.
    pub fn save(&self, dataset: &Dataset) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).map_err(|e| CardtrackError::io(parent, e))?;
            }
        }

        let tmp = self.tmp_path();
        let written = self.write_csv(&tmp, dataset);
        if let Err(e) = written {
            let _ = fs::remove_file(&tmp);
            return Err(e);
        }
        fs::rename(&tmp, &self.path).map_err(|e| CardtrackError::io(&self.path, e))?;

        info!(path = ?self.path, rows = dataset.len(), columns = dataset.header().len(), "dataset saved");
        Ok(())
    }

    /// Write a header-only dataset. Refuses to replace an existing file unless `force`.
    pub fn create_empty(&self, columns: &[&str], force: bool) -> Result<Dataset> {
        if self.path.exists() && !force {
            return Err(CardtrackError::validation(format!(
                "{} already exists (use --force to overwrite)",
                self.path.display()
            )));
        }
        let dataset = Dataset::with_columns(columns);
        self.save(&dataset)?;
        Ok(dataset)
    }

    fn write_csv(&self, target: &Path, dataset: &Dataset) -> Result<()> {
        let mut writer = csv::Writer::from_path(target).map_err(|e| self.storage_error(e))?;
        writer
            .write_record(dataset.header())
            .map_err(|e| self.storage_error(e))?;
        for row in dataset.rows() {
            writer.write_record(row).map_err(|e| self.storage_error(e))?;
        }
        writer.flush().map_err(|e| CardtrackError::io(target, e))
    }

    fn tmp_path(&self) -> PathBuf {
        let name = self
            .path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "dataset.csv".into());
        self.path.with_file_name(format!(".{name}.tmp"))
    }

    fn storage_error(&self, e: csv::Error) -> CardtrackError {
        CardtrackError::Storage(format!("{}: {e}", self.path.display()))
    }
}
