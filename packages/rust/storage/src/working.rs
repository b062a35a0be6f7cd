//! The working subset: a lookup table from dataset index to enrichment keys.

use std::path::Path;

use serde::Deserialize;
use tracing::debug;

use cardtrack_shared::{CardtrackError, Result};

/// One row of the working subset file. Extra columns in the file are ignored.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct WorkingRow {
    /// Index of the matching row in the dataset.
    #[serde(rename = "Index")]
    pub index: usize,
    #[serde(rename = "Expansion_code", default)]
    pub expansion_code: String,
    #[serde(rename = "Number_code", default)]
    pub number_code: String,
    #[serde(rename = "mkm_url", default)]
    pub mkm_url: String,
}

/// Read-only lookup over the working subset, kept in file order.
#[derive(Debug, Clone, Default)]
pub struct WorkingSubset {
    rows: Vec<WorkingRow>,
}

impl WorkingSubset {
    pub fn new(rows: Vec<WorkingRow>) -> Self {
        Self { rows }
    }

    /// Load the subset from a CSV file with at least `Index`, `Expansion_code`,
    /// `Number_code` and `mkm_url` columns.
    pub fn load(path: &Path) -> Result<Self> {
        let mut reader = csv::Reader::from_path(path)
            .map_err(|e| CardtrackError::Storage(format!("{}: {e}", path.display())))?;

        let mut rows = Vec::new();
        for row in reader.deserialize::<WorkingRow>() {
            rows.push(row.map_err(|e| CardtrackError::Storage(format!("{}: {e}", path.display())))?);
        }

        debug!(?path, rows = rows.len(), "working subset loaded");
        Ok(Self { rows })
    }

    /// First row carrying `index`.
    pub fn get(&self, index: usize) -> Option<&WorkingRow> {
        self.rows.iter().find(|r| r.index == index)
    }

    /// Like [`get`](Self::get), but a missing index is a lookup miss.
    pub fn lookup(&self, index: usize) -> Result<&WorkingRow> {
        self.get(index).ok_or(CardtrackError::LookupMiss { index })
    }

    /// All indices, in file order.
    pub fn indices(&self) -> Vec<usize> {
        self.rows.iter().map(|r| r.index).collect()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}
