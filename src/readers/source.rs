use crate::error::{ProcessingError, Result};
use crate::models::{Cell, RawSheet};
use calamine::{open_workbook_auto, Data, Reader};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Anything that can hand out named sheets of cells.
pub trait SheetSource {
    /// Name used in logs and as the source identifier during aggregation.
    fn name(&self) -> String;

    fn read_sheet(&self, sheet: &str) -> Result<RawSheet>;
}

/// An `.xlsx` workbook on disk, read through calamine.
#[derive(Debug, Clone)]
pub struct WorkbookSource {
    path: PathBuf,
}

impl WorkbookSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn convert_cell(data: &Data) -> Cell {
        match data {
            Data::Empty => Cell::Empty,
            Data::Int(i) => Cell::Number(*i as f64),
            Data::Float(f) => Cell::Number(*f),
            Data::Bool(b) => Cell::Number(if *b { 1.0 } else { 0.0 }),
            Data::String(s) if s.trim().is_empty() => Cell::Empty,
            Data::String(s) => Cell::Text(s.clone()),
            other => Cell::Text(other.to_string()),
        }
    }
}

impl SheetSource for WorkbookSource {
    fn name(&self) -> String {
        self.path.display().to_string()
    }

    fn read_sheet(&self, sheet: &str) -> Result<RawSheet> {
        // Workbooks are opened per read; a source is only read a couple of times
        let mut workbook = open_workbook_auto(&self.path)?;

        if !workbook.sheet_names().iter().any(|name| name == sheet) {
            return Err(ProcessingError::SheetNotFound {
                source_name: self.name(),
                sheet: sheet.to_string(),
            });
        }

        let range = workbook.worksheet_range(sheet)?;

        // Keep column positions absolute so column A is always the row label
        let col_offset = range.start().map(|(_, col)| col as usize).unwrap_or(0);

        let rows: Vec<Vec<Cell>> = range
            .rows()
            .map(|row| {
                let mut cells = vec![Cell::Empty; col_offset];
                cells.extend(row.iter().map(Self::convert_cell));
                cells
            })
            .collect();

        debug!(
            "Read sheet '{}' from {}: {} rows",
            sheet,
            self.path.display(),
            rows.len()
        );

        Ok(RawSheet::new(rows))
    }
}

/// Sheets held in memory, keyed by sheet name.
#[derive(Debug, Clone, Default)]
pub struct MemorySource {
    name: String,
    sheets: HashMap<String, RawSheet>,
}

impl MemorySource {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            sheets: HashMap::new(),
        }
    }

    pub fn with_sheet(mut self, sheet: impl Into<String>, contents: RawSheet) -> Self {
        self.sheets.insert(sheet.into(), contents);
        self
    }
}

impl SheetSource for MemorySource {
    fn name(&self) -> String {
        self.name.clone()
    }

    fn read_sheet(&self, sheet: &str) -> Result<RawSheet> {
        self.sheets
            .get(sheet)
            .cloned()
            .ok_or_else(|| ProcessingError::SheetNotFound {
                source_name: self.name.clone(),
                sheet: sheet.to_string(),
            })
    }
}
