use crate::error::{ProcessingError, Result};
use crate::models::{
    AuxSeries, AuxiliaryBundle, Cell, DailySample, DayKey, LabeledRow, LabeledTable,
    LocationYearTable, SourceMetadata,
};
use crate::readers::source::SheetSource;
use crate::utils::constants::{DATA_SHEET, PRIMARY_TABLE_LABEL, SAMPLES_PER_DAY};
use std::collections::{BTreeMap, HashSet};
use tracing::debug;

/// A subtable dropped because its label row had no usable data row.
#[derive(Debug, Clone, PartialEq)]
pub struct FormatIssue {
    pub row: usize,
    pub label: String,
    pub reason: String,
}

impl FormatIssue {
    pub fn to_error(&self) -> ProcessingError {
        ProcessingError::Format(format!(
            "subtable '{}' at row {}: {}",
            self.label, self.row, self.reason
        ))
    }
}

#[derive(Debug, Clone)]
pub struct ParsedTable {
    pub days: Vec<(u16, DailySample)>,
    pub auxiliary: AuxiliaryBundle,
    pub issues: Vec<FormatIssue>,
}

/// Splits a labelled sheet into the 144-row power table and its auxiliary subtables.
pub struct TableParser {
    primary_label: String,
}

impl TableParser {
    pub fn new() -> Self {
        Self {
            primary_label: PRIMARY_TABLE_LABEL.to_string(),
        }
    }

    /// Reads the data sheet of `source` into a table keyed by (location, year, day).
    pub fn read_location_year<S: SheetSource + ?Sized>(
        &self,
        source: &S,
        location: u32,
        metadata: &SourceMetadata,
    ) -> Result<(LocationYearTable, Vec<FormatIssue>)> {
        let sheet = source.read_sheet(DATA_SHEET)?;
        let parsed = self.parse(&LabeledTable::with_header(&sheet))?;
        let year = metadata.year();

        let days: BTreeMap<DayKey, DailySample> = parsed
            .days
            .into_iter()
            .map(|(day, sample)| (DayKey::new(location, year, day), sample))
            .collect();

        let table = LocationYearTable {
            source: source.name(),
            location,
            year,
            days,
            auxiliary: parsed.auxiliary,
        };

        Ok((table, parsed.issues))
    }

    pub fn parse(&self, table: &LabeledTable) -> Result<ParsedTable> {
        let days = self.parse_primary(table)?;
        let (auxiliary, issues) = self.parse_subtables(table);

        Ok(ParsedTable {
            days,
            auxiliary,
            issues,
        })
    }

    /// Column-wise day samples from the first 144 rows.
    pub fn parse_primary(&self, table: &LabeledTable) -> Result<Vec<(u16, DailySample)>> {
        if table.rows.len() < SAMPLES_PER_DAY {
            return Err(ProcessingError::SampleLength {
                expected: SAMPLES_PER_DAY,
                actual: table.rows.len(),
            });
        }
        let primary_rows = &table.rows[..SAMPLES_PER_DAY];

        let mut seen = HashSet::new();
        let mut days = Vec::with_capacity(table.columns.len());

        for (column, header) in table.columns.iter().enumerate() {
            if header.is_empty() {
                if primary_rows.iter().all(|row| Self::cell_at(row, column).is_empty()) {
                    continue;
                }
                return Err(ProcessingError::Parse(format!(
                    "Column {} holds readings but has no day-of-year header",
                    column
                )));
            }

            let day = header.as_day_of_year().ok_or_else(|| {
                ProcessingError::Parse(format!("Invalid day-of-year column header: '{}'", header))
            })?;
            if !seen.insert(day) {
                return Err(ProcessingError::Parse(format!(
                    "Duplicate day-of-year column: {}",
                    day
                )));
            }

            let values = primary_rows
                .iter()
                .enumerate()
                .map(|(row, labeled)| Self::coerce(Self::cell_at(labeled, column), row, column))
                .collect::<Result<Vec<_>>>()?;

            days.push((day, DailySample::new(values)?));
        }

        Ok(days)
    }

    fn cell_at(row: &LabeledRow, column: usize) -> &Cell {
        static EMPTY: Cell = Cell::Empty;
        row.values.get(column).unwrap_or(&EMPTY)
    }

    fn coerce(cell: &Cell, row: usize, column: usize) -> Result<Option<f64>> {
        if cell.is_empty() {
            return Ok(None);
        }
        cell.as_f64().map(Some).ok_or_else(|| ProcessingError::CellType {
            row,
            column,
            value: cell.to_string(),
        })
    }

    /// Scans for label/data row pairs. A label row is any row whose label is
    /// text other than the primary table label; the row directly below it
    /// must be its data row.
    pub fn parse_subtables(&self, table: &LabeledTable) -> (AuxiliaryBundle, Vec<FormatIssue>) {
        let mut bundle = AuxiliaryBundle::new();
        let mut issues = Vec::new();
        let rows = &table.rows;

        let mut index = 0;
        while index < rows.len() {
            let Some(name) = self.subtable_label(&rows[index]) else {
                index += 1;
                continue;
            };

            match rows.get(index + 1) {
                None => {
                    issues.push(FormatIssue {
                        row: index,
                        label: name.to_string(),
                        reason: "label row is the last row".to_string(),
                    });
                    index += 1;
                }
                Some(next) if self.subtable_label(next).is_some() => {
                    issues.push(FormatIssue {
                        row: index,
                        label: name.to_string(),
                        reason: "label row is followed by another label row".to_string(),
                    });
                    index += 1;
                }
                Some(data) => {
                    let series = Self::pair_rows(name, &rows[index], data);
                    if bundle.insert(series).is_some() {
                        debug!("Subtable '{}' appears more than once; keeping the last", name);
                    }
                    index += 2;
                }
            }
        }

        for issue in &issues {
            debug!("Dropping {}", issue.to_error());
        }

        (bundle, issues)
    }

    fn subtable_label<'a>(&self, row: &'a LabeledRow) -> Option<&'a str> {
        row.label
            .as_label()
            .filter(|label| *label != self.primary_label)
    }

    fn pair_rows(name: &str, label_row: &LabeledRow, data_row: &LabeledRow) -> AuxSeries {
        let mut series = AuxSeries::new(name);
        for (id, value) in label_row.values.iter().zip(&data_row.values) {
            if let Some(day) = id.as_day_of_year() {
                series.values.insert(day, value.as_f64());
            }
        }
        series
    }
}

impl Default for TableParser {
    fn default() -> Self {
        Self::new()
    }
}
