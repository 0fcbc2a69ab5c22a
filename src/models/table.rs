use crate::error::{ProcessingError, Result};
use crate::models::calendar::{DayType, Season};
use crate::models::sample::{DailySample, DayKey};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// One spreadsheet cell as delivered by a sheet source.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Cell {
    #[default]
    Empty,
    Number(f64),
    Text(String),
}

impl Cell {
    pub fn is_empty(&self) -> bool {
        match self {
            Cell::Empty => true,
            Cell::Text(s) => s.trim().is_empty(),
            Cell::Number(_) => false,
        }
    }

    /// Numeric value of the cell; numeric text is accepted.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Cell::Number(n) => Some(*n),
            Cell::Text(s) => s.trim().parse::<f64>().ok(),
            Cell::Empty => None,
        }
    }

    /// Non-empty text content, trimmed.
    pub fn as_label(&self) -> Option<&str> {
        match self {
            Cell::Text(s) if !s.trim().is_empty() => Some(s.trim()),
            _ => None,
        }
    }

    /// Integer value of a number or numeric text with no fractional part.
    pub fn as_integer(&self) -> Option<i64> {
        let value = self.as_f64()?;
        if value.fract() == 0.0 && value.is_finite() {
            Some(value as i64)
        } else {
            None
        }
    }

    /// Day-of-year encoded by a column header, e.g. `32`, `"032"` or `"032 Tue"`.
    pub fn as_day_of_year(&self) -> Option<u16> {
        let day = match self {
            Cell::Number(_) => self.as_integer()?,
            Cell::Text(s) => s.split_whitespace().next()?.parse::<i64>().ok()?,
            Cell::Empty => return None,
        };
        if (1..=366).contains(&day) {
            Some(day as u16)
        } else {
            None
        }
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Cell::Empty => Ok(()),
            Cell::Number(n) => write!(f, "{}", n),
            Cell::Text(s) => f.write_str(s),
        }
    }
}

impl From<f64> for Cell {
    fn from(value: f64) -> Self {
        Cell::Number(value)
    }
}

impl From<i64> for Cell {
    fn from(value: i64) -> Self {
        Cell::Number(value as f64)
    }
}

impl From<&str> for Cell {
    fn from(value: &str) -> Self {
        if value.is_empty() {
            Cell::Empty
        } else {
            Cell::Text(value.to_string())
        }
    }
}

/// Unlabelled grid of cells, exactly as read from one sheet.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawSheet {
    rows: Vec<Vec<Cell>>,
}

impl RawSheet {
    pub fn new(rows: Vec<Vec<Cell>>) -> Self {
        Self { rows }
    }

    pub fn rows(&self) -> &[Vec<Cell>] {
        &self.rows
    }

    pub fn width(&self) -> usize {
        self.rows.iter().map(Vec::len).max().unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct LabeledRow {
    pub label: Cell,
    pub values: Vec<Cell>,
}

/// A sheet whose first column holds row labels.
#[derive(Debug, Clone, PartialEq)]
pub struct LabeledTable {
    pub columns: Vec<Cell>,
    pub rows: Vec<LabeledRow>,
}

impl LabeledTable {
    /// First row becomes the column header.
    pub fn with_header(sheet: &RawSheet) -> Self {
        let width = sheet.width().saturating_sub(1);
        let mut rows = sheet.rows().iter();

        let columns = rows
            .next()
            .map(|header| Self::pad(header.iter().skip(1).cloned().collect(), width))
            .unwrap_or_default();

        Self {
            columns,
            rows: rows.map(|row| Self::labeled_row(row, width)).collect(),
        }
    }

    /// Every row is data; columns are numbered from zero.
    pub fn headerless(sheet: &RawSheet) -> Self {
        let width = sheet.width().saturating_sub(1);

        Self {
            columns: (0..width).map(|i| Cell::Number(i as f64)).collect(),
            rows: sheet
                .rows()
                .iter()
                .map(|row| Self::labeled_row(row, width))
                .collect(),
        }
    }

    fn labeled_row(row: &[Cell], width: usize) -> LabeledRow {
        LabeledRow {
            label: row.first().cloned().unwrap_or_default(),
            values: Self::pad(row.iter().skip(1).cloned().collect(), width),
        }
    }

    fn pad(mut cells: Vec<Cell>, width: usize) -> Vec<Cell> {
        cells.resize(width, Cell::Empty);
        cells
    }

    pub fn row_by_label(&self, label: i64) -> Option<&LabeledRow> {
        self.rows
            .iter()
            .find(|row| row.label.as_integer() == Some(label))
    }
}

/// A named auxiliary series, one value per day-of-year.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct AuxSeries {
    pub name: String,
    pub values: BTreeMap<u16, Option<f64>>,
}

impl AuxSeries {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            values: BTreeMap::new(),
        }
    }

    pub fn with_values<I>(name: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = (u16, f64)>,
    {
        Self {
            name: name.into(),
            values: values.into_iter().map(|(d, v)| (d, Some(v))).collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Entry recorded for `day_of_year`; `None` when its cell is blank or not a number.
    pub fn lookup(&self, day_of_year: u16) -> Result<Option<f64>> {
        self.values.get(&day_of_year).copied().ok_or_else(|| {
            ProcessingError::Lookup(format!(
                "'{}' has no entry for day {}",
                self.name, day_of_year
            ))
        })
    }
}

/// Auxiliary subtables of one source, keyed by subtable name.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct AuxiliaryBundle {
    series: BTreeMap<String, AuxSeries>,
}

impl AuxiliaryBundle {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces any earlier series with the same name.
    pub fn insert(&mut self, series: AuxSeries) -> Option<AuxSeries> {
        self.series.insert(series.name.clone(), series)
    }

    pub fn get(&self, name: &str) -> Option<&AuxSeries> {
        self.series.get(name)
    }

    pub fn require(&self, name: &str) -> Result<&AuxSeries> {
        self.get(name)
            .ok_or_else(|| ProcessingError::Lookup(format!("Subtable '{}' not found", name)))
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.series.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.series.len()
    }

    pub fn is_empty(&self) -> bool {
        self.series.is_empty()
    }
}

/// Day columns and auxiliary subtables parsed from one location-year file.
#[derive(Debug, Clone)]
pub struct LocationYearTable {
    pub source: String,
    pub location: u32,
    pub year: i32,
    pub days: BTreeMap<DayKey, DailySample>,
    pub auxiliary: AuxiliaryBundle,
}

impl LocationYearTable {
    pub fn day_count(&self) -> usize {
        self.days.len()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MaskReason {
    TooManyMissing,
    TooManyZeros,
    Outage,
}

impl fmt::Display for MaskReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MaskReason::TooManyMissing => f.write_str("too many missing values"),
            MaskReason::TooManyZeros => f.write_str("too many zero readings"),
            MaskReason::Outage => f.write_str("outage"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CleanedDay {
    pub sample: DailySample,
    pub day_type: DayType,
    pub season: Season,
    /// Every rule that masked the day, in rule order. Empty when kept.
    pub mask_reasons: Vec<MaskReason>,
}

impl CleanedDay {
    pub fn is_masked(&self) -> bool {
        !self.mask_reasons.is_empty()
    }
}

/// Quality-filtered day columns of one location-year file.
#[derive(Debug, Clone)]
pub struct CleanedTable {
    pub source: String,
    pub location: u32,
    pub year: i32,
    pub days: BTreeMap<DayKey, CleanedDay>,
}

impl CleanedTable {
    pub fn kept_count(&self) -> usize {
        self.days.values().filter(|d| !d.is_masked()).count()
    }

    pub fn partition_by_day_type(&self) -> BTreeMap<DayType, Vec<(&DayKey, &DailySample)>> {
        let mut groups: BTreeMap<DayType, Vec<(&DayKey, &DailySample)>> = BTreeMap::new();
        for (key, day) in &self.days {
            groups.entry(day.day_type).or_default().push((key, &day.sample));
        }
        groups
    }

    pub fn partition_by_season(&self) -> BTreeMap<Season, Vec<(&DayKey, &DailySample)>> {
        let mut groups: BTreeMap<Season, Vec<(&DayKey, &DailySample)>> = BTreeMap::new();
        for (key, day) in &self.days {
            groups.entry(day.season).or_default().push((key, &day.sample));
        }
        groups
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cell_day_of_year() {
        assert_eq!(Cell::Number(32.0).as_day_of_year(), Some(32));
        assert_eq!(Cell::from("032 Tue").as_day_of_year(), Some(32));
        assert_eq!(Cell::from("1").as_day_of_year(), Some(1));
        assert_eq!(Cell::Number(32.5).as_day_of_year(), None);
        assert_eq!(Cell::Number(0.0).as_day_of_year(), None);
        assert_eq!(Cell::Number(367.0).as_day_of_year(), None);
        assert_eq!(Cell::from("Total").as_day_of_year(), None);
        assert_eq!(Cell::Empty.as_day_of_year(), None);
    }

    #[test]
    fn test_cell_numeric_text() {
        assert_eq!(Cell::from(" 12.5 ").as_f64(), Some(12.5));
        assert_eq!(Cell::from("n/a").as_f64(), None);
        assert_eq!(Cell::from("   ").as_label(), None);
        assert!(Cell::from("").is_empty());
    }

    #[test]
    fn test_labeled_table_with_header_pads_rows() {
        let sheet = RawSheet::new(vec![
            vec!["".into(), 1i64.into(), 2i64.into()],
            vec![0i64.into(), 1.5.into()],
        ]);
        let table = LabeledTable::with_header(&sheet);

        assert_eq!(table.columns, vec![Cell::Number(1.0), Cell::Number(2.0)]);
        assert_eq!(table.rows.len(), 1);
        assert_eq!(table.rows[0].values, vec![Cell::Number(1.5), Cell::Empty]);
    }

    #[test]
    fn test_labeled_table_headerless_numbers_columns() {
        let sheet = RawSheet::new(vec![
            vec!["Outage Flag".into(), 1i64.into(), 2i64.into()],
            vec![Cell::Empty, 0i64.into(), 1i64.into()],
        ]);
        let table = LabeledTable::headerless(&sheet);

        assert_eq!(table.columns, vec![Cell::Number(0.0), Cell::Number(1.0)]);
        assert_eq!(table.rows.len(), 2);
        assert_eq!(table.rows[0].label.as_label(), Some("Outage Flag"));
    }

    #[test]
    fn test_aux_series_lookup() {
        let mut series = AuxSeries::with_values("Outage Flag", [(1, 0.0), (2, 1.0)]);
        series.values.insert(3, None);

        assert_eq!(series.lookup(2).unwrap(), Some(1.0));
        assert_eq!(series.lookup(3).unwrap(), None);
        assert!(matches!(series.lookup(4), Err(ProcessingError::Lookup(_))));
    }

    #[test]
    fn test_bundle_require() {
        let mut bundle = AuxiliaryBundle::new();
        bundle.insert(AuxSeries::new("Outage Flag"));

        assert!(bundle.require("Outage Flag").is_ok());
        assert!(matches!(
            bundle.require("Number of Missing Values"),
            Err(ProcessingError::Lookup(_))
        ));
    }
}
