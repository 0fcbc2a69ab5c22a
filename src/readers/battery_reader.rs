use crate::error::{ProcessingError, Result};
use crate::models::{AuxSeries, AuxiliaryBundle, LabeledTable, SkippedSource};
use crate::readers::metadata_reader::MetadataReader;
use crate::readers::source::SheetSource;
use crate::readers::table_parser::{FormatIssue, TableParser};
use crate::utils::constants::{ENERGY_BALANCE_SHEET, OUTAGE_FLAG_SUBTABLE};
use crate::utils::progress::ProgressReporter;
use rayon::prelude::*;
use std::collections::BTreeMap;
use tracing::{debug, info, warn};

/// Battery-analysis subtables keyed by (location, year).
#[derive(Debug, Clone, Default)]
pub struct OutageIndex {
    entries: BTreeMap<(u32, i32), AuxiliaryBundle>,
}

impl OutageIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores the bundle for (location, year), returning any bundle it replaced.
    pub fn insert(&mut self, location: u32, year: i32, bundle: AuxiliaryBundle) -> Option<AuxiliaryBundle> {
        self.entries.insert((location, year), bundle)
    }

    pub fn contains(&self, location: u32, year: i32) -> bool {
        self.entries.contains_key(&(location, year))
    }

    pub fn bundle(&self, location: u32, year: i32) -> Result<&AuxiliaryBundle> {
        self.entries.get(&(location, year)).ok_or_else(|| {
            ProcessingError::Lookup(format!(
                "No battery data for location {} in {}",
                location, year
            ))
        })
    }

    pub fn series(&self, location: u32, year: i32, name: &str) -> Result<&AuxSeries> {
        let bundle = self.bundle(location, year)?;
        bundle.get(name).ok_or_else(|| {
            ProcessingError::Lookup(format!(
                "Battery data for location {} in {} has no '{}' subtable",
                location, year, name
            ))
        })
    }

    pub fn outage_flags(&self, location: u32, year: i32) -> Result<&AuxSeries> {
        self.series(location, year, OUTAGE_FLAG_SUBTABLE)
    }

    pub fn keys(&self) -> impl Iterator<Item = (u32, i32)> + '_ {
        self.entries.keys().copied()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[derive(Debug, Clone)]
pub struct BatterySource {
    pub location: u32,
    pub year: i32,
    pub auxiliary: AuxiliaryBundle,
    pub issues: Vec<FormatIssue>,
}

#[derive(Debug, Default)]
pub struct OutageIndexOutcome {
    pub index: OutageIndex,
    pub skipped: Vec<SkippedSource>,
}

/// Builds the [`OutageIndex`] from battery-analysis sources.
pub struct BatteryReader {
    metadata_reader: MetadataReader,
    parser: TableParser,
}

impl BatteryReader {
    pub fn new() -> Self {
        Self {
            metadata_reader: MetadataReader::new(),
            parser: TableParser::new(),
        }
    }

    /// Reads the Meta sheet and the headerless Energy Balance sheet of one source.
    pub fn read_source<S: SheetSource + ?Sized>(&self, source: &S) -> Result<BatterySource> {
        let (location, metadata) = self.metadata_reader.extract(source)?;
        let sheet = source.read_sheet(ENERGY_BALANCE_SHEET)?;
        let (auxiliary, issues) = self.parser.parse_subtables(&LabeledTable::headerless(&sheet));

        Ok(BatterySource {
            location,
            year: metadata.year(),
            auxiliary,
            issues,
        })
    }

    /// Reads every source; unreadable sources are logged and skipped. When two
    /// sources share a (location, year), the later one in `sources` wins.
    pub fn build_index<S: SheetSource + Sync>(
        &self,
        sources: &[S],
        progress: Option<&ProgressReporter>,
    ) -> OutageIndexOutcome {
        info!("Extracting battery data from {} sources", sources.len());

        let results: Vec<(String, Result<BatterySource>)> = sources
            .par_iter()
            .map(|source| {
                let result = self.read_source(source);
                if let Some(p) = progress {
                    p.increment(1);
                }
                (source.name(), result)
            })
            .collect();

        let mut outcome = OutageIndexOutcome::default();
        for (name, result) in results {
            match result {
                Ok(battery) => {
                    for issue in &battery.issues {
                        warn!("{}: {}", name, issue.to_error());
                    }
                    debug!(
                        "Battery data for location {} in {} from {}",
                        battery.location, battery.year, name
                    );
                    if outcome
                        .index
                        .insert(battery.location, battery.year, battery.auxiliary)
                        .is_some()
                    {
                        warn!(
                            "Battery data for location {} in {} replaced by {}",
                            battery.location, battery.year, name
                        );
                    }
                }
                Err(e) => {
                    warn!("Skipping battery source {}: {}", name, e);
                    outcome.skipped.push(SkippedSource::new(name, &e));
                }
            }
        }

        info!(
            "Battery index holds {} location-years ({} sources skipped)",
            outcome.index.len(),
            outcome.skipped.len()
        );
        outcome
    }
}

impl Default for BatteryReader {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Cell, RawSheet};
    use crate::readers::source::MemorySource;

    fn battery_source(name: &str, location: i64, year: i32, flags: &[(i64, f64)]) -> MemorySource {
        let meta = RawSheet::new(vec![
            vec![Cell::Empty, Cell::from("Value")],
            vec![Cell::from(0i64), Cell::from(location)],
            vec![Cell::from(1i64), Cell::from(format!("{{'yr_start': {}}}", year).as_str())],
        ]);

        let mut label = vec![Cell::from("Outage Flag")];
        label.extend(flags.iter().map(|(d, _)| Cell::from(*d)));
        let mut data = vec![Cell::Empty];
        data.extend(flags.iter().map(|(_, f)| Cell::from(*f)));
        let balance = RawSheet::new(vec![
            vec![Cell::from("Energy Balance"), Cell::from("ignored")],
            label,
            data,
        ]);

        MemorySource::new(name)
            .with_sheet("Meta", meta)
            .with_sheet("Energy Balance", balance)
    }

    #[test]
    fn test_build_index() {
        let sources = vec![
            battery_source("a.xlsx", 5, 2021, &[(1, 0.0), (2, 1.0)]),
            battery_source("b.xlsx", 5, 2022, &[(1, 1.0)]),
        ];

        let outcome = BatteryReader::new().build_index(&sources, None);

        assert!(outcome.skipped.is_empty());
        assert_eq!(outcome.index.len(), 2);
        let flags = outcome.index.outage_flags(5, 2021).unwrap();
        assert_eq!(flags.lookup(2).unwrap(), Some(1.0));
        assert_eq!(outcome.index.keys().collect::<Vec<_>>(), vec![(5, 2021), (5, 2022)]);
    }

    #[test]
    fn test_missing_entries_are_lookup_errors() {
        let sources = vec![battery_source("a.xlsx", 5, 2021, &[(1, 0.0)])];
        let index = BatteryReader::new().build_index(&sources, None).index;

        assert!(matches!(index.outage_flags(5, 2022), Err(ProcessingError::Lookup(_))));
        assert!(matches!(index.outage_flags(6, 2021), Err(ProcessingError::Lookup(_))));
        assert!(matches!(
            index.series(5, 2021, "State of Charge"),
            Err(ProcessingError::Lookup(_))
        ));
    }

    #[test]
    fn test_later_duplicate_wins_and_bad_source_skipped() {
        let sources = vec![
            battery_source("a.xlsx", 5, 2021, &[(1, 0.0)]),
            MemorySource::new("broken.xlsx"),
            battery_source("c.xlsx", 5, 2021, &[(1, 1.0)]),
        ];

        let outcome = BatteryReader::new().build_index(&sources, None);

        assert_eq!(outcome.index.len(), 1);
        assert_eq!(outcome.index.outage_flags(5, 2021).unwrap().lookup(1).unwrap(), Some(1.0));
        assert_eq!(outcome.skipped.len(), 1);
        assert_eq!(outcome.skipped[0].source, "broken.xlsx");
    }
}
