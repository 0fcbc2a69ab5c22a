use crate::models::{
    CleanedTable, DailySample, ProfileColumn, ProfileGroup, ProfileKey, ProfileKind, ProfileTable,
    Resolution,
};
use crate::utils::constants::SAMPLES_PER_DAY;
use std::collections::BTreeMap;

/// Per-slot sums and counts of the non-missing readings of one source.
#[derive(Debug, Clone, PartialEq)]
struct SlotSums {
    sums: Vec<f64>,
    counts: Vec<u32>,
}

impl SlotSums {
    fn new() -> Self {
        Self {
            sums: vec![0.0; SAMPLES_PER_DAY],
            counts: vec![0; SAMPLES_PER_DAY],
        }
    }

    fn add(&mut self, sample: &DailySample) {
        for (slot, value) in sample.values().iter().enumerate() {
            if let Some(v) = value {
                self.sums[slot] += v;
                self.counts[slot] += 1;
            }
        }
    }
}

/// Accumulates one kind of profile across sources.
///
/// Partial sums are kept per source and only combined in `finish`, in key
/// then source order, so merging accumulators in any order gives the same
/// floating point result.
#[derive(Debug, Clone)]
pub struct ProfileAccumulator {
    kind: ProfileKind,
    partials: BTreeMap<ProfileKey, BTreeMap<String, SlotSums>>,
}

impl ProfileAccumulator {
    pub fn new(kind: ProfileKind) -> Self {
        Self {
            kind,
            partials: BTreeMap::new(),
        }
    }

    pub fn kind(&self) -> ProfileKind {
        self.kind
    }

    pub fn is_empty(&self) -> bool {
        self.partials.is_empty()
    }

    /// Folds the day samples of `source` belonging to `key`. A group whose
    /// days are all masked still produces a (fully missing) column.
    ///
    /// # Panics
    /// If `source` already contributed to `key`.
    pub fn add_group<'a, I>(&mut self, key: ProfileKey, source: &str, samples: I)
    where
        I: IntoIterator<Item = &'a DailySample>,
    {
        let mut sums = SlotSums::new();
        for sample in samples {
            sums.add(sample);
        }

        let previous = self
            .partials
            .entry(key)
            .or_default()
            .insert(source.to_string(), sums);
        assert!(
            previous.is_none(),
            "source {} folded twice into profile {}",
            source,
            key
        );
    }

    /// Column-wise union with another accumulator of the same kind.
    ///
    /// # Panics
    /// If the kinds differ or both hold the same (key, source) pair.
    pub fn merge(&mut self, other: ProfileAccumulator) {
        assert_eq!(self.kind, other.kind, "cannot merge different profile kinds");

        for (key, sources) in other.partials {
            let entry = self.partials.entry(key).or_default();
            for (source, sums) in sources {
                let previous = entry.insert(source.clone(), sums);
                assert!(
                    previous.is_none(),
                    "source {} present in both accumulators for profile {}",
                    source,
                    key
                );
            }
        }
    }

    /// Mean per slot over every contributing reading; `None` where no reading contributed.
    pub fn finish(&self) -> ProfileTable {
        let columns = self
            .partials
            .iter()
            .map(|(key, sources)| {
                let mut total = SlotSums::new();
                for sums in sources.values() {
                    for slot in 0..SAMPLES_PER_DAY {
                        total.sums[slot] += sums.sums[slot];
                        total.counts[slot] += sums.counts[slot];
                    }
                }

                let values = total
                    .sums
                    .iter()
                    .zip(&total.counts)
                    .map(|(sum, count)| (*count > 0).then(|| sum / f64::from(*count)))
                    .collect();

                ProfileColumn { key: *key, values }
            })
            .collect();

        ProfileTable::new(self.kind, Resolution::TenMinute, columns)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct AggregatedProfiles {
    pub overall: ProfileTable,
    pub weekday_weekend: ProfileTable,
    pub seasonal: ProfileTable,
}

impl AggregatedProfiles {
    pub fn tables(&self) -> [&ProfileTable; 3] {
        [&self.overall, &self.weekday_weekend, &self.seasonal]
    }

    pub fn to_hourly(&self, hour_offset: i32) -> AggregatedProfiles {
        let hourly = |table: &ProfileTable| table.to_hourly().shift_hours(hour_offset);
        AggregatedProfiles {
            overall: hourly(&self.overall),
            weekday_weekend: hourly(&self.weekday_weekend),
            seasonal: hourly(&self.seasonal),
        }
    }
}

/// The three load-profile accumulators, fed one cleaned table at a time.
#[derive(Debug, Clone)]
pub struct LoadProfileAggregator {
    overall: ProfileAccumulator,
    day_type: ProfileAccumulator,
    seasonal: ProfileAccumulator,
    sources: usize,
}

impl LoadProfileAggregator {
    pub fn new() -> Self {
        Self {
            overall: ProfileAccumulator::new(ProfileKind::Overall),
            day_type: ProfileAccumulator::new(ProfileKind::WeekdayWeekend),
            seasonal: ProfileAccumulator::new(ProfileKind::Seasonal),
            sources: 0,
        }
    }

    pub fn source_count(&self) -> usize {
        self.sources
    }

    pub fn fold(&mut self, table: &CleanedTable) {
        let key = |group| ProfileKey::new(table.location, table.year, group);

        self.overall.add_group(
            key(ProfileGroup::All),
            &table.source,
            table.days.values().map(|day| &day.sample),
        );

        for (day_type, days) in table.partition_by_day_type() {
            self.day_type.add_group(
                key(ProfileGroup::DayType(day_type)),
                &table.source,
                days.into_iter().map(|(_, sample)| sample),
            );
        }

        for (season, days) in table.partition_by_season() {
            self.seasonal.add_group(
                key(ProfileGroup::Season(season)),
                &table.source,
                days.into_iter().map(|(_, sample)| sample),
            );
        }

        self.sources += 1;
    }

    pub fn merge(mut self, other: LoadProfileAggregator) -> Self {
        self.overall.merge(other.overall);
        self.day_type.merge(other.day_type);
        self.seasonal.merge(other.seasonal);
        self.sources += other.sources;
        self
    }

    pub fn finish(&self) -> AggregatedProfiles {
        AggregatedProfiles {
            overall: self.overall.finish(),
            weekday_weekend: self.day_type.finish(),
            seasonal: self.seasonal.finish(),
        }
    }
}

impl Default for LoadProfileAggregator {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{CleanedDay, DayKey, DayType, MaskReason, Season};
    use pretty_assertions::assert_eq;

    fn cleaned_day(value: Option<f64>, day_type: DayType, season: Season) -> CleanedDay {
        let sample = match value {
            Some(v) => DailySample::from_values(&[v; SAMPLES_PER_DAY]).unwrap(),
            None => DailySample::masked(),
        };
        CleanedDay {
            mask_reasons: if value.is_none() {
                vec![MaskReason::TooManyMissing]
            } else {
                vec![]
            },
            sample,
            day_type,
            season,
        }
    }

    fn cleaned_table(source: &str, location: u32, year: i32, days: Vec<(u16, CleanedDay)>) -> CleanedTable {
        CleanedTable {
            source: source.to_string(),
            location,
            year,
            days: days
                .into_iter()
                .map(|(d, day)| (DayKey::new(location, year, d), day))
                .collect(),
        }
    }

    fn sample_table(source: &str, location: u32, year: i32, offset: f64) -> CleanedTable {
        cleaned_table(
            source,
            location,
            year,
            vec![
                (1, cleaned_day(Some(10.0 + offset), DayType::Weekday, Season::JanMar)),
                (2, cleaned_day(Some(20.0 + offset), DayType::Weekend, Season::JanMar)),
                (3, cleaned_day(None, DayType::Weekend, Season::JanMar)),
                (200, cleaned_day(Some(0.1 + offset), DayType::Weekday, Season::JulSep)),
            ],
        )
    }

    #[test]
    fn test_mean_excludes_masked_days() {
        let table = cleaned_table(
            "a",
            5,
            2021,
            vec![
                (1, cleaned_day(Some(10.0), DayType::Weekday, Season::JanMar)),
                (4, cleaned_day(Some(20.0), DayType::Weekday, Season::JanMar)),
                (5, cleaned_day(None, DayType::Weekday, Season::JanMar)),
            ],
        );

        let mut aggregator = LoadProfileAggregator::new();
        aggregator.fold(&table);
        let profiles = aggregator.finish();

        let column = profiles.overall.column(5, 2021, ProfileGroup::All).unwrap();
        assert_eq!(column.values.len(), SAMPLES_PER_DAY);
        assert!(column.values.iter().all(|v| *v == Some(15.0)));
    }

    #[test]
    fn test_all_masked_group_yields_missing_column() {
        let table = cleaned_table(
            "a",
            5,
            2021,
            vec![
                (2, cleaned_day(None, DayType::Weekend, Season::JanMar)),
                (4, cleaned_day(Some(8.0), DayType::Weekday, Season::JanMar)),
            ],
        );

        let mut aggregator = LoadProfileAggregator::new();
        aggregator.fold(&table);
        let profiles = aggregator.finish();

        let weekend = profiles
            .weekday_weekend
            .column(5, 2021, ProfileGroup::DayType(DayType::Weekend))
            .unwrap();
        assert!(weekend.values.iter().all(Option::is_none));
        let weekday = profiles
            .weekday_weekend
            .column(5, 2021, ProfileGroup::DayType(DayType::Weekday))
            .unwrap();
        assert_eq!(weekday.values[0], Some(8.0));

        // Seasons without any day column are not emitted
        assert_eq!(profiles.seasonal.column_count(), 1);
    }

    #[test]
    fn test_partitions() {
        let mut aggregator = LoadProfileAggregator::new();
        aggregator.fold(&sample_table("a", 5, 2021, 0.0));
        let profiles = aggregator.finish();

        assert_eq!(profiles.overall.column_count(), 1);
        assert_eq!(profiles.weekday_weekend.column_count(), 2);
        assert_eq!(profiles.seasonal.column_count(), 2);

        let weekday = profiles
            .weekday_weekend
            .column(5, 2021, ProfileGroup::DayType(DayType::Weekday))
            .unwrap();
        assert_eq!(weekday.values[0], Some((10.0 + 0.1) / 2.0));

        let winter = profiles
            .seasonal
            .column(5, 2021, ProfileGroup::Season(Season::JanMar))
            .unwrap();
        assert_eq!(winter.values[143], Some(15.0));

        let labels: Vec<String> = profiles.seasonal.columns.iter().map(|c| c.key.label()).collect();
        assert_eq!(labels, vec!["5_2021_Jan-Mar", "5_2021_Jul-Sep"]);
    }

    #[test]
    fn test_merge_order_is_irrelevant() {
        let tables = vec![
            sample_table("a", 5, 2021, 0.0),
            sample_table("b", 5, 2022, 0.3),
            sample_table("c", 6, 2021, 0.7),
            // Same location-year from a second source
            sample_table("d", 5, 2021, 0.11),
        ];

        let single = |table: &CleanedTable| {
            let mut aggregator = LoadProfileAggregator::new();
            aggregator.fold(table);
            aggregator
        };

        let forward = tables
            .iter()
            .map(single)
            .reduce(LoadProfileAggregator::merge)
            .unwrap()
            .finish();
        let backward = tables
            .iter()
            .rev()
            .map(single)
            .reduce(LoadProfileAggregator::merge)
            .unwrap()
            .finish();
        let nested = single(&tables[2])
            .merge(single(&tables[0]).merge(single(&tables[3])))
            .merge(single(&tables[1]))
            .finish();

        let bits = |profiles: &AggregatedProfiles| -> Vec<Option<u64>> {
            profiles
                .tables()
                .iter()
                .flat_map(|t| t.columns.iter())
                .flat_map(|c| c.values.iter().map(|v| v.map(f64::to_bits)))
                .collect()
        };

        assert_eq!(forward, backward);
        assert_eq!(bits(&forward), bits(&backward));
        assert_eq!(bits(&forward), bits(&nested));
        assert_eq!(forward.overall.column_count(), 3);
    }

    #[test]
    fn test_same_location_year_from_two_sources_is_pooled() {
        let a = cleaned_table(
            "a",
            5,
            2021,
            vec![(1, cleaned_day(Some(10.0), DayType::Weekday, Season::JanMar))],
        );
        let b = cleaned_table(
            "b",
            5,
            2021,
            vec![
                (1, cleaned_day(Some(20.0), DayType::Weekday, Season::JanMar)),
                (4, cleaned_day(Some(30.0), DayType::Weekday, Season::JanMar)),
            ],
        );

        let mut aggregator = LoadProfileAggregator::new();
        aggregator.fold(&a);
        aggregator.fold(&b);
        let profiles = aggregator.finish();

        let column = profiles.overall.column(5, 2021, ProfileGroup::All).unwrap();
        assert_eq!(column.values[0], Some(20.0));
        assert_eq!(aggregator.source_count(), 2);
    }

    #[test]
    #[should_panic(expected = "folded twice")]
    fn test_duplicate_source_panics() {
        let table = sample_table("a", 5, 2021, 0.0);
        let mut aggregator = LoadProfileAggregator::new();
        aggregator.fold(&table);
        aggregator.fold(&table);
    }

    #[test]
    fn test_hourly_profiles() {
        let mut aggregator = LoadProfileAggregator::new();
        aggregator.fold(&sample_table("a", 5, 2021, 0.0));
        let hourly = aggregator.finish().to_hourly(-6);

        for table in hourly.tables() {
            assert_eq!(table.row_count(), 24);
            assert!(table.columns.iter().all(|c| c.values.len() == 24));
        }
    }
}
