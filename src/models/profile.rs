use crate::models::calendar::{DayType, Season};
use crate::utils::constants::{
    HOURLY_INDEX_LABEL, HOURS_PER_DAY, INTERVALS_PER_HOUR, LABEL_DELIMITER, SAMPLES_PER_DAY,
    TEN_MINUTE_INDEX_LABEL,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Which of the three aggregated tables a profile belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ProfileKind {
    Overall,
    WeekdayWeekend,
    Seasonal,
}

impl ProfileKind {
    pub fn level_names(&self) -> Vec<&'static str> {
        match self {
            ProfileKind::Overall => vec!["Location", "Year"],
            ProfileKind::WeekdayWeekend => vec!["Location", "Year", "Day Type"],
            ProfileKind::Seasonal => vec!["Location", "Year", "Season"],
        }
    }
}

/// Column subset a profile is averaged over.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ProfileGroup {
    All,
    DayType(DayType),
    Season(Season),
}

impl ProfileGroup {
    pub fn label(&self) -> Option<&'static str> {
        match self {
            ProfileGroup::All => None,
            ProfileGroup::DayType(day_type) => Some(day_type.label()),
            ProfileGroup::Season(season) => Some(season.label()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ProfileKey {
    pub location: u32,
    pub year: i32,
    pub group: ProfileGroup,
}

impl ProfileKey {
    pub fn new(location: u32, year: i32, group: ProfileGroup) -> Self {
        Self {
            location,
            year,
            group,
        }
    }

    /// Header values, one per level: location, year, then the group when present.
    pub fn levels(&self) -> Vec<String> {
        let mut levels = vec![self.location.to_string(), self.year.to_string()];
        if let Some(group) = self.group.label() {
            levels.push(group.to_string());
        }
        levels
    }

    /// Flat column label such as `5_2021_Jan-Mar`.
    pub fn label(&self) -> String {
        self.levels().join(LABEL_DELIMITER)
    }
}

impl fmt::Display for ProfileKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.label())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Resolution {
    TenMinute,
    Hourly,
}

impl Resolution {
    pub fn row_count(&self) -> usize {
        match self {
            Resolution::TenMinute => SAMPLES_PER_DAY,
            Resolution::Hourly => HOURS_PER_DAY,
        }
    }

    pub fn rows_per_hour(&self) -> usize {
        match self {
            Resolution::TenMinute => INTERVALS_PER_HOUR,
            Resolution::Hourly => 1,
        }
    }

    pub fn index_label(&self) -> &'static str {
        match self {
            Resolution::TenMinute => TEN_MINUTE_INDEX_LABEL,
            Resolution::Hourly => HOURLY_INDEX_LABEL,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ProfileColumn {
    pub key: ProfileKey,
    /// One mean per row, `None` where no day contributed a reading.
    pub values: Vec<Option<f64>>,
}

/// Averaged load profiles: one row per time index, one column per key.
#[derive(Debug, Clone, PartialEq)]
pub struct ProfileTable {
    pub kind: ProfileKind,
    pub resolution: Resolution,
    pub columns: Vec<ProfileColumn>,
}

impl ProfileTable {
    /// Columns are sorted by key so the table layout is deterministic.
    pub fn new(kind: ProfileKind, resolution: Resolution, mut columns: Vec<ProfileColumn>) -> Self {
        columns.sort_by_key(|c| c.key);
        Self {
            kind,
            resolution,
            columns,
        }
    }

    pub fn row_count(&self) -> usize {
        self.resolution.row_count()
    }

    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    pub fn level_names(&self) -> Vec<&'static str> {
        self.kind.level_names()
    }

    pub fn column(&self, location: u32, year: i32, group: ProfileGroup) -> Option<&ProfileColumn> {
        let key = ProfileKey::new(location, year, group);
        self.columns
            .binary_search_by_key(&key, |c| c.key)
            .ok()
            .map(|i| &self.columns[i])
    }

    /// Iterates `(row index, one value per column)` in ascending row order.
    pub fn rows(&self) -> impl Iterator<Item = (usize, Vec<Option<f64>>)> + '_ {
        (0..self.row_count()).map(move |row| {
            let values = self
                .columns
                .iter()
                .map(|c| c.values.get(row).copied().flatten())
                .collect();
            (row, values)
        })
    }

    /// Separate weekday and weekend tables, as the profiles are usually reported.
    pub fn split_by_day_type(&self) -> BTreeMap<DayType, ProfileTable> {
        let mut split: BTreeMap<DayType, Vec<ProfileColumn>> = BTreeMap::new();
        for column in &self.columns {
            if let ProfileGroup::DayType(day_type) = column.key.group {
                split.entry(day_type).or_default().push(column.clone());
            }
        }

        split
            .into_iter()
            .map(|(day_type, columns)| {
                (day_type, ProfileTable::new(self.kind, self.resolution, columns))
            })
            .collect()
    }

    /// Averages each hour's rows into a 24-row table, skipping missing cells.
    pub fn to_hourly(&self) -> ProfileTable {
        let per_hour = self.resolution.rows_per_hour();
        let columns = self
            .columns
            .iter()
            .map(|column| ProfileColumn {
                key: column.key,
                values: column
                    .values
                    .chunks(per_hour)
                    .map(|chunk| {
                        let present: Vec<f64> = chunk.iter().flatten().copied().collect();
                        if present.is_empty() {
                            None
                        } else {
                            Some(present.iter().sum::<f64>() / present.len() as f64)
                        }
                    })
                    .collect(),
            })
            .collect();

        ProfileTable::new(self.kind, Resolution::Hourly, columns)
    }

    /// Relabels rows as if the clock moved by `hour_offset` hours, wrapping
    /// around midnight, and keeps rows in ascending order.
    pub fn shift_hours(&self, hour_offset: i32) -> ProfileTable {
        let rows = self.row_count() as i64;
        let shift = (i64::from(hour_offset) * self.resolution.rows_per_hour() as i64).rem_euclid(rows);

        let columns = self
            .columns
            .iter()
            .map(|column| {
                let mut values = column.values.clone();
                values.rotate_right(shift as usize);
                ProfileColumn {
                    key: column.key,
                    values,
                }
            })
            .collect();

        ProfileTable::new(self.kind, self.resolution, columns)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn column(location: u32, year: i32, group: ProfileGroup, values: Vec<Option<f64>>) -> ProfileColumn {
        ProfileColumn {
            key: ProfileKey::new(location, year, group),
            values,
        }
    }

    #[test]
    fn test_labels() {
        let key = ProfileKey::new(5, 2021, ProfileGroup::Season(Season::JanMar));
        assert_eq!(key.label(), "5_2021_Jan-Mar");
        assert_eq!(ProfileKey::new(5, 2022, ProfileGroup::All).label(), "5_2022");
        assert_eq!(
            ProfileKey::new(7, 2021, ProfileGroup::DayType(DayType::Weekend)).levels(),
            vec!["7", "2021", "weekend"]
        );
    }

    #[test]
    fn test_columns_sorted_and_found() {
        let table = ProfileTable::new(
            ProfileKind::Overall,
            Resolution::TenMinute,
            vec![
                column(6, 2021, ProfileGroup::All, vec![Some(1.0); SAMPLES_PER_DAY]),
                column(5, 2022, ProfileGroup::All, vec![Some(2.0); SAMPLES_PER_DAY]),
                column(5, 2021, ProfileGroup::All, vec![Some(3.0); SAMPLES_PER_DAY]),
            ],
        );

        let labels: Vec<String> = table.columns.iter().map(|c| c.key.label()).collect();
        assert_eq!(labels, vec!["5_2021", "5_2022", "6_2021"]);
        assert_eq!(
            table.column(5, 2022, ProfileGroup::All).unwrap().values[0],
            Some(2.0)
        );
        assert!(table.column(9, 2022, ProfileGroup::All).is_none());
        assert_eq!(table.rows().count(), SAMPLES_PER_DAY);
    }

    #[test]
    fn test_to_hourly_skips_missing() {
        let mut values: Vec<Option<f64>> = (0..SAMPLES_PER_DAY).map(|i| Some(i as f64)).collect();
        values[0] = None;
        for v in values.iter_mut().skip(6).take(6) {
            *v = None;
        }
        let table = ProfileTable::new(
            ProfileKind::Overall,
            Resolution::TenMinute,
            vec![column(5, 2021, ProfileGroup::All, values)],
        );

        let hourly = table.to_hourly();
        assert_eq!(hourly.row_count(), 24);
        let hourly_values = &hourly.columns[0].values;
        assert_eq!(hourly_values.len(), 24);
        assert_eq!(hourly_values[0], Some(3.0)); // mean of 1..=5
        assert_eq!(hourly_values[1], None);
        assert_eq!(hourly_values[2], Some(14.5));
    }

    #[test]
    fn test_shift_hours_wraps() {
        let values: Vec<Option<f64>> = (0..24).map(|h| Some(h as f64)).collect();
        let table = ProfileTable::new(
            ProfileKind::Overall,
            Resolution::Hourly,
            vec![column(5, 2021, ProfileGroup::All, values)],
        );

        let shifted = table.shift_hours(-6);
        // hour 6 becomes hour 0, hour 0 becomes hour 18
        assert_eq!(shifted.columns[0].values[0], Some(6.0));
        assert_eq!(shifted.columns[0].values[18], Some(0.0));
        assert_eq!(table.shift_hours(24), table);
    }

    #[test]
    fn test_split_by_day_type() {
        let table = ProfileTable::new(
            ProfileKind::WeekdayWeekend,
            Resolution::TenMinute,
            vec![
                column(5, 2021, ProfileGroup::DayType(DayType::Weekday), vec![Some(1.0); SAMPLES_PER_DAY]),
                column(5, 2021, ProfileGroup::DayType(DayType::Weekend), vec![Some(2.0); SAMPLES_PER_DAY]),
            ],
        );

        let split = table.split_by_day_type();
        assert_eq!(split.len(), 2);
        assert_eq!(split[&DayType::Weekday].column_count(), 1);
        assert_eq!(split[&DayType::Weekend].columns[0].values[0], Some(2.0));
    }
}
