use crate::error::Result;
use crate::models::{CleanedTable, DailySample, DayKey, ProfileTable};
use crate::processors::ReportSink;
use crate::utils::constants::{SAMPLES_PER_DAY, TEN_MINUTE_INDEX_LABEL};
use crate::utils::filename::{cleaned_file_stem, output_path};
use csv::WriterBuilder;
use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::debug;

fn format_value(value: Option<f64>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}

/// Writes profile tables with one header row per column level.
///
/// ```text
/// Location,5,5
/// Year,2021,2022
/// Ten-Minute Index,,
/// 0,412.5,398.1
/// ```
pub struct ProfileCsvWriter;

impl ProfileCsvWriter {
    pub fn new() -> Self {
        Self
    }

    pub fn write_profiles(&self, table: &ProfileTable, path: &Path) -> Result<()> {
        let file = File::create(path)?;
        self.write_to(table, file)?;
        debug!("Wrote {} columns to {}", table.column_count(), path.display());
        Ok(())
    }

    pub fn write_to<W: Write>(&self, table: &ProfileTable, writer: W) -> Result<()> {
        let mut writer = WriterBuilder::new().has_headers(false).from_writer(writer);

        let levels: Vec<Vec<String>> = table.columns.iter().map(|c| c.key.levels()).collect();
        for (level, name) in table.level_names().iter().enumerate() {
            let mut record = vec![name.to_string()];
            record.extend(
                levels
                    .iter()
                    .map(|values| values.get(level).cloned().unwrap_or_default()),
            );
            writer.write_record(&record)?;
        }

        let mut index_row = vec![table.resolution.index_label().to_string()];
        index_row.resize(table.column_count() + 1, String::new());
        writer.write_record(&index_row)?;

        for (row, values) in table.rows() {
            let mut record = vec![row.to_string()];
            record.extend(values.into_iter().map(format_value));
            writer.write_record(&record)?;
        }

        writer.flush()?;
        Ok(())
    }
}

impl Default for ProfileCsvWriter {
    fn default() -> Self {
        Self::new()
    }
}

/// Exports each cleaned table, and its day-type and season subsets, as
/// `{location} Load Profile {year}[ {group}].csv` with one column per day.
pub struct CsvCleanedSink {
    output_dir: PathBuf,
}

impl CsvCleanedSink {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
        }
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    fn write_days(&self, path: &Path, days: &[(&DayKey, &DailySample)]) -> Result<()> {
        let mut writer = WriterBuilder::new().has_headers(false).from_path(path)?;

        let mut header = vec![TEN_MINUTE_INDEX_LABEL.to_string()];
        header.extend(days.iter().map(|(key, _)| key.day_of_year.to_string()));
        writer.write_record(&header)?;

        for slot in 0..SAMPLES_PER_DAY {
            let mut record = vec![slot.to_string()];
            record.extend(days.iter().map(|(_, sample)| format_value(sample.get(slot))));
            writer.write_record(&record)?;
        }

        writer.flush()?;
        Ok(())
    }
}

impl ReportSink for CsvCleanedSink {
    fn emit(&self, table: &CleanedTable) -> Result<()> {
        let stem = |group: Option<&str>| cleaned_file_stem(table.location, table.year, group);

        let all: Vec<(&DayKey, &DailySample)> =
            table.days.iter().map(|(key, day)| (key, &day.sample)).collect();
        self.write_days(&output_path(&self.output_dir, &stem(None), "csv"), &all)?;

        for (day_type, days) in table.partition_by_day_type() {
            let path = output_path(&self.output_dir, &stem(Some(day_type.label())), "csv");
            self.write_days(&path, &days)?;
        }

        for (season, days) in table.partition_by_season() {
            let path = output_path(&self.output_dir, &stem(Some(season.label())), "csv");
            self.write_days(&path, &days)?;
        }

        debug!("Exported cleaned tables for {}", table.source);
        Ok(())
    }
}
