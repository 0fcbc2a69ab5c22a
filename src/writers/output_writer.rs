use crate::config::OutputConfig;
use crate::error::Result;
use crate::models::{DayType, ProfileKind, ProfileTable};
use crate::processors::AggregatedProfiles;
use crate::utils::filename::{output_path, profile_file_stem};
use crate::writers::csv_writer::ProfileCsvWriter;
use crate::writers::parquet_writer::ParquetWriter;
use std::path::PathBuf;
use tracing::info;

/// Writes the aggregated profile set in the configured formats.
pub struct ProfileOutputWriter {
    config: OutputConfig,
    csv: ProfileCsvWriter,
    parquet: ParquetWriter,
}

impl ProfileOutputWriter {
    pub fn new(config: OutputConfig) -> Result<Self> {
        let parquet = ParquetWriter::new().with_compression(&config.compression)?;
        Ok(Self {
            config,
            csv: ProfileCsvWriter::new(),
            parquet,
        })
    }

    /// Writes every table into `output_dir`, which must already exist.
    /// Weekday and weekend profiles go to separate files. Returns the written paths.
    pub fn write_all(&self, profiles: &AggregatedProfiles) -> Result<Vec<PathBuf>> {
        let mut written = Vec::new();
        self.write_set(profiles, &mut written)?;

        if self.config.hourly {
            let hourly = profiles.to_hourly(self.config.hour_offset);
            self.write_set(&hourly, &mut written)?;
        }

        info!(
            "Wrote {} profile files to {}",
            written.len(),
            self.config.output_dir.display()
        );
        Ok(written)
    }

    fn write_set(&self, profiles: &AggregatedProfiles, written: &mut Vec<PathBuf>) -> Result<()> {
        self.write_table(&profiles.overall, None, written)?;
        for (day_type, table) in profiles.weekday_weekend.split_by_day_type() {
            self.write_table(&table, Some(day_type), written)?;
        }
        self.write_table(&profiles.seasonal, None, written)
    }

    fn write_table(
        &self,
        table: &ProfileTable,
        day_type: Option<DayType>,
        written: &mut Vec<PathBuf>,
    ) -> Result<()> {
        debug_assert!(day_type.is_none() || table.kind == ProfileKind::WeekdayWeekend);
        let stem = profile_file_stem(table.kind, table.resolution, day_type);

        if self.config.format.writes_csv() {
            let path = output_path(&self.config.output_dir, &stem, "csv");
            self.csv.write_profiles(table, &path)?;
            written.push(path);
        }
        if self.config.format.writes_parquet() {
            let path = output_path(&self.config.output_dir, &stem, "parquet");
            self.parquet.write_profiles(table, &path)?;
            written.push(path);
        }

        Ok(())
    }
}
