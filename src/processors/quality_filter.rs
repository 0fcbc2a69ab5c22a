use crate::config::QualityConfig;
use crate::error::Result;
use crate::models::{
    classify_day, AuxSeries, CleanedDay, CleanedTable, DailySample, LocationYearTable, MaskReason,
};
use crate::utils::constants::MISSING_VALUES_SUBTABLE;
use std::collections::BTreeMap;
use tracing::debug;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct QualityReport {
    pub total_days: usize,
    pub kept_days: usize,
    pub masked_days: usize,
    pub masked_missing: usize,
    pub masked_zeros: usize,
    pub masked_outage: usize,
    pub sentinel_readings: usize,
    pub location_statistics: BTreeMap<(u32, i32), LocationStatistics>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct LocationStatistics {
    pub total_days: usize,
    pub kept_days: usize,
    pub masked_days: usize,
}

impl QualityReport {
    pub fn merge(&mut self, other: QualityReport) {
        self.total_days += other.total_days;
        self.kept_days += other.kept_days;
        self.masked_days += other.masked_days;
        self.masked_missing += other.masked_missing;
        self.masked_zeros += other.masked_zeros;
        self.masked_outage += other.masked_outage;
        self.sentinel_readings += other.sentinel_readings;

        for (key, stats) in other.location_statistics {
            let entry = self.location_statistics.entry(key).or_default();
            entry.total_days += stats.total_days;
            entry.kept_days += stats.kept_days;
            entry.masked_days += stats.masked_days;
        }
    }

    fn record(&mut self, location: u32, year: i32, reasons: &[MaskReason]) {
        self.total_days += 1;
        let stats = self.location_statistics.entry((location, year)).or_default();
        stats.total_days += 1;

        if reasons.is_empty() {
            self.kept_days += 1;
            stats.kept_days += 1;
            return;
        }

        self.masked_days += 1;
        stats.masked_days += 1;
        for reason in reasons {
            match reason {
                MaskReason::TooManyMissing => self.masked_missing += 1,
                MaskReason::TooManyZeros => self.masked_zeros += 1,
                MaskReason::Outage => self.masked_outage += 1,
            }
        }
    }

    pub fn generate_summary(&self) -> String {
        let percent = |n: usize| {
            if self.total_days == 0 {
                0.0
            } else {
                100.0 * n as f64 / self.total_days as f64
            }
        };

        let mut summary = String::new();
        summary.push_str("=== Data Quality Report ===\n");
        summary.push_str(&format!("Total Days: {}\n", self.total_days));
        summary.push_str(&format!(
            "Kept Days: {} ({:.1}%)\n",
            self.kept_days,
            percent(self.kept_days)
        ));
        summary.push_str(&format!(
            "Masked Days: {} ({:.1}%)\n",
            self.masked_days,
            percent(self.masked_days)
        ));
        summary.push_str(&format!("  Too many missing values: {}\n", self.masked_missing));
        summary.push_str(&format!("  Too many zero readings: {}\n", self.masked_zeros));
        summary.push_str(&format!("  Outage recorded: {}\n", self.masked_outage));
        summary.push_str(&format!(
            "Sentinel readings replaced: {}\n",
            self.sentinel_readings
        ));
        summary.push_str(&format!(
            "Location-years: {}\n",
            self.location_statistics.len()
        ));

        summary
    }
}

/// Decides per day whether readings are usable, masking the rest.
#[derive(Debug, Clone)]
pub struct QualityFilter {
    config: QualityConfig,
}

impl QualityFilter {
    pub fn new(config: QualityConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &QualityConfig {
        &self.config
    }

    /// Applies the day rules in order: missing-value count, sentinel
    /// replacement, zero count, outage flag. Any triggered rule masks the
    /// whole day. A blank count or flag never fires its rule. Returns the
    /// cleaned sample and the rules that fired.
    pub fn evaluate(
        &self,
        mut sample: DailySample,
        missing_count: Option<f64>,
        outage_flag: Option<f64>,
    ) -> (DailySample, Vec<MaskReason>) {
        let mut reasons = Vec::new();

        if missing_count.is_some_and(|count| count > f64::from(self.config.max_missing_values)) {
            reasons.push(MaskReason::TooManyMissing);
        }

        sample.replace_sentinel(self.config.sentinel);

        if sample.count_zeros() >= self.config.max_zeros as usize {
            reasons.push(MaskReason::TooManyZeros);
        }

        if outage_flag == Some(1.0) {
            reasons.push(MaskReason::Outage);
        }

        if !reasons.is_empty() {
            sample.mask();
        }

        (sample, reasons)
    }

    /// Cleans every day of `table`. Fails if a day has no entry in the
    /// missing-value counts or the outage flags, or does not exist in the
    /// calendar year. Blank entries are allowed.
    pub fn clean(
        &self,
        table: LocationYearTable,
        outage_flags: &AuxSeries,
    ) -> Result<(CleanedTable, QualityReport)> {
        let missing_counts = table.auxiliary.require(MISSING_VALUES_SUBTABLE)?;
        let mut report = QualityReport::default();
        let mut days = BTreeMap::new();

        for (key, sample) in table.days {
            let missing_count = missing_counts.lookup(key.day_of_year)?;
            let outage_flag = outage_flags.lookup(key.day_of_year)?;
            let (day_type, season) = classify_day(key.year, key.day_of_year)?;

            let present_before = sample.count_present();
            let (sample, mask_reasons) = self.evaluate(sample, missing_count, outage_flag);
            if mask_reasons.is_empty() {
                report.sentinel_readings += present_before - sample.count_present();
            }

            report.record(key.location, key.year, &mask_reasons);
            days.insert(
                key,
                CleanedDay {
                    sample,
                    day_type,
                    season,
                    mask_reasons,
                },
            );
        }

        debug!(
            "Cleaned {}: {} days kept, {} masked",
            table.source, report.kept_days, report.masked_days
        );

        Ok((
            CleanedTable {
                source: table.source,
                location: table.location,
                year: table.year,
                days,
            },
            report,
        ))
    }
}

impl Default for QualityFilter {
    fn default() -> Self {
        Self::new(QualityConfig::default())
    }
}
