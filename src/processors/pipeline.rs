use crate::config::PipelineConfig;
use crate::error::{ProcessingError, Result};
use crate::models::{CleanedTable, SkippedSource};
use crate::processors::aggregator::{AggregatedProfiles, LoadProfileAggregator};
use crate::processors::quality_filter::{QualityFilter, QualityReport};
use crate::readers::{MetadataReader, OutageIndex, SheetSource, TableParser};
use crate::utils::progress::ProgressReporter;
use rayon::prelude::*;
use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use tracing::{debug, info, warn};

/// Receives each cleaned table before it is folded into the profiles.
pub trait ReportSink: Send + Sync {
    fn emit(&self, table: &CleanedTable) -> Result<()>;
}

#[derive(Debug, Clone)]
pub struct PipelineOutcome {
    pub profiles: AggregatedProfiles,
    pub report: QualityReport,
    /// Sources excluded from every profile, sorted by name.
    pub skipped: Vec<SkippedSource>,
    pub processed: usize,
}

/// Per-worker state combined with `merge` once all sources are read.
#[derive(Default)]
struct PartialOutcome {
    aggregator: LoadProfileAggregator,
    report: QualityReport,
    skipped: Vec<SkippedSource>,
}

impl PartialOutcome {
    fn merge(mut self, other: PartialOutcome) -> Self {
        self.aggregator = self.aggregator.merge(other.aggregator);
        self.report.merge(other.report);
        self.skipped.extend(other.skipped);
        self
    }
}

/// Reads, cleans and aggregates location-year sources.
pub struct LoadProfilePipeline {
    config: PipelineConfig,
    metadata_reader: MetadataReader,
    parser: TableParser,
    filter: QualityFilter,
}

impl LoadProfilePipeline {
    pub fn new(config: PipelineConfig) -> Self {
        let filter = QualityFilter::new(config.quality.clone());
        Self {
            config,
            metadata_reader: MetadataReader::new(),
            parser: TableParser::new(),
            filter,
        }
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Metadata, data sheet and outage lookup for one source, then the quality filter.
    pub fn process_source<S: SheetSource + ?Sized>(
        &self,
        source: &S,
        outages: &OutageIndex,
    ) -> Result<(CleanedTable, QualityReport)> {
        let name = source.name();
        let (location, metadata) = self.metadata_reader.extract(source)?;
        let (table, issues) = self.parser.read_location_year(source, location, &metadata)?;

        for issue in &issues {
            warn!("{}: {}", name, issue.to_error());
        }
        debug!(
            "{}: location {} year {} with {} day columns",
            name,
            location,
            metadata.year(),
            table.day_count()
        );

        let outage_flags = outages.outage_flags(location, metadata.year())?;
        self.filter.clean(table, outage_flags)
    }

    /// Processes `sources` across the worker pool. A source that fails is
    /// logged and listed in `skipped`; it never stops the run. Only the first
    /// source with a given name is read; later ones are skipped.
    pub fn run<S: SheetSource + Sync>(
        &self,
        sources: &[S],
        outages: &OutageIndex,
        sink: Option<&dyn ReportSink>,
        progress: Option<&ProgressReporter>,
    ) -> Result<PipelineOutcome> {
        info!(
            "Processing {} sources with {} workers",
            sources.len(),
            self.config.processing.max_workers
        );

        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(self.config.processing.max_workers)
            .build()
            .map_err(|e| ProcessingError::Config(e.to_string()))?;

        let (unique, duplicates) = partition_by_name(sources);
        let processed_count = AtomicUsize::new(duplicates.len());

        let partial = pool.install(|| {
            unique
                .into_par_iter()
                .fold(PartialOutcome::default, |mut acc, source| {
                    let name = source.name();
                    match self.process_source(source, outages) {
                        Ok((cleaned, report)) => {
                            if let Some(sink) = sink {
                                if let Err(e) = sink.emit(&cleaned) {
                                    warn!("Failed to export cleaned table for {}: {}", name, e);
                                }
                            }
                            acc.aggregator.fold(&cleaned);
                            acc.report.merge(report);
                        }
                        Err(e) => {
                            warn!("Skipping {}: {}", name, e);
                            acc.skipped.push(SkippedSource::new(name, &e));
                        }
                    }

                    let count = processed_count.fetch_add(1, Ordering::Relaxed) + 1;
                    if let Some(p) = progress {
                        p.update(count as u64);
                    }

                    acc
                })
                .reduce(PartialOutcome::default, PartialOutcome::merge)
        });

        let PartialOutcome {
            aggregator,
            report,
            mut skipped,
        } = partial;
        skipped.extend(duplicates);
        skipped.sort_by(|a, b| a.source.cmp(&b.source));

        info!(
            "Aggregated {} sources ({} skipped)",
            aggregator.source_count(),
            skipped.len()
        );

        Ok(PipelineOutcome {
            profiles: aggregator.finish(),
            report,
            processed: aggregator.source_count(),
            skipped,
        })
    }
}

/// Splits `sources` into the first occurrence of each name and skip
/// entries for the rest. Partial sums are keyed by source name.
fn partition_by_name<S: SheetSource>(sources: &[S]) -> (Vec<&S>, Vec<SkippedSource>) {
    let mut seen = HashSet::new();
    let mut unique = Vec::with_capacity(sources.len());
    let mut duplicates = Vec::new();

    for source in sources {
        let name = source.name();
        if seen.insert(name.clone()) {
            unique.push(source);
        } else {
            let error = ProcessingError::Config(format!("duplicate source name '{}'", name));
            warn!("Skipping {}: {}", name, error);
            duplicates.push(SkippedSource::new(name, &error));
        }
    }

    (unique, duplicates)
}
