pub mod aggregator;
pub mod pipeline;
pub mod quality_filter;

pub use aggregator::{AggregatedProfiles, LoadProfileAggregator, ProfileAccumulator};
pub use pipeline::{LoadProfilePipeline, PipelineOutcome, ReportSink};
pub use quality_filter::{LocationStatistics, QualityFilter, QualityReport};
