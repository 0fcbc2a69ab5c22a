use crate::cli::args::{Cli, Commands};
use crate::config::PipelineConfig;
use crate::error::Result;
use crate::models::SkippedSource;
use crate::processors::{LoadProfilePipeline, PipelineOutcome, ReportSink};
use crate::readers::{BatteryReader, MetadataReader, TableParser, WorkbookSource};
use crate::utils::constants::WORKBOOK_EXTENSION;
use crate::utils::filename::CLEANED_DIR_NAME;
use crate::utils::logging::init_logging;
use crate::utils::progress::ProgressReporter;
use crate::writers::{CsvCleanedSink, ParquetWriter, ProfileOutputWriter};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

pub async fn run(cli: Cli) -> Result<()> {
    init_logging(cli.verbose, cli.log_file.as_deref())?;
    let quiet = cli.quiet;

    match cli.command {
        Commands::Process {
            data_dir,
            battery_dir,
            output_dir,
            config,
            max_missing,
            max_zeros,
            format,
            compression,
            max_workers,
            file_patterns,
            hourly,
            hour_offset,
            export_cleaned,
        } => {
            let mut pipeline_config = PipelineConfig::load(config.as_deref())?;

            if let Some(dir) = output_dir {
                pipeline_config.output.output_dir = dir;
            }
            if let Some(n) = max_missing {
                pipeline_config.quality.max_missing_values = n;
            }
            if let Some(n) = max_zeros {
                pipeline_config.quality.max_zeros = n;
            }
            if let Some(format) = format {
                pipeline_config.output.format = format;
            }
            if let Some(compression) = compression {
                pipeline_config.output.compression = compression;
            }
            if let Some(n) = max_workers {
                pipeline_config.processing.max_workers = n;
            }
            if !file_patterns.is_empty() {
                pipeline_config.processing.file_patterns = file_patterns;
            }
            if let Some(offset) = hour_offset {
                pipeline_config.output.hour_offset = offset;
            }
            pipeline_config.output.hourly |= hourly;
            pipeline_config.output.export_cleaned |= export_cleaned;

            process(pipeline_config.validated()?, data_dir, battery_dir, quiet).await
        }

        Commands::Inspect { file } => inspect(&file),
    }
}

/// Workbooks directly inside `dir`, sorted by file name.
pub fn discover_workbooks<F>(dir: &Path, include: F) -> Result<Vec<PathBuf>>
where
    F: Fn(&str) -> bool,
{
    let mut files = Vec::new();

    for entry in std::fs::read_dir(dir)? {
        let entry = entry?;
        if !entry.file_type()?.is_file() {
            continue;
        }

        let path = entry.path();
        let is_workbook = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ext.eq_ignore_ascii_case(WORKBOOK_EXTENSION))
            .unwrap_or(false);
        let name = entry.file_name().to_string_lossy().into_owned();

        // Excel lock files
        if is_workbook && !name.starts_with("~$") && include(&name) {
            files.push(path);
        }
    }

    files.sort();
    Ok(files)
}

async fn process(
    config: PipelineConfig,
    data_dir: PathBuf,
    battery_dir: PathBuf,
    quiet: bool,
) -> Result<()> {
    println!("Processing load profiles...");
    println!("Data directory: {}", data_dir.display());
    println!("Battery directory: {}", battery_dir.display());
    println!("Output directory: {}", config.output.output_dir.display());

    let data_files = discover_workbooks(&data_dir, |name| config.processing.matches(name))?;
    let battery_files = discover_workbooks(&battery_dir, |_| true)?;
    info!(
        "Found {} data workbooks and {} battery workbooks",
        data_files.len(),
        battery_files.len()
    );

    if data_files.is_empty() {
        warn!("No data workbooks found in {}", data_dir.display());
        println!("No data workbooks to process");
        return Ok(());
    }

    // Fails on a bad codec before any workbook is read
    let output_writer = ProfileOutputWriter::new(config.output.clone())?;

    std::fs::create_dir_all(&config.output.output_dir)?;
    let cleaned_dir = config.output.output_dir.join(CLEANED_DIR_NAME);
    if config.output.export_cleaned {
        std::fs::create_dir_all(&cleaned_dir)?;
    }

    let (battery_skipped, outcome) = tokio::task::spawn_blocking(
        move || -> Result<(Vec<SkippedSource>, PipelineOutcome)> {
            let battery_sources: Vec<WorkbookSource> =
                battery_files.into_iter().map(WorkbookSource::new).collect();
            let progress = ProgressReporter::new(
                battery_sources.len() as u64,
                "Reading battery data...",
                quiet,
            );
            let outages = BatteryReader::new().build_index(&battery_sources, Some(&progress));
            progress.finish_with_message(&format!(
                "Battery data for {} location-years",
                outages.index.len()
            ));

            let sources: Vec<WorkbookSource> =
                data_files.into_iter().map(WorkbookSource::new).collect();
            let progress =
                ProgressReporter::new(sources.len() as u64, "Processing load data...", quiet);

            let sink = CsvCleanedSink::new(cleaned_dir);
            let sink: Option<&dyn ReportSink> = if config.output.export_cleaned {
                Some(&sink)
            } else {
                None
            };

            let pipeline = LoadProfilePipeline::new(config);
            let outcome = pipeline.run(&sources, &outages.index, sink, Some(&progress))?;
            progress.finish_with_message(&format!("Processed {} files", outcome.processed));

            Ok((outages.skipped, outcome))
        },
    )
    .await??;

    println!("\n{}", outcome.report.generate_summary());

    let spinner = ProgressReporter::new_spinner("Writing profiles...", quiet);
    let written = output_writer.write_all(&outcome.profiles)?;
    spinner.finish_with_message(&format!("Wrote {} files", written.len()));
    for path in &written {
        println!("Wrote {}", path.display());
    }

    print_skipped("battery workbooks", &battery_skipped);
    print_skipped("data workbooks", &outcome.skipped);

    println!("Processing complete!");
    Ok(())
}

fn print_skipped(kind: &str, skipped: &[SkippedSource]) {
    if skipped.is_empty() {
        return;
    }

    println!("\nSkipped {} {}:", skipped.len(), kind);
    for entry in skipped {
        println!("  {}: {}", entry.source, entry.reason);
    }
}

fn inspect(file: &Path) -> Result<()> {
    let is_parquet = file
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.eq_ignore_ascii_case("parquet"))
        .unwrap_or(false);
    if is_parquet {
        println!("Analyzing Parquet file: {}", file.display());
        let info = ParquetWriter::new().get_file_info(file)?;
        println!("{}", info.summary());
        return Ok(());
    }

    println!("Inspecting workbook: {}", file.display());
    let source = WorkbookSource::new(file);

    let (location, metadata) = MetadataReader::new().extract(&source)?;
    println!("Location: {}", location);
    println!("Year: {}", metadata.year());
    for (key, value) in &metadata.extra {
        println!("  {}: {}", key, value);
    }

    let (table, issues) = TableParser::new().read_location_year(&source, location, &metadata)?;
    println!("Day columns: {}", table.day_count());
    if let (Some(first), Some(last)) = (table.days.keys().next(), table.days.keys().next_back()) {
        println!("Days of year: {} to {}", first.day_of_year, last.day_of_year);
    }

    println!("Subtables: {}", table.auxiliary.len());
    for name in table.auxiliary.names() {
        let entries = table.auxiliary.get(name).map_or(0, |series| series.len());
        println!("  {} ({} days)", name, entries);
    }

    if !issues.is_empty() {
        println!("Dropped subtables: {}", issues.len());
        for issue in &issues {
            println!("  {}", issue.to_error());
        }
    }

    Ok(())
}
