use crate::config::OutputFormat;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "load-profile-processor")]
#[command(about = "Cleans ten-minute energy data and aggregates it into load profiles")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    #[arg(short, long, global = true, help = "Enable verbose logging")]
    pub verbose: bool,

    #[arg(long, global = true, help = "Log file path")]
    pub log_file: Option<PathBuf>,

    #[arg(short, long, global = true, help = "Hide progress bars")]
    pub quiet: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Clean and aggregate every location-year workbook in a directory
    Process {
        #[arg(short, long, help = "Directory of location-year data workbooks")]
        data_dir: PathBuf,

        #[arg(short, long, help = "Directory of battery-analysis workbooks")]
        battery_dir: PathBuf,

        #[arg(short, long, help = "Output directory [default: Aggregated Load Profiles]")]
        output_dir: Option<PathBuf>,

        #[arg(short, long, help = "Configuration file (TOML, JSON or YAML)")]
        config: Option<PathBuf>,

        #[arg(long, help = "Mask days with more missing readings than this")]
        max_missing: Option<u32>,

        #[arg(long, help = "Mask days with at least this many zero readings")]
        max_zeros: Option<u32>,

        #[arg(short, long, value_enum)]
        format: Option<OutputFormat>,

        #[arg(long, help = "Parquet compression: snappy, gzip, lz4, zstd or none")]
        compression: Option<String>,

        #[arg(long)]
        max_workers: Option<usize>,

        #[arg(
            long = "file-pattern",
            help = "Only process data files whose name contains this (repeatable)"
        )]
        file_patterns: Vec<String>,

        #[arg(long, help = "Also write 24-row hourly profiles")]
        hourly: bool,

        #[arg(long, allow_hyphen_values = true, help = "Hour shift applied to hourly profiles")]
        hour_offset: Option<i32>,

        #[arg(long, help = "Export cleaned per-day tables as CSV")]
        export_cleaned: bool,
    },

    /// Display metadata and table structure of one data workbook
    Inspect {
        #[arg(short, long)]
        file: PathBuf,
    },
}
