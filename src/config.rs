use crate::error::Result;
use crate::utils::constants::{
    COMPRESSION_CODECS, COMPRESSION_SNAPPY, DEFAULT_HOUR_OFFSET, DEFAULT_MAX_NUM_MISSING_VALS, DEFAULT_MAX_NUM_ZEROS,
    DEFAULT_OUTPUT_DIR, MISSING_SENTINEL,
};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::debug;
use validator::{Validate, ValidationError};

/// Environment variables override file settings, e.g. `LOAD_PROFILE__QUALITY__MAX_ZEROS=100`.
pub const ENV_PREFIX: &str = "LOAD_PROFILE";

/// Thresholds deciding when a day is unusable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct QualityConfig {
    /// Days with more missing readings than this are masked.
    pub max_missing_values: u32,

    /// Days with at least this many zero readings are masked.
    #[validate(range(min = 1, max = 144))]
    pub max_zeros: u32,

    /// Reading value that means "missing".
    pub sentinel: f64,
}

impl Default for QualityConfig {
    fn default() -> Self {
        Self {
            max_missing_values: DEFAULT_MAX_NUM_MISSING_VALS,
            max_zeros: DEFAULT_MAX_NUM_ZEROS,
            sentinel: MISSING_SENTINEL,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct ProcessingConfig {
    #[validate(range(min = 1))]
    pub max_workers: usize,

    /// Only data files whose name contains one of these are processed.
    pub file_patterns: Vec<String>,
}

impl Default for ProcessingConfig {
    fn default() -> Self {
        Self {
            max_workers: num_cpus::get(),
            file_patterns: Vec::new(),
        }
    }
}

impl ProcessingConfig {
    pub fn matches(&self, file_name: &str) -> bool {
        self.file_patterns.is_empty()
            || self
                .file_patterns
                .iter()
                .any(|pattern| file_name.contains(pattern.as_str()))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    Csv,
    Parquet,
    Both,
}

impl OutputFormat {
    pub fn writes_csv(&self) -> bool {
        matches!(self, OutputFormat::Csv | OutputFormat::Both)
    }

    pub fn writes_parquet(&self) -> bool {
        matches!(self, OutputFormat::Parquet | OutputFormat::Both)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct OutputConfig {
    pub output_dir: PathBuf,
    pub format: OutputFormat,

    /// Parquet codec name, case-insensitive.
    #[validate(custom(function = "validate_compression"))]
    pub compression: String,

    /// Also write 24-row hourly versions of each table.
    pub hourly: bool,

    /// Clock shift applied to hourly tables.
    #[validate(range(min = -23, max = 23))]
    pub hour_offset: i32,

    /// Write every cleaned per-day table under `output_dir/Cleaned Load Profiles`.
    pub export_cleaned: bool,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from(DEFAULT_OUTPUT_DIR),
            format: OutputFormat::Csv,
            compression: COMPRESSION_SNAPPY.to_string(),
            hourly: false,
            hour_offset: DEFAULT_HOUR_OFFSET,
            export_cleaned: false,
        }
    }
}

fn validate_compression(compression: &str) -> std::result::Result<(), ValidationError> {
    if COMPRESSION_CODECS
        .iter()
        .any(|codec| codec.eq_ignore_ascii_case(compression))
    {
        Ok(())
    } else {
        Err(ValidationError::new("unsupported_compression"))
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct PipelineConfig {
    #[validate(nested)]
    pub quality: QualityConfig,

    #[validate(nested)]
    pub processing: ProcessingConfig,

    #[validate(nested)]
    pub output: OutputConfig,
}

impl PipelineConfig {
    /// Defaults, then the optional config file, then `LOAD_PROFILE__*` variables.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut builder = config::Config::builder();

        if let Some(path) = path {
            debug!("Loading configuration from {}", path.display());
            builder = builder.add_source(config::File::from(path));
        }

        builder = builder.add_source(
            config::Environment::with_prefix(ENV_PREFIX)
                .separator("__")
                .try_parsing(true),
        );

        let config: PipelineConfig = builder.build()?.try_deserialize()?;
        config.validated()
    }

    pub fn validated(self) -> Result<Self> {
        self.validate()?;
        Ok(self)
    }
}
