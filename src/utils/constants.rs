/// Sampling layout
pub const INTERVALS_PER_HOUR: usize = 6;
pub const HOURS_PER_DAY: usize = 24;
pub const SAMPLES_PER_DAY: usize = INTERVALS_PER_HOUR * HOURS_PER_DAY;

/// Sheet names
pub const META_SHEET: &str = "Meta";
pub const DATA_SHEET: &str = "Sheet1";
pub const ENERGY_BALANCE_SHEET: &str = "Energy Balance";

/// Table and subtable labels
pub const PRIMARY_TABLE_LABEL: &str = "Ten-Minute Average Power (W)";
pub const MISSING_VALUES_SUBTABLE: &str = "Number of Missing Values";
pub const OUTAGE_FLAG_SUBTABLE: &str = "Outage Flag";
pub const TEN_MINUTE_INDEX_LABEL: &str = "Ten-Minute Index";
pub const HOURLY_INDEX_LABEL: &str = "Hourly Index";

/// Meta sheet row labels
pub const META_LOCATION_ROW: i64 = 0;
pub const META_LITERAL_ROW: i64 = 1;

/// Quality defaults
pub const DEFAULT_MAX_NUM_MISSING_VALS: u32 = (INTERVALS_PER_HOUR * 3) as u32;
pub const DEFAULT_MAX_NUM_ZEROS: u32 = SAMPLES_PER_DAY as u32;
pub const MISSING_SENTINEL: f64 = -8888.0;

/// Output defaults
pub const DEFAULT_OUTPUT_DIR: &str = "Aggregated Load Profiles";
pub const DEFAULT_ROW_GROUP_SIZE: usize = 10000;
pub const LABEL_DELIMITER: &str = "_";
pub const DEFAULT_HOUR_OFFSET: i32 = 0;

/// Workbook extension picked up by directory discovery
pub const WORKBOOK_EXTENSION: &str = "xlsx";

/// Parquet compression options
pub const COMPRESSION_SNAPPY: &str = "snappy";
pub const COMPRESSION_GZIP: &str = "gzip";
pub const COMPRESSION_LZ4: &str = "lz4";
pub const COMPRESSION_ZSTD: &str = "zstd";
pub const COMPRESSION_NONE: &str = "none";
pub const COMPRESSION_CODECS: [&str; 5] = [
    COMPRESSION_SNAPPY,
    COMPRESSION_GZIP,
    COMPRESSION_LZ4,
    COMPRESSION_ZSTD,
    COMPRESSION_NONE,
];
