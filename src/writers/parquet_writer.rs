use crate::error::{ProcessingError, Result};
use crate::models::{ProfileTable, Resolution};
use crate::utils::constants::{
    COMPRESSION_GZIP, COMPRESSION_LZ4, COMPRESSION_NONE, COMPRESSION_SNAPPY, COMPRESSION_ZSTD,
    DEFAULT_ROW_GROUP_SIZE,
};
use arrow::array::{ArrayRef, Float64Array, UInt16Array};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use parquet::arrow::ArrowWriter;
use parquet::basic::{Compression, GzipLevel, ZstdLevel};
use parquet::file::properties::WriterProperties;
use std::collections::HashMap;
use std::fs::File;
use std::path::Path;
use std::sync::Arc;

/// Schema metadata key holding the comma-separated header level names.
pub const LEVELS_METADATA_KEY: &str = "levels";
/// Schema metadata key holding the row index label.
pub const INDEX_METADATA_KEY: &str = "index";

/// Writes profile tables as one index column plus one nullable column per key.
pub struct ParquetWriter {
    compression: Compression,
    row_group_size: usize,
}

impl ParquetWriter {
    pub fn new() -> Self {
        Self {
            compression: Compression::SNAPPY,
            row_group_size: DEFAULT_ROW_GROUP_SIZE,
        }
    }

    pub fn with_compression(mut self, compression: &str) -> Result<Self> {
        self.compression = match compression.to_lowercase().as_str() {
            COMPRESSION_SNAPPY => Compression::SNAPPY,
            COMPRESSION_GZIP => Compression::GZIP(GzipLevel::default()),
            COMPRESSION_LZ4 => Compression::LZ4,
            COMPRESSION_ZSTD => Compression::ZSTD(ZstdLevel::default()),
            COMPRESSION_NONE => Compression::UNCOMPRESSED,
            _ => {
                return Err(ProcessingError::Config(format!(
                    "Unsupported compression: {}",
                    compression
                )))
            }
        };
        Ok(self)
    }

    /// Name of the row index column for a table resolution.
    pub fn index_column(resolution: Resolution) -> &'static str {
        match resolution {
            Resolution::TenMinute => "ten_minute_index",
            Resolution::Hourly => "hour_index",
        }
    }

    pub fn write_profiles(&self, table: &ProfileTable, path: &Path) -> Result<()> {
        let schema = self.create_schema(table);
        let batch = self.table_to_batch(table, schema.clone())?;

        let file = File::create(path)?;
        let props = WriterProperties::builder()
            .set_compression(self.compression)
            .set_max_row_group_size(self.row_group_size)
            .build();

        let mut writer = ArrowWriter::try_new(file, schema, Some(props))?;
        writer.write(&batch)?;
        writer.close()?;

        Ok(())
    }

    fn create_schema(&self, table: &ProfileTable) -> Arc<Schema> {
        let mut fields = vec![Field::new(
            Self::index_column(table.resolution),
            DataType::UInt16,
            false,
        )];
        fields.extend(
            table
                .columns
                .iter()
                .map(|c| Field::new(c.key.label(), DataType::Float64, true)),
        );

        let metadata = HashMap::from([
            (LEVELS_METADATA_KEY.to_string(), table.level_names().join(",")),
            (
                INDEX_METADATA_KEY.to_string(),
                table.resolution.index_label().to_string(),
            ),
        ]);

        Arc::new(Schema::new_with_metadata(fields, metadata))
    }

    fn table_to_batch(&self, table: &ProfileTable, schema: Arc<Schema>) -> Result<RecordBatch> {
        let index: Vec<u16> = (0..table.row_count())
            .map(|row| row as u16)
            .collect();

        let mut arrays: Vec<ArrayRef> = Vec::with_capacity(table.column_count() + 1);
        arrays.push(Arc::new(UInt16Array::from(index)));
        for column in &table.columns {
            let mut values = column.values.clone();
            values.resize(table.row_count(), None);
            arrays.push(Arc::new(Float64Array::from(values)));
        }

        Ok(RecordBatch::try_new(schema, arrays)?)
    }

    /// Reads back one profile column by its delimited label.
    pub fn read_column(&self, path: &Path, label: &str) -> Result<Vec<Option<f64>>> {
        let file = File::open(path)?;
        let reader = ParquetRecordBatchReaderBuilder::try_new(file)?.build()?;

        let mut values = Vec::new();
        for batch_result in reader {
            let batch = batch_result?;
            let index = batch.schema().index_of(label)?;
            let column = batch
                .column(index)
                .as_any()
                .downcast_ref::<Float64Array>()
                .ok_or_else(|| {
                    ProcessingError::Config(format!("Invalid column type for '{}'", label))
                })?;
            values.extend(column.iter());
        }

        Ok(values)
    }

    /// Get file statistics
    pub fn get_file_info(&self, path: &Path) -> Result<ParquetFileInfo> {
        use parquet::file::reader::{FileReader, SerializedFileReader};

        let file = File::open(path)?;
        let reader = SerializedFileReader::new(file)?;
        let metadata = reader.metadata();

        let file_metadata = metadata.file_metadata();
        let row_groups = metadata.num_row_groups();
        let total_rows = file_metadata.num_rows();
        let total_columns = file_metadata.schema_descr().num_columns();
        let file_size = std::fs::metadata(path)?.len();

        Ok(ParquetFileInfo {
            total_rows,
            total_columns,
            row_groups: row_groups as i32,
            file_size,
            compression: self.compression,
        })
    }
}

impl Default for ParquetWriter {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug)]
pub struct ParquetFileInfo {
    pub total_rows: i64,
    pub total_columns: usize,
    pub row_groups: i32,
    pub file_size: u64,
    pub compression: Compression,
}

impl ParquetFileInfo {
    pub fn summary(&self) -> String {
        format!(
            "Parquet File Summary:\n\
            - Rows: {}\n\
            - Profile columns: {}\n\
            - Row groups: {}\n\
            - File size: {:.2} KB\n\
            - Compression: {:?}",
            self.total_rows,
            self.total_columns.saturating_sub(1),
            self.row_groups,
            self.file_size as f64 / 1024.0,
            self.compression,
        )
    }
}
