pub mod csv_writer;
pub mod output_writer;
pub mod parquet_writer;

pub use csv_writer::{CsvCleanedSink, ProfileCsvWriter};
pub use output_writer::ProfileOutputWriter;
pub use parquet_writer::{ParquetFileInfo, ParquetWriter};
