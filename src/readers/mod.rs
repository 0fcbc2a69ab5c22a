pub mod battery_reader;
pub mod metadata_reader;
pub mod source;
pub mod table_parser;

pub use battery_reader::{BatteryReader, BatterySource, OutageIndex, OutageIndexOutcome};
pub use metadata_reader::{parse_metadata_literal, MetadataReader};
pub use source::{MemorySource, SheetSource, WorkbookSource};
pub use table_parser::{FormatIssue, ParsedTable, TableParser};
