pub mod calendar;
pub mod metadata;
pub mod profile;
pub mod report;
pub mod sample;
pub mod table;

pub use calendar::{classify_day, date_from_day_of_year, DayType, Season};
pub use metadata::SourceMetadata;
pub use profile::{ProfileColumn, ProfileGroup, ProfileKey, ProfileKind, ProfileTable, Resolution};
pub use report::SkippedSource;
pub use sample::{DailySample, DayKey};
pub use table::{
    AuxSeries, AuxiliaryBundle, Cell, CleanedDay, CleanedTable, LabeledRow, LabeledTable,
    LocationYearTable, MaskReason, RawSheet,
};
