use crate::models::{DayType, ProfileKind, Resolution};
use std::path::{Path, PathBuf};

/// Sub-directory of the output directory that receives cleaned per-day tables.
pub const CLEANED_DIR_NAME: &str = "Cleaned Load Profiles";

/// File stem of an aggregated table, e.g. `Avg Weekend Load Profiles` or
/// `Hourly Average Seasonal Load Profiles`.
pub fn profile_file_stem(kind: ProfileKind, resolution: Resolution, day_type: Option<DayType>) -> String {
    let base = match (kind, day_type) {
        (ProfileKind::Overall, _) => "Average Load Profiles",
        (ProfileKind::WeekdayWeekend, Some(DayType::Weekday)) => "Avg Weekday Load Profiles",
        (ProfileKind::WeekdayWeekend, Some(DayType::Weekend)) => "Avg Weekend Load Profiles",
        (ProfileKind::WeekdayWeekend, None) => "Avg Day Type Load Profiles",
        (ProfileKind::Seasonal, _) => "Average Seasonal Load Profiles",
    };

    match resolution {
        Resolution::TenMinute => base.to_string(),
        Resolution::Hourly => format!("Hourly {}", base),
    }
}

/// `{location} Load Profile {year}` with the group label appended when present.
pub fn cleaned_file_stem(location: u32, year: i32, group: Option<&str>) -> String {
    match group {
        Some(group) => format!("{} Load Profile {} {}", location, year, group),
        None => format!("{} Load Profile {}", location, year),
    }
}

pub fn output_path(dir: &Path, stem: &str, extension: &str) -> PathBuf {
    dir.join(format!("{}.{}", stem, extension))
}
