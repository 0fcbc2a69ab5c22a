use crate::error::{ProcessingError, Result};
use chrono::{Datelike, NaiveDate, Weekday};
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DayType {
    Weekday,
    Weekend,
}

impl DayType {
    pub const ALL: [DayType; 2] = [DayType::Weekday, DayType::Weekend];

    pub fn label(&self) -> &'static str {
        match self {
            DayType::Weekday => "weekday",
            DayType::Weekend => "weekend",
        }
    }

    pub fn from_date(date: NaiveDate) -> Self {
        match date.weekday() {
            Weekday::Sat | Weekday::Sun => DayType::Weekend,
            _ => DayType::Weekday,
        }
    }
}

impl fmt::Display for DayType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Calendar quarter of the year.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Season {
    #[serde(rename = "Jan-Mar")]
    JanMar,
    #[serde(rename = "Apr-Jun")]
    AprJun,
    #[serde(rename = "Jul-Sep")]
    JulSep,
    #[serde(rename = "Oct-Dec")]
    OctDec,
}

impl Season {
    pub const ALL: [Season; 4] = [Season::JanMar, Season::AprJun, Season::JulSep, Season::OctDec];

    pub fn label(&self) -> &'static str {
        match self {
            Season::JanMar => "Jan-Mar",
            Season::AprJun => "Apr-Jun",
            Season::JulSep => "Jul-Sep",
            Season::OctDec => "Oct-Dec",
        }
    }

    /// Quarter number, 1 through 4.
    pub fn quarter(&self) -> u32 {
        match self {
            Season::JanMar => 1,
            Season::AprJun => 2,
            Season::JulSep => 3,
            Season::OctDec => 4,
        }
    }

    pub fn from_date(date: NaiveDate) -> Self {
        match date.month0() / 3 {
            0 => Season::JanMar,
            1 => Season::AprJun,
            2 => Season::JulSep,
            _ => Season::OctDec,
        }
    }
}

impl fmt::Display for Season {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Resolves a 1-based day-of-year to a Gregorian date.
pub fn date_from_day_of_year(year: i32, day_of_year: u16) -> Result<NaiveDate> {
    NaiveDate::from_yo_opt(year, u32::from(day_of_year)).ok_or_else(|| {
        ProcessingError::Parse(format!(
            "Day-of-year {} does not exist in year {}",
            day_of_year, year
        ))
    })
}

pub fn classify_day(year: i32, day_of_year: u16) -> Result<(DayType, Season)> {
    let date = date_from_day_of_year(year, day_of_year)?;
    Ok((DayType::from_date(date), Season::from_date(date)))
}
