use crate::error::{ProcessingError, Result};
use crate::utils::constants::SAMPLES_PER_DAY;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifies one day column: (location, year, day-of-year).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct DayKey {
    pub location: u32,
    pub year: i32,
    pub day_of_year: u16,
}

impl DayKey {
    pub fn new(location: u32, year: i32, day_of_year: u16) -> Self {
        Self {
            location,
            year,
            day_of_year,
        }
    }
}

impl fmt::Display for DayKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}/{:03}", self.location, self.year, self.day_of_year)
    }
}

/// 144 ten-minute power readings for one day. `None` marks a missing reading.
#[derive(Debug, Clone, PartialEq)]
pub struct DailySample {
    values: Vec<Option<f64>>,
}

impl DailySample {
    pub fn new(values: Vec<Option<f64>>) -> Result<Self> {
        if values.len() != SAMPLES_PER_DAY {
            return Err(ProcessingError::SampleLength {
                expected: SAMPLES_PER_DAY,
                actual: values.len(),
            });
        }
        Ok(Self { values })
    }

    /// A day with every reading missing.
    pub fn masked() -> Self {
        Self {
            values: vec![None; SAMPLES_PER_DAY],
        }
    }

    pub fn from_values(values: &[f64]) -> Result<Self> {
        Self::new(values.iter().copied().map(Some).collect())
    }

    pub fn values(&self) -> &[Option<f64>] {
        &self.values
    }

    pub fn get(&self, index: usize) -> Option<f64> {
        self.values.get(index).copied().flatten()
    }

    pub fn is_fully_missing(&self) -> bool {
        self.values.iter().all(Option::is_none)
    }

    pub fn count_present(&self) -> usize {
        self.values.iter().filter(|v| v.is_some()).count()
    }

    pub fn count_zeros(&self) -> usize {
        self.values.iter().filter(|v| **v == Some(0.0)).count()
    }

    /// Turns every reading equal to `sentinel` into a missing reading.
    pub fn replace_sentinel(&mut self, sentinel: f64) {
        for value in self.values.iter_mut() {
            if *value == Some(sentinel) {
                *value = None;
            }
        }
    }

    pub fn mask(&mut self) {
        self.values.iter_mut().for_each(|v| *v = None);
    }
}
