use crate::error::ProcessingError;
use serde::{Deserialize, Serialize};

/// A source left out of the results, with the error that excluded it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkippedSource {
    pub source: String,
    pub reason: String,
}

impl SkippedSource {
    pub fn new(source: impl Into<String>, error: &ProcessingError) -> Self {
        Self {
            source: source.into(),
            reason: error.to_string(),
        }
    }
}
