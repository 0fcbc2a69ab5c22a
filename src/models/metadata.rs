use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// Metadata mapping stored in a source's Meta sheet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceMetadata {
    pub yr_start: i32,

    /// Keys other than `yr_start`, kept as-is.
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

impl SourceMetadata {
    pub fn new(yr_start: i32) -> Self {
        Self {
            yr_start,
            extra: BTreeMap::new(),
        }
    }

    pub fn year(&self) -> i32 {
        self.yr_start
    }
}
