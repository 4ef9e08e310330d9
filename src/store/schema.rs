use serde::{Deserialize, Serialize};

use crate::session::record::TestRecord;

pub const SCHEMA_VERSION: u32 = 1;

/// On-disk envelope for the test history. Records inside keep their own
/// forward-compatibility story (optional `question_topics`), so the envelope
/// version only moves on layout changes.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct HistoryData {
    pub schema_version: u32,
    #[serde(alias = "tests")]
    pub records: Vec<TestRecord>,
}

impl Default for HistoryData {
    fn default() -> Self {
        Self {
            schema_version: SCHEMA_VERSION,
            records: Vec::new(),
        }
    }
}
