use serde::{Deserialize, Serialize};

/// Part of the job input processed by one map task.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InputSplit {
    /// File the split belongs to, if the input is file based.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    /// Offset of the first byte of the split.
    #[serde(default)]
    pub start: u64,
    /// Length of the split in bytes.
    #[serde(default)]
    pub length: u64,
    /// Hosts where the data of the split is local.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub hosts: Vec<String>,
}
