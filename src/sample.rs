use std::collections::BTreeMap;

use chrono::NaiveDate;

/// History column used to derive the daily ingestion delta.
pub const VAR_KEY: &str = "var";

/// One timestamped row of collected metrics.
///
/// `dir_bytes` maps a monitored directory's short name to its recursive size;
/// `None` means the directory was missing or unreadable at collection time.
/// `agent_count` is `None` when the agent API was skipped or unreachable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sample {
    pub date: NaiveDate,
    pub dir_bytes: BTreeMap<String, Option<u64>>,
    pub ingestion_delta: i64,
    pub agent_count: Option<u64>,
}

impl Sample {
    /// Size of the `/var` tree in this sample, if it was measurable.
    pub fn var_bytes(&self) -> Option<u64> {
        self.dir_bytes.get(VAR_KEY).copied().flatten()
    }
}
