//! Append-only CSV history of samples.
//!
//! The file is self-describing: its header row fixes the column order, and
//! both readers and appenders follow it. Appends rewrite the whole table to a
//! temp file in the same directory and rename it into place, so a crash
//! mid-write never leaves a torn row. Corrupt rows are skipped on read with a
//! warning, never fatal.

use std::collections::BTreeMap;
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use tempfile::NamedTempFile;
use tracing::warn;

use crate::error::{Error, Result};
use crate::sample::Sample;

const DATE_COLUMN: &str = "date";
const DELTA_COLUMN: &str = "ingestion_delta_bytes";
const AGENT_COLUMN: &str = "agent_count";
const BYTES_SUFFIX: &str = "_bytes";

pub struct HistoryStore {
    path: PathBuf,
}

impl HistoryStore {
    pub fn new(path: PathBuf) -> Self {
        HistoryStore { path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append one sample as a new row. Creates the file (and its header,
    /// derived from the sample) on first use; afterwards the existing header
    /// dictates the columns, and directories the header does not know about
    /// are not recorded.
    pub fn append(&self, sample: &Sample) -> Result<()> {
        let (header, body) = match std::fs::read_to_string(&self.path) {
            Ok(existing) => match existing.split_once('\n') {
                Some((first, rest)) => (first.to_string(), rest.to_string()),
                None => (existing, String::new()),
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => (header_for(sample), String::new()),
            Err(e) => return Err(e.into()),
        };

        let columns = split_row(&header);
        let row = encode_row(sample, &columns);

        let dir = self.path.parent().unwrap_or_else(|| Path::new("."));
        std::fs::create_dir_all(dir)?;

        let mut tmp = NamedTempFile::new_in(dir)?;
        writeln!(tmp, "{header}")?;
        if !body.is_empty() {
            tmp.write_all(body.as_bytes())?;
            if !body.ends_with('\n') {
                writeln!(tmp)?;
            }
        }
        writeln!(tmp, "{row}")?;
        tmp.persist(&self.path).map_err(|e| Error::Io(e.error))?;

        Ok(())
    }

    /// All parseable rows in file order. A missing or empty file reads as an
    /// empty history. Rows with the wrong column count or unparsable fields
    /// are dropped with a warning.
    pub fn read_all(&self) -> Result<Vec<Sample>> {
        let text = match std::fs::read_to_string(&self.path) {
            Ok(text) => text,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut lines = text.lines().enumerate();
        let Some((_, header)) = lines.next() else {
            return Ok(Vec::new());
        };
        let columns = split_row(header);

        let mut samples = Vec::new();
        for (index, line) in lines {
            if line.trim().is_empty() {
                continue;
            }
            match decode_row(line, &columns) {
                Ok(sample) => samples.push(sample),
                Err(reason) => {
                    let err = Error::CorruptHistory {
                        line: index + 1,
                        reason,
                    };
                    warn!("skipping row: {err}");
                }
            }
        }

        Ok(samples)
    }

    /// Most recently appended parseable sample, if any.
    pub fn last(&self) -> Result<Option<Sample>> {
        Ok(self.read_all()?.pop())
    }
}

fn header_for(sample: &Sample) -> String {
    let mut columns = vec![DATE_COLUMN.to_string()];
    for name in sample.dir_bytes.keys() {
        columns.push(format!("{name}{BYTES_SUFFIX}"));
    }
    columns.push(DELTA_COLUMN.to_string());
    columns.push(AGENT_COLUMN.to_string());
    columns.join(",")
}

fn split_row(line: &str) -> Vec<String> {
    line.split(',').map(|field| field.trim().to_string()).collect()
}

fn encode_row(sample: &Sample, columns: &[String]) -> String {
    let fields: Vec<String> = columns
        .iter()
        .map(|column| match column.as_str() {
            DATE_COLUMN => sample.date.format("%Y-%m-%d").to_string(),
            DELTA_COLUMN => sample.ingestion_delta.to_string(),
            AGENT_COLUMN => sample
                .agent_count
                .map(|n| n.to_string())
                .unwrap_or_default(),
            name => match name.strip_suffix(BYTES_SUFFIX) {
                Some(dir) => sample
                    .dir_bytes
                    .get(dir)
                    .copied()
                    .flatten()
                    .map(|bytes| bytes.to_string())
                    .unwrap_or_default(),
                None => String::new(),
            },
        })
        .collect();

    fields.join(",")
}

fn decode_row(line: &str, columns: &[String]) -> std::result::Result<Sample, String> {
    let fields = split_row(line);
    if fields.len() != columns.len() {
        return Err(format!(
            "expected {} columns, found {}",
            columns.len(),
            fields.len()
        ));
    }

    let mut date = None;
    let mut dir_bytes = BTreeMap::new();
    let mut ingestion_delta = 0i64;
    let mut agent_count = None;

    for (column, field) in columns.iter().zip(&fields) {
        match column.as_str() {
            DATE_COLUMN => {
                date = Some(
                    NaiveDate::parse_from_str(field, "%Y-%m-%d")
                        .map_err(|e| format!("bad date {field:?}: {e}"))?,
                );
            }
            DELTA_COLUMN => {
                ingestion_delta = field
                    .parse::<i64>()
                    .map_err(|e| format!("bad ingestion delta {field:?}: {e}"))?;
            }
            AGENT_COLUMN => {
                agent_count = if field.is_empty() {
                    None
                } else {
                    Some(
                        field
                            .parse::<u64>()
                            .map_err(|e| format!("bad agent count {field:?}: {e}"))?,
                    )
                };
            }
            name => {
                // columns this version does not understand are carried, not fatal
                let Some(dir) = name.strip_suffix(BYTES_SUFFIX) else {
                    continue;
                };
                let bytes = if field.is_empty() {
                    None
                } else {
                    Some(
                        field
                            .parse::<u64>()
                            .map_err(|e| format!("bad size for {dir}: {e}"))?,
                    )
                };
                dir_bytes.insert(dir.to_string(), bytes);
            }
        }
    }

    let date = date.ok_or_else(|| "no date column in header".to_string())?;

    Ok(Sample {
        date,
        dir_bytes,
        ingestion_delta,
        agent_count,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(day: u32, var_bytes: u64, delta: i64, agents: Option<u64>) -> Sample {
        let mut dir_bytes = BTreeMap::new();
        dir_bytes.insert("var".to_string(), Some(var_bytes));
        dir_bytes.insert("var_log".to_string(), Some(var_bytes / 2));
        Sample {
            date: NaiveDate::from_ymd_opt(2025, 6, day).unwrap(),
            dir_bytes,
            ingestion_delta: delta,
            agent_count: agents,
        }
    }

    fn store_in(dir: &Path) -> HistoryStore {
        HistoryStore::new(dir.join("sizing_history.csv"))
    }

    #[test]
    fn append_then_read_all_round_trips() {
        let tmp = tempfile::tempdir().unwrap();
        let store = store_in(tmp.path());

        let first = sample(1, 100, 0, Some(12));
        let second = sample(2, 150, 50, None);
        store.append(&first).unwrap();
        store.append(&second).unwrap();

        let rows = store.read_all().unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0], first);
        assert_eq!(*rows.last().unwrap(), second);
    }

    #[test]
    fn missing_file_reads_as_empty_history() {
        let tmp = tempfile::tempdir().unwrap();
        let store = store_in(tmp.path());
        assert!(store.read_all().unwrap().is_empty());
        assert!(store.last().unwrap().is_none());
    }

    #[test]
    fn header_is_written_once() {
        let tmp = tempfile::tempdir().unwrap();
        let store = store_in(tmp.path());

        store.append(&sample(1, 100, 0, Some(3))).unwrap();
        store.append(&sample(2, 150, 50, Some(3))).unwrap();

        let text = std::fs::read_to_string(store.path()).unwrap();
        let mut lines = text.lines();
        assert_eq!(
            lines.next().unwrap(),
            "date,var_bytes,var_log_bytes,ingestion_delta_bytes,agent_count"
        );
        assert_eq!(text.lines().count(), 3);
    }

    #[test]
    fn corrupt_row_is_skipped_not_fatal() {
        let tmp = tempfile::tempdir().unwrap();
        let store = store_in(tmp.path());

        store.append(&sample(1, 100, 0, Some(3))).unwrap();
        store.append(&sample(2, 150, 50, Some(4))).unwrap();

        // wrong column count on one row, non-numeric field on another
        let mut text = std::fs::read_to_string(store.path()).unwrap();
        text.push_str("2025-06-03,130\n");
        text.push_str("2025-06-04,abc,65,20,5\n");
        std::fs::write(store.path(), text).unwrap();

        store.append(&sample(5, 180, 50, Some(5))).unwrap();

        let rows = store.read_all().unwrap();
        assert_eq!(rows.len(), 3);
        assert_eq!(
            rows.iter().map(|s| s.date.to_string()).collect::<Vec<_>>(),
            vec!["2025-06-01", "2025-06-02", "2025-06-05"]
        );
    }

    #[test]
    fn blank_fields_decode_as_sentinels() {
        let tmp = tempfile::tempdir().unwrap();
        let store = store_in(tmp.path());

        let mut dir_bytes = BTreeMap::new();
        dir_bytes.insert("var".to_string(), None::<u64>);
        let degraded = Sample {
            date: NaiveDate::from_ymd_opt(2025, 6, 7).unwrap(),
            dir_bytes,
            ingestion_delta: 0,
            agent_count: None,
        };

        store.append(&degraded).unwrap();
        let rows = store.read_all().unwrap();
        assert_eq!(rows[0].var_bytes(), None);
        assert_eq!(rows[0].agent_count, None);
    }

    #[test]
    fn same_day_appends_accumulate() {
        let tmp = tempfile::tempdir().unwrap();
        let store = store_in(tmp.path());

        store.append(&sample(1, 100, 0, Some(3))).unwrap();
        store.append(&sample(1, 120, 20, Some(3))).unwrap();

        let rows = store.read_all().unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].date, rows[1].date);
    }

    #[test]
    fn appends_follow_the_existing_header() {
        let tmp = tempfile::tempdir().unwrap();
        let store = store_in(tmp.path());

        store.append(&sample(1, 100, 0, Some(3))).unwrap();

        // later sample with an extra directory the header does not know about
        let mut extra = sample(2, 150, 50, Some(3));
        extra.dir_bytes.insert("opt".to_string(), Some(999));
        store.append(&extra).unwrap();

        let text = std::fs::read_to_string(store.path()).unwrap();
        assert!(!text.contains("999"));
        assert_eq!(store.read_all().unwrap().len(), 2);
    }
}
