//! Metrics collection: one call produces one in-memory [`Sample`].

pub mod agents;
pub mod disk;

use std::collections::BTreeMap;

use chrono::Local;
use tracing::{debug, warn};

use crate::config::Config;
use crate::error::{Error, Result};
use crate::sample::{Sample, VAR_KEY};

/// Walk every monitored directory, derive the ingestion delta against the
/// previous sample, and query the agent count. Per-directory failures degrade
/// to the unavailable sentinel; only an agent failure under `require_agents`
/// aborts the run.
pub fn collect(config: &Config, previous: Option<&Sample>) -> Result<Sample> {
    let date = Local::now().date_naive();
    let mut dir_bytes = BTreeMap::new();

    for dir in &config.dirs {
        match disk::dir_size(&dir.path) {
            Ok((bytes, warnings)) => {
                for warning in warnings {
                    warn!("{}: {warning}", dir.name);
                }
                debug!("{} ({}): {} bytes", dir.name, dir.path.display(), bytes);
                dir_bytes.insert(dir.name.clone(), Some(bytes));
            }
            Err(e) => {
                warn!("{} unavailable, recording blank field: {e}", dir.name);
                dir_bytes.insert(dir.name.clone(), None);
            }
        }
    }

    let var_now = dir_bytes.get(VAR_KEY).copied().flatten();
    let ingestion_delta = ingestion_delta(previous, var_now);

    let agent_count = if config.collect_agents {
        match query_agents(config) {
            Ok(count) => Some(count),
            Err(e) if config.require_agents => return Err(e),
            Err(e) => {
                warn!("agent query failed, recording sample without agent count: {e}");
                None
            }
        }
    } else {
        None
    };

    Ok(Sample {
        date,
        dir_bytes,
        ingestion_delta,
        agent_count,
    })
}

/// Change in `/var` size since the previous sample. Zero on the first run, or
/// whenever either side is unavailable. Negative when rotation or pruning
/// shrank the tree.
pub fn ingestion_delta(previous: Option<&Sample>, var_now: Option<u64>) -> i64 {
    match (previous.and_then(Sample::var_bytes), var_now) {
        (Some(prev), Some(now)) => now as i64 - prev as i64,
        _ => 0,
    }
}

fn query_agents(config: &Config) -> Result<u64> {
    let credentials = config
        .credentials
        .clone()
        .ok_or_else(|| Error::Configuration("agent query requires credentials".to_string()))?;

    agents::AgentClient::new(config, credentials)?.agent_count()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn sample(var_bytes: Option<u64>) -> Sample {
        let mut dir_bytes = BTreeMap::new();
        dir_bytes.insert(VAR_KEY.to_string(), var_bytes);
        Sample {
            date: NaiveDate::from_ymd_opt(2025, 6, 1).unwrap(),
            dir_bytes,
            ingestion_delta: 0,
            agent_count: None,
        }
    }

    #[test]
    fn first_run_delta_is_zero() {
        assert_eq!(ingestion_delta(None, Some(180)), 0);
    }

    #[test]
    fn delta_is_difference_against_previous_row() {
        let prev = sample(Some(130));
        assert_eq!(ingestion_delta(Some(&prev), Some(180)), 50);
    }

    #[test]
    fn delta_can_go_negative_after_rotation() {
        let prev = sample(Some(150));
        assert_eq!(ingestion_delta(Some(&prev), Some(130)), -20);
    }

    #[test]
    fn unavailable_var_measurement_yields_zero() {
        let prev = sample(Some(130));
        assert_eq!(ingestion_delta(Some(&prev), None), 0);
        assert_eq!(ingestion_delta(Some(&sample(None)), Some(180)), 0);
    }
}
