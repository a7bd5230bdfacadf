//! Report generation: a pure function from a history snapshot to one HTML
//! document plus three SVG charts. Never touches the history file.

pub mod charts;
pub mod html;

use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::Local;
use tempfile::NamedTempFile;
use tracing::info;

use crate::error::{Error, Result};
use crate::sample::Sample;

pub const REPORT_FILE: &str = "report.html";

pub struct ReportPaths {
    pub html: PathBuf,
    pub charts: charts::ChartPaths,
}

/// Regenerate every artifact from the given samples, overwriting prior
/// output. Samples are sorted by date first; the store appends in
/// chronological order, but a duplicate-day or manual out-of-order append is
/// possible, and charts must not zigzag because of it.
pub fn generate(samples: &[Sample], output_dir: &Path) -> Result<ReportPaths> {
    let mut sorted = samples.to_vec();
    sorted.sort_by_key(|s| s.date);

    std::fs::create_dir_all(output_dir)?;

    let chart_paths = charts::render_all(&sorted, output_dir)?;

    let document = html::render(&sorted, Local::now().date_naive());
    let html_path = output_dir.join(REPORT_FILE);
    let mut tmp = NamedTempFile::new_in(output_dir)?;
    tmp.write_all(document.as_bytes())?;
    tmp.persist(&html_path).map_err(|e| Error::Io(e.error))?;

    info!("report written: {}", html_path.display());

    Ok(ReportPaths {
        html: html_path,
        charts: chart_paths,
    })
}

/// Linear /var projection `days_forward` days past the last sample, in bytes.
/// Slope is taken from the first and last samples that measured /var; `None`
/// with fewer than two such samples.
pub fn project_var(samples: &[Sample], days_forward: i64) -> Option<f64> {
    let mut measured = samples.iter().filter(|s| s.var_bytes().is_some());
    let first = measured.next()?;
    let last = measured.last()?;

    let days = (last.date - first.date).num_days().max(1);
    let slope = (last.var_bytes()? as f64 - first.var_bytes()? as f64) / days as f64;

    Some(last.var_bytes()? as f64 + slope * days_forward as f64)
}
