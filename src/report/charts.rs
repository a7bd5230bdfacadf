//! SVG line charts for the report.
//!
//! The x-axis is the sample index with date labels, ascending; missing fields
//! simply omit that point from their series.

use std::path::{Path, PathBuf};

use plotters::prelude::*;

use crate::error::{Error, Result};
use crate::sample::Sample;
use crate::util::GIB;

pub const DISK_GROWTH_FILE: &str = "disk_growth.svg";
pub const DAILY_INGESTION_FILE: &str = "daily_ingestion.svg";
pub const AGENT_COUNT_FILE: &str = "agent_count.svg";

const CHART_SIZE: (u32, u32) = (900, 360);

pub struct ChartPaths {
    pub disk_growth: PathBuf,
    pub daily_ingestion: PathBuf,
    pub agent_count: PathBuf,
}

struct Series {
    name: String,
    points: Vec<(usize, f64)>,
}

/// Render all three charts from chronologically sorted samples.
pub fn render_all(samples: &[Sample], output_dir: &Path) -> Result<ChartPaths> {
    let x_labels: Vec<String> = samples
        .iter()
        .map(|s| s.date.format("%Y-%m-%d").to_string())
        .collect();

    let paths = ChartPaths {
        disk_growth: output_dir.join(DISK_GROWTH_FILE),
        daily_ingestion: output_dir.join(DAILY_INGESTION_FILE),
        agent_count: output_dir.join(AGENT_COUNT_FILE),
    };

    render_chart(
        &paths.disk_growth,
        "Disk Growth",
        "GiB",
        &x_labels,
        &disk_series(samples),
    )?;

    render_chart(
        &paths.daily_ingestion,
        "Daily /var Ingestion",
        "GiB/day",
        &x_labels,
        &[Series {
            name: "/var delta".to_string(),
            points: samples
                .iter()
                .enumerate()
                .map(|(i, s)| (i, s.ingestion_delta as f64 / GIB))
                .collect(),
        }],
    )?;

    render_chart(
        &paths.agent_count,
        "Agent Count",
        "Agents",
        &x_labels,
        &[Series {
            name: "agents".to_string(),
            points: samples
                .iter()
                .enumerate()
                .filter_map(|(i, s)| s.agent_count.map(|n| (i, n as f64)))
                .collect(),
        }],
    )?;

    Ok(paths)
}

/// One line per monitored directory, sized in GiB. Directory names come from
/// the samples themselves so renamed configs still chart their old columns.
fn disk_series(samples: &[Sample]) -> Vec<Series> {
    let mut names: Vec<&str> = samples
        .iter()
        .flat_map(|s| s.dir_bytes.keys())
        .map(String::as_str)
        .collect();
    names.sort_unstable();
    names.dedup();

    names
        .into_iter()
        .map(|name| Series {
            name: name.to_string(),
            points: samples
                .iter()
                .enumerate()
                .filter_map(|(i, s)| {
                    s.dir_bytes
                        .get(name)
                        .copied()
                        .flatten()
                        .map(|bytes| (i, bytes as f64 / GIB))
                })
                .collect(),
        })
        .collect()
}

fn render_chart(
    path: &Path,
    title: &str,
    y_desc: &str,
    x_labels: &[String],
    series: &[Series],
) -> Result<()> {
    let render = Error::Render;

    let x_max = x_labels.len().saturating_sub(1).max(1);
    let (y_min, y_max) = y_range(series);

    let root = SVGBackend::new(path, CHART_SIZE).into_drawing_area();
    root.fill(&WHITE).map_err(|e| render(e.to_string()))?;

    let mut chart = ChartBuilder::on(&root)
        .caption(title, ("sans-serif", 22))
        .margin(12)
        .x_label_area_size(40)
        .y_label_area_size(60)
        .build_cartesian_2d(0..x_max, y_min..y_max)
        .map_err(|e| render(e.to_string()))?;

    chart
        .configure_mesh()
        .x_labels(8.min(x_labels.len().max(1)))
        .x_label_formatter(&|idx| x_labels.get(*idx).cloned().unwrap_or_default())
        .x_desc("Date")
        .y_desc(y_desc)
        .draw()
        .map_err(|e| render(e.to_string()))?;

    for (index, series) in series.iter().enumerate() {
        let color = Palette99::pick(index).to_rgba();
        chart
            .draw_series(
                LineSeries::new(series.points.iter().copied(), color.stroke_width(2)).point_size(3),
            )
            .map_err(|e| render(e.to_string()))?
            .label(series.name.clone())
            .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 16, y)], color.stroke_width(2)));
    }

    chart
        .configure_series_labels()
        .background_style(&WHITE.mix(0.8))
        .border_style(&BLACK)
        .draw()
        .map_err(|e| render(e.to_string()))?;

    root.present().map_err(|e| render(e.to_string()))?;
    Ok(())
}

fn y_range(series: &[Series]) -> (f64, f64) {
    let values = series.iter().flat_map(|s| s.points.iter().map(|(_, v)| *v));

    let mut min = f64::INFINITY;
    let mut max = f64::NEG_INFINITY;
    for value in values {
        min = min.min(value);
        max = max.max(value);
    }

    if !min.is_finite() || !max.is_finite() {
        return (0.0, 1.0);
    }

    let min = min.min(0.0);
    let max = if max <= min { min + 1.0 } else { max };
    let pad = (max - min) * 0.05;
    (min - pad, max + pad)
}
