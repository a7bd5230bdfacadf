//! HTML assembly for the sizing report.
//!
//! One self-contained document: a summary card with the latest values, linear
//! /var projections, the three charts, and a table of recent rows
//! (chronological, most recent last).

use std::fmt::Write;

use chrono::NaiveDate;

use crate::report::charts::{AGENT_COUNT_FILE, DAILY_INGESTION_FILE, DISK_GROWTH_FILE};
use crate::sample::Sample;
use crate::util::{format_bytes, format_signed_bytes, GIB};

/// Rows shown in the recent-history table.
const TABLE_ROWS: usize = 30;

const STYLE: &str = r#"
body { font-family: "Segoe UI", Tahoma, Geneva, Verdana, sans-serif; margin: 20px; background-color: #f7f9fb; color: #333; }
h1, h2, h3 { color: #1e3a8a; margin-bottom: 10px; }
.card { background-color: #ffffff; border: 1px solid #d1d5db; border-radius: 8px; padding: 15px; margin-bottom: 20px; box-shadow: 0 2px 6px rgba(0,0,0,0.05); }
.card ul { list-style-type: none; padding-left: 0; }
.card ul li { padding: 4px 0; border-bottom: 1px solid #e5e7eb; }
table { width: 100%; border-collapse: collapse; margin-top: 10px; }
th, td { border: 1px solid #d1d5db; padding: 8px; text-align: left; }
th { background-color: #1e40af; color: #ffffff; }
tr:nth-child(even) { background-color: #f3f4f6; }
img { max-width: 100%; height: auto; border: 1px solid #d1d5db; border-radius: 6px; margin-top: 10px; }
footer { margin-top: 30px; color: #6b7280; font-size: 12px; text-align: center; }
"#;

/// Render the report document from chronologically sorted samples.
pub fn render(samples: &[Sample], generated: NaiveDate) -> String {
    let mut html = String::new();

    let _ = write!(
        html,
        "<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"utf-8\">\n\
         <title>Server Sizing Report - {generated}</title>\n<style>{STYLE}</style>\n</head>\n<body>\n\
         <h1>Server Sizing Report</h1>\n"
    );

    render_summary(&mut html, samples, generated);
    render_projections(&mut html, samples);

    let _ = write!(
        html,
        "<h2>Graphs</h2>\n\
         <div class=\"card\"><h3>Disk Growth</h3><img src=\"{DISK_GROWTH_FILE}\" alt=\"Disk growth\"></div>\n\
         <div class=\"card\"><h3>Daily Ingestion</h3><img src=\"{DAILY_INGESTION_FILE}\" alt=\"Daily ingestion\"></div>\n\
         <div class=\"card\"><h3>Agent Count</h3><img src=\"{AGENT_COUNT_FILE}\" alt=\"Agent count\"></div>\n"
    );

    render_table(&mut html, samples);

    let _ = write!(
        html,
        "<footer><p>Generated by sizemon {}</p></footer>\n</body>\n</html>\n",
        env!("CARGO_PKG_VERSION")
    );

    html
}

fn render_summary(html: &mut String, samples: &[Sample], generated: NaiveDate) {
    let _ = write!(html, "<div class=\"card\"><strong>Date:</strong> {generated}<br>");

    match samples.last() {
        Some(latest) => {
            let agents = latest
                .agent_count
                .map(|n| n.to_string())
                .unwrap_or_else(|| "unavailable".to_string());
            let _ = write!(html, "<strong>Agent count:</strong> {agents}<br>");
            let _ = write!(html, "<strong>Latest sizes:</strong><ul>");
            for (name, bytes) in &latest.dir_bytes {
                let size = (*bytes)
                    .map(format_bytes)
                    .unwrap_or_else(|| "unavailable".to_string());
                let _ = write!(html, "<li>{} : {size}</li>", escape(name));
            }
            let _ = write!(html, "</ul>");
        }
        None => {
            let _ = write!(html, "<p>No samples collected yet.</p>");
        }
    }

    let _ = write!(html, "</div>\n");
}

fn render_projections(html: &mut String, samples: &[Sample]) {
    let render_value = |proj: Option<f64>| match proj {
        Some(bytes) => format!("{:.2} GiB", bytes / GIB),
        None => "N/A".to_string(),
    };

    let _ = write!(
        html,
        "<div class=\"card\"><strong>Projection (linear)</strong><ul>\
         <li>Projected /var in 180 days: {}</li>\
         <li>Projected /var in 365 days: {}</li>\
         </ul></div>\n",
        render_value(super::project_var(samples, 180)),
        render_value(super::project_var(samples, 365)),
    );
}

fn render_table(html: &mut String, samples: &[Sample]) {
    let mut names: Vec<&str> = samples
        .iter()
        .flat_map(|s| s.dir_bytes.keys())
        .map(String::as_str)
        .collect();
    names.sort_unstable();
    names.dedup();

    let _ = write!(html, "<div class=\"card\"><h3>Recent history</h3><table>\n<tr><th>Date</th>");
    for name in &names {
        let _ = write!(html, "<th>{}</th>", escape(name));
    }
    let _ = write!(html, "<th>Ingestion delta</th><th>Agents</th></tr>\n");

    let start = samples.len().saturating_sub(TABLE_ROWS);
    for sample in &samples[start..] {
        let _ = write!(html, "<tr><td>{}</td>", sample.date);
        for name in &names {
            let cell = sample
                .dir_bytes
                .get(*name)
                .copied()
                .flatten()
                .map(format_bytes)
                .unwrap_or_default();
            let _ = write!(html, "<td>{cell}</td>");
        }
        let agents = sample
            .agent_count
            .map(|n| n.to_string())
            .unwrap_or_default();
        let _ = write!(
            html,
            "<td>{}</td><td>{agents}</td></tr>\n",
            format_signed_bytes(sample.ingestion_delta)
        );
    }

    let _ = write!(html, "</table></div>\n");
}

fn escape(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}
