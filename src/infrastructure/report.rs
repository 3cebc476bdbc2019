// Printable session report rendered from the historical log
use crate::domain::telemetry::{DerivedRecord, DisplayRecord};
use std::fmt::Write;
use std::sync::Arc;

const COLUMNS: [&str; 7] = [
    "Throttle (us)",
    "Thrust (g)",
    "Voltage (V)",
    "Current (A)",
    "Power (W)",
    "RPM",
    "Efficiency (g/W)",
];

const STYLE: &str = "table { width: 100%; border-collapse: collapse; } \
th, td { border: 1px solid black; padding: 8px; text-align: left; }";

/// Render the log as a standalone HTML document that prints itself on load.
pub fn render_log_document(records: &[Arc<DerivedRecord>]) -> String {
    let mut html = String::with_capacity(512 + records.len() * 160);
    html.push_str("<!DOCTYPE html>\n<html>\n<head>\n<title>Print Data</title>\n");
    let _ = writeln!(html, "<style>{}</style>", STYLE);
    html.push_str("</head>\n<body onload=\"window.print()\">\n<h1>Recorded Data</h1>\n");
    html.push_str(&render_log_table(records));
    html.push_str("</body>\n</html>\n");
    html
}

/// Render only the table, for embedding in the dashboard page.
pub fn render_log_table(records: &[Arc<DerivedRecord>]) -> String {
    let mut html = String::from("<table>\n<thead>\n<tr>");
    for column in COLUMNS {
        let _ = write!(html, "<th>{}</th>", column);
    }
    html.push_str("</tr>\n</thead>\n<tbody>\n");

    for record in records {
        write_row(&mut html, &record.display());
    }

    html.push_str("</tbody>\n</table>\n");
    html
}

fn write_row(html: &mut String, record: &DisplayRecord) {
    let _ = writeln!(
        html,
        "<tr><td>{}</td><td>{:.2}</td><td>{:.2}</td><td>{:.2}</td><td>{:.2}</td><td>{:.2}</td><td>{:.2}</td></tr>",
        record.throttle,
        record.thrust,
        record.voltage,
        record.current,
        record.power,
        record.rpm,
        record.efficiency,
    );
}
