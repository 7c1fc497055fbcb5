use chrono::{DateTime, Local};

/// Render a timestamp as `DD/MM/YYYY, HH:MM:SS` (24-hour).
pub fn format_timestamp(ts: &DateTime<Local>) -> String {
    ts.format("%d/%m/%Y, %H:%M:%S").to_string()
}
