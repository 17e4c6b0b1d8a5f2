//! File export of the current message window. All three formats act on a
//! snapshot of the window in its display order (newest first) and write
//! synchronously; the window is small enough that blocking a frame is
//! cheaper than coordinating a background writer.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use serde_json::Value;
use thiserror::Error;

use super::window::MessageWindow;

const ARRIVAL_COLUMN: &str = "arrivalTime";

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("failed to serialize messages: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("failed to write {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    /// Indented JSON array of records.
    Json,
    /// Tabular sheet: one row per message, columns from observed fields.
    Spreadsheet,
    /// Tab-separated field values, one line per message.
    Text,
}

impl ExportFormat {
    pub fn file_name(&self) -> &'static str {
        match self {
            ExportFormat::Json => "mqtt-messages.json",
            ExportFormat::Spreadsheet => "mqtt-messages.csv",
            ExportFormat::Text => "mqtt-messages.txt",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            ExportFormat::Json => "JSON",
            ExportFormat::Spreadsheet => "CSV",
            ExportFormat::Text => "Text",
        }
    }
}

/// Renders the window in the given format.
pub fn render(format: ExportFormat, window: &MessageWindow) -> Result<String, ExportError> {
    match format {
        ExportFormat::Json => to_json(window),
        ExportFormat::Spreadsheet => Ok(to_csv(window)),
        ExportFormat::Text => Ok(to_text(window)),
    }
}

/// Renders and writes the window into `dir`, returning the file path.
pub fn write_to(
    dir: &Path,
    format: ExportFormat,
    window: &MessageWindow,
) -> Result<PathBuf, ExportError> {
    let content = render(format, window)?;
    let path = dir.join(format.file_name());
    std::fs::write(&path, content).map_err(|source| ExportError::Io {
        path: path.clone(),
        source,
    })?;
    Ok(path)
}

fn to_json(window: &MessageWindow) -> Result<String, ExportError> {
    let records: Vec<Value> = window
        .iter()
        .map(|message| Value::Object(message.to_record()))
        .collect();
    Ok(serde_json::to_string_pretty(&records)?)
}

/// One row per message. The header is the arrival column followed by the
/// sorted union of every payload field observed anywhere in the window, so
/// sparse payloads still line up.
fn to_csv(window: &MessageWindow) -> String {
    let mut field_set: BTreeSet<&str> = BTreeSet::new();
    for message in window.iter() {
        field_set.extend(message.field_names());
    }
    let columns: Vec<&str> = field_set.into_iter().collect();

    let mut lines = Vec::with_capacity(window.len() + 1);
    let mut header = vec![escape_field(ARRIVAL_COLUMN)];
    header.extend(columns.iter().map(|c| escape_field(c)));
    lines.push(header.join(","));

    for message in window.iter() {
        let mut row = vec![escape_field(&message.arrival_display())];
        row.extend(columns.iter().map(|c| escape_field(&message.display(c))));
        lines.push(row.join(","));
    }
    let mut output = lines.join("\n");
    output.push('\n');
    output
}

/// Each message's payload field values joined by tabs, one line per
/// message, in window (newest-first) order.
fn to_text(window: &MessageWindow) -> String {
    window
        .iter()
        .map(|message| {
            message
                .values()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join("\t")
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// RFC 4180 quoting: wrap when the field contains the delimiter, a quote or
/// a line break, doubling embedded quotes.
fn escape_field(field: &str) -> String {
    let needs_quoting = field.contains(',')
        || field.contains('"')
        || field.contains('\n')
        || field.contains('\r');
    if needs_quoting {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::telemetry::message::TelemetryMessage;
    use chrono::{Duration, NaiveDate, NaiveDateTime};

    fn arrival(offset_secs: i64) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2026, 2, 10)
            .expect("valid date")
            .and_hms_opt(9, 15, 0)
            .expect("valid time")
            + Duration::seconds(offset_secs)
    }

    fn window_of(payloads: &[&str]) -> MessageWindow {
        let mut window = MessageWindow::new();
        for (i, payload) in payloads.iter().enumerate() {
            window.push(
                TelemetryMessage::decode_at(payload.as_bytes(), arrival(i as i64))
                    .expect("payload should decode"),
            );
        }
        window
    }

    #[test]
    fn text_export_joins_field_values_with_tabs() {
        let window = window_of(&[r#"{"a": 1, "b": 2}"#]);
        assert_eq!(render(ExportFormat::Text, &window).expect("render"), "1\t2");
    }

    #[test]
    fn text_export_is_newest_first() {
        let window = window_of(&[r#"{"a": 1}"#, r#"{"a": 2}"#]);
        assert_eq!(
            render(ExportFormat::Text, &window).expect("render"),
            "2\n1"
        );
    }

    #[test]
    fn json_export_of_empty_window_is_empty_array() {
        let window = MessageWindow::new();
        assert_eq!(render(ExportFormat::Json, &window).expect("render"), "[]");
    }

    #[test]
    fn json_export_contains_arrival_time() {
        let window = window_of(&[r#"{"temperature": 21}"#]);
        let rendered = render(ExportFormat::Json, &window).expect("render");
        let parsed: Vec<Value> = serde_json::from_str(&rendered).expect("valid JSON");
        assert_eq!(parsed[0]["temperature"], 21);
        assert_eq!(parsed[0]["arrivalTime"], "10-02-2026 09:15:00");
    }

    #[test]
    fn csv_header_is_sorted_union_of_observed_fields() {
        let window = window_of(&[r#"{"humidity": 40}"#, r#"{"temperature": 21}"#]);
        let rendered = render(ExportFormat::Spreadsheet, &window).expect("render");
        let mut lines = rendered.lines();
        assert_eq!(lines.next(), Some("arrivalTime,humidity,temperature"));
        // Newest first: the temperature-only message leads.
        assert_eq!(lines.next(), Some("10-02-2026 09:15:01,,21"));
        assert_eq!(lines.next(), Some("10-02-2026 09:15:00,40,"));
    }

    #[test]
    fn csv_quotes_fields_that_need_it() {
        let window = window_of(&[r#"{"note": "hello, \"world\""}"#]);
        let rendered = render(ExportFormat::Spreadsheet, &window).expect("render");
        assert!(rendered.contains("\"hello, \"\"world\"\"\""));
    }

    #[test]
    fn write_to_creates_the_named_file() {
        let dir = tempfile::tempdir().expect("tempdir");
        let window = window_of(&[r#"{"a": 1}"#]);
        let path =
            write_to(dir.path(), ExportFormat::Json, &window).expect("write should succeed");
        assert_eq!(
            path.file_name().and_then(|n| n.to_str()),
            Some("mqtt-messages.json")
        );
        let content = std::fs::read_to_string(path).expect("file readable");
        assert!(content.starts_with('['));
    }
}
