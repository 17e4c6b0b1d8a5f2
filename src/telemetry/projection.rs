//! Pure projections of the message window for the four view modes. Nothing
//! in here mutates state; every function recomputes from the window it is
//! handed, so switching views is instantaneous.

use serde_json::Value;
use tracing::error;

use super::message::StatusClass;
use super::window::MessageWindow;

/// Column headers of the table view, in render order. The first column is
/// always the arrival stamp; the rest are the well-known payload fields.
pub const TABLE_HEADERS: [&str; 6] = [
    "Arrival Time",
    "Temperature",
    "Humidity",
    "Light",
    "Status",
    "Timestamp",
];

const TABLE_FIELDS: [&str; 5] = ["temperature", "humidity", "light", "status", "timestamp"];

/// One table row; fields absent from a payload render as empty cells.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableRow {
    pub arrival: String,
    pub cells: [String; 5],
    pub status_class: StatusClass,
}

pub fn table_rows(window: &MessageWindow) -> Vec<TableRow> {
    window
        .iter()
        .map(|message| TableRow {
            arrival: message.arrival_display(),
            cells: TABLE_FIELDS.map(|field| message.display(field)),
            status_class: message.status_class(),
        })
        .collect()
}

/// The whole window as formatted JSON, newest first.
pub fn raw_json(window: &MessageWindow) -> String {
    let records: Vec<Value> = window
        .iter()
        .map(|message| Value::Object(message.to_record()))
        .collect();
    serde_json::to_string_pretty(&records).unwrap_or_else(|e| {
        error!("Could not render window as JSON: {}", e);
        "[]".to_string()
    })
}

/// One line per message: arrival stamp and status.
pub fn timeline_lines(window: &MessageWindow) -> Vec<String> {
    window
        .iter()
        .map(|message| format!("{} - {}", message.arrival_display(), message.display("status")))
        .collect()
}

/// Chart data: temperature and humidity over arrival time, chronological.
/// The x axis is seconds since the oldest retained sample.
#[derive(Debug, Clone, PartialEq)]
pub struct ChartSeries {
    pub temperature: Vec<[f64; 2]>,
    pub humidity: Vec<[f64; 2]>,
}

/// `None` for an empty window, so the caller renders an empty-state message
/// instead of a bare axes frame.
pub fn chart_series(window: &MessageWindow) -> Option<ChartSeries> {
    let origin = window.chronological().next()?.arrival_time();
    let mut temperature = Vec::new();
    let mut humidity = Vec::new();
    for message in window.chronological() {
        let x = (message.arrival_time() - origin).num_milliseconds() as f64 / 1000.0;
        if let Some(value) = message.get("temperature").and_then(|v| v.as_f64()) {
            temperature.push([x, value]);
        }
        if let Some(value) = message.get("humidity").and_then(|v| v.as_f64()) {
            humidity.push([x, value]);
        }
    }
    Some(ChartSeries {
        temperature,
        humidity,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::telemetry::message::TelemetryMessage;
    use chrono::{Duration, NaiveDate, NaiveDateTime};

    fn arrival(offset_secs: i64) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2026, 2, 10)
            .expect("valid date")
            .and_hms_opt(8, 0, 0)
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
    fn table_rows_fill_absent_fields_with_empty_cells() {
        let window = window_of(&[r#"{"temperature": 21, "status": "normal"}"#]);
        let rows = table_rows(&window);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].cells, ["21", "", "", "normal", ""]);
        assert_eq!(rows[0].status_class, StatusClass::Normal);
    }

    #[test]
    fn raw_json_of_empty_window_is_an_empty_array() {
        assert_eq!(raw_json(&MessageWindow::new()), "[]");
    }

    #[test]
    fn raw_json_is_newest_first() {
        let window = window_of(&[r#"{"seq": 1}"#, r#"{"seq": 2}"#]);
        let rendered = raw_json(&window);
        let parsed: Vec<Value> = serde_json::from_str(&rendered).expect("valid JSON");
        assert_eq!(parsed.len(), 2);
        assert_eq!(parsed[0]["seq"], 2);
        assert_eq!(parsed[1]["seq"], 1);
    }

    #[test]
    fn timeline_shows_arrival_and_status() {
        let window = window_of(&[r#"{"status": "warning"}"#]);
        let lines = timeline_lines(&window);
        assert_eq!(lines, vec!["10-02-2026 08:00:00 - warning".to_string()]);
    }

    #[test]
    fn chart_of_empty_window_is_none() {
        assert!(chart_series(&MessageWindow::new()).is_none());
    }

    #[test]
    fn chart_is_chronological_with_relative_seconds() {
        let window = window_of(&[
            r#"{"temperature": 20, "humidity": 51}"#,
            r#"{"temperature": 22}"#,
        ]);
        let series = chart_series(&window).expect("non-empty window");
        assert_eq!(series.temperature, vec![[0.0, 20.0], [1.0, 22.0]]);
        // Messages without the field simply contribute no point.
        assert_eq!(series.humidity, vec![[0.0, 51.0]]);
    }

    #[test]
    fn chart_skips_non_numeric_values() {
        let window = window_of(&[r#"{"temperature": "hot", "humidity": 40}"#]);
        let series = chart_series(&window).expect("non-empty window");
        assert!(series.temperature.is_empty());
        assert_eq!(series.humidity, vec![[0.0, 40.0]]);
    }
}
