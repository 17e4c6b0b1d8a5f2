use std::collections::VecDeque;

use super::message::TelemetryMessage;

/// How many messages the viewer retains: the ten previous arrivals plus the
/// newest one. The twelfth arrival evicts the oldest.
pub const WINDOW_CAPACITY: usize = 11;

/// Bounded, newest-first buffer of recent telemetry.
///
/// Prepend and truncate are the only mutations, so the window can never be
/// partially updated. Nothing is persisted; the window dies with the viewer.
#[derive(Debug, Default, Clone)]
pub struct MessageWindow {
    entries: VecDeque<TelemetryMessage>,
    capacity: usize,
}

impl MessageWindow {
    pub fn new() -> Self {
        Self::with_capacity(WINDOW_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Prepends the newest message and drops anything beyond capacity.
    pub fn push(&mut self, message: TelemetryMessage) {
        self.entries.push_front(message);
        self.entries.truncate(self.capacity);
    }

    /// Newest-first, the display order.
    pub fn iter(&self) -> impl Iterator<Item = &TelemetryMessage> {
        self.entries.iter()
    }

    /// Oldest-first, the order the chart plots in.
    pub fn chronological(&self) -> impl Iterator<Item = &TelemetryMessage> {
        self.entries.iter().rev()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::telemetry::message::FieldValue;
    use chrono::NaiveDate;

    fn message(seq: i64) -> TelemetryMessage {
        let arrival = NaiveDate::from_ymd_opt(2026, 2, 10)
            .expect("valid date")
            .and_hms_opt(12, 0, 0)
            .expect("valid time")
            + chrono::Duration::seconds(seq);
        TelemetryMessage::decode_at(format!("{{\"seq\": {seq}}}").as_bytes(), arrival)
            .expect("payload should decode")
    }

    fn seq_of(msg: &TelemetryMessage) -> i64 {
        match msg.get("seq") {
            Some(FieldValue::Number(n)) => n.as_i64().expect("seq fits i64"),
            other => panic!("unexpected seq field: {other:?}"),
        }
    }

    #[test]
    fn never_exceeds_capacity_and_stays_newest_first() {
        let mut window = MessageWindow::new();
        for seq in 1..=15 {
            window.push(message(seq));
            assert!(window.len() <= WINDOW_CAPACITY);
        }
        let seqs: Vec<i64> = window.iter().map(seq_of).collect();
        assert_eq!(seqs, vec![15, 14, 13, 12, 11, 10, 9, 8, 7, 6, 5]);
    }

    #[test]
    fn chronological_reverses_display_order() {
        let mut window = MessageWindow::new();
        for seq in 1..=3 {
            window.push(message(seq));
        }
        let seqs: Vec<i64> = window.chronological().map(seq_of).collect();
        assert_eq!(seqs, vec![1, 2, 3]);
    }

    #[test]
    fn empty_window_is_empty() {
        let window = MessageWindow::new();
        assert!(window.is_empty());
        assert_eq!(window.len(), 0);
        assert_eq!(window.iter().count(), 0);
    }
}
