use chrono::NaiveDateTime;
use serde_json::{Map, Number, Value};
use std::fmt;
use thiserror::Error;

const ARRIVAL_TIME_KEY: &str = "arrivalTime";
const ARRIVAL_TIME_FORMAT: &str = "%d-%m-%Y %H:%M:%S";

#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("payload is not a JSON object")]
    NotAnObject,
}

/// One decoded payload field. Payload shape is never validated, so every
/// value collapses into this small set; nested arrays and objects are kept
/// as their JSON text.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Number(Number),
    Text(String),
    Bool(bool),
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::Number(n) => write!(f, "{n}"),
            FieldValue::Text(s) => write!(f, "{s}"),
            FieldValue::Bool(b) => write!(f, "{b}"),
        }
    }
}

impl FieldValue {
    fn from_json(value: Value) -> Option<Self> {
        match value {
            Value::Null => None,
            Value::Bool(b) => Some(FieldValue::Bool(b)),
            Value::Number(n) => Some(FieldValue::Number(n)),
            Value::String(s) => Some(FieldValue::Text(s)),
            nested @ (Value::Array(_) | Value::Object(_)) => {
                Some(FieldValue::Text(nested.to_string()))
            }
        }
    }

    fn to_json(&self) -> Value {
        match self {
            FieldValue::Number(n) => Value::Number(n.clone()),
            FieldValue::Text(s) => Value::String(s.clone()),
            FieldValue::Bool(b) => Value::Bool(*b),
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            FieldValue::Number(n) => n.as_f64(),
            _ => None,
        }
    }
}

/// Display bucket for a message's `status` field: `normal` and `warning` get
/// their own styling, anything else (including no status at all) is the
/// alert bucket.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusClass {
    Normal,
    Warning,
    Alert,
}

impl StatusClass {
    fn from_status(status: Option<&FieldValue>) -> Self {
        match status {
            Some(FieldValue::Text(s)) if s == "normal" => StatusClass::Normal,
            Some(FieldValue::Text(s)) if s == "warning" => StatusClass::Warning,
            _ => StatusClass::Alert,
        }
    }
}

/// One inbound telemetry message after decode.
///
/// Payload fields are held sorted by name, matching JSON object decode
/// order. The arrival time is stamped locally at decode and is independent
/// of any `timestamp` field the payload itself carries.
#[derive(Debug, Clone, PartialEq)]
pub struct TelemetryMessage {
    fields: Vec<(String, FieldValue)>,
    arrival_time: NaiveDateTime,
}

impl TelemetryMessage {
    /// Decodes a raw payload, stamping the arrival time now.
    pub fn decode(payload: &[u8]) -> Result<Self, DecodeError> {
        Self::decode_at(payload, chrono::Local::now().naive_local())
    }

    /// Decode with an explicit arrival stamp.
    pub fn decode_at(payload: &[u8], arrival_time: NaiveDateTime) -> Result<Self, DecodeError> {
        let value: Value = serde_json::from_slice(payload)?;
        let Value::Object(object) = value else {
            return Err(DecodeError::NotAnObject);
        };
        let fields = object
            .into_iter()
            .filter_map(|(name, value)| FieldValue::from_json(value).map(|v| (name, v)))
            .collect();
        Ok(Self {
            fields,
            arrival_time,
        })
    }

    pub fn get(&self, name: &str) -> Option<&FieldValue> {
        self.fields
            .iter()
            .find(|(field, _)| field == name)
            .map(|(_, value)| value)
    }

    /// Field value rendered for a table cell; absent fields render empty.
    pub fn display(&self, name: &str) -> String {
        self.get(name).map(ToString::to_string).unwrap_or_default()
    }

    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|(name, _)| name.as_str())
    }

    pub fn values(&self) -> impl Iterator<Item = &FieldValue> {
        self.fields.iter().map(|(_, value)| value)
    }

    pub fn arrival_time(&self) -> NaiveDateTime {
        self.arrival_time
    }

    pub fn arrival_display(&self) -> String {
        self.arrival_time.format(ARRIVAL_TIME_FORMAT).to_string()
    }

    pub fn status_class(&self) -> StatusClass {
        StatusClass::from_status(self.get("status"))
    }

    /// The exported record: every payload field plus the arrival stamp.
    pub fn to_record(&self) -> Map<String, Value> {
        let mut record: Map<String, Value> = self
            .fields
            .iter()
            .map(|(name, value)| (name.clone(), value.to_json()))
            .collect();
        record.insert(
            ARRIVAL_TIME_KEY.to_string(),
            Value::String(self.arrival_display()),
        );
        record
    }
}
