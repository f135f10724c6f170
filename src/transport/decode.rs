//! JSON message decoding.
//!
//! Every message carries `utime`, integer microseconds since the Unix epoch.

use serde::Deserialize;
use serde_json::Value;

use super::error::DecodeError;
use crate::geo::Origin;
use crate::track::PositionSample;

#[derive(Debug, Deserialize)]
struct OriginMessage {
    origin_latitude: f64,
    origin_longitude: f64,
}

#[derive(Debug, Deserialize)]
struct PositionMessage {
    utime: i64,
    x: f64,
    y: f64,
}

pub fn utime_to_seconds(utime: i64) -> f64 {
    utime as f64 / 1.0e6
}

pub fn decode_origin(data: &[u8]) -> Result<Origin, DecodeError> {
    let msg: OriginMessage = serde_json::from_slice(data)?;
    Ok(Origin::new(msg.origin_latitude, msg.origin_longitude))
}

pub fn decode_position(data: &[u8]) -> Result<PositionSample, DecodeError> {
    let msg: PositionMessage = serde_json::from_slice(data)?;
    Ok(PositionSample {
        time: utime_to_seconds(msg.utime),
        x: msg.x,
        y: msg.y,
    })
}

/// Kind of value a type descriptor promises.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueKind {
    Number,
    Boolean,
    /// Descriptor names a message type; any scalar is accepted.
    Scalar,
}

impl ValueKind {
    pub fn from_descriptor(type_descriptor: &str) -> Self {
        let t = type_descriptor.trim().to_ascii_lowercase();
        match t.as_str() {
            "float" | "double" | "f32" | "f64" | "byte" => ValueKind::Number,
            "bool" | "boolean" => ValueKind::Boolean,
            _ if t.starts_with("int") || t.starts_with("uint") => ValueKind::Number,
            _ => ValueKind::Scalar,
        }
    }

    fn expected(&self) -> &'static str {
        match self {
            ValueKind::Number => "a number",
            ValueKind::Boolean => "a boolean",
            ValueKind::Scalar => "a number or boolean",
        }
    }
}

/// Projects `(time, value)` out of the messages of one subscribed field.
#[derive(Debug, Clone)]
pub struct FieldDecoder {
    field_name: String,
    path: Vec<String>,
    kind: ValueKind,
}

impl FieldDecoder {
    pub fn new(type_descriptor: &str, field_name: &str) -> Self {
        Self {
            field_name: field_name.to_string(),
            path: field_name.split('.').map(String::from).collect(),
            kind: ValueKind::from_descriptor(type_descriptor),
        }
    }

    pub fn kind(&self) -> ValueKind {
        self.kind
    }

    pub fn decode(&self, data: &[u8]) -> Result<(f64, f64), DecodeError> {
        let msg: Value = serde_json::from_slice(data)?;

        let utime = msg
            .get("utime")
            .ok_or_else(|| DecodeError::MissingField("utime".into()))?
            .as_i64()
            .ok_or_else(|| DecodeError::TypeMismatch {
                field: "utime".into(),
                expected: "an integer",
            })?;

        let value = self.lookup(&msg)?;
        Ok((utime_to_seconds(utime), self.scalar(value)?))
    }

    fn lookup<'a>(&self, msg: &'a Value) -> Result<&'a Value, DecodeError> {
        // a literal key containing dots wins over the nested path
        if let Some(v) = msg.get(&self.field_name) {
            return Ok(v);
        }
        self.path
            .iter()
            .try_fold(msg, |v, segment| v.get(segment.as_str()))
            .ok_or_else(|| DecodeError::MissingField(self.field_name.clone()))
    }

    fn scalar(&self, value: &Value) -> Result<f64, DecodeError> {
        let mismatch = || DecodeError::TypeMismatch {
            field: self.field_name.clone(),
            expected: self.kind.expected(),
        };
        match (self.kind, value) {
            (ValueKind::Number | ValueKind::Scalar, Value::Number(n)) => n.as_f64().ok_or_else(mismatch),
            (ValueKind::Boolean | ValueKind::Scalar, Value::Bool(b)) => Ok(if *b { 1.0 } else { 0.0 }),
            _ => Err(mismatch()),
        }
    }
}
