//! Translation between native datums and component values.

use jobwire_host::{Datum, DatumType, InputSplit};
use serde_json::{Number, Value};
use thiserror::Error;

/// Value which has no native representation of the requested type.
#[derive(Debug, Error)]
#[error("{0}")]
pub struct ConversionError(String);

/// Converts native datum into component value. Bytes become an array of numbers.
pub fn to_value(datum: &Datum) -> Value {
    match datum {
        Datum::Text(s) => Value::String(s.clone()),
        Datum::Int(x) => Value::from(*x),
        Datum::Long(x) => Value::from(*x),
        Datum::Float(x) => float_value(*x as f64),
        Datum::Double(x) => float_value(*x),
        Datum::Boolean(b) => Value::Bool(*b),
        Datum::Bytes(bytes) => Value::Array(bytes.iter().map(|&b| Value::from(b)).collect()),
        Datum::Null => Value::Null,
    }
}

/// Converts component value into native datum of the `expected` type, or of the natural type if none is declared.
pub fn to_datum(value: Value, expected: Option<DatumType>) -> Result<Datum, ConversionError> {
    let Some(expected) = expected else {
        return Ok(infer_datum(value));
    };
    let datum = match (expected, value) {
        (DatumType::Null, _) => Datum::Null,
        (DatumType::Text, Value::String(s)) => Datum::Text(s),
        (DatumType::Text, value) => Datum::Text(value.to_string()),
        (DatumType::Long, Value::Number(n)) if n.is_i64() => Datum::Long(n.as_i64().unwrap_or_default()),
        (DatumType::Int, Value::Number(n)) => match n.as_i64().map(i32::try_from) {
            Some(Ok(x)) => Datum::Int(x),
            _ => return Err(mismatch(expected, &Value::Number(n))),
        },
        (DatumType::Double, Value::Number(n)) => Datum::Double(n.as_f64().unwrap_or_default()),
        (DatumType::Float, Value::Number(n)) => Datum::Float(n.as_f64().unwrap_or_default() as f32),
        (DatumType::Boolean, Value::Bool(b)) => Datum::Boolean(b),
        (DatumType::Bytes, Value::String(s)) => Datum::Bytes(s.into_bytes()),
        (DatumType::Bytes, Value::Array(items)) => Datum::Bytes(
            items
                .iter()
                .map(|item| item.as_u64().and_then(|b| u8::try_from(b).ok()))
                .collect::<Option<Vec<u8>>>()
                .ok_or_else(|| mismatch(expected, &Value::Array(items.clone())))?,
        ),
        (expected, value) => return Err(mismatch(expected, &value)),
    };
    Ok(datum)
}

/// Converts split produced by a component. A plain string is a split covering the whole file.
pub fn to_split(value: Value) -> Result<InputSplit, ConversionError> {
    match value {
        Value::String(path) => Ok(InputSplit {
            path: Some(path),
            start: 0,
            length: 0,
            hosts: Vec::new(),
        }),
        value => serde_json::from_value(value).map_err(|e| ConversionError(format!("invalid split: {e}"))),
    }
}

fn infer_datum(value: Value) -> Datum {
    match value {
        Value::Null => Datum::Null,
        Value::Bool(b) => Datum::Boolean(b),
        Value::String(s) => Datum::Text(s),
        Value::Number(n) => match n.as_i64() {
            Some(x) => Datum::Long(x),
            None => Datum::Double(n.as_f64().unwrap_or_default()),
        },
        value @ (Value::Array(_) | Value::Object(_)) => Datum::Text(value.to_string()),
    }
}

fn float_value(x: f64) -> Value {
    Number::from_f64(x).map(Value::Number).unwrap_or(Value::Null)
}

fn mismatch(expected: DatumType, value: &Value) -> ConversionError {
    ConversionError(format!("{} can't be stored as {}", value, expected))
}
