//! Serializable values exchanged between tasks.

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::error::HostError;

/// Value of a record key or value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Datum {
    Text(String),
    Int(i32),
    Long(i64),
    Float(f32),
    Double(f64),
    Boolean(bool),
    Bytes(Vec<u8>),
    Null,
}

impl Datum {
    /// Type of the value.
    pub fn datum_type(&self) -> DatumType {
        match self {
            Datum::Text(_) => DatumType::Text,
            Datum::Int(_) => DatumType::Int,
            Datum::Long(_) => DatumType::Long,
            Datum::Float(_) => DatumType::Float,
            Datum::Double(_) => DatumType::Double,
            Datum::Boolean(_) => DatumType::Boolean,
            Datum::Bytes(_) => DatumType::Bytes,
            Datum::Null => DatumType::Null,
        }
    }
}

impl From<&str> for Datum {
    fn from(value: &str) -> Self {
        Datum::Text(value.to_string())
    }
}

impl From<String> for Datum {
    fn from(value: String) -> Self {
        Datum::Text(value)
    }
}

impl From<i64> for Datum {
    fn from(value: i64) -> Self {
        Datum::Long(value)
    }
}

/// Type of a [Datum], used to declare key and value classes of a job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DatumType {
    Text,
    Int,
    Long,
    Float,
    Double,
    Boolean,
    Bytes,
    Null,
}

impl DatumType {
    /// Name under which the type is stored in configuration.
    pub fn name(&self) -> &'static str {
        match self {
            DatumType::Text => "text",
            DatumType::Int => "int",
            DatumType::Long => "long",
            DatumType::Float => "float",
            DatumType::Double => "double",
            DatumType::Boolean => "boolean",
            DatumType::Bytes => "bytes",
            DatumType::Null => "null",
        }
    }
}

impl fmt::Display for DatumType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for DatumType {
    type Err = HostError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "text" => DatumType::Text,
            "int" => DatumType::Int,
            "long" => DatumType::Long,
            "float" => DatumType::Float,
            "double" => DatumType::Double,
            "boolean" => DatumType::Boolean,
            "bytes" => DatumType::Bytes,
            "null" => DatumType::Null,
            x => {
                return Err(HostError::UnknownClass {
                    kind: "datum",
                    name: x.to_string(),
                })
            }
        })
    }
}
