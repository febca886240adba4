//! Closed enumerations used throughout the schema type system.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// Semantic type of a field.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldType {
    String,
    Integer,
    Boolean,
    Object,
    Array,
}

impl FieldType {
    /// Returns true when `value` has the JSON shape this type expects.
    ///
    /// Integers accept any JSON number with no fractional part.
    pub fn accepts(&self, value: &Value) -> bool {
        match self {
            FieldType::String => value.is_string(),
            FieldType::Integer => value
                .as_f64()
                .map(|n| n.fract() == 0.0)
                .unwrap_or(false),
            FieldType::Boolean => value.is_boolean(),
            FieldType::Object => value.is_object(),
            FieldType::Array => value.is_array(),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            FieldType::String => "string",
            FieldType::Integer => "integer",
            FieldType::Boolean => "boolean",
            FieldType::Object => "object",
            FieldType::Array => "array",
        }
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How far an upstream change propagates resets.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CascadeMode {
    /// Keep resetting dependents of reset fields until nothing more fires.
    #[default]
    FixedPoint,
    /// Reset only the direct targets of the changed field.
    SingleHop,
}
