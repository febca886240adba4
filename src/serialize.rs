//! [`FormSchema`] → YAML serialization.

use crate::error::SerializeError;
use crate::types::FormSchema;

/// Serialize a schema to a YAML string.
///
/// The schema should typically be normalized before serialization. Keys are
/// emitted in declaration order and unset optional rules are omitted, so the
/// output parses back to an equal schema.
pub fn serialize(schema: &FormSchema) -> Result<String, SerializeError> {
    let value = serde_json::to_value(schema).map_err(|e| SerializeError {
        message: format!("failed to convert schema to JSON value: {}", e),
    })?;

    let yaml = serde_saphyr::to_string(&value).map_err(|e| SerializeError {
        message: format!("failed to serialize to YAML: {}", e),
    })?;

    Ok(yaml)
}
