use crate::error::{ParseError, ParseErrorKind};
use crate::types::FormSchema;

const TOP_LEVEL_KEYS: &[&str] = &["resource", "version", "description", "sections"];

/// Parse a YAML string into an unvalidated schema.
///
/// Performs YAML deserialization and type mapping only; `disabled.when`
/// predicates are decided here. Does NOT check cross-references or apply
/// normalization.
pub fn parse(input: &str) -> Result<FormSchema, ParseError> {
    if input.trim().is_empty() {
        return Err(ParseError::new(ParseErrorKind::Syntax, "empty input"));
    }

    check_multi_document(input)?;

    // YAML → serde_json::Value → FormSchema, so both YAML and JSON sources
    // share one typed mapping.
    let value: serde_json::Value = serde_saphyr::from_str(input).map_err(|e| {
        let msg = e.to_string();
        ParseError::new(classify_error(&msg), msg)
    })?;

    parse_value(value)
}

/// Map an already-decoded JSON value onto a schema.
pub fn parse_value(value: serde_json::Value) -> Result<FormSchema, ParseError> {
    let obj = match value.as_object() {
        Some(obj) => obj,
        None => {
            return Err(ParseError::new(
                ParseErrorKind::TypeMismatch,
                "schema root must be a mapping",
            ));
        }
    };

    for key in obj.keys() {
        if !TOP_LEVEL_KEYS.contains(&key.as_str()) {
            return Err(ParseError {
                kind: ParseErrorKind::UnknownVariant,
                message: format!("unknown top-level field: {}", key),
                path: Some(key.clone()),
                line: None,
            });
        }
    }

    serde_json::from_value(value).map_err(|e| {
        let msg = e.to_string();
        ParseError::new(classify_error(&msg), msg)
    })
}

/// Check for multiple YAML documents (--- separator).
/// Only matches `---` at column 0 to avoid false positives inside block scalars.
fn check_multi_document(input: &str) -> Result<(), ParseError> {
    let mut doc_count = 0;
    for (line_num, line) in input.lines().enumerate() {
        if line.starts_with("---") && line[3..].trim().is_empty() {
            doc_count += 1;
            if doc_count > 1 {
                return Err(ParseError {
                    kind: ParseErrorKind::Syntax,
                    message: "multi-document YAML is not supported".to_string(),
                    path: None,
                    line: Some(line_num + 1),
                });
            }
        }
    }
    Ok(())
}

fn classify_error(msg: &str) -> ParseErrorKind {
    let lower = msg.to_lowercase();
    if lower.contains("unknown variant") || lower.contains("unknown field") {
        ParseErrorKind::UnknownVariant
    } else if lower.contains("missing field")
        || lower.contains("invalid type")
        || lower.contains("did not match any variant")
    {
        ParseErrorKind::TypeMismatch
    } else {
        ParseErrorKind::Syntax
    }
}
