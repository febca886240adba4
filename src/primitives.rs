//! Shared value and path utilities used by validation, evaluation and the engine.

use crate::enums::FieldType;
use crate::types::{FieldPath, FieldSchema, FormSchema};
use serde_json::{Map, Value};

// ─── Path resolution ────────────────────────────────────────────────────────

/// Resolves a simple dot-path against a value tree, borrowing the result.
///
/// Returns `None` if any segment fails to resolve. Empty path returns the root.
pub fn get_path<'a>(value: &'a Value, path: &str) -> Option<&'a Value> {
    if path.is_empty() {
        return Some(value);
    }

    let mut current = value;
    for segment in path.split('.') {
        current = current.as_object()?.get(segment)?;
    }
    Some(current)
}

/// Owned variant of [`get_path`].
pub fn resolve_simple_path(path: &str, value: &Value) -> Option<Value> {
    get_path(value, path).cloned()
}

/// Reads the value at a typed field path inside a record.
pub fn field_value<'a>(record: &'a Value, path: &FieldPath) -> Option<&'a Value> {
    let field = record.get(&path.section)?.get(&path.field)?;
    match &path.property {
        Some(prop) => field.get(prop),
        None => Some(field),
    }
}

/// Writes `value` at a typed field path, creating the section and owning
/// object as needed. Non-object intermediates are replaced by objects.
pub fn set_field_value(record: &mut Value, path: &FieldPath, value: Value) {
    let section = object_entry(ensure_object(record), &path.section);
    match &path.property {
        None => {
            ensure_object(section).insert(path.field.clone(), value);
        }
        Some(prop) => {
            let owner = object_entry(ensure_object(section), &path.field);
            ensure_object(owner).insert(prop.clone(), value);
        }
    }
}

fn ensure_object(value: &mut Value) -> &mut Map<String, Value> {
    if !value.is_object() {
        *value = Value::Object(Map::new());
    }
    match value {
        Value::Object(map) => map,
        _ => unreachable!("value was just replaced by an object"),
    }
}

fn object_entry<'a>(map: &'a mut Map<String, Value>, key: &str) -> &'a mut Value {
    map.entry(key.to_string())
        .or_insert_with(|| Value::Object(Map::new()))
}

/// Qualifies a schema reference relative to the section that declares it.
///
/// A reference whose first segment names a declared section is already
/// qualified. Anything else is a sibling reference (`az`, `systemDisk.size`)
/// and gets the declaring section prepended.
pub fn qualify_reference(schema: &FormSchema, section: &str, raw: &str) -> String {
    let first = raw.split('.').next().unwrap_or_default();
    if raw.contains('.') && schema.section(first).is_some() {
        raw.to_string()
    } else {
        format!("{}.{}", section, raw)
    }
}

// ─── Emptiness and truthiness ───────────────────────────────────────────────

/// Empty in the sense of requiredness: absent, null, or the empty string.
pub fn is_blank(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => true,
        Some(Value::String(s)) => s.is_empty(),
        _ => false,
    }
}

/// Empty in the sense of dependencies and actionable errors: blank, an empty
/// array, or an object with no keys.
pub fn is_empty_value(value: Option<&Value>) -> bool {
    match value {
        Some(Value::Array(items)) => items.is_empty(),
        Some(Value::Object(map)) => map.is_empty(),
        other => is_blank(other),
    }
}

/// Truthiness as a form UI sees it: `false`, `0`, `""`, null and absent are
/// falsy; everything else, including empty collections, is truthy.
pub fn is_truthy(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => false,
        Some(Value::Bool(b)) => *b,
        Some(Value::Number(n)) => n.as_f64().map(|f| f != 0.0 && !f.is_nan()).unwrap_or(false),
        Some(Value::String(s)) => !s.is_empty(),
        Some(Value::Array(_)) | Some(Value::Object(_)) => true,
    }
}

// ─── Numbers ────────────────────────────────────────────────────────────────

/// Reads a number from a JSON number or a numeric string.
pub fn as_number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok().filter(|f| f.is_finite()),
        _ => None,
    }
}

/// Formats a bound for messages: integral values print without decimals.
pub fn format_number(n: f64) -> String {
    if n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        format!("{}", n)
    }
}

// ─── Defaults ───────────────────────────────────────────────────────────────

/// Zero values per type, consulted when a field declares no default.
#[derive(Clone, Debug, PartialEq)]
pub struct TypeDefaults {
    pub string: Value,
    pub integer: Value,
    pub boolean: Value,
    pub object: Value,
    pub array: Value,
}

impl Default for TypeDefaults {
    fn default() -> Self {
        TypeDefaults {
            string: Value::String(String::new()),
            integer: Value::from(0),
            boolean: Value::Bool(false),
            object: Value::Object(Map::new()),
            array: Value::Array(Vec::new()),
        }
    }
}

impl TypeDefaults {
    pub fn for_type(&self, field_type: FieldType) -> &Value {
        match field_type {
            FieldType::String => &self.string,
            FieldType::Integer => &self.integer,
            FieldType::Boolean => &self.boolean,
            FieldType::Object => &self.object,
            FieldType::Array => &self.array,
        }
    }

    /// The value a field resets to: its declared default, else the type zero.
    ///
    /// An object field with declared properties and no default resets to the
    /// object composed of each property's own default, so nested inputs stay
    /// defined.
    pub fn default_for(&self, field: &FieldSchema) -> Value {
        if let Some(default) = &field.default
            && !default.is_null()
        {
            return default.clone();
        }
        match (&field.field_type, &field.properties) {
            (FieldType::Object, Some(props)) => Value::Object(
                props
                    .iter()
                    .map(|p| (p.name.clone(), self.default_for(p)))
                    .collect(),
            ),
            (ty, _) => self.for_type(*ty).clone(),
        }
    }
}

// ─── Labels ─────────────────────────────────────────────────────────────────

/// Turns an identifier into a sentence-case label:
/// `instanceType` → `Instance type`, `data_disks` → `Data disks`.
pub fn humanize(name: &str) -> String {
    let mut words: Vec<String> = Vec::new();
    let mut current = String::new();
    let mut prev_lower = false;
    for c in name.chars() {
        if c == '_' || c == '-' || c == ' ' {
            if !current.is_empty() {
                words.push(std::mem::take(&mut current));
            }
            prev_lower = false;
            continue;
        }
        if c.is_uppercase() && prev_lower && !current.is_empty() {
            words.push(std::mem::take(&mut current));
        }
        prev_lower = c.is_lowercase() || c.is_ascii_digit();
        current.push(c);
    }
    if !current.is_empty() {
        words.push(current);
    }

    let mut label = String::new();
    for (i, word) in words.iter().enumerate() {
        if i > 0 {
            label.push(' ');
        }
        let is_acronym = word.len() > 1 && word.chars().all(|c| c.is_uppercase() || c.is_ascii_digit());
        if i == 0 {
            let mut chars = word.chars();
            if let Some(first) = chars.next() {
                label.extend(first.to_uppercase());
                if is_acronym {
                    label.push_str(chars.as_str());
                } else {
                    label.push_str(&chars.as_str().to_lowercase());
                }
            }
        } else if is_acronym {
            label.push_str(word);
        } else {
            label.push_str(&word.to_lowercase());
        }
    }
    label
}
