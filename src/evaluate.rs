//! Field evaluation: turns a schema node plus a candidate value into at most
//! one human-readable error.
//!
//! Evaluation never fails. Rules run in a fixed order and the first failing
//! rule wins.

use crate::enums::FieldType;
use crate::primitives::{as_number, field_value, format_number, get_path, is_blank};
use crate::types::*;
use regex::Regex;
use serde_json::Value;
use std::collections::{BTreeMap, HashMap};
use std::sync::{LazyLock, RwLock};
use tracing::{trace, warn};

/// Error map keyed by dotted field path.
pub type Errors = BTreeMap<String, String>;

// ─── Context ────────────────────────────────────────────────────────────────

/// Read-only external data (identity, project, quota) addressed by dotted path.
///
/// The engine only consults context to resolve dynamic numeric bounds.
pub trait ContextProvider {
    /// Resolves a dotted path such as `project.quota.instanceCount`.
    fn resolve(&self, path: &str) -> Option<Value>;
}

/// A context that resolves nothing.
#[derive(Clone, Copy, Debug, Default)]
pub struct EmptyContext;

impl ContextProvider for EmptyContext {
    fn resolve(&self, _path: &str) -> Option<Value> {
        None
    }
}

impl ContextProvider for Value {
    fn resolve(&self, path: &str) -> Option<Value> {
        get_path(self, path).filter(|v| !v.is_null()).cloned()
    }
}

/// A maximum after context resolution.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ResolvedBound {
    pub value: f64,
    /// True when the value came from context rather than a literal or fallback.
    pub from_context: bool,
}

/// Resolves a field's `max`. A context bound that cannot be resolved to a
/// number falls back to its declared fallback, or to no bound at all.
pub fn resolve_max(field: &FieldSchema, ctx: &dyn ContextProvider) -> Option<ResolvedBound> {
    match field.max.as_ref()? {
        Bound::Static(n) => Some(ResolvedBound {
            value: *n,
            from_context: false,
        }),
        Bound::Context { context, fallback } => {
            match ctx.resolve(context).as_ref().and_then(as_number) {
                Some(n) => Some(ResolvedBound {
                    value: n,
                    from_context: true,
                }),
                None => {
                    warn!(path = %context, field = %field.name, "context bound unresolved");
                    fallback.map(|n| ResolvedBound {
                        value: n,
                        from_context: false,
                    })
                }
            }
        }
    }
}

// ─── Patterns ───────────────────────────────────────────────────────────────

/// Compiled `pattern` rules, keyed by source. Shared by every engine in the
/// process; entries are never evicted.
static PATTERNS: LazyLock<RwLock<HashMap<String, Regex>>> =
    LazyLock::new(|| RwLock::new(HashMap::new()));

/// Returns the compiled form of a schema pattern, compiling it on first use.
pub fn compiled_pattern(pattern: &str) -> Result<Regex, regex::Error> {
    if let Ok(cache) = PATTERNS.read()
        && let Some(re) = cache.get(pattern)
    {
        return Ok(re.clone());
    }
    let re = Regex::new(pattern)?;
    if let Ok(mut cache) = PATTERNS.write() {
        cache.insert(pattern.to_string(), re.clone());
    }
    Ok(re)
}

/// Compiles every pattern a schema declares, at any depth.
pub fn precompile_patterns(schema: &FormSchema) {
    fn walk(field: &FieldSchema) {
        if let Some(pattern) = &field.pattern
            && let Err(e) = compiled_pattern(pattern)
        {
            warn!(field = %field.name, error = %e, "pattern does not compile");
        }
        for prop in field.properties.iter().flatten() {
            walk(prop);
        }
        if let Some(items) = &field.items {
            walk(items);
        }
    }
    for section in &schema.sections {
        section.fields.iter().for_each(walk);
    }
}

// ─── Single field ───────────────────────────────────────────────────────────

/// Evaluates one schema node against a candidate value.
pub fn evaluate_field(
    field: &FieldSchema,
    value: Option<&Value>,
    ctx: &dyn ContextProvider,
) -> Option<String> {
    let label = field.display_label();

    let value = match value {
        Some(v) if !is_blank(Some(v)) => v,
        _ => {
            return field
                .required
                .then(|| format!("{} is required", label));
        }
    };

    let result = match field.field_type {
        FieldType::String => check_string(field, &label, value),
        FieldType::Integer => check_integer(field, &label, value, ctx),
        FieldType::Boolean => check_boolean(&label, value),
        FieldType::Array => check_array(field, &label, value, ctx),
        FieldType::Object => check_object(field, &label, value),
    };
    let result = result.or_else(|| check_enum(field, &label, value));
    trace!(field = %field.name, error = ?result, "evaluated field");
    result
}

fn check_string(field: &FieldSchema, label: &str, value: &Value) -> Option<String> {
    let s = match value.as_str() {
        Some(s) => s,
        None => return Some(format!("{} must be text", label)),
    };
    let len = s.chars().count();

    if let Some(min) = field.min_length
        && len < min
    {
        return Some(format!("{} must be at least {} characters", label, min));
    }
    if let Some(max) = field.max_length
        && len > max
    {
        return Some(format!("{} must be at most {} characters", label, max));
    }

    if let Some(ref pattern) = field.pattern {
        match compiled_pattern(pattern) {
            Ok(re) => {
                if !re.is_match(s) {
                    return Some(
                        field
                            .pattern_message
                            .clone()
                            .unwrap_or_else(|| format!("{} has an invalid format", label)),
                    );
                }
            }
            Err(e) => warn!(field = %field.name, error = %e, "skipping invalid pattern"),
        }
    }

    None
}

fn check_integer(
    field: &FieldSchema,
    label: &str,
    value: &Value,
    ctx: &dyn ContextProvider,
) -> Option<String> {
    let n = match as_number(value) {
        Some(n) => n,
        None => return Some(format!("{} must be a number", label)),
    };
    if n.fract() != 0.0 {
        return Some(format!("{} must be a whole number", label));
    }

    if let Some(min) = field.min
        && n < min
    {
        return Some(format!("{} must be at least {}", label, format_number(min)));
    }

    if let Some(max) = resolve_max(field, ctx)
        && n > max.value
    {
        return Some(if max.from_context {
            format!("{} exceeds quota (max: {})", label, format_number(max.value))
        } else {
            format!("{} must be at most {}", label, format_number(max.value))
        });
    }

    None
}

fn check_boolean(label: &str, value: &Value) -> Option<String> {
    (!value.is_boolean()).then(|| format!("{} must be true or false", label))
}

fn check_array(
    field: &FieldSchema,
    label: &str,
    value: &Value,
    ctx: &dyn ContextProvider,
) -> Option<String> {
    let items = match value.as_array() {
        Some(items) => items,
        None => return Some(format!("{} must be a list", label)),
    };

    if let Some(min) = field.min_items
        && items.len() < min
    {
        return Some(format!("{} needs at least {} item(s)", label, min));
    }
    if let Some(max) = field.max_items
        && items.len() > max
    {
        return Some(format!("{} allows at most {} item(s)", label, max));
    }

    if let Some(item_schema) = &field.items {
        for (i, item) in items.iter().enumerate() {
            if let Some(err) = evaluate_item(item_schema, item, ctx) {
                return Some(format!("{} item {}: {}", label, i + 1, err));
            }
        }
    }

    None
}

/// Array elements are always present, so blank elements fail only when the
/// item schema is required. Object elements also check their properties.
fn evaluate_item(item_schema: &FieldSchema, item: &Value, ctx: &dyn ContextProvider) -> Option<String> {
    if let Some(err) = evaluate_field(item_schema, Some(item), ctx) {
        return Some(err);
    }
    let props = item_schema.properties.as_ref()?;
    props
        .iter()
        .find_map(|prop| evaluate_field(prop, item.get(&prop.name), ctx))
}

fn check_object(field: &FieldSchema, label: &str, value: &Value) -> Option<String> {
    match value.as_object() {
        None => Some(format!("{} must be an object", label)),
        Some(map) if map.is_empty() && field.required => Some(format!("{} is required", label)),
        Some(_) => None,
    }
}

fn check_enum(field: &FieldSchema, label: &str, value: &Value) -> Option<String> {
    let allowed = field.allowed.as_ref()?;
    if allowed.iter().any(|a| a == value) {
        return None;
    }
    let choices: Vec<String> = allowed
        .iter()
        .map(|a| match a {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        })
        .collect();
    Some(format!("{} must be one of: {}", label, choices.join(", ")))
}

// ─── Field trees ────────────────────────────────────────────────────────────

/// Evaluates a top-level field and, for objects with declared properties,
/// each property under its nested path.
///
/// Every path the field owns is listed, valid ones with `None`, so callers can
/// clear stale entries.
pub fn evaluate_field_tree(
    field: &FieldSchema,
    path: &FieldPath,
    record: &Value,
    ctx: &dyn ContextProvider,
) -> Vec<(FieldPath, Option<String>)> {
    let value = field_value(record, path);
    let mut results = vec![(path.clone(), evaluate_field(field, value, ctx))];

    if let Some(props) = &field.properties {
        let is_object = value.map(Value::is_object).unwrap_or(false);
        for prop in props {
            let nested = FieldPath::nested(path.section.clone(), path.field.clone(), prop.name.clone());
            let result = if is_object {
                evaluate_field(prop, field_value(record, &nested), ctx)
            } else {
                None
            };
            results.push((nested, result));
        }
    }

    results
}

/// Evaluates every field of every section. Only failures appear in the map.
pub fn validate_all(schema: &FormSchema, record: &Value, ctx: &dyn ContextProvider) -> Errors {
    let mut errors = Errors::new();
    for section in &schema.sections {
        validate_section_into(section, record, ctx, &mut errors);
    }
    errors
}

/// Evaluates every field of one section into `errors`, overwriting or
/// removing each owned key.
pub fn validate_section_into(
    section: &SectionSchema,
    record: &Value,
    ctx: &dyn ContextProvider,
    errors: &mut Errors,
) {
    for field in &section.fields {
        let path = FieldPath::new(section.name.clone(), field.name.clone());
        apply_results(errors, evaluate_field_tree(field, &path, record, ctx));
    }
}

/// Writes evaluation results into an error map: failures overwrite, passes
/// remove the key.
pub fn apply_results(errors: &mut Errors, results: Vec<(FieldPath, Option<String>)>) {
    for (path, result) in results {
        match result {
            Some(message) => {
                errors.insert(path.to_string(), message);
            }
            None => {
                errors.remove(&path.to_string());
            }
        }
    }
}
