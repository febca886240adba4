//! Schema validation against structural rules S-001 through S-014.
//!
//! Returns **all** errors and warnings, not just the first. Validation does not
//! modify the schema. Any error is a configuration error: the engine refuses to
//! build on a schema that carries one.

use crate::dependency::dependency_cycles;
use crate::enums::FieldType;
use crate::error::*;
use crate::primitives::qualify_reference;
use crate::types::*;
use regex::Regex;
use std::collections::HashSet;
use std::sync::LazyLock;

// ─── Cached regexes ─────────────────────────────────────────────────────────

static IDENT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z][A-Za-z0-9_]*$").unwrap());

static CONTEXT_PATH_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_-]*(\.[A-Za-z_][A-Za-z0-9_-]*)*$").unwrap());

/// Validate a parsed schema against every structural rule.
pub fn validate(schema: &FormSchema) -> ValidationResult {
    let mut errors = Vec::new();
    let mut warnings = Vec::new();

    s001_non_empty(schema, &mut errors);
    s002_section_names(schema, &mut errors);
    s003_field_names(schema, &mut errors);
    s004_depends_on_paths(schema, &mut errors);
    s006_reset_targets(schema, &mut errors);
    s007_predicate_paths(schema, &mut errors, &mut warnings);

    let nodes = collect_nodes(schema);
    s008_default_types(&nodes, &mut errors);
    s009_ranges(&nodes, &mut errors);
    s010_patterns(&nodes, &mut errors, &mut warnings);
    s011_nested_shapes(&nodes, &mut errors);
    s012_keyword_applicability(&nodes, &mut errors);
    s013_enum_values(&nodes, &mut errors);
    s014_context_bounds(&nodes, &mut errors);

    w002_dependency_cycles(schema, &mut warnings);

    ValidationResult { errors, warnings }
}

fn error(rule: &str, path: impl Into<String>, message: impl Into<String>) -> ValidationError {
    ValidationError {
        rule: rule.to_string(),
        path: path.into(),
        message: message.into(),
    }
}

fn warning(code: &str, path: impl Into<String>, message: impl Into<String>) -> Diagnostic {
    Diagnostic {
        severity: DiagnosticSeverity::Warning,
        code: code.to_string(),
        path: Some(path.into()),
        message: message.into(),
    }
}

// ─── Helper: every schema node with its location ────────────────────────────

struct Node<'a> {
    path: String,
    field: &'a FieldSchema,
    /// Whether the node has a record path of its own: a top-level field or
    /// one of its direct properties. Only those may carry references.
    addressable: bool,
}

fn collect_nodes(schema: &FormSchema) -> Vec<Node<'_>> {
    fn walk<'a>(path: String, field: &'a FieldSchema, depth: usize, out: &mut Vec<Node<'a>>) {
        if let Some(props) = &field.properties {
            for (k, prop) in props.iter().enumerate() {
                walk(format!("{}.properties[{}]", path, k), prop, depth.saturating_add(1), out);
            }
        }
        if let Some(items) = &field.items {
            // Array elements have no record path, whatever their depth.
            walk(format!("{}.items", path), items, usize::MAX, out);
        }
        out.push(Node {
            path,
            field,
            addressable: depth <= 1,
        });
    }

    let mut nodes = Vec::new();
    for (i, section) in schema.sections.iter().enumerate() {
        for (j, field) in section.fields.iter().enumerate() {
            walk(format!("sections[{}].fields[{}]", i, j), field, 0, &mut nodes);
        }
    }
    nodes
}

/// Top-level fields and object properties: the nodes that may carry
/// references, each with the name of the section that declares it.
fn referencing_nodes(schema: &FormSchema) -> Vec<(String, &str, &FieldSchema, String)> {
    let mut out = Vec::new();
    for (i, section) in schema.sections.iter().enumerate() {
        for (j, field) in section.fields.iter().enumerate() {
            let loc = format!("sections[{}].fields[{}]", i, j);
            let own = format!("{}.{}", section.name, field.name);
            if let Some(props) = &field.properties {
                for (k, prop) in props.iter().enumerate() {
                    out.push((
                        format!("{}.properties[{}]", loc, k),
                        section.name.as_str(),
                        prop,
                        format!("{}.{}", own, prop.name),
                    ));
                }
            }
            out.push((loc, section.name.as_str(), field, own));
        }
    }
    out
}

// ─── S-001 ──────────────────────────────────────────────────────────────────

fn s001_non_empty(schema: &FormSchema, errors: &mut Vec<ValidationError>) {
    if schema.resource.trim().is_empty() {
        errors.push(error("S-001", "resource", "resource name must not be empty"));
    }
    if schema.sections.is_empty() {
        errors.push(error("S-001", "sections", "schema must declare at least one section"));
    }
}

// ─── S-002 ──────────────────────────────────────────────────────────────────

fn s002_section_names(schema: &FormSchema, errors: &mut Vec<ValidationError>) {
    let mut seen = HashSet::new();
    for (i, section) in schema.sections.iter().enumerate() {
        let path = format!("sections[{}].name", i);
        if !IDENT_RE.is_match(&section.name) {
            errors.push(error(
                "S-002",
                &path,
                format!("section name must match [A-Za-z][A-Za-z0-9_]*, got '{}'", section.name),
            ));
        }
        if !seen.insert(section.name.as_str()) {
            errors.push(error(
                "S-002",
                &path,
                format!("duplicate section name '{}'", section.name),
            ));
        }
    }
}

// ─── S-003 ──────────────────────────────────────────────────────────────────

fn s003_field_names(schema: &FormSchema, errors: &mut Vec<ValidationError>) {
    fn check_names(fields: &[FieldSchema], prefix: &str, key: &str, errors: &mut Vec<ValidationError>) {
        let mut seen = HashSet::new();
        for (j, field) in fields.iter().enumerate() {
            let path = format!("{}.{}[{}].name", prefix, key, j);
            if !IDENT_RE.is_match(&field.name) {
                errors.push(error(
                    "S-003",
                    &path,
                    format!("field name must match [A-Za-z][A-Za-z0-9_]*, got '{}'", field.name),
                ));
            }
            if !seen.insert(field.name.as_str()) {
                errors.push(error("S-003", &path, format!("duplicate field name '{}'", field.name)));
            }
        }
    }

    for (i, section) in schema.sections.iter().enumerate() {
        let prefix = format!("sections[{}]", i);
        check_names(&section.fields, &prefix, "fields", errors);
        for (j, field) in section.fields.iter().enumerate() {
            if let Some(props) = &field.properties {
                check_names(props, &format!("{}.fields[{}]", prefix, j), "properties", errors);
            }
        }
    }
}

// ─── S-004 / S-005 ──────────────────────────────────────────────────────────

fn s004_depends_on_paths(schema: &FormSchema, errors: &mut Vec<ValidationError>) {
    for (loc, section, field, own) in referencing_nodes(schema) {
        for (k, dep) in field.depends_on.iter().enumerate() {
            let path = format!("{}.dependsOn[{}]", loc, k);
            let qualified = qualify_reference(schema, section, dep);
            if !schema.contains_path(&qualified) {
                errors.push(error(
                    "S-004",
                    path,
                    format!("dependsOn references unknown field '{}'", dep),
                ));
            } else if qualified == own {
                errors.push(error("S-005", path, "field must not depend on itself"));
            }
        }
    }
}

// ─── S-006 ──────────────────────────────────────────────────────────────────

fn s006_reset_targets(schema: &FormSchema, errors: &mut Vec<ValidationError>) {
    for (loc, section, field, own) in referencing_nodes(schema) {
        for (k, target) in field.reset_targets().iter().enumerate() {
            let path = format!("{}.onChange.reset[{}]", loc, k);
            let qualified = qualify_reference(schema, section, target);
            if !schema.contains_path(&qualified) {
                errors.push(error(
                    "S-006",
                    path,
                    format!("onChange.reset references unknown field '{}'", target),
                ));
            } else if qualified == own {
                errors.push(error("S-006", path, "field must not reset itself"));
            }
        }
    }
}

// ─── S-007 / W-001 ──────────────────────────────────────────────────────────

fn s007_predicate_paths(
    schema: &FormSchema,
    errors: &mut Vec<ValidationError>,
    warnings: &mut Vec<Diagnostic>,
) {
    for (loc, section, field, _) in referencing_nodes(schema) {
        let Some(rule) = &field.disabled else {
            continue;
        };
        let path = format!("{}.disabled.when", loc);
        match rule.when.path() {
            Some(p) => {
                if !schema.contains_path(&qualify_reference(schema, section, p)) {
                    errors.push(error(
                        "S-007",
                        path,
                        format!("disabled.when references unknown field '{}'", p),
                    ));
                }
            }
            None => warnings.push(warning(
                "W-001",
                path,
                format!(
                    "unsupported predicate '{}' never disables the field",
                    rule.when
                ),
            )),
        }
    }
}

// ─── S-008 ──────────────────────────────────────────────────────────────────

fn s008_default_types(nodes: &[Node<'_>], errors: &mut Vec<ValidationError>) {
    for node in nodes {
        if let Some(default) = &node.field.default
            && !default.is_null()
            && !node.field.field_type.accepts(default)
        {
            errors.push(error(
                "S-008",
                format!("{}.default", node.path),
                format!(
                    "default {} does not match field type {}",
                    default, node.field.field_type
                ),
            ));
        }
    }
}

// ─── S-009 ──────────────────────────────────────────────────────────────────

fn s009_ranges(nodes: &[Node<'_>], errors: &mut Vec<ValidationError>) {
    for node in nodes {
        let f = node.field;
        if let (Some(min), Some(Bound::Static(max))) = (f.min, &f.max)
            && min > *max
        {
            errors.push(error(
                "S-009",
                format!("{}.min", node.path),
                format!("min ({}) exceeds max ({})", min, max),
            ));
        }
        if let (Some(min), Some(max)) = (f.min_length, f.max_length)
            && min > max
        {
            errors.push(error(
                "S-009",
                format!("{}.minLength", node.path),
                format!("minLength ({}) exceeds maxLength ({})", min, max),
            ));
        }
        if let (Some(min), Some(max)) = (f.min_items, f.max_items)
            && min > max
        {
            errors.push(error(
                "S-009",
                format!("{}.minItems", node.path),
                format!("minItems ({}) exceeds maxItems ({})", min, max),
            ));
        }
    }
}

// ─── S-010 / W-003 ──────────────────────────────────────────────────────────

fn s010_patterns(nodes: &[Node<'_>], errors: &mut Vec<ValidationError>, warnings: &mut Vec<Diagnostic>) {
    for node in nodes {
        match &node.field.pattern {
            Some(pattern) => {
                if let Err(e) = Regex::new(pattern) {
                    errors.push(error(
                        "S-010",
                        format!("{}.pattern", node.path),
                        format!("invalid pattern: {}", e),
                    ));
                }
            }
            None if node.field.pattern_message.is_some() => warnings.push(warning(
                "W-003",
                format!("{}.patternMessage", node.path),
                "patternMessage has no effect without pattern",
            )),
            None => {}
        }
    }
}

// ─── S-011 ──────────────────────────────────────────────────────────────────

fn s011_nested_shapes(nodes: &[Node<'_>], errors: &mut Vec<ValidationError>) {
    for node in nodes {
        let f = node.field;
        if f.properties.is_some() && f.field_type != FieldType::Object {
            errors.push(error(
                "S-011",
                format!("{}.properties", node.path),
                format!("properties require type object, got {}", f.field_type),
            ));
        }
        if f.items.is_some() && f.field_type != FieldType::Array {
            errors.push(error(
                "S-011",
                format!("{}.items", node.path),
                format!("items require type array, got {}", f.field_type),
            ));
        }
    }
}

// ─── S-012 ──────────────────────────────────────────────────────────────────

fn s012_keyword_applicability(nodes: &[Node<'_>], errors: &mut Vec<ValidationError>) {
    for node in nodes {
        let f = node.field;
        let mut misplaced: Vec<&str> = Vec::new();
        if f.field_type != FieldType::Integer {
            if f.min.is_some() {
                misplaced.push("min");
            }
            if f.max.is_some() {
                misplaced.push("max");
            }
        }
        if f.field_type != FieldType::String {
            if f.min_length.is_some() {
                misplaced.push("minLength");
            }
            if f.max_length.is_some() {
                misplaced.push("maxLength");
            }
            if f.pattern.is_some() {
                misplaced.push("pattern");
            }
        }
        if f.field_type != FieldType::Array {
            if f.min_items.is_some() {
                misplaced.push("minItems");
            }
            if f.max_items.is_some() {
                misplaced.push("maxItems");
            }
        }
        for keyword in misplaced {
            errors.push(error(
                "S-012",
                format!("{}.{}", node.path, keyword),
                format!("{} does not apply to type {}", keyword, f.field_type),
            ));
        }

        if !node.addressable {
            let mut references: Vec<&str> = Vec::new();
            if !f.depends_on.is_empty() {
                references.push("dependsOn");
            }
            if f.on_change.is_some() {
                references.push("onChange");
            }
            if f.disabled.is_some() {
                references.push("disabled");
            }
            for keyword in references {
                errors.push(error(
                    "S-012",
                    format!("{}.{}", node.path, keyword),
                    format!(
                        "{} only applies to top-level fields and their properties",
                        keyword
                    ),
                ));
            }
        }
    }
}

// ─── S-013 ──────────────────────────────────────────────────────────────────

fn s013_enum_values(nodes: &[Node<'_>], errors: &mut Vec<ValidationError>) {
    for node in nodes {
        let Some(allowed) = &node.field.allowed else {
            continue;
        };
        let path = format!("{}.enum", node.path);
        if allowed.is_empty() {
            errors.push(error("S-013", &path, "enum must list at least one value"));
        }
        for (k, value) in allowed.iter().enumerate() {
            if !node.field.field_type.accepts(value) {
                errors.push(error(
                    "S-013",
                    format!("{}[{}]", path, k),
                    format!(
                        "enum value {} does not match field type {}",
                        value, node.field.field_type
                    ),
                ));
            }
        }
    }
}

// ─── S-014 ──────────────────────────────────────────────────────────────────

fn s014_context_bounds(nodes: &[Node<'_>], errors: &mut Vec<ValidationError>) {
    for node in nodes {
        if let Some(Bound::Context { context, .. }) = &node.field.max
            && !CONTEXT_PATH_RE.is_match(context)
        {
            errors.push(error(
                "S-014",
                format!("{}.max.context", node.path),
                format!("context bound must be a dotted path, got '{}'", context),
            ));
        }
    }
}

// ─── W-002 ──────────────────────────────────────────────────────────────────

fn w002_dependency_cycles(schema: &FormSchema, warnings: &mut Vec<Diagnostic>) {
    for path in dependency_cycles(schema) {
        warnings.push(warning(
            "W-002",
            &path,
            format!("'{}' depends on itself through dependsOn and can never enable", path),
        ));
    }
}
