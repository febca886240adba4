//! Field enablement and the dependency graph that drives cascading resets.

use crate::primitives::{get_path, is_empty_value, is_truthy, qualify_reference};
use crate::types::*;
use serde_json::Value;
use std::collections::{BTreeMap, BTreeSet};
use tracing::trace;

// ─── Enablement ─────────────────────────────────────────────────────────────

/// Returns true when a `disabled.when` predicate currently disables its field.
/// Unsupported predicate forms never fire.
pub fn predicate_fires(
    predicate: &Predicate,
    schema: &FormSchema,
    section: &str,
    record: &Value,
) -> bool {
    match predicate {
        Predicate::Not(p) => !is_truthy(get_path(record, &qualify_reference(schema, section, p))),
        Predicate::Truthy(p) => is_truthy(get_path(record, &qualify_reference(schema, section, p))),
        Predicate::Unsupported(raw) => {
            trace!(predicate = %raw, "unsupported predicate treated as not disabled");
            false
        }
    }
}

/// A field is enabled unless its predicate fires or any `dependsOn` path is
/// currently empty.
pub fn is_field_enabled(
    schema: &FormSchema,
    section: &str,
    field: &FieldSchema,
    record: &Value,
) -> bool {
    if let Some(rule) = &field.disabled
        && predicate_fires(&rule.when, schema, section, record)
    {
        return false;
    }
    field
        .depends_on
        .iter()
        .all(|dep| !is_empty_value(get_path(record, &qualify_reference(schema, section, dep))))
}

/// Enablement of a typed path. A nested property is enabled only when its
/// owning field is, and its own rules (if any) pass as well.
pub fn is_path_enabled(schema: &FormSchema, path: &FieldPath, record: &Value) -> bool {
    let owner = match schema.field(&path.section, &path.field) {
        Some(f) => f,
        None => return false,
    };
    if !is_field_enabled(schema, &path.section, owner, record) {
        return false;
    }
    match &path.property {
        None => true,
        Some(prop) => match owner.property(prop) {
            Some(p) => is_field_enabled(schema, &path.section, p, record),
            None => false,
        },
    }
}

// ─── Dependency index ───────────────────────────────────────────────────────

/// Precomputed reverse edges: for each upstream path, which fields must be
/// blanked when it changes.
///
/// Object properties take part like top-level fields: their `dependsOn`
/// entries point at the property path, and their `onChange.reset` lists are
/// keyed by it.
#[derive(Clone, Debug, Default)]
pub struct DependencyIndex {
    /// Qualified `dependsOn` path → fields and properties declaring it.
    dependents: BTreeMap<String, Vec<FieldPath>>,
    /// Declaring field or property path → its `onChange.reset` targets.
    resets: BTreeMap<String, Vec<FieldPath>>,
}

impl DependencyIndex {
    pub fn build(schema: &FormSchema) -> Self {
        let mut index = DependencyIndex::default();
        for section in &schema.sections {
            for field in &section.fields {
                let own = FieldPath::new(section.name.clone(), field.name.clone());
                index.add_node(schema, &section.name, field, &own);
                for prop in field.properties.iter().flatten() {
                    let nested = FieldPath::nested(
                        section.name.clone(),
                        field.name.clone(),
                        prop.name.clone(),
                    );
                    index.add_node(schema, &section.name, prop, &nested);
                }
            }
        }
        index
    }

    fn add_node(&mut self, schema: &FormSchema, section: &str, node: &FieldSchema, own: &FieldPath) {
        for dep in &node.depends_on {
            let qualified = qualify_reference(schema, section, dep);
            self.dependents
                .entry(qualified)
                .or_default()
                .push(own.clone());
        }
        let targets: Vec<FieldPath> = node
            .reset_targets()
            .iter()
            .filter_map(|t| qualify_reference(schema, section, t).parse().ok())
            .collect();
        if !targets.is_empty() {
            self.resets.insert(own.to_string(), targets);
        }
    }

    /// Fields to reset when `changed` changes: the reset lists and dependents
    /// attached to it, then those attached to related paths.
    ///
    /// A change to a property also fires what hangs off its owning field, and
    /// a change to a whole field fires what hangs off any of its properties.
    pub fn targets_of(&self, changed: &FieldPath) -> Vec<FieldPath> {
        let changed_str = changed.to_string();
        let owner_str = changed.owner().to_string();
        let nested_prefix = format!("{}.", changed_str);
        let fires = |key: &String| {
            *key == changed_str
                || *key == owner_str
                || (!changed.is_nested() && key.starts_with(&nested_prefix))
        };

        let mut seen = BTreeSet::new();
        let mut targets = Vec::new();
        let mut push = |path: &FieldPath| {
            if seen.insert(path.clone()) {
                targets.push(path.clone());
            }
        };

        for (key, resets) in &self.resets {
            if fires(key) {
                resets.iter().for_each(&mut push);
            }
        }
        for (dep, fields) in &self.dependents {
            if fires(dep) {
                fields.iter().for_each(&mut push);
            }
        }

        targets
    }
}

/// Fields that can never enable because their `dependsOn` chain loops back
/// to themselves.
pub fn dependency_cycles(schema: &FormSchema) -> Vec<String> {
    let mut edges: BTreeMap<String, Vec<String>> = BTreeMap::new();
    for section in &schema.sections {
        for field in &section.fields {
            let own = format!("{}.{}", section.name, field.name);
            let deps = field
                .depends_on
                .iter()
                .filter_map(|d| {
                    qualify_reference(schema, &section.name, d)
                        .parse::<FieldPath>()
                        .ok()
                })
                .map(|p| p.owner().to_string())
                .collect();
            edges.insert(own, deps);
        }
    }

    let mut cyclic = Vec::new();
    for start in edges.keys() {
        let mut stack: Vec<&String> = edges.get(start).map(|d| d.iter().collect()).unwrap_or_default();
        let mut visited = BTreeSet::new();
        while let Some(node) = stack.pop() {
            if node == start {
                cyclic.push(start.clone());
                break;
            }
            if visited.insert(node.clone())
                && let Some(next) = edges.get(node)
            {
                stack.extend(next.iter());
            }
        }
    }
    cyclic
}
