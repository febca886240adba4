use crate::primitives::{humanize, qualify_reference};
use crate::types::*;

/// Normalize a validated schema into its canonical form.
/// Sibling references are qualified with their section and missing labels are
/// derived from field names. Field and section order is preserved.
///
/// This is idempotent: `normalize(normalize(schema)) == normalize(schema)`.
pub fn normalize(mut schema: FormSchema) -> FormSchema {
    // Qualification reads section names from the schema, so resolve against an
    // unmodified snapshot.
    let snapshot = schema.clone();

    for section in &mut schema.sections {
        n001_section_label(section);
        let section_name = section.name.clone();
        for field in &mut section.fields {
            n002_qualify_references(&snapshot, &section_name, field);
            n003_labels(field);
        }
    }

    schema
}

// ─── N-001: Section labels ───────────────────────────────────────────────────

fn n001_section_label(section: &mut SectionSchema) {
    if section.label.is_none() {
        section.label = Some(humanize(&section.name));
    }
}

// ─── N-002: Qualified references ─────────────────────────────────────────────

fn n002_qualify_references(schema: &FormSchema, section: &str, field: &mut FieldSchema) {
    for dep in &mut field.depends_on {
        *dep = qualify_reference(schema, section, dep);
    }
    if let Some(on_change) = &mut field.on_change {
        for target in &mut on_change.reset {
            *target = qualify_reference(schema, section, target);
        }
    }
    if let Some(rule) = &mut field.disabled {
        rule.when = match &rule.when {
            Predicate::Not(p) => Predicate::Not(qualify_reference(schema, section, p)),
            Predicate::Truthy(p) => Predicate::Truthy(qualify_reference(schema, section, p)),
            Predicate::Unsupported(raw) => Predicate::Unsupported(raw.clone()),
        };
    }
    if let Some(props) = &mut field.properties {
        for prop in props {
            n002_qualify_references(schema, section, prop);
        }
    }
}

// ─── N-003: Field labels ─────────────────────────────────────────────────────

fn n003_labels(field: &mut FieldSchema) {
    if field.label.is_none() && !field.name.is_empty() {
        field.label = Some(humanize(&field.name));
    }
    if let Some(props) = &mut field.properties {
        for prop in props {
            n003_labels(prop);
        }
    }
    if let Some(items) = &mut field.items {
        n003_labels(items);
    }
}
