use formengine::parse::{parse, parse_value};
use formengine::{Bound, FieldType, ParseErrorKind, Predicate};
use serde_json::json;

#[test]
fn parses_ecs_schema() {
    let schema = parse(formengine::ecs::SCHEMA_YAML).expect("ecs schema parses");
    assert_eq!(schema.resource, "ecs");
    assert_eq!(schema.version, 3);
    let names: Vec<&str> = schema.sections.iter().map(|s| s.name.as_str()).collect();
    assert_eq!(names, vec!["basic", "compute", "storage", "network", "ip"]);

    let count = schema.field("compute", "instanceCount").unwrap();
    assert_eq!(count.field_type, FieldType::Integer);
    assert_eq!(
        count.max,
        Some(Bound::Context {
            context: "project.quota.instanceCount".to_string(),
            fallback: Some(10.0),
        })
    );

    let bandwidth = schema.field("network", "bandwidth").unwrap();
    assert_eq!(
        bandwidth.disabled.as_ref().map(|d| &d.when),
        Some(&Predicate::Not("publicIp".to_string()))
    );
}

#[test]
fn version_defaults_to_one() {
    let schema = parse("resource: t\nsections: []\n").unwrap();
    assert_eq!(schema.version, 1);
}

#[test]
fn static_and_context_bounds_both_parse() {
    let schema = parse(
        r#"
resource: t
sections:
  - name: s
    fields:
      - name: a
        type: integer
        max: 5
      - name: b
        type: integer
        max:
          context: quota.b
"#,
    )
    .unwrap();
    assert_eq!(schema.field("s", "a").unwrap().max, Some(Bound::Static(5.0)));
    assert_eq!(
        schema.field("s", "b").unwrap().max,
        Some(Bound::Context {
            context: "quota.b".to_string(),
            fallback: None,
        })
    );
}

#[test]
fn rejects_empty_input() {
    let err = parse("   \n").unwrap_err();
    assert_eq!(err.kind, ParseErrorKind::Syntax);
}

#[test]
fn rejects_multi_document_yaml() {
    let err = parse("---\nresource: a\nsections: []\n---\nresource: b\nsections: []\n").unwrap_err();
    assert_eq!(err.kind, ParseErrorKind::Syntax);
    assert_eq!(err.line, Some(4));
}

#[test]
fn rejects_non_mapping_root() {
    let err = parse("- a\n- b\n").unwrap_err();
    assert_eq!(err.kind, ParseErrorKind::TypeMismatch);
}

#[test]
fn rejects_unknown_top_level_keys() {
    let err = parse("resource: t\nsections: []\nlayout: grid\n").unwrap_err();
    assert_eq!(err.kind, ParseErrorKind::UnknownVariant);
    assert_eq!(err.path.as_deref(), Some("layout"));
}

#[test]
fn rejects_unknown_field_keys() {
    let err = parse(
        r#"
resource: t
sections:
  - name: s
    fields:
      - name: a
        type: string
        placeholder: "type here"
"#,
    )
    .unwrap_err();
    assert_eq!(err.kind, ParseErrorKind::UnknownVariant);
}

#[test]
fn rejects_unknown_field_type() {
    let err = parse(
        r#"
resource: t
sections:
  - name: s
    fields:
      - name: a
        type: date
"#,
    )
    .unwrap_err();
    assert_eq!(err.kind, ParseErrorKind::UnknownVariant);
}

#[test]
fn rejects_missing_required_keys() {
    let err = parse("resource: t\n").unwrap_err();
    assert_eq!(err.kind, ParseErrorKind::TypeMismatch);
}

#[test]
fn json_values_map_onto_the_same_schema() {
    let schema = parse_value(json!({
        "resource": "t",
        "sections": [{
            "name": "s",
            "fields": [{ "name": "a", "type": "boolean", "disabled": { "when": "!b" } }]
        }]
    }))
    .unwrap();
    let field = schema.field("s", "a").unwrap();
    assert_eq!(field.field_type, FieldType::Boolean);
    assert_eq!(field.disabled.as_ref().unwrap().when, Predicate::Not("b".to_string()));
}
