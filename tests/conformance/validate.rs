use formengine::parse::parse;
use formengine::validate::validate;
use formengine::DiagnosticSeverity;

/// Helper: parse then validate, return the paths of errors for one rule.
fn errors_for(input: &str, rule: &str) -> Vec<String> {
    let schema = parse(input).expect("parse should succeed");
    validate(&schema)
        .errors
        .iter()
        .filter(|e| e.rule == rule)
        .map(|e| e.path.clone())
        .collect()
}

fn warnings_for(input: &str, code: &str) -> Vec<String> {
    let schema = parse(input).expect("parse should succeed");
    validate(&schema)
        .warnings
        .iter()
        .filter(|w| w.code == code)
        .filter_map(|w| w.path.clone())
        .collect()
}

/// Wraps field YAML (indented for a `fields:` list) in a one-section schema.
fn one_section(fields: &str) -> String {
    format!("resource: t\nsections:\n  - name: s\n    fields:\n{}", fields)
}

#[test]
fn bundled_schemas_are_valid() {
    let schema = parse(formengine::ecs::SCHEMA_YAML).unwrap();
    let result = validate(&schema);
    assert!(result.is_valid(), "{:?}", result.errors);
    assert!(result.warnings.is_empty(), "{:?}", result.warnings);
}

#[test]
fn s001_requires_sections() {
    assert_eq!(errors_for("resource: t\nsections: []\n", "S-001"), vec!["sections"]);
    assert_eq!(
        errors_for("resource: ''\nsections:\n  - name: s\n", "S-001"),
        vec!["resource"]
    );
}

#[test]
fn s002_section_names() {
    let input = r#"
resource: t
sections:
  - name: basic
  - name: basic
  - name: "2nd"
"#;
    assert_eq!(
        errors_for(input, "S-002"),
        vec!["sections[1].name", "sections[2].name"]
    );
}

#[test]
fn s003_field_and_property_names() {
    let input = one_section(
        r#"      - name: a
        type: string
      - name: a
        type: string
      - name: disk
        type: object
        properties:
          - name: size
            type: integer
          - name: size
            type: integer
"#,
    );
    assert_eq!(
        errors_for(&input, "S-003"),
        vec!["sections[0].fields[1].name", "sections[0].fields[2].properties[1].name"]
    );
}

#[test]
fn s004_dangling_depends_on() {
    let input = one_section(
        r#"      - name: a
        type: string
        dependsOn: [b, other.c, s.a2]
      - name: a2
        type: string
"#,
    );
    assert_eq!(
        errors_for(&input, "S-004"),
        vec!["sections[0].fields[0].dependsOn[0]", "sections[0].fields[0].dependsOn[1]"]
    );
}

#[test]
fn s005_self_dependency() {
    let input = one_section(
        r#"      - name: a
        type: string
        dependsOn: [a]
"#,
    );
    assert_eq!(errors_for(&input, "S-005"), vec!["sections[0].fields[0].dependsOn[0]"]);
}

#[test]
fn s006_reset_targets() {
    let input = one_section(
        r#"      - name: a
        type: string
        onChange:
          reset: [b, a, missing]
      - name: b
        type: string
"#,
    );
    assert_eq!(
        errors_for(&input, "S-006"),
        vec!["sections[0].fields[0].onChange.reset[1]", "sections[0].fields[0].onChange.reset[2]"]
    );
}

#[test]
fn s007_predicate_paths_and_w001_unsupported_forms() {
    let input = one_section(
        r#"      - name: a
        type: boolean
      - name: b
        type: integer
        disabled:
          when: "!missing"
      - name: c
        type: integer
        disabled:
          when: "a == true"
      - name: d
        type: integer
        disabled:
          when: "!a"
"#,
    );
    assert_eq!(errors_for(&input, "S-007"), vec!["sections[0].fields[1].disabled.when"]);
    assert_eq!(warnings_for(&input, "W-001"), vec!["sections[0].fields[2].disabled.when"]);
}

#[test]
fn s008_default_must_match_type() {
    let input = one_section(
        r#"      - name: a
        type: integer
        default: "three"
      - name: b
        type: boolean
        default: false
      - name: c
        type: integer
        default: 1.5
"#,
    );
    assert_eq!(
        errors_for(&input, "S-008"),
        vec!["sections[0].fields[0].default", "sections[0].fields[2].default"]
    );
}

#[test]
fn s009_inverted_ranges() {
    let input = one_section(
        r#"      - name: a
        type: integer
        min: 10
        max: 5
      - name: b
        type: string
        minLength: 4
        maxLength: 2
      - name: c
        type: array
        minItems: 3
        maxItems: 1
      - name: d
        type: integer
        min: 10
        max:
          context: quota.d
"#,
    );
    assert_eq!(
        errors_for(&input, "S-009"),
        vec![
            "sections[0].fields[0].min",
            "sections[0].fields[1].minLength",
            "sections[0].fields[2].minItems",
        ]
    );
}

#[test]
fn s010_invalid_pattern_and_w003_orphan_message() {
    let input = one_section(
        r#"      - name: a
        type: string
        pattern: "([a-z"
      - name: b
        type: string
        patternMessage: "letters only"
"#,
    );
    assert_eq!(errors_for(&input, "S-010"), vec!["sections[0].fields[0].pattern"]);
    assert_eq!(warnings_for(&input, "W-003"), vec!["sections[0].fields[1].patternMessage"]);
}

#[test]
fn s011_nested_shapes_need_matching_types() {
    let input = one_section(
        r#"      - name: a
        type: string
        properties:
          - name: x
            type: string
      - name: b
        type: object
        items:
          type: string
"#,
    );
    assert_eq!(
        errors_for(&input, "S-011"),
        vec!["sections[0].fields[0].properties", "sections[0].fields[1].items"]
    );
}

#[test]
fn s012_keywords_must_apply_to_type() {
    let input = one_section(
        r#"      - name: a
        type: string
        min: 1
      - name: b
        type: integer
        maxLength: 3
      - name: c
        type: boolean
        maxItems: 2
"#,
    );
    assert_eq!(
        errors_for(&input, "S-012"),
        vec![
            "sections[0].fields[0].min",
            "sections[0].fields[1].maxLength",
            "sections[0].fields[2].maxItems",
        ]
    );
}

#[test]
fn s013_enum_values() {
    let input = one_section(
        r#"      - name: a
        type: string
        enum: []
      - name: b
        type: string
        enum: [SSD, 3]
"#,
    );
    assert_eq!(
        errors_for(&input, "S-013"),
        vec!["sections[0].fields[0].enum", "sections[0].fields[1].enum[1]"]
    );
}

#[test]
fn s014_context_bound_paths() {
    let input = one_section(
        r#"      - name: a
        type: integer
        max:
          context: "project..quota"
      - name: b
        type: integer
        max:
          context: project.quota.b
"#,
    );
    assert_eq!(errors_for(&input, "S-014"), vec!["sections[0].fields[0].max.context"]);
}

#[test]
fn w002_dependency_cycles() {
    let input = one_section(
        r#"      - name: a
        type: string
        dependsOn: [b]
      - name: b
        type: string
        dependsOn: [a]
      - name: c
        type: string
        dependsOn: [a]
"#,
    );
    assert_eq!(warnings_for(&input, "W-002"), vec!["s.a", "s.b"]);
}

#[test]
fn validation_reports_every_error() {
    let input = one_section(
        r#"      - name: a
        type: string
        dependsOn: [nope]
        pattern: "("
        min: 3
"#,
    );
    let schema = parse(&input).unwrap();
    let result = validate(&schema);
    let mut rules: Vec<&str> = result.errors.iter().map(|e| e.rule.as_str()).collect();
    rules.sort();
    assert_eq!(rules, vec!["S-004", "S-010", "S-012"]);
}

#[test]
fn s012_references_only_on_addressable_nodes() {
    let input = one_section(
        r#"      - name: tags
        type: array
        items:
          type: object
          dependsOn: [nowhere.nothing]
          onChange:
            reset: [ghost]
          disabled:
            when: "!phantom.field"
      - name: disk
        type: object
        properties:
          - name: size
            type: integer
            dependsOn: [tags]
"#,
    );
    assert_eq!(
        errors_for(&input, "S-012"),
        vec![
            "sections[0].fields[0].items.dependsOn",
            "sections[0].fields[0].items.onChange",
            "sections[0].fields[0].items.disabled",
        ]
    );
    assert!(formengine::load(&input).is_err());
}

#[test]
fn diagnostics_list_errors_before_warnings() {
    let input = one_section(
        r#"      - name: a
        type: string
        dependsOn: [nope]
      - name: b
        type: string
        patternMessage: "letters only"
"#,
    );
    let result = validate(&parse(&input).unwrap());
    let tagged: Vec<(DiagnosticSeverity, String)> = result
        .diagnostics()
        .into_iter()
        .map(|d| (d.severity, d.code))
        .collect();
    assert_eq!(
        tagged,
        vec![
            (DiagnosticSeverity::Error, "S-004".to_string()),
            (DiagnosticSeverity::Warning, "W-003".to_string()),
        ]
    );
}
