use formengine::primitives::*;
use formengine::{CascadeMode, EngineError, EngineOptions, FieldSchema, FieldType};
use serde_json::json;

use super::common::*;

#[test]
fn humanize_produces_sentence_case() {
    assert_eq!(humanize("instanceType"), "Instance type");
    assert_eq!(humanize("publicIp"), "Public ip");
    assert_eq!(humanize("az"), "Az");
    assert_eq!(humanize("data_disks"), "Data disks");
    assert_eq!(humanize("VPC"), "VPC");
    assert_eq!(humanize("ipv6"), "Ipv6");
}

#[test]
fn blank_empty_and_truthy_are_distinct() {
    assert!(is_blank(None));
    assert!(is_blank(Some(&json!(null))));
    assert!(is_blank(Some(&json!(""))));
    assert!(!is_blank(Some(&json!([]))));
    assert!(!is_blank(Some(&json!(0))));

    assert!(is_empty_value(Some(&json!([]))));
    assert!(is_empty_value(Some(&json!({}))));
    assert!(!is_empty_value(Some(&json!(false))));

    assert!(is_truthy(Some(&json!([]))));
    assert!(is_truthy(Some(&json!("no"))));
    assert!(!is_truthy(Some(&json!(0))));
    assert!(!is_truthy(Some(&json!(false))));
    assert!(!is_truthy(None));
}

#[test]
fn numbers_read_from_numbers_and_numeric_strings() {
    assert_eq!(as_number(&json!(3)), Some(3.0));
    assert_eq!(as_number(&json!(" 2.5 ")), Some(2.5));
    assert_eq!(as_number(&json!("ten")), None);
    assert_eq!(as_number(&json!("inf")), None);
    assert_eq!(as_number(&json!(true)), None);

    assert_eq!(format_number(10.0), "10");
    assert_eq!(format_number(2.5), "2.5");
}

#[test]
fn references_qualify_against_declaring_section() {
    let schema = schema(VM_SCHEMA);
    assert_eq!(qualify_reference(&schema, "network", "vpc"), "network.vpc");
    assert_eq!(qualify_reference(&schema, "network", "basic.region"), "basic.region");
    assert_eq!(qualify_reference(&schema, "storage", "systemDisk.size"), "storage.systemDisk.size");
}

#[test]
fn path_lookups() {
    let record = json!({ "project": { "quota": { "instanceCount": 4 } } });
    assert_eq!(get_path(&record, "project.quota.instanceCount"), Some(&json!(4)));
    assert_eq!(get_path(&record, ""), Some(&record));
    assert_eq!(get_path(&record, "project.missing"), None);
    assert_eq!(resolve_simple_path("project.quota", &record), Some(json!({ "instanceCount": 4 })));
}

#[test]
fn type_defaults_fill_missing_declared_defaults() {
    let defaults = TypeDefaults::default();
    assert_eq!(defaults.for_type(FieldType::String), &json!(""));
    assert_eq!(defaults.for_type(FieldType::Integer), &json!(0));
    assert_eq!(defaults.for_type(FieldType::Array), &json!([]));

    let mut count = FieldSchema::new("count", FieldType::Integer);
    count.default = Some(json!(1));
    assert_eq!(defaults.default_for(&count), json!(1));

    let mut disk = FieldSchema::new("disk", FieldType::Object);
    let mut size = FieldSchema::new("size", FieldType::Integer);
    size.default = Some(json!(40));
    disk.properties = Some(vec![FieldSchema::new("type", FieldType::String), size]);
    assert_eq!(defaults.default_for(&disk), json!({ "type": "", "size": 40 }));
}

#[test]
fn custom_type_defaults_apply_to_resets() {
    let engine = formengine::FormEngine::builder(schema(VM_SCHEMA))
        .type_defaults(TypeDefaults {
            string: json!("-"),
            ..TypeDefaults::default()
        })
        .build()
        .unwrap();
    assert_eq!(engine.get_field_value("basic", "az"), Some(&json!("-")));
}

// ─── Options ────────────────────────────────────────────────────────────────

#[test]
fn options_from_yaml() {
    assert_eq!(EngineOptions::from_yaml("").unwrap(), EngineOptions::default());

    let options = EngineOptions::from_yaml("cascade: single_hop\nvalidateOnChange: false\n").unwrap();
    assert_eq!(options.cascade, CascadeMode::SingleHop);
    assert!(!options.validate_on_change);
    assert!(options.untouch_on_reset);
}

#[test]
fn options_reject_unknown_keys() {
    let err = EngineOptions::from_yaml("cascade: fixed_point\nretries: 3\n").unwrap_err();
    assert!(matches!(err, EngineError::Options(_)), "{:?}", err);
}

#[test]
fn field_paths_list_properties_after_their_owner() {
    let schema = formengine::ecs::schema().unwrap();
    let paths: Vec<String> = schema
        .field_paths()
        .iter()
        .filter(|p| p.section == "storage")
        .map(ToString::to_string)
        .collect();
    assert_eq!(
        paths,
        vec![
            "storage.systemDisk",
            "storage.systemDisk.type",
            "storage.systemDisk.size",
            "storage.dataDisks",
        ]
    );
}

#[test]
fn section_policy_exposes_declared_rules() {
    let policy = formengine::ecs::section_policy();
    match policy.rule("ip") {
        Some(formengine::SectionRule::RequiresAll(paths)) => {
            assert_eq!(paths, &["network.vpc", "network.subnet"]);
        }
        other => panic!("unexpected rule: {:?}", other),
    }
    assert!(policy.rule("basic").is_none());
    assert!(policy.is_enabled("basic", &json!({})));
}
