use formengine::evaluate::evaluate_field;
use formengine::parse::parse;
use formengine::primitives::{is_blank, is_empty_value, is_truthy};
use formengine::validate::validate;
use formengine::{EmptyContext, FieldSchema, FieldType, normalize};
use proptest::prelude::*;
use serde_json::{Value, json};

fn arb_type() -> impl Strategy<Value = FieldType> {
    prop_oneof![
        Just(FieldType::String),
        Just(FieldType::Integer),
        Just(FieldType::Boolean),
        Just(FieldType::Object),
        Just(FieldType::Array),
    ]
}

fn arb_blank() -> impl Strategy<Value = Option<Value>> {
    prop_oneof![Just(None), Just(Some(Value::Null)), Just(Some(json!("")))]
}

fn arb_value() -> impl Strategy<Value = Value> {
    let leaf = prop_oneof![
        Just(Value::Null),
        any::<bool>().prop_map(Value::Bool),
        (-1000i64..1000).prop_map(|n| json!(n)),
        (-1000.0f64..1000.0).prop_map(|n| json!(n)),
        "[a-zA-Z0-9 ]{0,10}".prop_map(Value::String),
    ];
    leaf.prop_recursive(2, 8, 3, |inner| {
        prop_oneof![
            prop::collection::vec(inner.clone(), 0..3).prop_map(Value::Array),
            prop::collection::btree_map("[a-z]{1,4}", inner, 0..3)
                .prop_map(|m| Value::Object(m.into_iter().collect())),
        ]
    })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(128))]

    // Blank values never produce an error on optional fields
    #[test]
    fn optional_blank_is_valid(ty in arb_type(), blank in arb_blank()) {
        let field = FieldSchema::new("thing", ty);
        prop_assert_eq!(evaluate_field(&field, blank.as_ref(), &EmptyContext), None);
    }

    // Blank values always fail required fields with the required message
    #[test]
    fn required_blank_is_required_error(ty in arb_type(), blank in arb_blank()) {
        let mut field = FieldSchema::new("thing", ty);
        field.required = true;
        prop_assert_eq!(
            evaluate_field(&field, blank.as_ref(), &EmptyContext),
            Some("Thing is required".to_string())
        );
    }

    // Every error message starts with the field's label
    #[test]
    fn messages_lead_with_label(ty in arb_type(), value in arb_value(), required in any::<bool>()) {
        let mut field = FieldSchema::new("diskSize", ty);
        field.required = required;
        if let Some(message) = evaluate_field(&field, Some(&value), &EmptyContext) {
            prop_assert!(message.starts_with("Disk size "), "{:?}", message);
        }
    }

    // Integers inside a static range pass; outside it they fail
    #[test]
    fn integer_range(min in -50i64..50, span in 0i64..50, probe in -200i64..200) {
        let field: FieldSchema = serde_json::from_value(json!({
            "name": "count", "type": "integer", "min": min, "max": min + span
        })).unwrap();
        let result = evaluate_field(&field, Some(&json!(probe)), &EmptyContext);
        let inside = probe >= min && probe <= min + span;
        prop_assert_eq!(result.is_none(), inside, "probe {} in [{}, {}]: {:?}", probe, min, min + span, result);
    }

    // String length limits count characters, not bytes
    #[test]
    fn string_length_counts_chars(text in "[a-zé]{0,12}", max in 0usize..12) {
        let mut field = FieldSchema::new("name", FieldType::String);
        field.max_length = Some(max);
        let result = evaluate_field(&field, Some(&json!(text)), &EmptyContext);
        prop_assert_eq!(result.is_none(), text.chars().count() <= max);
    }

    // Blank implies empty; empty implies falsy
    #[test]
    fn emptiness_is_layered(value in proptest::option::of(arb_value())) {
        let v = value.as_ref();
        if is_blank(v) {
            prop_assert!(is_empty_value(v));
        }
        if is_empty_value(v) && !matches!(v, Some(Value::Array(_)) | Some(Value::Object(_))) {
            prop_assert!(!is_truthy(v));
        }
    }

    // Validation never mutates and normalization is idempotent
    #[test]
    fn normalize_is_idempotent(
        names in prop::collection::btree_set("[a-z][a-zA-Z]{0,6}", 1..5),
        required in any::<bool>(),
    ) {
        let names: Vec<String> = names.into_iter().collect();
        let mut yaml = String::from("resource: r\nsections:\n  - name: main\n    fields:\n");
        for (i, name) in names.iter().enumerate() {
            yaml.push_str(&format!("      - name: \"{}\"\n        type: string\n        required: {}\n", name, required));
            if i > 0 {
                yaml.push_str(&format!("        dependsOn: [\"{}\"]\n", names[i - 1]));
            }
        }
        let schema = parse(&yaml).unwrap();
        let result = validate(&schema);
        prop_assert!(result.is_valid(), "{:?}", result.errors);
        let once = normalize(schema);
        let twice = normalize(once.clone());
        prop_assert_eq!(once, twice);
    }
}
