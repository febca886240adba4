#![no_main]

use arbitrary::{Arbitrary, Unstructured};
use formengine::evaluate::evaluate_field;
use formengine::{Bound, EmptyContext, FieldSchema, FieldType};
use libfuzzer_sys::fuzz_target;
use serde_json::Value;

fn arbitrary_type(u: &mut Unstructured<'_>) -> arbitrary::Result<FieldType> {
    Ok(match u.int_in_range(0..=4)? {
        0 => FieldType::String,
        1 => FieldType::Integer,
        2 => FieldType::Boolean,
        3 => FieldType::Object,
        _ => FieldType::Array,
    })
}

/// Generate a field with an arbitrary mix of rules, not necessarily coherent.
fn arbitrary_field(u: &mut Unstructured<'_>, depth: u8) -> arbitrary::Result<FieldSchema> {
    let mut field = FieldSchema::new(String::arbitrary(u)?, arbitrary_type(u)?);
    field.required = bool::arbitrary(u)?;
    field.min = Option::<f64>::arbitrary(u)?;
    field.max = if bool::arbitrary(u)? {
        Some(Bound::Static(f64::arbitrary(u)?))
    } else {
        None
    };
    field.min_length = Option::<u8>::arbitrary(u)?.map(usize::from);
    field.max_length = Option::<u8>::arbitrary(u)?.map(usize::from);
    field.pattern = Option::<String>::arbitrary(u)?;
    field.min_items = Option::<u8>::arbitrary(u)?.map(usize::from);
    field.max_items = Option::<u8>::arbitrary(u)?.map(usize::from);
    if depth < 2 && bool::arbitrary(u)? {
        field.items = Some(Box::new(arbitrary_field(u, depth + 1)?));
    }
    if depth < 2 && bool::arbitrary(u)? {
        let len = u.int_in_range(0..=3)?;
        let mut props = Vec::with_capacity(len);
        for _ in 0..len {
            props.push(arbitrary_field(u, depth + 1)?);
        }
        field.properties = Some(props);
    }
    Ok(field)
}

fn arbitrary_value(u: &mut Unstructured<'_>, depth: u8) -> arbitrary::Result<Value> {
    let top = if depth < 2 { 6 } else { 4 };
    match u.int_in_range(0..=top)? {
        0 => Ok(Value::Null),
        1 => Ok(Value::Bool(bool::arbitrary(u)?)),
        2 => {
            let n = f64::arbitrary(u)?;
            Ok(serde_json::Number::from_f64(n)
                .map(Value::Number)
                .unwrap_or(Value::Null))
        }
        3 => Ok(Value::String(String::arbitrary(u)?)),
        5 => {
            let len = u.int_in_range(0..=4)?;
            let mut items = Vec::with_capacity(len);
            for _ in 0..len {
                items.push(arbitrary_value(u, depth + 1)?);
            }
            Ok(Value::Array(items))
        }
        6 => {
            let len = u.int_in_range(0..=4)?;
            let mut map = serde_json::Map::new();
            for _ in 0..len {
                map.insert(String::arbitrary(u)?, arbitrary_value(u, depth + 1)?);
            }
            Ok(Value::Object(map))
        }
        _ => Ok(Value::Null),
    }
}

fuzz_target!(|data: &[u8]| {
    let mut u = Unstructured::new(data);

    let field = match arbitrary_field(&mut u, 0) {
        Ok(f) => f,
        Err(_) => return,
    };
    let value = match arbitrary_value(&mut u, 0) {
        Ok(v) => v,
        Err(_) => return,
    };

    // Messages always lead with the field's label.
    if let Some(message) = evaluate_field(&field, Some(&value), &EmptyContext) {
        assert!(message.starts_with(&field.display_label()));
    }
});
