#![no_main]

use formengine::FieldPath;
use formengine::primitives::{field_value, get_path, set_field_value};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if data.is_empty() {
        return;
    }

    // Use the first byte to determine the split point between path and JSON value.
    let split = data[0] as usize % data.len().max(1);
    let (path_bytes, value_bytes) = data.split_at(split.min(data.len()));

    let path = String::from_utf8_lossy(path_bytes);

    if let Ok(mut value) = serde_json::from_slice::<serde_json::Value>(value_bytes) {
        let _ = get_path(&value, &path);

        if let Ok(field_path) = path.parse::<FieldPath>() {
            assert_eq!(field_path.to_string(), path);
            let marker = serde_json::json!("fuzz-marker");
            set_field_value(&mut value, &field_path, marker.clone());
            assert_eq!(field_value(&value, &field_path), Some(&marker));
        }
    }
});
