#![no_main]

use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let s = String::from_utf8_lossy(data);
    if let Ok(schema) = formengine::parse(&s) {
        let result = formengine::validate(&schema);
        if result.is_valid() {
            let _ = formengine::normalize(schema);
        }
    }
});
