#![no_main]

use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let s = String::from_utf8_lossy(data);

    let loaded = match formengine::load(&s) {
        Ok(l) => l,
        Err(_) => return,
    };

    let yaml = match formengine::serialize(&loaded.schema) {
        Ok(y) => y,
        Err(_) => return,
    };

    // A serialized schema must parse back and serialize to the same text.
    match formengine::parse(&yaml) {
        Ok(reparsed) => assert_eq!(formengine::serialize(&reparsed).ok().as_deref(), Some(yaml.as_str())),
        Err(e) => panic!(
            "Roundtrip failure: serialize produced YAML that cannot be re-parsed: {}\n\
             Input (lossy): {:?}\n\
             Serialized YAML:\n{}",
            e,
            s.get(..200).unwrap_or(&s),
            yaml.get(..500).unwrap_or(&yaml),
        ),
    }
});
