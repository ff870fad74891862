//! Fuzz target for share link parsing
//!
//! This fuzzer tests link and fragment parsing with arbitrary strings to
//! find:
//! - Parser panics on malformed URLs
//! - Slicing errors at multi-byte UTF-8 boundaries
//! - Fragments that parse into empty key material
//!
//! The fuzzer should NEVER panic. All invalid inputs should return an error.

#![no_main]

use cinderlink_core::{ShareableLink, parse_fragment};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let Ok(input) = std::str::from_utf8(data) else {
        return;
    };

    // Attempt to parse arbitrary text as a full link and as a bare
    // fragment. Neither should ever panic.
    if let Ok(link) = ShareableLink::parse(input) {
        // A successful parse must round-trip through composition.
        let reparsed = ShareableLink::parse(&link.to_url()).expect("composed link must parse");
        assert_eq!(reparsed.token, link.token);
        assert_eq!(reparsed.fragment, link.fragment);
        assert!(!link.token.as_str().is_empty());
    }

    if let Ok(fragment) = parse_fragment(input) {
        assert!(!fragment.key.is_empty());
        assert!(!fragment.iv.is_empty());
    }
});
