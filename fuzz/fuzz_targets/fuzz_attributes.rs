// SPDX-License-Identifier: AGPL-3.0-or-later
//! Fuzz target for attribute lookup, value parsing and URI-to-path mapping

#![no_main]

use alens_core::{custom, AttributeId, AttributeKind, AttributeValue, ATTRIBUTES};
use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use std::path::Path;

const KINDS: [AttributeKind; 9] = [
    AttributeKind::Bool,
    AttributeKind::I32,
    AttributeKind::U32,
    AttributeKind::I64,
    AttributeKind::U64,
    AttributeKind::F64,
    AttributeKind::String,
    AttributeKind::Bytes,
    AttributeKind::StringList,
];

#[derive(Debug, Arbitrary)]
struct Input<'a> {
    raw_id: u32,
    kind: u8,
    text: &'a str,
}

fuzz_target!(|input: Input<'_>| {
    let Ok(id) = AttributeId::try_from(input.raw_id) else {
        let raw = input.raw_id as usize;
        assert!(raw >= ATTRIBUTES.len() && input.raw_id < AttributeId::CUSTOM_START.raw());
        return;
    };

    // Identity lookups must agree with each other
    if !id.is_custom() {
        assert!(id.info().is_some());
    }
    let _ = id.default_value();
    if let Some(name) = id.name() {
        assert_eq!(AttributeId::from_name(name), Some(id));
    }
    let _ = AttributeId::from_name(input.text);

    // Parsed values always carry the requested kind
    let kind = KINDS[input.kind as usize % KINDS.len()];
    if let Ok(value) = AttributeValue::parse(kind, input.text) {
        assert_eq!(value.kind(), Some(kind));
        let _ = value.to_string();
    }

    // Path-derived names never panic on odd input
    let _ = custom::name_attribute(Path::new(input.text), id);

    // URI-to-mount mapping stays inside the mount root
    if let Ok(uri) = url::Url::parse(input.text) {
        if let Some(path) = alens_drivers::mount_path(Path::new("/gvfs"), &uri) {
            assert!(path.starts_with("/gvfs"));
        }
    }
});
