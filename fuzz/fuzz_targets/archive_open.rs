//! Fuzz target for Archive::open with arbitrary byte input.
//!
//! This target exercises the archive parsing code with potentially malformed
//! or adversarial input. The goal is to find panics, hangs, or memory issues
//! in the parsing logic.
//!
//! Run with: cargo +nightly fuzz run archive_open
//!
//! The fuzzer will automatically discover and save interesting inputs that
//! trigger new code paths.

#![no_main]

use libfuzzer_sys::fuzz_target;
use std::io::Cursor;

fn walk(node: sgar::Node<'_>) {
    // Access node fields to exercise the view layer
    let _ = node.full_name();
    let _ = node.kind();
    let _ = node.metadata().serialize();

    for property in node.properties() {
        walk_property(property);
    }
    for child in node.children() {
        walk(child);
    }
}

fn walk_property(property: sgar::Property<'_>) {
    let _ = property.data_kind();
    let _ = property.sample_count();
    let _ = property.data();
    for child in property.children() {
        walk_property(child);
    }
}

fuzz_target!(|data: &[u8]| {
    // Attempt to open arbitrary bytes as an SGA archive
    let cursor = Cursor::new(data);

    // We don't care about the result - we're looking for panics or hangs
    if let Ok(archive) = sgar::Archive::open(cursor) {
        walk(archive.root());
    }
});
