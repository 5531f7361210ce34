//! Fuzz target for the full inspection pipeline.
//!
//! Each input is staged through a temporary file, opened as an archive, and
//! reported on. Open failures and schema findings are report text, so the
//! only failure mode left for the process is temporary-file management; that
//! exits nonzero so the fuzzer records it.
//!
//! Run with: cargo +nightly fuzz run inspect_archive

#![no_main]

use libfuzzer_sys::fuzz_target;
use std::io;

fuzz_target!(|data: &[u8]| {
    sgar::init();

    if let Err(e) = sgar::inspect_bytes(data, io::stdout()) {
        eprintln!("inspect failed: {e}");
        std::process::exit(1);
    }
});
