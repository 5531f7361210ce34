//! Command implementations for the CLI tool.

use std::io;
use std::path::Path;

use sgar::Archive;

use crate::exit_codes::{ExitCode, error_to_exit_code};

/// Info command implementation
pub fn info(archive_path: &Path) -> ExitCode {
    let archive = match open_archive(archive_path) {
        Ok(a) => a,
        Err(code) => return code,
    };

    let info = archive.info();

    println!("Archive Information:");
    println!("{}", "-".repeat(40));
    println!("  Version:        {}.{}", info.version.0, info.version.1);
    println!("  Nodes:          {}", info.node_count);
    println!("  Properties:     {}", info.property_count);
    println!("  Max depth:      {}", info.max_depth);
    println!("  Node table:     {}", humanize_bytes(info.tree_bytes));
    println!("  Data segment:   {}", humanize_bytes(info.data_bytes));

    ExitCode::Success
}

/// Dump command implementation
pub fn dump(archive_path: &Path) -> ExitCode {
    match sgar::print_info(archive_path, io::stdout()) {
        Ok(()) => ExitCode::Success,
        Err(e) => {
            eprintln!("Error: {}", e);
            error_to_exit_code(&e)
        }
    }
}

/// Helper to open an archive
fn open_archive(path: &Path) -> Result<Archive, ExitCode> {
    Archive::open_path(path).map_err(|e| {
        eprintln!("Error opening archive: {}", e);
        error_to_exit_code(&e)
    })
}

/// Formats a byte count with a binary-unit suffix
fn humanize_bytes(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;
    const GB: u64 = MB * 1024;

    if bytes >= GB {
        format!("{:.1} GB", bytes as f64 / GB as f64)
    } else if bytes >= MB {
        format!("{:.1} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.1} KB", bytes as f64 / KB as f64)
    } else {
        format!("{} B", bytes)
    }
}
