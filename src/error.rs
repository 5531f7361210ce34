//! Error types for SGA archive operations.
//!
//! This module provides the [`Error`] enum which represents all possible
//! failure modes when reading, writing, or inspecting SGA scene-graph
//! archives, along with a convenient [`Result<T>`] type alias.
//!
//! # Error Handling
//!
//! All fallible operations in this crate return `Result<T, Error>`:
//!
//! ```rust,no_run
//! use sgar::{Archive, Result};
//!
//! fn node_count(path: &str) -> Result<usize> {
//!     let archive = Archive::open_path(path)?;
//!     Ok(archive.info().node_count)
//! }
//! ```
//!
//! # Error Categories
//!
//! The inspector cares about two broad classes:
//!
//! | Class | Variants | Meaning |
//! |-------|----------|---------|
//! | Structural | [`InvalidFormat`][Error::InvalidFormat], [`UnsupportedVersion`][Error::UnsupportedVersion], [`CorruptHeader`][Error::CorruptHeader], [`LimitExceeded`][Error::LimitExceeded] | The file cannot be opened as an archive |
//! | Interpretation | [`Schema`][Error::Schema], [`TypeMismatch`][Error::TypeMismatch] | The archive opened, but a node's typed view is inconsistent |
//!
//! Structural errors surface at open time; interpretation errors can surface
//! mid-traversal, when a schema view is constructed over a node whose
//! properties do not have the layout the schema requires.

use std::io;

/// The main error type for SGA archive operations.
///
/// Each variant carries enough context to locate the problem: a byte offset
/// for corruption found while parsing, or a node path for violations found
/// while interpreting an already-parsed tree.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    /// An I/O error occurred during file operations.
    ///
    /// This wraps [`std::io::Error`] and is returned when reading the archive
    /// file, writing an archive, or writing report output fails.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// The file is not an SGA archive.
    ///
    /// Returned when the signature is missing or the outer size arithmetic
    /// does not describe the file (truncated file, trailing garbage). The
    /// string describes what was expected versus found.
    #[error("Invalid SGA format: {0}")]
    InvalidFormat(String),

    /// The archive declares a format version this build cannot read.
    #[error("Unsupported SGA version {major}.{minor}")]
    UnsupportedVersion {
        /// Declared major version.
        major: u8,
        /// Declared minor version.
        minor: u8,
    },

    /// The archive structure is corrupt or truncated.
    ///
    /// This covers CRC mismatches, invalid record tags, malformed strings,
    /// property data spans pointing outside the data segment, and node
    /// tables that end early or carry trailing bytes. The offset is relative
    /// to the start of the file where that is meaningful, otherwise to the
    /// start of the node table.
    #[error("Corrupt archive at offset {offset:#x}: {reason}")]
    CorruptHeader {
        /// The byte offset where corruption was detected.
        offset: u64,
        /// A description of the corruption.
        reason: String,
    },

    /// A resource limit was exceeded while parsing.
    ///
    /// Protects against adversarial inputs declaring absurd node, property,
    /// or string counts. Limits are configured with
    /// [`ReadLimits`](crate::format::ReadLimits).
    #[error("Resource limit exceeded: {0}")]
    LimitExceeded(String),

    /// A node's properties violate the layout its schema requires.
    ///
    /// The archive itself parsed, but a typed schema view (mesh, subd,
    /// curves, face set, xform, material) found a well-known property with
    /// the wrong shape, or a required property missing. For the inspector
    /// this is an expected finding, not a harness failure.
    #[error("Schema violation at '{path}': {reason}")]
    Schema {
        /// Full path of the offending node.
        path: String,
        /// A description of the violation.
        reason: String,
    },

    /// A typed accessor was used on a property with a different data kind.
    #[error("Type mismatch at '{path}': expected {expected}, found {found}")]
    TypeMismatch {
        /// Full path of the node or property accessed.
        path: String,
        /// The data kind the accessor requires.
        expected: &'static str,
        /// The data kind actually present.
        found: String,
    },
}

impl Error {
    /// Returns `true` if this error indicates a damaged or non-archive file.
    ///
    /// These are the errors the factory reports as "invalid" at open time.
    pub fn is_corruption(&self) -> bool {
        matches!(
            self,
            Error::InvalidFormat(_)
                | Error::UnsupportedVersion { .. }
                | Error::CorruptHeader { .. }
                | Error::LimitExceeded(_)
        )
    }

    /// Returns `true` if this error was found while interpreting a node's
    /// typed view rather than while parsing the file structure.
    ///
    /// These can surface mid-traversal and are the inspector's expected
    /// finding class.
    pub fn is_schema_violation(&self) -> bool {
        matches!(self, Error::Schema { .. } | Error::TypeMismatch { .. })
    }

    /// Returns the node path associated with this error, if any.
    pub fn node_path(&self) -> Option<&str> {
        match self {
            Error::Schema { path, .. } => Some(path.as_str()),
            Error::TypeMismatch { path, .. } => Some(path.as_str()),
            _ => None,
        }
    }

    /// Creates a `CorruptHeader` error.
    pub fn corrupt(offset: u64, reason: impl Into<String>) -> Self {
        Error::CorruptHeader {
            offset,
            reason: reason.into(),
        }
    }

    /// Creates a `Schema` error.
    pub fn schema(path: impl Into<String>, reason: impl Into<String>) -> Self {
        Error::Schema {
            path: path.into(),
            reason: reason.into(),
        }
    }
}

/// A specialized Result type for SGA operations.
///
/// Defined as `std::result::Result<T, Error>` for convenience.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_io_error_from() {
        let io_err = io::Error::new(io::ErrorKind::NotFound, "file not found");
        let err: Error = io_err.into();
        assert!(matches!(err, Error::Io(_)));
        assert!(err.to_string().contains("I/O error"));
    }

    #[test]
    fn test_invalid_format() {
        let err = Error::InvalidFormat("missing signature".into());
        assert_eq!(err.to_string(), "Invalid SGA format: missing signature");
        assert!(err.is_corruption());
        assert!(!err.is_schema_violation());
    }

    #[test]
    fn test_unsupported_version() {
        let err = Error::UnsupportedVersion { major: 9, minor: 3 };
        assert!(err.to_string().contains("9.3"));
        assert!(err.is_corruption());
    }

    #[test]
    fn test_corrupt_header() {
        let err = Error::CorruptHeader {
            offset: 0x1234,
            reason: "tree CRC mismatch".into(),
        };
        assert!(err.to_string().contains("0x1234"));
        assert!(err.to_string().contains("tree CRC mismatch"));
        assert!(err.is_corruption());
    }

    #[test]
    fn test_limit_exceeded() {
        let err = Error::LimitExceeded("too many nodes: 70000".into());
        assert!(err.to_string().contains("70000"));
        assert!(err.is_corruption());
        assert!(!err.is_schema_violation());
    }

    #[test]
    fn test_schema_error() {
        let err = Error::schema("/root/mesh1", "property 'P' is not a v3f array");
        assert!(err.to_string().contains("/root/mesh1"));
        assert!(err.to_string().contains("'P'"));
        assert!(err.is_schema_violation());
        assert!(!err.is_corruption());
        assert_eq!(err.node_path(), Some("/root/mesh1"));
    }

    #[test]
    fn test_type_mismatch() {
        let err = Error::TypeMismatch {
            path: "/root/subd/.scheme".into(),
            expected: "str",
            found: "f32".into(),
        };
        let msg = err.to_string();
        assert!(msg.contains("expected str"));
        assert!(msg.contains("found f32"));
        assert!(err.is_schema_violation());
        assert_eq!(err.node_path(), Some("/root/subd/.scheme"));
    }

    #[test]
    fn test_corrupt_constructor() {
        let err = Error::corrupt(0x20, "truncated string");
        assert!(err.to_string().contains("0x20"));
        assert!(err.to_string().contains("truncated string"));
    }

    #[test]
    fn test_node_path_absent_for_structural_errors() {
        let err = Error::InvalidFormat("bad".into());
        assert_eq!(err.node_path(), None);
        let err = Error::corrupt(0, "bad");
        assert_eq!(err.node_path(), None);
    }

    #[test]
    fn test_error_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<Error>();
    }
}
