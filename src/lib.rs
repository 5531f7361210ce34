//! # sgar
//!
//! A pure-Rust library for reading, writing, and inspecting SGA scene-graph
//! archives.
//!
//! An SGA file stores a scene as a tree of named nodes. Each node carries
//! string metadata, typed properties (scalar, array, or nested compound), and
//! child nodes; property payloads live in a raw data segment addressed by
//! `(offset, length)` spans. The reader is defensive by construction: every
//! declared count is checked against [`ReadLimits`] before allocation, both
//! CRCs are verified, and malformed input yields an [`Error`] rather than a
//! panic, which makes the crate suitable as a fuzzing harness for the format.
//!
//! ## Quick Start
//!
//! ### Reading an Archive
//!
//! ```rust,no_run
//! use sgar::{Archive, Result};
//!
//! fn main() -> Result<()> {
//!     let archive = Archive::open_path("scene.sga")?;
//!     println!("{} nodes", archive.node_count());
//!
//!     for node in archive.root().children() {
//!         println!("{}: {}", node.full_name(), node.kind());
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ### Creating an Archive
//!
//! ```rust,no_run
//! use sgar::format::schema_title;
//! use sgar::{DataKind, NodeDef, PropertyDef, Result, write_archive_path};
//!
//! fn main() -> Result<()> {
//!     let root = NodeDef::new("scene").child(
//!         NodeDef::with_schema("cube", schema_title::MESH)
//!             .property(PropertyDef::array("P", DataKind::V3f, 8, vec![0u8; 96])),
//!     );
//!
//!     let result = write_archive_path(&root, "scene.sga")?;
//!     println!("wrote {} nodes, {} bytes", result.nodes_written, result.bytes_written);
//!     Ok(())
//! }
//! ```
//!
//! ### Inspecting Untrusted Bytes
//!
//! The [`inspect`] module turns any byte buffer into a structural report,
//! treating open failures and traversal findings as report text instead of
//! process failures:
//!
//! ```rust
//! use std::io;
//!
//! fn main() -> io::Result<()> {
//!     sgar::inspect_bytes(b"not an archive", io::stdout())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli` | No | Command-line interface tool |
//!
//! ## Error Handling
//!
//! All operations return [`Result<T>`], which is an alias for
//! `std::result::Result<T, Error>`. The [`Error`] enum covers all possible
//! failure modes:
//!
//! ```rust,no_run
//! use sgar::{Archive, Error};
//!
//! fn open_archive(path: &str) -> sgar::Result<()> {
//!     match Archive::open_path(path) {
//!         Ok(archive) => {
//!             println!("opened archive with {} nodes", archive.node_count());
//!             Ok(())
//!         }
//!         Err(Error::Io(e)) => {
//!             eprintln!("I/O error: {}", e);
//!             Err(Error::Io(e))
//!         }
//!         Err(Error::CorruptHeader { offset, reason }) => {
//!             eprintln!("corrupt at byte {}: {}", offset, reason);
//!             Err(Error::CorruptHeader { offset, reason })
//!         }
//!         Err(e) => Err(e),
//!     }
//! }
//! # fn main() {}
//! ```
//!
//! ## Safety and Resource Limits
//!
//! The library includes built-in protections against malicious archives:
//!
//! - **Resource limits**: Every count and size declared by the file is
//!   checked before any proportional allocation
//! - **CRC verification**: The start header and the node table are both
//!   validated before parsing
//! - **Span validation**: Property data spans are checked against the data
//!   segment bounds while the node table is parsed
//!
//! ```rust,no_run
//! use sgar::{Archive, ReadLimits};
//!
//! let limits = ReadLimits::new()
//!     .max_nodes(10_000)
//!     .max_data_bytes(16 << 20);
//! let archive = Archive::open_path_with_limits("scene.sga", limits)?;
//! # Ok::<(), sgar::Error>(())
//! ```
//!
//! ## Minimum Supported Rust Version (MSRV)
//!
//! This crate requires **Rust 1.85** or later.

#![cfg_attr(docsrs, feature(doc_cfg))]
#![warn(missing_docs)]
#![warn(rust_2018_idioms)]
#![deny(unsafe_op_in_unsafe_fn)]

pub mod error;
pub mod format;
pub mod inspect;
pub mod read;
pub mod write;

pub use error::{Error, Result};
pub use format::ReadLimits;
pub use format::parser::{DataKind, PropertyKind};

// Re-export reading API at crate root for convenience
pub use read::{Archive, ArchiveInfo, Metadata, Node, NodeKind, Property};

// Re-export schema views at crate root for convenience
pub use read::{
    CurvesSchema, FaceSetSchema, MaterialSchema, MaterialShaderType, MaterialTarget, MeshSchema,
    SubdSchema, XformSchema,
};

// Re-export writing API at crate root for convenience
pub use write::{NodeDef, PropertyDef, WriteResult, write_archive, write_archive_path};

// Re-export inspection API at crate root for convenience
pub use inspect::{init, inspect_bytes, inspect_bytes_in, print_info};
