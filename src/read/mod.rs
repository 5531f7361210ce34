//! Archive reading API for SGA scene archives.
//!
//! This module provides the public API for opening archives and walking
//! their node hierarchies: borrowed [`Node`] and [`Property`] views over a
//! preloaded arena, kind classification, and typed per-kind schema views.
//!
//! # Example
//!
//! ```rust,ignore
//! use sgar::read::{Archive, NodeKind};
//!
//! let archive = Archive::open_path("scene.sga")?;
//! println!("archive: {}", archive.name());
//!
//! for node in archive.root().children() {
//!     println!("{} ({})", node.full_name(), node.kind());
//! }
//! ```

mod info;
mod node;
mod properties;
mod schema;

pub use info::ArchiveInfo;
pub use node::{Metadata, Node};
pub use properties::Property;
pub use schema::{
    CurvesSchema, FaceSetSchema, MaterialSchema, MaterialShaderType, MaterialTarget, MeshSchema,
    NodeKind, SubdSchema, XformSchema,
};

use std::fs::File;
use std::io::{BufReader, Read, Seek, SeekFrom};
use std::path::Path;

use crate::format::ReadLimits;
use crate::format::header::StartHeader;
use crate::format::parser::{ParsedTree, TreeParser};
use crate::{Error, Result};

/// Display name for archives opened from anonymous readers.
pub(crate) const MEMORY_NAME: &str = "<memory>";

/// An opened SGA archive.
///
/// Opening parses the complete node table and loads the data segment into
/// memory (both bounded by [`ReadLimits`]), so traversal and property access
/// never touch the underlying file again.
#[derive(Debug)]
pub struct Archive {
    pub(crate) name: String,
    pub(crate) header: StartHeader,
    pub(crate) tree: ParsedTree,
    pub(crate) data: Vec<u8>,
}

impl Archive {
    /// Opens an archive from a file path.
    ///
    /// The path becomes the archive's display name.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be opened or the archive is
    /// invalid.
    pub fn open_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path)?;
        Self::open_internal(
            BufReader::new(file),
            path.display().to_string(),
            ReadLimits::default(),
        )
    }

    /// Opens an archive from a file path with custom resource limits.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be opened, the archive is
    /// invalid, or a resource limit is exceeded.
    pub fn open_path_with_limits(path: impl AsRef<Path>, limits: ReadLimits) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path)?;
        Self::open_internal(BufReader::new(file), path.display().to_string(), limits)
    }

    /// Opens an archive from a reader.
    ///
    /// The display name is `<memory>`.
    ///
    /// # Errors
    ///
    /// Returns an error if the archive is invalid or cannot be read.
    pub fn open(reader: impl Read + Seek) -> Result<Self> {
        Self::open_internal(reader, MEMORY_NAME.to_string(), ReadLimits::default())
    }

    /// Opens an archive from a reader with custom resource limits.
    ///
    /// # Errors
    ///
    /// Returns an error if the archive is invalid, cannot be read, or a
    /// resource limit is exceeded.
    pub fn open_with_limits(reader: impl Read + Seek, limits: ReadLimits) -> Result<Self> {
        Self::open_internal(reader, MEMORY_NAME.to_string(), limits)
    }

    /// Opens an archive from a reader under a caller-chosen display name.
    ///
    /// # Errors
    ///
    /// Returns an error if the archive is invalid or cannot be read.
    pub fn open_named(reader: impl Read + Seek, name: impl Into<String>) -> Result<Self> {
        Self::open_internal(reader, name.into(), ReadLimits::default())
    }

    fn open_internal<R: Read + Seek>(
        mut reader: R,
        name: String,
        limits: ReadLimits,
    ) -> Result<Self> {
        reader.seek(SeekFrom::Start(0))?;
        let header = StartHeader::parse(&mut reader)?;

        if header.tree_size > limits.max_tree_bytes {
            return Err(Error::LimitExceeded(format!(
                "node table size {} exceeds limit {}",
                header.tree_size, limits.max_tree_bytes
            )));
        }
        if header.data_size > limits.max_data_bytes {
            return Err(Error::LimitExceeded(format!(
                "data segment size {} exceeds limit {}",
                header.data_size, limits.max_data_bytes
            )));
        }

        let expected = header
            .expected_file_size()
            .ok_or_else(|| Error::InvalidFormat("section sizes overflow".to_string()))?;
        let actual = reader.seek(SeekFrom::End(0))?;
        if actual != expected {
            return Err(Error::InvalidFormat(format!(
                "file size {actual} does not match header-described size {expected}"
            )));
        }

        reader.seek(SeekFrom::Start(header.tree_position()))?;
        let mut tree_bytes = vec![0u8; header.tree_size as usize];
        reader.read_exact(&mut tree_bytes)?;

        let crc = crc32fast::hash(&tree_bytes);
        if crc != header.tree_crc {
            return Err(Error::corrupt(
                28,
                format!(
                    "node table CRC mismatch: expected {:#x}, got {crc:#x}",
                    header.tree_crc
                ),
            ));
        }

        let tree = TreeParser::new(limits, header.data_size).parse(&tree_bytes)?;

        let mut data = vec![0u8; header.data_size as usize];
        reader.read_exact(&mut data)?;

        log::debug!(
            "opened archive '{name}': {} nodes, {} data bytes",
            tree.nodes.len(),
            data.len()
        );

        Ok(Self {
            name,
            header,
            tree,
            data,
        })
    }

    /// The archive's display name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Container version as (major, minor).
    pub fn version(&self) -> (u8, u8) {
        (self.header.version_major, self.header.version_minor)
    }

    /// The root node. Every valid archive has exactly one.
    pub fn root(&self) -> Node<'_> {
        Node::new(self, 0)
    }

    /// Total number of nodes.
    pub fn node_count(&self) -> usize {
        self.tree.nodes.len()
    }

    /// Summary information about the archive.
    pub fn info(&self) -> ArchiveInfo {
        ArchiveInfo {
            node_count: self.tree.nodes.len(),
            property_count: self.tree.property_count,
            max_depth: self.tree.max_depth,
            tree_bytes: self.header.tree_size,
            data_bytes: self.header.data_size,
            version: self.version(),
        }
    }

    /// Slices the data segment; spans were bounds-checked at parse time.
    pub(crate) fn data_slice(&self, (offset, len): (u64, u64)) -> &[u8] {
        &self.data[offset as usize..(offset + len) as usize]
    }
}
