//! Archive writing API for SGA scene archives.
//!
//! This module provides builders for describing a scene tree and functions
//! for serializing it into the SGA container. Serialization is two-pass and
//! fully in memory: the node table is encoded first (assigning each data
//! property its offset in the data segment), then the start header, table,
//! and data segment are emitted in order. No `Seek` is required of the sink.
//!
//! The writer enforces structural limits (field widths, nesting depth) but
//! deliberately not schema semantics, so callers can construct archives with
//! malformed well-known properties and exercise reader-side diagnostics.
//!
//! # Example
//!
//! ```rust,ignore
//! use sgar::write::{NodeDef, PropertyDef, write_archive_path};
//! use sgar::{DataKind, format::schema_title};
//!
//! let root = NodeDef::new("scene").child(
//!     NodeDef::with_schema("cube", schema_title::MESH)
//!         .property(PropertyDef::array("P", DataKind::V3f, 1, vec![0u8; 96])),
//! );
//! let result = write_archive_path(&root, "scene.sga")?;
//! println!("wrote {} nodes", result.nodes_written);
//! ```

use std::collections::BTreeSet;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use crate::format::START_HEADER_SIZE;
use crate::format::header::StartHeader;
use crate::format::parser::{DataKind, PropertyKind};
use crate::format::reader::{write_u16_le, write_u32_le, write_u64_le};
use crate::{Error, Result};

/// Deepest node nesting the writer will serialize.
///
/// Matches the default read-side depth limit so that anything this writer
/// produces opens with default [`crate::ReadLimits`].
const MAX_WRITE_DEPTH: usize = 512;

/// A property to be written to an archive.
#[derive(Debug, Clone)]
pub struct PropertyDef {
    name: String,
    body: PropertyBody,
}

#[derive(Debug, Clone)]
enum PropertyBody {
    Data {
        kind: PropertyKind,
        data_kind: DataKind,
        sample_count: u32,
        data: Vec<u8>,
    },
    Compound {
        children: Vec<PropertyDef>,
    },
}

impl PropertyDef {
    /// A scalar property: one fixed-stride value per sample.
    pub fn scalar(
        name: impl Into<String>,
        data_kind: DataKind,
        sample_count: u32,
        data: impl Into<Vec<u8>>,
    ) -> Self {
        Self {
            name: name.into(),
            body: PropertyBody::Data {
                kind: PropertyKind::Scalar,
                data_kind,
                sample_count,
                data: data.into(),
            },
        }
    }

    /// An array property: samples share one raw blob.
    pub fn array(
        name: impl Into<String>,
        data_kind: DataKind,
        sample_count: u32,
        data: impl Into<Vec<u8>>,
    ) -> Self {
        Self {
            name: name.into(),
            body: PropertyBody::Data {
                kind: PropertyKind::Array,
                data_kind,
                sample_count,
                data: data.into(),
            },
        }
    }

    /// A compound property grouping child properties.
    pub fn compound(name: impl Into<String>, children: Vec<PropertyDef>) -> Self {
        Self {
            name: name.into(),
            body: PropertyBody::Compound { children },
        }
    }

    /// A single-sample string scalar.
    pub fn scalar_str(name: impl Into<String>, value: &str) -> Self {
        Self::scalar(name, DataKind::Str, 1, value.as_bytes().to_vec())
    }

    /// A single-sample `i32` scalar.
    pub fn scalar_i32(name: impl Into<String>, value: i32) -> Self {
        Self::scalar(name, DataKind::I32, 1, value.to_le_bytes().to_vec())
    }
}

/// A node to be written to an archive.
///
/// Children and properties are serialized in the order they were added.
#[derive(Debug, Clone)]
pub struct NodeDef {
    name: String,
    metadata: Vec<(String, String)>,
    properties: Vec<PropertyDef>,
    children: Vec<NodeDef>,
}

impl NodeDef {
    /// Creates a node with no metadata, properties, or children.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            metadata: Vec::new(),
            properties: Vec::new(),
            children: Vec::new(),
        }
    }

    /// Creates a node whose `schema` metadata names the given title.
    pub fn with_schema(name: impl Into<String>, title: &str) -> Self {
        Self::new(name).meta(crate::format::META_SCHEMA_KEY, title)
    }

    /// Adds a metadata pair.
    pub fn meta(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.push((key.into(), value.into()));
        self
    }

    /// Adds a property.
    pub fn property(mut self, property: PropertyDef) -> Self {
        self.properties.push(property);
        self
    }

    /// Adds a child node.
    pub fn child(mut self, child: NodeDef) -> Self {
        self.children.push(child);
        self
    }
}

/// Result of writing an archive.
#[must_use = "write results should be checked to ensure the archive was created"]
#[derive(Debug, Clone, Default)]
pub struct WriteResult {
    /// Number of node records written.
    pub nodes_written: usize,
    /// Total bytes emitted, header included.
    pub bytes_written: u64,
}

/// Writes `root` as a complete archive to `sink`.
///
/// # Errors
///
/// Returns [`Error::InvalidFormat`] when the tree cannot be represented in
/// the container's field widths (over-long strings, more than 65 535
/// metadata pairs/properties/children on one record, duplicate metadata
/// keys, nesting beyond the writer's depth cap), and [`Error::Io`] when the
/// sink fails.
pub fn write_archive(root: &NodeDef, mut sink: impl Write) -> Result<WriteResult> {
    let mut encoder = TreeEncoder::default();
    encoder.encode_node(root, 0)?;

    let header = StartHeader::for_sections(&encoder.tree, encoder.data.len() as u64);
    header.encode(&mut sink)?;
    sink.write_all(&encoder.tree)?;
    sink.write_all(&encoder.data)?;
    sink.flush()?;

    let bytes_written = START_HEADER_SIZE + encoder.tree.len() as u64 + encoder.data.len() as u64;
    log::debug!(
        "wrote archive: {} nodes, {} bytes ({} table, {} data)",
        encoder.nodes_written,
        bytes_written,
        encoder.tree.len(),
        encoder.data.len()
    );

    Ok(WriteResult {
        nodes_written: encoder.nodes_written,
        bytes_written,
    })
}

/// Writes `root` as a complete archive to a new file at `path`.
///
/// # Errors
///
/// As [`write_archive`], plus [`Error::Io`] if the file cannot be created.
pub fn write_archive_path(root: &NodeDef, path: impl AsRef<Path>) -> Result<WriteResult> {
    let file = File::create(path.as_ref())?;
    write_archive(root, BufWriter::new(file))
}

/// Serializes the node table and accumulates the data segment.
#[derive(Debug, Default)]
struct TreeEncoder {
    tree: Vec<u8>,
    data: Vec<u8>,
    nodes_written: usize,
}

impl TreeEncoder {
    fn encode_node(&mut self, node: &NodeDef, depth: usize) -> Result<()> {
        if depth > MAX_WRITE_DEPTH {
            return Err(Error::InvalidFormat(format!(
                "node tree deeper than {MAX_WRITE_DEPTH}"
            )));
        }
        self.nodes_written += 1;

        self.put_string(&node.name)?;

        self.put_count(node.metadata.len(), "metadata pairs")?;
        let mut seen = BTreeSet::new();
        for (key, value) in &node.metadata {
            if !seen.insert(key.as_str()) {
                return Err(Error::InvalidFormat(format!(
                    "duplicate metadata key '{key}'"
                )));
            }
            self.put_string(key)?;
            self.put_string(value)?;
        }

        self.put_count(node.properties.len(), "properties")?;
        for property in &node.properties {
            self.encode_property(property, 0)?;
        }

        self.put_count(node.children.len(), "children")?;
        for child in &node.children {
            self.encode_node(child, depth + 1)?;
        }
        Ok(())
    }

    fn encode_property(&mut self, property: &PropertyDef, depth: usize) -> Result<()> {
        if depth > MAX_WRITE_DEPTH {
            return Err(Error::InvalidFormat(format!(
                "compound properties deeper than {MAX_WRITE_DEPTH}"
            )));
        }
        self.put_string(&property.name)?;
        match &property.body {
            PropertyBody::Data {
                kind,
                data_kind,
                sample_count,
                data,
            } => {
                self.tree.push(kind.tag());
                self.tree.push(data_kind.tag());
                write_u32_le(&mut self.tree, *sample_count)?;
                let offset = self.data.len() as u64;
                write_u64_le(&mut self.tree, offset)?;
                write_u64_le(&mut self.tree, data.len() as u64)?;
                self.data.extend_from_slice(data);
            }
            PropertyBody::Compound { children } => {
                self.tree.push(PropertyKind::Compound.tag());
                self.put_count(children.len(), "compound children")?;
                for child in children {
                    self.encode_property(child, depth + 1)?;
                }
            }
        }
        Ok(())
    }

    fn put_count(&mut self, count: usize, what: &str) -> Result<()> {
        let count = u16::try_from(count)
            .map_err(|_| Error::InvalidFormat(format!("too many {what} to encode: {count}")))?;
        write_u16_le(&mut self.tree, count)?;
        Ok(())
    }

    fn put_string(&mut self, s: &str) -> Result<()> {
        let len = u16::try_from(s.len()).map_err(|_| {
            Error::InvalidFormat(format!("string too long to encode: {} bytes", s.len()))
        })?;
        write_u16_le(&mut self.tree, len)?;
        self.tree.extend_from_slice(s.as_bytes());
        Ok(())
    }
}
