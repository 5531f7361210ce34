//! SGA archive format constants, definitions, and low-level parsing utilities.
//!
//! This module contains the magic bytes, record tags, well-known names, and
//! parsing limits defined by the SGA scene-graph archive format.
//!
//! An SGA file is a flat, single-pass container:
//!
//! ```text
//! [32-byte start header][node table (pre-order records)][data segment]
//! ```
//!
//! There is no chunk index and no compression; property data is addressed by
//! `(offset, length)` spans into the raw data segment.

pub mod header;
pub mod parser;
pub mod reader;

use crate::{Error, Result};

/// The SGA file signature (magic bytes).
///
/// Every valid SGA archive starts with these 6 bytes:
/// `0x89 'S' 'G' 'A' '\r' '\n'`. The leading high byte and the CRLF pair
/// catch transfers that strip the eighth bit or translate line endings.
pub const SIGNATURE: &[u8; 6] = &[0x89, b'S', b'G', b'A', 0x0D, 0x0A];

/// Size of the start header in bytes.
///
/// The start header contains:
/// - 6 bytes: signature
/// - 2 bytes: version (major, minor)
/// - 4 bytes: start header CRC (over the 20 bytes that follow)
/// - 8 bytes: node table size
/// - 8 bytes: data segment size
/// - 4 bytes: node table CRC
pub const START_HEADER_SIZE: u64 = 32;

/// Archive version - major.
pub const VERSION_MAJOR: u8 = 1;

/// Archive version - minor.
pub const VERSION_MINOR: u8 = 0;

/// Property record kind tags.
pub mod prop_kind {
    /// Scalar property: one fixed-stride value per sample.
    pub const SCALAR: u8 = 0x00;
    /// Array property: per-sample element counts vary; data is one raw blob.
    pub const ARRAY: u8 = 0x01;
    /// Compound property: no data of its own, only child properties.
    pub const COMPOUND: u8 = 0x02;
}

/// Data kind tags for scalar and array properties.
pub mod data_kind {
    /// Unsigned 8-bit integers.
    pub const U8: u8 = 0x00;
    /// Signed 32-bit little-endian integers.
    pub const I32: u8 = 0x01;
    /// 32-bit little-endian floats.
    pub const F32: u8 = 0x02;
    /// 64-bit little-endian floats.
    pub const F64: u8 = 0x03;
    /// 2-component 32-bit float vectors.
    pub const V2F: u8 = 0x04;
    /// 3-component 32-bit float vectors.
    pub const V3F: u8 = 0x05;
    /// 4x4 64-bit float matrices.
    pub const M44D: u8 = 0x06;
    /// UTF-8 text.
    pub const STR: u8 = 0x07;
}

/// Schema titles recognized by the node-kind classifier.
///
/// A node's kind is carried in its metadata under [`META_SCHEMA_KEY`]; any
/// other title (or no title at all) is a valid but unrecognized kind.
pub mod schema_title {
    /// Polygon mesh.
    pub const MESH: &str = "mesh.v1";
    /// Subdivision surface.
    pub const SUBD: &str = "subd.v1";
    /// Face set partition of a parent surface.
    pub const FACESET: &str = "faceset.v1";
    /// Curve group.
    pub const CURVES: &str = "curves.v1";
    /// Transform.
    pub const XFORM: &str = "xform.v1";
    /// Material shading network.
    pub const MATERIAL: &str = "material.v1";
}

/// Metadata key carrying a node's schema title.
pub const META_SCHEMA_KEY: &str = "schema";

/// Well-known property names with derived reporting behavior.
pub mod well_known {
    /// Positions.
    pub const POSITIONS: &str = "P";
    /// Normals.
    pub const NORMALS: &str = "N";
    /// Texture coordinates, primary alias.
    pub const UV: &str = "uv";
    /// Texture coordinates, secondary alias.
    pub const ST: &str = "st";
    /// Generic parameter group (compound).
    pub const ARB_GEOM_PARAMS: &str = ".arbGeomParams";
    /// Subdivision scheme name (str scalar).
    pub const SUBD_SCHEME: &str = ".scheme";
    /// Face-varying boundary interpolation flag (i32 scalar).
    pub const FV_INTERPOLATE_BOUNDARY: &str = ".faceVaryingInterpolateBoundary";
    /// Face-varying corner propagation flag (i32 scalar).
    pub const FV_PROPAGATE_CORNERS: &str = ".faceVaryingPropagateCorners";
    /// Boundary interpolation flag (i32 scalar).
    pub const INTERPOLATE_BOUNDARY: &str = ".interpolateBoundary";
    /// Face index list of a face set (i32 array).
    pub const FACES: &str = ".faces";
    /// Transform sample values (m44d scalar).
    pub const XFORM_VALS: &str = ".vals";
    /// Transform op codes, one per byte (u8 array).
    pub const XFORM_OPS: &str = ".ops";
    /// Material shading tree root (compound).
    pub const SHADING: &str = ".shading";
}

/// Resource limits for archive parsing.
///
/// Adversarial inputs can declare absurd counts; every count is checked
/// against these limits before any proportional allocation happens.
/// Exceeding a limit yields [`Error::LimitExceeded`].
#[derive(Debug, Clone)]
pub struct ReadLimits {
    /// Maximum number of nodes in the archive.
    pub max_nodes: usize,
    /// Maximum node nesting depth.
    pub max_node_depth: usize,
    /// Maximum properties declared on a single node.
    pub max_properties_per_node: usize,
    /// Maximum compound-property nesting depth.
    pub max_property_depth: usize,
    /// Maximum metadata pairs on a single node.
    pub max_metadata_pairs: usize,
    /// Maximum byte length of any string (names, metadata keys and values).
    pub max_string_len: usize,
    /// Maximum byte size of the node table.
    pub max_tree_bytes: u64,
    /// Maximum byte size of the data segment.
    pub max_data_bytes: u64,
}

impl Default for ReadLimits {
    /// Creates read limits with the following default values:
    ///
    /// | Limit | Default | Description |
    /// |-------|---------|-------------|
    /// | `max_nodes` | 65 536 | Nodes in the archive |
    /// | `max_node_depth` | 512 | Node nesting depth |
    /// | `max_properties_per_node` | 4 096 | Properties per node |
    /// | `max_property_depth` | 16 | Compound nesting depth |
    /// | `max_metadata_pairs` | 256 | Metadata pairs per node |
    /// | `max_string_len` | 4 096 | Bytes per string |
    /// | `max_tree_bytes` | 64 MiB | Node table size |
    /// | `max_data_bytes` | 256 MiB | Data segment size |
    ///
    /// These defaults comfortably cover legitimate scene files while keeping
    /// a hostile input from forcing pathological allocations or recursion.
    /// Use [`ReadLimits::unlimited()`] to disable all limits.
    fn default() -> Self {
        Self {
            max_nodes: 65_536,
            max_node_depth: 512,
            max_properties_per_node: 4_096,
            max_property_depth: 16,
            max_metadata_pairs: 256,
            max_string_len: 4_096,
            max_tree_bytes: 64 << 20,
            max_data_bytes: 256 << 20,
        }
    }
}

impl ReadLimits {
    /// Creates new read limits with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates read limits with no restrictions.
    pub fn unlimited() -> Self {
        Self {
            max_nodes: usize::MAX,
            max_node_depth: usize::MAX,
            max_properties_per_node: usize::MAX,
            max_property_depth: usize::MAX,
            max_metadata_pairs: usize::MAX,
            max_string_len: usize::MAX,
            max_tree_bytes: u64::MAX,
            max_data_bytes: u64::MAX,
        }
    }

    /// Sets the maximum number of nodes.
    pub fn max_nodes(mut self, max: usize) -> Self {
        self.max_nodes = max;
        self
    }

    /// Sets the maximum node nesting depth.
    pub fn max_node_depth(mut self, max: usize) -> Self {
        self.max_node_depth = max;
        self
    }

    /// Sets the maximum properties per node.
    pub fn max_properties_per_node(mut self, max: usize) -> Self {
        self.max_properties_per_node = max;
        self
    }

    /// Sets the maximum compound-property nesting depth.
    pub fn max_property_depth(mut self, max: usize) -> Self {
        self.max_property_depth = max;
        self
    }

    /// Sets the maximum metadata pairs per node.
    pub fn max_metadata_pairs(mut self, max: usize) -> Self {
        self.max_metadata_pairs = max;
        self
    }

    /// Sets the maximum string length in bytes.
    pub fn max_string_len(mut self, max: usize) -> Self {
        self.max_string_len = max;
        self
    }

    /// Sets the maximum node table size in bytes.
    pub fn max_tree_bytes(mut self, max: u64) -> Self {
        self.max_tree_bytes = max;
        self
    }

    /// Sets the maximum data segment size in bytes.
    pub fn max_data_bytes(mut self, max: u64) -> Self {
        self.max_data_bytes = max;
        self
    }

    /// Checks a declared count against a limit.
    pub(crate) fn check_count(&self, what: &str, declared: usize, max: usize) -> Result<()> {
        if declared > max {
            return Err(Error::LimitExceeded(format!(
                "too many {what}: {declared} (limit {max})"
            )));
        }
        Ok(())
    }
}
