//! Node-table parser for SGA archives.
//!
//! The node table is a single pre-order serialization of the scene tree.
//! Parsing materializes it into a flat arena (`Vec<RawNode>` in pre-order,
//! children referenced by index) so that the rest of the crate can hand out
//! cheap borrowed views without re-walking bytes.
//!
//! Every count is checked against [`ReadLimits`] before the corresponding
//! allocation, every string must be UTF-8, and every property data span must
//! lie inside the data segment. Offsets in errors are relative to the start
//! of the node table.

use std::collections::BTreeMap;
use std::fmt;
use std::io::Cursor;

use crate::{Error, Result};

use super::ReadLimits;
use super::reader::{read_u8, read_u16_le, read_u32_le, read_u64_le};
use super::{data_kind, prop_kind};

/// The structural kind of a property record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PropertyKind {
    /// One fixed-stride value per sample.
    Scalar,
    /// Variable-extent data; samples share one raw blob.
    Array,
    /// A named group of child properties, no data of its own.
    Compound,
}

impl PropertyKind {
    /// Maps a record tag to a kind. Unknown tags are a format error.
    pub fn from_tag(tag: u8) -> Option<Self> {
        match tag {
            prop_kind::SCALAR => Some(PropertyKind::Scalar),
            prop_kind::ARRAY => Some(PropertyKind::Array),
            prop_kind::COMPOUND => Some(PropertyKind::Compound),
            _ => None,
        }
    }

    /// Returns the record tag for this kind.
    pub fn tag(self) -> u8 {
        match self {
            PropertyKind::Scalar => prop_kind::SCALAR,
            PropertyKind::Array => prop_kind::ARRAY,
            PropertyKind::Compound => prop_kind::COMPOUND,
        }
    }
}

impl fmt::Display for PropertyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PropertyKind::Scalar => write!(f, "scalar"),
            PropertyKind::Array => write!(f, "array"),
            PropertyKind::Compound => write!(f, "compound"),
        }
    }
}

/// The element type of a scalar or array property.
///
/// Unknown tags are preserved as [`DataKind::Other`] so that archives written
/// by newer tools still parse; typed accessors reject them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataKind {
    /// Unsigned 8-bit integers.
    U8,
    /// Signed 32-bit integers.
    I32,
    /// 32-bit floats.
    F32,
    /// 64-bit floats.
    F64,
    /// 2-component 32-bit float vectors.
    V2f,
    /// 3-component 32-bit float vectors.
    V3f,
    /// 4x4 64-bit float matrices.
    M44d,
    /// UTF-8 text.
    Str,
    /// A tag this build does not recognize.
    Other(u8),
}

impl DataKind {
    /// Maps a record tag to a data kind. Total: unknown tags become `Other`.
    pub fn from_tag(tag: u8) -> Self {
        match tag {
            data_kind::U8 => DataKind::U8,
            data_kind::I32 => DataKind::I32,
            data_kind::F32 => DataKind::F32,
            data_kind::F64 => DataKind::F64,
            data_kind::V2F => DataKind::V2f,
            data_kind::V3F => DataKind::V3f,
            data_kind::M44D => DataKind::M44d,
            data_kind::STR => DataKind::Str,
            other => DataKind::Other(other),
        }
    }

    /// Returns the record tag for this data kind.
    pub fn tag(self) -> u8 {
        match self {
            DataKind::U8 => data_kind::U8,
            DataKind::I32 => data_kind::I32,
            DataKind::F32 => data_kind::F32,
            DataKind::F64 => data_kind::F64,
            DataKind::V2f => data_kind::V2F,
            DataKind::V3f => data_kind::V3F,
            DataKind::M44d => data_kind::M44D,
            DataKind::Str => data_kind::STR,
            DataKind::Other(tag) => tag,
        }
    }

    /// Fixed byte width of one element, where one exists.
    ///
    /// `Str` is variable-width and `Other` is opaque; both return `None`.
    pub fn element_size(self) -> Option<usize> {
        match self {
            DataKind::U8 => Some(1),
            DataKind::I32 | DataKind::F32 => Some(4),
            DataKind::F64 | DataKind::V2f => Some(8),
            DataKind::V3f => Some(12),
            DataKind::M44d => Some(128),
            DataKind::Str | DataKind::Other(_) => None,
        }
    }
}

impl fmt::Display for DataKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DataKind::U8 => write!(f, "u8"),
            DataKind::I32 => write!(f, "i32"),
            DataKind::F32 => write!(f, "f32"),
            DataKind::F64 => write!(f, "f64"),
            DataKind::V2f => write!(f, "v2f"),
            DataKind::V3f => write!(f, "v3f"),
            DataKind::M44d => write!(f, "m44d"),
            DataKind::Str => write!(f, "str"),
            DataKind::Other(tag) => write!(f, "other({tag:#04x})"),
        }
    }
}

/// A parsed property record.
#[derive(Debug, Clone)]
pub(crate) struct RawProperty {
    pub(crate) name: String,
    pub(crate) kind: PropertyKind,
    /// `None` for compounds.
    pub(crate) data_kind: Option<DataKind>,
    pub(crate) sample_count: u32,
    /// `(offset, len)` into the data segment; `None` for compounds.
    pub(crate) span: Option<(u64, u64)>,
    /// Child records; empty unless compound.
    pub(crate) children: Vec<RawProperty>,
}

/// A parsed node record in the arena.
#[derive(Debug, Clone)]
pub(crate) struct RawNode {
    pub(crate) name: String,
    pub(crate) full_name: String,
    pub(crate) metadata: BTreeMap<String, String>,
    pub(crate) properties: Vec<RawProperty>,
    /// Arena indices of this node's children, in child-index order.
    pub(crate) children: Vec<usize>,
    pub(crate) parent: Option<usize>,
    pub(crate) depth: usize,
}

/// The fully parsed node table.
#[derive(Debug)]
pub(crate) struct ParsedTree {
    /// Nodes in pre-order; index 0 is the root.
    pub(crate) nodes: Vec<RawNode>,
    pub(crate) max_depth: usize,
    pub(crate) property_count: usize,
}

/// Node-table parser with resource limit enforcement.
#[derive(Debug)]
pub(crate) struct TreeParser {
    limits: ReadLimits,
    /// Size of the data segment; property spans must stay inside it.
    data_size: u64,
    nodes_parsed: usize,
    property_count: usize,
    max_depth: usize,
}

impl TreeParser {
    pub(crate) fn new(limits: ReadLimits, data_size: u64) -> Self {
        Self {
            limits,
            data_size,
            nodes_parsed: 0,
            property_count: 0,
            max_depth: 0,
        }
    }

    /// Parses the complete node table.
    ///
    /// The table must contain exactly one root record and nothing else;
    /// trailing bytes are corruption.
    pub(crate) fn parse(mut self, tree: &[u8]) -> Result<ParsedTree> {
        let mut cursor = Cursor::new(tree);
        let mut nodes = Vec::new();
        self.parse_node(&mut cursor, &mut nodes, None, "", 0)?;

        if cursor.position() != tree.len() as u64 {
            return Err(Error::corrupt(
                cursor.position(),
                format!(
                    "trailing bytes after node table: {} unread",
                    tree.len() as u64 - cursor.position()
                ),
            ));
        }

        log::debug!(
            "parsed node table: {} nodes, {} properties, depth {}",
            nodes.len(),
            self.property_count,
            self.max_depth
        );

        Ok(ParsedTree {
            nodes,
            max_depth: self.max_depth,
            property_count: self.property_count,
        })
    }

    fn parse_node(
        &mut self,
        cursor: &mut Cursor<&[u8]>,
        nodes: &mut Vec<RawNode>,
        parent: Option<usize>,
        parent_path: &str,
        depth: usize,
    ) -> Result<usize> {
        if depth > self.limits.max_node_depth {
            return Err(Error::LimitExceeded(format!(
                "node nesting exceeds depth limit {}",
                self.limits.max_node_depth
            )));
        }
        self.nodes_parsed += 1;
        self.limits
            .check_count("nodes", self.nodes_parsed, self.limits.max_nodes)?;
        self.max_depth = self.max_depth.max(depth);

        let name = self.read_string(cursor)?;
        let full_name = if parent.is_none() {
            "/".to_string()
        } else if parent_path == "/" {
            format!("/{name}")
        } else {
            format!("{parent_path}/{name}")
        };

        let metadata = self.parse_metadata(cursor)?;

        let prop_count = self.read_count(cursor)?;
        self.limits.check_count(
            "properties on one node",
            prop_count,
            self.limits.max_properties_per_node,
        )?;
        let mut properties = Vec::with_capacity(prop_count);
        for _ in 0..prop_count {
            properties.push(self.parse_property(cursor, 0)?);
        }

        let child_count = self.read_count(cursor)?;

        let index = nodes.len();
        nodes.push(RawNode {
            name,
            full_name,
            metadata,
            properties,
            children: Vec::with_capacity(child_count),
            parent,
            depth,
        });

        for _ in 0..child_count {
            let child_path = nodes[index].full_name.clone();
            let child = self.parse_node(cursor, nodes, Some(index), &child_path, depth + 1)?;
            nodes[index].children.push(child);
        }

        Ok(index)
    }

    fn parse_metadata(&self, cursor: &mut Cursor<&[u8]>) -> Result<BTreeMap<String, String>> {
        let pair_count = self.read_count(cursor)?;
        self.limits
            .check_count("metadata pairs", pair_count, self.limits.max_metadata_pairs)?;

        let mut metadata = BTreeMap::new();
        for _ in 0..pair_count {
            let pos = cursor.position();
            let key = self.read_string(cursor)?;
            let value = self.read_string(cursor)?;
            if metadata.insert(key.clone(), value).is_some() {
                return Err(Error::corrupt(
                    pos,
                    format!("duplicate metadata key '{key}'"),
                ));
            }
        }
        Ok(metadata)
    }

    fn parse_property(
        &mut self,
        cursor: &mut Cursor<&[u8]>,
        prop_depth: usize,
    ) -> Result<RawProperty> {
        if prop_depth >= self.limits.max_property_depth {
            return Err(Error::LimitExceeded(format!(
                "compound nesting exceeds depth limit {}",
                self.limits.max_property_depth
            )));
        }
        self.property_count += 1;

        let name = self.read_string(cursor)?;
        let tag_pos = cursor.position();
        let tag = self.read(cursor, read_u8)?;
        let kind = PropertyKind::from_tag(tag).ok_or_else(|| {
            Error::corrupt(tag_pos, format!("invalid property kind tag {tag:#04x}"))
        })?;

        match kind {
            PropertyKind::Scalar | PropertyKind::Array => {
                let dk = DataKind::from_tag(self.read(cursor, read_u8)?);
                if let DataKind::Other(tag) = dk {
                    log::warn!("property '{name}' carries unrecognized data kind tag {tag:#04x}");
                }
                let sample_count = self.read(cursor, read_u32_le)?;
                let span_pos = cursor.position();
                let offset = self.read(cursor, read_u64_le)?;
                let len = self.read(cursor, read_u64_le)?;
                let end = offset
                    .checked_add(len)
                    .ok_or_else(|| Error::corrupt(span_pos, "property data span overflows"))?;
                if end > self.data_size {
                    return Err(Error::corrupt(
                        span_pos,
                        format!(
                            "property data span {offset}+{len} exceeds data segment size {}",
                            self.data_size
                        ),
                    ));
                }
                Ok(RawProperty {
                    name,
                    kind,
                    data_kind: Some(dk),
                    sample_count,
                    span: Some((offset, len)),
                    children: Vec::new(),
                })
            }
            PropertyKind::Compound => {
                let child_count = self.read_count(cursor)?;
                self.limits.check_count(
                    "compound children",
                    child_count,
                    self.limits.max_properties_per_node,
                )?;
                let mut children = Vec::with_capacity(child_count);
                for _ in 0..child_count {
                    children.push(self.parse_property(cursor, prop_depth + 1)?);
                }
                Ok(RawProperty {
                    name,
                    kind,
                    data_kind: None,
                    sample_count: 0,
                    span: None,
                    children,
                })
            }
        }
    }

    /// Reads a `u16` count field.
    fn read_count(&self, cursor: &mut Cursor<&[u8]>) -> Result<usize> {
        Ok(self.read(cursor, read_u16_le)? as usize)
    }

    /// Reads a length-prefixed UTF-8 string.
    fn read_string(&self, cursor: &mut Cursor<&[u8]>) -> Result<String> {
        let pos = cursor.position();
        let len = self.read(cursor, read_u16_le)? as usize;
        self.limits
            .check_count("string bytes", len, self.limits.max_string_len)?;
        let bytes = self
            .read(cursor, |c| super::reader::read_bytes(c, len))
            .map_err(|_| Error::corrupt(pos, "truncated string"))?;
        String::from_utf8(bytes).map_err(|_| Error::corrupt(pos, "string is not valid UTF-8"))
    }

    /// Runs a primitive read, converting EOF into a corruption error.
    ///
    /// The cursor sits over an in-memory slice, so the only possible I/O
    /// failure is running off the end of the node table.
    fn read<'a, T>(
        &self,
        cursor: &mut Cursor<&'a [u8]>,
        f: impl FnOnce(&mut Cursor<&'a [u8]>) -> std::io::Result<T>,
    ) -> Result<T> {
        let pos = cursor.position();
        f(cursor).map_err(|_| Error::corrupt(pos, "unexpected end of node table"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::format::reader::{write_u16_le, write_u32_le, write_u64_le};

    fn put_string(buf: &mut Vec<u8>, s: &str) {
        write_u16_le(buf, s.len() as u16).unwrap();
        buf.extend_from_slice(s.as_bytes());
    }

    fn put_scalar(buf: &mut Vec<u8>, name: &str, dk: u8, samples: u32, offset: u64, len: u64) {
        put_string(buf, name);
        buf.push(prop_kind::SCALAR);
        buf.push(dk);
        write_u32_le(buf, samples).unwrap();
        write_u64_le(buf, offset).unwrap();
        write_u64_le(buf, len).unwrap();
    }

    /// Node record with no metadata and no properties.
    fn put_bare_node(buf: &mut Vec<u8>, name: &str, child_count: u16) {
        put_string(buf, name);
        write_u16_le(buf, 0).unwrap(); // metadata pairs
        write_u16_le(buf, 0).unwrap(); // properties
        write_u16_le(buf, child_count).unwrap();
    }

    fn parse(tree: &[u8], data_size: u64) -> Result<ParsedTree> {
        TreeParser::new(ReadLimits::default(), data_size).parse(tree)
    }

    #[test]
    fn test_single_bare_root() {
        let mut tree = Vec::new();
        put_bare_node(&mut tree, "", 0);
        let parsed = parse(&tree, 0).unwrap();
        assert_eq!(parsed.nodes.len(), 1);
        assert_eq!(parsed.nodes[0].name, "");
        assert_eq!(parsed.nodes[0].full_name, "/");
        assert_eq!(parsed.nodes[0].depth, 0);
        assert_eq!(parsed.max_depth, 0);
        assert_eq!(parsed.property_count, 0);
    }

    #[test]
    fn test_children_preorder_and_paths() {
        // root -> (a -> (b), c)
        let mut tree = Vec::new();
        put_bare_node(&mut tree, "root", 2);
        put_bare_node(&mut tree, "a", 1);
        put_bare_node(&mut tree, "b", 0);
        put_bare_node(&mut tree, "c", 0);

        let parsed = parse(&tree, 0).unwrap();
        assert_eq!(parsed.nodes.len(), 4);
        let names: Vec<_> = parsed.nodes.iter().map(|n| n.name.as_str()).collect();
        assert_eq!(names, ["root", "a", "b", "c"]);
        assert_eq!(parsed.nodes[0].full_name, "/");
        assert_eq!(parsed.nodes[1].full_name, "/a");
        assert_eq!(parsed.nodes[2].full_name, "/a/b");
        assert_eq!(parsed.nodes[3].full_name, "/c");
        assert_eq!(parsed.nodes[0].children, [1, 3]);
        assert_eq!(parsed.nodes[1].children, [2]);
        assert_eq!(parsed.nodes[1].parent, Some(0));
        assert_eq!(parsed.nodes[2].parent, Some(1));
        assert_eq!(parsed.max_depth, 2);
    }

    #[test]
    fn test_metadata_parsed_sorted() {
        let mut tree = Vec::new();
        put_string(&mut tree, "n");
        write_u16_le(&mut tree, 2).unwrap();
        put_string(&mut tree, "zed");
        put_string(&mut tree, "1");
        put_string(&mut tree, "alpha");
        put_string(&mut tree, "2");
        write_u16_le(&mut tree, 0).unwrap(); // properties
        write_u16_le(&mut tree, 0).unwrap(); // children

        let parsed = parse(&tree, 0).unwrap();
        let keys: Vec<_> = parsed.nodes[0].metadata.keys().cloned().collect();
        assert_eq!(keys, ["alpha", "zed"]);
    }

    #[test]
    fn test_duplicate_metadata_key_rejected() {
        let mut tree = Vec::new();
        put_string(&mut tree, "n");
        write_u16_le(&mut tree, 2).unwrap();
        put_string(&mut tree, "k");
        put_string(&mut tree, "1");
        put_string(&mut tree, "k");
        put_string(&mut tree, "2");
        write_u16_le(&mut tree, 0).unwrap();
        write_u16_le(&mut tree, 0).unwrap();

        let err = parse(&tree, 0).unwrap_err();
        assert!(matches!(err, Error::CorruptHeader { .. }));
        assert!(err.to_string().contains("duplicate metadata key"));
    }

    #[test]
    fn test_scalar_property() {
        let mut tree = Vec::new();
        put_string(&mut tree, "n");
        write_u16_le(&mut tree, 0).unwrap();
        write_u16_le(&mut tree, 1).unwrap();
        put_scalar(&mut tree, "P", data_kind::V3F, 4, 0, 48);
        write_u16_le(&mut tree, 0).unwrap();

        let parsed = parse(&tree, 48).unwrap();
        let prop = &parsed.nodes[0].properties[0];
        assert_eq!(prop.name, "P");
        assert_eq!(prop.kind, PropertyKind::Scalar);
        assert_eq!(prop.data_kind, Some(DataKind::V3f));
        assert_eq!(prop.sample_count, 4);
        assert_eq!(prop.span, Some((0, 48)));
        assert_eq!(parsed.property_count, 1);
    }

    #[test]
    fn test_compound_property_nesting() {
        let mut tree = Vec::new();
        put_string(&mut tree, "n");
        write_u16_le(&mut tree, 0).unwrap();
        write_u16_le(&mut tree, 1).unwrap();
        // compound ".arbGeomParams" with one scalar child
        put_string(&mut tree, ".arbGeomParams");
        tree.push(prop_kind::COMPOUND);
        write_u16_le(&mut tree, 1).unwrap();
        put_scalar(&mut tree, "Cs", data_kind::F32, 1, 0, 4);
        write_u16_le(&mut tree, 0).unwrap();

        let parsed = parse(&tree, 4).unwrap();
        let prop = &parsed.nodes[0].properties[0];
        assert_eq!(prop.kind, PropertyKind::Compound);
        assert_eq!(prop.data_kind, None);
        assert_eq!(prop.children.len(), 1);
        assert_eq!(prop.children[0].name, "Cs");
        assert_eq!(parsed.property_count, 2);
    }

    #[test]
    fn test_invalid_property_tag() {
        let mut tree = Vec::new();
        put_string(&mut tree, "n");
        write_u16_le(&mut tree, 0).unwrap();
        write_u16_le(&mut tree, 1).unwrap();
        put_string(&mut tree, "bad");
        tree.push(0x77); // not a property kind
        let err = parse(&tree, 0).unwrap_err();
        assert!(matches!(err, Error::CorruptHeader { .. }));
        assert!(err.to_string().contains("0x77"));
    }

    #[test]
    fn test_unknown_data_kind_tolerated() {
        let mut tree = Vec::new();
        put_string(&mut tree, "n");
        write_u16_le(&mut tree, 0).unwrap();
        write_u16_le(&mut tree, 1).unwrap();
        put_scalar(&mut tree, "x", 0x42, 1, 0, 0);
        write_u16_le(&mut tree, 0).unwrap();

        let parsed = parse(&tree, 0).unwrap();
        assert_eq!(
            parsed.nodes[0].properties[0].data_kind,
            Some(DataKind::Other(0x42))
        );
    }

    #[test]
    fn test_span_out_of_range() {
        let mut tree = Vec::new();
        put_string(&mut tree, "n");
        write_u16_le(&mut tree, 0).unwrap();
        write_u16_le(&mut tree, 1).unwrap();
        put_scalar(&mut tree, "P", data_kind::V3F, 1, 8, 8);
        write_u16_le(&mut tree, 0).unwrap();

        // data segment only 15 bytes, span needs 16
        let err = parse(&tree, 15).unwrap_err();
        assert!(matches!(err, Error::CorruptHeader { .. }));
        assert!(err.to_string().contains("exceeds data segment"));
    }

    #[test]
    fn test_span_overflow() {
        let mut tree = Vec::new();
        put_string(&mut tree, "n");
        write_u16_le(&mut tree, 0).unwrap();
        write_u16_le(&mut tree, 1).unwrap();
        put_scalar(&mut tree, "P", data_kind::V3F, 1, u64::MAX, 2);
        write_u16_le(&mut tree, 0).unwrap();

        let err = parse(&tree, 100).unwrap_err();
        assert!(err.to_string().contains("overflow"));
    }

    #[test]
    fn test_truncated_table() {
        let mut tree = Vec::new();
        put_bare_node(&mut tree, "root", 1);
        // missing the declared child
        let err = parse(&tree, 0).unwrap_err();
        assert!(matches!(err, Error::CorruptHeader { .. }));
        assert!(err.to_string().contains("unexpected end"));
    }

    #[test]
    fn test_trailing_bytes_rejected() {
        let mut tree = Vec::new();
        put_bare_node(&mut tree, "root", 0);
        tree.push(0xAA);
        let err = parse(&tree, 0).unwrap_err();
        assert!(err.to_string().contains("trailing bytes"));
    }

    #[test]
    fn test_node_depth_limit() {
        // a chain of 5 nodes against a depth limit of 3
        let mut tree = Vec::new();
        for _ in 0..4 {
            put_bare_node(&mut tree, "x", 1);
        }
        put_bare_node(&mut tree, "x", 0);

        let err = TreeParser::new(ReadLimits::default().max_node_depth(3), 0)
            .parse(&tree)
            .unwrap_err();
        assert!(matches!(err, Error::LimitExceeded(_)));
    }

    #[test]
    fn test_node_count_limit() {
        let mut tree = Vec::new();
        put_bare_node(&mut tree, "root", 3);
        for _ in 0..3 {
            put_bare_node(&mut tree, "c", 0);
        }
        let err = TreeParser::new(ReadLimits::default().max_nodes(2), 0)
            .parse(&tree)
            .unwrap_err();
        assert!(matches!(err, Error::LimitExceeded(_)));
    }

    #[test]
    fn test_string_length_limit() {
        let mut tree = Vec::new();
        put_string(&mut tree, "a-node-name-longer-than-the-limit");
        let err = TreeParser::new(ReadLimits::default().max_string_len(8), 0)
            .parse(&tree)
            .unwrap_err();
        assert!(matches!(err, Error::LimitExceeded(_)));
    }

    #[test]
    fn test_compound_depth_limit() {
        let mut tree = Vec::new();
        put_string(&mut tree, "n");
        write_u16_le(&mut tree, 0).unwrap();
        write_u16_le(&mut tree, 1).unwrap();
        // three nested compounds against a property depth limit of 2
        for _ in 0..3 {
            put_string(&mut tree, "c");
            tree.push(prop_kind::COMPOUND);
            write_u16_le(&mut tree, 1).unwrap();
        }
        put_scalar(&mut tree, "leaf", data_kind::U8, 1, 0, 0);
        write_u16_le(&mut tree, 0).unwrap();

        let err = TreeParser::new(ReadLimits::default().max_property_depth(2), 0)
            .parse(&tree)
            .unwrap_err();
        assert!(matches!(err, Error::LimitExceeded(_)));
    }

    #[test]
    fn test_invalid_utf8_string() {
        let mut tree = Vec::new();
        write_u16_le(&mut tree, 2).unwrap();
        tree.extend_from_slice(&[0xFF, 0xFE]);
        let err = parse(&tree, 0).unwrap_err();
        assert!(err.to_string().contains("UTF-8"));
    }
}
