//! Archive information types.

/// Summary of an opened archive.
///
/// Counts are taken while parsing the node table, so they are exact and
/// available without walking the tree.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ArchiveInfo {
    /// Total number of nodes, root included.
    pub node_count: usize,
    /// Total number of property records, compound children included.
    pub property_count: usize,
    /// Depth of the deepest node; 0 for a root-only archive.
    pub max_depth: usize,
    /// Byte length of the node table.
    pub tree_bytes: u64,
    /// Byte length of the data segment.
    pub data_bytes: u64,
    /// Container version as (major, minor).
    pub version: (u8, u8),
}
