//! Borrowed node views over the parsed arena.

use std::collections::BTreeMap;
use std::fmt;

use crate::format::parser::RawNode;

use super::Archive;
use super::properties::Property;
use super::schema::NodeKind;

/// A node in an opened archive.
///
/// `Node` is a cheap copyable view into the archive's arena; it borrows the
/// archive and never owns data. Traversal hands these out without transferring
/// ownership of anything.
#[derive(Clone, Copy)]
pub struct Node<'a> {
    archive: &'a Archive,
    index: usize,
}

impl<'a> Node<'a> {
    pub(crate) fn new(archive: &'a Archive, index: usize) -> Self {
        Self { archive, index }
    }

    fn raw(&self) -> &'a RawNode {
        &self.archive.tree.nodes[self.index]
    }

    /// The node's short name.
    pub fn name(&self) -> &'a str {
        &self.raw().name
    }

    /// The node's full path from the root, e.g. `/geo/cube`.
    ///
    /// The root's full name is `/`.
    pub fn full_name(&self) -> &'a str {
        &self.raw().full_name
    }

    /// Distance from the root; the root is 0.
    pub fn depth(&self) -> usize {
        self.raw().depth
    }

    /// The parent node, or `None` for the root.
    pub fn parent(&self) -> Option<Node<'a>> {
        self.raw().parent.map(|index| Node::new(self.archive, index))
    }

    /// The node's metadata.
    pub fn metadata(&self) -> Metadata<'a> {
        Metadata {
            map: &self.raw().metadata,
        }
    }

    /// Number of child nodes.
    pub fn child_count(&self) -> usize {
        self.raw().children.len()
    }

    /// The child at `index`, in archive order.
    pub fn child(&self, index: usize) -> Option<Node<'a>> {
        self.raw()
            .children
            .get(index)
            .map(|&child| Node::new(self.archive, child))
    }

    /// Iterates over children in archive order.
    pub fn children(self) -> impl Iterator<Item = Node<'a>> {
        self.raw()
            .children
            .iter()
            .map(move |&child| Node::new(self.archive, child))
    }

    /// Finds a direct child by name.
    pub fn find_child(&self, name: &str) -> Option<Node<'a>> {
        self.children().find(|child| child.name() == name)
    }

    /// Number of top-level properties.
    pub fn property_count(&self) -> usize {
        self.raw().properties.len()
    }

    /// The property at `index`, in archive order.
    pub fn property(&self, index: usize) -> Option<Property<'a>> {
        self.raw()
            .properties
            .get(index)
            .map(|raw| Property::new(self.archive, &self.raw().full_name, raw))
    }

    /// Iterates over top-level properties in archive order.
    pub fn properties(self) -> impl Iterator<Item = Property<'a>> {
        let raw = self.raw();
        raw.properties
            .iter()
            .map(move |p| Property::new(self.archive, &raw.full_name, p))
    }

    /// Finds a top-level property by name.
    pub fn find_property(&self, name: &str) -> Option<Property<'a>> {
        self.properties().find(|p| p.name() == name)
    }

    /// Classifies this node by its `schema` metadata.
    pub fn kind(&self) -> NodeKind {
        NodeKind::classify(self)
    }
}

impl fmt::Debug for Node<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Node")
            .field("full_name", &self.full_name())
            .field("children", &self.child_count())
            .field("properties", &self.property_count())
            .finish()
    }
}

/// A node's metadata: sorted string pairs.
#[derive(Clone, Copy)]
pub struct Metadata<'a> {
    map: &'a BTreeMap<String, String>,
}

impl<'a> Metadata<'a> {
    /// Looks up a value by key.
    pub fn get(&self, key: &str) -> Option<&'a str> {
        self.map.get(key).map(String::as_str)
    }

    /// Number of pairs.
    pub fn len(&self) -> usize {
        self.map.len()
    }

    /// True when there are no pairs.
    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    /// Iterates pairs in key order.
    pub fn iter(self) -> impl Iterator<Item = (&'a str, &'a str)> {
        self.map.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Renders the pairs as `key=value; key=value`, sorted by key.
    ///
    /// Empty metadata renders as the empty string.
    pub fn serialize(&self) -> String {
        let mut out = String::new();
        for (i, (key, value)) in self.map.iter().enumerate() {
            if i > 0 {
                out.push_str("; ");
            }
            out.push_str(key);
            out.push('=');
            out.push_str(value);
        }
        out
    }
}

impl fmt::Debug for Metadata<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.map.iter()).finish()
    }
}
