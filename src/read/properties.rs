//! Borrowed property views and typed accessors.

use std::fmt;

use crate::format::parser::{DataKind, PropertyKind, RawProperty};
use crate::{Error, Result};

use super::Archive;

/// A property of a node: a named, typed data stream or a compound group.
///
/// Like [`super::Node`], this is a copyable borrowed view. Data access
/// slices the archive's preloaded data segment; no file I/O happens here.
#[derive(Clone, Copy)]
pub struct Property<'a> {
    archive: &'a Archive,
    node_path: &'a str,
    raw: &'a RawProperty,
}

impl<'a> Property<'a> {
    pub(crate) fn new(archive: &'a Archive, node_path: &'a str, raw: &'a RawProperty) -> Self {
        Self {
            archive,
            node_path,
            raw,
        }
    }

    /// The property's name.
    pub fn name(&self) -> &'a str {
        &self.raw.name
    }

    /// Scalar, array, or compound.
    pub fn kind(&self) -> PropertyKind {
        self.raw.kind
    }

    /// The element type; `None` for compounds.
    pub fn data_kind(&self) -> Option<DataKind> {
        self.raw.data_kind
    }

    /// Stored sample count; 0 for compounds.
    pub fn sample_count(&self) -> u32 {
        self.raw.sample_count
    }

    /// True for compound properties.
    pub fn is_compound(&self) -> bool {
        self.raw.kind == PropertyKind::Compound
    }

    /// Byte length of the property's slice of the data segment.
    pub fn byte_len(&self) -> u64 {
        self.raw.span.map_or(0, |(_, len)| len)
    }

    /// The property's raw bytes; empty for compounds.
    pub fn data(&self) -> &'a [u8] {
        match self.raw.span {
            Some(span) => self.archive.data_slice(span),
            None => &[],
        }
    }

    /// Number of child properties; 0 unless compound.
    pub fn child_count(&self) -> usize {
        self.raw.children.len()
    }

    /// The child property at `index`.
    pub fn child(&self, index: usize) -> Option<Property<'a>> {
        self.raw
            .children
            .get(index)
            .map(|raw| Property::new(self.archive, self.node_path, raw))
    }

    /// Iterates over child properties.
    pub fn children(self) -> impl Iterator<Item = Property<'a>> {
        self.raw
            .children
            .iter()
            .map(move |raw| Property::new(self.archive, self.node_path, raw))
    }

    /// Finds a child property by name.
    pub fn find(&self, name: &str) -> Option<Property<'a>> {
        self.children().find(|child| child.name() == name)
    }

    /// Returns the bytes of one sample of a scalar property.
    ///
    /// The stride is `byte_len / sample_count`, which must divide evenly.
    ///
    /// # Errors
    ///
    /// [`Error::TypeMismatch`] on non-scalar properties or a non-uniform
    /// stride; [`Error::Schema`] when `index` is out of range.
    pub fn sample(&self, index: usize) -> Result<&'a [u8]> {
        if self.raw.kind != PropertyKind::Scalar {
            return Err(self.mismatch("scalar"));
        }
        let count = self.raw.sample_count as usize;
        if index >= count {
            return Err(Error::schema(
                self.path(),
                format!("sample index {index} out of range ({count} samples)"),
            ));
        }
        let data = self.data();
        if data.len() % count != 0 {
            return Err(Error::TypeMismatch {
                path: self.path(),
                expected: "uniform sample stride",
                found: format!("{} bytes over {count} samples", data.len()),
            });
        }
        let stride = data.len() / count;
        Ok(&data[index * stride..(index + 1) * stride])
    }

    /// Decodes a string scalar.
    ///
    /// # Errors
    ///
    /// [`Error::TypeMismatch`] unless the property is a `str` scalar;
    /// [`Error::Schema`] when the data is not valid UTF-8.
    pub fn as_str(&self) -> Result<&'a str> {
        if self.raw.kind != PropertyKind::Scalar || self.raw.data_kind != Some(DataKind::Str) {
            return Err(self.mismatch("str scalar"));
        }
        std::str::from_utf8(self.data())
            .map_err(|_| Error::schema(self.path(), "string data is not valid UTF-8"))
    }

    /// Decodes the first sample of an `i32` scalar.
    ///
    /// # Errors
    ///
    /// [`Error::TypeMismatch`] unless the property is an `i32` scalar;
    /// [`Error::Schema`] when fewer than four data bytes are present.
    pub fn as_i32(&self) -> Result<i32> {
        if self.raw.kind != PropertyKind::Scalar || self.raw.data_kind != Some(DataKind::I32) {
            return Err(self.mismatch("i32 scalar"));
        }
        let data = self.data();
        let bytes = data
            .get(..4)
            .ok_or_else(|| Error::schema(self.path(), "i32 data truncated"))?;
        Ok(i32::from_le_bytes(bytes.try_into().unwrap()))
    }

    /// Path used in this property's error reports.
    fn path(&self) -> String {
        if self.node_path == "/" {
            format!("/{}", self.raw.name)
        } else {
            format!("{}/{}", self.node_path, self.raw.name)
        }
    }

    /// How this property reads for mismatch messages, e.g. `v3f array`.
    fn describe(&self) -> String {
        match self.raw.data_kind {
            Some(dk) => format!("{dk} {}", self.raw.kind),
            None => "compound".to_string(),
        }
    }

    pub(crate) fn mismatch(&self, expected: &'static str) -> Error {
        Error::TypeMismatch {
            path: self.path(),
            expected,
            found: self.describe(),
        }
    }
}

impl fmt::Debug for Property<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Property")
            .field("name", &self.name())
            .field("kind", &self.kind())
            .field("data_kind", &self.data_kind())
            .field("sample_count", &self.sample_count())
            .finish()
    }
}
