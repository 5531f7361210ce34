//! Node kind classification and per-kind schema views.
//!
//! A node's kind is carried in its metadata under the `schema` key.
//! [`NodeKind::classify`] tests the recognized titles in a fixed priority
//! order (mesh, subd, face set, curves, xform, material); the first match
//! wins and anything else is [`NodeKind::Other`]. Consumers match on the
//! enum exhaustively rather than re-probing predicates.
//!
//! Schema constructors validate the layout of well-known properties (for
//! example, a mesh's `P` must be a v3f array). These are the errors a
//! traversal surfaces on structurally valid archives with nonsensical
//! contents.

use std::fmt;

use crate::format::parser::{DataKind, PropertyKind};
use crate::format::{META_SCHEMA_KEY, schema_title, well_known};
use crate::{Error, Result};

use super::node::Node;
use super::properties::Property;

/// The recognized node kinds, in classification priority order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    /// Polygon mesh (`mesh.v1`).
    Mesh,
    /// Subdivision surface (`subd.v1`).
    Subd,
    /// Face set (`faceset.v1`).
    FaceSet,
    /// Curves (`curves.v1`).
    Curves,
    /// Transform (`xform.v1`).
    Xform,
    /// Material (`material.v1`).
    Material,
    /// No recognized schema title.
    Other,
}

impl NodeKind {
    /// Classifies a node by its `schema` metadata, first match wins.
    pub fn classify(node: &Node<'_>) -> NodeKind {
        if MeshSchema::matches(node) {
            return NodeKind::Mesh;
        }
        if SubdSchema::matches(node) {
            return NodeKind::Subd;
        }
        if FaceSetSchema::matches(node) {
            return NodeKind::FaceSet;
        }
        if CurvesSchema::matches(node) {
            return NodeKind::Curves;
        }
        if XformSchema::matches(node) {
            return NodeKind::Xform;
        }
        if MaterialSchema::matches(node) {
            return NodeKind::Material;
        }
        if let Some(title) = node.metadata().get(META_SCHEMA_KEY) {
            log::warn!(
                "unrecognized schema title '{title}' on node {}",
                node.full_name()
            );
        }
        NodeKind::Other
    }

    /// Short lowercase name, e.g. `mesh`.
    pub fn as_str(&self) -> &'static str {
        match self {
            NodeKind::Mesh => "mesh",
            NodeKind::Subd => "subd",
            NodeKind::FaceSet => "face set",
            NodeKind::Curves => "curves",
            NodeKind::Xform => "xform",
            NodeKind::Material => "material",
            NodeKind::Other => "other",
        }
    }
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

fn schema_is(node: &Node<'_>, title: &str) -> bool {
    node.metadata().get(META_SCHEMA_KEY) == Some(title)
}

fn require_title(node: &Node<'_>, title: &str, what: &str) -> Result<()> {
    if schema_is(node, title) {
        Ok(())
    } else {
        Err(Error::schema(
            node.full_name(),
            format!("node is not a {what}"),
        ))
    }
}

/// Validates that `name`, when present, is a v3f array.
fn optional_v3f_array<'a>(node: &Node<'a>, name: &str) -> Result<Option<Property<'a>>> {
    match node.find_property(name) {
        None => Ok(None),
        Some(p) => {
            if p.kind() == PropertyKind::Array && p.data_kind() == Some(DataKind::V3f) {
                Ok(Some(p))
            } else {
                Err(p.mismatch("v3f array"))
            }
        }
    }
}

/// Validates that `name`, when present, is a compound.
fn optional_compound<'a>(node: &Node<'a>, name: &str) -> Result<Option<Property<'a>>> {
    match node.find_property(name) {
        None => Ok(None),
        Some(p) if p.is_compound() => Ok(Some(p)),
        Some(p) => Err(p.mismatch("compound")),
    }
}

/// Typed view of a polygon mesh node.
#[derive(Debug, Clone, Copy)]
pub struct MeshSchema<'a> {
    node: Node<'a>,
}

impl<'a> MeshSchema<'a> {
    /// True when the node's schema title names a mesh.
    pub fn matches(node: &Node<'_>) -> bool {
        schema_is(node, schema_title::MESH)
    }

    /// Builds the view, validating well-known property layout.
    ///
    /// # Errors
    ///
    /// [`Error::Schema`] when the node is not a mesh; [`Error::TypeMismatch`]
    /// when `P` is not a v3f array or `.arbGeomParams` is not a compound.
    pub fn new(node: Node<'a>) -> Result<Self> {
        require_title(&node, schema_title::MESH, "mesh")?;
        optional_v3f_array(&node, well_known::POSITIONS)?;
        optional_compound(&node, well_known::ARB_GEOM_PARAMS)?;
        Ok(Self { node })
    }

    /// The underlying node.
    pub fn node(&self) -> Node<'a> {
        self.node
    }

    /// Number of top-level properties.
    pub fn property_count(&self) -> usize {
        self.node.property_count()
    }

    /// Top-level properties in archive order.
    pub fn properties(&self) -> impl Iterator<Item = Property<'a>> {
        self.node.properties()
    }

    /// The `P` positions property, if present.
    pub fn positions(&self) -> Option<Property<'a>> {
        self.node.find_property(well_known::POSITIONS)
    }

    /// The `.arbGeomParams` compound, if present.
    pub fn geom_params(&self) -> Option<Property<'a>> {
        self.node.find_property(well_known::ARB_GEOM_PARAMS)
    }
}

/// Typed view of a subdivision surface node.
#[derive(Debug, Clone, Copy)]
pub struct SubdSchema<'a> {
    node: Node<'a>,
}

impl<'a> SubdSchema<'a> {
    /// True when the node's schema title names a subdivision surface.
    pub fn matches(node: &Node<'_>) -> bool {
        schema_is(node, schema_title::SUBD)
    }

    /// Builds the view, validating well-known property layout.
    ///
    /// The scheme and boundary getters decode lazily, so their type errors
    /// surface at access time rather than here.
    pub fn new(node: Node<'a>) -> Result<Self> {
        require_title(&node, schema_title::SUBD, "subdivision surface")?;
        optional_v3f_array(&node, well_known::POSITIONS)?;
        optional_compound(&node, well_known::ARB_GEOM_PARAMS)?;
        Ok(Self { node })
    }

    /// The underlying node.
    pub fn node(&self) -> Node<'a> {
        self.node
    }

    /// Number of top-level properties.
    pub fn property_count(&self) -> usize {
        self.node.property_count()
    }

    /// Top-level properties in archive order.
    pub fn properties(&self) -> impl Iterator<Item = Property<'a>> {
        self.node.properties()
    }

    /// The subdivision scheme; `catmull-clark` when `.scheme` is absent.
    pub fn scheme(&self) -> Result<&'a str> {
        match self.node.find_property(well_known::SUBD_SCHEME) {
            None => Ok("catmull-clark"),
            Some(p) => p.as_str(),
        }
    }

    /// Face-varying boundary interpolation setting; 0 when absent.
    pub fn face_varying_interpolate_boundary(&self) -> Result<i32> {
        self.boundary_setting(well_known::FV_INTERPOLATE_BOUNDARY)
    }

    /// Face-varying corner propagation setting; 0 when absent.
    pub fn face_varying_propagate_corners(&self) -> Result<i32> {
        self.boundary_setting(well_known::FV_PROPAGATE_CORNERS)
    }

    /// Boundary interpolation setting; 0 when absent.
    pub fn interpolate_boundary(&self) -> Result<i32> {
        self.boundary_setting(well_known::INTERPOLATE_BOUNDARY)
    }

    fn boundary_setting(&self, name: &str) -> Result<i32> {
        match self.node.find_property(name) {
            None => Ok(0),
            Some(p) => p.as_i32(),
        }
    }
}

/// Typed view of a face set node.
#[derive(Debug, Clone, Copy)]
pub struct FaceSetSchema<'a> {
    node: Node<'a>,
}

impl<'a> FaceSetSchema<'a> {
    /// True when the node's schema title names a face set.
    pub fn matches(node: &Node<'_>) -> bool {
        schema_is(node, schema_title::FACESET)
    }

    /// Builds the view, validating well-known property layout.
    ///
    /// # Errors
    ///
    /// [`Error::Schema`] when the node is not a face set;
    /// [`Error::TypeMismatch`] when `.faces` is not an i32 array.
    pub fn new(node: Node<'a>) -> Result<Self> {
        require_title(&node, schema_title::FACESET, "face set")?;
        if let Some(p) = node.find_property(well_known::FACES) {
            if p.kind() != PropertyKind::Array || p.data_kind() != Some(DataKind::I32) {
                return Err(p.mismatch("i32 array"));
            }
        }
        Ok(Self { node })
    }

    /// The underlying node.
    pub fn node(&self) -> Node<'a> {
        self.node
    }

    /// The `.faces` property, if present.
    pub fn faces(&self) -> Option<Property<'a>> {
        self.node.find_property(well_known::FACES)
    }

    /// Stored sample count of `.faces`; 0 when absent.
    pub fn sample_count(&self) -> u32 {
        self.faces().map_or(0, |p| p.sample_count())
    }
}

/// Typed view of a curves node.
#[derive(Debug, Clone, Copy)]
pub struct CurvesSchema<'a> {
    node: Node<'a>,
}

impl<'a> CurvesSchema<'a> {
    /// True when the node's schema title names curves.
    pub fn matches(node: &Node<'_>) -> bool {
        schema_is(node, schema_title::CURVES)
    }

    /// Builds the view, validating well-known property layout.
    pub fn new(node: Node<'a>) -> Result<Self> {
        require_title(&node, schema_title::CURVES, "curves node")?;
        optional_v3f_array(&node, well_known::POSITIONS)?;
        optional_compound(&node, well_known::ARB_GEOM_PARAMS)?;
        Ok(Self { node })
    }

    /// The underlying node.
    pub fn node(&self) -> Node<'a> {
        self.node
    }

    /// Number of top-level properties.
    pub fn property_count(&self) -> usize {
        self.node.property_count()
    }

    /// Top-level properties in archive order.
    pub fn properties(&self) -> impl Iterator<Item = Property<'a>> {
        self.node.properties()
    }

    /// The `P` positions property, if present.
    pub fn positions(&self) -> Option<Property<'a>> {
        self.node.find_property(well_known::POSITIONS)
    }
}

/// Typed view of a transform node.
///
/// Transforms are deliberately lenient: a node carrying nothing but the
/// schema title still reports zero samples and zero ops.
#[derive(Debug, Clone, Copy)]
pub struct XformSchema<'a> {
    node: Node<'a>,
}

impl<'a> XformSchema<'a> {
    /// True when the node's schema title names a transform.
    pub fn matches(node: &Node<'_>) -> bool {
        schema_is(node, schema_title::XFORM)
    }

    /// Builds the view.
    ///
    /// # Errors
    ///
    /// [`Error::Schema`] when the node is not a transform.
    pub fn new(node: Node<'a>) -> Result<Self> {
        require_title(&node, schema_title::XFORM, "transform")?;
        Ok(Self { node })
    }

    /// The underlying node.
    pub fn node(&self) -> Node<'a> {
        self.node
    }

    /// Stored sample count of `.vals`; 0 when absent.
    pub fn num_samples(&self) -> u32 {
        self.node
            .find_property(well_known::XFORM_VALS)
            .map_or(0, |p| p.sample_count())
    }

    /// Number of transform op codes (one byte each in `.ops`); 0 when absent.
    pub fn op_count(&self) -> u64 {
        self.node
            .find_property(well_known::XFORM_OPS)
            .map_or(0, |p| p.byte_len())
    }
}

/// Typed view of a material node.
///
/// Material shading networks live under the `.shading` compound: one
/// compound per target, one compound per shader type under each target,
/// and one entry per shader parameter under each type.
#[derive(Debug, Clone, Copy)]
pub struct MaterialSchema<'a> {
    node: Node<'a>,
}

impl<'a> MaterialSchema<'a> {
    /// True when the node's schema title names a material.
    pub fn matches(node: &Node<'_>) -> bool {
        schema_is(node, schema_title::MATERIAL)
    }

    /// Builds the view, validating the `.shading` structure.
    ///
    /// # Errors
    ///
    /// [`Error::Schema`] when the node is not a material or when a target
    /// or shader-type entry is not a compound; [`Error::TypeMismatch`] when
    /// `.shading` itself is not a compound.
    pub fn new(node: Node<'a>) -> Result<Self> {
        require_title(&node, schema_title::MATERIAL, "material")?;
        if let Some(shading) = optional_compound(&node, well_known::SHADING)? {
            for target in shading.children() {
                if !target.is_compound() {
                    return Err(Error::schema(
                        node.full_name(),
                        format!("material target '{}' is not a compound", target.name()),
                    ));
                }
                for shader_type in target.children() {
                    if !shader_type.is_compound() {
                        return Err(Error::schema(
                            node.full_name(),
                            format!(
                                "shader type '{}' under target '{}' is not a compound",
                                shader_type.name(),
                                target.name()
                            ),
                        ));
                    }
                }
            }
        }
        Ok(Self { node })
    }

    /// The underlying node.
    pub fn node(&self) -> Node<'a> {
        self.node
    }

    fn shading(&self) -> Option<Property<'a>> {
        self.node.find_property(well_known::SHADING)
    }

    /// Number of shading targets; 0 when `.shading` is absent.
    pub fn target_count(&self) -> usize {
        self.shading().map_or(0, |p| p.child_count())
    }

    /// Iterates over shading targets in archive order.
    pub fn targets(&self) -> impl Iterator<Item = MaterialTarget<'a>> {
        self.shading()
            .into_iter()
            .flat_map(|p| p.children())
            .map(|prop| MaterialTarget { prop })
    }

    /// Names of all shading targets.
    pub fn target_names(&self) -> Vec<&'a str> {
        self.targets().map(|t| t.name()).collect()
    }

    /// Shader type names under the named target.
    pub fn shader_types_for_target(&self, target: &str) -> Option<Vec<&'a str>> {
        self.targets()
            .find(|t| t.name() == target)
            .map(|t| t.shader_types().map(|s| s.name()).collect())
    }

    /// Parameter names under the named target and shader type.
    pub fn shader_parameters(&self, target: &str, shader_type: &str) -> Option<Vec<&'a str>> {
        self.targets()
            .find(|t| t.name() == target)?
            .shader_types()
            .find(|s| s.name() == shader_type)
            .map(|s| s.parameter_names())
    }
}

/// One shading target of a material, e.g. a renderer name.
#[derive(Debug, Clone, Copy)]
pub struct MaterialTarget<'a> {
    prop: Property<'a>,
}

impl<'a> MaterialTarget<'a> {
    /// The target's name.
    pub fn name(&self) -> &'a str {
        self.prop.name()
    }

    /// Number of shader types under this target.
    pub fn shader_type_count(&self) -> usize {
        self.prop.child_count()
    }

    /// Iterates over shader types in archive order.
    pub fn shader_types(&self) -> impl Iterator<Item = MaterialShaderType<'a>> {
        self.prop.children().map(|prop| MaterialShaderType { prop })
    }
}

/// One shader type under a material target, e.g. `surface`.
#[derive(Debug, Clone, Copy)]
pub struct MaterialShaderType<'a> {
    prop: Property<'a>,
}

impl<'a> MaterialShaderType<'a> {
    /// The shader type's name.
    pub fn name(&self) -> &'a str {
        self.prop.name()
    }

    /// Number of parameter entries under this shader type.
    pub fn parameter_count(&self) -> usize {
        self.prop.child_count()
    }

    /// Names of the parameter entries.
    pub fn parameter_names(&self) -> Vec<&'a str> {
        self.prop.children().map(|p| p.name()).collect()
    }
}
