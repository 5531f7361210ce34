//! Shared test utilities for integration tests.
//!
//! This module provides common helper functions used across multiple test
//! files. Archive fixtures are built through the public writer so every
//! fixture is a genuine archive rather than a hand-assembled byte blob;
//! byte-level corruption tests then damage these known-good buffers.
//!
//! Note: `#![allow(dead_code)]` is required because each integration test file
//! compiles as a separate crate and may only use a subset of these helpers.

#![allow(dead_code)]

use std::path::Path;

use sgar::format::schema_title;
use sgar::{DataKind, NodeDef, PropertyDef, write_archive};

/// Encodes a node tree into archive bytes.
///
/// # Panics
///
/// Panics if serialization fails; fixtures are expected to be writable.
pub fn encode(root: &NodeDef) -> Vec<u8> {
    let mut bytes = Vec::new();
    write_archive(root, &mut bytes).expect("fixture failed to serialize");
    bytes
}

/// A minimal valid archive: a single transform node with no properties.
pub fn minimal_xform() -> Vec<u8> {
    encode(&NodeDef::with_schema("root_xform", schema_title::XFORM))
}

/// A scene exercising every recognized node kind plus unrecognized
/// container nodes.
///
/// ```text
/// scene (app=sgar)
/// ├── geo
/// │   ├── cube      mesh.v1      P, uv, .arbGeomParams
/// │   ├── blob      subd.v1      P, .scheme, boundary flags
/// │   ├── cube_top  faceset.v1   .faces
/// │   └── hair      curves.v1    P, N
/// └── rig           xform.v1     .vals, .ops
///     └── look      material.v1  .shading → render → surface
/// ```
pub fn sample_scene() -> NodeDef {
    let mesh = NodeDef::with_schema("cube", schema_title::MESH)
        .property(PropertyDef::array("P", DataKind::V3f, 8, v3f_bytes(8)))
        .property(PropertyDef::array("uv", DataKind::F32, 4, vec![0u8; 16]))
        .property(PropertyDef::compound(
            ".arbGeomParams",
            vec![
                PropertyDef::scalar_str("displayColor", "red"),
                PropertyDef::scalar_i32("smoothing", 1),
            ],
        ));

    let subd = NodeDef::with_schema("blob", schema_title::SUBD)
        .property(PropertyDef::array("P", DataKind::V3f, 4, v3f_bytes(4)))
        .property(PropertyDef::scalar_str(".scheme", "loop"))
        .property(PropertyDef::scalar_i32(".faceVaryingInterpolateBoundary", 1))
        .property(PropertyDef::scalar_i32(".faceVaryingPropagateCorners", 0))
        .property(PropertyDef::scalar_i32(".interpolateBoundary", 2));

    let face_set = NodeDef::with_schema("cube_top", schema_title::FACESET).property(
        PropertyDef::array(".faces", DataKind::I32, 3, i32_bytes(&[0, 1, 4])),
    );

    let curves = NodeDef::with_schema("hair", schema_title::CURVES)
        .property(PropertyDef::array("P", DataKind::V3f, 6, v3f_bytes(6)))
        .property(PropertyDef::array("N", DataKind::V3f, 6, v3f_bytes(6)));

    let material = NodeDef::with_schema("look", schema_title::MATERIAL).property(
        PropertyDef::compound(
            ".shading",
            vec![PropertyDef::compound(
                "render",
                vec![PropertyDef::compound(
                    "surface",
                    vec![
                        PropertyDef::scalar_str("shader", "standard"),
                        PropertyDef::scalar(
                            "roughness",
                            DataKind::F32,
                            1,
                            0.5f32.to_le_bytes().to_vec(),
                        ),
                    ],
                )],
            )],
        ),
    );

    let xform = NodeDef::with_schema("rig", schema_title::XFORM)
        .property(PropertyDef::scalar(
            ".vals",
            DataKind::M44d,
            2,
            vec![0u8; 256],
        ))
        .property(PropertyDef::array(".ops", DataKind::U8, 3, vec![1, 2, 3]))
        .child(material);

    NodeDef::new("scene").meta("app", "sgar").child(
        NodeDef::new("geo")
            .child(mesh)
            .child(subd)
            .child(face_set)
            .child(curves),
    )
    .child(xform)
}

/// Packed little-endian v3f data for `count` samples.
pub fn v3f_bytes(count: u32) -> Vec<u8> {
    let mut data = Vec::with_capacity(count as usize * 12);
    for i in 0..count * 3 {
        data.extend_from_slice(&(i as f32).to_le_bytes());
    }
    data
}

/// Packed little-endian i32 data.
pub fn i32_bytes(values: &[i32]) -> Vec<u8> {
    let mut data = Vec::with_capacity(values.len() * 4);
    for v in values {
        data.extend_from_slice(&v.to_le_bytes());
    }
    data
}

/// Extracts the error from a Result, panicking if it's Ok.
///
/// This helper is useful for tests that expect an error. It provides a
/// cleaner alternative to `unwrap_err()` when the Ok type doesn't implement
/// Debug.
///
/// # Panics
///
/// Panics if the result is `Ok(_)`.
pub fn expect_err<T, E>(result: Result<T, E>) -> E {
    match result {
        Ok(_) => panic!("Expected error but got Ok"),
        Err(e) => e,
    }
}

/// Asserts that a directory contains no entries.
///
/// Used to verify the inspector's temporary files never outlive an
/// invocation.
pub fn assert_dir_empty(dir: &Path) {
    let leftovers: Vec<_> = std::fs::read_dir(dir)
        .expect("Failed to read temp dir")
        .map(|entry| entry.expect("Failed to read dir entry").path())
        .collect();
    assert!(
        leftovers.is_empty(),
        "Temp files left behind: {:?}",
        leftovers
    );
}
