//! Writer-to-reader round-trip tests.
//!
//! A scene built with [`NodeDef`] is encoded, reopened, and walked; every
//! name, schema classification, metadata pair and data payload must come
//! back exactly as written.

mod common;

use std::io::Cursor;

use sgar::format::META_SCHEMA_KEY;
use sgar::read::{Archive, Node, NodeKind};
use sgar::write::{NodeDef, write_archive, write_archive_path};
use sgar::{DataKind, PropertyKind};

use common::{encode, i32_bytes, sample_scene, v3f_bytes};

fn open_bytes(bytes: Vec<u8>) -> Archive {
    Archive::open(Cursor::new(bytes)).expect("freshly written archive should open")
}

fn child_names(node: Node<'_>) -> Vec<String> {
    node.children().map(|c| c.name().to_string()).collect()
}

#[test]
fn test_write_result_matches_output() {
    let mut bytes = Vec::new();
    let result = write_archive(&sample_scene(), &mut bytes).expect("write should succeed");

    assert_eq!(result.nodes_written, 8);
    assert_eq!(result.bytes_written, bytes.len() as u64);
}

#[test]
fn test_scene_roundtrip_structure() {
    let bytes = encode(&sample_scene());
    let total = bytes.len() as u64;
    let archive = open_bytes(bytes);

    let info = archive.info();
    assert_eq!(info.node_count, 8);
    assert_eq!(info.property_count, 20);
    assert_eq!(info.max_depth, 2);
    assert_eq!(info.version, (1, 0));
    assert_eq!(32 + info.tree_bytes + info.data_bytes, total);

    let root = archive.root();
    assert_eq!(root.name(), "scene");
    assert_eq!(root.full_name(), "/");
    assert_eq!(root.kind(), NodeKind::Other);
    assert_eq!(root.metadata().get("app"), Some("sgar"));
    assert_eq!(child_names(root), ["geo", "rig"]);

    let geo = root.child(0).expect("geo");
    assert_eq!(geo.full_name(), "/geo");
    assert!(geo.metadata().is_empty());
    assert_eq!(child_names(geo), ["cube", "blob", "cube_top", "hair"]);

    // Schema classification comes back from the metadata written for each node
    let kinds: Vec<NodeKind> = geo.children().map(|c| c.kind()).collect();
    assert_eq!(
        kinds,
        [
            NodeKind::Mesh,
            NodeKind::Subd,
            NodeKind::FaceSet,
            NodeKind::Curves
        ]
    );

    let rig = root.child(1).expect("rig");
    assert_eq!(rig.kind(), NodeKind::Xform);
    assert_eq!(rig.metadata().get(META_SCHEMA_KEY), Some("xform.v1"));

    let look = rig.child(0).expect("look");
    assert_eq!(look.kind(), NodeKind::Material);
    assert_eq!(look.full_name(), "/rig/look");
}

#[test]
fn test_scene_roundtrip_properties() {
    let archive = open_bytes(encode(&sample_scene()));
    let geo = archive.root().child(0).expect("geo");

    let cube = geo.child(0).expect("cube");
    assert_eq!(cube.full_name(), "/geo/cube");
    let props: Vec<_> = cube.properties().collect();
    assert_eq!(props.len(), 3);

    let points = &props[0];
    assert_eq!(points.name(), "P");
    assert_eq!(points.kind(), PropertyKind::Array);
    assert_eq!(points.data_kind(), Some(DataKind::V3f));
    assert_eq!(points.sample_count(), 8);
    assert_eq!(points.data(), v3f_bytes(8).as_slice());

    let params = &props[2];
    assert_eq!(params.name(), ".arbGeomParams");
    assert_eq!(params.kind(), PropertyKind::Compound);
    assert_eq!(params.data_kind(), None);
    assert_eq!(params.sample_count(), 0);
    assert!(params.data().is_empty());
    let param_names: Vec<&str> = params.children().map(|p| p.name()).collect();
    assert_eq!(param_names, ["displayColor", "smoothing"]);
    let smoothing = params.child(1).expect("smoothing");
    assert_eq!(smoothing.data(), 1i32.to_le_bytes());

    let faceset = geo.child(2).expect("cube_top");
    let faces = faceset.property(0).expect(".faces");
    assert_eq!(faces.data_kind(), Some(DataKind::I32));
    assert_eq!(faces.data(), i32_bytes(&[0, 1, 4]).as_slice());
}

#[test]
fn test_nested_compound_roundtrip() {
    let archive = open_bytes(encode(&sample_scene()));
    let look = archive
        .root()
        .child(1)
        .and_then(|rig| rig.child(0))
        .expect("look");

    let shading = look.property(0).expect(".shading");
    assert_eq!(shading.name(), ".shading");
    let render = shading.child(0).expect("render target");
    assert_eq!(render.name(), "render");
    let surface = render.child(0).expect("surface shader type");
    assert_eq!(surface.name(), "surface");

    let shader_params: Vec<_> = surface.children().collect();
    assert_eq!(shader_params.len(), 2);
    assert_eq!(shader_params[0].name(), "shader");
    assert_eq!(shader_params[0].data(), b"standard");
    assert_eq!(shader_params[1].name(), "roughness");
    assert_eq!(shader_params[1].data(), 0.5f32.to_le_bytes());
}

#[test]
fn test_empty_root_roundtrip() {
    let archive = open_bytes(encode(&NodeDef::new("root")));

    let info = archive.info();
    assert_eq!(info.node_count, 1);
    assert_eq!(info.property_count, 0);
    assert_eq!(info.max_depth, 0);
    assert_eq!(info.data_bytes, 0);

    let root = archive.root();
    assert_eq!(root.name(), "root");
    assert_eq!(root.full_name(), "/");
    assert_eq!(root.kind(), NodeKind::Other);
    assert_eq!(root.children().count(), 0);
}

#[test]
fn test_path_roundtrip() {
    let dir = tempfile::tempdir().expect("create temp dir");
    let path = dir.path().join("scene.sga");

    let result = write_archive_path(&sample_scene(), &path).expect("write to path");
    assert_eq!(result.nodes_written, 8);
    assert_eq!(
        result.bytes_written,
        std::fs::metadata(&path).expect("written file").len()
    );

    let archive = Archive::open_path(&path).expect("open from path");
    assert_eq!(archive.info().node_count, 8);
    assert_eq!(archive.root().name(), "scene");
}
