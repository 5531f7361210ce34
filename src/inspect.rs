//! The archive inspector: best-effort diagnostics over arbitrary bytes.
//!
//! [`inspect_bytes`] takes an untrusted byte buffer, materializes it as a
//! scoped temporary file, opens it as an archive, and walks the node
//! hierarchy printing a report for each node kind. It is the crate's fuzzing
//! entry point, so its failure contract is strict:
//!
//! - Library errors never escape. An archive that fails to open is reported
//!   with an `(invalid)` marker; an error raised during traversal is printed
//!   and swallowed. Both complete the invocation normally.
//! - Environment failures do escape. Temporary-file management and report
//!   sink failures return `Err`, signalling that the harness itself (not the
//!   input) is broken.
//! - The temporary file is deleted on every exit path.
//!
//! [`print_info`] is the underlying report routine, usable directly against
//! a file on disk.

use std::fs::File;
use std::io::{self, BufReader, Write};
use std::path::Path;
use std::sync::Once;

use crate::format::well_known;
use crate::read::MEMORY_NAME;
use crate::read::{
    Archive, CurvesSchema, FaceSetSchema, MaterialSchema, MeshSchema, Node, NodeKind, Property,
    SubdSchema, XformSchema,
};
use crate::{Error, Result};

static INIT: Once = Once::new();

/// One-time process setup: redirects stdout to the null device.
///
/// Long fuzzing campaigns drown in report text otherwise. Unix only; a
/// no-op elsewhere. Safe to call repeatedly from any thread; only the
/// first call has any effect.
pub fn init() {
    INIT.call_once(|| {
        #[cfg(unix)]
        silence_stdout();
    });
}

#[cfg(unix)]
fn silence_stdout() {
    // SAFETY: plain fd syscalls on constants and a just-opened descriptor.
    unsafe {
        let devnull = libc::open(c"/dev/null".as_ptr(), libc::O_WRONLY);
        if devnull >= 0 {
            libc::dup2(devnull, libc::STDOUT_FILENO);
            if devnull != libc::STDOUT_FILENO {
                libc::close(devnull);
            }
        }
    }
}

/// Inspects an arbitrary byte buffer, writing the report to `out`.
///
/// The buffer is staged through a temporary file in the system temp
/// directory so the archive is exercised through its file-opening path.
/// The report labels the input `<memory>`, keeping output independent of
/// the randomized temporary path.
///
/// # Errors
///
/// Only for harness failures: creating, writing, or deleting the temporary
/// file, or writing to `out`. Library errors are printed instead.
pub fn inspect_bytes(data: &[u8], out: impl Write) -> io::Result<()> {
    inspect_bytes_at(None, data, out)
}

/// As [`inspect_bytes`], staging the temporary file in `dir`.
///
/// Tests use this to assert cleanup against a directory they control.
pub fn inspect_bytes_in(dir: impl AsRef<Path>, data: &[u8], out: impl Write) -> io::Result<()> {
    inspect_bytes_at(Some(dir.as_ref()), data, out)
}

fn inspect_bytes_at(dir: Option<&Path>, data: &[u8], mut out: impl Write) -> io::Result<()> {
    let mut builder = tempfile::Builder::new();
    builder.prefix("sga-inspect-").suffix(".sga");
    let mut temp = match dir {
        Some(dir) => builder.tempfile_in(dir),
        None => builder.tempfile(),
    }?;
    temp.write_all(data)?;
    temp.flush()?;

    let outcome = report(temp.path(), MEMORY_NAME, &mut out);

    // Explicit close so a deletion failure is loud; the Drop impl would
    // swallow it.
    temp.close()?;

    match outcome {
        Ok(()) => Ok(()),
        Err(Error::Io(e)) => Err(e),
        Err(finding) => {
            writeln!(out, "error: {finding}")?;
            Ok(())
        }
    }
}

/// Prints the inspection report for the archive at `path`.
///
/// An archive that fails to open is reported `(invalid)` and the function
/// returns Ok with no traversal.
///
/// # Errors
///
/// Errors raised while traversing a successfully opened archive, and
/// failures of the `out` sink.
pub fn print_info(path: impl AsRef<Path>, mut out: impl Write) -> Result<()> {
    let path = path.as_ref();
    let label = path.display().to_string();
    report(path, &label, &mut out)
}

fn report<W: Write>(path: &Path, label: &str, out: &mut W) -> Result<()> {
    writeln!(out)?;
    match open_archive(path, label) {
        Ok(archive) => {
            writeln!(out, "file {label}:")?;
            writeln!(out)?;
            writeln!(out, "file name: {}", archive.name())?;
            print_nodes(archive.root(), out)
        }
        Err(e) => {
            log::debug!("archive '{label}' failed to open: {e}");
            writeln!(out, "file {label} (invalid):")?;
            writeln!(out)?;
            Ok(())
        }
    }
}

fn open_archive(path: &Path, label: &str) -> Result<Archive> {
    let file = File::open(path)?;
    Archive::open_named(BufReader::new(file), label)
}

/// Prints one node's report, then recurses into its children in index
/// order (pre-order).
fn print_nodes<W: Write>(node: Node<'_>, out: &mut W) -> Result<()> {
    writeln!(out, "node name: {}", node.name())?;
    writeln!(out, "node full name: {}", node.full_name())?;
    writeln!(out, "metadata: {}", node.metadata().serialize())?;

    match node.kind() {
        NodeKind::Mesh => print_mesh(node, out)?,
        NodeKind::Subd => print_subd(node, out)?,
        NodeKind::FaceSet => print_face_set(node, out)?,
        NodeKind::Curves => print_curves(node, out)?,
        NodeKind::Xform => print_xform(node, out)?,
        NodeKind::Material => print_material(node, out)?,
        NodeKind::Other => writeln!(out, "node kind ignored")?,
    }

    for child in node.children() {
        print_nodes(child, out)?;
    }
    Ok(())
}

/// Lists a geometry node's properties; well-known names get a sample
/// count, the generic parameter group gets its children listed.
///
/// `with_normals` covers the mesh/curves case; subdivision surfaces do not
/// report `N`.
fn print_geom_properties<'a, W: Write>(
    properties: impl Iterator<Item = Property<'a>>,
    with_normals: bool,
    out: &mut W,
) -> Result<()> {
    for (i, prop) in properties.enumerate() {
        writeln!(out, "  property[{i}] name: {}", prop.name())?;
        match prop.name() {
            well_known::POSITIONS | well_known::UV | well_known::ST => {
                writeln!(out, "    sample count: {}", prop.sample_count())?;
            }
            well_known::NORMALS if with_normals => {
                writeln!(out, "    sample count: {}", prop.sample_count())?;
            }
            well_known::ARB_GEOM_PARAMS => {
                writeln!(out, "    geom param count: {}", prop.child_count())?;
                for (j, param) in prop.children().enumerate() {
                    writeln!(out, "    geom param[{j}] name: {}", param.name())?;
                }
            }
            // Anything else is listed by name only; deriving sample counts
            // for arbitrary properties is more involved and not performed.
            _ => {}
        }
    }
    Ok(())
}

fn print_mesh<W: Write>(node: Node<'_>, out: &mut W) -> Result<()> {
    let mesh = MeshSchema::new(node)?;
    writeln!(out, "  mesh property count: {}", mesh.property_count())?;
    print_geom_properties(mesh.properties(), true, out)
}

fn print_subd<W: Write>(node: Node<'_>, out: &mut W) -> Result<()> {
    let subd = SubdSchema::new(node)?;
    writeln!(out, "  subd property count: {}", subd.property_count())?;
    print_geom_properties(subd.properties(), false, out)?;
    writeln!(out, "  subdivision scheme: {}", subd.scheme()?)?;
    writeln!(
        out,
        "  face varying interpolate boundary: {}",
        subd.face_varying_interpolate_boundary()?
    )?;
    writeln!(
        out,
        "  face varying propagate corners: {}",
        subd.face_varying_propagate_corners()?
    )?;
    writeln!(out, "  interpolate boundary: {}", subd.interpolate_boundary()?)?;
    Ok(())
}

fn print_face_set<W: Write>(node: Node<'_>, out: &mut W) -> Result<()> {
    let face_set = FaceSetSchema::new(node)?;
    writeln!(out, "  sample count: {}", face_set.sample_count())?;
    Ok(())
}

fn print_curves<W: Write>(node: Node<'_>, out: &mut W) -> Result<()> {
    let curves = CurvesSchema::new(node)?;
    writeln!(out, "  curves property count: {}", curves.property_count())?;
    print_geom_properties(curves.properties(), true, out)
}

fn print_xform<W: Write>(node: Node<'_>, out: &mut W) -> Result<()> {
    let xform = XformSchema::new(node)?;
    writeln!(out, "  sample count: {}", xform.num_samples())?;
    writeln!(out, "  op count: {}", xform.op_count())?;
    Ok(())
}

fn print_material<W: Write>(node: Node<'_>, out: &mut W) -> Result<()> {
    let material = MaterialSchema::new(node)?;
    writeln!(out, "  target count: {}", material.target_count())?;
    for (i, target) in material.targets().enumerate() {
        writeln!(out, "  target[{i}] name: {}", target.name())?;
        writeln!(out, "    shader type count: {}", target.shader_type_count())?;
        for (j, shader_type) in target.shader_types().enumerate() {
            writeln!(out, "    shader type[{j}] name: {}", shader_type.name())?;
            writeln!(
                out,
                "    shader parameter count: {}",
                shader_type.parameter_count()
            )?;
        }
    }
    Ok(())
}
