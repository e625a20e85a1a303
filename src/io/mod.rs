//! Mesh file I/O.
//!
//! Only the OBJ text subset needed for mesh reconstruction is supported:
//! `v` positions, `o` region markers, `f` polygons. Materials, normals,
//! relative indices and line continuations are out of scope.
//!
//! ```no_run
//! use hemesh::io::{load, save};
//! use hemesh::mesh::HMesh;
//!
//! let mesh: HMesh = load("model.obj").unwrap();
//! save(&mesh, "output.obj").unwrap();
//! ```

pub mod obj;

use std::path::Path;

use crate::error::{MeshError, Result};
use crate::mesh::HMesh;

/// Supported mesh file formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    /// Wavefront OBJ (subset).
    Obj,
}

/// Detect the format from a path's extension.
pub fn format_from_path<P: AsRef<Path>>(path: P) -> Result<Format> {
    let extension = path
        .as_ref()
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();
    match extension.as_str() {
        "obj" => Ok(Format::Obj),
        _ => Err(MeshError::UnsupportedFormat { extension }),
    }
}

/// Load a mesh with automatic format detection.
pub fn load<P: AsRef<Path>>(path: P) -> Result<HMesh> {
    match format_from_path(&path)? {
        Format::Obj => obj::load(path),
    }
}

/// Save a mesh with automatic format detection.
pub fn save<P: AsRef<Path>>(mesh: &HMesh, path: P) -> Result<()> {
    match format_from_path(&path)? {
        Format::Obj => obj::save(mesh, path),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_detection() {
        assert_eq!(format_from_path("mesh.obj").unwrap(), Format::Obj);
        assert_eq!(format_from_path("MESH.OBJ").unwrap(), Format::Obj);
        assert!(matches!(
            format_from_path("mesh.stl"),
            Err(MeshError::UnsupportedFormat { .. })
        ));
    }
}
