//! # hemesh
//!
//! A half-edge mesh editing kernel for geometry processing.
//!
//! hemesh provides an arena-backed half-edge data structure built for
//! topological mutation: polygon-soup and OBJ construction, edge collapse,
//! flip and split, face cutting and triangulation of arbitrary (possibly
//! degenerate) polygons, non-manifold repair, collapse-based
//! simplification, and a priority-queue edge-flip optimizer.
//!
//! ## Quick start
//!
//! ```
//! use hemesh::prelude::*;
//!
//! let mut mesh = hemesh::io::obj::parse(
//!     "v 0 0 0\nv 1 0 0\nv 1 0 1\nv 0 0 1\nf 1 2 3 4\n",
//! )
//! .unwrap();
//!
//! // The quad face gets triangulated in place.
//! mesh.triangulate(false);
//! assert_eq!(mesh.face_count(), 2);
//! assert!(mesh.is_valid(ValidationRules::STANDARD | ValidationRules::TRIANGLES_ONLY));
//! ```
//!
//! ## Editing
//!
//! All entities are addressed by typed handles ([`mesh::VertexId`],
//! [`mesh::HalfedgeId`], [`mesh::FaceId`]); destroyed entities leave
//! tombstoned slots, so handles are stable and never reused. Mutations
//! with geometric preconditions report failure through typed returns:
//!
//! ```
//! use hemesh::prelude::*;
//!
//! let mut mesh = hemesh::io::obj::parse(
//!     "v 0 0 0\nv 1 0 0\nv 1 0 1\nv 0 0 1\nf 1 2 3\nf 1 3 4\n",
//! )
//! .unwrap();
//! let diagonal = mesh
//!     .halfedge_ids()
//!     .find(|&h| !mesh.is_boundary_halfedge(h))
//!     .unwrap();
//! if mesh.flip_precondition(diagonal) {
//!     mesh.flip_edge(diagonal);
//! }
//! assert!(mesh.is_valid(ValidationRules::STANDARD));
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod algo;
pub mod error;
pub mod io;
pub mod mesh;

/// Prelude module for convenient imports.
///
/// ```
/// use hemesh::prelude::*;
/// ```
pub mod prelude {
    pub use crate::algo::{
        dissolve_unneeded_boundary_vertices, dissolve_unneeded_vertices, fix_degenerate_faces,
        priority_queue_optimization, simplify_by_collapse, DihedralEnergy, FlipEnergy,
        MinAngleEnergy, OptimizerOptions, ValencyEnergy,
    };
    pub use crate::error::{MeshError, Result};
    pub use crate::mesh::{
        CollapseReason, ExportedMesh, Face, FaceId, HMesh, Halfedge, HalfedgeId, IndexFormat,
        IndexedMeshInput, MeshConfig, ValidationRules, Vertex, VertexId,
    };
}

// Re-export nalgebra for convenience.
pub use nalgebra;
