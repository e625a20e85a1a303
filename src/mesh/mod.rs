//! The half-edge mesh and its editing operations.
//!
//! The mesh is an arena of three entity kinds — [`Vertex`], [`Halfedge`],
//! [`Face`] — addressed by typed handles and mutated in place through
//! [`HMesh`] methods. Submodules group the operations by the entity they
//! center on; everything is an `impl HMesh` block, so the borrow checker
//! sees one exclusive borrow per mutation.

pub mod builder;
pub mod export;
pub mod face;
pub mod halfedge;
pub mod hmesh;
pub mod index;
pub mod validate;
pub mod vertex;

pub use builder::IndexedMeshInput;
pub use export::{ExportedMesh, IndexFormat};
pub use face::Face;
pub use halfedge::{CollapseReason, Halfedge};
pub use hmesh::{HMesh, MeshConfig};
pub use index::{FaceId, HalfedgeId, VertexId};
pub use validate::ValidationRules;
pub use vertex::Vertex;

pub(crate) use halfedge::point_line_distance;
