//! Mesh processing algorithms layered on the editing kernel.
//!
//! - **Simplification**: degenerate-geometry repair and greedy
//!   collapse-based reduction ([`simplify`])
//! - **Optimization**: priority-queue-driven edge flipping against an
//!   energy functional ([`optimize`])

pub mod optimize;
pub mod simplify;

pub use optimize::{
    priority_queue_optimization, DihedralEnergy, FlipEnergy, MinAngleEnergy, OptimizerOptions,
    ValencyEnergy,
};
pub use simplify::{
    dissolve_unneeded_boundary_vertices, dissolve_unneeded_vertices, fix_degenerate_faces,
    simplify_by_collapse,
};
