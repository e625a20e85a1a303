//! Mesh validity checking.
//!
//! [`HMesh::is_valid`] sweeps every live entity and checks the structural
//! invariants: closed `next`/`prev` cycles, faces that contain their
//! half-edges, symmetric-or-absent twin pairing, consistent incoming lists.
//! Optional rules add geometric checks on top. Failures are logged with the
//! offending handles and aggregated into the return value — the sweep does
//! not stop at the first problem, so one call reports everything wrong.

use bitflags::bitflags;
use tracing::warn;

use super::hmesh::HMesh;
use super::index::{FaceId, HalfedgeId, VertexId};

bitflags! {
    /// Optional extra checks for [`HMesh::is_valid`].
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct ValidationRules: u32 {
        /// Reject edges shorter than the zero-magnitude threshold.
        const ZERO_LENGTH_EDGES = 1;
        /// Every face must be exactly a triangle.
        const TRIANGLES_ONLY = 1 << 1;
        /// Reject faces with a degenerate corner (two parallel consecutive
        /// edges) or a zero normal.
        const DEGENERATE_CORNERS = 1 << 2;
        /// Reject duplicate directed edges between a vertex pair (the
        /// manifold property violated by bad joins).
        const INVALID_JOINS = 1 << 3;
    }
}

impl ValidationRules {
    /// The structural invariants only.
    pub const STANDARD: ValidationRules = ValidationRules::empty();
}

impl HMesh {
    /// Check every live entity against the invariants plus the requested
    /// extra rules. Returns `true` when the whole mesh passes.
    pub fn is_valid(&self, rules: ValidationRules) -> bool {
        let mut ok = true;
        for h in self.halfedge_ids() {
            ok &= self.halfedge_is_valid(h, rules);
        }
        for v in self.vertex_ids() {
            ok &= self.vertex_is_valid(v);
        }
        for f in self.face_ids() {
            ok &= self.face_is_valid(f, rules);
        }
        if rules.contains(ValidationRules::INVALID_JOINS) {
            ok &= self.edges_are_manifold();
        }
        ok
    }

    /// Structural checks for one half-edge.
    pub fn halfedge_is_valid(&self, h: HalfedgeId, rules: ValidationRules) -> bool {
        let mut ok = true;
        let he = self.halfedge(h);

        if !he.next.is_valid() || self.is_halfedge_destroyed(he.next) {
            warn!(halfedge = ?h, next = ?he.next, "next link is dead");
            return false;
        }
        if !he.prev.is_valid() || self.is_halfedge_destroyed(he.prev) {
            warn!(halfedge = ?h, prev = ?he.prev, "prev link is dead");
            return false;
        }
        if self.next(he.prev) != h {
            warn!(halfedge = ?h, "prev.next does not point back");
            ok = false;
        }
        if self.prev(he.next) != h {
            warn!(halfedge = ?h, "next.prev does not point back");
            ok = false;
        }
        if !he.face.is_valid() || self.is_face_destroyed(he.face) {
            warn!(halfedge = ?h, face = ?he.face, "face link is dead");
            ok = false;
        }
        if !he.vert.is_valid() || self.is_vertex_destroyed(he.vert) {
            warn!(halfedge = ?h, vert = ?he.vert, "vertex link is dead");
            ok = false;
        } else if !self.vertex(he.vert).incoming.contains(&h) {
            warn!(halfedge = ?h, vert = ?he.vert, "vertex does not list this half-edge as incoming");
            ok = false;
        }
        if he.opp.is_valid() {
            if self.is_halfedge_destroyed(he.opp) {
                warn!(halfedge = ?h, opp = ?he.opp, "twin is dead");
                ok = false;
            } else {
                if self.opp(he.opp) != h {
                    warn!(halfedge = ?h, opp = ?he.opp, "twin pairing is not symmetric");
                    ok = false;
                }
                if self.vert(he.opp) == he.vert {
                    warn!(halfedge = ?h, "twin points at the same vertex");
                    ok = false;
                }
                if self.face_of(he.opp) == he.face {
                    warn!(halfedge = ?h, "twin bounds the same face");
                    ok = false;
                }
            }
        }
        if rules.contains(ValidationRules::ZERO_LENGTH_EDGES)
            && ok
            && self.halfedge_length_sqr(h) < self.config.zero_magnitude_threshold_sqr()
        {
            warn!(halfedge = ?h, "zero-length edge");
            ok = false;
        }
        ok
    }

    /// Structural checks for one vertex.
    pub fn vertex_is_valid(&self, v: VertexId) -> bool {
        let mut ok = true;
        let vert = self.vertex(v);
        for &h in &vert.incoming {
            if self.is_halfedge_destroyed(h) {
                warn!(vertex = ?v, halfedge = ?h, "incoming list references a dead half-edge");
                ok = false;
            } else if self.vert(h) != v {
                warn!(vertex = ?v, halfedge = ?h, "incoming half-edge points elsewhere");
                ok = false;
            }
        }
        if !vert.position.coords.iter().all(|c| c.is_finite()) {
            warn!(vertex = ?v, "position is not finite");
            ok = false;
        }
        ok
    }

    /// Structural and optional geometric checks for one face.
    pub fn face_is_valid(&self, f: FaceId, rules: ValidationRules) -> bool {
        let mut ok = true;
        if !self.face_cycle_consistent(f) {
            warn!(face = ?f, "boundary cycle is inconsistent");
            return false;
        }
        let count = self.face_edge_count(f);
        if count < 3 {
            warn!(face = ?f, count, "face has fewer than 3 edges");
            ok = false;
        }
        if rules.contains(ValidationRules::TRIANGLES_ONLY) && count != 3 {
            warn!(face = ?f, count, "face is not a triangle");
            ok = false;
        }
        if rules.contains(ValidationRules::DEGENERATE_CORNERS) {
            if self.face_is_degenerate(f) {
                warn!(face = ?f, "face normal is degenerate");
                ok = false;
            }
            for h in self.circulate_face(f) {
                let d1 = self.halfedge_direction(h);
                let d2 = self.halfedge_direction(self.next(h));
                if d1.cross(&d2).norm_squared() < self.config.zero_magnitude_threshold_sqr() {
                    warn!(face = ?f, corner = ?self.vert(h), "degenerate corner");
                    ok = false;
                }
            }
        }
        ok
    }

    /// No two distinct half-edges may run between the same ordered vertex
    /// pair — two is only legal as a twin pair, which runs in opposite
    /// directions.
    fn edges_are_manifold(&self) -> bool {
        let mut seen = std::collections::HashMap::new();
        let mut ok = true;
        for h in self.halfedge_ids() {
            let key = (self.source(h), self.vert(h));
            if let Some(&prior) = seen.get(&key) {
                warn!(halfedge = ?h, duplicate_of = ?prior, "duplicate directed edge");
                ok = false;
            } else {
                seen.insert(key, h);
            }
        }
        ok
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nalgebra::Point3;

    #[test]
    fn test_valid_triangle_passes_all() {
        let mesh = HMesh::create_test_mesh_triangle();
        assert!(mesh.is_valid(
            ValidationRules::STANDARD
                | ValidationRules::TRIANGLES_ONLY
                | ValidationRules::ZERO_LENGTH_EDGES
                | ValidationRules::DEGENERATE_CORNERS
                | ValidationRules::INVALID_JOINS
        ));
    }

    #[test]
    fn test_zero_length_edge_detected() {
        let mut mesh = HMesh::new();
        mesh.create_triangle(
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(0.0, 0.0, 0.0), // coincident
            Point3::new(0.0, 0.0, 1.0),
        );
        assert!(mesh.is_valid(ValidationRules::STANDARD));
        assert!(!mesh.is_valid(ValidationRules::ZERO_LENGTH_EDGES));
    }

    #[test]
    fn test_non_triangle_detected() {
        let mesh = HMesh::create_test_mesh_quad();
        assert!(mesh.is_valid(ValidationRules::STANDARD));
        assert!(!mesh.is_valid(ValidationRules::TRIANGLES_ONLY));
    }

    #[test]
    fn test_degenerate_corner_detected() {
        let mut mesh = HMesh::new();
        mesh.create_triangle(
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(2.0, 0.0, 0.0), // collinear
        );
        assert!(!mesh.is_valid(ValidationRules::DEGENERATE_CORNERS));
    }

    #[test]
    fn test_broken_link_detected() {
        let mut mesh = HMesh::create_test_mesh_triangle();
        let h = mesh.halfedge_ids().next().unwrap();
        let n = mesh.next(h);
        // Corrupt the cycle directly.
        mesh.halfedge_mut(n).prev = HalfedgeId::invalid();
        assert!(!mesh.is_valid(ValidationRules::STANDARD));
    }
}
