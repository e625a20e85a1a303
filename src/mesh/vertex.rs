//! Vertex entity and vertex-centric operations.
//!
//! A vertex does not store an outgoing half-edge directly. Instead it keeps
//! the set of half-edges that point *at* it, maintained by
//! [`HMesh::set_halfedge_vert`], and derives the canonical outgoing
//! half-edge as the `next` of the first incoming one. This keeps the
//! pointer correct for free under arbitrary mutation.

use nalgebra::{Point3, Vector2};

use super::hmesh::{HMesh, MAX_CIRCULATION};
use super::index::{HalfedgeId, VertexId};

/// A mesh vertex: position, two UV channels, a scratch label, and the
/// maintained list of incoming half-edges.
#[derive(Debug, Clone)]
pub struct Vertex {
    /// Position in mesh space.
    pub position: Point3<f64>,
    /// First UV channel.
    pub uv1: Vector2<f64>,
    /// Second UV channel.
    pub uv2: Vector2<f64>,
    /// Scratch field used by algorithms for indexing/clustering.
    pub label: i32,
    /// Half-edges whose `vert` points at this vertex. Unordered.
    pub(crate) incoming: Vec<HalfedgeId>,
}

impl Vertex {
    pub(crate) fn new() -> Self {
        Self {
            position: Point3::origin(),
            uv1: Vector2::zeros(),
            uv2: Vector2::zeros(),
            label: 0,
            incoming: Vec::new(),
        }
    }

    pub(crate) fn link_incoming(&mut self, h: HalfedgeId) {
        debug_assert!(!self.incoming.contains(&h));
        self.incoming.push(h);
    }

    pub(crate) fn unlink_incoming(&mut self, h: HalfedgeId) {
        if let Some(pos) = self.incoming.iter().position(|&x| x == h) {
            self.incoming.swap_remove(pos);
        }
    }
}

impl HMesh {
    /// The raw, unordered set of half-edges pointing at `v`.
    #[inline]
    pub fn incoming_halfedges(&self, v: VertexId) -> &[HalfedgeId] {
        &self.vertex(v).incoming
    }

    /// The canonical outgoing half-edge of `v`, derived as the `next` of the
    /// first incoming half-edge. `None` for an isolated vertex.
    pub fn outgoing_halfedge(&self, v: VertexId) -> Option<HalfedgeId> {
        self.vertex(v)
            .incoming
            .first()
            .map(|&h| self.next(h))
    }

    /// All outgoing half-edges of `v`, in pivot order.
    ///
    /// For an interior vertex the ring is closed and the walk wraps; for a
    /// boundary vertex the ring is open, so the walk first rewinds to the
    /// boundary-side start and then sweeps across the fan.
    pub fn circulate_vertex(&self, v: VertexId) -> Vec<HalfedgeId> {
        let Some(start) = self.outgoing_halfedge(v) else {
            return Vec::new();
        };
        // Rewind: step backward (over prev's twin) until hitting the
        // boundary or coming full circle.
        let mut first = start;
        let mut guard = 0usize;
        loop {
            let back = self.opp(self.prev(first));
            if !back.is_valid() {
                break;
            }
            first = back;
            if first == start {
                break;
            }
            guard += 1;
            assert!(
                guard < MAX_CIRCULATION,
                "circulation around {:?} does not terminate; topology is corrupt",
                v
            );
        }
        // Sweep forward.
        let mut out = Vec::new();
        let mut cur = first;
        loop {
            out.push(cur);
            let o = self.opp(cur);
            if !o.is_valid() {
                break;
            }
            let nxt = self.next(o);
            if nxt == first {
                break;
            }
            cur = nxt;
            assert!(
                out.len() < MAX_CIRCULATION,
                "circulation around {:?} does not terminate; topology is corrupt",
                v
            );
        }
        out
    }

    /// All incoming half-edges of `v`, in the same pivot order as
    /// [`HMesh::circulate_vertex`].
    pub fn circulate_vertex_incoming(&self, v: VertexId) -> Vec<HalfedgeId> {
        self.circulate_vertex(v)
            .into_iter()
            .map(|h| self.prev(h))
            .collect()
    }

    /// Whether `v` lies on the mesh boundary (any incident edge lacks a
    /// twin). Isolated vertices count as boundary.
    pub fn is_boundary_vertex(&self, v: VertexId) -> bool {
        let incoming = &self.vertex(v).incoming;
        if incoming.is_empty() {
            return true;
        }
        for &inc in incoming {
            if !self.opp(inc).is_valid() {
                return true;
            }
            let out = self.next(inc);
            if !self.opp(out).is_valid() {
                return true;
            }
        }
        false
    }

    /// The valency of `v`: the number of outgoing half-edges reachable by
    /// circulation.
    #[inline]
    pub fn vertex_valency(&self, v: VertexId) -> usize {
        self.circulate_vertex(v).len()
    }

    /// The distinct vertices adjacent to `v`, in pivot order. For a
    /// boundary vertex this includes the source of the incoming boundary
    /// edge, which circulation alone would miss.
    pub fn vertex_neighbors(&self, v: VertexId) -> Vec<VertexId> {
        let mut out = Vec::new();
        for h in self.circulate_vertex(v) {
            let w = self.vert(h);
            if w.is_valid() && !out.contains(&w) {
                out.push(w);
            }
        }
        for &inc in &self.vertex(v).incoming {
            let w = self.source(inc);
            if w.is_valid() && !out.contains(&w) {
                out.push(w);
            }
        }
        out
    }

    /// Find the half-edge connecting `v` to `other`, checking both
    /// circulation directions — a boundary vertex may only see the edge
    /// from one side.
    pub fn shared_edge(&self, v: VertexId, other: VertexId) -> Option<HalfedgeId> {
        for h in self.circulate_vertex(v) {
            if self.vert(h) == other {
                return Some(h);
            }
        }
        for h in self.circulate_vertex(other) {
            if self.vert(h) == v {
                return Some(h);
            }
        }
        None
    }

    /// Re-point every half-edge incoming at `v` to `new_vertex`.
    pub fn replace_vertex(&mut self, v: VertexId, new_vertex: VertexId) {
        let incoming = self.vertex(v).incoming.clone();
        for h in incoming {
            self.set_halfedge_vert(h, new_vertex);
        }
    }

    /// Remove a redundant vertex.
    ///
    /// * A boundary vertex with a single distinct neighbor (a dangling
    ///   spike tip) is spliced out.
    /// * A vertex with exactly two distinct neighbors has one of its edges
    ///   collapsed — the first incident half-edge with a twin, falling back
    ///   to the outgoing boundary edge. The choice among twins is
    ///   arbitrary.
    /// * A boundary vertex of higher valency has each incident face
    ///   dissolved.
    ///
    /// Returns `false` when none of these cases apply (conservative: an
    /// interior high-valency vertex is left alone).
    pub fn dissolve_vertex(&mut self, v: VertexId) -> bool {
        let neighbors = self.vertex_neighbors(v);
        match neighbors.len() {
            0 => false,
            1 => {
                if !self.is_boundary_vertex(v) {
                    return false;
                }
                self.splice_out_spike(v)
            }
            2 => {
                // Collapse one incident edge so the neighbors fuse the gap.
                let incoming = self.vertex(v).incoming.clone();
                for inc in incoming {
                    let o = self.opp(inc);
                    if o.is_valid() && !self.is_halfedge_destroyed(o) {
                        let keep = self.vert(o);
                        let p = self.position(keep);
                        self.collapse_edge_to(o, p);
                        return true;
                    }
                }
                // Pure boundary chain vertex: collapse the outgoing edge.
                if let Some(out) = self.outgoing_halfedge(v) {
                    let keep = self.vert(out);
                    let p = self.position(keep);
                    self.collapse_edge_to(out, p);
                    return true;
                }
                false
            }
            _ => {
                if !self.is_boundary_vertex(v) {
                    return false;
                }
                let faces: Vec<_> = self
                    .vertex(v)
                    .incoming
                    .clone()
                    .into_iter()
                    .map(|h| self.face_of(h))
                    .collect();
                for f in faces {
                    if f.is_valid() && !self.is_face_destroyed(f) {
                        self.dissolve_face(f);
                    }
                }
                true
            }
        }
    }

    /// Splice out a spike tip: a vertex whose incoming and outgoing
    /// half-edges connect to the same neighbor.
    fn splice_out_spike(&mut self, v: VertexId) -> bool {
        let incoming = self.vertex(v).incoming.clone();
        let Some(&inc) = incoming.first() else {
            return false;
        };
        let out = self.next(inc);
        debug_assert_eq!(self.vert(inc), v);
        let f = self.face_of(inc);
        let before = self.prev(inc);
        let after = self.next(out);
        if after == inc {
            // The face was just the spike: nothing left to keep.
            self.destroy_halfedge(inc);
            self.destroy_halfedge(out);
            if f.is_valid() && !self.is_face_destroyed(f) {
                self.destroy_face(f);
            }
            self.destroy_vertex(v);
            return true;
        }
        self.link_halfedges(before, after);
        if f.is_valid() && !self.is_face_destroyed(f) {
            let fh = self.face(f).halfedge;
            if fh == inc || fh == out {
                self.face_mut(f).halfedge = after;
            }
        }
        self.destroy_halfedge(inc);
        self.destroy_halfedge(out);
        self.destroy_vertex(v);
        if f.is_valid() && !self.is_face_destroyed(f) && self.face_edge_count(f) == 2 {
            self.dissolve_two_edge_face(f);
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mesh::validate::ValidationRules;

    fn two_triangle_quad() -> HMesh {
        // Two triangles sharing the diagonal 1-2.
        crate::io::obj::parse(
            "v 0 0 0\nv 1 0 0\nv 0 0 1\nv 1 0 1\nf 1 2 3\nf 2 4 3\n",
        )
        .unwrap()
    }

    #[test]
    fn test_circulate_interior_vertex() {
        // A fan of 4 triangles around a center vertex.
        let mesh = crate::io::obj::parse(
            "v 0 0 0\nv 1 0 0\nv 0 0 1\nv -1 0 0\nv 0 0 -1\nf 1 2 3\nf 1 3 4\nf 1 4 5\nf 1 5 2\n",
        )
        .unwrap();
        let center = mesh
            .vertex_ids()
            .find(|&v| mesh.position(v) == Point3::new(0.0, 0.0, 0.0))
            .unwrap();
        assert!(!mesh.is_boundary_vertex(center));
        assert_eq!(mesh.vertex_valency(center), 4);
        assert_eq!(mesh.circulate_vertex_incoming(center).len(), 4);
        for h in mesh.circulate_vertex(center) {
            assert_eq!(mesh.source(h), center);
        }
    }

    #[test]
    fn test_circulate_boundary_vertex() {
        let mesh = two_triangle_quad();
        // Vertex 2 (at 1,0,0) touches both triangles; its ring is open.
        let v = mesh
            .vertex_ids()
            .find(|&v| mesh.position(v) == Point3::new(1.0, 0.0, 0.0))
            .unwrap();
        assert!(mesh.is_boundary_vertex(v));
        let out = mesh.circulate_vertex(v);
        assert_eq!(out.len(), 2);
        // Three neighbors: both quad corners plus the other diagonal end.
        assert_eq!(mesh.vertex_neighbors(v).len(), 3);
    }

    #[test]
    fn test_shared_edge_both_directions() {
        let mesh = two_triangle_quad();
        let a = mesh
            .vertex_ids()
            .find(|&v| mesh.position(v) == Point3::new(1.0, 0.0, 0.0))
            .unwrap();
        let b = mesh
            .vertex_ids()
            .find(|&v| mesh.position(v) == Point3::new(0.0, 0.0, 1.0))
            .unwrap();
        let h = mesh.shared_edge(a, b).expect("diagonal must be found");
        let endpoints = [mesh.source(h), mesh.vert(h)];
        assert!(endpoints.contains(&a) && endpoints.contains(&b));

        let c = mesh
            .vertex_ids()
            .find(|&v| mesh.position(v) == Point3::new(0.0, 0.0, 0.0))
            .unwrap();
        let d = mesh
            .vertex_ids()
            .find(|&v| mesh.position(v) == Point3::new(1.0, 0.0, 1.0))
            .unwrap();
        assert!(mesh.shared_edge(c, d).is_none());
    }

    #[test]
    fn test_replace_vertex() {
        let mut mesh = two_triangle_quad();
        let a = mesh
            .vertex_ids()
            .find(|&v| mesh.position(v) == Point3::new(0.0, 0.0, 0.0))
            .unwrap();
        let b = mesh
            .vertex_ids()
            .find(|&v| mesh.position(v) == Point3::new(1.0, 0.0, 1.0))
            .unwrap();
        let moved = mesh.incoming_halfedges(a).len();
        mesh.replace_vertex(a, b);
        assert!(mesh.incoming_halfedges(a).is_empty());
        for h in mesh.halfedge_ids() {
            assert_ne!(mesh.vert(h), a);
        }
        assert!(mesh.incoming_halfedges(b).len() >= moved);
    }

    #[test]
    fn test_dissolve_boundary_chain_vertex() {
        // A quad face with one edge split: the mid vertex is redundant.
        let mut mesh = HMesh::create_test_mesh_quad();
        let h = mesh.halfedge_ids().next().unwrap();
        let w = mesh.split_edge(h, 0.5);
        assert_eq!(mesh.face_edge_count(mesh.face_ids().next().unwrap()), 5);
        assert!(mesh.dissolve_vertex(w));
        assert!(mesh.is_vertex_destroyed(w));
        assert_eq!(mesh.face_edge_count(mesh.face_ids().next().unwrap()), 4);
        assert!(mesh.is_valid(ValidationRules::STANDARD));
    }
}
