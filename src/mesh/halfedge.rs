//! Half-edge entity and edge-centric operations.
//!
//! A half-edge is a directed edge pointing toward its `vert`. `next`/`prev`
//! form a closed cycle around exactly one face; `opp` is the twin running
//! the other way, or invalid on a boundary. The operations here — link,
//! glue, collapse, flip, split — are the mutation primitives everything
//! else in the crate is built from.

use bitflags::bitflags;
use nalgebra::{Point3, Vector3};

use super::hmesh::{HMesh, MAX_CIRCULATION};
use super::index::{FaceId, HalfedgeId, VertexId};

/// A directed mesh edge.
#[derive(Debug, Clone)]
pub struct Halfedge {
    /// Next half-edge around the face (counter-clockwise).
    pub next: HalfedgeId,
    /// Previous half-edge around the face.
    pub prev: HalfedgeId,
    /// The twin half-edge, or invalid on a boundary edge.
    pub opp: HalfedgeId,
    /// The vertex this half-edge points toward.
    pub vert: VertexId,
    /// The face this half-edge bounds.
    pub face: FaceId,
    /// Scratch field (sharp-edge marking and similar).
    pub label: i32,
}

impl Halfedge {
    pub(crate) fn new() -> Self {
        Self {
            next: HalfedgeId::invalid(),
            prev: HalfedgeId::invalid(),
            opp: HalfedgeId::invalid(),
            vert: VertexId::invalid(),
            face: FaceId::invalid(),
            label: 0,
        }
    }
}

bitflags! {
    /// Reasons an edge collapse would be illegal, returned by
    /// [`HMesh::collapse_precondition`]. Empty means the collapse is safe.
    ///
    /// Callers pass the set of checks they care about; only those bits can
    /// come back.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct CollapseReason: u32 {
        /// The edge has no twin and the caller asked boundary edges to be
        /// rejected.
        const EDGE_IS_BOUNDARY = 1;
        /// Either endpoint lies on the mesh boundary.
        const VERTEX_IS_BOUNDARY = 1 << 1;
        /// Some face incident to the removed vertex would have its
        /// orientation inverted by the move.
        const NORMAL_FLIPPED = 1 << 2;
        /// The new position would be colinear with a neighboring edge,
        /// within the mesh's zero-magnitude threshold.
        const COLLAPSE_POINT_TOO_CLOSE_TO_LINE = 1 << 3;
    }
}

impl HMesh {
    // ==================== Linking ====================

    /// Link two half-edges in sequence: `a.next = b; b.prev = a`.
    ///
    /// Panics when `a == b` — a self-loop link is always a bug in the
    /// calling algorithm.
    pub fn link_halfedges(&mut self, a: HalfedgeId, b: HalfedgeId) {
        assert_ne!(a, b, "linking half-edge {:?} to itself", a);
        self.halfedge_mut(a).next = b;
        self.halfedge_mut(b).prev = a;
    }

    /// Attach a half-edge to a face and make it the face's canonical
    /// half-edge.
    pub fn link_halfedge_face(&mut self, h: HalfedgeId, f: FaceId) {
        self.halfedge_mut(h).face = f;
        self.face_mut(f).halfedge = h;
    }

    /// Glue two half-edges as twins.
    pub fn glue(&mut self, a: HalfedgeId, b: HalfedgeId) {
        debug_assert_ne!(a, b, "gluing half-edge {:?} to itself", a);
        self.halfedge_mut(a).opp = b;
        self.halfedge_mut(b).opp = a;
    }

    /// Glue with nullable operands: both present glues them, a single
    /// present side becomes a boundary edge, nothing happens when both are
    /// absent.
    pub fn glue_opt(&mut self, a: Option<HalfedgeId>, b: Option<HalfedgeId>) {
        match (a, b) {
            (Some(a), Some(b)) => self.glue(a, b),
            (Some(a), None) => self.halfedge_mut(a).opp = HalfedgeId::invalid(),
            (None, Some(b)) => self.halfedge_mut(b).opp = HalfedgeId::invalid(),
            (None, None) => {}
        }
    }

    // ==================== Queries ====================

    /// Whether the half-edge lies on the mesh boundary (no twin).
    #[inline]
    pub fn is_boundary_halfedge(&self, h: HalfedgeId) -> bool {
        !self.opp(h).is_valid()
    }

    /// The (unnormalized) direction of the half-edge.
    #[inline]
    pub fn halfedge_direction(&self, h: HalfedgeId) -> Vector3<f64> {
        self.position(self.vert(h)) - self.position(self.source(h))
    }

    /// The midpoint of the half-edge.
    #[inline]
    pub fn halfedge_center(&self, h: HalfedgeId) -> Point3<f64> {
        let a = self.position(self.source(h));
        let b = self.position(self.vert(h));
        Point3::from((a.coords + b.coords) * 0.5)
    }

    /// Squared length of the half-edge.
    #[inline]
    pub fn halfedge_length_sqr(&self, h: HalfedgeId) -> f64 {
        self.halfedge_direction(h).norm_squared()
    }

    /// All incoming half-edges at this half-edge's target vertex, in pivot
    /// order (boundary-aware). Convenience anchor for callers holding an
    /// edge rather than a vertex.
    pub fn circulate_vertex_from(&self, h: HalfedgeId) -> Vec<HalfedgeId> {
        self.circulate_vertex_incoming(self.vert(h))
    }

    // ==================== Collapse ====================

    /// Collapse this edge, merging its endpoints into the target vertex.
    /// With `center == true` the survivor moves to the edge midpoint;
    /// otherwise it stays where it is.
    pub fn collapse_edge(&mut self, h: HalfedgeId, center: bool) -> Option<VertexId> {
        let target = if center {
            self.halfedge_center(h)
        } else {
            self.position(self.vert(h))
        };
        self.collapse_edge_to(h, target)
    }

    /// Collapse this edge, placing the surviving vertex at `position`.
    ///
    /// The source vertex is removed and every half-edge incident to it is
    /// re-pointed at the target vertex; the edge (and its twin) is spliced
    /// out and any adjacent face degenerating to two edges is dissolved.
    ///
    /// When the faces dying with the edge are all that is left of the mesh,
    /// collapsing would produce an invalid residue of fewer than three
    /// vertices — the mesh is cleared entirely instead and `None` is
    /// returned.
    pub fn collapse_edge_to(&mut self, h: HalfedgeId, position: Point3<f64>) -> Option<VertexId> {
        assert!(
            !self.is_halfedge_destroyed(h),
            "collapsing destroyed half-edge {:?}",
            h
        );
        let o = self.opp(h);
        let v_keep = self.vert(h);
        let v_dead = self.source(h);
        debug_assert_ne!(v_keep, v_dead, "collapsing a self-loop {:?}", h);

        let f1 = self.face_of(h);
        let f2 = if o.is_valid() {
            self.face_of(o)
        } else {
            FaceId::invalid()
        };

        // Faces of three or fewer edges die with the edge. If that is every
        // remaining face, the whole mesh degenerates.
        let mut dying = 0;
        if f1.is_valid() && !self.is_face_destroyed(f1) && self.face_edge_count(f1) <= 3 {
            dying += 1;
        }
        if f2.is_valid() && f2 != f1 && !self.is_face_destroyed(f2) && self.face_edge_count(f2) <= 3
        {
            dying += 1;
        }
        if dying == self.face_count() {
            self.clear();
            return None;
        }

        // Splice the edge out of both face cycles.
        let hp = self.prev(h);
        let hn = self.next(h);
        self.link_halfedges(hp, hn);
        if f1.is_valid() && !self.is_face_destroyed(f1) && self.face(f1).halfedge == h {
            self.face_mut(f1).halfedge = hn;
        }
        if o.is_valid() {
            let op = self.prev(o);
            let on = self.next(o);
            self.link_halfedges(op, on);
            if f2.is_valid() && !self.is_face_destroyed(f2) && self.face(f2).halfedge == o {
                self.face_mut(f2).halfedge = on;
            }
        }
        self.destroy_halfedge(h);
        if o.is_valid() {
            self.destroy_halfedge(o);
        }

        self.replace_vertex(v_dead, v_keep);
        self.destroy_vertex(v_dead);
        self.set_position(v_keep, position);

        // The adjacent faces may have degenerated to slits.
        for f in [f1, f2] {
            if f.is_valid() && !self.is_face_destroyed(f) && self.face_edge_count(f) == 2 {
                self.dissolve_two_edge_face(f);
            }
        }
        Some(v_keep)
    }

    /// Non-mutating legality check for [`HMesh::collapse_edge_to`].
    ///
    /// `checks` selects which reasons matter to the caller; the returned
    /// set is the subset that fired. Empty means the collapse is safe under
    /// the requested checks.
    pub fn collapse_precondition(
        &self,
        h: HalfedgeId,
        new_position: Point3<f64>,
        checks: CollapseReason,
    ) -> CollapseReason {
        let mut reasons = CollapseReason::empty();
        let o = self.opp(h);
        let v_dead = self.source(h);
        let v_keep = self.vert(h);

        if checks.contains(CollapseReason::EDGE_IS_BOUNDARY) && !o.is_valid() {
            reasons |= CollapseReason::EDGE_IS_BOUNDARY;
        }
        if checks.contains(CollapseReason::VERTEX_IS_BOUNDARY)
            && (self.is_boundary_vertex(v_dead) || self.is_boundary_vertex(v_keep))
        {
            reasons |= CollapseReason::VERTEX_IS_BOUNDARY;
        }

        let wants_normal = checks.contains(CollapseReason::NORMAL_FLIPPED);
        let wants_line = checks.contains(CollapseReason::COLLAPSE_POINT_TOO_CLOSE_TO_LINE);
        if wants_normal || wants_line {
            let f1 = self.face_of(h);
            let f2 = if o.is_valid() {
                self.face_of(o)
            } else {
                FaceId::invalid()
            };
            let threshold = self.config.zero_magnitude_threshold;
            let mut seen: Vec<FaceId> = Vec::new();
            for &inc in self.incoming_halfedges(v_dead) {
                let f = self.face_of(inc);
                if !f.is_valid() || f == f1 || f == f2 || self.is_face_destroyed(f) {
                    continue;
                }
                if seen.contains(&f) {
                    continue;
                }
                seen.push(f);
                if wants_normal {
                    let before = self.face_normal(f);
                    let after = self.face_normal_with_vertex_at(f, v_dead, new_position);
                    if before.dot(&after) <= 0.0 {
                        reasons |= CollapseReason::NORMAL_FLIPPED;
                    }
                }
                if wants_line {
                    // Each edge of the face not touching the moved vertex
                    // must keep its distance.
                    for fh in self.circulate_face(f) {
                        if self.vert(fh) == v_dead || self.source(fh) == v_dead {
                            continue;
                        }
                        let a = self.position(self.source(fh));
                        let b = self.position(self.vert(fh));
                        if point_line_distance(new_position, a, b) < threshold {
                            reasons |= CollapseReason::COLLAPSE_POINT_TOO_CLOSE_TO_LINE;
                        }
                    }
                }
            }
        }
        reasons
    }

    // ==================== Flip ====================

    /// Whether [`HMesh::flip_edge`] may be applied to this edge.
    ///
    /// Requires an interior edge between two triangles, endpoints that do
    /// not drop below valency 4 (unless on the boundary), and apex vertices
    /// that are not already connected — flipping would duplicate that edge.
    pub fn flip_precondition(&self, h: HalfedgeId) -> bool {
        let o = self.opp(h);
        if !o.is_valid() || self.is_halfedge_destroyed(o) {
            return false;
        }
        if self.face_edge_count(self.face_of(h)) != 3 || self.face_edge_count(self.face_of(o)) != 3
        {
            return false;
        }
        for v in [self.source(h), self.vert(h)] {
            if !self.is_boundary_vertex(v) && self.vertex_valency(v) < 5 {
                return false;
            }
        }
        let c = self.vert(self.next(h));
        let d = self.vert(self.next(o));
        if self.shared_edge(c, d).is_some() {
            return false;
        }
        true
    }

    /// Flip an interior edge shared by two triangles: the diagonal A–B of
    /// the union quadrilateral becomes the other diagonal C–D.
    ///
    /// ```text
    ///      C                 C
    ///     / \               /|\
    ///    /   \             / | \
    ///   A-----B    ->     A  |  B
    ///    \   /             \ | /
    ///     \ /               \|/
    ///      D                 D
    /// ```
    ///
    /// Callers check [`HMesh::flip_precondition`] first; flipping an
    /// ineligible edge corrupts the mesh.
    pub fn flip_edge(&mut self, h: HalfedgeId) {
        let o = self.opp(h);
        debug_assert!(o.is_valid(), "flipping boundary edge {:?}", h);
        let f1 = self.face_of(h);
        let f2 = self.face_of(o);

        let hn = self.next(h); // B -> C
        let hp = self.prev(h); // C -> A
        let on = self.next(o); // A -> D
        let op = self.prev(o); // D -> B

        let c = self.vert(hn);
        let d = self.vert(on);

        // h becomes D -> C in face 1 (A, D, C); o becomes C -> D in
        // face 2 (B, C, D).
        self.set_halfedge_vert(h, c);
        self.set_halfedge_vert(o, d);

        self.link_halfedges(on, h);
        self.link_halfedges(h, hp);
        self.link_halfedges(hp, on);

        self.link_halfedges(hn, o);
        self.link_halfedges(o, op);
        self.link_halfedges(op, hn);

        self.halfedge_mut(on).face = f1;
        self.halfedge_mut(h).face = f1;
        self.halfedge_mut(hp).face = f1;
        self.face_mut(f1).halfedge = h;

        self.halfedge_mut(hn).face = f2;
        self.halfedge_mut(o).face = f2;
        self.halfedge_mut(op).face = f2;
        self.face_mut(f2).halfedge = o;
    }

    // ==================== Split ====================

    /// Insert a vertex on this edge at the given fraction of the way from
    /// source to target, splitting the half-edge (and its twin) in two.
    ///
    /// Position and both UV channels are interpolated. Face topology is
    /// otherwise untouched: each adjacent face gains one boundary edge and
    /// remains a single face. Returns the new vertex.
    pub fn split_edge(&mut self, h: HalfedgeId, fraction: f64) -> VertexId {
        let o = self.opp(h);
        let v1 = self.source(h);
        let v2 = self.vert(h);

        let (position, uv1, uv2) = self.interpolate_attributes(v1, v2, fraction);
        let w = self.create_vertex_at(position);
        {
            let vert = self.vertex_mut(w);
            vert.uv1 = uv1;
            vert.uv2 = uv2;
        }

        // h keeps the first span (v1 -> w); nh continues to v2.
        let nh = self.create_halfedge();
        let hn = self.next(h);
        self.halfedge_mut(nh).face = self.face_of(h);
        self.set_halfedge_vert(nh, v2);
        self.set_halfedge_vert(h, w);
        self.link_halfedges(h, nh);
        self.link_halfedges(nh, hn);

        if o.is_valid() {
            // o keeps the span v2 -> w; no continues to v1.
            let no = self.create_halfedge();
            let on = self.next(o);
            self.halfedge_mut(no).face = self.face_of(o);
            self.set_halfedge_vert(no, v1);
            self.set_halfedge_vert(o, w);
            self.link_halfedges(o, no);
            self.link_halfedges(no, on);

            self.glue(h, no);
            self.glue(nh, o);
        }
        w
    }

    /// Split this edge and keep the adjacent faces triangulated by cutting
    /// from the new vertex to every visible non-adjacent vertex.
    ///
    /// On a pair of triangles this turns 2 faces into 4. Returns the new
    /// vertex.
    pub fn split_and_cut(&mut self, h: HalfedgeId, fraction: f64) -> VertexId {
        let o = self.opp(h);
        let f1 = self.face_of(h);
        let f2 = if o.is_valid() {
            self.face_of(o)
        } else {
            FaceId::invalid()
        };
        let w = self.split_edge(h, fraction);
        for f in [f1, f2] {
            if !f.is_valid() || self.is_face_destroyed(f) {
                continue;
            }
            self.fan_from_vertex(f, w);
        }
        w
    }

    /// Repeatedly cut `f` from `w` to the vertex two steps ahead until the
    /// piece containing `w` is a triangle.
    pub(crate) fn fan_from_vertex(&mut self, f: FaceId, w: VertexId) {
        let mut guard = 0usize;
        let mut f = f;
        loop {
            if self.is_face_destroyed(f) || self.face_edge_count(f) <= 3 {
                return;
            }
            let Some(hw) = self.circulate_face(f).into_iter().find(|&h| self.vert(h) == w) else {
                return;
            };
            let target = self.vert(self.next(self.next(hw)));
            let piece = self.cut_face(f, w, target);
            if piece == f {
                return; // cut refused; don't loop on it
            }
            // cut_face leaves the remainder on `f` and the clipped triangle
            // on the new face.
            guard += 1;
            assert!(guard < MAX_CIRCULATION, "fan cut from {:?} does not terminate", w);
            f = if self.is_face_destroyed(f) { piece } else { f };
        }
    }

    // ==================== Boundary loops ====================

    /// Walk the boundary loop containing this boundary half-edge, in order.
    pub fn circulate_boundary(&self, h: HalfedgeId) -> Vec<HalfedgeId> {
        assert!(
            self.is_boundary_halfedge(h),
            "{:?} is not a boundary half-edge",
            h
        );
        let mut out = Vec::new();
        let mut cur = h;
        loop {
            out.push(cur);
            // The next boundary edge leaves the vertex this one points at:
            // pivot over twins until the fan runs out.
            let mut next = self.next(cur);
            let mut guard = 0usize;
            while self.opp(next).is_valid() {
                next = self.next(self.opp(next));
                guard += 1;
                assert!(
                    guard < MAX_CIRCULATION,
                    "boundary walk around {:?} does not terminate",
                    cur
                );
            }
            cur = next;
            if cur == h {
                break;
            }
            assert!(
                out.len() < MAX_CIRCULATION,
                "boundary loop from {:?} does not terminate",
                h
            );
        }
        out
    }

    /// Merge every vertex on the boundary loop through `h` into a single
    /// vertex at `position`, destroying the loop edges and repairing the
    /// faces they leave behind. Returns the surviving vertex.
    ///
    /// Used when fully collapsing a face: detaching the face leaves a hole
    /// whose rim this closes to a point.
    pub fn collapse_boundary_loop(&mut self, h: HalfedgeId, position: Point3<f64>) -> VertexId {
        let loop_hes = self.circulate_boundary(h);
        let survivor = self.vert(h);

        // Fuse the rim vertices.
        let mut rim: Vec<VertexId> = Vec::new();
        for &he in &loop_hes {
            let v = self.vert(he);
            if v.is_valid() && v != survivor && !rim.contains(&v) {
                rim.push(v);
            }
        }
        for v in rim {
            self.replace_vertex(v, survivor);
            self.destroy_vertex(v);
        }

        // Splice every loop edge out of its face.
        let mut affected: Vec<FaceId> = Vec::new();
        for &he in &loop_hes {
            if self.is_halfedge_destroyed(he) {
                continue;
            }
            let f = self.face_of(he);
            let p = self.prev(he);
            let n = self.next(he);
            if n == he {
                self.destroy_halfedge(he);
                if f.is_valid() && !self.is_face_destroyed(f) {
                    self.destroy_face(f);
                }
                continue;
            }
            if p == n {
                // 2-gon: removing one edge leaves a self-loop; drop both.
                self.destroy_halfedge(he);
                self.destroy_halfedge(p);
                if f.is_valid() && !self.is_face_destroyed(f) {
                    self.destroy_face(f);
                }
                continue;
            }
            self.link_halfedges(p, n);
            if f.is_valid() && !self.is_face_destroyed(f) && self.face(f).halfedge == he {
                self.face_mut(f).halfedge = n;
            }
            self.destroy_halfedge(he);
            if f.is_valid() && !affected.contains(&f) {
                affected.push(f);
            }
        }

        // Faces that lost edges may have degenerated.
        for f in affected {
            if self.is_face_destroyed(f) {
                continue;
            }
            match self.face_edge_count(f) {
                2 => self.dissolve_two_edge_face(f),
                1 => {
                    let lone = self.face(f).halfedge;
                    self.destroy_halfedge(lone);
                    self.destroy_face(f);
                }
                _ => {}
            }
        }

        if !self.is_vertex_destroyed(survivor) {
            self.set_position(survivor, position);
            if self.incoming_halfedges(survivor).is_empty() {
                self.destroy_vertex(survivor);
            }
        }
        survivor
    }

    /// Newell-style face normal with one vertex's position overridden.
    /// Used by collapse preconditions to test a move without mutating.
    pub(crate) fn face_normal_with_vertex_at(
        &self,
        f: FaceId,
        v: VertexId,
        at: Point3<f64>,
    ) -> Vector3<f64> {
        let cycle = self.circulate_face(f);
        let positions: Vec<Point3<f64>> = cycle
            .iter()
            .map(|&h| {
                let w = self.vert(h);
                if w == v {
                    at
                } else {
                    self.position(w)
                }
            })
            .collect();
        normal_of_polygon(&positions)
    }
}

/// Accumulated cross-product normal of a polygon given by its vertex
/// positions in cycle order. Zero when degenerate.
pub(crate) fn normal_of_polygon(positions: &[Point3<f64>]) -> Vector3<f64> {
    let n = positions.len();
    if n < 3 {
        return Vector3::zeros();
    }
    let mut sum = Vector3::zeros();
    for i in 0..n {
        let p0 = positions[i];
        let p1 = positions[(i + 1) % n];
        let p2 = positions[(i + 2) % n];
        sum += (p1 - p0).cross(&(p2 - p1));
    }
    let len = sum.norm();
    if len > 0.0 {
        sum / len
    } else {
        Vector3::zeros()
    }
}

/// Distance from `p` to the infinite line through `a` and `b`. Falls back
/// to the distance to `a` when the segment is degenerate.
pub(crate) fn point_line_distance(p: Point3<f64>, a: Point3<f64>, b: Point3<f64>) -> f64 {
    let ab = b - a;
    let len_sqr = ab.norm_squared();
    if len_sqr == 0.0 {
        return (p - a).norm();
    }
    (p - a).cross(&ab).norm() / len_sqr.sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mesh::validate::ValidationRules;

    /// The two-triangle quad from the OBJ subset: faces `2 3 1` and `2 4 3`.
    fn quad_obj() -> HMesh {
        crate::io::obj::parse(
            "v -1 0 1\nv 1 0 1\nv -1 0 -1\nv 1 0 -1\nf 2 3 1\nf 2 4 3\n",
        )
        .unwrap()
    }

    fn find_vertex(mesh: &HMesh, p: Point3<f64>) -> VertexId {
        mesh.vertex_ids()
            .find(|&v| (mesh.position(v) - p).norm() < 1e-12)
            .expect("vertex not found")
    }

    #[test]
    #[should_panic(expected = "itself")]
    fn test_self_link_panics() {
        let mut mesh = HMesh::new();
        let h = mesh.create_halfedge();
        mesh.link_halfedges(h, h);
    }

    #[test]
    fn test_glue_symmetry() {
        let mut mesh = HMesh::new();
        let a = mesh.create_halfedge();
        let b = mesh.create_halfedge();
        mesh.glue(a, b);
        assert_eq!(mesh.opp(a), b);
        assert_eq!(mesh.opp(b), a);
        mesh.glue_opt(Some(a), None);
        assert!(!mesh.opp(a).is_valid());
    }

    #[test]
    fn test_collapse_quad_top_edge() {
        // Collapsing the top edge of the two-triangle quad must leave a
        // single valid triangle.
        let mut mesh = quad_obj();
        let v1 = find_vertex(&mesh, Point3::new(-1.0, 0.0, 1.0));
        let v2 = find_vertex(&mesh, Point3::new(1.0, 0.0, 1.0));
        let h = mesh.shared_edge(v1, v2).expect("top edge exists");
        let kept = mesh.collapse_edge_to(h, Point3::new(-1.0, 0.0, 1.0));
        assert!(kept.is_some());
        assert_eq!(mesh.vertex_count(), 3);
        assert_eq!(mesh.halfedge_count(), 3);
        assert_eq!(mesh.face_count(), 1);
        assert!(mesh.is_valid(ValidationRules::STANDARD));
    }

    #[test]
    fn test_collapse_diagonal_clears_mesh() {
        // Both triangles die with the shared diagonal; rather than leave a
        // two-vertex residue the mesh empties.
        let mut mesh = quad_obj();
        let v2 = find_vertex(&mesh, Point3::new(1.0, 0.0, 1.0));
        let v3 = find_vertex(&mesh, Point3::new(-1.0, 0.0, -1.0));
        let h = mesh.shared_edge(v2, v3).expect("diagonal exists");
        assert!(!mesh.is_boundary_halfedge(h));
        let kept = mesh.collapse_edge(h, true);
        assert!(kept.is_none());
        assert_eq!(mesh.vertex_count(), 0);
        assert_eq!(mesh.face_count(), 0);
        assert_eq!(mesh.halfedge_count(), 0);
    }

    #[test]
    fn test_collapse_precondition_boundary_bits() {
        let mesh = quad_obj();
        let v1 = find_vertex(&mesh, Point3::new(-1.0, 0.0, 1.0));
        let v2 = find_vertex(&mesh, Point3::new(1.0, 0.0, 1.0));
        let h = mesh.shared_edge(v1, v2).unwrap();
        let all = CollapseReason::all();
        let reasons = mesh.collapse_precondition(h, mesh.halfedge_center(h), all);
        assert!(reasons.contains(CollapseReason::EDGE_IS_BOUNDARY));
        assert!(reasons.contains(CollapseReason::VERTEX_IS_BOUNDARY));

        // Without the boundary checks requested, the same collapse is Ok.
        let reasons = mesh.collapse_precondition(
            h,
            mesh.halfedge_center(h),
            CollapseReason::NORMAL_FLIPPED,
        );
        assert!(reasons.is_empty());
    }

    #[test]
    fn test_split_edge_boundary() {
        let mut mesh = HMesh::create_test_mesh_triangle();
        let h = mesh.halfedge_ids().next().unwrap();
        let w = mesh.split_edge(h, 0.5);
        assert_eq!(mesh.vertex_count(), 4);
        assert_eq!(mesh.halfedge_count(), 4);
        assert_eq!(mesh.face_count(), 1);
        assert_eq!(
            mesh.face_edge_count(mesh.face_ids().next().unwrap()),
            4
        );
        assert!(!mesh.is_vertex_destroyed(w));
        assert!(mesh.is_valid(ValidationRules::STANDARD));
    }

    #[test]
    fn test_split_edge_interior_reglues() {
        let mut mesh = quad_obj();
        let v2 = find_vertex(&mesh, Point3::new(1.0, 0.0, 1.0));
        let v3 = find_vertex(&mesh, Point3::new(-1.0, 0.0, -1.0));
        let h = mesh.shared_edge(v2, v3).unwrap();
        let w = mesh.split_edge(h, 0.25);
        assert_eq!(mesh.vertex_count(), 5);
        assert!(mesh.is_valid(ValidationRules::STANDARD));
        // The new vertex sits on the interior diagonal with both spans glued.
        assert_eq!(mesh.vertex_valency(w), 2);
        assert!(!mesh.is_boundary_vertex(w));
    }

    #[test]
    fn test_split_and_cut_yields_four_triangles() {
        let mut mesh = quad_obj();
        let v2 = find_vertex(&mesh, Point3::new(1.0, 0.0, 1.0));
        let v3 = find_vertex(&mesh, Point3::new(-1.0, 0.0, -1.0));
        let h = mesh.shared_edge(v2, v3).unwrap();
        mesh.split_and_cut(h, 0.5);
        assert_eq!(mesh.face_count(), 4);
        for f in mesh.face_ids() {
            assert_eq!(mesh.face_edge_count(f), 3);
        }
        assert!(mesh.is_valid(ValidationRules::STANDARD));
    }

    #[test]
    fn test_flip_involution() {
        let mut mesh = quad_obj();
        let v2 = find_vertex(&mesh, Point3::new(1.0, 0.0, 1.0));
        let v3 = find_vertex(&mesh, Point3::new(-1.0, 0.0, -1.0));
        let h = mesh.shared_edge(v2, v3).unwrap();
        assert!(mesh.flip_precondition(h));
        mesh.flip_edge(h);
        assert!(mesh.is_valid(ValidationRules::STANDARD));
        // The diagonal now connects the other pair of corners.
        let v1 = find_vertex(&mesh, Point3::new(-1.0, 0.0, 1.0));
        let v4 = find_vertex(&mesh, Point3::new(1.0, 0.0, -1.0));
        let flipped = mesh.shared_edge(v1, v4).expect("new diagonal exists");
        assert!(mesh.shared_edge(v2, v3).is_none());
        // Flip back: original adjacency returns.
        assert!(mesh.flip_precondition(flipped));
        mesh.flip_edge(flipped);
        assert!(mesh.is_valid(ValidationRules::STANDARD));
        assert!(mesh.shared_edge(v2, v3).is_some());
        assert!(mesh.shared_edge(v1, v4).is_none());
    }

    #[test]
    fn test_circulate_boundary_loop() {
        let mesh = quad_obj();
        let boundary = mesh
            .halfedge_ids()
            .find(|&h| mesh.is_boundary_halfedge(h))
            .unwrap();
        let hole = mesh.circulate_boundary(boundary);
        // The quad's rim is four boundary edges.
        assert_eq!(hole.len(), 4);
        for &h in &hole {
            assert!(mesh.is_boundary_halfedge(h));
        }
    }
}
