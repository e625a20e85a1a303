//! Face entity and face-centric operations.
//!
//! A face is a polygon boundary: the cycle of half-edges reachable via
//! `next` from its canonical half-edge. Degenerate states — two-edge slits,
//! zero-area polygons, collinear boundaries — are representable on purpose;
//! the repair routines here (and in `algo::simplify`) remove them instead
//! of the kernel pretending they cannot occur.

use nalgebra::{Point3, Vector3};
use tracing::warn;

use super::halfedge::{normal_of_polygon, point_line_distance};
use super::hmesh::{HMesh, MAX_CIRCULATION};
use super::index::{FaceId, HalfedgeId, VertexId};

/// A polygon face: one half-edge on its boundary plus a label used as
/// material/region/submesh id.
#[derive(Debug, Clone)]
pub struct Face {
    /// One half-edge on the boundary of this face.
    pub halfedge: HalfedgeId,
    /// Material/region/submesh id.
    pub label: i32,
}

impl Face {
    pub(crate) fn new() -> Self {
        Self {
            halfedge: HalfedgeId::invalid(),
            label: 0,
        }
    }
}

impl HMesh {
    // ==================== Circulation ====================

    /// The ordered boundary half-edges of `f`, starting from its canonical
    /// half-edge.
    pub fn circulate_face(&self, f: FaceId) -> Vec<HalfedgeId> {
        let start = self.face(f).halfedge;
        if !start.is_valid() {
            return Vec::new();
        }
        let mut out = Vec::new();
        let mut cur = start;
        loop {
            out.push(cur);
            cur = self.next(cur);
            if cur == start {
                break;
            }
            assert!(
                out.len() < MAX_CIRCULATION,
                "face {:?} boundary does not close; topology is corrupt",
                f
            );
        }
        out
    }

    /// Number of edges bounding `f`.
    pub fn face_edge_count(&self, f: FaceId) -> usize {
        self.circulate_face(f).len()
    }

    /// The boundary vertices of `f`, in cycle order.
    pub fn face_vertices(&self, f: FaceId) -> Vec<VertexId> {
        self.circulate_face(f)
            .into_iter()
            .map(|h| self.vert(h))
            .collect()
    }

    /// The mean of the boundary vertex positions.
    pub fn face_center(&self, f: FaceId) -> Point3<f64> {
        let vs = self.face_vertices(f);
        let mut sum = Vector3::zeros();
        for &v in &vs {
            sum += self.position(v).coords;
        }
        Point3::from(sum / vs.len() as f64)
    }

    // ==================== Geometry ====================

    /// The face normal, accumulated from cross products of consecutive
    /// independent edge directions and normalized. Returns the zero vector
    /// when the face is degenerate (no two independent directions).
    pub fn face_normal(&self, f: FaceId) -> Vector3<f64> {
        let positions: Vec<Point3<f64>> = self
            .face_vertices(f)
            .into_iter()
            .map(|v| self.position(v))
            .collect();
        normal_of_polygon(&positions)
    }

    /// Whether the face has a zero normal.
    #[inline]
    pub fn face_is_degenerate(&self, f: FaceId) -> bool {
        self.face_normal(f) == Vector3::zeros()
    }

    /// Area of the (assumed planar) polygon.
    pub fn face_area(&self, f: FaceId) -> f64 {
        let positions: Vec<Point3<f64>> = self
            .face_vertices(f)
            .into_iter()
            .map(|v| self.position(v))
            .collect();
        if positions.len() < 3 {
            return 0.0;
        }
        let origin = positions[0];
        let mut sum = Vector3::zeros();
        for i in 1..positions.len() - 1 {
            sum += (positions[i] - origin).cross(&(positions[i + 1] - origin));
        }
        0.5 * sum.norm()
    }

    // ==================== Cutting ====================

    /// Cut `f` in two along the chord from `v1` to `v2`.
    ///
    /// Both vertices must lie on the face boundary and must not be
    /// adjacent — cutting along an existing edge is refused with a warning
    /// and `f` is returned unchanged. The chord is assumed not to leave the
    /// polygon; non-convex cuts are the caller's responsibility.
    ///
    /// `f` keeps the part on the `v1 -> v2` side of the chord; the rest
    /// becomes a new face (same label) which is returned.
    pub fn cut_face(&mut self, f: FaceId, v1: VertexId, v2: VertexId) -> FaceId {
        let cycle = self.circulate_face(f);
        let Some(&he_a) = cycle.iter().find(|&&h| self.vert(h) == v1) else {
            warn!(face = ?f, vertex = ?v1, "cut vertex is not on the face; cut refused");
            return f;
        };
        let Some(&he_b) = cycle.iter().find(|&&h| self.vert(h) == v2) else {
            warn!(face = ?f, vertex = ?v2, "cut vertex is not on the face; cut refused");
            return f;
        };
        if self.vert(self.next(he_a)) == v2 || self.vert(self.next(he_b)) == v1 {
            warn!(face = ?f, from = ?v1, to = ?v2, "cut between adjacent vertices is a no-op");
            return f;
        }

        let a_next = self.next(he_a);
        let b_next = self.next(he_b);
        let label = self.face(f).label;

        let d1 = self.create_halfedge(); // v1 -> v2, stays in f
        let d2 = self.create_halfedge(); // v2 -> v1, bounds the new face
        self.set_halfedge_vert(d1, v2);
        self.set_halfedge_vert(d2, v1);
        self.glue(d1, d2);

        self.link_halfedges(he_a, d1);
        self.link_halfedges(d1, b_next);
        self.link_halfedges(he_b, d2);
        self.link_halfedges(d2, a_next);

        self.halfedge_mut(d1).face = f;
        self.face_mut(f).halfedge = d1;

        let nf = self.create_face();
        self.face_mut(nf).label = label;
        self.face_mut(nf).halfedge = d2;
        let mut cur = d2;
        let mut guard = 0usize;
        loop {
            self.halfedge_mut(cur).face = nf;
            cur = self.next(cur);
            if cur == d2 {
                break;
            }
            guard += 1;
            assert!(guard < MAX_CIRCULATION, "cut cycle does not close");
        }
        nf
    }

    /// Open a degenerate two-sided slit from boundary vertex `v` of `f` to
    /// a new vertex at `position`.
    ///
    /// Both slit half-edges are glued to each other and share `f` — an
    /// intentionally temporary invalid state. The caller must resolve it
    /// immediately, typically with further cuts through the new vertex.
    pub fn cut_into(&mut self, f: FaceId, v: VertexId, position: Point3<f64>) -> VertexId {
        let cycle = self.circulate_face(f);
        let he_v = cycle
            .iter()
            .copied()
            .find(|&h| self.vert(h) == v)
            .unwrap_or_else(|| panic!("cut_into: {:?} is not on face {:?}", v, f));

        let w = self.create_vertex_at(position);
        let s1 = self.create_halfedge(); // v -> w
        let s2 = self.create_halfedge(); // w -> v
        self.set_halfedge_vert(s1, w);
        self.set_halfedge_vert(s2, v);
        self.glue(s1, s2);
        self.halfedge_mut(s1).face = f;
        self.halfedge_mut(s2).face = f;

        let after = self.next(he_v);
        self.link_halfedges(he_v, s1);
        self.link_halfedges(s1, s2);
        self.link_halfedges(s2, after);
        w
    }

    // ==================== Splitting ====================

    /// Split `f` into one sector per boundary edge around a new center
    /// vertex at the average of the boundary positions and UVs.
    ///
    /// Each boundary edge keeps its half-edge; a pair of spoke half-edges
    /// per sector connects it to the center. `f` itself becomes the first
    /// sector. Returns the center vertex.
    pub fn split_face(&mut self, f: FaceId) -> VertexId {
        let cycle = self.circulate_face(f);
        let n = cycle.len();
        assert!(n >= 3, "splitting a degenerate face {:?}", f);
        let label = self.face(f).label;

        // b[i] is the vertex cycle[i] points at; a[i] = b[i-1] is where it
        // starts.
        let b: Vec<VertexId> = cycle.iter().map(|&h| self.vert(h)).collect();

        let (mut sum_pos, mut sum_uv1, mut sum_uv2) =
            (Vector3::zeros(), nalgebra::Vector2::zeros(), nalgebra::Vector2::zeros());
        for &v in &b {
            let vert = self.vertex(v);
            sum_pos += vert.position.coords;
            sum_uv1 += vert.uv1;
            sum_uv2 += vert.uv2;
        }
        let c = self.create_vertex_at(Point3::from(sum_pos / n as f64));
        {
            let vert = self.vertex_mut(c);
            vert.uv1 = sum_uv1 / n as f64;
            vert.uv2 = sum_uv2 / n as f64;
        }

        let mut sectors = vec![f];
        for _ in 1..n {
            let nf = self.create_face();
            self.face_mut(nf).label = label;
            sectors.push(nf);
        }
        let spokes_in: Vec<HalfedgeId> = (0..n).map(|_| self.create_halfedge()).collect();
        let spokes_out: Vec<HalfedgeId> = (0..n).map(|_| self.create_halfedge()).collect();

        for i in 0..n {
            let he = cycle[i];
            let fi = sectors[i];
            let a_i = b[(i + n - 1) % n];
            self.set_halfedge_vert(spokes_in[i], c);
            self.set_halfedge_vert(spokes_out[i], a_i);
            self.link_halfedges(he, spokes_in[i]);
            self.link_halfedges(spokes_in[i], spokes_out[i]);
            self.link_halfedges(spokes_out[i], he);
            self.halfedge_mut(he).face = fi;
            self.halfedge_mut(spokes_in[i]).face = fi;
            self.halfedge_mut(spokes_out[i]).face = fi;
            self.face_mut(fi).halfedge = he;
        }
        for i in 0..n {
            // spoke into the center from sector i is the twin of the spoke
            // leaving the center in the next sector.
            self.glue(spokes_in[i], spokes_out[(i + 1) % n]);
        }
        c
    }

    // ==================== Collapse ====================

    /// Collapse the whole face to a single vertex.
    ///
    /// Candidate positions are tried in order — the centroid, then each
    /// boundary vertex position — and the first one that flips no
    /// neighboring face normal wins. When every candidate flips something,
    /// the centroid is used anyway on the assumption it does the least
    /// damage.
    ///
    /// Returns `false` without mutating when a boundary vertex (or a
    /// missing twin) makes the collapse topologically unsound.
    pub fn collapse_face(&mut self, f: FaceId) -> bool {
        let cycle = self.circulate_face(f);
        let verts = self.face_vertices(f);
        for &v in &verts {
            if self.is_boundary_vertex(v) {
                return false;
            }
        }
        for &h in &cycle {
            if !self.opp(h).is_valid() {
                warn!(face = ?f, "face has an unglued edge; collapse refused");
                return false;
            }
        }

        let centroid = self.face_center(f);
        let mut candidates = vec![centroid];
        candidates.extend(verts.iter().map(|&v| self.position(v)));

        let mut target = centroid;
        'candidates: for &p in &candidates {
            let mut seen: Vec<FaceId> = Vec::new();
            for &v in &verts {
                for &inc in self.incoming_halfedges(v) {
                    let nf = self.face_of(inc);
                    if !nf.is_valid() || nf == f || self.is_face_destroyed(nf) || seen.contains(&nf)
                    {
                        continue;
                    }
                    seen.push(nf);
                    let before = self.face_normal(nf);
                    let after = self.face_normal_with_vertices_at(nf, &verts, p);
                    if before.dot(&after) <= 0.0 {
                        continue 'candidates;
                    }
                }
            }
            target = p;
            break;
        }

        // Detach the face; its former twins become the rim of a hole.
        let ring: Vec<HalfedgeId> = cycle.iter().map(|&h| self.opp(h)).collect();
        for &h in &cycle {
            self.destroy_halfedge(h);
        }
        self.destroy_face(f);
        self.collapse_boundary_loop(ring[0], target);
        true
    }

    /// Newell normal of `f` with every vertex in `moved` relocated to `at`.
    fn face_normal_with_vertices_at(
        &self,
        f: FaceId,
        moved: &[VertexId],
        at: Point3<f64>,
    ) -> Vector3<f64> {
        let positions: Vec<Point3<f64>> = self
            .face_vertices(f)
            .into_iter()
            .map(|v| {
                if moved.contains(&v) {
                    at
                } else {
                    self.position(v)
                }
            })
            .collect();
        normal_of_polygon(&positions)
    }

    // ==================== Dissolving ====================

    /// Destroy the face and its boundary half-edges, plus any vertex left
    /// without incident edges. Neighboring faces acquire boundary edges.
    pub fn dissolve_face(&mut self, f: FaceId) {
        let cycle = self.circulate_face(f);
        let verts = self.face_vertices(f);
        for h in cycle {
            if !self.is_halfedge_destroyed(h) {
                self.destroy_halfedge(h);
            }
        }
        self.destroy_face(f);
        for v in verts {
            if v.is_valid() && !self.is_vertex_destroyed(v) && self.incoming_halfedges(v).is_empty()
            {
                self.destroy_vertex(v);
            }
        }
    }

    /// Remove a face reduced to exactly two edges (a slit) by gluing the
    /// two edges' twins directly together.
    pub fn dissolve_two_edge_face(&mut self, f: FaceId) {
        let a = self.face(f).halfedge;
        let b = self.next(a);
        debug_assert_eq!(self.next(b), a, "face {:?} is not a 2-gon", f);

        let va = self.vert(a);
        let vb = self.vert(b);
        let mut ao = self.opp(a);
        let mut bo = self.opp(b);
        // A slit whose sides are glued to each other has no outside.
        if ao == b {
            ao = HalfedgeId::invalid();
        }
        if bo == a {
            bo = HalfedgeId::invalid();
        }

        self.destroy_halfedge(a);
        self.destroy_halfedge(b);
        self.destroy_face(f);

        let ao = (ao.is_valid() && !self.is_halfedge_destroyed(ao)).then_some(ao);
        let bo = (bo.is_valid() && !self.is_halfedge_destroyed(bo)).then_some(bo);
        self.glue_opt(ao, bo);

        for v in [va, vb] {
            if v.is_valid() && !self.is_vertex_destroyed(v) && self.incoming_halfedges(v).is_empty()
            {
                self.destroy_vertex(v);
            }
        }
    }

    // ==================== Triangulation ====================

    /// Triangulate an arbitrary polygon face, repairing degeneracies along
    /// the way.
    ///
    /// Each pass applies the first applicable of three actions, in priority
    /// order: collapse a zero-length edge; excise an antiparallel spike;
    /// clip the best convex ear. The loop is bounded by `2 × edge_count`
    /// passes so corrupted input terminates. A fully collinear boundary is
    /// fan-triangulated from its extreme point instead.
    ///
    /// Returns the faces produced, destroyed ones already filtered out.
    /// When none of the actions applies the remaining polygon is left
    /// untriangulated with a warning — callers tolerate a leftover n-gon
    /// rather than aborting the whole mesh operation.
    pub fn triangulate_face(&mut self, f: FaceId) -> Vec<FaceId> {
        let mut produced = vec![f];
        let n0 = self.face_edge_count(f);
        if n0 <= 3 {
            return produced;
        }

        if let Some(extreme) = self.collinear_extreme(f) {
            self.triangulate_face_on_line(f, extreme, &mut produced);
            produced.retain(|&p| !self.is_face_destroyed(p));
            return produced;
        }

        let zero_sqr = self.config.zero_magnitude_threshold_sqr();
        let antiparallel = -(1.0 - self.config.normal_epsilon);

        for _ in 0..2 * n0 {
            if self.is_face_destroyed(f) || self.face_edge_count(f) <= 3 {
                break;
            }
            let cycle = self.circulate_face(f);

            // 1. Zero-length edge: collapse away the redundant vertex.
            if let Some(&h) = cycle
                .iter()
                .find(|&&h| self.halfedge_length_sqr(h) < zero_sqr)
            {
                self.collapse_edge(h, false);
                continue;
            }

            // 2. Antiparallel spike: two consecutive edges doubling back.
            let spike = cycle.iter().copied().find(|&h| {
                let d1 = self.halfedge_direction(h);
                let d2 = self.halfedge_direction(self.next(h));
                let (l1, l2) = (d1.norm(), d2.norm());
                l1 > 0.0 && l2 > 0.0 && d1.dot(&d2) / (l1 * l2) < antiparallel
            });
            if let Some(h) = spike {
                self.excise_spike(f, h, &mut produced);
                continue;
            }

            // 3. Best convex ear.
            if let Some(h) = self.find_ear(f) {
                let va = self.source(h);
                let vb = self.vert(self.next(h));
                let nf = self.cut_face(f, va, vb);
                if nf != f {
                    produced.push(nf);
                }
                continue;
            }

            warn!(
                face = ?f,
                edges = self.face_edge_count(f),
                "no triangulation action applies; leaving face untriangulated"
            );
            break;
        }

        produced.retain(|&p| !self.is_face_destroyed(p));
        produced
    }

    /// Cut off an antiparallel spike at `h`/`next(h)` and collapse the
    /// resulting coincident edge.
    ///
    /// The longer of the two edges is split first so the cut vertices
    /// coincide; then the spike triangle is clipped and the zero-length
    /// diagonal collapsed, which also dissolves the clipped sliver.
    fn excise_spike(&mut self, f: FaceId, h: HalfedgeId, produced: &mut Vec<FaceId>) {
        let h2 = self.next(h);
        let u = self.source(h);
        let w = self.vert(h2);
        let l1 = self.halfedge_direction(h).norm();
        let l2 = self.halfedge_direction(h2).norm();
        let zero = self.config.zero_magnitude_threshold;

        let (from, to) = if (l1 - l2).abs() <= zero {
            // Tips coincide already.
            (u, w)
        } else if l1 > l2 {
            let m = self.split_edge(h, 1.0 - l2 / l1);
            (m, w)
        } else {
            let m = self.split_edge(h2, l1 / l2);
            (u, m)
        };

        let nf = self.cut_face(f, from, to);
        if nf != f {
            produced.push(nf);
        }
        // The diagonal from -> to is now a (near) zero-length edge in `f`.
        let diagonal = self
            .circulate_face(f)
            .into_iter()
            .find(|&d| self.source(d) == from && self.vert(d) == to);
        if let Some(d) = diagonal {
            let target = self.position(to);
            self.collapse_edge_to(d, target);
        }
    }

    /// The sharpest applicable convex ear of `f`: the corner whose signed
    /// turn agrees with the face normal, whose triangle contains no other
    /// boundary vertex, and whose turning angle is smallest.
    fn find_ear(&self, f: FaceId) -> Option<HalfedgeId> {
        let cycle = self.circulate_face(f);
        let normal = self.face_normal(f);
        if normal == Vector3::zeros() {
            return None;
        }
        let mut best: Option<(HalfedgeId, f64)> = None;
        for &h in &cycle {
            let corner = [self.source(h), self.vert(h), self.vert(self.next(h))];
            let p0 = self.position(corner[0]);
            let p1 = self.position(corner[1]);
            let p2 = self.position(corner[2]);
            let d1 = p1 - p0;
            let d2 = p2 - p1;
            if d1.cross(&d2).dot(&normal) <= 0.0 {
                continue; // reflex or straight corner
            }
            let blocked = cycle.iter().any(|&other| {
                let v = self.vert(other);
                !corner.contains(&v) && triangle_contains(self.position(v), p0, p1, p2, normal)
            });
            if blocked {
                continue;
            }
            let angle = d1.angle(&d2);
            if best.map_or(true, |(_, a)| angle < a) {
                best = Some((h, angle));
            }
        }
        best.map(|(h, _)| h)
    }

    /// When every boundary vertex lies (within threshold) on the line
    /// through the two farthest-apart vertices, return the extreme vertex
    /// to fan from.
    fn collinear_extreme(&self, f: FaceId) -> Option<VertexId> {
        let vs = self.face_vertices(f);
        let mut extreme = (vs[0], vs[0]);
        let mut max_dist = 0.0;
        for i in 0..vs.len() {
            for j in i + 1..vs.len() {
                let d = (self.position(vs[i]) - self.position(vs[j])).norm();
                if d > max_dist {
                    max_dist = d;
                    extreme = (vs[i], vs[j]);
                }
            }
        }
        if max_dist < self.config.zero_magnitude_threshold {
            return None; // the whole face is a point; zero-edge collapse handles it
        }
        let (a, b) = extreme;
        let pa = self.position(a);
        let pb = self.position(b);
        let all_on_line = vs.iter().all(|&v| {
            v == a || v == b || point_line_distance(self.position(v), pa, pb)
                < self.config.zero_magnitude_threshold
        });
        all_on_line.then_some(a)
    }

    /// Fan-triangulate a collinear polygon from its extreme vertex. The
    /// triangles have zero area by construction; downstream repair decides
    /// their fate.
    fn triangulate_face_on_line(
        &mut self,
        f: FaceId,
        extreme: VertexId,
        produced: &mut Vec<FaceId>,
    ) {
        let mut guard = 0usize;
        while !self.is_face_destroyed(f) && self.face_edge_count(f) > 3 {
            let Some(hw) = self
                .circulate_face(f)
                .into_iter()
                .find(|&h| self.vert(h) == extreme)
            else {
                return;
            };
            let target = self.vert(self.next(self.next(hw)));
            let nf = self.cut_face(f, extreme, target);
            if nf == f {
                return;
            }
            produced.push(nf);
            guard += 1;
            assert!(guard < MAX_CIRCULATION, "collinear fan does not terminate");
        }
    }

    /// Per-face validity helper used by `validate`: the cycle closes, all
    /// cycle half-edges point back at this face, and the canonical
    /// half-edge is live.
    pub(crate) fn face_cycle_consistent(&self, f: FaceId) -> bool {
        let start = self.face(f).halfedge;
        if !start.is_valid() || self.is_halfedge_destroyed(start) {
            return false;
        }
        for h in self.circulate_face(f) {
            if self.is_halfedge_destroyed(h) || self.face_of(h) != f {
                return false;
            }
        }
        true
    }
}

/// Strict containment of `p` in triangle `(a, b, c)` with normal `n`,
/// by same-side tests against all three edges.
fn triangle_contains(
    p: Point3<f64>,
    a: Point3<f64>,
    b: Point3<f64>,
    c: Point3<f64>,
    n: Vector3<f64>,
) -> bool {
    let eps = 1e-12;
    (b - a).cross(&(p - a)).dot(&n) > eps
        && (c - b).cross(&(p - b)).dot(&n) > eps
        && (a - c).cross(&(p - c)).dot(&n) > eps
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mesh::validate::ValidationRules;
    use approx::assert_relative_eq;

    #[test]
    fn test_circulate_face() {
        let mesh = HMesh::create_test_mesh_ngon(5);
        let f = mesh.face_ids().next().unwrap();
        let cycle = mesh.circulate_face(f);
        assert_eq!(cycle.len(), 5);
        for (i, &h) in cycle.iter().enumerate() {
            assert_eq!(mesh.next(h), cycle[(i + 1) % 5]);
            assert_eq!(mesh.face_of(h), f);
        }
    }

    #[test]
    fn test_face_normal_and_area() {
        let mesh = HMesh::create_test_mesh_triangle();
        let f = mesh.face_ids().next().unwrap();
        let n = mesh.face_normal(f);
        assert_relative_eq!(n.norm(), 1.0, epsilon = 1e-12);
        assert_relative_eq!(mesh.face_area(f), 0.5, epsilon = 1e-12);
        assert!(!mesh.face_is_degenerate(f));
    }

    #[test]
    fn test_degenerate_face_normal() {
        let mut mesh = HMesh::new();
        mesh.create_triangle(
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(2.0, 0.0, 0.0),
        );
        let f = mesh.face_ids().next().unwrap();
        assert!(mesh.face_is_degenerate(f));
    }

    #[test]
    fn test_cut_face() {
        let mut mesh = HMesh::create_test_mesh_quad();
        let f = mesh.face_ids().next().unwrap();
        let vs = mesh.face_vertices(f);
        let nf = mesh.cut_face(f, vs[0], vs[2]);
        assert_ne!(nf, f);
        assert_eq!(mesh.face_count(), 2);
        assert_eq!(mesh.face_edge_count(f), 3);
        assert_eq!(mesh.face_edge_count(nf), 3);
        assert!(mesh.is_valid(ValidationRules::STANDARD));
    }

    #[test]
    fn test_cut_adjacent_is_noop() {
        let mut mesh = HMesh::create_test_mesh_quad();
        let f = mesh.face_ids().next().unwrap();
        let vs = mesh.face_vertices(f);
        let nf = mesh.cut_face(f, vs[0], vs[1]);
        assert_eq!(nf, f);
        assert_eq!(mesh.face_count(), 1);
    }

    #[test]
    fn test_split_face_fans_around_center() {
        let mut mesh = HMesh::create_test_mesh_ngon(6);
        let f = mesh.face_ids().next().unwrap();
        let c = mesh.split_face(f);
        assert_eq!(mesh.face_count(), 6);
        assert_eq!(mesh.vertex_count(), 7);
        assert_eq!(mesh.vertex_valency(c), 6);
        assert!(!mesh.is_boundary_vertex(c));
        for face in mesh.face_ids() {
            assert_eq!(mesh.face_edge_count(face), 3);
        }
        assert!(mesh.is_valid(ValidationRules::STANDARD));
        // Center lands at the mean of the ring, which is the origin.
        assert!(mesh.position(c).coords.norm() < 1e-12);
    }

    #[test]
    fn test_triangulate_convex_ngons() {
        for n in 3..=32 {
            let mut mesh = HMesh::create_test_mesh_ngon(n);
            let f = mesh.face_ids().next().unwrap();
            let area_before: f64 = mesh.face_area(f);
            mesh.triangulate(false);
            assert_eq!(mesh.face_count(), n - 2, "n = {}", n);
            let mut area_after = 0.0;
            for face in mesh.face_ids() {
                assert_eq!(mesh.face_edge_count(face), 3);
                area_after += mesh.face_area(face);
            }
            assert_relative_eq!(area_before, area_after, epsilon = 1e-9);
            assert!(mesh.is_valid(ValidationRules::STANDARD | ValidationRules::TRIANGLES_ONLY));
        }
    }

    #[test]
    fn test_triangulate_nonconvex_polygon() {
        // An arrowhead: one reflex corner.
        let mut mesh = HMesh::new();
        let f = mesh.create_face();
        let pts = [
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(2.0, 0.0, 1.0),
            Point3::new(4.0, 0.0, 0.0),
            Point3::new(2.0, 0.0, 3.0),
        ];
        let vs: Vec<_> = pts.iter().map(|&p| mesh.create_vertex_at(p)).collect();
        let hes: Vec<_> = (0..4).map(|_| mesh.create_halfedge()).collect();
        for i in 0..4 {
            mesh.set_halfedge_vert(hes[i], vs[(i + 1) % 4]);
            mesh.link_halfedges(hes[i], hes[(i + 1) % 4]);
            mesh.link_halfedge_face(hes[i], f);
        }
        mesh.face_mut(f).halfedge = hes[0];

        let area_before = mesh.face_area(f);
        let faces = mesh.triangulate_face(f);
        assert_eq!(faces.len(), 2);
        let area_after: f64 = mesh.face_ids().map(|f| mesh.face_area(f)).sum();
        assert_relative_eq!(area_before, area_after, epsilon = 1e-9);
        assert!(mesh.is_valid(ValidationRules::STANDARD));
    }

    #[test]
    fn test_triangulate_collinear_polygon() {
        // Four vertices on a line: fan triangulation from the extreme, all
        // triangles degenerate but topologically sound.
        let mut mesh = HMesh::new();
        let f = mesh.create_face();
        let pts = [
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(3.0, 0.0, 0.0),
            Point3::new(2.0, 0.0, 0.0),
        ];
        let vs: Vec<_> = pts.iter().map(|&p| mesh.create_vertex_at(p)).collect();
        let hes: Vec<_> = (0..4).map(|_| mesh.create_halfedge()).collect();
        for i in 0..4 {
            mesh.set_halfedge_vert(hes[i], vs[(i + 1) % 4]);
            mesh.link_halfedges(hes[i], hes[(i + 1) % 4]);
            mesh.link_halfedge_face(hes[i], f);
        }
        mesh.face_mut(f).halfedge = hes[0];

        mesh.triangulate_face(f);
        for face in mesh.face_ids() {
            assert_eq!(mesh.face_edge_count(face), 3);
        }
        assert!(mesh.is_valid(ValidationRules::STANDARD));
    }

    #[test]
    fn test_collapse_face_on_closed_mesh() {
        // Collapsing one face of a tetrahedron flattens it; the degenerate
        // residue dissolves without corrupting anything.
        let mut mesh = crate::io::obj::parse(
            "v 0 0 0\nv 1 0 0\nv 0.5 1 0\nv 0.5 0.5 1\nf 1 3 2\nf 1 2 4\nf 2 3 4\nf 3 1 4\n",
        )
        .unwrap();
        let f = mesh.face_ids().next().unwrap();
        assert!(mesh.collapse_face(f));
        assert!(mesh.is_valid(ValidationRules::STANDARD));
    }

    #[test]
    fn test_collapse_face_refuses_boundary() {
        let mut mesh = HMesh::create_test_mesh_quad();
        let f = mesh.face_ids().next().unwrap();
        assert!(!mesh.collapse_face(f));
        assert_eq!(mesh.face_count(), 1);
    }

    #[test]
    fn test_dissolve_face() {
        let mut mesh = HMesh::create_test_mesh_triangle();
        let f = mesh.face_ids().next().unwrap();
        mesh.dissolve_face(f);
        assert_eq!(mesh.face_count(), 0);
        assert_eq!(mesh.halfedge_count(), 0);
        assert_eq!(mesh.vertex_count(), 0);
    }

    #[test]
    fn test_cut_into_then_resolve() {
        // Open a slit into the middle of a quad, then resolve the invalid
        // state by fanning cuts through the new vertex.
        let mut mesh = HMesh::create_test_mesh_quad();
        let f = mesh.face_ids().next().unwrap();
        let vs = mesh.face_vertices(f);
        let w = mesh.cut_into(f, vs[0], Point3::new(0.1, 0.0, 0.1));
        // Slit state: face boundary is 6 half-edges, w has valency 1.
        assert_eq!(mesh.face_edge_count(f), 6);
        let target = vs[2];
        let nf = mesh.cut_face(f, w, target);
        assert_ne!(nf, f);
        assert!(mesh.is_valid(ValidationRules::STANDARD));
        assert_eq!(mesh.face_count(), 2);
    }
}
