//! The half-edge mesh container.
//!
//! [`HMesh`] owns three arenas — vertices, half-edges, faces — addressed by
//! the typed handles in [`super::index`]. Entities are created through
//! factory methods which assign the next slot, and destroyed by tombstoning
//! the slot; slots are never reused, so handles stay stable and
//! monotonically increasing for the life of the mesh.
//!
//! All topological mutation goes through `&mut self` methods, so exclusive
//! access is enforced by the borrow checker. Algorithms that mutate while
//! iterating snapshot the live handle set first — iterating an arena while
//! destroying entities in it is not supported.

use nalgebra::{Point3, Vector2};
use serde_json::json;
use tracing::debug;

use super::face::Face;
use super::halfedge::Halfedge;
use super::index::{FaceId, HalfedgeId, VertexId};
use super::vertex::Vertex;

/// Hard cap on circulation steps. Corrupted topology turns a would-be
/// infinite walk into a panic instead of a hang.
pub(crate) const MAX_CIRCULATION: usize = 1 << 20;

/// Per-mesh geometric tolerances.
///
/// These used to be global mutable state in older kernels; here every mesh
/// carries its own copy, set at construction.
#[derive(Debug, Clone, Copy)]
pub struct MeshConfig {
    /// Distance below which an edge is considered degenerate (zero-length).
    pub zero_magnitude_threshold: f64,

    /// Two unit normals are considered equal when their dot product exceeds
    /// `1 - normal_epsilon`.
    pub normal_epsilon: f64,
}

impl Default for MeshConfig {
    fn default() -> Self {
        Self {
            zero_magnitude_threshold: 1e-5,
            normal_epsilon: 1e-3,
        }
    }
}

impl MeshConfig {
    /// Squared zero-magnitude threshold, for comparisons against squared lengths.
    #[inline]
    pub fn zero_magnitude_threshold_sqr(&self) -> f64 {
        self.zero_magnitude_threshold * self.zero_magnitude_threshold
    }
}

/// A half-edge mesh supporting in-place topological mutation.
///
/// The mesh exclusively owns its entities. Handles obtained from one mesh
/// must never be used with another; the arenas are per-mesh and slot
/// indices are meaningless across meshes.
#[derive(Debug, Clone, Default)]
pub struct HMesh {
    pub(crate) vertices: Vec<Option<Vertex>>,
    pub(crate) halfedges: Vec<Option<Halfedge>>,
    pub(crate) faces: Vec<Option<Face>>,

    pub(crate) live_vertices: usize,
    pub(crate) live_halfedges: usize,
    pub(crate) live_faces: usize,

    pub(crate) config: MeshConfig,
}

impl HMesh {
    /// Create a new empty mesh with default tolerances.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a new empty mesh with the given tolerances.
    pub fn with_config(config: MeshConfig) -> Self {
        Self {
            config,
            ..Self::default()
        }
    }

    /// The mesh's geometric tolerances.
    #[inline]
    pub fn config(&self) -> &MeshConfig {
        &self.config
    }

    // ==================== Counts ====================

    /// Number of live vertices.
    #[inline]
    pub fn vertex_count(&self) -> usize {
        self.live_vertices
    }

    /// Number of live half-edges.
    #[inline]
    pub fn halfedge_count(&self) -> usize {
        self.live_halfedges
    }

    /// Number of live faces.
    #[inline]
    pub fn face_count(&self) -> usize {
        self.live_faces
    }

    // ==================== Accessors ====================

    /// Get a vertex by handle. Panics if the vertex was destroyed —
    /// dereferencing a tombstone is a bug in the calling algorithm.
    #[inline]
    pub fn vertex(&self, v: VertexId) -> &Vertex {
        match self.vertices[v.index()] {
            Some(ref vertex) => vertex,
            None => panic!("dereferenced destroyed vertex {:?}", v),
        }
    }

    /// Get a mutable vertex by handle.
    #[inline]
    pub fn vertex_mut(&mut self, v: VertexId) -> &mut Vertex {
        match self.vertices[v.index()] {
            Some(ref mut vertex) => vertex,
            None => panic!("dereferenced destroyed vertex {:?}", v),
        }
    }

    /// Get a half-edge by handle. Panics on tombstones.
    #[inline]
    pub fn halfedge(&self, h: HalfedgeId) -> &Halfedge {
        match self.halfedges[h.index()] {
            Some(ref he) => he,
            None => panic!("dereferenced destroyed half-edge {:?}", h),
        }
    }

    /// Get a mutable half-edge by handle.
    #[inline]
    pub fn halfedge_mut(&mut self, h: HalfedgeId) -> &mut Halfedge {
        match self.halfedges[h.index()] {
            Some(ref mut he) => he,
            None => panic!("dereferenced destroyed half-edge {:?}", h),
        }
    }

    /// Get a face by handle. Panics on tombstones.
    #[inline]
    pub fn face(&self, f: FaceId) -> &Face {
        match self.faces[f.index()] {
            Some(ref face) => face,
            None => panic!("dereferenced destroyed face {:?}", f),
        }
    }

    /// Get a mutable face by handle.
    #[inline]
    pub fn face_mut(&mut self, f: FaceId) -> &mut Face {
        match self.faces[f.index()] {
            Some(ref mut face) => face,
            None => panic!("dereferenced destroyed face {:?}", f),
        }
    }

    /// Whether a vertex handle refers to a destroyed (or never-created) slot.
    #[inline]
    pub fn is_vertex_destroyed(&self, v: VertexId) -> bool {
        !v.is_valid() || self.vertices.get(v.index()).map_or(true, Option::is_none)
    }

    /// Whether a half-edge handle refers to a destroyed slot.
    #[inline]
    pub fn is_halfedge_destroyed(&self, h: HalfedgeId) -> bool {
        !h.is_valid() || self.halfedges.get(h.index()).map_or(true, Option::is_none)
    }

    /// Whether a face handle refers to a destroyed slot.
    #[inline]
    pub fn is_face_destroyed(&self, f: FaceId) -> bool {
        !f.is_valid() || self.faces.get(f.index()).map_or(true, Option::is_none)
    }

    // ==================== Topology shorthands ====================

    /// The next half-edge in the face cycle.
    #[inline]
    pub fn next(&self, h: HalfedgeId) -> HalfedgeId {
        self.halfedge(h).next
    }

    /// The previous half-edge in the face cycle.
    #[inline]
    pub fn prev(&self, h: HalfedgeId) -> HalfedgeId {
        self.halfedge(h).prev
    }

    /// The opposite (twin) half-edge, or the invalid handle on a boundary.
    #[inline]
    pub fn opp(&self, h: HalfedgeId) -> HalfedgeId {
        self.halfedge(h).opp
    }

    /// The vertex this half-edge points toward.
    #[inline]
    pub fn vert(&self, h: HalfedgeId) -> VertexId {
        self.halfedge(h).vert
    }

    /// The vertex this half-edge points away from (`prev.vert`).
    #[inline]
    pub fn source(&self, h: HalfedgeId) -> VertexId {
        self.vert(self.prev(h))
    }

    /// The face this half-edge bounds.
    #[inline]
    pub fn face_of(&self, h: HalfedgeId) -> FaceId {
        self.halfedge(h).face
    }

    /// Position of a vertex.
    #[inline]
    pub fn position(&self, v: VertexId) -> Point3<f64> {
        self.vertex(v).position
    }

    /// Set the position of a vertex.
    #[inline]
    pub fn set_position(&mut self, v: VertexId, p: Point3<f64>) {
        self.vertex_mut(v).position = p;
    }

    // ==================== Iteration ====================

    /// Iterate over all live vertex handles, ascending.
    pub fn vertex_ids(&self) -> impl Iterator<Item = VertexId> + '_ {
        self.vertices
            .iter()
            .enumerate()
            .filter(|(_, slot)| slot.is_some())
            .map(|(i, _)| VertexId::new(i))
    }

    /// Iterate over all live half-edge handles, ascending.
    pub fn halfedge_ids(&self) -> impl Iterator<Item = HalfedgeId> + '_ {
        self.halfedges
            .iter()
            .enumerate()
            .filter(|(_, slot)| slot.is_some())
            .map(|(i, _)| HalfedgeId::new(i))
    }

    /// Iterate over all live face handles, ascending.
    pub fn face_ids(&self) -> impl Iterator<Item = FaceId> + '_ {
        self.faces
            .iter()
            .enumerate()
            .filter(|(_, slot)| slot.is_some())
            .map(|(i, _)| FaceId::new(i))
    }

    // ==================== Creation ====================

    /// Allocate a new vertex at the origin.
    pub fn create_vertex(&mut self) -> VertexId {
        let id = VertexId::new(self.vertices.len());
        self.vertices.push(Some(Vertex::new()));
        self.live_vertices += 1;
        id
    }

    /// Allocate a new vertex at the given position.
    pub fn create_vertex_at(&mut self, position: Point3<f64>) -> VertexId {
        let id = self.create_vertex();
        self.vertex_mut(id).position = position;
        id
    }

    /// Allocate a new half-edge with all links unset.
    pub fn create_halfedge(&mut self) -> HalfedgeId {
        let id = HalfedgeId::new(self.halfedges.len());
        self.halfedges.push(Some(Halfedge::new()));
        self.live_halfedges += 1;
        id
    }

    /// Allocate a new face with no boundary half-edge yet.
    pub fn create_face(&mut self) -> FaceId {
        let id = FaceId::new(self.faces.len());
        self.faces.push(Some(Face::new()));
        self.live_faces += 1;
        id
    }

    // ==================== Destruction ====================

    /// Destroy a half-edge: unregister it from its target vertex's incoming
    /// list, detach its twin, and tombstone the slot.
    ///
    /// The `next`/`prev` links of neighboring half-edges are left to the
    /// caller — every mutation algorithm splices before destroying.
    pub fn destroy_halfedge(&mut self, h: HalfedgeId) {
        assert!(
            !self.is_halfedge_destroyed(h),
            "destroying already-destroyed half-edge {:?}",
            h
        );
        let vert = self.vert(h);
        if vert.is_valid() && !self.is_vertex_destroyed(vert) {
            self.vertex_mut(vert).unlink_incoming(h);
        }
        let opp = self.opp(h);
        if opp.is_valid() && !self.is_halfedge_destroyed(opp) && self.opp(opp) == h {
            self.halfedge_mut(opp).opp = HalfedgeId::invalid();
        }
        self.halfedges[h.index()] = None;
        self.live_halfedges -= 1;
    }

    /// Destroy a vertex. Any half-edge still pointing at it has its `vert`
    /// reference cleared (the vertex's own half-edge pointer is derived, so
    /// there is nothing else to fix up).
    pub fn destroy_vertex(&mut self, v: VertexId) {
        assert!(
            !self.is_vertex_destroyed(v),
            "destroying already-destroyed vertex {:?}",
            v
        );
        let incoming = self.vertex(v).incoming.clone();
        for h in incoming {
            if !self.is_halfedge_destroyed(h) {
                self.halfedge_mut(h).vert = VertexId::invalid();
            }
        }
        self.vertices[v.index()] = None;
        self.live_vertices -= 1;
    }

    /// Destroy a face. Its boundary half-edges keep their (now dangling)
    /// face references; callers relink or destroy them.
    pub fn destroy_face(&mut self, f: FaceId) {
        assert!(
            !self.is_face_destroyed(f),
            "destroying already-destroyed face {:?}",
            f
        );
        self.faces[f.index()] = None;
        self.live_faces -= 1;
    }

    /// Destroy every entity in the mesh. Handles of the old entities become
    /// tombstones; new entities keep allocating fresh slots.
    pub fn clear(&mut self) {
        for slot in &mut self.vertices {
            *slot = None;
        }
        for slot in &mut self.halfedges {
            *slot = None;
        }
        for slot in &mut self.faces {
            *slot = None;
        }
        self.live_vertices = 0;
        self.live_halfedges = 0;
        self.live_faces = 0;
    }

    /// Deep copy. The arena design makes this a slot-identical clone:
    /// handles, topology and labels all carry over unchanged.
    pub fn copy(&self) -> HMesh {
        self.clone()
    }

    // ==================== Reference maintenance ====================

    /// Point a half-edge at a new target vertex, keeping the incoming lists
    /// of both vertices consistent. This is the only way `vert` is written.
    pub fn set_halfedge_vert(&mut self, h: HalfedgeId, v: VertexId) {
        let old = self.vert(h);
        if old == v {
            return;
        }
        if old.is_valid() && !self.is_vertex_destroyed(old) {
            self.vertex_mut(old).unlink_incoming(h);
        }
        self.halfedge_mut(h).vert = v;
        if v.is_valid() {
            self.vertex_mut(v).link_incoming(h);
        }
    }

    // ==================== Bootstrap factories ====================

    /// Build a single triangle from three fresh vertices.
    ///
    /// Used for bootstrapping (e.g. an enclosing triangle for incremental
    /// triangulation drivers). All three edges are boundary.
    pub fn create_triangle(
        &mut self,
        p0: Point3<f64>,
        p1: Point3<f64>,
        p2: Point3<f64>,
    ) -> FaceId {
        let vs = [
            self.create_vertex_at(p0),
            self.create_vertex_at(p1),
            self.create_vertex_at(p2),
        ];
        let f = self.create_face();
        let hes = [
            self.create_halfedge(),
            self.create_halfedge(),
            self.create_halfedge(),
        ];
        for i in 0..3 {
            // Half-edge i runs from vs[i] to vs[i+1].
            self.set_halfedge_vert(hes[i], vs[(i + 1) % 3]);
            self.link_halfedges(hes[i], hes[(i + 1) % 3]);
            self.link_halfedge_face(hes[i], f);
        }
        self.face_mut(f).halfedge = hes[0];
        f
    }

    /// A single unit triangle in the XZ plane (test helper).
    pub fn create_test_mesh_triangle() -> HMesh {
        let mut mesh = HMesh::new();
        mesh.create_triangle(
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(0.0, 0.0, 1.0),
        );
        mesh
    }

    /// A single quad face (4-gon) in the XZ plane (test helper).
    pub fn create_test_mesh_quad() -> HMesh {
        Self::create_test_mesh_ngon(4)
    }

    /// A single n-gon face with vertices on the unit circle in the XZ plane
    /// (test helper).
    pub fn create_test_mesh_ngon(n: usize) -> HMesh {
        assert!(n >= 3, "an n-gon needs at least 3 vertices");
        let mut mesh = HMesh::new();
        let f = mesh.create_face();
        let vs: Vec<VertexId> = (0..n)
            .map(|i| {
                let angle = (i as f64) / (n as f64) * std::f64::consts::TAU;
                mesh.create_vertex_at(Point3::new(angle.cos(), 0.0, angle.sin()))
            })
            .collect();
        let hes: Vec<HalfedgeId> = (0..n).map(|_| mesh.create_halfedge()).collect();
        for i in 0..n {
            mesh.set_halfedge_vert(hes[i], vs[(i + 1) % n]);
            mesh.link_halfedges(hes[i], hes[(i + 1) % n]);
            mesh.link_halfedge_face(hes[i], f);
        }
        mesh.face_mut(f).halfedge = hes[0];
        mesh
    }

    // ==================== Non-manifold repair ====================

    /// Split every vertex whose incident half-edges form more than one
    /// connected fan into one vertex per fan.
    ///
    /// Triangle-soup construction can produce a vertex that is topologically
    /// two distinct manifold vertices sharing a position (an hourglass
    /// pinch). Circulation and collapse assume a single fan per vertex, so
    /// construction finishes with this repair. Returns the number of
    /// vertices duplicated.
    pub fn split_non_manifold_vertices(&mut self) -> usize {
        let mut duplicated = 0;
        let vertices: Vec<VertexId> = self.vertex_ids().collect();
        for v in vertices {
            if self.is_vertex_destroyed(v) {
                continue;
            }
            let fans = self.incoming_fans(v);
            for fan in fans.iter().skip(1) {
                let nv = self.create_vertex();
                {
                    let (position, uv1, uv2, label) = {
                        let vert = self.vertex(v);
                        (vert.position, vert.uv1, vert.uv2, vert.label)
                    };
                    let nvert = self.vertex_mut(nv);
                    nvert.position = position;
                    nvert.uv1 = uv1;
                    nvert.uv2 = uv2;
                    nvert.label = label;
                }
                for &h in fan {
                    self.set_halfedge_vert(h, nv);
                }
                duplicated += 1;
            }
        }
        if duplicated > 0 {
            debug!(count = duplicated, "split non-manifold vertices");
        }
        duplicated
    }

    /// Partition a vertex's incoming half-edges into connected fans.
    ///
    /// Two incoming half-edges are in the same fan when one is reachable
    /// from the other by pivoting around the vertex (`opp(next(h))` forward,
    /// `prev(opp(h))` backward).
    fn incoming_fans(&self, v: VertexId) -> Vec<Vec<HalfedgeId>> {
        let incoming = self.vertex(v).incoming.clone();
        let mut fans: Vec<Vec<HalfedgeId>> = Vec::new();
        let mut visited: std::collections::HashSet<HalfedgeId> = std::collections::HashSet::new();
        for &seed in &incoming {
            if visited.contains(&seed) {
                continue;
            }
            let mut fan = Vec::new();
            let mut stack = vec![seed];
            visited.insert(seed);
            while let Some(h) = stack.pop() {
                fan.push(h);
                let forward = self.opp(self.next(h));
                if forward.is_valid()
                    && !self.is_halfedge_destroyed(forward)
                    && self.vert(forward) == v
                    && visited.insert(forward)
                {
                    stack.push(forward);
                }
                let o = self.opp(h);
                if o.is_valid() && !self.is_halfedge_destroyed(o) {
                    let backward = self.prev(o);
                    if self.vert(backward) == v && visited.insert(backward) {
                        stack.push(backward);
                    }
                }
            }
            fans.push(fan);
        }
        fans
    }

    // ==================== Mesh-wide triangulation ====================

    /// Triangulate every face with more than three edges.
    ///
    /// Zero-length edges are collapsed away first (as long as that keeps the
    /// face at more than three edges), then the face is handed to
    /// [`HMesh::triangulate_face`]. With `step == true`, stops after the
    /// first face that actually required work — a debugging aid for walking
    /// through a repair one face at a time.
    pub fn triangulate(&mut self, step: bool) {
        let zero_sqr = self.config.zero_magnitude_threshold_sqr();
        let faces: Vec<FaceId> = self.face_ids().collect();
        for f in faces {
            if self.is_face_destroyed(f) || self.face_edge_count(f) <= 3 {
                continue;
            }
            // Collapse away degenerate edges while the face can spare them.
            loop {
                if self.face_edge_count(f) <= 3 {
                    break;
                }
                let degenerate = self
                    .circulate_face(f)
                    .into_iter()
                    .find(|&h| self.halfedge_length_sqr(h) < zero_sqr);
                match degenerate {
                    Some(h) => {
                        self.collapse_edge(h, false);
                        if self.is_face_destroyed(f) {
                            break;
                        }
                    }
                    None => break,
                }
            }
            if !self.is_face_destroyed(f) && self.face_edge_count(f) > 3 {
                self.triangulate_face(f);
            }
            if step {
                break;
            }
        }
    }

    // ==================== Sharp edges ====================

    /// Label every half-edge 0 or 1 by whether the dihedral angle between
    /// its two adjacent faces exceeds `angle_deg`. Boundary edges are
    /// always 0.
    pub fn mark_sharp_edges(&mut self, angle_deg: f64) {
        let threshold = angle_deg.to_radians();
        let hes: Vec<HalfedgeId> = self.halfedge_ids().collect();
        for h in hes {
            if self.is_halfedge_destroyed(h) {
                continue;
            }
            let o = self.opp(h);
            if !o.is_valid() {
                self.halfedge_mut(h).label = 0;
                continue;
            }
            if h > o {
                continue; // pair handled from the smaller id
            }
            let n1 = self.face_normal(self.face_of(h));
            let n2 = self.face_normal(self.face_of(o));
            let sharp = if n1.norm_squared() == 0.0 || n2.norm_squared() == 0.0 {
                0
            } else {
                let angle = n1.angle(&n2);
                i32::from(angle > threshold)
            };
            self.halfedge_mut(h).label = sharp;
            self.halfedge_mut(o).label = sharp;
        }
    }

    // ==================== Diagnostics ====================

    /// Dump the 1-ring neighbourhood of a face as JSON.
    ///
    /// For humans and tests only; not a stable contract.
    pub fn debug_face_neighbourhood(&self, f: FaceId) -> serde_json::Value {
        let mut face_ids = vec![f];
        let mut he_ids = Vec::new();
        let mut vert_ids = Vec::new();
        for h in self.circulate_face(f) {
            he_ids.push(h);
            let o = self.opp(h);
            if o.is_valid() && !self.is_halfedge_destroyed(o) {
                let nf = self.face_of(o);
                if nf.is_valid() && !self.is_face_destroyed(nf) && !face_ids.contains(&nf) {
                    face_ids.push(nf);
                    for nh in self.circulate_face(nf) {
                        if !he_ids.contains(&nh) {
                            he_ids.push(nh);
                        }
                    }
                }
            }
            let v = self.vert(h);
            if v.is_valid() && !vert_ids.contains(&v) {
                vert_ids.push(v);
            }
        }
        json!({
            "faces": face_ids.iter().map(|&fid| json!({
                "id": fid.index(),
                "label": self.face(fid).label,
                "halfedge": self.face(fid).halfedge.index(),
            })).collect::<Vec<_>>(),
            "halfedges": he_ids.iter().map(|&h| {
                let he = self.halfedge(h);
                json!({
                    "id": h.index(),
                    "next": he.next.index(),
                    "prev": he.prev.index(),
                    "opp": if he.opp.is_valid() { Some(he.opp.index()) } else { None },
                    "vert": if he.vert.is_valid() { Some(he.vert.index()) } else { None },
                    "face": he.face.index(),
                    "label": he.label,
                })
            }).collect::<Vec<_>>(),
            "vertices": vert_ids.iter().map(|&v| {
                let vert = self.vertex(v);
                json!({
                    "id": v.index(),
                    "position": [vert.position.x, vert.position.y, vert.position.z],
                    "label": vert.label,
                })
            }).collect::<Vec<_>>(),
        })
    }

    /// Linear interpolation of position and both UV channels along an edge.
    pub(crate) fn interpolate_attributes(
        &self,
        a: VertexId,
        b: VertexId,
        fraction: f64,
    ) -> (Point3<f64>, Vector2<f64>, Vector2<f64>) {
        let va = self.vertex(a);
        let vb = self.vertex(b);
        let position =
            Point3::from(va.position.coords * (1.0 - fraction) + vb.position.coords * fraction);
        let uv1 = va.uv1 * (1.0 - fraction) + vb.uv1 * fraction;
        let uv2 = va.uv2 * (1.0 - fraction) + vb.uv2 * fraction;
        (position, uv1, uv2)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mesh::validate::ValidationRules;

    #[test]
    fn test_empty_mesh() {
        let mesh = HMesh::new();
        assert_eq!(mesh.vertex_count(), 0);
        assert_eq!(mesh.halfedge_count(), 0);
        assert_eq!(mesh.face_count(), 0);
        assert!(mesh.is_valid(ValidationRules::STANDARD));
    }

    #[test]
    fn test_create_triangle() {
        let mesh = HMesh::create_test_mesh_triangle();
        assert_eq!(mesh.vertex_count(), 3);
        assert_eq!(mesh.halfedge_count(), 3);
        assert_eq!(mesh.face_count(), 1);
        assert!(mesh.is_valid(ValidationRules::STANDARD));

        // A lone triangle is all boundary.
        for h in mesh.halfedge_ids() {
            assert!(mesh.is_boundary_halfedge(h));
        }
        for v in mesh.vertex_ids() {
            assert!(mesh.is_boundary_vertex(v));
        }
    }

    #[test]
    fn test_destroy_tombstones() {
        let mut mesh = HMesh::new();
        let v = mesh.create_vertex_at(Point3::new(1.0, 2.0, 3.0));
        assert!(!mesh.is_vertex_destroyed(v));
        mesh.destroy_vertex(v);
        assert!(mesh.is_vertex_destroyed(v));
        assert_eq!(mesh.vertex_count(), 0);

        // Slots are not reused: the next vertex gets a fresh id.
        let v2 = mesh.create_vertex();
        assert_ne!(v, v2);
    }

    #[test]
    #[should_panic(expected = "destroyed")]
    fn test_double_destroy_panics() {
        let mut mesh = HMesh::new();
        let v = mesh.create_vertex();
        mesh.destroy_vertex(v);
        mesh.destroy_vertex(v);
    }

    #[test]
    fn test_clear() {
        let mut mesh = HMesh::create_test_mesh_triangle();
        mesh.clear();
        assert_eq!(mesh.vertex_count(), 0);
        assert_eq!(mesh.halfedge_count(), 0);
        assert_eq!(mesh.face_count(), 0);
    }

    #[test]
    fn test_copy_preserves_topology() {
        let mesh = HMesh::create_test_mesh_ngon(6);
        let copy = mesh.copy();
        assert_eq!(copy.vertex_count(), 6);
        assert_eq!(copy.face_count(), 1);
        assert!(copy.is_valid(ValidationRules::STANDARD));
        for v in mesh.vertex_ids() {
            assert_eq!(mesh.position(v), copy.position(v));
        }
    }

    #[test]
    fn test_ngon_factory() {
        for n in 3..8 {
            let mesh = HMesh::create_test_mesh_ngon(n);
            assert_eq!(mesh.vertex_count(), n);
            assert_eq!(mesh.halfedge_count(), n);
            assert_eq!(mesh.face_count(), 1);
            assert!(mesh.is_valid(ValidationRules::STANDARD));
        }
    }

    #[test]
    fn test_debug_face_neighbourhood() {
        let mesh = HMesh::create_test_mesh_triangle();
        let f = mesh.face_ids().next().unwrap();
        let dump = mesh.debug_face_neighbourhood(f);
        assert_eq!(dump["faces"].as_array().unwrap().len(), 1);
        assert_eq!(dump["halfedges"].as_array().unwrap().len(), 3);
        assert_eq!(dump["vertices"].as_array().unwrap().len(), 3);
    }
}
