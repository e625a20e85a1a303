//! Degenerate-geometry repair and collapse-based simplification.
//!
//! These passes remove what construction and editing leave behind:
//! zero-length edges, sliver triangles, slits, redundant valence-2
//! vertices, and — for [`simplify_by_collapse`] — whole coplanar regions
//! reduced to the minimum vertex set that preserves region (label)
//! boundaries. Every pass snapshots the entity lists before mutating.

use tracing::debug;

use crate::mesh::{CollapseReason, FaceId, HMesh, HalfedgeId, VertexId};

/// One full repair pass over the mesh. Returns the number of fixes
/// applied; callers loop until it reports zero.
///
/// In order: faces with more than three edges are triangulated, remaining
/// zero-length edges are collapsed (trying the edge center, then either
/// endpoint, then unconditionally), two-edge faces are dissolved, and
/// zero-normal triangles (slivers) are eliminated by splitting their
/// longest edge through the opposite faces and collapsing the fresh edge.
pub fn fix_degenerate_faces(mesh: &mut HMesh) -> usize {
    let mut fixes = 0;
    let zero_sqr = mesh.config().zero_magnitude_threshold_sqr();

    // (a) Triangulate polygons.
    let faces: Vec<FaceId> = mesh.face_ids().collect();
    for f in faces {
        if !mesh.is_face_destroyed(f) && mesh.face_edge_count(f) > 3 {
            mesh.triangulate_face(f);
            fixes += 1;
        }
    }

    // (b) Collapse zero-length edges.
    let edges: Vec<HalfedgeId> = mesh.halfedge_ids().collect();
    for h in edges {
        if mesh.is_halfedge_destroyed(h) || mesh.halfedge_length_sqr(h) >= zero_sqr {
            continue;
        }
        let candidates = [
            mesh.halfedge_center(h),
            mesh.position(mesh.source(h)),
            mesh.position(mesh.vert(h)),
        ];
        let checks = CollapseReason::NORMAL_FLIPPED | CollapseReason::COLLAPSE_POINT_TOO_CLOSE_TO_LINE;
        let chosen = candidates
            .into_iter()
            .find(|&p| mesh.collapse_precondition(h, p, checks).is_empty());
        match chosen {
            Some(p) => {
                mesh.collapse_edge_to(h, p);
            }
            None => {
                // Keeping a zero-length edge is worse than any collapse.
                mesh.collapse_edge(h, true);
            }
        }
        fixes += 1;
    }

    // (c) Dissolve slits.
    let faces: Vec<FaceId> = mesh.face_ids().collect();
    for f in faces {
        if !mesh.is_face_destroyed(f) && mesh.face_edge_count(f) == 2 {
            mesh.dissolve_two_edge_face(f);
            fixes += 1;
        }
    }

    // (d) Eliminate slivers: triangles with a zero normal but no
    // zero-length edge (three nearly collinear points).
    let faces: Vec<FaceId> = mesh.face_ids().collect();
    for f in faces {
        if mesh.is_face_destroyed(f)
            || mesh.face_edge_count(f) != 3
            || !mesh.face_is_degenerate(f)
        {
            continue;
        }
        if fix_sliver(mesh, f) {
            fixes += 1;
        }
    }

    if fixes > 0 {
        debug!(fixes, "degenerate-face repair pass");
    }
    fixes
}

/// Split a sliver triangle's longest edge at the projection of the
/// opposite vertex, cut the adjacent faces through the new vertex, and
/// collapse the resulting coincident edge.
fn fix_sliver(mesh: &mut HMesh, f: FaceId) -> bool {
    let cycle = mesh.circulate_face(f);
    let longest = *cycle
        .iter()
        .max_by(|&&a, &&b| {
            mesh.halfedge_length_sqr(a)
                .partial_cmp(&mesh.halfedge_length_sqr(b))
                .unwrap_or(std::cmp::Ordering::Equal)
        })
        .expect("triangle has edges");
    let apex = mesh.vert(mesh.next(longest));
    let apex_pos = mesh.position(apex);

    let a = mesh.position(mesh.source(longest));
    let dir = mesh.halfedge_direction(longest);
    let len_sqr = dir.norm_squared();
    if len_sqr == 0.0 {
        return false;
    }
    let t = ((apex_pos - a).dot(&dir) / len_sqr).clamp(0.01, 0.99);

    let w = mesh.split_and_cut(longest, t);
    let Some(e) = mesh.shared_edge(w, apex) else {
        return false;
    };
    // Collapse toward the apex so only the helper vertex disappears.
    if mesh.vert(e) == apex {
        mesh.collapse_edge_to(e, apex_pos);
    } else if mesh.opp(e).is_valid() {
        let o = mesh.opp(e);
        mesh.collapse_edge_to(o, apex_pos);
    } else {
        mesh.collapse_edge_to(e, apex_pos);
    }
    true
}

/// Remove geometrically redundant boundary vertices: both boundary edges
/// parallel, and every surrounding face in one plane (and of one label,
/// unless `keep_face_labels` is off). Returns the number dissolved.
pub fn dissolve_unneeded_boundary_vertices(mesh: &mut HMesh, keep_face_labels: bool) -> usize {
    let mut dissolved = 0;
    let eps = mesh.config().normal_epsilon;
    let plane_tolerance = 0.5 * mesh.config().zero_magnitude_threshold;

    let vertices: Vec<VertexId> = mesh.vertex_ids().collect();
    for v in vertices {
        if mesh.is_vertex_destroyed(v) || !mesh.is_boundary_vertex(v) {
            continue;
        }
        // The two boundary edges at v: one incoming, one outgoing.
        let incoming_b: Vec<HalfedgeId> = mesh
            .incoming_halfedges(v)
            .iter()
            .copied()
            .filter(|&h| mesh.is_boundary_halfedge(h))
            .collect();
        let outgoing_b: Vec<HalfedgeId> = mesh
            .circulate_vertex(v)
            .into_iter()
            .filter(|&h| mesh.is_boundary_halfedge(h))
            .collect();
        if incoming_b.len() != 1 || outgoing_b.len() != 1 {
            continue;
        }
        let d1 = mesh.halfedge_direction(incoming_b[0]).normalize();
        let d2 = mesh.halfedge_direction(outgoing_b[0]).normalize();
        if d1.dot(&d2) < 1.0 - eps {
            continue; // boundary turns at v
        }

        let faces = faces_around_vertex(mesh, v);
        if faces.is_empty() {
            continue;
        }
        if keep_face_labels {
            let first = mesh.face(faces[0]).label;
            if faces.iter().any(|&f| mesh.face(f).label != first) {
                continue;
            }
        }
        if !faces_coplanar_at(mesh, &faces, v, eps, plane_tolerance) {
            continue;
        }

        let target = mesh.vert(outgoing_b[0]);
        let p = mesh.position(target);
        mesh.collapse_edge_to(outgoing_b[0], p);
        dissolved += 1;
    }
    dissolved
}

/// Remove valence-2 interior (or valence-1 boundary) vertices that are
/// colinear with their two neighbors — the inverse of an unnecessary edge
/// split. Returns the number dissolved.
pub fn dissolve_unneeded_vertices(mesh: &mut HMesh) -> usize {
    let mut dissolved = 0;
    let threshold = mesh.config().zero_magnitude_threshold;

    let vertices: Vec<VertexId> = mesh.vertex_ids().collect();
    for v in vertices {
        if mesh.is_vertex_destroyed(v) {
            continue;
        }
        let neighbors = mesh.vertex_neighbors(v);
        if neighbors.len() != 2 {
            continue;
        }
        let valency = mesh.vertex_valency(v);
        let boundary = mesh.is_boundary_vertex(v);
        let removable = (boundary && valency == 1) || (!boundary && valency == 2);
        if !removable {
            continue;
        }
        let a = mesh.position(neighbors[0]);
        let b = mesh.position(neighbors[1]);
        let distance = crate::mesh::point_line_distance(mesh.position(v), a, b);
        if distance < threshold && mesh.dissolve_vertex(v) {
            dissolved += 1;
        }
    }
    dissolved
}

/// Greedy coplanar-region reduction. Runs full passes over all interior
/// vertices until nothing changes or `max_iter` passes ran; returns the
/// total number of edges collapsed.
///
/// Per vertex, incident edges crossing a face-label border are counted:
///
/// * **0** — the vertex is interior to one region; if the surrounding
///   faces are coplanar, the first incident edge whose collapse is legal
///   is collapsed.
/// * **2** — the vertex sits on a label border; if the two border edges
///   continue each other in a straight line and both regions are planar,
///   one of the border edges is collapsed (whichever is legal first).
/// * **1** — impossible for an interior vertex; asserted unreachable.
///
/// Legality is [`precondition_legal_collapse`]: no normal flip, at most
/// two labels among the touched faces, equal normals within each label,
/// and no label-border edge changing direction.
pub fn simplify_by_collapse(mesh: &mut HMesh, max_iter: usize) -> usize {
    let mut total = 0;
    for _ in 0..max_iter {
        let collapsed = simplify_pass(mesh);
        total += collapsed;
        if collapsed == 0 {
            break;
        }
    }
    total
}

fn simplify_pass(mesh: &mut HMesh) -> usize {
    let eps = mesh.config().normal_epsilon;
    let mut collapsed = 0;

    let vertices: Vec<VertexId> = mesh.vertex_ids().collect();
    for v in vertices {
        if mesh.is_vertex_destroyed(v) || mesh.is_boundary_vertex(v) {
            continue;
        }
        let outgoing = mesh.circulate_vertex(v);
        let border: Vec<HalfedgeId> = outgoing
            .iter()
            .copied()
            .filter(|&h| is_label_border(mesh, h))
            .collect();

        match border.len() {
            0 => {
                let faces = faces_around_vertex(mesh, v);
                if !normals_equal(mesh, &faces, eps) {
                    continue;
                }
                for h in outgoing {
                    // Collapse h removes v and keeps its neighbor in place.
                    let target = mesh.position(mesh.vert(h));
                    if precondition_legal_collapse(mesh, h, v) {
                        mesh.collapse_edge_to(h, target);
                        collapsed += 1;
                        break;
                    }
                }
            }
            2 => {
                let d1 = mesh.halfedge_direction(border[0]).normalize();
                let d2 = mesh.halfedge_direction(border[1]).normalize();
                if d1.dot(&d2) > -(1.0 - eps) {
                    continue; // border edges bend at v
                }
                let a = mesh.position(mesh.vert(border[0]));
                let b = mesh.position(mesh.vert(border[1]));
                if crate::mesh::point_line_distance(mesh.position(v), a, b)
                    >= mesh.config().zero_magnitude_threshold
                {
                    continue;
                }
                let faces = faces_around_vertex(mesh, v);
                if !labels_planar(mesh, &faces, eps) {
                    continue;
                }
                for h in border {
                    let target = mesh.position(mesh.vert(h));
                    if precondition_legal_collapse(mesh, h, v) {
                        mesh.collapse_edge_to(h, target);
                        collapsed += 1;
                        break;
                    }
                }
            }
            1 => {
                // A single label crossing at an interior vertex cannot
                // close around it.
                debug_assert!(
                    false,
                    "interior vertex {:?} with one label-border edge",
                    v
                );
            }
            _ => {} // a corner of three or more regions stays
        }
    }
    collapsed
}

/// Whether collapsing `h` (removing its source vertex) is legal for
/// label-preserving simplification.
///
/// Checks: no incident normal flips, at most two distinct labels among the
/// faces touched, all same-label normals mutually equal, and — with two
/// labels — no other label-border edge at the removed vertex changing
/// direction.
pub fn precondition_legal_collapse(mesh: &HMesh, h: HalfedgeId, v_dead: VertexId) -> bool {
    debug_assert_eq!(mesh.source(h), v_dead);
    let eps = mesh.config().normal_epsilon;
    let new_position = mesh.position(mesh.vert(h));

    if !mesh
        .collapse_precondition(h, new_position, CollapseReason::NORMAL_FLIPPED)
        .is_empty()
    {
        return false;
    }

    let v_keep = mesh.vert(h);
    let mut faces = faces_around_vertex(mesh, v_dead);
    for f in faces_around_vertex(mesh, v_keep) {
        if !faces.contains(&f) {
            faces.push(f);
        }
    }
    let mut labels: Vec<i32> = Vec::new();
    for &f in &faces {
        let label = mesh.face(f).label;
        if !labels.contains(&label) {
            labels.push(label);
        }
    }
    if labels.len() > 2 {
        return false;
    }
    for &label in &labels {
        let group: Vec<FaceId> = faces
            .iter()
            .copied()
            .filter(|&f| mesh.face(f).label == label)
            .collect();
        if !normals_equal(mesh, &group, eps) {
            return false;
        }
    }
    if labels.len() == 2 {
        // Collapsing moves v_dead onto v_keep; any other border edge at
        // v_dead must keep its direction.
        let o = mesh.opp(h);
        for e in mesh.circulate_vertex(v_dead) {
            if e == h || (o.is_valid() && e == o) || !is_label_border(mesh, e) {
                continue;
            }
            let other = mesh.position(mesh.vert(e));
            let before = (other - mesh.position(v_dead)).normalize();
            let after = other - new_position;
            if after.norm() == 0.0 {
                return false;
            }
            if before.dot(&after.normalize()) < 1.0 - eps {
                return false;
            }
        }
    }
    true
}

/// Whether the faces on either side of `h` carry different labels.
fn is_label_border(mesh: &HMesh, h: HalfedgeId) -> bool {
    let o = mesh.opp(h);
    if !o.is_valid() {
        return false;
    }
    mesh.face(mesh.face_of(h)).label != mesh.face(mesh.face_of(o)).label
}

/// Distinct live faces incident to `v`, in incoming order.
fn faces_around_vertex(mesh: &HMesh, v: VertexId) -> Vec<FaceId> {
    let mut faces = Vec::new();
    for &h in mesh.incoming_halfedges(v) {
        let f = mesh.face_of(h);
        if f.is_valid() && !mesh.is_face_destroyed(f) && !faces.contains(&f) {
            faces.push(f);
        }
    }
    faces
}

/// All face normals equal within `eps` (degenerate normals fail).
fn normals_equal(mesh: &HMesh, faces: &[FaceId], eps: f64) -> bool {
    let Some(&first) = faces.first() else {
        return true;
    };
    let reference = mesh.face_normal(first);
    if reference.norm_squared() == 0.0 {
        return false;
    }
    faces.iter().all(|&f| {
        let n = mesh.face_normal(f);
        n.norm_squared() > 0.0 && reference.dot(&n) > 1.0 - eps
    })
}

/// Per-label planarity for a group of faces with up to two labels.
fn labels_planar(mesh: &HMesh, faces: &[FaceId], eps: f64) -> bool {
    let mut labels: Vec<i32> = Vec::new();
    for &f in faces {
        let label = mesh.face(f).label;
        if !labels.contains(&label) {
            labels.push(label);
        }
    }
    labels.iter().all(|&label| {
        let group: Vec<FaceId> = faces
            .iter()
            .copied()
            .filter(|&f| mesh.face(f).label == label)
            .collect();
        normals_equal(mesh, &group, eps)
    })
}

/// Coplanarity of `faces` around `v`: equal normals and every neighbor
/// vertex within `plane_tolerance` of the plane through `v`.
fn faces_coplanar_at(
    mesh: &HMesh,
    faces: &[FaceId],
    v: VertexId,
    eps: f64,
    plane_tolerance: f64,
) -> bool {
    if !normals_equal(mesh, faces, eps) {
        return false;
    }
    let normal = mesh.face_normal(faces[0]);
    let origin = mesh.position(v);
    faces.iter().all(|&f| {
        mesh.face_vertices(f)
            .into_iter()
            .all(|w| (mesh.position(w) - origin).dot(&normal).abs() < plane_tolerance)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mesh::{HMesh, ValidationRules};
    use nalgebra::Point3;

    /// A unit plane split into 4 triangles around its center vertex.
    /// `raised` lifts the center off the plane.
    fn plane_fan(raised: bool, labels: [i32; 4]) -> HMesh {
        let y = if raised { 0.5 } else { 0.0 };
        let text = format!(
            "v 0 0 0\nv 1 0 0\nv 1 0 1\nv 0 0 1\nv 0.5 {} 0.5\nf 1 2 5\nf 2 3 5\nf 3 4 5\nf 4 1 5\n",
            y
        );
        let mut mesh = crate::io::obj::parse(&text).unwrap();
        for (f, &label) in mesh.face_ids().collect::<Vec<_>>().iter().zip(labels.iter()) {
            mesh.face_mut(*f).label = label;
        }
        mesh
    }

    #[test]
    fn test_simplify_flat_fan_collapses_center() {
        // All one label, coplanar: the interior vertex is redundant.
        let mut mesh = plane_fan(false, [0, 0, 0, 0]);
        let collapsed = simplify_by_collapse(&mut mesh, 10);
        assert_eq!(collapsed, 1);
        assert_eq!(mesh.face_count(), 2);
        assert!(mesh.is_valid(ValidationRules::STANDARD));
    }

    #[test]
    fn test_simplify_labeled_fan_collapses_along_border() {
        // Faces 3 and 4 labeled 1: the border runs straight through the
        // center, which may collapse along it. Exactly one collapse, two
        // faces per the straight border.
        let mut mesh = plane_fan(false, [0, 0, 1, 1]);
        let collapsed = simplify_by_collapse(&mut mesh, 10);
        assert_eq!(collapsed, 1);
        assert_eq!(mesh.face_count(), 2);
        assert!(mesh.is_valid(ValidationRules::STANDARD));
    }

    #[test]
    fn test_simplify_raised_center_keeps_faces() {
        // The center is off-plane: coplanarity fails, nothing collapses.
        let mut mesh = plane_fan(true, [0, 0, 0, 0]);
        let collapsed = simplify_by_collapse(&mut mesh, 10);
        assert_eq!(collapsed, 0);
        assert_eq!(mesh.face_count(), 4);
    }

    #[test]
    fn test_fix_degenerate_polygon_faces() {
        // A quad face is not a triangle; one repair pass triangulates it.
        let mut mesh = HMesh::create_test_mesh_quad();
        let fixes = fix_degenerate_faces(&mut mesh);
        assert!(fixes >= 1);
        for f in mesh.face_ids() {
            assert_eq!(mesh.face_edge_count(f), 3);
        }
        assert!(mesh.is_valid(ValidationRules::STANDARD));
    }

    #[test]
    fn test_fix_zero_length_edge() {
        // Two triangles whose shared edge has (nearly) coincident
        // endpoints.
        let mut mesh = crate::io::obj::parse(
            "v 0 0 0\nv 1 0 0\nv 1 0.0000001 0\nv 0 0 1\nf 1 2 3\nf 1 3 4\n",
        )
        .unwrap();
        let fixes = fix_degenerate_faces(&mut mesh);
        assert!(fixes >= 1);
        assert!(mesh.is_valid(ValidationRules::STANDARD | ValidationRules::ZERO_LENGTH_EDGES));
    }

    #[test]
    fn test_dissolve_unneeded_vertices_undoes_split() {
        let mut mesh = crate::io::obj::parse(
            "v -1 0 1\nv 1 0 1\nv -1 0 -1\nv 1 0 -1\nf 2 3 1\nf 2 4 3\n",
        )
        .unwrap();
        let v2 = mesh
            .vertex_ids()
            .find(|&v| mesh.position(v) == Point3::new(1.0, 0.0, 1.0))
            .unwrap();
        let v3 = mesh
            .vertex_ids()
            .find(|&v| mesh.position(v) == Point3::new(-1.0, 0.0, -1.0))
            .unwrap();
        let h = mesh.shared_edge(v2, v3).unwrap();
        mesh.split_and_cut(h, 0.5);
        assert_eq!(mesh.face_count(), 4);

        // The split vertex is interior valence-4, so it stays; but
        // splitting a boundary edge leaves a removable colinear vertex.
        let rim = mesh
            .halfedge_ids()
            .find(|&h| mesh.is_boundary_halfedge(h))
            .unwrap();
        let w = mesh.split_edge(rim, 0.5);
        assert!(!mesh.is_vertex_destroyed(w));
        let dissolved = dissolve_unneeded_vertices(&mut mesh);
        assert_eq!(dissolved, 1);
        assert!(mesh.is_vertex_destroyed(w));
        assert!(mesh.is_valid(ValidationRules::STANDARD));
    }

    #[test]
    fn test_dissolve_unneeded_boundary_vertices() {
        // A flat strip of four triangles; the middle rim vertex lies on a
        // straight boundary and carries coplanar same-label faces.
        let mut mesh = crate::io::obj::parse(
            "v 0 0 0\nv 1 0 0\nv 2 0 0\nv 0 0 1\nv 1 0 1\nv 2 0 1\nf 1 2 4\nf 2 5 4\nf 2 3 5\nf 3 6 5\n",
        )
        .unwrap();
        let before = mesh.vertex_count();
        let dissolved = dissolve_unneeded_boundary_vertices(&mut mesh, true);
        assert!(dissolved >= 1);
        assert!(mesh.vertex_count() < before);
        assert!(mesh.is_valid(ValidationRules::STANDARD));
    }
}
