//! Export back to flat indexed representations.
//!
//! The plain [`HMesh::export`] is a direct dump: every live vertex, every
//! triangle, optionally one index buffer per face label. The heavier
//! [`HMesh::export_split`] partitions the mesh into a 3D grid of regions
//! and, inside each region, into smoothing clusters separated by sharp
//! edges; vertex normals are averaged within a cluster only, so a sharp
//! crease stays sharp in the output. Iteration is in ascending handle
//! order throughout, so the emitted buffers are bit-stable for a given
//! mesh.

use std::collections::HashMap;

use nalgebra::{Point3, Vector3};
use rayon::prelude::*;
use tracing::{error, warn};

use super::hmesh::HMesh;
use super::index::{FaceId, VertexId};

/// Width of the emitted index buffers.
///
/// Callers must pick [`IndexFormat::UInt32`] when the vertex count can
/// exceed 65535 — a 16-bit overflow is warned about, never silently
/// wrapped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndexFormat {
    /// 16-bit indices; at most 65536 vertices per buffer.
    UInt16,
    /// 32-bit indices.
    UInt32,
}

/// A flat indexed mesh produced by export.
#[derive(Debug, Clone, Default)]
pub struct ExportedMesh {
    /// Vertex positions.
    pub positions: Vec<Point3<f64>>,
    /// First UV channel.
    pub uv1: Vec<[f32; 2]>,
    /// Second UV channel.
    pub uv2: Vec<[f32; 2]>,
    /// Per-vertex normals (filled by split export only).
    pub normals: Vec<Vector3<f64>>,
    /// Triangle index triples, one buffer per submesh.
    pub submeshes: Vec<Vec<u32>>,
    /// Requested index width.
    pub index_format: Option<IndexFormat>,
}

impl ExportedMesh {
    fn check_index_width(&self) {
        if self.index_format == Some(IndexFormat::UInt16) && self.positions.len() > 65536 {
            warn!(
                vertices = self.positions.len(),
                "vertex count exceeds 16-bit index range; use 32-bit indices"
            );
        }
    }
}

impl HMesh {
    // ==================== Flat export ====================

    /// Dump the whole mesh into one flat buffer set.
    ///
    /// With `face_label_as_submeshes` the triangles are grouped into one
    /// index buffer per distinct face label (ascending); otherwise a single
    /// combined buffer is produced. Faces that are not triangles are
    /// logged as errors and skipped.
    pub fn export(&self, face_label_as_submeshes: bool, index_format: IndexFormat) -> ExportedMesh {
        let mut out = ExportedMesh {
            index_format: Some(index_format),
            ..ExportedMesh::default()
        };
        let mut flat_index: HashMap<VertexId, u32> = HashMap::new();
        for v in self.vertex_ids() {
            let vert = self.vertex(v);
            flat_index.insert(v, out.positions.len() as u32);
            out.positions.push(vert.position);
            out.uv1.push([vert.uv1.x as f32, vert.uv1.y as f32]);
            out.uv2.push([vert.uv2.x as f32, vert.uv2.y as f32]);
        }

        let mut labels: Vec<i32> = Vec::new();
        if face_label_as_submeshes {
            for f in self.face_ids() {
                let label = self.face(f).label;
                if !labels.contains(&label) {
                    labels.push(label);
                }
            }
            labels.sort_unstable();
        } else {
            labels.push(0);
        }
        out.submeshes = vec![Vec::new(); labels.len()];

        for f in self.face_ids() {
            let cycle = self.circulate_face(f);
            if cycle.len() != 3 {
                error!(face = ?f, edges = cycle.len(), "cannot export non-triangle face; skipped");
                continue;
            }
            let slot = if face_label_as_submeshes {
                labels
                    .iter()
                    .position(|&l| l == self.face(f).label)
                    .unwrap_or(0)
            } else {
                0
            };
            for &h in &cycle {
                out.submeshes[slot].push(flat_index[&self.vert(h)]);
            }
        }
        out.check_index_width();
        out
    }

    // ==================== Split export ====================

    /// Export the mesh split into grid regions and smoothing clusters.
    ///
    /// Faces are binned into an `axis_split_counts` grid by their center.
    /// Edges whose dihedral angle exceeds `sharp_edge_angle_deg` are marked
    /// sharp; within a region, faces connected through non-sharp edges
    /// flood-fill into a smoothing cluster. Each cluster becomes one
    /// [`ExportedMesh`] with one submesh per face label, and per-vertex
    /// normals are the corner-angle-weighted average of the cluster's own
    /// face normals (falling back to +Y when degenerate). Empty outputs
    /// are skipped.
    ///
    /// Returns the meshes and the list of face labels used, in submesh
    /// emission order.
    pub fn export_split(
        &mut self,
        axis_split_counts: [usize; 3],
        sharp_edge_angle_deg: f64,
        index_format: IndexFormat,
    ) -> (Vec<ExportedMesh>, Vec<i32>) {
        if self.vertex_count() == 0 {
            return (Vec::new(), Vec::new());
        }

        self.mark_sharp_edges(sharp_edge_angle_deg);

        // Bin faces into grid cells by face center.
        let faces: Vec<FaceId> = self.face_ids().collect();
        let (bb_min, bb_max) = self.bounding_box().expect("non-empty mesh has a bounding box");
        let splits = [
            axis_split_counts[0].max(1),
            axis_split_counts[1].max(1),
            axis_split_counts[2].max(1),
        ];
        let regions: Vec<usize> = {
            let mesh: &HMesh = self;
            faces
                .par_iter()
                .map(|&f| {
                    let c = mesh.face_center(f);
                    let mut cell = [0usize; 3];
                    for axis in 0..3 {
                        let extent = bb_max[axis] - bb_min[axis];
                        let t = if extent > 0.0 {
                            (c[axis] - bb_min[axis]) / extent
                        } else {
                            0.0
                        };
                        cell[axis] = ((t * splits[axis] as f64) as usize).min(splits[axis] - 1);
                    }
                    cell[0] + cell[1] * splits[0] + cell[2] * splits[0] * splits[1]
                })
                .collect()
        };
        let region_of: HashMap<FaceId, usize> =
            faces.iter().copied().zip(regions.iter().copied()).collect();

        // Flood-fill smoothing clusters inside each region: cross an edge
        // only when it is interior, not sharp, and stays in the region.
        let mut cluster_of: HashMap<FaceId, usize> = HashMap::new();
        let mut cluster_count = 0usize;
        for &f in &faces {
            if cluster_of.contains_key(&f) {
                continue;
            }
            let cluster = cluster_count;
            cluster_count += 1;
            let mut stack = vec![f];
            cluster_of.insert(f, cluster);
            while let Some(cur) = stack.pop() {
                for h in self.circulate_face(cur) {
                    if self.halfedge(h).label != 0 {
                        continue; // sharp
                    }
                    let o = self.opp(h);
                    if !o.is_valid() {
                        continue;
                    }
                    let nf = self.face_of(o);
                    if self.is_face_destroyed(nf)
                        || region_of[&nf] != region_of[&cur]
                        || cluster_of.contains_key(&nf)
                    {
                        continue;
                    }
                    cluster_of.insert(nf, cluster);
                    stack.push(nf);
                }
            }
        }

        // Group faces per cluster, ascending cluster id (assigned in face
        // order, so emission is deterministic).
        let mut cluster_faces: Vec<Vec<FaceId>> = vec![Vec::new(); cluster_count];
        for &f in &faces {
            cluster_faces[cluster_of[&f]].push(f);
        }

        let mut meshes = Vec::new();
        let mut used_materials = Vec::new();
        for members in cluster_faces {
            if members.is_empty() {
                continue;
            }
            let mut labels: Vec<i32> = Vec::new();
            for &f in &members {
                let label = self.face(f).label;
                if !labels.contains(&label) {
                    labels.push(label);
                }
            }
            labels.sort_unstable();

            let mut out = ExportedMesh {
                index_format: Some(index_format),
                submeshes: vec![Vec::new(); labels.len()],
                ..ExportedMesh::default()
            };
            let mut local: HashMap<VertexId, u32> = HashMap::new();
            for &f in &members {
                let cycle = self.circulate_face(f);
                if cycle.len() != 3 {
                    error!(face = ?f, "cannot export non-triangle face; skipped");
                    continue;
                }
                let slot = labels
                    .iter()
                    .position(|&l| l == self.face(f).label)
                    .unwrap_or(0);
                for &h in &cycle {
                    let v = self.vert(h);
                    let idx = *local.entry(v).or_insert_with(|| {
                        let vert = self.vertex(v);
                        out.positions.push(vert.position);
                        out.uv1.push([vert.uv1.x as f32, vert.uv1.y as f32]);
                        out.uv2.push([vert.uv2.x as f32, vert.uv2.y as f32]);
                        (out.positions.len() - 1) as u32
                    });
                    out.submeshes[slot].push(idx);
                }
            }
            if out.positions.is_empty() {
                continue;
            }

            // Cluster-local angle-weighted vertex normals.
            let mut normals = vec![Vector3::zeros(); out.positions.len()];
            for &f in &members {
                let cycle = self.circulate_face(f);
                if cycle.len() != 3 {
                    continue;
                }
                let face_normal = self.face_normal(f);
                for &h in &cycle {
                    let v = self.vert(h);
                    let Some(&idx) = local.get(&v) else { continue };
                    let into = -self.halfedge_direction(h);
                    let outof = self.halfedge_direction(self.next(h));
                    let weight = if into.norm() > 0.0 && outof.norm() > 0.0 {
                        into.angle(&outof)
                    } else {
                        0.0
                    };
                    normals[idx as usize] += face_normal * weight;
                }
            }
            for (i, n) in normals.iter_mut().enumerate() {
                let len = n.norm();
                if len > 0.0 {
                    *n /= len;
                } else {
                    warn!(
                        vertex = i,
                        "degenerate accumulated normal; falling back to +Y"
                    );
                    *n = Vector3::y();
                }
            }
            out.normals = normals;
            out.check_index_width();
            used_materials.extend(labels.iter().copied());
            meshes.push(out);
        }
        (meshes, used_materials)
    }

    /// Axis-aligned bounding box over all live vertices.
    pub fn bounding_box(&self) -> Option<(Point3<f64>, Point3<f64>)> {
        let mut ids = self.vertex_ids();
        let first = ids.next()?;
        let mut min = self.position(first);
        let mut max = min;
        for v in ids {
            let p = self.position(v);
            for axis in 0..3 {
                min[axis] = min[axis].min(p[axis]);
                max[axis] = max[axis].max(p[axis]);
            }
        }
        Some((min, max))
    }

    // ==================== OBJ emit ====================

    /// Emit the mesh in the OBJ text subset: `v` lines for every vertex,
    /// then one `o label<N>` section of `f` lines per distinct face label.
    pub fn export_obj(&self) -> String {
        let mut text = String::new();
        let mut obj_index: HashMap<VertexId, usize> = HashMap::new();
        for (i, v) in self.vertex_ids().enumerate() {
            let p = self.position(v);
            text.push_str(&format!("v {} {} {}\n", p.x, p.y, p.z));
            obj_index.insert(v, i + 1);
        }
        let mut labels: Vec<i32> = Vec::new();
        for f in self.face_ids() {
            let label = self.face(f).label;
            if !labels.contains(&label) {
                labels.push(label);
            }
        }
        labels.sort_unstable();
        for label in labels {
            text.push_str(&format!("o label{}\n", label));
            for f in self.face_ids() {
                if self.face(f).label != label {
                    continue;
                }
                text.push('f');
                for v in self.face_vertices(f) {
                    text.push_str(&format!(" {}", obj_index[&v]));
                }
                text.push('\n');
            }
        }
        text
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mesh::builder::IndexedMeshInput;
    use nalgebra::Matrix4;

    fn tetrahedron() -> HMesh {
        let positions = vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(0.5, 1.0, 0.0),
            Point3::new(0.5, 0.5, 1.0),
        ];
        let triangles = vec![vec![0, 2, 1, 0, 1, 3, 1, 2, 3, 2, 0, 3]];
        let input = IndexedMeshInput::from_triangles(&positions, &triangles);
        let mut mesh = HMesh::new();
        mesh.build_from_indexed(&input, &Matrix4::identity(), 0)
            .unwrap();
        mesh
    }

    #[test]
    fn test_export_roundtrip() {
        let mesh = tetrahedron();
        let exported = mesh.export(false, IndexFormat::UInt32);
        assert_eq!(exported.positions.len(), 4);
        assert_eq!(exported.submeshes.len(), 1);
        assert_eq!(exported.submeshes[0].len(), 12);

        // Rebuild from the exported buffers: same shape comes back.
        let input = IndexedMeshInput::from_triangles(&exported.positions, &exported.submeshes);
        let mut rebuilt = HMesh::new();
        rebuilt
            .build_from_indexed(&input, &Matrix4::identity(), 0)
            .unwrap();
        assert_eq!(rebuilt.vertex_count(), mesh.vertex_count());
        assert_eq!(rebuilt.face_count(), mesh.face_count());
    }

    #[test]
    fn test_export_label_submeshes() {
        let mut mesh = tetrahedron();
        let last = mesh.face_ids().last().unwrap();
        mesh.face_mut(last).label = 7;
        let exported = mesh.export(true, IndexFormat::UInt32);
        assert_eq!(exported.submeshes.len(), 2);
        assert_eq!(exported.submeshes[0].len(), 9);
        assert_eq!(exported.submeshes[1].len(), 3);
    }

    #[test]
    fn test_export_skips_non_triangles() {
        let mesh = HMesh::create_test_mesh_quad();
        let exported = mesh.export(false, IndexFormat::UInt32);
        assert!(exported.submeshes[0].is_empty());
    }

    #[test]
    fn test_export_obj_roundtrip() {
        let mesh = tetrahedron();
        let text = mesh.export_obj();
        let rebuilt = crate::io::obj::parse(&text).unwrap();
        assert_eq!(rebuilt.vertex_count(), 4);
        assert_eq!(rebuilt.face_count(), 4);
        assert!(rebuilt.is_valid(crate::mesh::validate::ValidationRules::STANDARD));
    }

    #[test]
    fn test_export_split_sharp_crease() {
        // Two triangles folded 90 degrees along the shared edge: a low
        // sharp-edge threshold separates them into two smoothing clusters.
        let mut mesh = crate::io::obj::parse(
            "v 0 0 0\nv 1 0 0\nv 0 1 0\nv 1 0 1\nf 1 2 3\nf 2 1 4\n",
        )
        .unwrap();
        let (meshes, _materials) = mesh.export_split([1, 1, 1], 45.0, IndexFormat::UInt32);
        assert_eq!(meshes.len(), 2);
        for m in &meshes {
            assert_eq!(m.positions.len(), 3);
            assert_eq!(m.normals.len(), 3);
            for n in &m.normals {
                assert!((n.norm() - 1.0).abs() < 1e-9);
            }
        }

        // With a permissive threshold the fold smooths into one cluster.
        let (meshes, _materials) = mesh.export_split([1, 1, 1], 170.0, IndexFormat::UInt32);
        assert_eq!(meshes.len(), 1);
        assert_eq!(meshes[0].positions.len(), 4);
    }

    #[test]
    fn test_export_split_grid_regions() {
        // Two triangles far apart on the x axis end up in different cells.
        let mut mesh = crate::io::obj::parse(
            "v 0 0 0\nv 1 0 0\nv 0 0 1\nv 10 0 0\nv 11 0 0\nv 10 0 1\nf 1 2 3\nf 4 5 6\n",
        )
        .unwrap();
        let (meshes, _materials) = mesh.export_split([2, 1, 1], 44.9, IndexFormat::UInt32);
        assert_eq!(meshes.len(), 2);
    }

    #[test]
    fn test_export_split_empty_mesh() {
        let mut mesh = HMesh::new();
        let (meshes, materials) = mesh.export_split([2, 2, 2], 45.0, IndexFormat::UInt32);
        assert!(meshes.is_empty());
        assert!(materials.is_empty());
    }
}
