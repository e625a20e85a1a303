//! Bulk mesh construction from indexed triangle data.
//!
//! This is the flat-array front door: vertex positions (plus optional UV
//! channels) and per-submesh triangle index triples go in, a fully glued
//! half-edge graph comes out. Twin gluing uses a hash map keyed by the
//! ordered (from, to) vertex-index pair, processed in face order with a
//! key-ordering tie-break so each undirected pair is glued exactly once.

use std::collections::HashMap;

use nalgebra::{Matrix4, Point3, Vector2};
use tracing::warn;

use super::hmesh::HMesh;
use super::index::{HalfedgeId, VertexId};
use crate::error::{MeshError, Result};

/// Flat indexed-triangle input for [`HMesh::build_from_indexed`].
///
/// Positions are double precision; UV channels are optional and, when
/// present, must match the position count. Each submesh is a flat list of
/// vertex indices, three per triangle.
#[derive(Debug, Clone, Copy)]
pub struct IndexedMeshInput<'a> {
    /// Vertex positions.
    pub positions: &'a [Point3<f64>],
    /// First UV channel, one entry per position.
    pub uv1: Option<&'a [[f32; 2]]>,
    /// Second UV channel, one entry per position.
    pub uv2: Option<&'a [[f32; 2]]>,
    /// Triangle index triples, one list per submesh.
    pub submeshes: &'a [Vec<u32>],
}

impl<'a> IndexedMeshInput<'a> {
    /// Input with positions and a single submesh, no UVs.
    pub fn from_triangles(positions: &'a [Point3<f64>], triangles: &'a [Vec<u32>]) -> Self {
        Self {
            positions,
            uv1: None,
            uv2: None,
            submeshes: triangles,
        }
    }
}

impl HMesh {
    /// Build the half-edge graph for one submesh of an indexed triangle
    /// mesh, with `transform` applied to every position.
    ///
    /// One vertex is created per input vertex; vertices used by no triangle
    /// of the submesh are destroyed again after gluing. Faces are labeled
    /// with the submesh index. Construction finishes by splitting
    /// non-manifold vertices, so the result circulates consistently even
    /// for pinched input.
    pub fn build_from_indexed(
        &mut self,
        input: &IndexedMeshInput<'_>,
        transform: &Matrix4<f64>,
        submesh_index: usize,
    ) -> Result<()> {
        let triangles = input
            .submeshes
            .get(submesh_index)
            .ok_or(MeshError::InvalidSubmesh {
                submesh: submesh_index,
                count: input.submeshes.len(),
            })?;
        if triangles.len() % 3 != 0 {
            return Err(MeshError::ParseError {
                line: 0,
                message: format!(
                    "index buffer length {} is not a multiple of 3",
                    triangles.len()
                ),
            });
        }
        for (i, &idx) in triangles.iter().enumerate() {
            if idx as usize >= input.positions.len() {
                return Err(MeshError::InvalidVertexIndex {
                    face: i / 3,
                    vertex: idx as usize,
                });
            }
        }

        // One vertex per input vertex, transform applied, UVs carried.
        let vertex_ids: Vec<VertexId> = input
            .positions
            .iter()
            .enumerate()
            .map(|(i, p)| {
                let v = self.create_vertex_at(transform.transform_point(p));
                if let Some(uv1) = input.uv1 {
                    self.vertex_mut(v).uv1 = Vector2::new(uv1[i][0] as f64, uv1[i][1] as f64);
                }
                if let Some(uv2) = input.uv2 {
                    self.vertex_mut(v).uv2 = Vector2::new(uv2[i][0] as f64, uv2[i][1] as f64);
                }
                v
            })
            .collect();

        // First pass: one face cycle per triangle, and a lookup of every
        // directed edge.
        let mut edge_map: HashMap<(u32, u32), HalfedgeId> = HashMap::new();
        let mut face_edges: Vec<(u32, u32, HalfedgeId)> = Vec::new();
        for tri in triangles.chunks_exact(3) {
            let f = self.create_face();
            self.face_mut(f).label = submesh_index as i32;
            let hes = [
                self.create_halfedge(),
                self.create_halfedge(),
                self.create_halfedge(),
            ];
            for i in 0..3 {
                let from = tri[i];
                let to = tri[(i + 1) % 3];
                self.set_halfedge_vert(hes[i], vertex_ids[to as usize]);
                self.link_halfedges(hes[i], hes[(i + 1) % 3]);
                self.link_halfedge_face(hes[i], f);
                if edge_map.insert((from, to), hes[i]).is_some() {
                    warn!(
                        from,
                        to, "duplicate directed edge in triangle soup; mesh is non-manifold"
                    );
                }
                face_edges.push((from, to, hes[i]));
            }
            self.face_mut(f).halfedge = hes[0];
        }

        // Second pass: glue twins. Iterating the recorded edges in creation
        // order (not the hash map) keeps the result deterministic, and the
        // key-ordering tie-break glues each undirected pair exactly once.
        for &(from, to, he) in &face_edges {
            if from >= to {
                continue;
            }
            if let Some(&twin) = edge_map.get(&(to, from)) {
                if !self.opp(he).is_valid() && !self.opp(twin).is_valid() {
                    self.glue(he, twin);
                }
            }
        }

        // Vertices no triangle referenced never became part of the graph.
        for v in vertex_ids {
            if self.incoming_halfedges(v).is_empty() {
                self.destroy_vertex(v);
            }
        }

        self.split_non_manifold_vertices();
        Ok(())
    }
}
