//! Wavefront OBJ subset support.
//!
//! The parser understands three line kinds:
//!
//! * `v x y z` — a vertex position (three doubles),
//! * `o ...` — a region marker; each one bumps the label given to the
//!   faces that follow,
//! * `f i1 i2 ... ik` — a polygon of arbitrary degree with 1-based vertex
//!   indices; `/texcoord/normal` suffixes are accepted and ignored.
//!
//! Everything else is skipped. Faces are glued against a lookup of the
//! directed edges seen so far, except degenerate 2-gons, whose two sides
//! would otherwise glue an edge to itself.

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use nalgebra::Point3;
use tracing::warn;

use crate::error::{MeshError, Result};
use crate::mesh::{HMesh, HalfedgeId, VertexId};

impl HMesh {
    /// Build mesh content from OBJ text, splitting non-manifold vertices
    /// afterwards.
    pub fn build_from_obj(&mut self, text: &str) -> Result<()> {
        self.build_from_obj_opts(text, true)
    }

    /// Build mesh content from OBJ text.
    ///
    /// With `split_non_manifold_vertices` disabled the mesh may come out
    /// with pinched vertices — only useful for callers that run the repair
    /// themselves.
    pub fn build_from_obj_opts(
        &mut self,
        text: &str,
        split_non_manifold_vertices: bool,
    ) -> Result<()> {
        let mut vertices: Vec<VertexId> = Vec::new();
        let mut edge_map: HashMap<(usize, usize), HalfedgeId> = HashMap::new();
        let mut region: i32 = -1;

        for (line_no, raw) in text.lines().enumerate() {
            let line = raw.trim();
            let mut tokens = line.split_whitespace();
            match tokens.next() {
                Some("v") => {
                    let mut coord = |what: &str| -> Result<f64> {
                        tokens
                            .next()
                            .ok_or_else(|| MeshError::ParseError {
                                line: line_no + 1,
                                message: format!("vertex is missing {}", what),
                            })?
                            .parse::<f64>()
                            .map_err(|e| MeshError::ParseError {
                                line: line_no + 1,
                                message: format!("bad {} coordinate: {}", what, e),
                            })
                    };
                    let x = coord("x")?;
                    let y = coord("y")?;
                    let z = coord("z")?;
                    vertices.push(self.create_vertex_at(Point3::new(x, y, z)));
                }
                Some("o") => {
                    region += 1;
                }
                Some("f") => {
                    let mut indices: Vec<usize> = Vec::new();
                    for token in tokens {
                        // Only the vertex index before the first '/' matters.
                        let head = token.split('/').next().unwrap_or("");
                        let idx: i64 = head.parse().map_err(|e| MeshError::ParseError {
                            line: line_no + 1,
                            message: format!("bad face index {:?}: {}", token, e),
                        })?;
                        if idx < 1 || idx as usize > vertices.len() {
                            return Err(MeshError::ParseError {
                                line: line_no + 1,
                                message: format!(
                                    "face index {} out of range 1..={}",
                                    idx,
                                    vertices.len()
                                ),
                            });
                        }
                        indices.push(idx as usize - 1);
                    }
                    if indices.len() < 2 {
                        return Err(MeshError::ParseError {
                            line: line_no + 1,
                            message: "face needs at least 2 indices".to_string(),
                        });
                    }
                    self.add_obj_face(&vertices, &indices, region.max(0), &mut edge_map);
                }
                _ => {} // comments, materials, anything else
            }
        }

        if split_non_manifold_vertices {
            self.split_non_manifold_vertices();
        }
        Ok(())
    }

    /// Create one face cycle of arbitrary degree and glue it against the
    /// edges seen so far. Degenerate 2-gons are kept but not glued.
    fn add_obj_face(
        &mut self,
        vertices: &[VertexId],
        indices: &[usize],
        label: i32,
        edge_map: &mut HashMap<(usize, usize), HalfedgeId>,
    ) {
        let k = indices.len();
        let f = self.create_face();
        self.face_mut(f).label = label;
        let hes: Vec<HalfedgeId> = (0..k).map(|_| self.create_halfedge()).collect();
        for i in 0..k {
            let from = indices[i];
            let to = indices[(i + 1) % k];
            self.set_halfedge_vert(hes[i], vertices[to]);
            self.link_halfedges(hes[i], hes[(i + 1) % k]);
            self.link_halfedge_face(hes[i], f);
            if k == 2 {
                // A 2-gon's two sides connect the same vertex pair; gluing
                // would pair an edge with itself.
                warn!(face = ?f, "degenerate 2-gon face; edges left unglued");
                continue;
            }
            if let Some(&twin) = edge_map.get(&(to, from)) {
                if !self.is_halfedge_destroyed(twin)
                    && !self.opp(twin).is_valid()
                    && !self.opp(hes[i]).is_valid()
                {
                    self.glue(hes[i], twin);
                }
            }
            if edge_map.insert((from, to), hes[i]).is_some() {
                warn!(from, to, "duplicate directed edge in OBJ input");
            }
        }
        self.face_mut(f).halfedge = hes[0];
    }
}

/// Parse OBJ text into a fresh mesh with default tolerances.
pub fn parse(text: &str) -> Result<HMesh> {
    let mut mesh = HMesh::new();
    mesh.build_from_obj(text)?;
    Ok(mesh)
}

/// Load a mesh from an OBJ file.
pub fn load<P: AsRef<Path>>(path: P) -> Result<HMesh> {
    let path = path.as_ref();
    let text = fs::read_to_string(path)?;
    parse(&text).map_err(|e| MeshError::LoadError {
        path: path.to_path_buf(),
        message: e.to_string(),
    })
}

/// Save a mesh to an OBJ file.
pub fn save<P: AsRef<Path>>(mesh: &HMesh, path: P) -> Result<()> {
    let path = path.as_ref();
    fs::write(path, mesh.export_obj()).map_err(|e| MeshError::SaveError {
        path: path.to_path_buf(),
        message: e.to_string(),
    })
}
