//! Priority-queue-driven local mesh optimization.
//!
//! [`priority_queue_optimization`] greedily flips interior edges to
//! minimize an energy functional. Every flippable edge whose flip lowers
//! the energy goes into a min-heap; popping the best entry flips it and
//! re-enqueues the one-rings of the four affected vertices. Stale heap
//! entries are detected with per-edge version counters, and a per-vertex
//! flip budget keeps a pathological region from spinning.

use std::cmp::Ordering;
use std::collections::{BinaryHeap, HashMap};

use nalgebra::{Point3, Vector3};

use crate::mesh::{HMesh, HalfedgeId, VertexId};

/// Flips allowed per vertex in one optimization run — roughly the average
/// valence, so no vertex has its whole fan rewritten more than once.
const VERTEX_FLIP_BUDGET: usize = 6;

/// An energy functional over interior triangle-pair edges.
///
/// `delta_energy` is the change in the objective if the edge were flipped;
/// negative is an improvement. Ineligible edges should return
/// `f64::INFINITY`.
pub trait FlipEnergy {
    /// Energy change from flipping `h`. Lower (more negative) is better.
    fn delta_energy(&self, mesh: &HMesh, h: HalfedgeId) -> f64;
}

/// Maximizes the minimum interior angle of the two triangles (by
/// minimizing its negation) — the classic Delaunay-flavored criterion.
#[derive(Debug, Default)]
pub struct MinAngleEnergy;

/// Minimizes the dihedral angle across the edge, favoring locally flat
/// configurations.
#[derive(Debug, Default)]
pub struct DihedralEnergy;

/// Regularizes vertex valences toward 6 (4 on the boundary).
#[derive(Debug, Default)]
pub struct ValencyEnergy;

/// The four corners of the quadrilateral around an interior edge:
/// the edge endpoints `a`, `b` and the opposite apexes `c`, `d`.
fn edge_quad(mesh: &HMesh, h: HalfedgeId) -> Option<[VertexId; 4]> {
    let o = mesh.opp(h);
    if !o.is_valid() || mesh.is_halfedge_destroyed(o) {
        return None;
    }
    if mesh.face_edge_count(mesh.face_of(h)) != 3 || mesh.face_edge_count(mesh.face_of(o)) != 3 {
        return None;
    }
    Some([
        mesh.source(h),
        mesh.vert(h),
        mesh.vert(mesh.next(h)),
        mesh.vert(mesh.next(o)),
    ])
}

/// Smallest interior angle of a triangle; zero when degenerate.
fn min_angle(p: Point3<f64>, q: Point3<f64>, r: Point3<f64>) -> f64 {
    let sides = [(q - p, r - p), (p - q, r - q), (p - r, q - r)];
    let mut smallest = f64::INFINITY;
    for (u, v) in sides {
        if u.norm_squared() == 0.0 || v.norm_squared() == 0.0 {
            return 0.0;
        }
        smallest = smallest.min(u.angle(&v));
    }
    smallest
}

fn triangle_normal(p: Point3<f64>, q: Point3<f64>, r: Point3<f64>) -> Vector3<f64> {
    (q - p).cross(&(r - p))
}

impl FlipEnergy for MinAngleEnergy {
    fn delta_energy(&self, mesh: &HMesh, h: HalfedgeId) -> f64 {
        let Some([a, b, c, d]) = edge_quad(mesh, h) else {
            return f64::INFINITY;
        };
        let (pa, pb, pc, pd) = (
            mesh.position(a),
            mesh.position(b),
            mesh.position(c),
            mesh.position(d),
        );
        let before = min_angle(pa, pb, pc).min(min_angle(pb, pa, pd));
        let after = min_angle(pa, pd, pc).min(min_angle(pd, pb, pc));
        // Energy is the negated minimum angle.
        -after - (-before)
    }
}

impl FlipEnergy for DihedralEnergy {
    fn delta_energy(&self, mesh: &HMesh, h: HalfedgeId) -> f64 {
        let Some([a, b, c, d]) = edge_quad(mesh, h) else {
            return f64::INFINITY;
        };
        let (pa, pb, pc, pd) = (
            mesh.position(a),
            mesh.position(b),
            mesh.position(c),
            mesh.position(d),
        );
        let n1 = triangle_normal(pa, pb, pc);
        let n2 = triangle_normal(pb, pa, pd);
        let m1 = triangle_normal(pa, pd, pc);
        let m2 = triangle_normal(pd, pb, pc);
        if n1.norm_squared() == 0.0
            || n2.norm_squared() == 0.0
            || m1.norm_squared() == 0.0
            || m2.norm_squared() == 0.0
        {
            return f64::INFINITY;
        }
        m1.angle(&m2) - n1.angle(&n2)
    }
}

impl FlipEnergy for ValencyEnergy {
    fn delta_energy(&self, mesh: &HMesh, h: HalfedgeId) -> f64 {
        let Some([a, b, c, d]) = edge_quad(mesh, h) else {
            return f64::INFINITY;
        };
        let deviation = |v: VertexId, shift: i64| -> f64 {
            let optimal = if mesh.is_boundary_vertex(v) { 4 } else { 6 };
            let val = mesh.vertex_valency(v) as i64 + shift;
            ((val - optimal) * (val - optimal)) as f64
        };
        // Flipping takes one edge from a and b and gives one to c and d.
        let before = deviation(a, 0) + deviation(b, 0) + deviation(c, 0) + deviation(d, 0);
        let after = deviation(a, -1) + deviation(b, -1) + deviation(c, 1) + deviation(d, 1);
        after - before
    }
}

/// Constraints and tolerances for [`priority_queue_optimization`].
#[derive(Debug, Clone)]
pub struct OptimizerOptions {
    /// Never flip across a face-label border, preserving region structure.
    pub face_label_constrain: bool,
    /// Never flip an edge whose faces meet at more than `epsilon_angle`,
    /// preserving surface features.
    pub face_normal_constrain: bool,
    /// Dihedral angle (radians) above which `face_normal_constrain`
    /// blocks a flip.
    pub epsilon_angle: f64,
}

impl Default for OptimizerOptions {
    fn default() -> Self {
        Self {
            face_label_constrain: false,
            face_normal_constrain: false,
            epsilon_angle: 0.01,
        }
    }
}

impl OptimizerOptions {
    /// Enable the face-label constraint.
    pub fn with_face_label_constrain(mut self, on: bool) -> Self {
        self.face_label_constrain = on;
        self
    }

    /// Enable the face-normal constraint with the given angle threshold
    /// (radians).
    pub fn with_face_normal_constrain(mut self, on: bool, epsilon_angle: f64) -> Self {
        self.face_normal_constrain = on;
        self.epsilon_angle = epsilon_angle;
        self
    }
}

/// A heap entry: an edge, its energy delta at enqueue time, and the edge
/// version it was computed against.
#[derive(Debug, Clone, Copy)]
struct FlipCandidate {
    delta: f64,
    h: HalfedgeId,
    stamp: u64,
}

impl PartialEq for FlipCandidate {
    fn eq(&self, other: &Self) -> bool {
        self.delta == other.delta && self.h == other.h
    }
}

impl Eq for FlipCandidate {}

impl PartialOrd for FlipCandidate {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for FlipCandidate {
    fn cmp(&self, other: &Self) -> Ordering {
        // Reversed for a min-heap; ties broken on the handle so ordering
        // is deterministic.
        other
            .delta
            .partial_cmp(&self.delta)
            .unwrap_or(Ordering::Equal)
            .then_with(|| other.h.cmp(&self.h))
    }
}

/// Greedy energy minimization by edge flipping. Returns the number of
/// flips performed.
pub fn priority_queue_optimization(
    mesh: &mut HMesh,
    energy: &dyn FlipEnergy,
    options: &OptimizerOptions,
) -> usize {
    let mut heap: BinaryHeap<FlipCandidate> = BinaryHeap::new();
    let mut versions: HashMap<HalfedgeId, u64> = HashMap::new();
    let mut flips_at: HashMap<VertexId, usize> = HashMap::new();

    // Seed with every improving interior edge, canonicalized to the
    // smaller handle of each twin pair.
    let seeds: Vec<HalfedgeId> = mesh
        .halfedge_ids()
        .filter(|&h| {
            let o = mesh.opp(h);
            o.is_valid() && h < o
        })
        .collect();
    for h in seeds {
        push_if_improving(mesh, energy, options, &versions, &mut heap, h);
    }

    let mut flips = 0;
    while let Some(candidate) = heap.pop() {
        let h = candidate.h;
        if mesh.is_halfedge_destroyed(h) {
            continue;
        }
        if candidate.stamp != versions.get(&h).copied().unwrap_or(0) {
            continue; // superseded; the touch that bumped it re-enqueued
        }
        if !flip_allowed(mesh, options, h) {
            continue;
        }
        let Some([a, b, c, d]) = edge_quad(mesh, h) else {
            continue;
        };
        if flips_at.get(&a).copied().unwrap_or(0) >= VERTEX_FLIP_BUDGET
            || flips_at.get(&b).copied().unwrap_or(0) >= VERTEX_FLIP_BUDGET
        {
            continue;
        }

        mesh.flip_edge(h);
        flips += 1;
        for v in [a, b, c, d] {
            *flips_at.entry(v).or_insert(0) += 1;
        }

        // Touch and re-enqueue the one-rings of all four corners.
        for v in [a, b, c, d] {
            for out in mesh.circulate_vertex(v) {
                let e = canonical(mesh, out);
                *versions.entry(e).or_insert(0) += 1;
                push_if_improving(mesh, energy, options, &versions, &mut heap, e);
            }
        }
    }
    flips
}

fn canonical(mesh: &HMesh, h: HalfedgeId) -> HalfedgeId {
    let o = mesh.opp(h);
    if o.is_valid() && o < h {
        o
    } else {
        h
    }
}

fn flip_allowed(mesh: &HMesh, options: &OptimizerOptions, h: HalfedgeId) -> bool {
    if !mesh.flip_precondition(h) {
        return false;
    }
    let o = mesh.opp(h);
    let f1 = mesh.face_of(h);
    let f2 = mesh.face_of(o);
    if options.face_label_constrain && mesh.face(f1).label != mesh.face(f2).label {
        return false;
    }
    if options.face_normal_constrain {
        let n1 = mesh.face_normal(f1);
        let n2 = mesh.face_normal(f2);
        if n1.norm_squared() == 0.0 || n2.norm_squared() == 0.0 {
            return false;
        }
        if n1.angle(&n2) > options.epsilon_angle {
            return false;
        }
    }
    true
}

fn push_if_improving(
    mesh: &HMesh,
    energy: &dyn FlipEnergy,
    options: &OptimizerOptions,
    versions: &HashMap<HalfedgeId, u64>,
    heap: &mut BinaryHeap<FlipCandidate>,
    h: HalfedgeId,
) {
    if mesh.is_halfedge_destroyed(h) || !flip_allowed(mesh, options, h) {
        return;
    }
    let delta = energy.delta_energy(mesh, h);
    if delta < 0.0 {
        heap.push(FlipCandidate {
            delta,
            h,
            stamp: versions.get(&h).copied().unwrap_or(0),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mesh::ValidationRules;
    use nalgebra::Point3;

    /// A flat kite triangulated along its long diagonal — flipping to the
    /// short diagonal strictly improves the minimum angle.
    fn kite_quad() -> HMesh {
        crate::io::obj::parse(
            "v 0 0 0\nv 10 0 0\nv 5 0 1\nv 5 0 -1\nf 1 2 3\nf 2 1 4\n",
        )
        .unwrap()
    }

    fn find_vertex(mesh: &HMesh, p: Point3<f64>) -> crate::mesh::VertexId {
        mesh.vertex_ids()
            .find(|&v| (mesh.position(v) - p).norm() < 1e-12)
            .unwrap()
    }

    #[test]
    fn test_min_angle_energy_prefers_short_diagonal() {
        let mesh = kite_quad();
        let a = find_vertex(&mesh, Point3::new(0.0, 0.0, 0.0));
        let b = find_vertex(&mesh, Point3::new(10.0, 0.0, 0.0));
        let diagonal = mesh.shared_edge(a, b).unwrap();
        assert!(MinAngleEnergy.delta_energy(&mesh, diagonal) < 0.0);
    }

    #[test]
    fn test_min_angle_energy_infinite_on_boundary() {
        let mesh = kite_quad();
        let rim = mesh
            .halfedge_ids()
            .find(|&h| mesh.is_boundary_halfedge(h))
            .unwrap();
        assert_eq!(MinAngleEnergy.delta_energy(&mesh, rim), f64::INFINITY);
    }

    #[test]
    fn test_priority_queue_flips_kite() {
        let mut mesh = kite_quad();
        let flips =
            priority_queue_optimization(&mut mesh, &MinAngleEnergy, &OptimizerOptions::default());
        assert_eq!(flips, 1);
        assert!(mesh.is_valid(ValidationRules::STANDARD));
        let c = find_vertex(&mesh, Point3::new(5.0, 0.0, 1.0));
        let d = find_vertex(&mesh, Point3::new(5.0, 0.0, -1.0));
        assert!(mesh.shared_edge(c, d).is_some(), "short diagonal expected");
    }

    #[test]
    fn test_label_constraint_blocks_flip() {
        let mut mesh = kite_quad();
        let faces: Vec<_> = mesh.face_ids().collect();
        mesh.face_mut(faces[1]).label = 1;
        let options = OptimizerOptions::default().with_face_label_constrain(true);
        let flips = priority_queue_optimization(&mut mesh, &MinAngleEnergy, &options);
        assert_eq!(flips, 0);
    }

    #[test]
    fn test_normal_constraint_blocks_folded_flip() {
        // The kite folded along its long diagonal: with the feature
        // constraint on, the crease survives.
        let mut mesh = crate::io::obj::parse(
            "v 0 0 0\nv 10 0 0\nv 5 1 1\nv 5 0 -1\nf 1 2 3\nf 2 1 4\n",
        )
        .unwrap();
        let options = OptimizerOptions::default().with_face_normal_constrain(true, 0.01);
        let flips = priority_queue_optimization(&mut mesh, &MinAngleEnergy, &options);
        assert_eq!(flips, 0);
    }

    #[test]
    fn test_valency_energy_counts_shift() {
        let mesh = kite_quad();
        let a = find_vertex(&mesh, Point3::new(0.0, 0.0, 0.0));
        let b = find_vertex(&mesh, Point3::new(10.0, 0.0, 0.0));
        let diagonal = mesh.shared_edge(a, b).unwrap();
        // All four corners are boundary (optimal 4); the flip shifts one
        // edge from the diagonal endpoints to the apexes, keeping the
        // total deviation.
        let delta = ValencyEnergy.delta_energy(&mesh, diagonal);
        assert!(delta <= 0.0);
    }

    #[test]
    fn test_dihedral_energy_flat_pair_is_neutral() {
        let mesh = kite_quad();
        let a = find_vertex(&mesh, Point3::new(0.0, 0.0, 0.0));
        let b = find_vertex(&mesh, Point3::new(10.0, 0.0, 0.0));
        let diagonal = mesh.shared_edge(a, b).unwrap();
        let delta = DihedralEnergy.delta_energy(&mesh, diagonal);
        assert!(delta.abs() < 1e-9, "coplanar pair has no dihedral gain");
    }

    #[test]
    fn test_optimization_terminates_on_grid() {
        // A 3x3 grid triangulated with consistently skewed diagonals.
        let mut text = String::new();
        for j in 0..4 {
            for i in 0..4 {
                text.push_str(&format!("v {} 0 {}\n", i, j));
            }
        }
        for j in 0..3 {
            for i in 0..3 {
                let v00 = j * 4 + i + 1;
                let v10 = v00 + 1;
                let v01 = v00 + 4;
                let v11 = v01 + 1;
                text.push_str(&format!("f {} {} {}\n", v00, v10, v11));
                text.push_str(&format!("f {} {} {}\n", v00, v11, v01));
            }
        }
        let mut mesh = crate::io::obj::parse(&text).unwrap();
        priority_queue_optimization(&mut mesh, &MinAngleEnergy, &OptimizerOptions::default());
        assert!(mesh.is_valid(ValidationRules::STANDARD));
        for f in mesh.face_ids() {
            assert_eq!(mesh.face_edge_count(f), 3);
        }
    }
}
