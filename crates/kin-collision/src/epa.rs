//! EPA (Expanding Polytope Algorithm) penetration queries.
//!
//! Starting from a GJK terminal tetrahedron known to enclose the origin, EPA
//! expands a polytope of triangular faces in Minkowski-difference space until
//! the face nearest the origin stops moving. That face gives the penetration
//! depth and contact normal; its barycentric coordinates interpolate a
//! contact point on shape A.
//!
//! Polytope faces and horizon edges live in growable `Vec`s; the face count
//! is capped (degenerate support geometry can otherwise grow the polytope
//! without bound) and hitting the cap ends expansion with the best estimate
//! found so far.

use kin_types::Pose;
use nalgebra::{Point3, Vector3};
use tracing::warn;

use crate::gjk::{support_minkowski, MinkowskiPoint, Simplex, EPSILON};
use crate::ConvexShape;

/// Default maximum EPA expansion iterations.
pub const EPA_MAX_ITERATIONS: usize = 64;

/// Default cap on polytope faces.
pub const EPA_MAX_FACES: usize = 128;

/// EPA convergence tolerance: expansion stops once a new support point is no
/// further from the origin than the closest face by more than this.
const EPA_TOLERANCE: f64 = 1e-5;

/// Result of EPA (penetration information).
#[derive(Debug, Clone)]
pub struct EpaResult {
    /// Penetration depth (positive while overlapping).
    pub depth: f64,
    /// Contact normal, pointing from shape B toward shape A: translating A by
    /// `normal * depth` separates the shapes.
    pub normal: Vector3<f64>,
    /// Contact point on the surface of shape A, interpolated from the
    /// closest face's witness points.
    pub contact_point: Point3<f64>,
    /// Number of iterations used.
    pub iterations: usize,
}

/// A face in the EPA polytope.
#[derive(Debug, Clone)]
struct EpaFace {
    /// Indices of the three vertices forming this face.
    vertices: [usize; 3],
    /// Outward-facing normal of the face.
    normal: Vector3<f64>,
    /// Distance from the origin to the face plane (along the normal).
    distance: f64,
}

/// Run EPA to find penetration depth, contact normal, and contact point.
///
/// Should only be called after GJK has determined that the shapes intersect;
/// the GJK terminal simplex seeds the polytope. Returns `None` if a
/// non-degenerate starting tetrahedron cannot be built (very thin or
/// coincident shapes).
#[must_use]
#[allow(clippy::too_many_arguments)]
pub fn epa_query(
    shape_a: &ConvexShape,
    pose_a: &Pose,
    shape_b: &ConvexShape,
    pose_b: &Pose,
    simplex: &Simplex,
    max_iterations: usize,
    max_faces: usize,
) -> Option<EpaResult> {
    if simplex.len() < 4 {
        // GJK can terminate on a lower-dimensional simplex when the origin
        // lies on its boundary; pad it out to a tetrahedron first.
        return epa_with_expanded_simplex(
            shape_a,
            pose_a,
            shape_b,
            pose_b,
            simplex,
            max_iterations,
            max_faces,
        );
    }

    let mut vertices: Vec<MinkowskiPoint> = simplex.points().to_vec();
    let mut faces: Vec<EpaFace> = Vec::with_capacity(max_faces.min(EPA_MAX_FACES));

    for indices in [[0, 1, 2], [0, 2, 3], [0, 3, 1], [1, 3, 2]] {
        if let Some(face) = create_face(&vertices, indices) {
            faces.push(face);
        }
    }

    if faces.is_empty() {
        return None;
    }

    fix_face_orientations(&vertices, &mut faces);

    for iteration in 0..max_iterations {
        let closest_idx = find_closest_face(&faces)?;
        let closest = faces[closest_idx].clone();

        // Expand along the closest face's outward normal
        let new_point = support_minkowski(shape_a, pose_a, shape_b, pose_b, &closest.normal);

        let new_distance = new_point.point.coords.dot(&closest.normal);
        if new_distance - closest.distance < EPA_TOLERANCE {
            // The boundary cannot be pushed further: converged
            return Some(build_result(&vertices, &closest, iteration));
        }

        let new_vertex_idx = vertices.len();
        vertices.push(new_point);

        // Remove every face the new point can see, collecting the horizon
        // edges left exposed. An edge shared by two removed faces cancels
        // out of the list entirely.
        let mut edges: Vec<(usize, usize)> = Vec::new();
        let mut i = 0;
        while i < faces.len() {
            let face = &faces[i];
            let face_point = vertices[face.vertices[0]].point;
            let to_new = new_point.point - face_point;

            if face.normal.dot(&to_new) > EPSILON {
                let v = face.vertices;
                add_edge(&mut edges, v[0], v[1]);
                add_edge(&mut edges, v[1], v[2]);
                add_edge(&mut edges, v[2], v[0]);
                faces.swap_remove(i);
            } else {
                i += 1;
            }
        }

        // Re-triangulate the hole against the new vertex
        for (v1, v2) in edges {
            if let Some(face) = create_face(&vertices, [new_vertex_idx, v1, v2]) {
                faces.push(face);
            }
        }

        if faces.len() > max_faces {
            warn!(
                faces = faces.len(),
                max_faces, "EPA polytope exceeded face cap; returning best estimate"
            );
            break;
        }
    }

    // Budget exhausted: the best available face is still a valid approximate
    // answer for the caller.
    let closest_idx = find_closest_face(&faces)?;
    let closest = faces[closest_idx].clone();
    Some(build_result(&vertices, &closest, max_iterations))
}

/// Assemble an [`EpaResult`] from the winning face.
///
/// The contact point interpolates the face's per-vertex `support_a` witness
/// points with the barycentric coordinates of the origin's projection onto
/// the face, yielding a point on the surface of shape A.
fn build_result(vertices: &[MinkowskiPoint], face: &EpaFace, iterations: usize) -> EpaResult {
    let a = &vertices[face.vertices[0]];
    let b = &vertices[face.vertices[1]];
    let c = &vertices[face.vertices[2]];

    let projection = Point3::from(face.normal * face.distance);
    let (u, v, w) = barycentric(&a.point, &b.point, &c.point, &projection);

    let contact_point = Point3::from(
        a.support_a.coords * u + b.support_a.coords * v + c.support_a.coords * w,
    );

    EpaResult {
        depth: face.distance,
        // Face normals point outward in A - B space; the separating push on
        // A is the opposite direction, i.e. from B toward A.
        normal: -face.normal,
        contact_point,
        iterations,
    }
}

/// Barycentric coordinates of `p` with respect to triangle `(a, b, c)`.
///
/// Degenerate triangles fall back to the first vertex. Coordinates are
/// clamped to the triangle so a projection slightly outside it cannot
/// extrapolate the witness points.
fn barycentric(
    a: &Point3<f64>,
    b: &Point3<f64>,
    c: &Point3<f64>,
    p: &Point3<f64>,
) -> (f64, f64, f64) {
    let v0 = b - a;
    let v1 = c - a;
    let v2 = p - a;

    let d00 = v0.dot(&v0);
    let d01 = v0.dot(&v1);
    let d11 = v1.dot(&v1);
    let d20 = v2.dot(&v0);
    let d21 = v2.dot(&v1);

    let denom = d00 * d11 - d01 * d01;
    if denom.abs() < EPSILON {
        return (1.0, 0.0, 0.0);
    }

    let v = ((d11 * d20 - d01 * d21) / denom).clamp(0.0, 1.0);
    let w = ((d00 * d21 - d01 * d20) / denom).clamp(0.0, 1.0 - v);
    let u = 1.0 - v - w;

    (u, v, w)
}

/// Pad a lower-dimensional simplex out to a tetrahedron, then run EPA.
#[allow(clippy::too_many_arguments)]
fn epa_with_expanded_simplex(
    shape_a: &ConvexShape,
    pose_a: &Pose,
    shape_b: &ConvexShape,
    pose_b: &Pose,
    simplex: &Simplex,
    max_iterations: usize,
    max_faces: usize,
) -> Option<EpaResult> {
    let mut vertices: Vec<MinkowskiPoint> = simplex.points().to_vec();

    let search_dirs = [
        Vector3::x(),
        Vector3::y(),
        Vector3::z(),
        -Vector3::x(),
        -Vector3::y(),
        -Vector3::z(),
    ];

    for dir in &search_dirs {
        if vertices.len() >= 4 {
            break;
        }

        let new_point = support_minkowski(shape_a, pose_a, shape_b, pose_b, dir);
        let is_new = vertices
            .iter()
            .all(|v| (v.point - new_point.point).norm() > EPSILON);

        if is_new {
            vertices.push(new_point);
        }
    }

    if vertices.len() < 4 {
        // Shapes are too thin to span a tetrahedron
        return None;
    }

    let mut new_simplex = Simplex::new();
    for v in vertices.iter().take(4) {
        new_simplex.push(*v);
    }

    epa_query(
        shape_a,
        pose_a,
        shape_b,
        pose_b,
        &new_simplex,
        max_iterations,
        max_faces,
    )
}

/// Create a face from three vertex indices, or `None` if degenerate.
fn create_face(vertices: &[MinkowskiPoint], indices: [usize; 3]) -> Option<EpaFace> {
    let a = vertices[indices[0]].point;
    let b = vertices[indices[1]].point;
    let c = vertices[indices[2]].point;

    let normal = (b - a).cross(&(c - a));
    let norm = normal.norm();
    if norm < EPSILON {
        return None;
    }

    let normal = normal / norm;
    let distance = a.coords.dot(&normal);

    Some(EpaFace {
        vertices: indices,
        normal,
        distance,
    })
}

/// Flip any face whose normal points back at the polytope centroid.
fn fix_face_orientations(vertices: &[MinkowskiPoint], faces: &mut [EpaFace]) {
    #[allow(clippy::cast_precision_loss)]
    let centroid: Vector3<f64> = vertices
        .iter()
        .map(|v| v.point.coords)
        .sum::<Vector3<f64>>()
        / vertices.len() as f64;

    for face in faces.iter_mut() {
        let face_point = vertices[face.vertices[0]].point;
        let to_centroid = centroid - face_point.coords;

        if face.normal.dot(&to_centroid) > 0.0 {
            face.normal = -face.normal;
            face.distance = -face.distance;
            face.vertices.swap(1, 2);
        }
    }
}

/// Find the face closest to the origin.
fn find_closest_face(faces: &[EpaFace]) -> Option<usize> {
    faces
        .iter()
        .enumerate()
        .min_by(|(_, a), (_, b)| {
            a.distance
                .abs()
                .partial_cmp(&b.distance.abs())
                .unwrap_or(std::cmp::Ordering::Equal)
        })
        .map(|(i, _)| i)
}

/// Add an edge to the horizon list, cancelling it if already present.
///
/// An edge seen from two removed faces is interior to the hole and must not
/// be re-triangulated; pair-cancellation removes it instead of duplicating.
fn add_edge(edges: &mut Vec<(usize, usize)>, v1: usize, v2: usize) {
    let existing = edges
        .iter()
        .position(|&(a, b)| (a == v2 && b == v1) || (a == v1 && b == v2));

    if let Some(idx) = existing {
        edges.swap_remove(idx);
    } else {
        edges.push((v1, v2));
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::float_cmp)]
mod tests {
    use super::*;
    use crate::gjk::gjk_query;
    use approx::assert_relative_eq;

    fn pose_at(x: f64, y: f64, z: f64) -> Pose {
        Pose::from_position(Point3::new(x, y, z))
    }

    fn penetration_of(
        a: &ConvexShape,
        pose_a: &Pose,
        b: &ConvexShape,
        pose_b: &Pose,
    ) -> EpaResult {
        let gjk = gjk_query(a, pose_a, b, pose_b, 64);
        assert!(gjk.intersecting, "test shapes must overlap");
        epa_query(a, pose_a, b, pose_b, &gjk.simplex, 64, 128).expect("EPA must converge")
    }

    #[test]
    fn test_epa_known_depth_along_x() {
        let a = ConvexShape::unit_cube();
        let b = ConvexShape::unit_cube();

        // Overlap of 0.25 along X
        let result = penetration_of(&a, &pose_at(0.0, 0.0, 0.0), &b, &pose_at(0.75, 0.0, 0.0));

        assert_relative_eq!(result.depth, 0.25, epsilon = 1e-4);
        // Normal points from B toward A: -X for this arrangement
        assert_relative_eq!(result.normal.x, -1.0, epsilon = 1e-6);
        assert_relative_eq!(result.normal.norm(), 1.0, epsilon = 1e-9);
    }

    #[test]
    fn test_epa_depth_symmetric_in_body_order() {
        let a = ConvexShape::unit_cube();
        let b = ConvexShape::unit_cube();

        let result_ab = penetration_of(&a, &pose_at(0.0, 0.0, 0.0), &b, &pose_at(0.75, 0.0, 0.0));
        let result_ba = penetration_of(&b, &pose_at(0.75, 0.0, 0.0), &a, &pose_at(0.0, 0.0, 0.0));

        assert_relative_eq!(result_ab.depth, result_ba.depth, epsilon = 1e-4);
        // Swapping body order flips the push direction
        assert_relative_eq!(result_ab.normal.x, -1.0, epsilon = 1e-6);
        assert_relative_eq!(result_ba.normal.x, 1.0, epsilon = 1e-6);
    }

    #[test]
    fn test_epa_vertical_stack() {
        let a = ConvexShape::unit_cube();
        let b = ConvexShape::unit_cube();

        // B resting 0.9 above A: overlap of 0.1 along Z
        let result = penetration_of(&b, &pose_at(0.0, 0.0, 0.9), &a, &pose_at(0.0, 0.0, 0.0));

        assert_relative_eq!(result.depth, 0.1, epsilon = 1e-4);
        // Push B (body A of this query) up to separate
        assert_relative_eq!(result.normal.z, 1.0, epsilon = 1e-6);
    }

    #[test]
    fn test_epa_contact_point_on_shape_a() {
        let a = ConvexShape::unit_cube();
        let b = ConvexShape::unit_cube();

        let pose_a = pose_at(0.0, 0.0, 0.0);
        let pose_b = pose_at(0.75, 0.0, 0.0);
        let result = penetration_of(&a, &pose_a, &b, &pose_b);

        // The witness point must lie on A's +X face plane
        assert_relative_eq!(result.contact_point.x, 0.5, epsilon = 1e-4);
        assert!(result.contact_point.y.abs() <= 0.5 + 1e-6);
        assert!(result.contact_point.z.abs() <= 0.5 + 1e-6);
    }

    #[test]
    fn test_barycentric_center() {
        let a = Point3::new(0.0, 0.0, 0.0);
        let b = Point3::new(1.0, 0.0, 0.0);
        let c = Point3::new(0.0, 1.0, 0.0);

        let centroid = Point3::new(1.0 / 3.0, 1.0 / 3.0, 0.0);
        let (u, v, w) = barycentric(&a, &b, &c, &centroid);

        assert_relative_eq!(u, 1.0 / 3.0, epsilon = 1e-10);
        assert_relative_eq!(v, 1.0 / 3.0, epsilon = 1e-10);
        assert_relative_eq!(w, 1.0 / 3.0, epsilon = 1e-10);
    }

    #[test]
    fn test_barycentric_degenerate_triangle() {
        let a = Point3::new(0.0, 0.0, 0.0);
        let b = Point3::new(0.0, 0.0, 0.0);
        let c = Point3::new(0.0, 0.0, 0.0);

        let (u, v, w) = barycentric(&a, &b, &c, &Point3::new(1.0, 0.0, 0.0));
        assert_eq!((u, v, w), (1.0, 0.0, 0.0));
    }

    #[test]
    fn test_edge_pair_cancellation() {
        let mut edges = Vec::new();
        add_edge(&mut edges, 0, 1);
        add_edge(&mut edges, 1, 2);
        // Shared edge arrives reversed from the neighbouring face
        add_edge(&mut edges, 1, 0);

        assert_eq!(edges, vec![(1, 2)]);
    }
}
