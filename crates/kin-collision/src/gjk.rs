//! GJK (Gilbert-Johnson-Keerthi) intersection testing.
//!
//! GJK maintains a simplex of 1-4 points in Minkowski-difference space and
//! walks it toward the origin. If a tetrahedron simplex ever encloses the
//! origin, the shapes intersect; if a support point fails to pass the origin,
//! they do not.

use kin_types::Pose;
use nalgebra::{Point3, Vector3};

use crate::ConvexShape;

/// Tolerance for numerical comparisons in GJK.
pub(crate) const EPSILON: f64 = 1e-8;

/// Default maximum GJK iterations before giving up.
///
/// The bound guards against cycling on degenerate inputs; exhausting it is
/// reported as "no intersection", not an error.
pub const GJK_MAX_ITERATIONS: usize = 64;

/// Result of a GJK query.
#[derive(Debug, Clone)]
pub struct GjkResult {
    /// Whether the shapes intersect.
    pub intersecting: bool,
    /// The final simplex (seed for EPA if intersecting).
    pub simplex: Simplex,
    /// Number of iterations used.
    pub iterations: usize,
}

/// A point in Minkowski space, with the support points from both shapes.
///
/// Carrying both witness points lets EPA interpolate a contact point on
/// shape A from the barycentric coordinates of a polytope face.
#[derive(Debug, Clone, Copy, Default)]
pub struct MinkowskiPoint {
    /// The point in Minkowski space (`support_a - support_b`).
    pub point: Point3<f64>,
    /// Support point from shape A in world space.
    pub support_a: Point3<f64>,
    /// Support point from shape B in world space.
    pub support_b: Point3<f64>,
}

impl MinkowskiPoint {
    fn new(support_a: Point3<f64>, support_b: Point3<f64>) -> Self {
        Self {
            point: Point3::from(support_a - support_b),
            support_a,
            support_b,
        }
    }
}

/// A simplex used in GJK iteration: point, segment, triangle, or tetrahedron.
#[derive(Debug, Clone, Default)]
pub struct Simplex {
    points: [MinkowskiPoint; 4],
    size: usize,
}

impl Simplex {
    /// Create a new empty simplex.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Push a point onto the front of the simplex.
    ///
    /// The newest point is always index 0; older points shift back and the
    /// oldest drops off once four are held.
    pub fn push(&mut self, point: MinkowskiPoint) {
        for i in (1..=self.size.min(3)).rev() {
            self.points[i] = self.points[i - 1];
        }
        self.points[0] = point;
        self.size = (self.size + 1).min(4);
    }

    /// Get the number of points.
    #[must_use]
    pub fn len(&self) -> usize {
        self.size
    }

    /// Check if the simplex is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.size == 0
    }

    /// Get points as a slice.
    #[must_use]
    pub fn points(&self) -> &[MinkowskiPoint] {
        &self.points[..self.size]
    }

    /// Set the simplex to contain only specific points.
    fn set(&mut self, points: &[MinkowskiPoint]) {
        self.size = points.len().min(4);
        for (i, p) in points.iter().take(4).enumerate() {
            self.points[i] = *p;
        }
    }
}

/// Outcome of one simplex-reduction step.
///
/// Replaces the out-parameter style (`DoSimplexN(..., vec3* Direction)`) with
/// an explicit result: either keep searching along a new direction, or the
/// simplex encloses the origin and the query is done.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SimplexStep {
    /// The origin is outside the simplex; continue searching along
    /// `direction`.
    Continue {
        /// New search direction toward the origin (not normalized).
        direction: Vector3<f64>,
    },
    /// The simplex encloses the origin; the shapes intersect.
    ContainsOrigin,
}

/// Compute the support point for a shape in a given world-space direction.
///
/// Convenience re-export of [`ConvexShape::support`] for callers holding the
/// pieces separately.
#[must_use]
pub fn support(shape: &ConvexShape, pose: &Pose, direction: &Vector3<f64>) -> Point3<f64> {
    shape.support(pose, direction)
}

/// Compute the support point on the Minkowski difference A - B.
pub(crate) fn support_minkowski(
    shape_a: &ConvexShape,
    pose_a: &Pose,
    shape_b: &ConvexShape,
    pose_b: &Pose,
    direction: &Vector3<f64>,
) -> MinkowskiPoint {
    let support_a = shape_a.support(pose_a, direction);
    let support_b = shape_b.support(pose_b, &-direction);
    MinkowskiPoint::new(support_a, support_b)
}

/// Check if two shapes intersect using GJK with the default iteration bound.
///
/// For penetration information, run [`epa_query`](crate::epa_query) on the
/// simplex returned by [`gjk_query`].
#[must_use]
pub fn gjk_intersection(
    shape_a: &ConvexShape,
    pose_a: &Pose,
    shape_b: &ConvexShape,
    pose_b: &Pose,
) -> bool {
    gjk_query(shape_a, pose_a, shape_b, pose_b, GJK_MAX_ITERATIONS).intersecting
}

/// Run the full GJK algorithm and return detailed results.
#[must_use]
pub fn gjk_query(
    shape_a: &ConvexShape,
    pose_a: &Pose,
    shape_b: &ConvexShape,
    pose_b: &Pose,
    max_iterations: usize,
) -> GjkResult {
    // Initial direction: from center of A toward center of B
    let mut direction = pose_b.position - pose_a.position;
    if direction.norm_squared() < EPSILON * EPSILON {
        direction = Vector3::x();
    }

    let mut simplex = Simplex::new();

    let first = support_minkowski(shape_a, pose_a, shape_b, pose_b, &direction);
    simplex.push(first);

    // New search direction: toward the origin from the first point
    direction = -first.point.coords;

    for iteration in 0..max_iterations {
        if direction.norm_squared() < EPSILON * EPSILON {
            // Origin lies on the simplex - shapes are touching
            return GjkResult {
                intersecting: true,
                simplex,
                iterations: iteration,
            };
        }

        direction = direction.normalize();

        let new_point = support_minkowski(shape_a, pose_a, shape_b, pose_b, &direction);

        // If the new support point never reached the origin along the search
        // direction, the shapes cannot intersect.
        if new_point.point.coords.dot(&direction) < -EPSILON {
            return GjkResult {
                intersecting: false,
                simplex,
                iterations: iteration,
            };
        }

        simplex.push(new_point);

        match update_simplex(&mut simplex) {
            SimplexStep::ContainsOrigin => {
                return GjkResult {
                    intersecting: true,
                    simplex,
                    iterations: iteration,
                };
            }
            SimplexStep::Continue { direction: next } => direction = next,
        }
    }

    // Iteration budget exhausted: treated as a normal negative result
    GjkResult {
        intersecting: false,
        simplex,
        iterations: max_iterations,
    }
}

/// Reduce the simplex against the origin and pick the next search direction.
fn update_simplex(simplex: &mut Simplex) -> SimplexStep {
    match simplex.len() {
        2 => update_line(simplex),
        3 => update_triangle(simplex),
        4 => update_tetrahedron(simplex),
        _ => SimplexStep::Continue {
            direction: -simplex.points[0].point.coords,
        },
    }
}

/// Line simplex (2 points).
fn update_line(simplex: &mut Simplex) -> SimplexStep {
    let a = simplex.points[0].point;
    let b = simplex.points[1].point;

    let ab = b - a;
    let ao = -a.coords;

    if ab.dot(&ao) > 0.0 {
        // Origin is beside the segment: search perpendicular to AB toward it
        SimplexStep::Continue {
            direction: triple_product(&ab, &ao, &ab),
        }
    } else {
        // Origin is behind A; keep only A
        simplex.set(&[simplex.points[0]]);
        SimplexStep::Continue { direction: ao }
    }
}

/// Triangle simplex (3 points).
fn update_triangle(simplex: &mut Simplex) -> SimplexStep {
    let a = simplex.points[0].point;
    let b = simplex.points[1].point;
    let c = simplex.points[2].point;

    let ab = b - a;
    let ac = c - a;
    let ao = -a.coords;

    let abc = ab.cross(&ac);

    if abc.cross(&ac).dot(&ao) > 0.0 {
        // Origin is outside edge AC
        if ac.dot(&ao) > 0.0 {
            simplex.set(&[simplex.points[0], simplex.points[2]]);
            SimplexStep::Continue {
                direction: triple_product(&ac, &ao, &ac),
            }
        } else {
            edge_ab_case(simplex, &ab, &ao)
        }
    } else if ab.cross(&abc).dot(&ao) > 0.0 {
        // Origin is outside edge AB
        edge_ab_case(simplex, &ab, &ao)
    } else if abc.dot(&ao) > 0.0 {
        // Above the triangle
        SimplexStep::Continue { direction: abc }
    } else {
        // Below the triangle - reverse winding so the face points at the origin
        simplex.set(&[simplex.points[0], simplex.points[2], simplex.points[1]]);
        SimplexStep::Continue { direction: -abc }
    }
}

/// Shared AB-edge fallback for the triangle case.
fn edge_ab_case(simplex: &mut Simplex, ab: &Vector3<f64>, ao: &Vector3<f64>) -> SimplexStep {
    if ab.dot(ao) > 0.0 {
        simplex.set(&[simplex.points[0], simplex.points[1]]);
        SimplexStep::Continue {
            direction: triple_product(ab, ao, ab),
        }
    } else {
        simplex.set(&[simplex.points[0]]);
        SimplexStep::Continue { direction: *ao }
    }
}

/// Tetrahedron simplex (4 points).
fn update_tetrahedron(simplex: &mut Simplex) -> SimplexStep {
    let a = simplex.points[0].point;
    let b = simplex.points[1].point;
    let c = simplex.points[2].point;
    let d = simplex.points[3].point;

    let ab = b - a;
    let ac = c - a;
    let ad = d - a;
    let ao = -a.coords;

    let abc = ab.cross(&ac);
    let acd = ac.cross(&ad);
    let adb = ad.cross(&ab);

    if abc.dot(&ao) > 0.0 {
        simplex.set(&[simplex.points[0], simplex.points[1], simplex.points[2]]);
        return update_triangle(simplex);
    }

    if acd.dot(&ao) > 0.0 {
        simplex.set(&[simplex.points[0], simplex.points[2], simplex.points[3]]);
        return update_triangle(simplex);
    }

    if adb.dot(&ao) > 0.0 {
        simplex.set(&[simplex.points[0], simplex.points[3], simplex.points[1]]);
        return update_triangle(simplex);
    }

    // Origin is inside the tetrahedron
    SimplexStep::ContainsOrigin
}

/// Triple product: (A x B) x C = B(A.C) - A(B.C).
///
/// Produces a vector perpendicular to A, coplanar with A and B, pointing
/// toward C.
#[inline]
fn triple_product(a: &Vector3<f64>, b: &Vector3<f64>, c: &Vector3<f64>) -> Vector3<f64> {
    b * a.dot(c) - a * b.dot(c)
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::float_cmp)]
mod tests {
    use super::*;

    fn pose_at(x: f64, y: f64, z: f64) -> Pose {
        Pose::from_position(Point3::new(x, y, z))
    }

    #[test]
    fn test_gjk_cubes_separated() {
        let a = ConvexShape::unit_cube();
        let b = ConvexShape::unit_cube();

        // Two unit cubes centered 5 units apart along X
        assert!(!gjk_intersection(
            &a,
            &pose_at(0.0, 0.0, 0.0),
            &b,
            &pose_at(5.0, 0.0, 0.0)
        ));
    }

    #[test]
    fn test_gjk_cubes_sharing_center() {
        let a = ConvexShape::unit_cube();
        let b = ConvexShape::unit_cube();

        let result = gjk_query(
            &a,
            &pose_at(0.0, 0.0, 0.0),
            &b,
            &pose_at(0.0, 0.0, 0.0),
            20,
        );
        assert!(result.intersecting);
        assert!(result.iterations <= 20);
    }

    #[test]
    fn test_gjk_cubes_overlapping() {
        let a = ConvexShape::unit_cube();
        let b = ConvexShape::unit_cube();

        assert!(gjk_intersection(
            &a,
            &pose_at(0.0, 0.0, 0.0),
            &b,
            &pose_at(0.9, 0.0, 0.0)
        ));
    }

    #[test]
    fn test_gjk_cubes_touching_faces() {
        let a = ConvexShape::unit_cube();
        let b = ConvexShape::unit_cube();

        // Gap of 0.1 between faces
        assert!(!gjk_intersection(
            &a,
            &pose_at(0.0, 0.0, 0.0),
            &b,
            &pose_at(1.1, 0.0, 0.0)
        ));
    }

    #[test]
    fn test_gjk_hull_pair() {
        let a = ConvexShape::tetrahedron(0.5);
        let b = ConvexShape::tetrahedron(0.5);

        assert!(gjk_intersection(
            &a,
            &pose_at(0.0, 0.0, 0.0),
            &b,
            &pose_at(0.3, 0.0, 0.0)
        ));
        assert!(!gjk_intersection(
            &a,
            &pose_at(0.0, 0.0, 0.0),
            &b,
            &pose_at(2.0, 0.0, 0.0)
        ));
    }

    #[test]
    fn test_gjk_rotated_cuboids() {
        let a = ConvexShape::cuboid(Vector3::new(1.0, 0.2, 0.2));
        let b = ConvexShape::cuboid(Vector3::new(1.0, 0.2, 0.2));

        // Cross two slender boxes at right angles; they overlap at the origin
        let pose_a = Pose::identity();
        let pose_b = Pose::from_position_rotation(
            Point3::new(0.0, 0.0, 0.3),
            kin_types::UnitQuaternion::from_euler_angles(0.0, 0.0, std::f64::consts::FRAC_PI_2),
        );

        assert!(gjk_intersection(&a, &pose_a, &b, &pose_b));
    }

    #[test]
    fn test_simplex_push_front() {
        let mut simplex = Simplex::new();
        assert!(simplex.is_empty());

        let p1 = MinkowskiPoint::new(Point3::new(1.0, 0.0, 0.0), Point3::origin());
        let p2 = MinkowskiPoint::new(Point3::new(0.0, 1.0, 0.0), Point3::origin());
        simplex.push(p1);
        simplex.push(p2);

        assert_eq!(simplex.len(), 2);
        // Newest point sits at index 0
        assert_eq!(simplex.points()[0].point.y, 1.0);
        assert_eq!(simplex.points()[1].point.x, 1.0);
    }

    #[test]
    fn test_update_line_returns_perpendicular_direction() {
        let mut simplex = Simplex::new();
        simplex.push(MinkowskiPoint::new(Point3::new(1.0, -1.0, 0.0), Point3::origin()));
        simplex.push(MinkowskiPoint::new(Point3::new(1.0, 1.0, 0.0), Point3::origin()));

        let step = update_simplex(&mut simplex);
        match step {
            SimplexStep::Continue { direction } => {
                // Direction must point back toward the origin (-X side)
                assert!(direction.x < 0.0);
            }
            SimplexStep::ContainsOrigin => panic!("line cannot enclose the origin"),
        }
    }
}
