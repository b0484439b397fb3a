//! Convex shapes and their support mappings.

use kin_types::Pose;
use nalgebra::{Point3, Vector3};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// A convex collision shape.
///
/// Cuboids get analytic support mapping and SAT manifolds; general convex
/// hulls are handled by a brute-force vertex scan and the GJK/EPA pipeline.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum ConvexShape {
    /// Oriented box with half-extents along each local axis.
    Cuboid {
        /// Half-extents of the box in each axis.
        half_extents: Vector3<f64>,
    },
    /// Convex hull defined by a set of vertices.
    ///
    /// Vertices are stored in **local coordinates** and transformed to world
    /// space by the body's pose during collision detection. The set should
    /// form a convex hull; non-convex inputs produce incorrect results.
    Hull {
        /// Vertices of the convex hull in local coordinates.
        vertices: Vec<Point3<f64>>,
    },
}

impl ConvexShape {
    /// Create a cuboid collision shape.
    #[must_use]
    pub fn cuboid(half_extents: Vector3<f64>) -> Self {
        Self::Cuboid { half_extents }
    }

    /// Create a unit cube (half-extents of 0.5 on every axis).
    #[must_use]
    pub fn unit_cube() -> Self {
        Self::cuboid(Vector3::new(0.5, 0.5, 0.5))
    }

    /// Create a convex hull collision shape from vertices.
    ///
    /// # Panics
    ///
    /// Panics if `vertices` is empty; a hull with no vertices has no support
    /// mapping.
    #[must_use]
    pub fn hull(vertices: Vec<Point3<f64>>) -> Self {
        assert!(!vertices.is_empty(), "Hull requires at least one vertex");
        Self::Hull { vertices }
    }

    /// Create a regular tetrahedron centered at the origin.
    #[must_use]
    pub fn tetrahedron(circumradius: f64) -> Self {
        let a = circumradius;
        Self::Hull {
            vertices: vec![
                Point3::new(a, a, a),
                Point3::new(a, -a, -a),
                Point3::new(-a, a, -a),
                Point3::new(-a, -a, a),
            ],
        }
    }

    /// Get the bounding sphere radius, used by the dense pair loop to reject
    /// far-apart bodies before running GJK.
    #[must_use]
    pub fn bounding_radius(&self) -> f64 {
        match self {
            Self::Cuboid { half_extents } => half_extents.norm(),
            Self::Hull { vertices } => {
                vertices.iter().map(|v| v.coords.norm()).fold(0.0, f64::max)
            }
        }
    }

    /// Compute the support point in a world-space direction.
    ///
    /// The support point is the point on the shape's surface furthest along
    /// `direction`. Hull vertices are scanned brute-force; ties keep the
    /// lowest-index vertex.
    #[must_use]
    pub fn support(&self, pose: &Pose, direction: &Vector3<f64>) -> Point3<f64> {
        // Work in local space so hull vertices need no per-vertex transform
        let local_dir = pose.rotation.inverse() * direction;

        let local_support = match self {
            Self::Cuboid { half_extents } => Point3::new(
                half_extents.x * local_dir.x.signum(),
                half_extents.y * local_dir.y.signum(),
                half_extents.z * local_dir.z.signum(),
            ),
            Self::Hull { vertices } => {
                let mut max_dot = f64::NEG_INFINITY;
                let mut best_vertex = Point3::origin();

                for vertex in vertices {
                    let dot = vertex.coords.dot(&local_dir);
                    if dot > max_dot {
                        max_dot = dot;
                        best_vertex = *vertex;
                    }
                }

                best_vertex
            }
        };

        pose.transform_point(&local_support)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use kin_types::UnitQuaternion;

    #[test]
    fn test_support_cuboid() {
        let shape = ConvexShape::cuboid(Vector3::new(1.0, 2.0, 3.0));
        let pose = Pose::identity();

        let support = shape.support(&pose, &Vector3::x());
        assert_relative_eq!(support.x, 1.0, epsilon = 1e-10);

        let dir = Vector3::new(1.0, 1.0, 1.0).normalize();
        let support = shape.support(&pose, &dir);
        assert_relative_eq!(support.x, 1.0, epsilon = 1e-10);
        assert_relative_eq!(support.y, 2.0, epsilon = 1e-10);
        assert_relative_eq!(support.z, 3.0, epsilon = 1e-10);
    }

    #[test]
    fn test_support_cuboid_rotated() {
        let shape = ConvexShape::cuboid(Vector3::new(1.0, 0.5, 0.5));
        // 90 degrees about Z puts the long axis along world Y
        let pose = Pose::from_position_rotation(
            Point3::origin(),
            UnitQuaternion::from_euler_angles(0.0, 0.0, std::f64::consts::FRAC_PI_2),
        );

        let support = shape.support(&pose, &Vector3::y());
        assert_relative_eq!(support.y, 1.0, epsilon = 1e-10);
    }

    #[test]
    fn test_support_hull_scan() {
        let shape = ConvexShape::hull(vec![
            Point3::new(-0.5, -0.5, -0.5),
            Point3::new(0.5, -0.5, -0.5),
            Point3::new(0.5, 0.5, -0.5),
            Point3::new(-0.5, 0.5, -0.5),
            Point3::new(-0.5, -0.5, 0.5),
            Point3::new(0.5, -0.5, 0.5),
            Point3::new(0.5, 0.5, 0.5),
            Point3::new(-0.5, 0.5, 0.5),
        ]);
        let pose = Pose::from_position(Point3::new(1.0, 0.0, 0.0));

        let support = shape.support(&pose, &Vector3::x());
        assert_relative_eq!(support.x, 1.5, epsilon = 1e-10);
    }

    #[test]
    fn test_support_hull_tie_keeps_lowest_index() {
        // Two vertices equally far along +X; the scan must keep the first
        let shape = ConvexShape::hull(vec![
            Point3::new(1.0, 1.0, 0.0),
            Point3::new(1.0, -1.0, 0.0),
            Point3::new(-1.0, 0.0, 0.0),
        ]);
        let support = shape.support(&Pose::identity(), &Vector3::x());
        assert_relative_eq!(support.y, 1.0, epsilon = 1e-10);
    }

    #[test]
    fn test_bounding_radius() {
        let cube = ConvexShape::unit_cube();
        assert_relative_eq!(cube.bounding_radius(), 0.75_f64.sqrt(), epsilon = 1e-10);

        let tet = ConvexShape::tetrahedron(0.5);
        assert_relative_eq!(tet.bounding_radius(), 0.75_f64.sqrt(), epsilon = 1e-10);
    }
}
