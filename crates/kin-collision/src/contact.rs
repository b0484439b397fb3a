//! Contact types produced by the narrow phase.

use kin_types::BodyId;
use nalgebra::{Point3, Vector3};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// A single contact point between two bodies.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ContactPoint {
    /// Contact position in world space.
    pub position: Point3<f64>,
    /// Geometric overlap at this point (positive while overlapping).
    pub depth: f64,
}

/// A set of contact points between one pair of bodies, sharing one normal.
///
/// The normal points from body B toward body A: pushing A along `normal`
/// separates the pair.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ContactManifold {
    /// First body of the pair.
    pub body_a: BodyId,
    /// Second body of the pair.
    pub body_b: BodyId,
    /// Shared contact normal, from B toward A, unit length.
    pub normal: Vector3<f64>,
    /// Contact points (0..8 for cuboid pairs, 1 for GJK/EPA pairs).
    pub points: Vec<ContactPoint>,
}

impl ContactManifold {
    /// Swap the body order, negating the normal to keep its convention.
    #[must_use]
    pub fn flip(mut self) -> Self {
        std::mem::swap(&mut self.body_a, &mut self.body_b);
        self.normal = -self.normal;
        self
    }

    /// Check whether the manifold carries any points.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// The deepest overlap across the manifold's points.
    #[must_use]
    pub fn max_depth(&self) -> f64 {
        self.points.iter().map(|p| p.depth).fold(0.0, f64::max)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_flip_swaps_bodies_and_negates_normal() {
        let manifold = ContactManifold {
            body_a: BodyId::new(0),
            body_b: BodyId::new(1),
            normal: Vector3::z(),
            points: vec![ContactPoint {
                position: Point3::origin(),
                depth: 0.1,
            }],
        };

        let flipped = manifold.flip();
        assert_eq!(flipped.body_a, BodyId::new(1));
        assert_eq!(flipped.body_b, BodyId::new(0));
        assert_relative_eq!(flipped.normal.z, -1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_max_depth() {
        let manifold = ContactManifold {
            body_a: BodyId::new(0),
            body_b: BodyId::new(1),
            normal: Vector3::z(),
            points: vec![
                ContactPoint {
                    position: Point3::origin(),
                    depth: 0.1,
                },
                ContactPoint {
                    position: Point3::new(1.0, 0.0, 0.0),
                    depth: 0.3,
                },
            ],
        };

        assert_relative_eq!(manifold.max_depth(), 0.3, epsilon = 1e-12);
    }
}
