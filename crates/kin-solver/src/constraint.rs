//! Constraint definitions and the solver-facing body snapshot.

use kin_types::{BodyId, KinError, Result};
use nalgebra::{Matrix3, Point3, Vector3};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// A velocity-level constraint between rigid bodies.
///
/// Constraints are transient: the frame driver rebuilds the active list every
/// step from persistent user constraints plus freshly generated contacts.
/// Anchors are body-local; levers are world-space offsets from the center of
/// mass, captured at contact generation time.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Constraint {
    /// Keep two body-local anchor points at a fixed distance.
    ///
    /// The multiplier is unbounded: the link both pushes and pulls.
    Distance {
        /// First body.
        body_a: BodyId,
        /// Second body.
        body_b: BodyId,
        /// Anchor on body A, in body-local coordinates.
        anchor_a: Vector3<f64>,
        /// Anchor on body B, in body-local coordinates.
        anchor_b: Vector3<f64>,
        /// Rest length to maintain between the world-space anchors.
        rest_length: f64,
    },

    /// Anchor one body-local point to a fixed world point.
    ///
    /// A `rest_length` of zero pins the anchor to the point. The multiplier
    /// is unbounded.
    Point {
        /// The constrained body.
        body: BodyId,
        /// Anchor on the body, in body-local coordinates.
        anchor: Vector3<f64>,
        /// Fixed world-space target point.
        target: Point3<f64>,
        /// Rest length to maintain between anchor and target.
        rest_length: f64,
    },

    /// Non-penetration constraint along a world-space normal.
    ///
    /// The multiplier is bounded to `[0, +inf)`: contacts only push.
    Contact {
        /// First body (pushed along `normal`).
        body_a: BodyId,
        /// Second body (pushed against `normal`).
        body_b: BodyId,
        /// Contact point minus body A's center of mass, world space.
        lever_a: Vector3<f64>,
        /// Contact point minus body B's center of mass, world space.
        lever_b: Vector3<f64>,
        /// Contact normal, unit length, pointing from B toward A.
        normal: Vector3<f64>,
        /// Signed separation along the normal; negative while overlapping.
        penetration: f64,
    },
}

impl Constraint {
    /// The bodies this constraint touches. The second entry is `None` for
    /// single-body constraints.
    #[must_use]
    pub fn bodies(&self) -> (BodyId, Option<BodyId>) {
        match *self {
            Self::Distance { body_a, body_b, .. } | Self::Contact { body_a, body_b, .. } => {
                (body_a, Some(body_b))
            }
            Self::Point { body, .. } => (body, None),
        }
    }

    /// Check that every referenced body index is in range.
    ///
    /// # Errors
    ///
    /// Returns [`KinError::InvalidBodyId`] for a body reference outside
    /// `0..body_count`. Referencing a missing body is a construction error
    /// here, never a crash later in the solve.
    pub fn validate(&self, body_count: usize) -> Result<()> {
        let (a, b) = self.bodies();
        let check = |id: BodyId| -> Result<()> {
            if (id.raw() as usize) < body_count {
                Ok(())
            } else {
                Err(KinError::InvalidBodyId(id.raw()))
            }
        };

        check(a)?;
        if let Some(b) = b {
            check(b)?;
        }
        Ok(())
    }
}

/// Per-step snapshot of one body, as the solver sees it.
///
/// The rotation is carried as a matrix and the inverse inertia is already in
/// the world frame (`R * I_body^-1 * R^T`); both are recomputed from the
/// body's quaternion at the start of every step. Force and torque hold the
/// step's external accumulation, gravity included.
#[derive(Debug, Clone, Copy)]
pub struct BodyState {
    /// Center-of-mass position in world frame.
    pub position: Point3<f64>,
    /// Orientation as a rotation matrix.
    pub rotation: Matrix3<f64>,
    /// Linear velocity.
    pub linear_velocity: Vector3<f64>,
    /// Angular velocity (world frame).
    pub angular_velocity: Vector3<f64>,
    /// Inverse mass (0 for static bodies).
    pub inv_mass: f64,
    /// Inverse inertia tensor in world frame (zero for static bodies).
    pub inv_inertia: Matrix3<f64>,
    /// External force accumulated for this step (world frame).
    pub force: Vector3<f64>,
    /// External torque accumulated for this step (world frame).
    pub torque: Vector3<f64>,
}

impl BodyState {
    /// Create a static (immovable) body state.
    #[must_use]
    pub fn fixed(position: Point3<f64>) -> Self {
        Self {
            position,
            rotation: Matrix3::identity(),
            linear_velocity: Vector3::zeros(),
            angular_velocity: Vector3::zeros(),
            inv_mass: 0.0,
            inv_inertia: Matrix3::zeros(),
            force: Vector3::zeros(),
            torque: Vector3::zeros(),
        }
    }

    /// Create a dynamic body state at rest with the given mass and diagonal
    /// body-space inertia.
    #[must_use]
    pub fn dynamic(position: Point3<f64>, mass: f64, inertia_diagonal: Vector3<f64>) -> Self {
        let inv_inertia = Matrix3::from_diagonal(&Vector3::new(
            1.0 / inertia_diagonal.x,
            1.0 / inertia_diagonal.y,
            1.0 / inertia_diagonal.z,
        ));
        Self {
            position,
            rotation: Matrix3::identity(),
            linear_velocity: Vector3::zeros(),
            angular_velocity: Vector3::zeros(),
            inv_mass: 1.0 / mass,
            inv_inertia,
            force: Vector3::zeros(),
            torque: Vector3::zeros(),
        }
    }

    /// Whether this body cannot move.
    #[must_use]
    pub fn is_static(&self) -> bool {
        self.inv_mass == 0.0
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_constraint_bodies() {
        let distance = Constraint::Distance {
            body_a: BodyId::new(0),
            body_b: BodyId::new(1),
            anchor_a: Vector3::zeros(),
            anchor_b: Vector3::zeros(),
            rest_length: 1.0,
        };
        assert_eq!(distance.bodies(), (BodyId::new(0), Some(BodyId::new(1))));

        let point = Constraint::Point {
            body: BodyId::new(2),
            anchor: Vector3::zeros(),
            target: Point3::origin(),
            rest_length: 0.0,
        };
        assert_eq!(point.bodies(), (BodyId::new(2), None));
    }

    #[test]
    fn test_validate_rejects_out_of_range_body() {
        let contact = Constraint::Contact {
            body_a: BodyId::new(0),
            body_b: BodyId::new(7),
            lever_a: Vector3::zeros(),
            lever_b: Vector3::zeros(),
            normal: Vector3::z(),
            penetration: -0.01,
        };

        assert!(contact.validate(8).is_ok());
        assert_eq!(
            contact.validate(3),
            Err(KinError::InvalidBodyId(7)),
        );
    }

    #[test]
    fn test_body_state_constructors() {
        let fixed = BodyState::fixed(Point3::new(1.0, 0.0, 0.0));
        assert!(fixed.is_static());

        let dynamic = BodyState::dynamic(Point3::origin(), 2.0, Vector3::new(1.0, 1.0, 1.0));
        assert!(!dynamic.is_static());
        assert!((dynamic.inv_mass - 0.5).abs() < 1e-12);
    }
}
