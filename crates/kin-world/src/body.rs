//! The rigid body as stored in the world.

use kin_collision::ConvexShape;
use kin_types::{BodyId, MassProperties, Pose, RigidBodyState, Vector3};
use nalgebra::Point3;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// A rigid body in the simulation world.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct RigidBody {
    /// Unique identifier.
    pub id: BodyId,
    /// Optional name for debugging.
    pub name: Option<String>,
    /// Current state (pose + twist). Position is the center of mass.
    pub state: RigidBodyState,
    /// Mass properties (mass, body-space inertia).
    pub mass_props: MassProperties,
    /// Collision shape, if this body takes part in contact generation.
    pub shape: Option<ConvexShape>,
    /// Whether this body is static (immovable).
    pub is_static: bool,
    /// Whether gravity acts on this body.
    pub regard_gravity: bool,
    /// Accumulated external force (cleared each step).
    pub accumulated_force: Vector3<f64>,
    /// Accumulated external torque (cleared each step).
    pub accumulated_torque: Vector3<f64>,
}

impl RigidBody {
    /// Create a new dynamic body.
    #[must_use]
    pub fn new(id: BodyId, state: RigidBodyState, mass_props: MassProperties) -> Self {
        Self {
            id,
            name: None,
            state,
            mass_props,
            shape: None,
            is_static: false,
            regard_gravity: true,
            accumulated_force: Vector3::zeros(),
            accumulated_torque: Vector3::zeros(),
        }
    }

    /// Create a static (immovable) body.
    #[must_use]
    pub fn new_static(id: BodyId, pose: Pose) -> Self {
        Self {
            id,
            name: None,
            state: RigidBodyState::at_rest(pose),
            mass_props: MassProperties::immovable(),
            shape: None,
            is_static: true,
            regard_gravity: false,
            accumulated_force: Vector3::zeros(),
            accumulated_torque: Vector3::zeros(),
        }
    }

    /// Set the body name.
    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Set the collision shape.
    #[must_use]
    pub fn with_shape(mut self, shape: ConvexShape) -> Self {
        self.shape = Some(shape);
        self
    }

    /// Opt the body out of (or back into) gravity.
    #[must_use]
    pub fn with_gravity(mut self, regard_gravity: bool) -> Self {
        self.regard_gravity = regard_gravity;
        self
    }

    /// Apply a force at the center of mass.
    pub fn apply_force(&mut self, force: Vector3<f64>) {
        if !self.is_static {
            self.accumulated_force += force;
        }
    }

    /// Apply a torque.
    pub fn apply_torque(&mut self, torque: Vector3<f64>) {
        if !self.is_static {
            self.accumulated_torque += torque;
        }
    }

    /// Apply a force at a world-space point, inducing torque about the COM.
    pub fn apply_force_at_point(&mut self, force: Vector3<f64>, point: Point3<f64>) {
        if !self.is_static {
            self.accumulated_force += force;
            let r = point - self.state.pose.position;
            self.accumulated_torque += r.cross(&force);
        }
    }

    /// Clear accumulated forces and torques.
    pub fn clear_forces(&mut self) {
        self.accumulated_force = Vector3::zeros();
        self.accumulated_torque = Vector3::zeros();
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_static_body_ignores_forces() {
        let mut body = RigidBody::new_static(BodyId::new(0), Pose::identity());
        body.apply_force(Vector3::new(100.0, 0.0, 0.0));
        body.apply_torque(Vector3::z());

        assert_relative_eq!(body.accumulated_force.norm(), 0.0, epsilon = 1e-15);
        assert_relative_eq!(body.accumulated_torque.norm(), 0.0, epsilon = 1e-15);
    }

    #[test]
    fn test_force_at_point_induces_torque() {
        let mut body = RigidBody::new(
            BodyId::new(0),
            RigidBodyState::default(),
            MassProperties::sphere(1.0, 0.5),
        );

        // Push +Y at a point one unit out along +X: torque about +Z
        body.apply_force_at_point(Vector3::y(), Point3::new(1.0, 0.0, 0.0));

        assert_relative_eq!(body.accumulated_force.y, 1.0, epsilon = 1e-12);
        assert_relative_eq!(body.accumulated_torque.z, 1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_builder_methods() {
        let body = RigidBody::new(
            BodyId::new(3),
            RigidBodyState::default(),
            MassProperties::sphere(1.0, 0.5),
        )
        .with_name("probe")
        .with_shape(ConvexShape::unit_cube())
        .with_gravity(false);

        assert_eq!(body.name.as_deref(), Some("probe"));
        assert!(body.shape.is_some());
        assert!(!body.regard_gravity);
    }
}
