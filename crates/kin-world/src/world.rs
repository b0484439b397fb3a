//! The physics world: bodies, persistent constraints, configuration, time.
//!
//! All simulation state lives in this struct and is passed by reference into
//! every operation; there are no process-wide statics. The world owns the
//! authoritative body states between steps; the [`Stepper`](crate::Stepper)
//! snapshots them, solves, and writes results back.

use kin_solver::Constraint;
use kin_types::{
    BodyId, ExternalForce, KinError, MassProperties, Pose, Result, RigidBodyState,
    SimulationConfig, Vector3,
};
use nalgebra::Point3;

use crate::RigidBody;

/// The simulation world.
#[derive(Debug, Clone)]
pub struct PhysicsWorld {
    /// Simulation configuration (timestep, gravity, solver tunables).
    pub config: SimulationConfig,
    bodies: Vec<RigidBody>,
    constraints: Vec<Constraint>,
    time: f64,
}

impl Default for PhysicsWorld {
    fn default() -> Self {
        Self::new(SimulationConfig::default())
    }
}

impl PhysicsWorld {
    /// Create a world with the given configuration.
    #[must_use]
    pub fn new(config: SimulationConfig) -> Self {
        Self {
            config,
            bodies: Vec::new(),
            constraints: Vec::new(),
            time: 0.0,
        }
    }

    /// Add a dynamic body and return its ID.
    ///
    /// # Errors
    ///
    /// Returns [`KinError::InvalidMassProperties`] if the mass properties are
    /// not physically valid.
    pub fn add_body(
        &mut self,
        state: RigidBodyState,
        mass_props: MassProperties,
    ) -> Result<BodyId> {
        mass_props.validate()?;

        let id = BodyId::new(self.bodies.len() as u64);
        self.bodies.push(RigidBody::new(id, state, mass_props));
        Ok(id)
    }

    /// Add a static (immovable) body and return its ID.
    pub fn add_static_body(&mut self, pose: Pose) -> BodyId {
        let id = BodyId::new(self.bodies.len() as u64);
        self.bodies.push(RigidBody::new_static(id, pose));
        id
    }

    /// Add a pre-built body, reassigning its ID.
    pub fn insert_body(&mut self, mut body: RigidBody) -> Result<BodyId> {
        body.mass_props.validate()?;

        let id = BodyId::new(self.bodies.len() as u64);
        body.id = id;
        self.bodies.push(body);
        Ok(id)
    }

    /// Add a persistent constraint.
    ///
    /// Persistent constraints are re-solved every step alongside the frame's
    /// freshly generated contacts.
    ///
    /// # Errors
    ///
    /// Returns [`KinError::InvalidBodyId`] if the constraint references a
    /// body that does not exist.
    pub fn add_constraint(&mut self, constraint: Constraint) -> Result<()> {
        constraint.validate(self.bodies.len())?;
        self.constraints.push(constraint);
        Ok(())
    }

    /// Number of bodies.
    #[must_use]
    pub fn body_count(&self) -> usize {
        self.bodies.len()
    }

    /// Get a body by ID.
    #[must_use]
    pub fn body(&self, id: BodyId) -> Option<&RigidBody> {
        self.bodies.get(id.raw() as usize)
    }

    /// Get a mutable body by ID.
    pub fn body_mut(&mut self, id: BodyId) -> Option<&mut RigidBody> {
        self.bodies.get_mut(id.raw() as usize)
    }

    /// Iterate over all bodies.
    pub fn bodies(&self) -> impl Iterator<Item = &RigidBody> {
        self.bodies.iter()
    }

    /// Iterate mutably over all bodies.
    pub fn bodies_mut(&mut self) -> impl Iterator<Item = &mut RigidBody> {
        self.bodies.iter_mut()
    }

    pub(crate) fn bodies_slice(&self) -> &[RigidBody] {
        &self.bodies
    }

    pub(crate) fn bodies_slice_mut(&mut self) -> &mut [RigidBody] {
        &mut self.bodies
    }

    /// The persistent user constraints.
    #[must_use]
    pub fn constraints(&self) -> &[Constraint] {
        &self.constraints
    }

    /// Apply a force at a body's center of mass.
    ///
    /// # Errors
    ///
    /// Returns [`KinError::InvalidBodyId`] for an unknown body.
    pub fn apply_force(&mut self, id: BodyId, force: Vector3<f64>) -> Result<()> {
        self.body_mut(id)
            .ok_or(KinError::InvalidBodyId(id.raw()))?
            .apply_force(force);
        Ok(())
    }

    /// Apply a torque to a body.
    ///
    /// # Errors
    ///
    /// Returns [`KinError::InvalidBodyId`] for an unknown body.
    pub fn apply_torque(&mut self, id: BodyId, torque: Vector3<f64>) -> Result<()> {
        self.body_mut(id)
            .ok_or(KinError::InvalidBodyId(id.raw()))?
            .apply_torque(torque);
        Ok(())
    }

    /// Apply a force at a world-space point on a body.
    ///
    /// # Errors
    ///
    /// Returns [`KinError::InvalidBodyId`] for an unknown body.
    pub fn apply_force_at_point(
        &mut self,
        id: BodyId,
        force: Vector3<f64>,
        point: Point3<f64>,
    ) -> Result<()> {
        self.body_mut(id)
            .ok_or(KinError::InvalidBodyId(id.raw()))?
            .apply_force_at_point(force, point);
        Ok(())
    }

    /// Apply a structured external force (force, torque, optional point of
    /// application) for the next step.
    ///
    /// # Errors
    ///
    /// Returns [`KinError::InvalidBodyId`] for an unknown body.
    pub fn apply_external_force(&mut self, external: &ExternalForce) -> Result<()> {
        let body = self
            .body_mut(external.body)
            .ok_or(KinError::InvalidBodyId(external.body.raw()))?;

        match external.point {
            Some(point) => body.apply_force_at_point(external.force, point),
            None => body.apply_force(external.force),
        }
        body.apply_torque(external.torque);
        Ok(())
    }

    /// Clear accumulated forces on every body.
    pub fn clear_forces(&mut self) {
        for body in &mut self.bodies {
            body.clear_forces();
        }
    }

    /// Current simulation time in seconds.
    #[must_use]
    pub fn time(&self) -> f64 {
        self.time
    }

    /// The fixed timestep from the configuration.
    #[must_use]
    pub fn timestep(&self) -> f64 {
        self.config.timestep
    }

    pub(crate) fn advance_time(&mut self, dt: f64) {
        self.time += dt;
    }

    /// Total kinetic energy of all dynamic bodies.
    #[must_use]
    pub fn total_kinetic_energy(&self) -> f64 {
        self.bodies
            .iter()
            .filter(|b| !b.is_static)
            .map(|b| {
                b.state
                    .twist
                    .kinetic_energy(b.mass_props.mass, &b.mass_props.inertia)
            })
            .sum()
    }

    /// Total linear momentum of all dynamic bodies.
    #[must_use]
    pub fn total_linear_momentum(&self) -> Vector3<f64> {
        self.bodies
            .iter()
            .filter(|b| !b.is_static)
            .map(|b| b.state.twist.linear_momentum(b.mass_props.mass))
            .sum()
    }

    /// Check every body state for `NaN`/`Inf`.
    ///
    /// # Errors
    ///
    /// Returns [`KinError::Diverged`] naming the first offending body.
    pub fn validate(&self) -> Result<()> {
        for body in &self.bodies {
            if !body.state.is_finite() {
                return Err(KinError::diverged(format!(
                    "non-finite state on {}",
                    body.id
                )));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::float_cmp)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use kin_types::Twist;

    #[test]
    fn test_add_and_query_bodies() {
        let mut world = PhysicsWorld::default();

        let a = world
            .add_body(
                RigidBodyState::at_rest(Pose::from_position(Point3::new(0.0, 0.0, 1.0))),
                MassProperties::sphere(1.0, 0.5),
            )
            .unwrap();
        let b = world.add_static_body(Pose::identity());

        assert_eq!(world.body_count(), 2);
        assert_relative_eq!(world.body(a).unwrap().state.pose.position.z, 1.0);
        assert!(world.body(b).unwrap().is_static);
        assert!(world.body(BodyId::new(9)).is_none());
    }

    #[test]
    fn test_add_body_rejects_negative_mass() {
        let mut world = PhysicsWorld::default();
        let result = world.add_body(
            RigidBodyState::default(),
            MassProperties::new(-1.0, nalgebra::Matrix3::identity()),
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_add_constraint_validates_bodies() {
        let mut world = PhysicsWorld::default();
        let a = world
            .add_body(RigidBodyState::default(), MassProperties::sphere(1.0, 0.5))
            .unwrap();

        let bad = Constraint::Distance {
            body_a: a,
            body_b: BodyId::new(4),
            anchor_a: Vector3::zeros(),
            anchor_b: Vector3::zeros(),
            rest_length: 1.0,
        };
        assert_eq!(
            world.add_constraint(bad),
            Err(KinError::InvalidBodyId(4))
        );

        let good = Constraint::Point {
            body: a,
            anchor: Vector3::zeros(),
            target: Point3::origin(),
            rest_length: 0.0,
        };
        assert!(world.add_constraint(good).is_ok());
        assert_eq!(world.constraints().len(), 1);
    }

    #[test]
    fn test_apply_external_force_at_point() {
        let mut world = PhysicsWorld::default();
        let id = world
            .add_body(RigidBodyState::default(), MassProperties::sphere(1.0, 0.5))
            .unwrap();

        let push = ExternalForce::at_point(id, Vector3::y(), Point3::new(1.0, 0.0, 0.0));
        world.apply_external_force(&push).unwrap();

        let body = world.body(id).unwrap();
        assert_relative_eq!(body.accumulated_force.y, 1.0, epsilon = 1e-12);
        assert_relative_eq!(body.accumulated_torque.z, 1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_apply_force_to_unknown_body_errors() {
        let mut world = PhysicsWorld::default();
        assert!(matches!(
            world.apply_force(BodyId::new(0), Vector3::x()),
            Err(KinError::InvalidBodyId(0))
        ));
    }

    #[test]
    fn test_diagnostics() {
        let mut world = PhysicsWorld::default();
        world
            .add_body(
                RigidBodyState::new(Pose::identity(), Twist::linear(Vector3::new(2.0, 0.0, 0.0))),
                MassProperties::sphere(3.0, 0.5),
            )
            .unwrap();
        world.add_static_body(Pose::identity());

        // KE = 0.5 * 3 * 4 = 6; p = 3 * 2 = 6 (static body contributes nothing)
        assert_relative_eq!(world.total_kinetic_energy(), 6.0, epsilon = 1e-12);
        assert_relative_eq!(world.total_linear_momentum().x, 6.0, epsilon = 1e-12);
    }

    #[test]
    fn test_validate_catches_nan() {
        let mut world = PhysicsWorld::default();
        let id = world
            .add_body(RigidBodyState::default(), MassProperties::sphere(1.0, 0.5))
            .unwrap();

        assert!(world.validate().is_ok());

        world.body_mut(id).unwrap().state.pose.position.x = f64::NAN;
        assert!(world.validate().unwrap_err().is_diverged());
    }
}
