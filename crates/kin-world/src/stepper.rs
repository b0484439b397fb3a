//! The fixed-timestep frame driver.
//!
//! Each step runs the full pipeline to completion, synchronously:
//!
//! 1. Snapshot body states (rotation matrix and world inverse inertia are
//!    recomputed from each body's quaternion; gravity and accumulated
//!    external forces fold into the per-body force term).
//! 2. Generate contacts with a dense pairwise pass over collidable bodies
//!    (bounding-radius reject, then SAT manifolds for cuboid pairs, GJK/EPA
//!    for anything else) and turn every contact point into a contact
//!    constraint.
//! 3. Assemble constraints, run the projected Gauss-Seidel velocity solve,
//!    and integrate poses from the new velocities.
//! 4. Write results back, clear force accumulators, advance time, and check
//!    for divergence.
//!
//! [`Stepper::advance`] decouples the simulation from the caller's frame
//! rate with an accumulator: it consumes wall-clock time and runs as many
//! whole fixed steps as fit, keeping results independent of render timing.

use kin_collision::{cuboid_cuboid_manifold, hull_contact, ContactManifold, ConvexShape};
use kin_solver::{assemble_constraints, integrate, BodyState, Constraint, PgsSolver};
use kin_types::Result;
use tracing::warn;

use crate::{DebugDraw, NoopDebugDraw, PhysicsWorld};

/// Catch-up limit for [`Stepper::advance`]: if the accumulator holds more
/// fixed steps than this after a stall, the remainder is dropped.
const MAX_CATCHUP_STEPS: u32 = 64;

/// Length of drawn contact normals, in meters.
const DEBUG_NORMAL_LENGTH: f64 = 0.25;

/// Radius of drawn contact point markers, in meters.
const DEBUG_CONTACT_RADIUS: f64 = 0.02;

/// Scale from Newtons to drawn meters for contact force vectors.
const DEBUG_FORCE_SCALE: f64 = 0.01;

/// Summary of one simulation step.
#[derive(Debug, Clone, Copy, Default)]
pub struct StepReport {
    /// Contact points generated by the collision pass.
    pub contact_points: usize,
    /// Constraint rows handed to the solver (contacts + user constraints).
    pub constraint_rows: usize,
}

/// The frame driver.
#[derive(Debug, Clone)]
pub struct Stepper {
    solver: PgsSolver,
    accumulator: f64,
}

impl Default for Stepper {
    fn default() -> Self {
        Self::new()
    }
}

impl Stepper {
    /// Create a new stepper.
    #[must_use]
    pub fn new() -> Self {
        Self {
            solver: PgsSolver::default(),
            accumulator: 0.0,
        }
    }

    /// Execute one fixed step without debug output.
    ///
    /// # Errors
    ///
    /// Returns configuration errors up front and [`KinError::Diverged`]
    /// (see [`kin_types::KinError`]) if any body state turns non-finite.
    pub fn step(&mut self, world: &mut PhysicsWorld) -> Result<StepReport> {
        self.step_with_debug(world, &mut NoopDebugDraw)
    }

    /// Execute one fixed step, pushing velocity vectors, contact normals,
    /// and resolved contact forces to `debug`.
    ///
    /// # Errors
    ///
    /// Same as [`Stepper::step`].
    pub fn step_with_debug(
        &mut self,
        world: &mut PhysicsWorld,
        debug: &mut dyn DebugDraw,
    ) -> Result<StepReport> {
        world.config.validate()?;
        world.validate()?;

        let dt = world.timestep();
        *self.solver.config_mut() = world.config.solver;

        // 1. Snapshot entity state into the solver view
        let mut bodies = snapshot_bodies(world);

        // 2. Collision pass and per-frame constraint list
        let manifolds = detect_contacts(world);

        let mut constraints: Vec<Constraint> = world.constraints().to_vec();
        let mut contact_points = 0;
        for manifold in &manifolds {
            let com_a = bodies[manifold.body_a.raw() as usize].position;
            let com_b = bodies[manifold.body_b.raw() as usize].position;

            for point in &manifold.points {
                contact_points += 1;
                constraints.push(Constraint::Contact {
                    body_a: manifold.body_a,
                    body_b: manifold.body_b,
                    lever_a: point.position - com_a,
                    lever_b: point.position - com_b,
                    normal: manifold.normal,
                    // Collision reports overlap depth; the constraint carries
                    // signed separation, negative while overlapping
                    penetration: -point.depth,
                });
            }
        }

        // 3. Assemble and solve velocities, then integrate poses
        let system = assemble_constraints(&bodies, &constraints, world.config.solver.baumgarte)?;
        let solve = self.solver.solve(&mut bodies, &system, dt)?;

        for (body, state) in world.bodies_slice_mut().iter_mut().zip(bodies.iter()) {
            if body.is_static {
                continue;
            }
            body.state.twist.linear = state.linear_velocity;
            body.state.twist.angular = state.angular_velocity;
            integrate(&mut body.state, dt);
        }

        // 4. Debug visualization side channel
        draw_debug(world, &manifolds, &solve.wrenches, debug);

        world.clear_forces();
        world.advance_time(dt);
        world.validate()?;

        Ok(StepReport {
            contact_points,
            constraint_rows: system.len(),
        })
    }

    /// Feed elapsed wall-clock time and run as many whole fixed steps as it
    /// covers, returning how many ran. Leftover time stays in the
    /// accumulator for the next call.
    ///
    /// # Errors
    ///
    /// Same as [`Stepper::step`].
    pub fn advance(&mut self, world: &mut PhysicsWorld, elapsed: f64) -> Result<u32> {
        let dt = world.timestep();
        self.accumulator += elapsed;

        let mut steps = 0;
        while self.accumulator >= dt {
            if steps >= MAX_CATCHUP_STEPS {
                warn!(
                    dropped = self.accumulator,
                    "accumulator exceeded catch-up budget; dropping backlog"
                );
                self.accumulator = 0.0;
                break;
            }

            self.step(world)?;
            self.accumulator -= dt;
            steps += 1;
        }

        Ok(steps)
    }

    /// Run whole fixed steps covering `duration` seconds of simulated time.
    ///
    /// # Errors
    ///
    /// Same as [`Stepper::step`].
    pub fn run_for(&mut self, world: &mut PhysicsWorld, duration: f64) -> Result<()> {
        let dt = world.timestep();
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let steps = (duration / dt).ceil().max(0.0) as u64;

        for _ in 0..steps {
            self.step(world)?;
        }

        Ok(())
    }
}

/// Build the solver-facing snapshot for every body.
fn snapshot_bodies(world: &PhysicsWorld) -> Vec<BodyState> {
    let gravity = world.config.gravity;
    let use_gravity = world.config.use_gravity;

    world
        .bodies_slice()
        .iter()
        .map(|body| {
            let rotation = body.state.pose.rotation_matrix();

            if body.is_static {
                let mut state = BodyState::fixed(body.state.pose.position);
                state.rotation = rotation;
                return state;
            }

            let mut force = body.accumulated_force;
            if use_gravity && body.regard_gravity {
                force += gravity.force_on_mass(body.mass_props.mass);
            }

            BodyState {
                position: body.state.pose.position,
                rotation,
                linear_velocity: body.state.twist.linear,
                angular_velocity: body.state.twist.angular,
                inv_mass: body.mass_props.inverse_mass(),
                inv_inertia: body.mass_props.world_inverse_inertia(&rotation),
                force,
                torque: body.accumulated_torque,
            }
        })
        .collect()
}

/// Dense pairwise collision pass over all collidable bodies.
///
/// There is no broad phase; body counts here are small. A bounding-radius
/// check rejects far-apart pairs before the narrow-phase query runs.
fn detect_contacts(world: &PhysicsWorld) -> Vec<ContactManifold> {
    let bodies = world.bodies_slice();
    let config = &world.config.solver;
    let mut manifolds = Vec::new();

    for i in 0..bodies.len() {
        for j in (i + 1)..bodies.len() {
            let body_a = &bodies[i];
            let body_b = &bodies[j];

            if body_a.is_static && body_b.is_static {
                continue;
            }
            let (Some(shape_a), Some(shape_b)) = (&body_a.shape, &body_b.shape) else {
                continue;
            };

            let distance = (body_a.state.pose.position - body_b.state.pose.position).norm();
            if distance > shape_a.bounding_radius() + shape_b.bounding_radius() {
                continue;
            }

            let manifold = match (shape_a, shape_b) {
                (
                    ConvexShape::Cuboid { half_extents: he_a },
                    ConvexShape::Cuboid { half_extents: he_b },
                ) => cuboid_cuboid_manifold(
                    he_a,
                    &body_a.state.pose,
                    he_b,
                    &body_b.state.pose,
                    body_a.id,
                    body_b.id,
                ),
                _ => hull_contact(
                    shape_a,
                    &body_a.state.pose,
                    shape_b,
                    &body_b.state.pose,
                    body_a.id,
                    body_b.id,
                    config,
                ),
            };

            if let Some(manifold) = manifold {
                if !manifold.is_empty() {
                    manifolds.push(manifold);
                }
            }
        }
    }

    manifolds
}

/// Push velocity vectors, contact normals, and contact forces to the sink.
fn draw_debug(
    world: &PhysicsWorld,
    manifolds: &[ContactManifold],
    wrenches: &[kin_solver::Wrench],
    debug: &mut dyn DebugDraw,
) {
    for body in world.bodies() {
        if body.is_static {
            continue;
        }
        let from = body.state.pose.position;
        debug.push_line(from, from + body.state.twist.linear);
    }

    for manifold in manifolds {
        for point in &manifold.points {
            debug.push_wireframe_sphere(point.position, DEBUG_CONTACT_RADIUS);
            debug.push_line(
                point.position,
                point.position + manifold.normal * DEBUG_NORMAL_LENGTH,
            );
        }
    }

    for (body, wrench) in world.bodies().zip(wrenches.iter()) {
        if wrench.force.norm_squared() > 0.0 {
            let from = body.state.pose.position;
            debug.push_line(from, from + wrench.force * DEBUG_FORCE_SCALE);
        }
    }
}
