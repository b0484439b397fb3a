//! Constraint solving for rigid-body dynamics.
//!
//! This crate turns a per-step body snapshot and an active constraint list
//! into updated velocities and poses:
//!
//! 1. [`assemble_constraints`] derives one scalar Jacobian row per
//!    constraint, a Baumgarte bias from the positional error, and box bounds
//!    on the multiplier.
//! 2. [`PgsSolver`] builds the effective mass matrix `J * M^-1 * J^T` and
//!    runs a fixed-iteration projected Gauss-Seidel sweep, clamping each
//!    Lagrange multiplier into its bounds after every update.
//! 3. [`integrate`] advances positions and orientations from the post-solve
//!    velocities (semi-implicit Euler), renormalizing the orientation
//!    quaternion.
//!
//! # Constraint kinds
//!
//! - [`Constraint::Distance`] keeps two body-local anchors at a rest length
//!   (unbounded multiplier, pushes and pulls).
//! - [`Constraint::Point`] anchors a body-local point to a fixed world point
//!   (unbounded multiplier).
//! - [`Constraint::Contact`] prevents penetration along a normal (multiplier
//!   clamped to `[0, +inf)`: contacts only push).
//!
//! # Example
//!
//! ```
//! use kin_solver::{assemble_constraints, integrate, BodyState, Constraint, PgsSolver};
//! use kin_types::{BodyId, SolverConfig};
//! use nalgebra::{Point3, Vector3};
//!
//! let mut bodies = vec![
//!     BodyState::fixed(Point3::origin()),
//!     BodyState::dynamic(Point3::new(2.0, 0.0, 0.0), 1.0, Vector3::new(0.1, 0.1, 0.1)),
//! ];
//!
//! let link = Constraint::Distance {
//!     body_a: BodyId::new(0),
//!     body_b: BodyId::new(1),
//!     anchor_a: Vector3::zeros(),
//!     anchor_b: Vector3::zeros(),
//!     rest_length: 1.0,
//! };
//!
//! let system = assemble_constraints(&bodies, &[link], 0.2)?;
//! let mut solver = PgsSolver::new(SolverConfig::default());
//! let result = solver.solve(&mut bodies, &system, 1.0 / 120.0)?;
//! assert_eq!(result.lambda.len(), 1);
//! # Ok::<(), kin_types::KinError>(())
//! ```

#![doc(html_root_url = "https://docs.rs/kin-solver/0.1.0")]
#![deny(clippy::unwrap_used, clippy::expect_used)]
#![warn(missing_docs)]
#![allow(
    clippy::missing_const_for_fn,
    clippy::suboptimal_flops,
)]

mod assembly;
mod constraint;
mod integrator;
mod pgs;

pub use assembly::{assemble_constraints, AssembledSystem, JacobianRow};
pub use constraint::{BodyState, Constraint};
pub use integrator::{integrate, integrate_all, QUATERNION_EPSILON};
pub use pgs::{PgsSolver, PgsSolverStats, VelocitySolveResult, Wrench};

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::float_cmp)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use kin_types::{BodyId, Pose, RigidBodyState, SolverConfig, Twist};
    use nalgebra::{Matrix3, Point3, Vector3};

    /// Full solve-integrate loop for a pair of linked bodies, mirroring what
    /// the frame driver does each step.
    fn step_linked_pair(
        states: &mut [RigidBodyState; 2],
        rest_length: f64,
        dt: f64,
        config: SolverConfig,
    ) {
        let mass = 1.0;
        let inertia = Matrix3::identity();

        let mut bodies: Vec<BodyState> = states
            .iter()
            .map(|s| {
                let rotation = s.pose.rotation_matrix();
                BodyState {
                    position: s.pose.position,
                    rotation,
                    linear_velocity: s.twist.linear,
                    angular_velocity: s.twist.angular,
                    inv_mass: 1.0 / mass,
                    inv_inertia: rotation * inertia * rotation.transpose(),
                    force: Vector3::zeros(),
                    torque: Vector3::zeros(),
                }
            })
            .collect();

        let link = Constraint::Distance {
            body_a: BodyId::new(0),
            body_b: BodyId::new(1),
            anchor_a: Vector3::zeros(),
            anchor_b: Vector3::zeros(),
            rest_length,
        };

        let system = assemble_constraints(&bodies, &[link], config.baumgarte).unwrap();
        let mut solver = PgsSolver::new(config);
        solver.solve(&mut bodies, &system, dt).unwrap();

        for (state, body) in states.iter_mut().zip(bodies.iter()) {
            state.twist.linear = body.linear_velocity;
            state.twist.angular = body.angular_velocity;
            integrate(state, dt);
        }
    }

    #[test]
    fn test_distance_constraint_converges_to_rest_length() {
        // Released from a stretched configuration, the pair must settle
        // toward the rest length and stay bounded over 1000 steps
        let rest_length = 1.0;
        let mut states = [
            RigidBodyState::at_rest(Pose::from_position(Point3::origin())),
            RigidBodyState::at_rest(Pose::from_position(Point3::new(2.0, 0.0, 0.0))),
        ];

        // The bias drives the positional error toward zero at rate beta per
        // second, so 1000 steps at 120 Hz with beta = 0.5 shrinks the error
        // by e^-4.2
        let dt = 1.0 / 120.0;
        let config = SolverConfig::default()
            .with_iterations(64)
            .with_baumgarte(0.5);

        let mut last_separation = 2.0;
        for step in 0..1000 {
            step_linked_pair(&mut states, rest_length, dt, config);

            last_separation =
                (states[1].pose.position - states[0].pose.position).norm();
            assert!(
                last_separation.is_finite() && last_separation < 10.0,
                "diverged at step {step}: separation {last_separation}"
            );
        }

        assert_relative_eq!(last_separation, rest_length, epsilon = 0.05);
    }

    #[test]
    fn test_conservation_without_constraints() {
        // A free body with zero force keeps v and w, and traces an exact
        // straight line under repeated steps
        let mut body = BodyState::dynamic(Point3::origin(), 1.0, Vector3::new(1.0, 1.0, 1.0));
        body.linear_velocity = Vector3::new(0.5, -0.25, 1.0);

        let mut state = RigidBodyState::new(
            Pose::from_position(body.position),
            Twist::new(body.linear_velocity, body.angular_velocity),
        );

        let dt = 1.0 / 120.0;
        let mut solver = PgsSolver::default();
        let mut bodies = vec![body];

        for _ in 0..240 {
            solver
                .solve(&mut bodies, &AssembledSystem::default(), dt)
                .unwrap();
            state.twist.linear = bodies[0].linear_velocity;
            state.twist.angular = bodies[0].angular_velocity;
            integrate(&mut state, dt);
            bodies[0].position = state.pose.position;
        }

        assert_relative_eq!(state.twist.linear, Vector3::new(0.5, -0.25, 1.0), epsilon = 1e-12);
        assert_relative_eq!(state.twist.angular.norm(), 0.0, epsilon = 1e-12);

        // 240 steps * dt * v = 2 seconds of straight-line travel
        assert_relative_eq!(state.pose.position.x, 1.0, epsilon = 1e-9);
        assert_relative_eq!(state.pose.position.y, -0.5, epsilon = 1e-9);
        assert_relative_eq!(state.pose.position.z, 2.0, epsilon = 1e-9);
    }

    #[test]
    fn test_point_constraint_holds_pendulum_bob() {
        // A point constraint with L = 1 anchored at the origin, bob hanging
        // under gravity: after settling, the bob stays one unit from the pin
        let mut state = RigidBodyState::at_rest(Pose::from_position(Point3::new(
            1.0, 0.0, 0.0,
        )));

        let dt = 1.0 / 240.0;
        let config = SolverConfig::default()
            .with_iterations(64)
            .with_baumgarte(0.5);
        let mut solver = PgsSolver::new(config);

        for _ in 0..2000 {
            let rotation = state.pose.rotation_matrix();
            let mut bodies = vec![BodyState {
                position: state.pose.position,
                rotation,
                linear_velocity: state.twist.linear,
                angular_velocity: state.twist.angular,
                inv_mass: 1.0,
                inv_inertia: Matrix3::identity(),
                force: Vector3::new(0.0, 0.0, -9.81),
                torque: Vector3::zeros(),
            }];

            let pin = Constraint::Point {
                body: BodyId::new(0),
                anchor: Vector3::zeros(),
                target: Point3::origin(),
                rest_length: 1.0,
            };

            let system = assemble_constraints(&bodies, &[pin], config.baumgarte).unwrap();
            solver.solve(&mut bodies, &system, dt).unwrap();

            state.twist.linear = bodies[0].linear_velocity;
            state.twist.angular = bodies[0].angular_velocity;
            integrate(&mut state, dt);
        }

        // The swing itself is undamped; the pin keeps the bob within the
        // Baumgarte-determined band around the rest length
        let distance = state.pose.position.coords.norm();
        assert_relative_eq!(distance, 1.0, epsilon = 0.1);
        assert!(state.pose.is_finite());
    }
}
