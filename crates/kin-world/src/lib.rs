//! Physics world and frame driver for constraint-based rigid-body dynamics.
//!
//! This crate ties the Kinetica workspace together:
//!
//! ```text
//! +--------------------------------------------------------------+
//! |                         Stepper                              |
//! |  snapshot -> contacts -> assemble -> PGS solve -> integrate  |
//! +------------------------------+-------------------------------+
//!                                |
//!                                v
//! +--------------------------------------------------------------+
//! |                       PhysicsWorld                           |
//! |  bodies, persistent constraints, configuration, time         |
//! +------------------------------+-------------------------------+
//!                                |
//!                +---------------+----------------+
//!                v                                v
//!       kin-collision (GJK/EPA, SAT)      kin-solver (PGS, Euler)
//! ```
//!
//! # Quick Start
//!
//! ```
//! use kin_world::{PhysicsWorld, Stepper};
//! use kin_collision::ConvexShape;
//! use kin_types::{MassProperties, Pose, RigidBodyState, SimulationConfig};
//! use nalgebra::Point3;
//!
//! let mut world = PhysicsWorld::new(SimulationConfig::default());
//!
//! // A falling cube
//! let id = world.add_body(
//!     RigidBodyState::at_rest(Pose::from_position(Point3::new(0.0, 0.0, 5.0))),
//!     MassProperties::cuboid(1.0, nalgebra::Vector3::new(0.5, 0.5, 0.5)),
//! )?;
//! world.body_mut(id).unwrap().shape = Some(ConvexShape::unit_cube());
//!
//! // Simulate one second of fixed steps
//! let mut stepper = Stepper::new();
//! stepper.run_for(&mut world, 1.0)?;
//!
//! assert!(world.body(id).unwrap().state.pose.position.z < 5.0);
//! # Ok::<(), kin_types::KinError>(())
//! ```
//!
//! # Host integration
//!
//! Host engines snapshot their entity transforms into bodies before stepping
//! and read the updated poses back afterwards; [`kin_types::Pose`] converts
//! to and from Euler angles at that boundary. The optional [`DebugDraw`]
//! sink receives velocity vectors, contact normals, and resolved contact
//! forces each step.

#![doc(html_root_url = "https://docs.rs/kin-world/0.1.0")]
#![deny(clippy::unwrap_used, clippy::expect_used)]
#![warn(missing_docs)]
#![allow(
    clippy::missing_const_for_fn,
    clippy::suboptimal_flops,
)]

mod body;
mod debug;
mod stepper;
mod world;

pub use body::RigidBody;
pub use debug::{DebugDraw, NoopDebugDraw, RecordingDebugDraw};
pub use stepper::{StepReport, Stepper};
pub use world::PhysicsWorld;

// Re-export the pieces hosts need alongside the world
pub use kin_collision::ConvexShape;
pub use kin_solver::Constraint;
pub use kin_types::{
    BodyId, ExternalForce, Gravity, KinError, MassProperties, Pose, RigidBodyState,
    SimulationConfig, SolverConfig, Twist,
};
