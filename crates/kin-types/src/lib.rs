//! Core types for constraint-based rigid-body dynamics.
//!
//! This crate provides the foundational types shared by the Kinetica
//! workspace:
//!
//! - [`RigidBodyState`] - Position, orientation, velocity of rigid bodies
//! - [`MassProperties`] - Mass and inertia tensor with inverse helpers
//! - [`Gravity`] / [`ExternalForce`] - External force inputs
//! - [`SimulationConfig`] / [`SolverConfig`] - Timestep, solver tunables
//! - [`KinError`] - The shared error taxonomy
//!
//! # Design Philosophy
//!
//! These types are **pure data**. They have no physics, no collision, no
//! integration. They're the common language between:
//!
//! - The collision layer (`kin-collision`)
//! - The constraint solver (`kin-solver`)
//! - The world and frame driver (`kin-world`)
//! - Host engines that snapshot entity transforms in and out each tick
//!
//! # Coordinate System
//!
//! - X: right
//! - Y: forward
//! - Z: up
//! - Right-handed
//!
//! Host engines that store orientations as Euler angles can use
//! [`Pose::from_euler_angles`] and [`Pose::euler_angles`] at the boundary.
//!
//! # Example
//!
//! ```
//! use kin_types::{RigidBodyState, Pose, Twist};
//! use nalgebra::Point3;
//!
//! // Create a body at rest one meter up
//! let state = RigidBodyState::new(
//!     Pose::from_position(Point3::new(0.0, 0.0, 1.0)),
//!     Twist::zero(),
//! );
//!
//! assert_eq!(state.pose.position.z, 1.0);
//! assert!(state.twist.linear.norm() < 1e-10);
//! ```

#![doc(html_root_url = "https://docs.rs/kin-types/0.1.0")]
#![deny(clippy::unwrap_used, clippy::expect_used)]
#![warn(missing_docs)]
#![allow(
    clippy::missing_const_for_fn,     // Many methods can't be const due to nalgebra
    clippy::suboptimal_flops,          // mul_add style changes aren't always clearer
)]

mod body;
mod config;
mod dynamics;
mod error;

pub use body::{BodyId, MassProperties, Pose, RigidBodyState, Twist};
pub use config::{SimulationConfig, SolverConfig};
pub use dynamics::{ExternalForce, Gravity};
pub use error::KinError;

// Re-export math types for convenience
pub use nalgebra::{Matrix3, Point3, Quaternion, UnitQuaternion, Vector3};

/// Result type for dynamics operations.
pub type Result<T> = std::result::Result<T, KinError>;
