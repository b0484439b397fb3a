//! External force inputs: gravity and per-body forces/torques.

use crate::BodyId;
use nalgebra::{Point3, Vector3};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Uniform gravitational field applied to bodies that regard gravity.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Gravity {
    /// Acceleration due to gravity (m/s^2).
    pub acceleration: Vector3<f64>,
}

impl Default for Gravity {
    fn default() -> Self {
        Self::earth()
    }
}

impl Gravity {
    /// Standard Earth gravity (9.81 m/s^2 in -Z direction).
    #[must_use]
    pub fn earth() -> Self {
        Self {
            acceleration: Vector3::new(0.0, 0.0, -9.81),
        }
    }

    /// Zero gravity (microgravity).
    #[must_use]
    pub fn zero() -> Self {
        Self {
            acceleration: Vector3::zeros(),
        }
    }

    /// Custom gravity vector.
    #[must_use]
    pub fn custom(acceleration: Vector3<f64>) -> Self {
        Self { acceleration }
    }

    /// Compute the gravitational force on a body.
    #[must_use]
    pub fn force_on_mass(&self, mass: f64) -> Vector3<f64> {
        self.acceleration * mass
    }
}

/// An external force applied to a rigid body for one step.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ExternalForce {
    /// The body to apply the force to.
    pub body: BodyId,
    /// Force vector in world coordinates (Newtons).
    pub force: Vector3<f64>,
    /// Torque vector in world coordinates (Newton-meters).
    pub torque: Vector3<f64>,
    /// Point of application in world coordinates (for force-induced torque).
    /// If `None`, the force is applied at the center of mass.
    pub point: Option<Point3<f64>>,
}

impl ExternalForce {
    /// Create a force applied at the center of mass.
    #[must_use]
    pub fn at_com(body: BodyId, force: Vector3<f64>) -> Self {
        Self {
            body,
            force,
            torque: Vector3::zeros(),
            point: None,
        }
    }

    /// Create a torque (no linear force).
    #[must_use]
    pub fn torque_only(body: BodyId, torque: Vector3<f64>) -> Self {
        Self {
            body,
            force: Vector3::zeros(),
            torque,
            point: None,
        }
    }

    /// Create a force applied at a specific world-space point.
    #[must_use]
    pub fn at_point(body: BodyId, force: Vector3<f64>, point: Point3<f64>) -> Self {
        Self {
            body,
            force,
            torque: Vector3::zeros(),
            point: Some(point),
        }
    }
}
