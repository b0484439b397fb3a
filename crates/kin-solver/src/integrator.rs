//! Semi-implicit Euler integration of rigid-body state.
//!
//! The solve-then-integrate ordering makes this semi-implicit (symplectic)
//! Euler: the velocity solver runs first, and positions and orientations are
//! advanced from the *new* velocities. That ordering is stable for stiffer
//! constraints than explicit Euler at the same step size.
//!
//! Orientation advances through the quaternion derivative
//! `q_dot = 0.5 * omega_quat * q`, where `omega_quat` is the pure quaternion
//! carrying the angular velocity. The result is renormalized every step; a
//! quaternion that has collapsed below [`QUATERNION_EPSILON`] is reset to
//! identity instead of being divided by its near-zero norm.

use kin_types::RigidBodyState;
use nalgebra::{Quaternion, UnitQuaternion};

/// Quaternions shorter than this after a step are reset to identity rather
/// than normalized.
pub const QUATERNION_EPSILON: f64 = 1e-4;

/// Advance one body's pose from its (post-solve) velocities.
pub fn integrate(state: &mut RigidBodyState, dt: f64) {
    // Position from the new linear velocity
    state.pose.position += state.twist.linear * dt;

    // Orientation from the new angular velocity via the quaternion derivative
    let q = *state.pose.rotation.quaternion();
    let omega = Quaternion::from_parts(0.0, state.twist.angular);
    let q_dot = omega * q * 0.5;
    let advanced = q + q_dot * dt;

    state.pose.rotation = if advanced.norm() > QUATERNION_EPSILON {
        UnitQuaternion::from_quaternion(advanced)
    } else {
        UnitQuaternion::identity()
    };
}

/// Advance every body in a slice.
pub fn integrate_all(states: &mut [RigidBodyState], dt: f64) {
    for state in states.iter_mut() {
        integrate(state, dt);
    }
}
