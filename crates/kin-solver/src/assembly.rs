//! Constraint assembly: Jacobian rows, Baumgarte bias, multiplier bounds.
//!
//! Assembly is a pure function of the body snapshot: it derives each
//! constraint's positional error `C`, the scalar Jacobian row mapping body
//! velocities to `dC/dt`, the stabilization bias `-beta * C`, and the box
//! bounds on the Lagrange multiplier. Nothing here mutates bodies or
//! constraints.

use kin_types::Result;
use nalgebra::Vector3;

use crate::{BodyState, Constraint};

/// A scalar constraint row: the Jacobian blocks for up to two bodies.
///
/// `body_b` is `None` for single-body constraints, in which case the B
/// blocks are zero and unused.
#[derive(Debug, Clone, Copy)]
pub struct JacobianRow {
    /// Snapshot index of body A.
    pub body_a: usize,
    /// Snapshot index of body B, if the constraint couples two bodies.
    pub body_b: Option<usize>,
    /// Linear block for body A.
    pub linear_a: Vector3<f64>,
    /// Angular block for body A.
    pub angular_a: Vector3<f64>,
    /// Linear block for body B.
    pub linear_b: Vector3<f64>,
    /// Angular block for body B.
    pub angular_b: Vector3<f64>,
}

impl JacobianRow {
    /// Evaluate `J * v` for this row against the snapshot velocities.
    #[must_use]
    pub fn dot_velocity(&self, bodies: &[BodyState]) -> f64 {
        let a = &bodies[self.body_a];
        let mut value =
            self.linear_a.dot(&a.linear_velocity) + self.angular_a.dot(&a.angular_velocity);

        if let Some(b_idx) = self.body_b {
            let b = &bodies[b_idx];
            value += self.linear_b.dot(&b.linear_velocity) + self.angular_b.dot(&b.angular_velocity);
        }

        value
    }
}

/// The assembled constraint system handed to the PGS solver.
#[derive(Debug, Clone, Default)]
pub struct AssembledSystem {
    /// One Jacobian row per constraint.
    pub rows: Vec<JacobianRow>,
    /// Baumgarte bias per constraint: `-beta * C`.
    pub bias: Vec<f64>,
    /// Multiplier bounds per constraint: `(min, max)`.
    pub bounds: Vec<(f64, f64)>,
}

impl AssembledSystem {
    /// Number of constraint rows.
    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Whether the system has no rows.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

const UNBOUNDED: (f64, f64) = (f64::NEG_INFINITY, f64::INFINITY);
const PUSH_ONLY: (f64, f64) = (0.0, f64::INFINITY);

/// Assemble the active constraint list against the current body snapshot.
///
/// # Errors
///
/// Returns [`KinError::InvalidBodyId`](kin_types::KinError) when a constraint
/// references a body outside the snapshot.
pub fn assemble_constraints(
    bodies: &[BodyState],
    constraints: &[Constraint],
    baumgarte: f64,
) -> Result<AssembledSystem> {
    let mut system = AssembledSystem {
        rows: Vec::with_capacity(constraints.len()),
        bias: Vec::with_capacity(constraints.len()),
        bounds: Vec::with_capacity(constraints.len()),
    };

    for constraint in constraints {
        constraint.validate(bodies.len())?;

        match *constraint {
            Constraint::Distance {
                body_a,
                body_b,
                anchor_a,
                anchor_b,
                rest_length,
            } => {
                let ia = body_a.raw() as usize;
                let ib = body_b.raw() as usize;
                let a = &bodies[ia];
                let b = &bodies[ib];

                let r_a = a.rotation * anchor_a;
                let r_b = b.rotation * anchor_b;
                let d = (a.position + r_a) - (b.position + r_b);

                // C = |d|^2 - L^2, so dC/dt = 2 d . (v_a + w_a x r_a - ...)
                let error = d.norm_squared() - rest_length * rest_length;
                let j = d * 2.0;

                system.rows.push(JacobianRow {
                    body_a: ia,
                    body_b: Some(ib),
                    linear_a: j,
                    angular_a: r_a.cross(&j),
                    linear_b: -j,
                    angular_b: -(r_b.cross(&j)),
                });
                system.bias.push(-baumgarte * error);
                system.bounds.push(UNBOUNDED);
            }

            Constraint::Point {
                body,
                anchor,
                target,
                rest_length,
            } => {
                let ia = body.raw() as usize;
                let a = &bodies[ia];

                let r_a = a.rotation * anchor;
                let d = (a.position + r_a) - target;

                let error = d.norm_squared() - rest_length * rest_length;
                let j = d * 2.0;

                system.rows.push(JacobianRow {
                    body_a: ia,
                    body_b: None,
                    linear_a: j,
                    angular_a: r_a.cross(&j),
                    linear_b: Vector3::zeros(),
                    angular_b: Vector3::zeros(),
                });
                system.bias.push(-baumgarte * error);
                system.bounds.push(UNBOUNDED);
            }

            Constraint::Contact {
                body_a,
                body_b,
                lever_a,
                lever_b,
                normal,
                penetration,
            } => {
                let ia = body_a.raw() as usize;
                let ib = body_b.raw() as usize;

                // C = signed separation along the normal; the row measures
                // the separating velocity n . (v_pa - v_pb)
                system.rows.push(JacobianRow {
                    body_a: ia,
                    body_b: Some(ib),
                    linear_a: normal,
                    angular_a: lever_a.cross(&normal),
                    linear_b: -normal,
                    angular_b: -(lever_b.cross(&normal)),
                });
                system.bias.push(-baumgarte * penetration);
                system.bounds.push(PUSH_ONLY);
            }
        }
    }

    Ok(system)
}
