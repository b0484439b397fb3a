//! Projected Gauss-Seidel (PGS) velocity solver.
//!
//! The solver iterates the constraint system `A * lambda = b` where
//! `A = J * M^-1 * J^T` is the effective mass matrix, `lambda` are the
//! Lagrange multipliers (constraint force magnitudes), and `b` folds in the
//! Baumgarte bias, the pre-solve velocities, and the external forces:
//!
//! ```text
//! b[i] = bias[i] / dt  -  (J * v)[i] / dt  -  (J * M^-1 * F_ext)[i]
//! ```
//!
//! After every row update the multiplier is clamped into its box bounds,
//! which is what lets the same sweep handle equality constraints (unbounded)
//! and contacts (push-only) together. `A` is symmetric positive
//! semi-definite by construction, which underpins the sweep's convergence.
//!
//! The sweep always runs the configured iteration count; it is not
//! convergence checked. More iterations approach the exact LCP solution,
//! fewer leave constraints softer. Rows whose effective-mass diagonal falls
//! below the configured floor are skipped rather than divided through.

use kin_types::{KinError, Result, SolverConfig};
use nalgebra::{DMatrix, DVector, Vector3};

use crate::{AssembledSystem, BodyState};

/// Per-body constraint reaction accumulated over a solve.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Wrench {
    /// Constraint force on the body (world frame).
    pub force: Vector3<f64>,
    /// Constraint torque on the body (world frame).
    pub torque: Vector3<f64>,
}

/// Result of one velocity solve.
#[derive(Debug, Clone, Default)]
pub struct VelocitySolveResult {
    /// Solved multiplier per constraint row, clamped into its bounds.
    pub lambda: Vec<f64>,
    /// Accumulated constraint force and torque per body, `J^T * lambda`
    /// scattered back to the bodies that each row touches.
    pub wrenches: Vec<Wrench>,
}

/// Statistics from the last solve, for diagnostics.
#[derive(Debug, Clone, Copy, Default)]
pub struct PgsSolverStats {
    /// Number of bodies in the snapshot.
    pub bodies: usize,
    /// Number of constraint rows.
    pub rows: usize,
    /// Rows skipped for a near-singular diagonal.
    pub skipped_rows: usize,
}

/// The projected Gauss-Seidel solver.
#[derive(Debug, Clone)]
pub struct PgsSolver {
    config: SolverConfig,
    last_stats: PgsSolverStats,
}

impl Default for PgsSolver {
    fn default() -> Self {
        Self::new(SolverConfig::default())
    }
}

impl PgsSolver {
    /// Create a solver with the given configuration.
    #[must_use]
    pub fn new(config: SolverConfig) -> Self {
        Self {
            config,
            last_stats: PgsSolverStats::default(),
        }
    }

    /// Get the configuration.
    #[must_use]
    pub fn config(&self) -> &SolverConfig {
        &self.config
    }

    /// Get mutable configuration.
    pub fn config_mut(&mut self) -> &mut SolverConfig {
        &mut self.config
    }

    /// Statistics from the last solve.
    #[must_use]
    pub fn last_stats(&self) -> &PgsSolverStats {
        &self.last_stats
    }

    /// Solve the assembled system and update the snapshot velocities.
    ///
    /// Applies `v += dt * m^-1 * (F_ext + F_c)` and the angular counterpart
    /// to every body. With an empty system this degenerates to the plain
    /// external-force velocity update.
    ///
    /// # Errors
    ///
    /// Returns [`KinError::InvalidTimestep`] for a non-positive or
    /// non-finite `dt`.
    pub fn solve(
        &mut self,
        bodies: &mut [BodyState],
        system: &AssembledSystem,
        dt: f64,
    ) -> Result<VelocitySolveResult> {
        if !dt.is_finite() || dt <= 0.0 {
            return Err(KinError::InvalidTimestep(dt));
        }

        let n = bodies.len();
        let m = system.len();

        self.last_stats = PgsSolverStats {
            bodies: n,
            rows: m,
            skipped_rows: 0,
        };

        if m == 0 {
            // No constraints: bodies integrate under external forces only
            apply_external_forces(bodies, dt);
            return Ok(VelocitySolveResult {
                lambda: Vec::new(),
                wrenches: vec![Wrench::default(); n],
            });
        }

        let jacobian = build_jacobian(system, n);
        let inv_mass = build_inverse_mass_matrix(bodies);
        let velocity = build_velocity_vector(bodies);
        let force = build_force_vector(bodies);

        // Effective mass: A = J * M^-1 * J^T (symmetric PSD)
        let j_minv = &jacobian * &inv_mass;
        let effective_mass = &j_minv * jacobian.transpose();

        // b = bias/dt - J*v/dt - J*M^-1*F_ext
        let bias = DVector::from_column_slice(&system.bias);
        let rhs = bias / dt - (&jacobian * &velocity) / dt - &j_minv * &force;

        let mut lambda = DVector::zeros(m);
        let omega = self.config.relaxation;
        let floor = self.config.diagonal_floor;

        for _ in 0..self.config.iterations {
            for i in 0..m {
                let a_ii = effective_mass[(i, i)];
                if a_ii.abs() < floor {
                    continue;
                }

                let mut sum = 0.0;
                for j in 0..m {
                    if j != i {
                        sum += effective_mass[(i, j)] * lambda[j];
                    }
                }

                let unprojected = (rhs[i] - sum) / a_ii;
                let relaxed: f64 = (1.0 - omega) * lambda[i] + omega * unprojected;

                let (lo, hi) = system.bounds[i];
                lambda[i] = relaxed.clamp(lo, hi);
            }
        }

        // Count rows the sweep never touched
        for i in 0..m {
            if effective_mass[(i, i)].abs() < floor {
                self.last_stats.skipped_rows += 1;
            }
        }

        // Constraint forces: F_c = J^T * lambda, scattered per body
        let constraint_force = jacobian.transpose() * &lambda;

        let mut wrenches = vec![Wrench::default(); n];
        for (i, wrench) in wrenches.iter_mut().enumerate() {
            let offset = i * 6;
            wrench.force = Vector3::new(
                constraint_force[offset],
                constraint_force[offset + 1],
                constraint_force[offset + 2],
            );
            wrench.torque = Vector3::new(
                constraint_force[offset + 3],
                constraint_force[offset + 4],
                constraint_force[offset + 5],
            );
        }

        // v += dt * M^-1 * (F_ext + F_c)
        for (i, body) in bodies.iter_mut().enumerate() {
            if body.is_static() {
                continue;
            }

            let total_force = body.force + wrenches[i].force;
            let total_torque = body.torque + wrenches[i].torque;

            body.linear_velocity += total_force * (dt * body.inv_mass);
            body.angular_velocity += body.inv_inertia * total_torque * dt;
        }

        Ok(VelocitySolveResult {
            lambda: lambda.iter().copied().collect(),
            wrenches,
        })
    }
}

/// Velocity update from external forces alone.
fn apply_external_forces(bodies: &mut [BodyState], dt: f64) {
    for body in bodies.iter_mut() {
        if body.is_static() {
            continue;
        }
        body.linear_velocity += body.force * (dt * body.inv_mass);
        body.angular_velocity += body.inv_inertia * body.torque * dt;
    }
}

/// Dense constraint Jacobian: one row per constraint, six columns per body.
fn build_jacobian(system: &AssembledSystem, num_bodies: usize) -> DMatrix<f64> {
    let mut jacobian = DMatrix::zeros(system.len(), 6 * num_bodies);

    for (i, row) in system.rows.iter().enumerate() {
        let a_col = row.body_a * 6;
        for k in 0..3 {
            jacobian[(i, a_col + k)] = row.linear_a[k];
            jacobian[(i, a_col + 3 + k)] = row.angular_a[k];
        }

        if let Some(body_b) = row.body_b {
            let b_col = body_b * 6;
            for k in 0..3 {
                jacobian[(i, b_col + k)] = row.linear_b[k];
                jacobian[(i, b_col + 3 + k)] = row.angular_b[k];
            }
        }
    }

    jacobian
}

/// Block-diagonal inverse mass matrix (scalar blocks for linear, world
/// inverse inertia for angular).
fn build_inverse_mass_matrix(bodies: &[BodyState]) -> DMatrix<f64> {
    let n = bodies.len();
    let mut inv_mass = DMatrix::zeros(6 * n, 6 * n);

    for (i, body) in bodies.iter().enumerate() {
        let offset = i * 6;

        for j in 0..3 {
            inv_mass[(offset + j, offset + j)] = body.inv_mass;
        }
        for j in 0..3 {
            for k in 0..3 {
                inv_mass[(offset + 3 + j, offset + 3 + k)] = body.inv_inertia[(j, k)];
            }
        }
    }

    inv_mass
}

fn build_velocity_vector(bodies: &[BodyState]) -> DVector<f64> {
    let mut v = DVector::zeros(6 * bodies.len());
    for (i, body) in bodies.iter().enumerate() {
        let offset = i * 6;
        for k in 0..3 {
            v[offset + k] = body.linear_velocity[k];
            v[offset + 3 + k] = body.angular_velocity[k];
        }
    }
    v
}

fn build_force_vector(bodies: &[BodyState]) -> DVector<f64> {
    let mut f = DVector::zeros(6 * bodies.len());
    for (i, body) in bodies.iter().enumerate() {
        let offset = i * 6;
        for k in 0..3 {
            f[offset + k] = body.force[k];
            f[offset + 3 + k] = body.torque[k];
        }
    }
    f
}
